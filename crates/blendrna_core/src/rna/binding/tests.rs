use crate::dna::{Heap, LayoutBuilder, LayoutTable, Primitive};
use crate::rna::{DefinitionError, LengthSource, PropertyKind, PropertySubtype, PropertyType, SchemaRegistry, field_address};

fn layout() -> LayoutTable {
	LayoutBuilder::new(8)
		.struct_def("Inner", &[("int", "value")])
		.struct_def("Item", &[("char", "name[64]"), ("int", "count"), ("ListBase", "tags")])
		.struct_def("Wrapper", &[("int", "kind"), ("Inner", "data"), ("Inner", "*inner")])
		.struct_def("Sample", &[("short", "level"), ("char", "alpha"), ("float", "co[3]"), ("int", "flag"), ("Inner", "*items"), ("int", "items_num"), ("char", "*label")])
		.struct_def("Pair", &[("int", "pad"), ("int", "x")])
		.struct_def("Holder", &[("Pair", "*pair")])
		.build()
		.expect("layout builds")
}

#[test]
fn same_named_members_bind_on_definition() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let item = registry.define_struct("Item", None);
	let name = registry.define_property(item, "name", PropertyType::String, PropertySubtype::None);
	let count = registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);

	let name_def = registry.property(name).expect("name");
	let binding = name_def.binding.as_ref().expect("name is bound");
	assert_eq!(binding.field.offset, 0);
	assert_eq!(binding.field.array_length, 64);
	let PropertyKind::String(info) = &name_def.kind else {
		panic!("string payload expected");
	};
	assert_eq!(info.max_length, 64);

	let count_binding = registry.property(count).and_then(|def| def.binding.as_ref()).expect("count is bound");
	assert_eq!(count_binding.field.offset, 64);
	assert_eq!(count_binding.field.primitive, Some(Primitive::Int));
	assert!(!registry.has_errors());
}

#[test]
fn probe_misses_are_silent() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let item = registry.define_struct("Item", None);
	let missing = registry.define_property(item, "weight", PropertyType::Float, PropertySubtype::None);
	let wrong_kind = registry.define_property(item, "tags", PropertyType::Int, PropertySubtype::None);
	assert!(registry.property(missing).expect("weight").binding.is_none());
	assert!(registry.property(wrong_kind).expect("tags").binding.is_none());
	assert!(!registry.has_errors());
}

#[test]
fn explicit_binding_reports_incompatible_members() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let item = registry.define_struct("Item", None);
	let total = registry.define_property(item, "total", PropertyType::Int, PropertySubtype::None);
	registry.bind_int(total, "tags");
	registry.bind_int(total, "nothing");
	let errors = registry.errors();
	assert!(matches!(&errors[0], DefinitionError::IncompatibleMember { type_name, .. } if type_name == "ListBase"));
	assert!(matches!(&errors[1], DefinitionError::MemberNotFound { path, .. } if path == "nothing"));
}

#[test]
fn binding_without_layout_is_an_error() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let count = registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);
	assert!(!registry.has_errors(), "probe stays quiet");
	registry.bind_int(count, "count");
	assert!(matches!(registry.errors()[0], DefinitionError::NoLayoutTable { .. }));
}

#[test]
fn member_storage_narrows_int_ranges() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let sample = registry.define_struct("Sample", None);
	let level = registry.define_property(sample, "level", PropertyType::Int, PropertySubtype::None);
	let PropertyKind::Int(info) = &registry.property(level).expect("level").kind else {
		panic!("int payload expected");
	};
	assert_eq!((info.hard_min, info.hard_max), (-32768, 32767));
	assert_eq!((info.soft_min, info.soft_max), (-10000, 10000));
}

#[test]
fn byte_members_back_unit_floats() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let sample = registry.define_struct("Sample", None);
	let alpha = registry.define_property(sample, "alpha", PropertyType::Float, PropertySubtype::None);
	let PropertyKind::Float(info) = &registry.property(alpha).expect("alpha").kind else {
		panic!("float payload expected");
	};
	assert_eq!((info.hard_min, info.hard_max), (0.0, 1.0));
}

#[test]
fn array_members_size_scalar_properties() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let sample = registry.define_struct("Sample", None);
	let co = registry.define_property(sample, "co", PropertyType::Float, PropertySubtype::Translation);
	assert_eq!(registry.property(co).expect("co").array_length, 3);
}

#[test]
fn bitset_arrays_are_bounded() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let sample = registry.define_struct("Sample", None);
	let layers = registry.define_property(sample, "layers", PropertyType::Boolean, PropertySubtype::Layer);
	registry.bind_boolean_bitset_array(layers, "flag", 1, 20);
	assert_eq!(registry.property(layers).expect("layers").array_length, 20);

	let too_many = registry.define_property(sample, "too_many", PropertyType::Boolean, PropertySubtype::Layer);
	registry.bind_boolean_bitset_array(too_many, "flag", 1, 65);
	assert!(matches!(registry.errors()[0], DefinitionError::ArrayTooLong { length: 65, .. }));
}

#[test]
fn collections_find_their_length_member() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let sample = registry.define_struct("Sample", None);
	let items = registry.define_property(sample, "items", PropertyType::Collection, PropertySubtype::None);
	assert!(registry.property(items).expect("items").binding.is_none(), "item pointers need a length");

	registry.bind_collection(items, "items", Some("items_num"));
	let binding = registry.property(items).and_then(|def| def.binding.as_ref()).expect("items is bound");
	let Some(LengthSource::Member(length)) = &binding.length else {
		panic!("member length expected");
	};
	assert_eq!(&*length.path, "items_num");

	let tags = {
		let item = registry.define_struct("Item", None);
		registry.define_property(item, "tags", PropertyType::Collection, PropertySubtype::None)
	};
	let binding = registry.property(tags).and_then(|def| def.binding.as_ref()).expect("tags is bound");
	assert_eq!(binding.length, None, "ListBase iterates by links");
}

#[test]
fn nested_layout_member_offsets_properties() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let inner = registry.define_struct("InnerView", None);
	registry.set_struct_sdna_from(inner, "Wrapper", "data");
	let value = registry.define_property(inner, "value", PropertyType::Int, PropertySubtype::None);
	let binding = registry.property(value).and_then(|def| def.binding.as_ref()).expect("value is bound");
	assert_eq!(binding.field.offset, 4);
	assert!(binding.field.is_direct());
}

#[test]
fn field_address_follows_pointer_hops() {
	let table = layout();
	let field = crate::dna::resolve_binding(&table, "Wrapper", "inner->value").expect("path resolves");
	let mut heap = Heap::new();
	let wrapper = heap.alloc(table.struct_size("Wrapper").expect("size"));
	assert_eq!(field_address(&heap, wrapper, &field), None, "null hop");

	let inner = heap.alloc(4);
	assert!(heap.write_ptr(wrapper + 8, inner));
	assert_eq!(field_address(&heap, wrapper, &field), Some(inner));
}

#[test]
fn char_pointers_bind_as_strings_only() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let sample = registry.define_struct("Sample", None);
	let label = registry.define_property(sample, "label", PropertyType::String, PropertySubtype::None);
	let binding = registry.property(label).and_then(|def| def.binding.as_ref()).expect("label is bound");
	assert_eq!(binding.field.pointer_level, 1);
	assert_eq!(&*binding.field.type_name, "char");

	let target = registry.define_property(sample, "target", PropertyType::Pointer, PropertySubtype::None);
	registry.bind_pointer(target, "label");
	assert!(matches!(&registry.errors()[0], DefinitionError::IncompatibleMember { type_name, .. } if type_name == "char"));
}

#[test]
fn field_address_refuses_overflowing_pointers() {
	let table = layout();
	let field = crate::dna::resolve_binding(&table, "Holder", "pair->x").expect("path resolves");
	assert_eq!(field.offset, 4);
	let mut heap = Heap::new();
	let holder = heap.alloc(8);
	assert!(heap.write_ptr(holder, u64::MAX - 1));
	assert_eq!(field_address(&heap, holder, &field), None);
}
