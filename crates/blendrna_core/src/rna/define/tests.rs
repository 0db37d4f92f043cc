use crate::dna::{Heap, LayoutBuilder, LayoutTable};
use crate::rna::{
	Container, DefinitionError, EnumItem, IdentifierIssue, PropFlag, PropInternal, PropertyKind, PropertySubtype, PropertyType, RnaPointer, SchemaRegistry,
	SetOutcome,
};

fn layout() -> LayoutTable {
	LayoutBuilder::new(8)
		.struct_def("Item", &[("char", "name[64]"), ("int", "count"), ("ListBase", "tags")])
		.struct_def("Narrow", &[("char", "small"), ("uchar", "alpha")])
		.build()
		.expect("layout builds")
}

#[test]
fn uppercase_property_identifier_is_an_error() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let item = registry.define_struct("Item", None);
	registry.define_property(item, "Count", PropertyType::Int, PropertySubtype::None);
	assert!(matches!(
		&registry.errors()[0],
		DefinitionError::InvalidIdentifier {
			issue: IdentifierIssue::Uppercase,
			..
		}
	));
}

#[test]
fn root_structs_get_builtin_properties() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let derived = registry.define_struct("SpecialItem", Some("Item"));

	let builtins: Vec<&str> = registry
		.struct_def(item)
		.expect("item")
		.properties
		.iter()
		.filter_map(|id| registry.property(*id))
		.filter(|def| def.internal.contains(PropInternal::BUILTIN) || def.flag.contains(PropFlag::HIDDEN))
		.map(|def| &*def.identifier)
		.collect();
	assert_eq!(builtins, ["rna_properties", "rna_type"]);
	assert!(registry.struct_def(derived).expect("derived").properties.is_empty());
}

#[test]
fn def_int_sets_range_and_default() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let count = registry.def_int(item, "count", 5, 0..=1000, "Count", "Number of items");

	let def = registry.property(count).expect("count");
	assert_eq!(&*def.name, "Count");
	assert!(def.is_editable());
	assert!(def.flag.contains(PropFlag::ANIMATABLE));
	let PropertyKind::Int(info) = &def.kind else {
		panic!("int payload expected");
	};
	assert_eq!((info.hard_min, info.hard_max), (0, 1000));
	assert_eq!((info.soft_min, info.soft_max), (0, 1000), "soft bounds pulled inside the hard range");
	assert_eq!(info.default, 5);
}

#[test]
fn string_properties_are_not_animatable() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let name = registry.def_string(item, "name", "", 64, "Name", "");
	let target = registry.def_pointer(item, "parent", "Item", "Parent", "");
	let flag = registry.property(name).expect("name").flag;
	assert!(flag.contains(PropFlag::EDITABLE));
	assert!(!flag.contains(PropFlag::ANIMATABLE));
	assert!(!registry.property(target).expect("parent").is_editable());
}

#[test]
fn duplicate_identifiers_are_errors() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	registry.def_int(item, "count", 0, 0..=10, "", "");
	registry.def_int(item, "count", 0, 0..=10, "", "");
	assert!(matches!(&registry.errors()[0], DefinitionError::DuplicateProperty { property } if property == "Item.count"));
	assert_eq!(registry.struct_def(item).expect("item").properties.len(), 3, "builtins plus one count");

	let again = registry.define_struct("Item", None);
	assert_eq!(again, item);
	assert!(matches!(registry.errors().last(), Some(DefinitionError::DuplicateStruct { .. })));
}

#[test]
fn range_and_array_checks() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let weight = registry.define_property(item, "weight", PropertyType::Float, PropertySubtype::None);
	registry.set_range(weight, 2.0, 1.0);
	registry.set_array(weight, 65);
	let label = registry.define_property(item, "label", PropertyType::String, PropertySubtype::None);
	registry.set_array(label, 3);

	let errors = registry.errors();
	assert!(matches!(errors[0], DefinitionError::RangeInverted { .. }));
	assert!(matches!(errors[1], DefinitionError::ArrayTooLong { length: 65, max: 64, .. }));
	assert!(matches!(errors[2], DefinitionError::ArrayNotAllowed { kind: PropertyType::String, .. }));
}

#[test]
fn array_defaults_must_match_length() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let color = registry.def_float_array(item, "color", &[1.0, 1.0, 1.0], PropertySubtype::Color, "Color", "");
	assert!(!registry.has_errors());
	assert_eq!(registry.property(color).expect("color").array_length, 3);

	registry.set_float_array_default(color, &[0.0, 0.0]);
	assert!(matches!(registry.errors()[0], DefinitionError::ArrayDefaultLength { expected: 3, got: 2, .. }));
}

#[test]
fn factor_subtype_bounds_floats() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let factor = registry.define_property(item, "factor", PropertyType::Float, PropertySubtype::Factor);
	let PropertyKind::Float(info) = &registry.property(factor).expect("factor").kind else {
		panic!("float payload expected");
	};
	assert_eq!((info.hard_min, info.hard_max), (0.0, 1.0));
}

#[test]
fn enum_items_are_validated() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let mode = registry.def_enum(
		item,
		"mode",
		vec![EnumItem::new(1, "OBJECT", "Object"), EnumItem::separator(), EnumItem::new(2, "EDIT MODE", "Edit")],
		7,
		"Mode",
		"",
	);
	assert!(matches!(&registry.errors()[0], DefinitionError::InvalidEnumItem { identifier, .. } if identifier == "EDIT MODE"));
	let PropertyKind::Enum(info) = &registry.property(mode).expect("mode").kind else {
		panic!("enum payload expected");
	};
	assert_eq!(info.default, 7, "explicit default is kept and checked at generation");
	assert_eq!(info.values().count(), 2);
}

#[test]
fn enum_items_pick_a_default() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let mode = registry.define_property(item, "mode", PropertyType::Enum, PropertySubtype::None);
	registry.set_enum_items(mode, vec![EnumItem::new(3, "A", "A"), EnumItem::new(4, "B", "B")]);
	let PropertyKind::Enum(info) = &registry.property(mode).expect("mode").kind else {
		panic!("enum payload expected");
	};
	assert_eq!(info.default, 3);
}

#[test]
fn name_property_must_be_a_string() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let count = registry.def_int(item, "count", 0, 0..=10, "", "");
	registry.set_struct_name_property(item, count);
	assert!(matches!(&registry.errors()[0], DefinitionError::NamePropertyNotString { .. }));
	assert_eq!(registry.struct_def(item).expect("item").name_property, None);
}

#[test]
fn kind_specific_setters_check_the_kind() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let count = registry.def_int(item, "count", 0, 0..=10, "", "");
	registry.set_string_default(count, "nope");
	assert!(matches!(
		registry.errors()[0],
		DefinitionError::KindMismatch {
			operation: "string default",
			expected: PropertyType::String,
			got: PropertyType::Int,
			..
		}
	));
}

#[test]
fn parameter_flags_only_apply_to_parameters() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let count = registry.def_int(item, "count", 0, 0..=10, "", "");
	registry.set_param_flag(count, crate::rna::ParamFlag::REQUIRED);
	assert!(matches!(registry.errors()[0], DefinitionError::WrongContainer { .. }));
	assert_eq!(registry.property(count).expect("count").owner, Container::Struct(item));
}

#[test]
fn derived_structs_inherit_the_layout_struct() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let item = registry.define_struct("Item", None);
	let special = registry.define_struct("SpecialItem", Some("Item"));
	assert_eq!(registry.struct_def(item).expect("item").sdna.as_deref(), Some("Item"));
	assert_eq!(registry.struct_def(special).expect("special").sdna.as_deref(), Some("Item"));

	registry.set_struct_sdna(special, "Missing");
	assert!(matches!(&registry.errors()[0], DefinitionError::LayoutStructNotFound { struct_name } if struct_name == "Missing"));
}

#[test]
fn declared_ranges_stay_inside_member_storage() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let narrow = registry.define_struct("Narrow", None);
	let small = registry.def_int(narrow, "small", 0, 0..=1000, "Small", "");
	let alpha = registry.def_float(narrow, "alpha", 0.0, 0.0..=10.0, "Alpha", "");
	let PropertyKind::Int(info) = &registry.property(small).expect("small").kind else {
		panic!("int payload expected");
	};
	assert_eq!((info.hard_min, info.hard_max), (0, 255));
	let PropertyKind::Float(info) = &registry.property(alpha).expect("alpha").kind else {
		panic!("float payload expected");
	};
	assert_eq!((info.hard_min, info.hard_max), (0.0, 1.0));
	registry.generate().expect("schema generates");

	let mut heap = Heap::new();
	let ptr = RnaPointer::new(narrow, heap.alloc(2));
	assert_eq!(registry.set_int(&mut heap, small, &ptr, 500), SetOutcome::Clamped);
	assert_eq!(registry.get_int(&heap, small, &ptr), Some(255));
	assert_eq!(registry.set_float(&mut heap, alpha, &ptr, 5.0), SetOutcome::Clamped);
	assert_eq!(registry.get_float(&heap, alpha, &ptr), Some(1.0));
}

#[test]
fn ranges_outside_member_storage_are_errors() {
	let mut registry = SchemaRegistry::with_layout(layout());
	let narrow = registry.define_struct("Narrow", None);
	let small = registry.define_property(narrow, "small", PropertyType::Int, PropertySubtype::None);
	registry.set_range(small, 300.0, 400.0);
	assert!(matches!(&registry.errors()[0], DefinitionError::RangeOutsideStorage { type_name, .. } if type_name == "char"));
}

#[test]
fn duplicate_properties_take_no_slot() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let count = registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);
	let slots = registry.properties.len();

	let again = registry.define_property(item, "count", PropertyType::Float, PropertySubtype::None);
	assert_ne!(again, count);
	assert!(registry.property(again).is_none(), "duplicate handle resolves to nothing");
	assert_eq!(registry.properties.len(), slots);
	assert!(matches!(&registry.errors()[0], DefinitionError::DuplicateProperty { property } if property == "Item.count"));
	assert!(matches!(registry.property(count).map(|def| def.property_type()), Some(PropertyType::Int)));
}
