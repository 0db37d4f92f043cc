use crate::dna::{LayoutBuilder, LayoutTable, Primitive};
use crate::rna::{
	AccessorPlan, Accessors, DefinitionError, EnumItem, GenerateOptions, GenerationReport, PropFlag, PropertyKind, PropertySubtype, PropertyType, RnaError, SchemaRegistry, StructFlag,
	StructRef, Template, Value,
};

fn layout() -> LayoutTable {
	LayoutBuilder::new(8)
		.struct_def("Item", &[("char", "name[64]"), ("int", "count"), ("ListBase", "tags"), ("char", "mode"), ("Leaf", "*leaf")])
		.struct_def("Leaf", &[("int", "depth")])
		.build()
		.expect("layout builds")
}

fn item_registry() -> (SchemaRegistry, crate::rna::StructId) {
	let mut registry = SchemaRegistry::with_layout(layout());
	let item = registry.define_struct("Item", None);
	(registry, item)
}

fn item_plan<'a>(report: &'a GenerationReport, identifier: &str) -> Option<&'a AccessorPlan> {
	report.plans.iter().find(|plan| plan.struct_identifier == "Item" && plan.identifier == identifier)
}

#[test]
fn empty_registry_generates() {
	let mut registry = SchemaRegistry::new();
	let report = registry.generate().expect("meta structs generate");
	assert!(registry.is_generated());
	assert_eq!(report.structs, 4);
	let struct_ = registry.meta().struct_;
	assert!(registry.struct_def(struct_).expect("Struct").flag.contains(StructFlag::GENERATED));
}

#[test]
fn plans_name_templates_and_accessors() {
	let (mut registry, item) = item_registry();
	registry.define_property(item, "name", PropertyType::String, PropertySubtype::None);
	registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);
	let report = registry.generate().expect("generates");

	let count = item_plan(&report, "count").expect("count plan");
	assert_eq!(count.template, Some(Template::IntScalar));
	assert!(!count.manual);
	assert_eq!(count.accessors, ["Item_count_get", "Item_count_set"]);
	let raw = count.raw.expect("direct int member gets raw access");
	assert_eq!((raw.offset, raw.raw_type, raw.array_length), (64, Primitive::Int, 0));

	let name = item_plan(&report, "name").expect("name plan");
	assert_eq!(name.template, Some(Template::StringInline));
	assert_eq!(name.accessors, ["Item_name_get", "Item_name_set", "Item_name_length"]);
	assert_eq!(name.raw, None);
}

#[test]
fn raw_access_can_be_disabled() {
	let (mut registry, item) = item_registry();
	let count = registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);
	let options = GenerateOptions {
		raw_access: false,
		..GenerateOptions::default()
	};
	registry.generate_with(&options).expect("generates");
	assert_eq!(registry.raw_access(count), None);
}

#[test]
fn unbound_properties_fail_generation() {
	let (mut registry, item) = item_registry();
	registry.define_property(item, "weight", PropertyType::Float, PropertySubtype::None);
	let err = registry.generate().expect_err("weight has no storage");
	assert!(matches!(err, RnaError::DefinitionErrors { count: 1 }));
	assert!(matches!(&registry.errors()[0], DefinitionError::Unbound { property } if property == "Item.weight"));
	assert!(!registry.is_generated());
}

#[test]
fn manual_getters_satisfy_unbound_properties() {
	let (mut registry, item) = item_registry();
	let weight = registry.define_property(item, "weight", PropertyType::Float, PropertySubtype::None);
	registry.set_accessors(weight, Accessors::default().with_get(|_, _| Some(Value::Float(0.5))));
	let report = registry.generate().expect("generates");
	let plan = item_plan(&report, "weight").expect("weight plan");
	assert!(plan.manual);
	assert_eq!(plan.template, None);
}

#[test]
fn incomplete_collections_are_strict_by_default() {
	let (mut registry, item) = item_registry();
	let extra = registry.def_collection(item, "extra", "Item", "Extra", "");
	registry.set_accessors(extra, Accessors::default().with_get(|_, _| None));
	assert!(registry.generate().is_err());
	let missing: Vec<&str> = registry
		.errors()
		.iter()
		.filter_map(|error| match error {
			DefinitionError::MissingCollectionAccessor { missing, .. } => Some(*missing),
			_ => None,
		})
		.collect();
	assert_eq!(missing, ["begin", "next", "get"]);
}

#[test]
fn lenient_collections_only_warn() {
	let (mut registry, item) = item_registry();
	let extra = registry.def_collection(item, "extra", "Item", "Extra", "");
	registry.set_accessors(extra, Accessors::default().with_get(|_, _| None));
	let options = GenerateOptions {
		strict_collections: false,
		..GenerateOptions::default()
	};
	registry.generate_with(&options).expect("warnings only");
}

#[test]
fn named_struct_references_resolve_late() {
	let (mut registry, item) = item_registry();
	let leaf_ptr = registry.def_pointer(item, "leaf", "Leaf", "Leaf", "");
	assert!(matches!(registry.property(leaf_ptr).expect("leaf").kind.struct_ref(), Some(StructRef::Named(_))));

	let leaf = registry.define_struct("Leaf", None);
	registry.generate().expect("generates");
	assert_eq!(registry.property(leaf_ptr).expect("leaf").kind.struct_ref(), Some(&StructRef::Resolved(leaf)));
}

#[test]
fn pointer_targets_fall_back_to_the_layout_type() {
	let (mut registry, item) = item_registry();
	let leaf_ptr = registry.define_property(item, "leaf", PropertyType::Pointer, PropertySubtype::None);
	let leaf = registry.define_struct("Leaf", None);
	registry.set_struct_flag(leaf, StructFlag::ID | StructFlag::ID_REFCOUNT);
	registry.generate().expect("generates");

	let def = registry.property(leaf_ptr).expect("leaf");
	assert_eq!(def.kind.struct_ref(), Some(&StructRef::Resolved(leaf)));
	assert!(def.flag.contains(PropFlag::ID_REFCOUNT));
}

#[test]
fn missing_struct_references_are_errors() {
	let (mut registry, item) = item_registry();
	registry.def_pointer(item, "owner", "Nowhere", "Owner", "");
	assert!(registry.generate().is_err());
	assert!(
		registry
			.errors()
			.iter()
			.any(|error| matches!(error, DefinitionError::UnknownStruct { name, .. } if name == "Nowhere"))
	);

	let (mut registry, item) = item_registry();
	registry.define_property(item, "tags", PropertyType::Collection, PropertySubtype::None);
	assert!(registry.generate().is_err());
	assert!(matches!(&registry.errors()[0], DefinitionError::MissingStructType { property } if property == "Item.tags"));
}

#[test]
fn read_only_properties_reject_setters() {
	let (mut registry, item) = item_registry();
	let count = registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);
	registry.clear_flag(count, PropFlag::EDITABLE);
	registry.set_accessors(count, Accessors::default().with_set(|_, _, _| true));
	assert!(registry.generate().is_err());
	assert!(matches!(registry.errors()[0], DefinitionError::ReadOnlySetter { .. }));
}

#[test]
fn read_only_generated_properties_have_no_setter() {
	let (mut registry, item) = item_registry();
	let count = registry.define_property(item, "count", PropertyType::Int, PropertySubtype::None);
	registry.clear_flag(count, PropFlag::EDITABLE);
	let report = registry.generate().expect("generates");
	let plan = item_plan(&report, "count").expect("count plan");
	assert_eq!(plan.accessors, ["Item_count_get"]);
}

#[test]
fn enum_checks_run_at_generation() {
	let (mut registry, item) = item_registry();
	registry.def_enum(item, "mode", vec![EnumItem::new(1, "ONE", "One"), EnumItem::new(300, "HUGE", "Huge")], 7, "Mode", "");
	assert!(!registry.has_errors());
	assert!(registry.generate().is_err());

	let errors = registry.errors();
	assert!(matches!(errors[0], DefinitionError::EnumDefaultMissing { value: 7, .. }));
	assert!(matches!(&errors[1], DefinitionError::InvalidEnumItem { identifier, .. } if identifier == "HUGE"));
}

#[test]
fn enums_without_items_have_no_valid_default() {
	let (mut registry, item) = item_registry();
	registry.def_enum(item, "mode", Vec::new(), 0, "Mode", "");
	assert!(registry.generate().is_err());
	assert!(
		registry
			.errors()
			.iter()
			.any(|error| matches!(error, DefinitionError::EnumDefaultMissing { value: 0, .. }))
	);
}

#[test]
fn flag_enum_defaults_must_fit_the_mask() {
	let (mut registry, item) = item_registry();
	let mode = registry.def_enum_flag(item, "mode", vec![EnumItem::new(1, "A", "A"), EnumItem::new(2, "B", "B")], 3, "Mode", "");
	let PropertyKind::Enum(info) = &registry.property(mode).expect("mode").kind else {
		panic!("enum payload expected");
	};
	assert_eq!(info.mask(), 3);
	registry.generate().expect("3 is A | B");
}

#[test]
fn call_targets_are_linked() {
	let (mut registry, item) = item_registry();
	registry.define_function(item, "touch", "item_touch").expect("function defined");
	registry.define_function(item, "missing", "item_missing").expect("function defined");
	registry.register_call_target("item_touch", |_| None);
	assert!(registry.generate().is_err());
	assert!(matches!(&registry.errors()[0], DefinitionError::UnknownCallTarget { target, .. } if target == "item_missing"));
}

#[test]
fn generation_report_lists_call_entries() {
	let (mut registry, item) = item_registry();
	registry.define_function(item, "touch", "item_touch").expect("function defined");
	registry.register_call_target("item_touch", |_| None);
	let report = registry.generate().expect("generates");
	assert_eq!(report.calls, ["Item_touch_call"]);
}
