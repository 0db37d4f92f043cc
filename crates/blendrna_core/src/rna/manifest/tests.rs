use crate::dna::{Heap, LayoutBuilder, LayoutTable};
use crate::rna::{ParameterList, PropertyType, RnaError, RnaPointer, SchemaManifest, SchemaRegistry, SchemaSummary, Value};

fn layout() -> LayoutTable {
	LayoutBuilder::new(8)
		.struct_def("Item", &[("char", "name[64]"), ("int", "count"), ("short", "flag"), ("char", "mode")])
		.build()
		.expect("layout builds")
}

fn registry() -> SchemaRegistry {
	let mut registry = SchemaRegistry::with_layout(layout());
	registry.register_call_target("item_rename", |frame| Some(Value::Bool(!frame.arg("label")?.as_str()?.is_empty())));
	registry
}

const ITEM: &str = r#"{
	"structs": [
		{
			"identifier": "Item",
			"name_property": "name",
			"properties": [
				{ "identifier": "name", "type": "string" },
				{ "identifier": "count", "type": "int", "range": [0, 1000], "default": 5 },
				{ "identifier": "hidden", "type": "boolean", "bind": { "path": "flag", "bit": 2 } },
				{ "identifier": "mode", "type": "enum", "default": "EDIT", "items": [
					{ "value": 0, "identifier": "OBJECT" },
					{ "value": 1, "identifier": "EDIT" }
				] },
				{ "identifier": "total", "type": "int", "readonly": true, "bind": { "path": "count" } }
			],
			"functions": [
				{ "identifier": "rename", "call": "item_rename", "use_reports": true, "parameters": [
					{ "identifier": "label", "type": "string", "required": true },
					{ "identifier": "changed", "type": "boolean", "return": true }
				] }
			]
		},
		{ "identifier": "SpecialItem", "base": "Item", "id": true }
	]
}"#;

#[test]
fn manifest_registers_and_binds() {
	let mut registry = registry();
	let manifest = SchemaManifest::from_json(ITEM).expect("manifest parses");
	let ids = manifest.apply(&mut registry).expect("manifest applies");
	assert_eq!(ids.len(), 2);
	registry.generate().expect("schema generates");

	let item = ids[0];
	let count = registry.find_property(item, "count").expect("count");
	let hidden = registry.find_property(item, "hidden").expect("hidden");
	let mode = registry.find_property(item, "mode").expect("mode");
	let total = registry.find_property(item, "total").expect("total");
	assert!(registry.is_derived_from(ids[1], item));
	assert_eq!(registry.default_of(count), Some(Value::Int(5)));
	assert_eq!(registry.default_of(mode), Some(Value::Enum(1)));

	let mut heap = Heap::new();
	let ptr = RnaPointer::new(item, heap.alloc(72));
	assert!(heap.write(ptr.addr().expect("addr") + 68, &2_i16.to_le_bytes()));
	assert_eq!(registry.get_bool(&heap, hidden, &ptr), Some(true));
	assert_eq!(registry.set_int(&mut heap, count, &ptr, 2000), crate::rna::SetOutcome::Clamped);
	assert_eq!(registry.get_int(&heap, total, &ptr), Some(1000));
	assert_eq!(registry.set_int(&mut heap, total, &ptr, 1), crate::rna::SetOutcome::Rejected);
}

#[test]
fn manifest_functions_carry_parameter_flags() {
	let mut registry = registry();
	let ids = SchemaManifest::from_json(ITEM)
		.expect("manifest parses")
		.apply(&mut registry)
		.expect("manifest applies");
	let rename = registry.find_function(ids[0], "rename").expect("rename");
	let def = registry.function(rename).expect("function");
	assert_eq!(def.flag, crate::rna::FuncFlag::USE_REPORTS);
	assert_eq!(def.return_param, registry.find_parameter(rename, "changed"));

	let mut params = ParameterList::new(&registry, rename).expect("parameter list");
	let mut heap = Heap::new();
	let receiver = RnaPointer::new(ids[0], heap.alloc(72));
	let err = registry
		.call(
			&mut heap,
			rename,
			&receiver,
			&mut params,
			&crate::rna::CallContext::new(),
			&mut crate::rna::ReportList::new(),
		)
		.expect_err("label is required");
	assert!(matches!(err, crate::rna::CallError::MissingRequired { parameter, .. } if parameter == "label"));
	params.set("label", Value::String("cube".to_owned()));
	assert!(params.is_set("label"));
}

#[test]
fn bases_must_come_first() {
	let text = r#"{ "structs": [
		{ "identifier": "Derived", "base": "Later" },
		{ "identifier": "Later" }
	] }"#;
	let mut registry = SchemaRegistry::new();
	let err = SchemaManifest::from_json(text)
		.expect("manifest parses")
		.apply(&mut registry)
		.expect_err("base listed after derived");
	assert!(matches!(err, RnaError::DefinitionErrors { count: 1 }));
	assert!(registry.find_struct("Derived").is_some());
	assert!(registry.find_struct("Later").is_some());
}

#[test]
fn malformed_manifests_are_rejected() {
	let err = SchemaManifest::from_json(r#"{ "structs": [ { "identifier": "Item", "properties": [ { "identifier": "x", "type": "matrix" } ] } ] }"#)
		.expect_err("unknown property type");
	assert!(matches!(err, RnaError::Manifest(_)));
	assert!(matches!(SchemaManifest::load("/nonexistent/schema.json"), Err(RnaError::Io(_))));
}

#[test]
fn summary_lists_structs_in_identifier_order() {
	let mut registry = registry();
	SchemaManifest::from_json(ITEM)
		.expect("manifest parses")
		.apply(&mut registry)
		.expect("manifest applies");
	registry.generate().expect("schema generates");

	let summary = SchemaSummary::from_registry(&registry);
	let names: Vec<&str> = summary.structs.iter().map(|item| item.identifier.as_str()).collect();
	let mut sorted = names.clone();
	sorted.sort_unstable();
	assert_eq!(names, sorted);
	assert!(summary.errors.is_empty());

	let item = summary.structs.iter().find(|item| item.identifier == "Item").expect("Item summary");
	assert_eq!(item.name_property.as_deref(), Some("name"));
	assert_eq!(item.sdna.as_deref(), Some("Item"));
	let props: Vec<&str> = item.properties.iter().map(|prop| prop.identifier.as_str()).collect();
	assert_eq!(props, ["rna_type", "name", "count", "hidden", "mode", "total"]);
	let total = &item.properties[5];
	assert_eq!(total.ty, PropertyType::Int);
	assert!(!total.editable);
	assert_eq!(total.member.as_deref(), Some("count"));
	assert_eq!(total.accessors, ["Item_total_get"]);
	assert_eq!(item.functions[0].call, "Item_rename_call");
	assert_eq!(item.functions[0].return_param.as_deref(), Some("changed"));

	let special = summary.structs.iter().find(|item| item.identifier == "SpecialItem").expect("SpecialItem summary");
	assert!(special.id);
	assert_eq!(special.base.as_deref(), Some("Item"));
	assert!(special.properties.is_empty());

	let json = serde_json::to_value(&summary).expect("summary serializes");
	assert_eq!(json["structs"].as_array().map(Vec::len), Some(summary.structs.len()));
}
