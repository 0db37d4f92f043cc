use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dna::Heap;
use crate::rna::{DefinitionError, PropFlag, PropertyType, RnaPointer, SchemaRegistry, SetOutcome, StructFlag, Value};

#[test]
fn runtime_structs_are_reference_counted() {
	let mut registry = SchemaRegistry::new();
	let base = registry.define_struct("Panel", None);
	let custom = registry.define_runtime_struct("CustomPanel", Some(base));
	let def = registry.struct_def(custom).expect("defined");
	assert!(def.flag.contains(StructFlag::RUNTIME));
	assert!(registry.is_derived_from(custom, base));

	assert!(registry.retain_runtime_struct(custom));
	assert!(!registry.release_runtime_struct(custom));
	assert!(registry.struct_def(custom).is_some());
	assert!(registry.release_runtime_struct(custom));
	assert!(registry.struct_def(custom).is_none());
	assert_eq!(registry.find_struct("CustomPanel"), None);
	assert!(!registry.release_runtime_struct(custom), "stale handle");
}

#[test]
fn registered_structs_cannot_be_released() {
	let mut registry = SchemaRegistry::new();
	let base = registry.define_struct("Panel", None);
	assert!(!registry.retain_runtime_struct(base));
	assert!(!registry.release_runtime_struct(base));
	assert_eq!(
		registry.errors().last(),
		Some(&DefinitionError::NotRuntime {
			identifier: "Panel".to_owned()
		})
	);
	assert!(registry.struct_def(base).is_some());
}

#[test]
fn runtime_properties_store_values_per_instance() {
	let mut registry = SchemaRegistry::new();
	let object = registry.define_struct("Object", None);
	let weight = registry.define_runtime_property(object, "weight", PropertyType::Int).expect("runtime property");
	let def = registry.property(weight).expect("property");
	assert!(def.flag.contains(PropFlag::IDPROPERTY));
	assert!(def.binding.is_none());

	let mut heap = Heap::new();
	let first = RnaPointer::new_id(object, heap.alloc(8));
	let second = RnaPointer::new_id(object, heap.alloc(8));
	assert_eq!(registry.get_int(&heap, weight, &first), Some(0));
	assert_eq!(registry.set_int(&mut heap, weight, &first, 12), SetOutcome::Stored);
	assert_eq!(registry.get_int(&heap, weight, &first), Some(12));
	assert_eq!(registry.get_int(&heap, weight, &second), Some(0));
	assert_eq!(heap.custom(first.addr().expect("addr"), "weight"), Some(&serde_json::json!(12)));
}

#[test]
fn runtime_accessors_follow_edits() {
	let mut registry = SchemaRegistry::new();
	let object = registry.define_struct("Object", None);
	let weight = registry.define_runtime_property(object, "weight", PropertyType::Int).expect("runtime property");
	let mut heap = Heap::new();
	let ptr = RnaPointer::new_id(object, heap.alloc(8));

	registry.set_int_default(weight, 3);
	assert_eq!(registry.get_int(&heap, weight, &ptr), Some(3));
	registry.set_range(weight, 0.0, 10.0);
	assert_eq!(registry.set_int(&mut heap, weight, &ptr, 15), SetOutcome::Clamped);
	assert_eq!(registry.get(&heap, weight, &ptr), Some(Value::Int(10)));

	registry.clear_flag(weight, PropFlag::EDITABLE);
	assert_eq!(registry.set_int(&mut heap, weight, &ptr, 1), SetOutcome::Rejected);
}

#[test]
fn runtime_properties_respect_struct_rules() {
	let mut registry = SchemaRegistry::new();
	let object = registry.define_struct("Object", None);
	registry.set_struct_flag(object, StructFlag::NO_IDPROPERTIES);
	assert_eq!(registry.define_runtime_property(object, "weight", PropertyType::Float), None);
	assert!(matches!(registry.errors().last(), Some(DefinitionError::NoIdProperties { struct_name }) if struct_name == "Object"));

	let mesh = registry.define_struct("Mesh", None);
	registry.define_runtime_property(mesh, "weight", PropertyType::Float).expect("first");
	let before = registry.properties_of(mesh, true).count();
	assert_eq!(registry.define_runtime_property(mesh, "weight", PropertyType::Float), None);
	assert_eq!(registry.properties_of(mesh, true).count(), before);
}

#[test]
fn released_runtime_properties_disappear() {
	let mut registry = SchemaRegistry::new();
	let object = registry.define_struct("Object", None);
	let label = registry.define_runtime_property(object, "label", PropertyType::String).expect("runtime property");
	registry.set_struct_name_property(object, label);

	let mut heap = Heap::new();
	let ptr = RnaPointer::new_id(object, heap.alloc(8));
	assert_eq!(registry.set_string(&mut heap, label, &ptr, "cube"), SetOutcome::Stored);
	assert_eq!(registry.name_of(&heap, &ptr).as_deref(), Some("cube"));

	assert!(registry.retain_runtime_property(label));
	assert!(!registry.release_runtime_property(label));
	assert!(registry.release_runtime_property(label));
	assert!(registry.property(label).is_none());
	assert_eq!(registry.find_property(object, "label"), None);
	assert_eq!(registry.struct_def(object).and_then(|def| def.name_property), None);
	assert_eq!(heap.remove_custom_key("label"), 1);

	let rna_type = registry.find_property(object, "rna_type").expect("builtin");
	assert!(!registry.release_runtime_property(rna_type));
}

#[test]
fn register_without_callbacks_derives_a_runtime_struct() {
	let mut registry = SchemaRegistry::new();
	let operator = registry.define_struct("Operator", None);
	let first = registry.register_struct(operator, "MESH_OT_tidy").expect("registered");
	assert!(registry.is_derived_from(first, operator));
	assert!(registry.struct_def(first).is_some_and(|def| def.flag.contains(StructFlag::RUNTIME)));

	let second = registry.register_struct(operator, "MESH_OT_tidy").expect("replaced");
	assert_ne!(first, second);
	assert!(registry.struct_def(first).is_none());
	assert_eq!(registry.find_struct("MESH_OT_tidy"), Some(second));

	assert_eq!(registry.register_struct(operator, "Operator"), None);
	assert!(matches!(registry.errors().last(), Some(DefinitionError::DuplicateStruct { identifier }) if identifier == "Operator"));
}

#[test]
fn register_callbacks_run() {
	let mut registry = SchemaRegistry::new();
	let operator = registry.define_struct("Operator", None);
	let unregistered = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&unregistered);
	registry.set_register_funcs(
		operator,
		|registry, base, identifier| {
			let id = registry.define_runtime_struct(identifier, Some(base));
			registry.define_runtime_property(id, "registered", PropertyType::Boolean)?;
			Some(id)
		},
		move |_, _| {
			counter.fetch_add(1, Ordering::Relaxed);
		},
	);

	let custom = registry.register_struct(operator, "OBJECT_OT_spin").expect("registered");
	assert!(registry.find_property(custom, "registered").is_some());
	assert_eq!(unregistered.load(Ordering::Relaxed), 0);

	assert!(registry.unregister_struct(custom));
	assert_eq!(unregistered.load(Ordering::Relaxed), 1);
	assert!(!registry.unregister_struct(operator), "only runtime structs unregister");
	assert_eq!(unregistered.load(Ordering::Relaxed), 1);
}
