use crate::dna::Heap;
use crate::rna::{
	CallContext, CallError, EnumItem, FuncFlag, FunctionId, ParamFlag, ParameterList, PropertySubtype, PropertyType, ReportLevel, ReportList, RnaPointer,
	SchemaRegistry, SetOutcome, StructFlag, StructId, Value,
};

struct Fixture {
	registry: SchemaRegistry,
	heap: Heap,
	item: StructId,
	scale: FunctionId,
	receiver: RnaPointer,
}

fn fixture() -> Fixture {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let scale = registry.define_function(item, "scale", "item_scale").expect("function defined");
	registry.def_float(scale, "factor", 1.0, 0.0..=10.0, "Factor", "");
	registry.def_int(scale, "count", 2, 0..=5, "Count", "");
	let result = registry.define_property(scale, "result", PropertyType::Int, PropertySubtype::None);
	registry.set_function_return(scale, result);
	registry.register_call_target("item_scale", |frame| {
		let factor = frame.arg("factor")?.as_float()?;
		let count = frame.arg("count")?.as_int()?;
		Some(Value::Int((factor * 10.0) as i32 * count))
	});

	let mut heap = Heap::new();
	let addr = heap.alloc(16);
	Fixture {
		registry,
		heap,
		item,
		scale,
		receiver: RnaPointer::new(item, addr),
	}
}

#[test]
fn parameter_slots_are_aligned() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let func = registry.define_function(item, "place", "item_place").expect("function defined");
	registry.define_property(func, "count", PropertyType::Int, PropertySubtype::None);
	registry.def_float_array(func, "location", &[0.0; 3], PropertySubtype::Translation, "", "");
	registry.define_property(func, "label", PropertyType::String, PropertySubtype::None);

	let params = ParameterList::new(&registry, func).expect("parameter list");
	assert_eq!(params.len(), 3);
	assert_eq!(params.offset_of("count"), Some(0));
	assert_eq!(params.offset_of("location"), Some(8));
	assert_eq!(params.offset_of("label"), Some(24));
	assert_eq!(params.size(), 32);
	assert_eq!(params.identifiers().collect::<Vec<_>>(), ["count", "location", "label"]);
}

#[test]
fn parameters_start_at_their_defaults() {
	let fx = fixture();
	let params = ParameterList::new(&fx.registry, fx.scale).expect("parameter list");
	assert_eq!(params.get("factor"), Some(Value::Float(1.0)));
	assert_eq!(params.get("count"), Some(Value::Int(2)));
	assert_eq!(&params.bytes()[0..4], &1.0_f32.to_le_bytes());
	assert!(!params.is_set("factor"));
}

#[test]
fn arguments_clamp_like_properties() {
	let fx = fixture();
	let mut params = ParameterList::new(&fx.registry, fx.scale).expect("parameter list");
	assert_eq!(params.set("count", Value::Int(50)), SetOutcome::Clamped);
	assert_eq!(params.get("count"), Some(Value::Int(5)));
	assert_eq!(params.set("factor", Value::Int(3)), SetOutcome::Stored);
	assert_eq!(params.get("factor"), Some(Value::Float(3.0)));
	assert_eq!(params.set("factor", Value::String("x".to_owned())), SetOutcome::Rejected);
	assert_eq!(params.set("missing", Value::Int(1)), SetOutcome::Rejected);
	assert!(params.is_set("count"));
}

#[test]
fn call_writes_the_return_value() {
	let mut fx = fixture();
	let mut params = ParameterList::new(&fx.registry, fx.scale).expect("parameter list");
	params.set("factor", Value::Float(1.5));
	fx.registry
		.call(&mut fx.heap, fx.scale, &fx.receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect("call succeeds");
	assert_eq!(params.return_value(), Some(Value::Int(30)));
}

#[test]
fn required_parameters_must_be_set() {
	let mut fx = fixture();
	let count = fx.registry.find_parameter(fx.scale, "count").expect("count");
	fx.registry.set_param_flag(count, ParamFlag::REQUIRED);
	let mut params = ParameterList::new(&fx.registry, fx.scale).expect("parameter list");
	let err = fx
		.registry
		.call(&mut fx.heap, fx.scale, &fx.receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect_err("count is required");
	assert!(matches!(err, CallError::MissingRequired { parameter, .. } if parameter == "count"));

	params.set("count", Value::Int(1));
	fx.registry
		.call(&mut fx.heap, fx.scale, &fx.receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect("count now set");
}

#[test]
fn receivers_are_checked() {
	let mut fx = fixture();
	let mut params = ParameterList::new(&fx.registry, fx.scale).expect("parameter list");
	let err = fx
		.registry
		.call(&mut fx.heap, fx.scale, &RnaPointer::NULL, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect_err("null receiver");
	assert!(matches!(err, CallError::NullReceiver { .. }));

	let other = fx.registry.define_struct("Other", None);
	let addr = fx.heap.alloc(8);
	let err = fx
		.registry
		.call(&mut fx.heap, fx.scale, &RnaPointer::new(other, addr), &mut params, &CallContext::new(), &mut ReportList::new())
		.expect_err("wrong receiver type");
	assert_eq!(
		err,
		CallError::ReceiverType {
			function: "Item.scale".to_owned(),
			expected: "Item".to_owned(),
			got: "Other".to_owned(),
		}
	);

	let special = fx.registry.define_struct("SpecialItem", Some("Item"));
	let derived = RnaPointer::new(special, addr);
	fx.registry
		.call(&mut fx.heap, fx.scale, &derived, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect("derived receivers are accepted");
	assert!(fx.registry.find_function(special, "scale").is_some());
	assert_eq!(fx.registry.find_function(fx.item, "missing"), None);
}

#[test]
fn static_functions_skip_the_receiver() {
	let mut fx = fixture();
	fx.registry.set_function_flag(fx.scale, FuncFlag::NO_SELF);
	let mut params = ParameterList::new(&fx.registry, fx.scale).expect("parameter list");
	fx.registry
		.call(&mut fx.heap, fx.scale, &RnaPointer::NULL, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect("no receiver needed");
	assert_eq!(params.return_value(), Some(Value::Int(20)));
}

#[test]
fn parameter_lists_belong_to_one_function() {
	let mut fx = fixture();
	let other = fx.registry.define_function(fx.item, "other", "item_scale").expect("function defined");
	let mut params = ParameterList::new(&fx.registry, other).expect("parameter list");
	let err = fx
		.registry
		.call(&mut fx.heap, fx.scale, &fx.receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect_err("mismatched list");
	assert!(matches!(err, CallError::ParameterMismatch { .. }));
}

#[test]
fn unregistered_targets_fail_the_call() {
	let mut fx = fixture();
	let lost = fx.registry.define_function(fx.item, "lost", "item_lost").expect("function defined");
	let mut params = ParameterList::new(&fx.registry, lost).expect("parameter list");
	assert!(params.is_empty());
	let err = fx
		.registry
		.call(&mut fx.heap, lost, &fx.receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect_err("no target");
	assert!(matches!(err, CallError::NoCallTarget { target, .. } if target == "item_lost"));
}

#[test]
fn outputs_flow_back_and_inputs_exclude_them() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let func = registry.define_function(item, "measure", "item_measure").expect("function defined");
	registry.define_property(func, "label", PropertyType::String, PropertySubtype::None);
	let total = registry.define_property(func, "total", PropertyType::Int, PropertySubtype::None);
	registry.set_function_output(total);
	let bad = registry.define_property(func, "bad", PropertyType::Int, PropertySubtype::None);
	registry.set_function_output(bad);
	registry.register_call_target("item_measure", |frame| {
		let inputs = frame.args().len() as i32;
		let label = frame.arg("label").and_then(Value::as_str).map_or(0, str::len) as i32;
		frame.set_output("total", Value::Int(inputs * 100 + label));
		None
	});

	let mut heap = Heap::new();
	let receiver = RnaPointer::new(item, heap.alloc(8));
	let mut params = ParameterList::new(&registry, func).expect("parameter list");
	assert_eq!(params.set("label", Value::String("abcd".to_owned())), SetOutcome::Stored);
	assert_eq!(params.get("label"), Some(Value::String("abcd".to_owned())));
	registry
		.call(&mut heap, func, &receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect("call succeeds");
	assert_eq!(params.get("total"), Some(Value::Int(104)));
	assert_eq!(params.return_value(), None);

	registry.register_call_target("item_measure", |frame| {
		frame.set_output("bad", Value::String("nope".to_owned()));
		None
	});
	let err = registry
		.call(&mut heap, func, &receiver, &mut params, &CallContext::new(), &mut ReportList::new())
		.expect_err("string into an int output");
	assert!(matches!(err, CallError::OutputRejected { parameter, .. } if parameter == "bad"));
}

#[test]
fn flags_gate_context_reports_and_self_id() {
	let mut registry = SchemaRegistry::new();
	let object = registry.define_struct("Object", None);
	registry.set_struct_flag(object, StructFlag::ID);
	let func = registry.define_function(object, "inspect", "object_inspect").expect("function defined");
	let found = registry.define_property(func, "found", PropertyType::Boolean, PropertySubtype::None);
	registry.set_function_return(func, found);
	registry.register_call_target("object_inspect", |frame| {
		frame.report(ReportLevel::Warning, "inspecting");
		let has_scene = frame.context.and_then(|context| context.get("scene")).is_some();
		Some(Value::Bool(has_scene && frame.self_id.is_some()))
	});

	let mut heap = Heap::new();
	let addr = heap.alloc(8);
	let receiver = RnaPointer::new_id(object, addr);
	let context = CallContext::new().with("scene", receiver);
	let mut reports = ReportList::new();
	let mut params = ParameterList::new(&registry, func).expect("parameter list");

	registry.call(&mut heap, func, &receiver, &mut params, &context, &mut reports).expect("call succeeds");
	assert_eq!(params.return_value(), Some(Value::Bool(false)));
	assert!(reports.is_empty());

	registry.set_function_flag(func, FuncFlag::USE_CONTEXT | FuncFlag::USE_REPORTS | FuncFlag::USE_SELF_ID);
	registry.call(&mut heap, func, &receiver, &mut params, &context, &mut reports).expect("call succeeds");
	assert_eq!(params.return_value(), Some(Value::Bool(true)));
	assert_eq!(reports.len(), 1);
	assert_eq!(reports.reports()[0].level, ReportLevel::Warning);
	assert!(!reports.has_errors());
}

#[test]
fn return_parameters_are_validated() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let func = registry.define_function(item, "pick", "item_pick").expect("function defined");
	let first = registry.define_property(func, "first", PropertyType::Int, PropertySubtype::None);
	let second = registry.define_property(func, "second", PropertyType::Int, PropertySubtype::None);
	let values = registry.def_int_array(func, "values", &[0, 0], "", "");
	registry.set_function_return(func, values);
	registry.set_function_return(func, first);
	registry.set_function_return(func, second);

	let reasons: Vec<&str> = registry
		.errors()
		.iter()
		.filter_map(|error| match error {
			crate::rna::DefinitionError::InvalidReturn { reason, .. } => Some(*reason),
			_ => None,
		})
		.collect();
	assert_eq!(reasons, ["array parameters cannot be returned", "function already has a return parameter"]);
	assert!(registry.define_function(item, "pick", "item_pick").is_none(), "duplicate function");
}

#[test]
fn enum_arguments_follow_their_item_rules() {
	let mut registry = SchemaRegistry::new();
	let item = registry.define_struct("Item", None);
	let func = registry.define_function(item, "apply", "item_apply").expect("function defined");
	let items = || vec![EnumItem::new(1, "A", "A"), EnumItem::new(2, "B", "B")];
	registry.def_enum(func, "mode", items(), 1, "Mode", "");
	registry.def_enum_flag(func, "flags", items(), 0, "Flags", "");

	let mut params = ParameterList::new(&registry, func).expect("parameter list");
	assert_eq!(params.set("mode", Value::Enum(3)), SetOutcome::Rejected);
	assert_eq!(params.get("mode"), Some(Value::Enum(1)));
	assert_eq!(params.set("mode", Value::Enum(2)), SetOutcome::Stored);
	assert_eq!(params.set("flags", Value::Enum(3)), SetOutcome::Stored);
	assert_eq!(params.get("flags"), Some(Value::Enum(3)));
	assert_eq!(params.set("flags", Value::Enum(4)), SetOutcome::Rejected);
}
