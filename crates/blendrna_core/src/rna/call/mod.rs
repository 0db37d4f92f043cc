use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::dna::Heap;
use crate::rna::{FuncFlag, FunctionId, ParamFlag, PropFlag, PropertyKind, PropertyType, RnaPointer, SchemaRegistry, SetOutcome, Value, default_value};

/// Call target body.
pub type CallFn = dyn Fn(&mut CallFrame<'_>) -> Option<Value> + Send + Sync;

/// Slot alignment inside a parameter buffer.
pub const PARAM_ALIGN: usize = 8;

/// Failure to invoke a function.
#[derive(Debug, Error, PartialEq)]
pub enum CallError {
	/// Function handle no longer resolves.
	#[error("stale function handle")]
	StaleFunction,
	/// Parameter list was built for another function.
	#[error("{function}: parameter list belongs to another function")]
	ParameterMismatch {
		/// `Owner.identifier`.
		function: String,
	},
	/// Required parameter left unset.
	#[error("{function}: required parameter {parameter} is not set")]
	MissingRequired {
		/// `Owner.identifier`.
		function: String,
		/// Parameter identifier.
		parameter: String,
	},
	/// Method called without a receiver.
	#[error("{function}: receiver is null")]
	NullReceiver {
		/// `Owner.identifier`.
		function: String,
	},
	/// Receiver is not an instance of the owning struct.
	#[error("{function}: receiver of type {got} is not a {expected}")]
	ReceiverType {
		/// `Owner.identifier`.
		function: String,
		/// Owning struct.
		expected: String,
		/// Receiver struct.
		got: String,
	},
	/// No implementation registered under the call target name.
	#[error("{function}: no call target {target}")]
	NoCallTarget {
		/// `Owner.identifier`.
		function: String,
		/// Target name.
		target: String,
	},
	/// Call target produced a value the output slot rejects.
	#[error("{function}: output {parameter} rejected the returned value")]
	OutputRejected {
		/// `Owner.identifier`.
		function: String,
		/// Parameter identifier.
		parameter: String,
	},
}

/// Severity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
	/// Informational.
	Info,
	/// Something looked off.
	Warning,
	/// The operation failed.
	Error,
}

/// One message emitted by a call target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
	/// Severity.
	pub level: ReportLevel,
	/// Text.
	pub message: String,
}

/// Report sink handed to call targets flagged `USE_REPORTS`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportList {
	reports: Vec<Report>,
}

impl ReportList {
	/// Empty list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a message.
	pub fn push(&mut self, level: ReportLevel, message: impl Into<String>) {
		let message = message.into();
		match level {
			ReportLevel::Info => tracing::info!(%message, "report"),
			ReportLevel::Warning => tracing::warn!(%message, "report"),
			ReportLevel::Error => tracing::error!(%message, "report"),
		}
		self.reports.push(Report { level, message });
	}

	/// Recorded messages in order.
	pub fn reports(&self) -> &[Report] {
		&self.reports
	}

	/// Whether any error was reported.
	pub fn has_errors(&self) -> bool {
		self.reports.iter().any(|report| report.level == ReportLevel::Error)
	}

	/// Number of messages.
	pub fn len(&self) -> usize {
		self.reports.len()
	}

	/// Whether nothing was reported.
	pub fn is_empty(&self) -> bool {
		self.reports.is_empty()
	}
}

/// Named instances available to call targets flagged `USE_CONTEXT`.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
	members: BTreeMap<Box<str>, RnaPointer>,
}

impl CallContext {
	/// Empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add or replace a member.
	pub fn with(mut self, name: &str, ptr: RnaPointer) -> Self {
		self.members.insert(name.into(), ptr);
		self
	}

	/// Add or replace a member.
	pub fn insert(&mut self, name: &str, ptr: RnaPointer) {
		self.members.insert(name.into(), ptr);
	}

	/// Member by name.
	pub fn get(&self, name: &str) -> Option<RnaPointer> {
		self.members.get(name).copied()
	}
}

/// Everything a call target sees.
pub struct CallFrame<'a> {
	/// Descriptors.
	pub registry: &'a SchemaRegistry,
	/// Instance memory.
	pub heap: &'a mut Heap,
	/// Receiver, unless the function is flagged `NO_SELF`.
	pub receiver: Option<RnaPointer>,
	/// Address of the identified object owning the receiver, with `USE_SELF_ID`.
	pub self_id: Option<u64>,
	/// Ambient context, with `USE_CONTEXT`.
	pub context: Option<&'a CallContext>,
	/// Report sink, with `USE_REPORTS`.
	pub reports: Option<&'a mut ReportList>,
	args: Vec<(Box<str>, Value)>,
	outputs: Vec<(Box<str>, Value)>,
}

impl CallFrame<'_> {
	/// Input arguments in declaration order.
	pub fn args(&self) -> &[(Box<str>, Value)] {
		&self.args
	}

	/// Input argument by identifier.
	pub fn arg(&self, identifier: &str) -> Option<&Value> {
		self.args.iter().find(|(name, _)| &**name == identifier).map(|(_, value)| value)
	}

	/// Write an output parameter.
	pub fn set_output(&mut self, identifier: &str, value: Value) {
		self.outputs.push((identifier.into(), value));
	}

	/// Report a message when a sink was supplied.
	pub fn report(&mut self, level: ReportLevel, message: impl Into<String>) {
		if let Some(reports) = self.reports.as_deref_mut() {
			reports.push(level, message);
		}
	}
}

#[derive(Debug, Clone)]
struct ParamSlot {
	identifier: Box<str>,
	kind: PropertyKind,
	array_length: usize,
	param_flag: ParamFlag,
	required: bool,
	enum_flag: bool,
	offset: usize,
	size: usize,
	is_set: bool,
}

impl ParamSlot {
	fn dynamic(&self) -> bool {
		matches!(self.kind.property_type(), PropertyType::String | PropertyType::Pointer | PropertyType::Collection)
	}
}

fn slot_size(ty: PropertyType, array_length: usize) -> usize {
	let raw = match ty {
		PropertyType::Boolean | PropertyType::Int | PropertyType::Enum | PropertyType::Float => 4 * array_length.max(1),
		PropertyType::String | PropertyType::Pointer | PropertyType::Collection => 8,
	};
	raw.next_multiple_of(PARAM_ALIGN)
}

/// Packed argument buffer for one function call.
///
/// Parameters occupy consecutive slots in declaration order, each padded to
/// [`PARAM_ALIGN`] bytes. Numeric values are stored in place as little-endian 32-bit words;
/// strings, pointers, and collections store a handle into a side table.
#[derive(Debug, Clone)]
pub struct ParameterList {
	func: FunctionId,
	slots: Vec<ParamSlot>,
	data: Vec<u8>,
	dynamic: Vec<Value>,
}

impl ParameterList {
	/// Buffer for `func` with every slot at its default.
	pub fn new(registry: &SchemaRegistry, func: FunctionId) -> Option<Self> {
		let def = registry.function(func)?;
		let mut slots = Vec::with_capacity(def.parameters.len());
		let mut offset = 0;
		for param in &def.parameters {
			let prop = registry.property(*param)?;
			let size = slot_size(prop.property_type(), prop.array_length);
			slots.push(ParamSlot {
				identifier: prop.identifier.clone(),
				kind: prop.kind.clone(),
				array_length: prop.array_length,
				param_flag: prop.param_flag,
				required: prop.param_flag.contains(ParamFlag::REQUIRED) || prop.flag.contains(PropFlag::REQUIRED),
				enum_flag: prop.flag.contains(PropFlag::ENUM_FLAG),
				offset,
				size,
				is_set: false,
			});
			offset += size;
		}
		let mut list = Self {
			func,
			slots,
			data: vec![0; offset],
			dynamic: Vec::new(),
		};
		for index in 0..list.slots.len() {
			let slot = &list.slots[index];
			let value = default_value(&slot.kind, slot.array_length).unwrap_or(Value::Collection(Vec::new()));
			list.store(index, &value);
		}
		Some(list)
	}

	/// Function the buffer was built for.
	pub fn function(&self) -> FunctionId {
		self.func
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether the function takes no parameters.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Buffer size in bytes.
	pub fn size(&self) -> usize {
		self.data.len()
	}

	/// Raw buffer.
	pub fn bytes(&self) -> &[u8] {
		&self.data
	}

	/// Byte offset of a parameter's slot.
	pub fn offset_of(&self, identifier: &str) -> Option<usize> {
		Some(self.slots[self.index_of(identifier)?].offset)
	}

	/// Parameter identifiers in declaration order.
	pub fn identifiers(&self) -> impl Iterator<Item = &str> {
		self.slots.iter().map(|slot| &*slot.identifier)
	}

	/// Whether the caller set the parameter.
	pub fn is_set(&self, identifier: &str) -> bool {
		self.index_of(identifier).is_some_and(|index| self.slots[index].is_set)
	}

	fn index_of(&self, identifier: &str) -> Option<usize> {
		self.slots.iter().position(|slot| &*slot.identifier == identifier)
	}

	/// Write an argument, clamping numbers to the parameter's hard range.
	pub fn set(&mut self, identifier: &str, value: Value) -> SetOutcome {
		let Some(index) = self.index_of(identifier) else {
			return SetOutcome::Rejected;
		};
		let slot = &self.slots[index];
		let length = slot.array_length;
		let (value, clamped) = match (&slot.kind, value) {
			(PropertyKind::Boolean(_), value @ Value::Bool(_)) if length == 0 => (value, false),
			(PropertyKind::Boolean(_), Value::BoolArray(values)) if values.len() == length => (Value::BoolArray(values), false),
			(PropertyKind::Int(info), Value::Int(raw)) if length == 0 => (Value::Int(info.clamp(raw)), info.clamp(raw) != raw),
			(PropertyKind::Int(info), Value::IntArray(values)) if values.len() == length => {
				let stored: Vec<i32> = values.iter().map(|raw| info.clamp(*raw)).collect();
				let clamped = stored != values;
				(Value::IntArray(stored), clamped)
			}
			(PropertyKind::Float(info), value @ (Value::Float(_) | Value::Int(_))) if length == 0 => {
				let raw = value.as_float().unwrap_or_default();
				let stored = info.clamp(raw);
				(Value::Float(stored), stored.to_bits() != raw.to_bits())
			}
			(PropertyKind::Float(info), Value::FloatArray(values)) if values.len() == length => {
				let stored: Vec<f32> = values.iter().map(|raw| info.clamp(*raw)).collect();
				let clamped = stored.iter().zip(&values).any(|(stored, raw)| stored.to_bits() != raw.to_bits());
				(Value::FloatArray(stored), clamped)
			}
			(PropertyKind::Enum(info), Value::Enum(raw) | Value::Int(raw)) => {
				let known = if slot.enum_flag { raw & !info.mask() == 0 } else { info.item(raw).is_some() };
				if !known {
					return SetOutcome::Rejected;
				}
				(Value::Enum(raw), false)
			}
			(PropertyKind::String(_), value @ Value::String(_)) => (value, false),
			(PropertyKind::Pointer(_), value @ Value::Pointer(_)) => (value, false),
			(PropertyKind::Collection(_), value @ Value::Collection(_)) => (value, false),
			_ => return SetOutcome::Rejected,
		};
		self.store(index, &value);
		self.slots[index].is_set = true;
		if clamped { SetOutcome::Clamped } else { SetOutcome::Stored }
	}

	fn store(&mut self, index: usize, value: &Value) {
		let slot = &self.slots[index];
		let (offset, size) = (slot.offset, slot.size);
		if slot.dynamic() {
			let handle = u64::from_le_bytes(self.data[offset..offset + 8].try_into().unwrap_or_default());
			match handle.checked_sub(1).and_then(|handle| self.dynamic.get_mut(handle as usize)) {
				Some(existing) => *existing = value.clone(),
				None => {
					self.dynamic.push(value.clone());
					let handle = self.dynamic.len() as u64;
					self.data[offset..offset + 8].copy_from_slice(&handle.to_le_bytes());
				}
			}
			return;
		}
		let words: Vec<[u8; 4]> = match value {
			Value::Bool(value) => vec![i32::from(*value).to_le_bytes()],
			Value::Int(value) | Value::Enum(value) => vec![value.to_le_bytes()],
			Value::Float(value) => vec![value.to_le_bytes()],
			Value::BoolArray(values) => values.iter().map(|value| i32::from(*value).to_le_bytes()).collect(),
			Value::IntArray(values) => values.iter().map(|value| value.to_le_bytes()).collect(),
			Value::FloatArray(values) => values.iter().map(|value| value.to_le_bytes()).collect(),
			_ => Vec::new(),
		};
		let dst = &mut self.data[offset..offset + size];
		for (chunk, word) in dst.chunks_exact_mut(4).zip(words) {
			chunk.copy_from_slice(&word);
		}
	}

	/// Current argument or output value.
	pub fn get(&self, identifier: &str) -> Option<Value> {
		let slot = &self.slots[self.index_of(identifier)?];
		let bytes = self.data.get(slot.offset..slot.offset + slot.size)?;
		if slot.dynamic() {
			let handle = u64::from_le_bytes(bytes[..8].try_into().ok()?);
			return self.dynamic.get(handle.checked_sub(1)? as usize).cloned();
		}
		let count = slot.array_length.max(1);
		let words: Vec<[u8; 4]> = bytes.chunks_exact(4).take(count).map(|chunk| chunk.try_into().ok()).collect::<Option<_>>()?;
		let array = slot.array_length > 0;
		Some(match slot.kind.property_type() {
			PropertyType::Boolean if array => Value::BoolArray(words.iter().map(|word| i32::from_le_bytes(*word) != 0).collect()),
			PropertyType::Boolean => Value::Bool(i32::from_le_bytes(words[0]) != 0),
			PropertyType::Int if array => Value::IntArray(words.iter().map(|word| i32::from_le_bytes(*word)).collect()),
			PropertyType::Int => Value::Int(i32::from_le_bytes(words[0])),
			PropertyType::Float if array => Value::FloatArray(words.iter().map(|word| f32::from_le_bytes(*word)).collect()),
			PropertyType::Float => Value::Float(f32::from_le_bytes(words[0])),
			PropertyType::Enum => Value::Enum(i32::from_le_bytes(words[0])),
			PropertyType::String | PropertyType::Pointer | PropertyType::Collection => return None,
		})
	}

	/// Value of the return parameter.
	pub fn return_value(&self) -> Option<Value> {
		let slot = self.slots.iter().find(|slot| slot.param_flag.contains(ParamFlag::RETURN))?;
		self.get(&slot.identifier)
	}

	fn missing_required(&self) -> Option<&str> {
		self.slots.iter().find(|slot| slot.required && !slot.is_set).map(|slot| &*slot.identifier)
	}

	fn inputs(&self) -> Vec<(Box<str>, Value)> {
		self.slots
			.iter()
			.filter(|slot| !slot.param_flag.intersects(ParamFlag::RETURN | ParamFlag::OUTPUT))
			.filter_map(|slot| Some((slot.identifier.clone(), self.get(&slot.identifier)?)))
			.collect()
	}
}

impl SchemaRegistry {
	/// Invoke `func` on `receiver` with the arguments in `params`.
	///
	/// The return value and outputs written by the target land back in `params`.
	pub fn call(
		&self,
		heap: &mut Heap,
		func: FunctionId,
		receiver: &RnaPointer,
		params: &mut ParameterList,
		context: &CallContext,
		reports: &mut ReportList,
	) -> Result<(), CallError> {
		let def = self.function(func).ok_or(CallError::StaleFunction)?;
		let function = self.function_label(func);
		if params.function() != func {
			return Err(CallError::ParameterMismatch { function });
		}
		if let Some(parameter) = params.missing_required() {
			return Err(CallError::MissingRequired {
				parameter: parameter.to_owned(),
				function,
			});
		}

		let receiver = if def.flag.contains(FuncFlag::NO_SELF) {
			None
		} else {
			if receiver.is_null() {
				return Err(CallError::NullReceiver { function });
			}
			let got = self.refine_struct(heap, receiver);
			if !got.is_some_and(|got| self.is_derived_from(got, def.owner)) {
				return Err(CallError::ReceiverType {
					function,
					expected: self.struct_identifier(def.owner).to_owned(),
					got: got.map_or("<untyped>", |got| self.struct_identifier(got)).to_owned(),
				});
			}
			Some(*receiver)
		};
		let target = match def.call.clone().or_else(|| self.call_targets.get(&def.call_target).cloned()) {
			Some(target) => target,
			None => {
				return Err(CallError::NoCallTarget {
					function,
					target: def.call_target.to_string(),
				});
			}
		};

		let self_id = receiver.filter(|_| def.flag.contains(FuncFlag::USE_SELF_ID)).map(|receiver| receiver.owner);
		let mut frame = CallFrame {
			registry: self,
			heap,
			receiver,
			self_id,
			context: def.flag.contains(FuncFlag::USE_CONTEXT).then_some(context),
			reports: def.flag.contains(FuncFlag::USE_REPORTS).then_some(reports),
			args: params.inputs(),
			outputs: Vec::new(),
		};
		tracing::debug!(%function, args = frame.args.len(), "calling function");
		let returned = target(&mut frame);

		for (identifier, value) in frame.outputs {
			if params.set(&identifier, value) == SetOutcome::Rejected {
				return Err(CallError::OutputRejected {
					function,
					parameter: identifier.to_string(),
				});
			}
		}
		if let (Some(value), Some(param)) = (returned, def.return_param) {
			let identifier = self.property(param).map(|prop| prop.identifier.clone()).unwrap_or_default();
			if params.set(&identifier, value) == SetOutcome::Rejected {
				return Err(CallError::OutputRejected {
					function,
					parameter: identifier.to_string(),
				});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
