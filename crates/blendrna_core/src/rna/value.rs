use crate::rna::{FunctionId, PropertyId, StructId};

/// What an [`RnaPointer`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
	/// Nothing.
	Null,
	/// Instance memory at an address.
	Heap(u64),
	/// A struct descriptor, viewed through the `Struct` meta struct.
	Struct(StructId),
	/// A property descriptor, viewed through the `Property` meta struct.
	Property(PropertyId),
	/// A function descriptor, viewed through the `Function` meta struct.
	Function(FunctionId),
	/// One item of an enum property, by position.
	EnumItem(PropertyId, u32),
}

/// Typed reference to an instance: owning identified object, struct, and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RnaPointer {
	/// Address of the identified object owning the data; `0` when unowned.
	pub owner: u64,
	/// Struct describing the target.
	pub struct_type: Option<StructId>,
	/// Target.
	pub target: Target,
}

impl RnaPointer {
	/// Null reference.
	pub const NULL: Self = Self {
		owner: 0,
		struct_type: None,
		target: Target::Null,
	};

	/// Null reference.
	pub fn null() -> Self {
		Self::NULL
	}

	/// Reference to an identified object; it owns itself.
	pub fn new_id(struct_type: StructId, addr: u64) -> Self {
		if addr == 0 {
			return Self::NULL;
		}
		Self {
			owner: addr,
			struct_type: Some(struct_type),
			target: Target::Heap(addr),
		}
	}

	/// Reference to unowned instance memory.
	pub fn new(struct_type: StructId, addr: u64) -> Self {
		if addr == 0 {
			return Self::NULL;
		}
		Self {
			owner: 0,
			struct_type: Some(struct_type),
			target: Target::Heap(addr),
		}
	}

	/// Reference to data nested under `parent`, inheriting its owner.
	pub fn with_parent(parent: &RnaPointer, struct_type: StructId, addr: u64) -> Self {
		if addr == 0 {
			return Self::NULL;
		}
		Self {
			owner: parent.owner,
			struct_type: Some(struct_type),
			target: Target::Heap(addr),
		}
	}

	/// Reference to a non-memory target such as a descriptor.
	pub fn to_target(struct_type: StructId, target: Target) -> Self {
		Self {
			owner: 0,
			struct_type: Some(struct_type),
			target,
		}
	}

	/// Whether the reference points at nothing.
	pub fn is_null(&self) -> bool {
		self.target == Target::Null
	}

	/// Heap address, when the target is instance memory.
	pub fn addr(&self) -> Option<u64> {
		match self.target {
			Target::Heap(addr) => Some(addr),
			_ => None,
		}
	}
}

/// Dynamically typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Boolean scalar.
	Bool(bool),
	/// Int scalar.
	Int(i32),
	/// Float scalar.
	Float(f32),
	/// Text.
	String(String),
	/// Enum value; bitflag enums hold the OR of set items.
	Enum(i32),
	/// Reference, possibly null.
	Pointer(RnaPointer),
	/// Boolean array.
	BoolArray(Vec<bool>),
	/// Int array.
	IntArray(Vec<i32>),
	/// Float array.
	FloatArray(Vec<f32>),
	/// Collection items in iteration order.
	Collection(Vec<RnaPointer>),
}

impl Value {
	/// Kind label.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::Enum(_) => "enum",
			Self::Pointer(_) => "pointer",
			Self::BoolArray(_) => "bool array",
			Self::IntArray(_) => "int array",
			Self::FloatArray(_) => "float array",
			Self::Collection(_) => "collection",
		}
	}

	/// Boolean scalar.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(value) => Some(*value),
			_ => None,
		}
	}

	/// Int or enum scalar.
	pub fn as_int(&self) -> Option<i32> {
		match self {
			Self::Int(value) | Self::Enum(value) => Some(*value),
			_ => None,
		}
	}

	/// Float scalar; ints widen.
	pub fn as_float(&self) -> Option<f32> {
		match self {
			Self::Float(value) => Some(*value),
			Self::Int(value) => Some(*value as f32),
			_ => None,
		}
	}

	/// Text.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value),
			_ => None,
		}
	}

	/// Reference.
	pub fn as_pointer(&self) -> Option<RnaPointer> {
		match self {
			Self::Pointer(value) => Some(*value),
			_ => None,
		}
	}

	/// Convert to JSON for ad hoc storage and reports.
	pub fn to_json(&self) -> serde_json::Value {
		use serde_json::json;
		match self {
			Self::Bool(value) => json!(value),
			Self::Int(value) | Self::Enum(value) => json!(value),
			Self::Float(value) => json!(value),
			Self::String(value) => json!(value),
			Self::Pointer(value) => json!(value.addr()),
			Self::BoolArray(values) => json!(values),
			Self::IntArray(values) => json!(values),
			Self::FloatArray(values) => json!(values),
			Self::Collection(values) => json!(values.iter().map(RnaPointer::addr).collect::<Vec<_>>()),
		}
	}
}

/// Result of a runtime write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
	/// Stored as given.
	Stored,
	/// Stored after clamping to the hard range.
	Clamped,
	/// Not stored: read-only, wrong kind, unknown enum value, or unmapped memory.
	Rejected,
}
