use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rna::arena::{ArenaId, Key};
use crate::rna::{Access, AccessMut, Accessors, ParamFlag, PropFlag, PropInternal, PropertyBinding, RawAccess, Refine, RnaPointer, SchemaRegistry, StructFlag, FuncFlag};

macro_rules! handle {
	($(#[$doc:meta])* $name:ident) => {
		$(#[$doc])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(Key);

		impl ArenaId for $name {
			fn from_key(key: Key) -> Self {
				Self(key)
			}

			fn key(self) -> Key {
				self.0
			}
		}

		impl $name {
			/// Slot index, stable while the descriptor lives.
			pub fn index(self) -> u32 {
				self.0.index
			}

			/// Slot generation; bumped whenever the slot is freed.
			pub fn generation(self) -> u32 {
				self.0.generation
			}
		}
	};
}

handle!(
	/// Handle to a [`StructDef`].
	StructId
);
handle!(
	/// Handle to a [`PropertyDef`].
	PropertyId
);
handle!(
	/// Handle to a [`FunctionDef`].
	FunctionId
);

/// Shared callback stored on a descriptor.
pub struct Hook<F: ?Sized>(pub(crate) Arc<F>);

impl<F: ?Sized> Clone for Hook<F> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Hook(..)")
	}
}

impl<F: ?Sized> Deref for Hook<F> {
	type Target = F;

	fn deref(&self) -> &F {
		&self.0
	}
}

/// Resolves the concrete struct of a pointer target or an instance.
pub type TypeFn = dyn Fn(&Access<'_>, &RnaPointer) -> Option<StructId> + Send + Sync;
/// Produces a textual locator for an instance.
pub type PathFn = dyn Fn(&Access<'_>, &RnaPointer) -> Option<String> + Send + Sync;
/// Runs after a property value changed on an instance.
pub type UpdateFn = dyn Fn(&mut AccessMut<'_>, &RnaPointer, PropertyId) + Send + Sync;
/// Decides per instance whether a property may be written.
pub type EditableFn = dyn Fn(&Access<'_>, &RnaPointer) -> bool + Send + Sync;
/// Accepts or refuses a pointer target for the owning instance.
pub type PollFn = dyn Fn(&Access<'_>, &RnaPointer, &RnaPointer) -> bool + Send + Sync;
/// Creates a runtime subtype of `base` named `identifier`.
pub type RegisterFn = dyn Fn(&mut SchemaRegistry, StructId, &str) -> Option<StructId> + Send + Sync;
/// Tears down a runtime subtype before it is released.
pub type UnregisterFn = dyn Fn(&mut SchemaRegistry, StructId) + Send + Sync;

/// Property value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
	/// `bool`, optionally encoded as a bit.
	Boolean,
	/// `i32` with hard and soft bounds.
	Int,
	/// `f32` with hard and soft bounds.
	Float,
	/// Text.
	String,
	/// Integer value restricted to declared items.
	Enum,
	/// Reference to one instance of a struct.
	Pointer,
	/// Ordered sequence of instances of a struct.
	Collection,
}

impl PropertyType {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Boolean => "boolean",
			Self::Int => "int",
			Self::Float => "float",
			Self::String => "string",
			Self::Enum => "enum",
			Self::Pointer => "pointer",
			Self::Collection => "collection",
		}
	}

	/// Whether the kind admits a fixed array length.
	pub fn supports_array(self) -> bool {
		matches!(self, Self::Boolean | Self::Int | Self::Float)
	}
}

impl fmt::Display for PropertyType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Semantic refinement of a property kind; affects default bounds and presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySubtype {
	/// No special meaning.
	#[default]
	None,
	/// File path string.
	FilePath,
	/// Directory path string.
	DirPath,
	/// File name string.
	FileName,
	/// Bytes rather than text.
	ByteString,
	/// Hidden text.
	Password,
	/// Screen pixels.
	Pixel,
	/// Non-negative number.
	Unsigned,
	/// 0 to 100.
	Percentage,
	/// 0 to 1.
	Factor,
	/// Radians.
	Angle,
	/// Frames.
	Time,
	/// Scene units.
	Distance,
	/// Linear color.
	Color,
	/// Location vector.
	Translation,
	/// Normalized direction.
	Direction,
	/// Velocity vector.
	Velocity,
	/// Acceleration vector.
	Acceleration,
	/// Matrix elements.
	Matrix,
	/// Euler rotation.
	Euler,
	/// Quaternion rotation.
	Quaternion,
	/// Axis and angle rotation.
	AxisAngle,
	/// Generic 3D vector.
	Xyz,
	/// Gamma-corrected color.
	ColorGamma,
	/// Layer bitset.
	Layer,
}

/// One enum item; an empty identifier marks a separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
	/// Stored value.
	pub value: i32,
	/// Identifier used by scripts.
	pub identifier: Box<str>,
	/// Display name.
	#[serde(default)]
	pub name: Box<str>,
	/// Tooltip text.
	#[serde(default)]
	pub description: Box<str>,
}

impl EnumItem {
	/// Item with a display name.
	pub fn new(value: i32, identifier: &str, name: &str) -> Self {
		Self {
			value,
			identifier: identifier.into(),
			name: name.into(),
			description: "".into(),
		}
	}

	/// Separator entry for UI grouping.
	pub fn separator() -> Self {
		Self::new(0, "", "")
	}

	/// Whether this entry is a separator.
	pub fn is_separator(&self) -> bool {
		self.identifier.is_empty()
	}
}

/// Boolean payload.
#[derive(Debug, Clone, Default)]
pub struct BooleanInfo {
	/// Scalar default.
	pub default: bool,
	/// Per-element default for arrays.
	pub array_default: Vec<bool>,
}

/// Int payload.
#[derive(Debug, Clone)]
pub struct IntInfo {
	/// Lowest storable value.
	pub hard_min: i32,
	/// Highest storable value.
	pub hard_max: i32,
	/// Lowest value offered by UI.
	pub soft_min: i32,
	/// Highest value offered by UI.
	pub soft_max: i32,
	/// UI step.
	pub step: i32,
	/// Scalar default.
	pub default: i32,
	/// Per-element default for arrays.
	pub array_default: Vec<i32>,
}

impl IntInfo {
	/// Clamp to the hard range.
	pub fn clamp(&self, value: i32) -> i32 {
		value.clamp(self.hard_min, self.hard_max)
	}
}

/// Float payload.
#[derive(Debug, Clone)]
pub struct FloatInfo {
	/// Lowest storable value.
	pub hard_min: f32,
	/// Highest storable value.
	pub hard_max: f32,
	/// Lowest value offered by UI.
	pub soft_min: f32,
	/// Highest value offered by UI.
	pub soft_max: f32,
	/// UI step, in hundredths.
	pub step: f32,
	/// Displayed decimal digits.
	pub precision: u8,
	/// Scalar default.
	pub default: f32,
	/// Per-element default for arrays.
	pub array_default: Vec<f32>,
}

impl FloatInfo {
	/// Clamp to the hard range; NaN is stored as the lower bound.
	pub fn clamp(&self, value: f32) -> f32 {
		if value.is_nan() { self.hard_min } else { value.clamp(self.hard_min, self.hard_max) }
	}
}

/// String payload.
#[derive(Debug, Clone, Default)]
pub struct StringInfo {
	/// Maximum byte length including the terminator; `0` is unbounded.
	pub max_length: usize,
	/// Default text.
	pub default: Box<str>,
}

/// Enum payload.
#[derive(Debug, Clone, Default)]
pub struct EnumInfo {
	/// Items in declaration order.
	pub items: Vec<EnumItem>,
	/// Default value.
	pub default: i32,
}

impl EnumInfo {
	/// Non-separator items.
	pub fn values(&self) -> impl Iterator<Item = &EnumItem> {
		self.items.iter().filter(|item| !item.is_separator())
	}

	/// Union of all item values, for bitflag enums.
	pub fn mask(&self) -> i32 {
		self.values().fold(0, |acc, item| acc | item.value)
	}

	/// Item by value.
	pub fn item(&self, value: i32) -> Option<&EnumItem> {
		self.values().find(|item| item.value == value)
	}

	/// Item by identifier.
	pub fn item_by_identifier(&self, identifier: &str) -> Option<&EnumItem> {
		self.values().find(|item| &*item.identifier == identifier)
	}
}

/// Reference to a struct that may not be defined yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructRef {
	/// By identifier, resolved during generation.
	Named(Box<str>),
	/// Resolved handle.
	Resolved(StructId),
}

impl StructRef {
	/// Resolved handle, if any.
	pub fn id(&self) -> Option<StructId> {
		match self {
			Self::Resolved(id) => Some(*id),
			Self::Named(_) => None,
		}
	}
}

/// Pointer payload.
#[derive(Debug, Clone, Default)]
pub struct PointerInfo {
	/// Declared target struct.
	pub target: Option<StructRef>,
	/// Dynamic target type override.
	pub type_fn: Option<Hook<TypeFn>>,
}

/// Collection payload.
#[derive(Debug, Clone, Default)]
pub struct CollectionInfo {
	/// Declared item struct.
	pub item: Option<StructRef>,
}

/// Kind-specific property payload.
#[derive(Debug, Clone)]
pub enum PropertyKind {
	/// Boolean payload.
	Boolean(BooleanInfo),
	/// Int payload.
	Int(IntInfo),
	/// Float payload.
	Float(FloatInfo),
	/// String payload.
	String(StringInfo),
	/// Enum payload.
	Enum(EnumInfo),
	/// Pointer payload.
	Pointer(PointerInfo),
	/// Collection payload.
	Collection(CollectionInfo),
}

impl PropertyKind {
	/// Fresh payload with the default bounds for `subtype`.
	pub fn new(ty: PropertyType, subtype: PropertySubtype) -> Self {
		let unsigned = subtype == PropertySubtype::Unsigned;
		match ty {
			PropertyType::Boolean => Self::Boolean(BooleanInfo::default()),
			PropertyType::Int => Self::Int(IntInfo {
				hard_min: if unsigned { 0 } else { i32::MIN },
				hard_max: i32::MAX,
				soft_min: if unsigned { 0 } else { -10000 },
				soft_max: 10000,
				step: 1,
				default: 0,
				array_default: Vec::new(),
			}),
			PropertyType::Float => {
				let mut info = FloatInfo {
					hard_min: if unsigned { 0.0 } else { -f32::MAX },
					hard_max: f32::MAX,
					soft_min: if unsigned { 0.0 } else { -10000.0 },
					soft_max: 10000.0,
					step: 10.0,
					precision: 3,
					default: 0.0,
					array_default: Vec::new(),
				};
				match subtype {
					PropertySubtype::Color | PropertySubtype::ColorGamma => {
						info.hard_min = 0.0;
						info.soft_max = 1.0;
					}
					PropertySubtype::Factor => {
						info.hard_min = 0.0;
						info.soft_min = 0.0;
						info.hard_max = 1.0;
						info.soft_max = 1.0;
					}
					_ => {}
				}
				Self::Float(info)
			}
			PropertyType::String => Self::String(StringInfo::default()),
			PropertyType::Enum => Self::Enum(EnumInfo::default()),
			PropertyType::Pointer => Self::Pointer(PointerInfo::default()),
			PropertyType::Collection => Self::Collection(CollectionInfo::default()),
		}
	}

	/// Kind tag.
	pub fn property_type(&self) -> PropertyType {
		match self {
			Self::Boolean(_) => PropertyType::Boolean,
			Self::Int(_) => PropertyType::Int,
			Self::Float(_) => PropertyType::Float,
			Self::String(_) => PropertyType::String,
			Self::Enum(_) => PropertyType::Enum,
			Self::Pointer(_) => PropertyType::Pointer,
			Self::Collection(_) => PropertyType::Collection,
		}
	}

	/// Declared pointer target or collection item struct.
	pub fn struct_ref(&self) -> Option<&StructRef> {
		match self {
			Self::Pointer(info) => info.target.as_ref(),
			Self::Collection(info) => info.item.as_ref(),
			_ => None,
		}
	}
}

/// Descriptor owning a property: a struct, or a function for parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
	/// Struct property.
	Struct(StructId),
	/// Function parameter.
	Function(FunctionId),
}

impl From<StructId> for Container {
	fn from(id: StructId) -> Self {
		Self::Struct(id)
	}
}

impl From<FunctionId> for Container {
	fn from(id: FunctionId) -> Self {
		Self::Function(id)
	}
}

/// Property descriptor.
#[derive(Debug, Clone)]
pub struct PropertyDef {
	/// Identifier, unique within its container.
	pub identifier: Box<str>,
	/// Display name.
	pub name: Box<str>,
	/// Tooltip text.
	pub description: Box<str>,
	/// Owning struct or function.
	pub owner: Container,
	/// Public flags.
	pub flag: PropFlag,
	/// Registry-managed flags.
	pub internal: PropInternal,
	/// Parameter flags, for function parameters.
	pub param_flag: ParamFlag,
	/// Semantic subtype.
	pub subtype: PropertySubtype,
	/// Element count; `0` for scalars.
	pub array_length: usize,
	/// Kind payload.
	pub kind: PropertyKind,
	/// Memory location, when bound to a layout member.
	pub binding: Option<PropertyBinding>,
	/// Hand-written accessors; they win over generated ones.
	pub overrides: Accessors,
	/// Accessors in effect after generation.
	pub accessors: Accessors,
	/// Direct memory access annotation.
	pub raw: Option<RawAccess>,
	/// Called after a successful write.
	pub update: Option<Hook<UpdateFn>>,
	/// Per-instance editability, consulted after [`PropFlag::EDITABLE`].
	pub editable: Option<Hook<EditableFn>>,
	/// Pointer target filter.
	pub poll: Option<Hook<PollFn>>,
	pub(crate) refcount: u32,
}

impl PropertyDef {
	/// Kind tag.
	pub fn property_type(&self) -> PropertyType {
		self.kind.property_type()
	}

	/// Whether the property holds a fixed-length array.
	pub fn is_array(&self) -> bool {
		self.array_length > 0
	}

	/// Whether runtime writes are allowed.
	pub fn is_editable(&self) -> bool {
		self.flag.contains(PropFlag::EDITABLE)
	}
}

/// Struct descriptor.
#[derive(Debug, Clone)]
pub struct StructDef {
	/// Identifier, unique in the registry.
	pub identifier: Box<str>,
	/// Display name.
	pub name: Box<str>,
	/// Tooltip text.
	pub description: Box<str>,
	/// Flags.
	pub flag: StructFlag,
	/// Base struct; properties of the base chain come first.
	pub base: Option<StructId>,
	/// Layout struct the properties bind into.
	pub sdna: Option<Box<str>>,
	/// Member of `sdna` holding the bound data, when instances point at an enclosing struct.
	pub sdna_member: Option<Box<str>>,
	/// String property naming instances.
	pub name_property: Option<PropertyId>,
	/// Collection property iterated when the struct is treated as a sequence.
	pub iterator_property: Option<PropertyId>,
	/// Dynamic type resolution.
	pub refine: Option<Refine>,
	/// Locator callback.
	pub path: Option<Hook<PathFn>>,
	/// Subtype registration callback.
	pub register: Option<Hook<RegisterFn>>,
	/// Subtype removal callback.
	pub unregister: Option<Hook<UnregisterFn>>,
	/// Own properties in definition order.
	pub properties: Vec<PropertyId>,
	/// Own functions in definition order.
	pub functions: Vec<FunctionId>,
	pub(crate) refcount: u32,
}

/// Function descriptor.
#[derive(Debug, Clone)]
pub struct FunctionDef {
	/// Identifier, unique within the owning struct.
	pub identifier: Box<str>,
	/// Tooltip text.
	pub description: Box<str>,
	/// Flags.
	pub flag: FuncFlag,
	/// Owning struct.
	pub owner: StructId,
	/// Parameters in declaration order, return slot included.
	pub parameters: Vec<PropertyId>,
	/// Return parameter.
	pub return_param: Option<PropertyId>,
	/// Name of the call target.
	pub call_target: Box<str>,
	pub(crate) call: Option<Hook<crate::rna::CallFn>>,
	pub(crate) refcount: u32,
}
