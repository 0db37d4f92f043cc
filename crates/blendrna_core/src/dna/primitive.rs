/// Scalar storage types understood by accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
	/// `char`, treated as unsigned like Blender builds it.
	Char,
	/// `uchar` / `uint8_t`.
	UChar,
	/// `int8_t`.
	Int8,
	/// `short` / `int16_t`.
	Short,
	/// `ushort` / `uint16_t`.
	UShort,
	/// `int` / `int32_t`.
	Int,
	/// `uint` / `uint32_t`.
	UInt,
	/// `int64_t`.
	Int64,
	/// `uint64_t`.
	UInt64,
	/// `float`.
	Float,
	/// `double`.
	Double,
	/// `bool`.
	Bool,
}

impl Primitive {
	/// Map a layout type name to its primitive, `None` for structs and unknown names.
	pub fn from_type_name(name: &str) -> Option<Self> {
		Some(match name {
			"char" => Self::Char,
			"uchar" | "uint8_t" => Self::UChar,
			"int8_t" => Self::Int8,
			"short" | "int16_t" => Self::Short,
			"ushort" | "uint16_t" => Self::UShort,
			"int" | "int32_t" => Self::Int,
			"uint" | "uint32_t" => Self::UInt,
			"int64_t" | "long long" => Self::Int64,
			"uint64_t" => Self::UInt64,
			"float" => Self::Float,
			"double" => Self::Double,
			"bool" => Self::Bool,
			_ => return None,
		})
	}

	/// Canonical type name, as written into layout tables.
	pub fn type_name(self) -> &'static str {
		match self {
			Self::Char => "char",
			Self::UChar => "uchar",
			Self::Int8 => "int8_t",
			Self::Short => "short",
			Self::UShort => "ushort",
			Self::Int => "int",
			Self::UInt => "uint",
			Self::Int64 => "int64_t",
			Self::UInt64 => "uint64_t",
			Self::Float => "float",
			Self::Double => "double",
			Self::Bool => "bool",
		}
	}

	/// Storage size in bytes.
	pub fn size(self) -> usize {
		match self {
			Self::Char | Self::UChar | Self::Int8 | Self::Bool => 1,
			Self::Short | Self::UShort => 2,
			Self::Int | Self::UInt | Self::Float => 4,
			Self::Int64 | Self::UInt64 | Self::Double => 8,
		}
	}

	/// Whether values are floating point.
	pub fn is_float(self) -> bool {
		matches!(self, Self::Float | Self::Double)
	}

	/// Representable range clipped to `i32`, `None` for floating point storage.
	pub fn int_range(self) -> Option<(i32, i32)> {
		Some(match self {
			Self::Char | Self::UChar => (0, 255),
			Self::Bool => (0, 1),
			Self::Int8 => (i32::from(i8::MIN), i32::from(i8::MAX)),
			Self::Short => (i32::from(i16::MIN), i32::from(i16::MAX)),
			Self::UShort => (0, i32::from(u16::MAX)),
			Self::Int | Self::Int64 => (i32::MIN, i32::MAX),
			Self::UInt | Self::UInt64 => (0, i32::MAX),
			Self::Float | Self::Double => return None,
		})
	}

	/// Read a little-endian value as `i64`; floats truncate.
	pub fn read_int(self, bytes: &[u8]) -> Option<i64> {
		let raw = bytes.get(..self.size())?;
		Some(match self {
			Self::Char | Self::UChar | Self::Bool => i64::from(raw[0]),
			Self::Int8 => i64::from(raw[0] as i8),
			Self::Short => i64::from(i16::from_le_bytes([raw[0], raw[1]])),
			Self::UShort => i64::from(u16::from_le_bytes([raw[0], raw[1]])),
			Self::Int => i64::from(i32::from_le_bytes(raw.try_into().ok()?)),
			Self::UInt => i64::from(u32::from_le_bytes(raw.try_into().ok()?)),
			Self::Int64 => i64::from_le_bytes(raw.try_into().ok()?),
			Self::UInt64 => u64::from_le_bytes(raw.try_into().ok()?).min(i64::MAX as u64) as i64,
			Self::Float | Self::Double => self.read_float(bytes)? as i64,
		})
	}

	/// Read a little-endian value as `f64`.
	pub fn read_float(self, bytes: &[u8]) -> Option<f64> {
		let raw = bytes.get(..self.size())?;
		match self {
			Self::Float => Some(f64::from(f32::from_le_bytes(raw.try_into().ok()?))),
			Self::Double => Some(f64::from_le_bytes(raw.try_into().ok()?)),
			_ => self.read_int(bytes).map(|value| value as f64),
		}
	}

	/// Write `value` truncated to the storage width.
	pub fn write_int(self, bytes: &mut [u8], value: i64) -> bool {
		let Some(raw) = bytes.get_mut(..self.size()) else {
			return false;
		};
		match self {
			Self::Char | Self::UChar | Self::Int8 | Self::Bool => raw[0] = value as u8,
			Self::Short | Self::UShort => raw.copy_from_slice(&(value as u16).to_le_bytes()),
			Self::Int | Self::UInt => raw.copy_from_slice(&(value as u32).to_le_bytes()),
			Self::Int64 | Self::UInt64 => raw.copy_from_slice(&value.to_le_bytes()),
			Self::Float => raw.copy_from_slice(&(value as f32).to_le_bytes()),
			Self::Double => raw.copy_from_slice(&(value as f64).to_le_bytes()),
		}
		true
	}

	/// Write `value`; integer storage rounds to nearest.
	pub fn write_float(self, bytes: &mut [u8], value: f64) -> bool {
		let Some(raw) = bytes.get_mut(..self.size()) else {
			return false;
		};
		match self {
			Self::Float => raw.copy_from_slice(&(value as f32).to_le_bytes()),
			Self::Double => raw.copy_from_slice(&value.to_le_bytes()),
			_ => return self.write_int(bytes, value.round() as i64),
		}
		true
	}
}
