use serde::Serialize;

use crate::dna::{FieldBinding, Heap, Primitive};
use crate::rna::{
	Access, Accessors, IterState, LengthSource, PropertyBinding, PropertyDef, PropertyKind, PropertyType, RnaPointer, StructId, Value, field_address,
};

/// Accessor shape chosen for a bound property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
	/// Whole integer member as a boolean.
	BooleanField,
	/// One bit of an integer member.
	BooleanBit,
	/// Integer array member, one boolean per element.
	BooleanArray,
	/// Integer array member, one bit per element.
	BooleanBitArray,
	/// Consecutive bits of one integer member.
	BooleanBitset,
	/// Integer scalar.
	IntScalar,
	/// Integer array.
	IntArray,
	/// Floating point scalar.
	FloatScalar,
	/// Floating point array.
	FloatArray,
	/// Byte storage scaled to `0..=1`.
	FloatFromByte,
	/// Integer holding one item value.
	EnumScalar,
	/// Integer holding a bit set of item values.
	EnumBitflag,
	/// Inline `char` array.
	StringInline,
	/// `char *` member.
	StringPointer,
	/// Struct pointer member.
	PointerField,
	/// Struct embedded by value.
	PointerEmbedded,
	/// `ListBase` linked list.
	CollectionListBase,
	/// Contiguous array of items.
	CollectionArray,
	/// Array of item pointers.
	CollectionPointerArray,
	/// Ad hoc per-instance value without a layout member.
	IdProperty,
}

impl Template {
	/// Stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::BooleanField => "boolean_field",
			Self::BooleanBit => "boolean_bit",
			Self::BooleanArray => "boolean_array",
			Self::BooleanBitArray => "boolean_bit_array",
			Self::BooleanBitset => "boolean_bitset",
			Self::IntScalar => "int_scalar",
			Self::IntArray => "int_array",
			Self::FloatScalar => "float_scalar",
			Self::FloatArray => "float_array",
			Self::FloatFromByte => "float_from_byte",
			Self::EnumScalar => "enum_scalar",
			Self::EnumBitflag => "enum_bitflag",
			Self::StringInline => "string_inline",
			Self::StringPointer => "string_pointer",
			Self::PointerField => "pointer_field",
			Self::PointerEmbedded => "pointer_embedded",
			Self::CollectionListBase => "collection_list_base",
			Self::CollectionArray => "collection_array",
			Self::CollectionPointerArray => "collection_pointer_array",
			Self::IdProperty => "id_property",
		}
	}
}

/// Pick the template for a bound property.
pub(crate) fn select(def: &PropertyDef, binding: &PropertyBinding) -> Option<Template> {
	let field = &binding.field;
	let array = def.array_length > 0;
	Some(match def.property_type() {
		PropertyType::Boolean if binding.bitset_array => Template::BooleanBitset,
		PropertyType::Boolean if array && binding.bit != 0 => Template::BooleanBitArray,
		PropertyType::Boolean if array => Template::BooleanArray,
		PropertyType::Boolean if binding.bit != 0 => Template::BooleanBit,
		PropertyType::Boolean => Template::BooleanField,
		PropertyType::Int if array => Template::IntArray,
		PropertyType::Int => Template::IntScalar,
		PropertyType::Float if !field.primitive?.is_float() => Template::FloatFromByte,
		PropertyType::Float if array => Template::FloatArray,
		PropertyType::Float => Template::FloatScalar,
		PropertyType::Enum if binding.enum_bitflags => Template::EnumBitflag,
		PropertyType::Enum => Template::EnumScalar,
		PropertyType::String if field.pointer_level == 1 => Template::StringPointer,
		PropertyType::String => Template::StringInline,
		PropertyType::Pointer if field.pointer_level == 1 => Template::PointerField,
		PropertyType::Pointer => Template::PointerEmbedded,
		PropertyType::Collection => match (&binding.length, field.pointer_level) {
			(None, _) => Template::CollectionListBase,
			(Some(_), 2) => Template::CollectionPointerArray,
			(Some(_), _) => Template::CollectionArray,
		},
	})
}

/// Values resolved at generation time that accessors close over.
pub(crate) struct TemplateInput {
	pub(crate) identifier: Box<str>,
	pub(crate) binding: Option<PropertyBinding>,
	pub(crate) array_length: usize,
	pub(crate) kind: PropertyKind,
	pub(crate) editable: bool,
	/// Pointer or collection item struct.
	pub(crate) target: Option<StructId>,
	/// Target struct is an identified object.
	pub(crate) target_is_id: bool,
	/// Size of one item, for item arrays reached through a pointer.
	pub(crate) item_size: usize,
}

fn member_addr(heap: &Heap, ptr: &RnaPointer, field: &FieldBinding) -> Option<u64> {
	field_address(heap, ptr.addr()?, field)
}

fn read_ints(heap: &Heap, addr: u64, primitive: Primitive, count: usize) -> Option<Vec<i64>> {
	let size = primitive.size();
	let bytes = heap.bytes(addr, size * count)?;
	bytes.chunks_exact(size).map(|chunk| primitive.read_int(chunk)).collect()
}

fn read_floats(heap: &Heap, addr: u64, primitive: Primitive, count: usize) -> Option<Vec<f64>> {
	let size = primitive.size();
	let bytes = heap.bytes(addr, size * count)?;
	bytes.chunks_exact(size).map(|chunk| primitive.read_float(chunk)).collect()
}

fn write_int(heap: &mut Heap, addr: u64, primitive: Primitive, value: i64) -> bool {
	heap.bytes_mut(addr, primitive.size()).is_some_and(|bytes| primitive.write_int(bytes, value))
}

fn write_float(heap: &mut Heap, addr: u64, primitive: Primitive, value: f64) -> bool {
	heap.bytes_mut(addr, primitive.size()).is_some_and(|bytes| primitive.write_float(bytes, value))
}

fn element_addr(addr: u64, index: usize, primitive: Primitive) -> Option<u64> {
	addr.checked_add(u64::try_from(index.checked_mul(primitive.size())?).ok()?)
}

fn to_i32(value: i64) -> i32 {
	value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn item_pointer(parent: &RnaPointer, target: StructId, is_id: bool, addr: u64) -> RnaPointer {
	if is_id { RnaPointer::new_id(target, addr) } else { RnaPointer::with_parent(parent, target, addr) }
}

/// Build the accessor set for `template`.
pub(crate) fn build(template: Template, input: TemplateInput) -> Accessors {
	if template == Template::IdProperty {
		return id_property(input);
	}
	let Some(binding) = input.binding.clone() else {
		return Accessors::default();
	};
	let field = binding.field.clone();
	let Some(primitive) = field.primitive.or((field.pointer_level > 0).then_some(Primitive::UInt64)) else {
		return match template {
			Template::PointerEmbedded => pointer_embedded(&input, field),
			Template::CollectionListBase => collection_list_base(&input, field),
			Template::CollectionArray => collection_array(&input, binding),
			_ => Accessors::default(),
		};
	};
	let count = input.array_length.max(1);
	let accessors = match template {
		Template::BooleanField | Template::BooleanBit => {
			let (bit, negative) = (binding.bit, binding.negative);
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					let raw = read_ints(access.heap, addr, primitive, 1)?[0];
					let set = if bit == 0 { raw != 0 } else { raw as u64 & bit != 0 };
					Some(Value::Bool(set != negative))
				})
				.with_set(move |access, ptr, value| {
					let (Some(value), Some(addr)) = (value.as_bool(), member_addr(access.heap, ptr, &field)) else {
						return false;
					};
					let on = value != negative;
					let raw = if bit == 0 {
						i64::from(on)
					} else {
						let Some(current) = read_ints(access.heap, addr, primitive, 1) else {
							return false;
						};
						let current = current[0] as u64;
						(if on { current | bit } else { current & !bit }) as i64
					};
					write_int(access.heap, addr, primitive, raw)
				})
		}
		Template::BooleanArray | Template::BooleanBitArray => {
			let (bit, negative) = (binding.bit, binding.negative);
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					let raw = read_ints(access.heap, addr, primitive, count)?;
					Some(Value::BoolArray(
						raw.into_iter()
							.map(|raw| (if bit == 0 { raw != 0 } else { raw as u64 & bit != 0 }) != negative)
							.collect(),
					))
				})
				.with_set(move |access, ptr, value| {
					let (Value::BoolArray(values), Some(addr)) = (value, member_addr(access.heap, ptr, &field)) else {
						return false;
					};
					let Some(current) = read_ints(access.heap, addr, primitive, count) else {
						return false;
					};
					values.iter().zip(current).enumerate().all(|(index, (value, current))| {
						let on = *value != negative;
						let raw = match bit {
							0 => i64::from(on),
							_ if on => (current as u64 | bit) as i64,
							_ => (current as u64 & !bit) as i64,
						};
						element_addr(addr, index, primitive).is_some_and(|addr| write_int(access.heap, addr, primitive, raw))
					})
				})
		}
		Template::BooleanBitset => {
			let (bit, negative) = (binding.bit.max(1), binding.negative);
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					let raw = read_ints(access.heap, addr, primitive, 1)?[0] as u64;
					Some(Value::BoolArray((0..count).map(|index| (raw & (bit << index) != 0) != negative).collect()))
				})
				.with_set(move |access, ptr, value| {
					let (Value::BoolArray(values), Some(addr)) = (value, member_addr(access.heap, ptr, &field)) else {
						return false;
					};
					let Some(current) = read_ints(access.heap, addr, primitive, 1) else {
						return false;
					};
					let raw = values.iter().enumerate().fold(current[0] as u64, |raw, (index, value)| {
						if *value != negative { raw | (bit << index) } else { raw & !(bit << index) }
					});
					write_int(access.heap, addr, primitive, raw as i64)
				})
		}
		Template::IntScalar | Template::EnumScalar => {
			let is_enum = template == Template::EnumScalar;
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					let value = to_i32(read_ints(access.heap, addr, primitive, 1)?[0]);
					Some(if is_enum { Value::Enum(value) } else { Value::Int(value) })
				})
				.with_set(move |access, ptr, value| {
					let (Some(value), Some(addr)) = (value.as_int(), member_addr(access.heap, ptr, &field)) else {
						return false;
					};
					write_int(access.heap, addr, primitive, i64::from(value))
				})
		}
		Template::EnumBitflag => {
			let mask = match &input.kind {
				PropertyKind::Enum(info) => i64::from(info.mask()),
				_ => 0,
			};
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					Some(Value::Enum(to_i32(read_ints(access.heap, addr, primitive, 1)?[0] & mask)))
				})
				.with_set(move |access, ptr, value| {
					let (Some(value), Some(addr)) = (value.as_int(), member_addr(access.heap, ptr, &field)) else {
						return false;
					};
					let Some(current) = read_ints(access.heap, addr, primitive, 1) else {
						return false;
					};
					write_int(access.heap, addr, primitive, (current[0] & !mask) | (i64::from(value) & mask))
				})
		}
		Template::IntArray => {
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					Some(Value::IntArray(read_ints(access.heap, addr, primitive, count)?.into_iter().map(to_i32).collect()))
				})
				.with_set(move |access, ptr, value| {
					let (Value::IntArray(values), Some(addr)) = (value, member_addr(access.heap, ptr, &field)) else {
						return false;
					};
					values
						.iter()
						.enumerate()
						.all(|(index, value)| element_addr(addr, index, primitive).is_some_and(|addr| write_int(access.heap, addr, primitive, i64::from(*value))))
				})
		}
		Template::FloatScalar | Template::FloatArray | Template::FloatFromByte => {
			let scale = if template == Template::FloatFromByte { 255.0 } else { 1.0 };
			let array = input.array_length > 0;
			let read_field = field.clone();
			Accessors::default()
				.with_get(move |access, ptr| {
					let addr = member_addr(access.heap, ptr, &read_field)?;
					let values: Vec<f32> = read_floats(access.heap, addr, primitive, count)?.into_iter().map(|value| (value / scale) as f32).collect();
					Some(if array { Value::FloatArray(values) } else { Value::Float(values[0]) })
				})
				.with_set(move |access, ptr, value| {
					let Some(addr) = member_addr(access.heap, ptr, &field) else {
						return false;
					};
					let values = match value {
						Value::FloatArray(values) if array => values.clone(),
						Value::Float(_) | Value::Int(_) if !array => value.as_float().into_iter().collect(),
						_ => return false,
					};
					values
						.iter()
						.enumerate()
						.all(|(index, value)| element_addr(addr, index, primitive).is_some_and(|addr| write_float(access.heap, addr, primitive, f64::from(*value) * scale)))
				})
		}
		Template::StringInline => {
			let capacity = field.array_length;
			string_inline(field, capacity)
		}
		Template::StringPointer => string_pointer(field),
		Template::PointerField => pointer_field(&input, field),
		Template::CollectionArray | Template::CollectionPointerArray => collection_array(&input, binding),
		Template::PointerEmbedded | Template::CollectionListBase | Template::IdProperty => Accessors::default(),
	};
	read_only(accessors, input.editable)
}

fn read_only(mut accessors: Accessors, editable: bool) -> Accessors {
	if !editable {
		accessors.set = None;
	}
	accessors
}

fn string_inline(field: FieldBinding, capacity: usize) -> Accessors {
	let read_field = field.clone();
	let length_field = field.clone();
	Accessors::default()
		.with_get(move |access, ptr| {
			let addr = member_addr(access.heap, ptr, &read_field)?;
			Some(Value::String(access.heap.read_cstr(addr, Some(capacity))?))
		})
		.with_length(move |access, ptr| {
			let addr = member_addr(access.heap, ptr, &length_field)?;
			Some(access.heap.read_cstr(addr, Some(capacity))?.len())
		})
		.with_set(move |access, ptr, value| {
			let (Some(text), Some(addr)) = (value.as_str(), member_addr(access.heap, ptr, &field)) else {
				return false;
			};
			let mut bytes = vec![0_u8; capacity];
			let len = text.len().min(capacity.saturating_sub(1));
			bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
			access.heap.write(addr, &bytes)
		})
}

fn string_pointer(field: FieldBinding) -> Accessors {
	fn read(access: &Access<'_>, ptr: &RnaPointer, field: &FieldBinding) -> Option<String> {
		let addr = member_addr(access.heap, ptr, field)?;
		match access.heap.read_ptr(addr)? {
			0 => Some(String::new()),
			text => access.heap.read_cstr(text, None),
		}
	}
	let read_field = field.clone();
	let length_field = field.clone();
	Accessors::default()
		.with_get(move |access, ptr| read(access, ptr, &read_field).map(Value::String))
		.with_length(move |access, ptr| read(access, ptr, &length_field).map(|text| text.len()))
		.with_set(move |access, ptr, value| {
			let (Some(text), Some(addr)) = (value.as_str(), member_addr(access.heap, ptr, &field)) else {
				return false;
			};
			let text = access.heap.alloc_cstr(text);
			access.heap.write_ptr(addr, text)
		})
}

fn pointer_field(input: &TemplateInput, field: FieldBinding) -> Accessors {
	let (target, is_id) = (input.target, input.target_is_id);
	let read_field = field.clone();
	Accessors::default()
		.with_get(move |access, ptr| {
			let addr = member_addr(access.heap, ptr, &read_field)?;
			let value = access.heap.read_ptr(addr)?;
			Some(Value::Pointer(match target {
				Some(target) if value != 0 => item_pointer(ptr, target, is_id, value),
				_ => RnaPointer::NULL,
			}))
		})
		.with_set(move |access, ptr, value| {
			let (Some(value), Some(addr)) = (value.as_pointer(), member_addr(access.heap, ptr, &field)) else {
				return false;
			};
			match value.target {
				crate::rna::Target::Null => access.heap.write_ptr(addr, 0),
				crate::rna::Target::Heap(target) => access.heap.write_ptr(addr, target),
				_ => false,
			}
		})
}

fn pointer_embedded(input: &TemplateInput, field: FieldBinding) -> Accessors {
	let target = input.target;
	Accessors::default().with_get(move |access, ptr| {
		let addr = member_addr(access.heap, ptr, &field)?;
		Some(Value::Pointer(RnaPointer::with_parent(ptr, target?, addr)))
	})
}

fn collection_list_base(input: &TemplateInput, field: FieldBinding) -> Accessors {
	let (target, is_id) = (input.target, input.target_is_id);
	let begin_field = field.clone();
	Accessors::default()
		.with_begin(move |access, ptr| {
			let Some(link) = member_addr(access.heap, ptr, &begin_field).and_then(|addr| access.heap.read_ptr(addr)) else {
				return IterState::Done;
			};
			IterState::ListBase {
				link,
				seen: [link].into_iter().collect(),
			}
		})
		.with_next(|access, state| {
			if let IterState::ListBase { link, seen } = state {
				let next = access.heap.read_ptr(*link).unwrap_or(0);
				*link = if seen.insert(next) { next } else { 0 };
			}
		})
		.with_end(|state| *state = IterState::Done)
		.with_item(move |_, parent, state| match state {
			IterState::ListBase { link, .. } if *link != 0 => Some(item_pointer(parent, target?, is_id, *link)),
			_ => None,
		})
		.with_length(move |access, ptr| {
			let mut link = access.heap.read_ptr(member_addr(access.heap, ptr, &field)?)?;
			let mut seen = std::collections::HashSet::new();
			while link != 0 && seen.insert(link) {
				link = access.heap.read_ptr(link).unwrap_or(0);
			}
			Some(seen.len())
		})
}

fn array_length(access: &Access<'_>, ptr: &RnaPointer, length: &LengthSource) -> Option<usize> {
	match length {
		LengthSource::Fixed(count) => Some(*count),
		LengthSource::Member(member) => {
			let primitive = member.primitive?;
			let addr = member_addr(access.heap, ptr, member)?;
			let count = read_ints(access.heap, addr, primitive, 1)?[0];
			usize::try_from(count).ok()
		}
	}
}

fn collection_array(input: &TemplateInput, binding: PropertyBinding) -> Accessors {
	let (target, is_id) = (input.target, input.target_is_id);
	let field = binding.field;
	let Some(length) = binding.length else {
		return Accessors::default();
	};
	let indirect = field.pointer_level == 2;
	let inline = field.pointer_level == 0;
	let stride = match (inline, indirect) {
		(true, _) => field.elem_size,
		(false, true) => Heap::POINTER_SIZE,
		(false, false) => input.item_size,
	};
	let length_source = length.clone();
	Accessors::default()
		.with_begin(move |access, ptr| {
			let Some(addr) = member_addr(access.heap, ptr, &field) else {
				return IterState::Done;
			};
			let base = if inline { Some(addr) } else { access.heap.read_ptr(addr) };
			match (base, array_length(access, ptr, &length)) {
				(Some(base), Some(length)) if base != 0 && length > 0 => IterState::Array {
					base,
					stride,
					index: 0,
					length,
					indirect,
				},
				_ => IterState::Done,
			}
		})
		.with_next(|_, state| {
			if let IterState::Array { index, .. } = state {
				*index += 1;
			}
		})
		.with_end(|state| *state = IterState::Done)
		.with_item(move |access, parent, state| {
			let IterState::Array {
				base,
				stride,
				index,
				length,
				indirect,
			} = state
			else {
				return None;
			};
			if index >= length {
				return None;
			}
			let slot = base.checked_add(u64::try_from(index.checked_mul(*stride)?).ok()?)?;
			let addr = if *indirect { access.heap.read_ptr(slot)? } else { slot };
			if addr == 0 {
				return None;
			}
			Some(item_pointer(parent, target?, is_id, addr))
		})
		.with_length(move |access, ptr| array_length(access, ptr, &length_source))
}

fn id_property(input: TemplateInput) -> Accessors {
	let key = input.identifier.clone();
	let default = default_value(&input.kind, input.array_length);
	let kind = input.kind.property_type();
	let array_length = input.array_length;
	let read_key = key.clone();
	let accessors = Accessors::default()
		.with_get(move |access, ptr| {
			let addr = ptr.addr()?;
			match access.heap.custom(addr, &read_key) {
				Some(stored) => from_json(kind, array_length, stored).or_else(|| default.clone()),
				None => default.clone(),
			}
		})
		.with_set(move |access, ptr, value| match ptr.addr() {
			Some(addr) => access.heap.set_custom(addr, &key, value.to_json()),
			None => false,
		});
	read_only(accessors, input.editable)
}

/// Default value of a property as described by its payload.
pub(crate) fn default_value(kind: &PropertyKind, array_length: usize) -> Option<Value> {
	let array = array_length > 0;
	Some(match kind {
		PropertyKind::Boolean(info) if array => Value::BoolArray(fill(&info.array_default, info.default, array_length)),
		PropertyKind::Boolean(info) => Value::Bool(info.default),
		PropertyKind::Int(info) if array => Value::IntArray(fill(&info.array_default, info.default, array_length)),
		PropertyKind::Int(info) => Value::Int(info.default),
		PropertyKind::Float(info) if array => Value::FloatArray(fill(&info.array_default, info.default, array_length)),
		PropertyKind::Float(info) => Value::Float(info.default),
		PropertyKind::String(info) => Value::String(info.default.to_string()),
		PropertyKind::Enum(info) => Value::Enum(info.default),
		PropertyKind::Pointer(_) => Value::Pointer(RnaPointer::NULL),
		PropertyKind::Collection(_) => return None,
	})
}

fn fill<T: Copy>(defaults: &[T], scalar: T, length: usize) -> Vec<T> {
	(0..length).map(|index| defaults.get(index).copied().unwrap_or(scalar)).collect()
}

fn from_json(kind: PropertyType, array_length: usize, value: &serde_json::Value) -> Option<Value> {
	let array = array_length > 0;
	Some(match kind {
		PropertyType::Boolean if array => Value::BoolArray(value.as_array()?.iter().map(serde_json::Value::as_bool).collect::<Option<_>>()?),
		PropertyType::Boolean => Value::Bool(value.as_bool()?),
		PropertyType::Int if array => Value::IntArray(
			value
				.as_array()?
				.iter()
				.map(|item| item.as_i64().and_then(|item| i32::try_from(item).ok()))
				.collect::<Option<_>>()?,
		),
		PropertyType::Int => Value::Int(i32::try_from(value.as_i64()?).ok()?),
		PropertyType::Float if array => Value::FloatArray(value.as_array()?.iter().map(|item| item.as_f64().map(|item| item as f32)).collect::<Option<_>>()?),
		PropertyType::Float => Value::Float(value.as_f64()? as f32),
		PropertyType::String => Value::String(value.as_str()?.to_owned()),
		PropertyType::Enum => Value::Enum(i32::try_from(value.as_i64()?).ok()?),
		PropertyType::Pointer | PropertyType::Collection => return None,
	})
}
