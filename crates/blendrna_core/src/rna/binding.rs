use serde::Serialize;

use crate::dna::{FieldBinding, Heap, Primitive, resolve_binding};
use crate::rna::{Container, DefinitionError, MAX_ARRAY_LENGTH, PropertyId, PropertyKind, PropertyType, SchemaRegistry};

/// Where a collection finds its element count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthSource {
	/// Inline array of known length.
	Fixed(usize),
	/// Integer member next to the item pointer.
	Member(FieldBinding),
}

/// Memory location of a property plus its encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyBinding {
	/// Resolved member.
	pub field: FieldBinding,
	/// Bit mask for bit-encoded booleans; `0` tests the whole value.
	pub bit: u64,
	/// Boolean reads and writes are inverted.
	pub negative: bool,
	/// Boolean array stored as consecutive bits of one integer, starting at `bit`.
	pub bitset_array: bool,
	/// Enum stored as a bit set of item values.
	pub enum_bitflags: bool,
	/// Collection element count source; `None` for linked lists.
	pub length: Option<LengthSource>,
}

impl PropertyBinding {
	fn plain(field: FieldBinding) -> Self {
		Self {
			field,
			bit: 0,
			negative: false,
			bitset_array: false,
			enum_bitflags: false,
			length: None,
		}
	}

	/// Values the bound storage can represent for a property of kind `ty`.
	///
	/// Ints are limited by the member's integer width; floats stored in a byte are `0..=1`.
	pub fn storage_range(&self, ty: PropertyType) -> Option<(f64, f64)> {
		match ty {
			PropertyType::Int => self.field.primitive?.int_range().map(|(min, max)| (f64::from(min), f64::from(max))),
			PropertyType::Float if is_byte(&self.field) => Some((0.0, 1.0)),
			_ => None,
		}
	}
}

/// Address of the bound member for the instance at `base`, following pointer hops.
///
/// `None` when a hop crosses a null or unmapped pointer.
pub fn field_address(heap: &Heap, base: u64, field: &FieldBinding) -> Option<u64> {
	let mut addr = base;
	for hop in &field.hops {
		addr = heap.read_ptr(addr.checked_add(*hop as u64)?)?;
		if addr == 0 {
			return None;
		}
	}
	addr.checked_add(field.offset as u64)
}

#[derive(Debug, Clone, Copy, Default)]
struct BindOptions<'a> {
	bit: u64,
	negative: bool,
	bitset_length: Option<usize>,
	enum_bitflags: bool,
	length_path: Option<&'a str>,
}

fn is_integer(field: &FieldBinding) -> bool {
	field.pointer_level == 0 && field.primitive.is_some_and(|primitive| !primitive.is_float())
}

fn is_struct(field: &FieldBinding) -> bool {
	field.primitive.is_none() && Primitive::from_type_name(&field.type_name).is_none()
}

/// Byte storage, either a direct member or the pointee of a `char *`.
fn is_byte(field: &FieldBinding) -> bool {
	let primitive = match field.pointer_level {
		0 => field.primitive,
		_ => Primitive::from_type_name(&field.type_name),
	};
	matches!(primitive, Some(Primitive::Char | Primitive::UChar))
}

impl SchemaRegistry {
	/// Bind a boolean to a member; a nonzero `bit` tests that mask instead of the whole value.
	pub fn bind_boolean(&mut self, prop: PropertyId, path: &str, bit: u64) {
		self.bind(prop, path, PropertyType::Boolean, BindOptions { bit, ..BindOptions::default() }, false);
	}

	/// Like [`SchemaRegistry::bind_boolean`] with reads and writes inverted.
	pub fn bind_boolean_negative(&mut self, prop: PropertyId, path: &str, bit: u64) {
		let opts = BindOptions {
			bit,
			negative: true,
			..BindOptions::default()
		};
		self.bind(prop, path, PropertyType::Boolean, opts, false);
	}

	/// Bind a boolean array of `length` to consecutive bits of one integer member, from `bit` up.
	pub fn bind_boolean_bitset_array(&mut self, prop: PropertyId, path: &str, bit: u64, length: usize) {
		let opts = BindOptions {
			bit,
			bitset_length: Some(length),
			..BindOptions::default()
		};
		self.bind(prop, path, PropertyType::Boolean, opts, false);
	}

	/// Bind an int to an integer member.
	pub fn bind_int(&mut self, prop: PropertyId, path: &str) {
		self.bind(prop, path, PropertyType::Int, BindOptions::default(), false);
	}

	/// Bind a float to a floating point or byte member.
	pub fn bind_float(&mut self, prop: PropertyId, path: &str) {
		self.bind(prop, path, PropertyType::Float, BindOptions::default(), false);
	}

	/// Bind an enum to an integer member holding one item value.
	pub fn bind_enum(&mut self, prop: PropertyId, path: &str) {
		self.bind(prop, path, PropertyType::Enum, BindOptions::default(), false);
	}

	/// Bind an enum to an integer member holding a bit set of item values.
	pub fn bind_enum_bitflag(&mut self, prop: PropertyId, path: &str) {
		let opts = BindOptions {
			enum_bitflags: true,
			..BindOptions::default()
		};
		self.bind(prop, path, PropertyType::Enum, opts, false);
	}

	/// Bind a string to an inline `char` array or a `char *` member.
	pub fn bind_string(&mut self, prop: PropertyId, path: &str) {
		self.bind(prop, path, PropertyType::String, BindOptions::default(), false);
	}

	/// Bind a pointer to a struct pointer member or an embedded struct member.
	pub fn bind_pointer(&mut self, prop: PropertyId, path: &str) {
		self.bind(prop, path, PropertyType::Pointer, BindOptions::default(), false);
	}

	/// Bind a collection to a `ListBase`, an inline struct array, or an item pointer whose
	/// count lives in the integer member `length_path`.
	pub fn bind_collection(&mut self, prop: PropertyId, path: &str, length_path: Option<&str>) {
		let opts = BindOptions {
			length_path,
			..BindOptions::default()
		};
		self.bind(prop, path, PropertyType::Collection, opts, false);
	}

	/// First-pass probe: bind to a same-named member when one fits, without reporting misses.
	pub(crate) fn probe_binding(&mut self, prop: PropertyId) {
		let Some(def) = self.properties.get(prop) else {
			return;
		};
		let ty = def.property_type();
		let identifier = def.identifier.clone();
		self.bind(prop, &identifier, ty, BindOptions::default(), true);
	}

	fn bind(&mut self, prop: PropertyId, path: &str, expected: PropertyType, opts: BindOptions<'_>, silent: bool) {
		match self.resolve_property_binding(prop, path, expected, opts) {
			Ok(()) => tracing::debug!(property = %self.property_label(prop), path, "property bound"),
			Err(error) if silent => tracing::trace!(%error, "probe missed"),
			Err(error) => self.report(error),
		}
	}

	/// Resolve `path` against the owner's layout struct, honoring `set_struct_sdna_from`.
	pub(crate) fn resolve_member(&self, prop: PropertyId, path: &str) -> Result<FieldBinding, DefinitionError> {
		let label = self.property_label(prop);
		let def = self.properties.get(prop).ok_or(DefinitionError::StaleHandle { kind: "property" })?;
		let Container::Struct(owner) = def.owner else {
			return Err(DefinitionError::WrongContainer {
				property: label,
				operation: "binding",
			});
		};
		let layout = self.layout().ok_or_else(|| DefinitionError::NoLayoutTable { context: label.clone() })?;
		let owner_def = self.structs.get(owner).ok_or(DefinitionError::StaleHandle { kind: "struct" })?;
		let sdna = owner_def.sdna.as_deref().ok_or_else(|| DefinitionError::LayoutStructNotFound {
			struct_name: owner_def.identifier.to_string(),
		})?;
		let found = match owner_def.sdna_member.as_deref() {
			Some(member) => resolve_binding(layout, sdna, &format!("{member}.{path}")).or_else(|| resolve_binding(layout, sdna, &format!("{member}->{path}"))),
			None => resolve_binding(layout, sdna, path),
		};
		found.ok_or_else(|| DefinitionError::MemberNotFound {
			property: label,
			struct_name: sdna.to_owned(),
			path: path.to_owned(),
		})
	}

	fn resolve_property_binding(&mut self, prop: PropertyId, path: &str, expected: PropertyType, opts: BindOptions<'_>) -> Result<(), DefinitionError> {
		let label = self.property_label(prop);
		let def = self.properties.get(prop).ok_or(DefinitionError::StaleHandle { kind: "property" })?;
		let got = def.property_type();
		if got != expected {
			return Err(DefinitionError::KindMismatch {
				property: label.clone(),
				operation: "binding",
				expected,
				got,
			});
		}
		let scalar = def.array_length == 0;

		let field = self.resolve_member(prop, path)?;
		let incompatible = || DefinitionError::IncompatibleMember {
			property: label.clone(),
			type_name: field.type_name.to_string(),
			kind: expected,
		};
		let fits = match expected {
			PropertyType::Boolean | PropertyType::Int | PropertyType::Enum => is_integer(&field),
			PropertyType::Float => field.pointer_level == 0 && field.primitive.is_some(),
			PropertyType::String => (field.pointer_level == 0 && field.array_length > 0 || field.pointer_level == 1) && is_byte(&field),
			PropertyType::Pointer => is_struct(&field) && field.pointer_level <= 1 && field.array_length == 0,
			PropertyType::Collection => is_struct(&field) && field.pointer_level <= 2,
		};
		if !fits {
			return Err(incompatible());
		}
		if expected == PropertyType::Float && !field.primitive.is_some_and(Primitive::is_float) && !is_byte(&field) {
			return Err(incompatible());
		}

		let mut binding = PropertyBinding::plain(field.clone());
		binding.bit = opts.bit;
		binding.negative = opts.negative;
		binding.enum_bitflags = opts.enum_bitflags;
		let mut array_length = None;
		match expected {
			PropertyType::Boolean if opts.bitset_length.is_some() => {
				binding.bitset_array = true;
				array_length = opts.bitset_length;
			}
			PropertyType::Boolean | PropertyType::Int | PropertyType::Float if field.array_length > 0 && scalar => {
				if field.array_length > MAX_ARRAY_LENGTH {
					return Err(DefinitionError::ArrayTooLong {
						property: label.clone(),
						length: field.array_length,
						max: MAX_ARRAY_LENGTH,
					});
				}
				array_length = Some(field.array_length);
			}
			PropertyType::Collection => {
				binding.length = match (opts.length_path, field.pointer_level, field.array_length) {
					(Some(length_path), 1 | 2, _) => {
						let length = self.resolve_member(prop, length_path)?;
						if !is_integer(&length) {
							return Err(DefinitionError::IncompatibleMember {
								property: label.clone(),
								type_name: length.type_name.to_string(),
								kind: PropertyType::Int,
							});
						}
						Some(LengthSource::Member(length))
					}
					(None, 0, 0) if &*field.type_name == "ListBase" => None,
					(None, 0, count) if count > 0 => Some(LengthSource::Fixed(count)),
					_ => return Err(incompatible()),
				};
			}
			_ => {}
		}
		if let Some(length) = array_length
			&& length > MAX_ARRAY_LENGTH
		{
			return Err(DefinitionError::ArrayTooLong {
				property: label.clone(),
				length,
				max: MAX_ARRAY_LENGTH,
			});
		}

		let range = field.primitive.and_then(Primitive::int_range);
		let byte_float = is_byte(&field);
		let Some(def) = self.properties.get_mut(prop) else {
			return Err(DefinitionError::StaleHandle { kind: "property" });
		};
		if let Some(length) = array_length {
			def.array_length = length;
		}
		match &mut def.kind {
			PropertyKind::Int(info) => {
				if let Some((min, max)) = range {
					info.hard_min = info.hard_min.max(min);
					info.hard_max = info.hard_max.min(max);
					info.soft_min = info.soft_min.clamp(info.hard_min, info.hard_max);
					info.soft_max = info.soft_max.clamp(info.hard_min, info.hard_max);
				}
			}
			PropertyKind::Float(info) if byte_float => {
				info.hard_min = 0.0;
				info.hard_max = 1.0;
				info.soft_min = info.soft_min.clamp(0.0, 1.0);
				info.soft_max = info.soft_max.clamp(0.0, 1.0);
			}
			PropertyKind::String(info) if field.pointer_level == 0 && info.max_length == 0 => {
				info.max_length = field.array_length;
			}
			_ => {}
		}
		def.binding = Some(binding);
		Ok(())
	}
}

#[cfg(test)]
mod tests;
