use std::collections::HashSet;

use crate::dna::Heap;
use crate::rna::{
	Access, AccessMut, PropFlag, PropInternal, PropertyDef, PropertyId, PropertyKind, PropertyType, RnaPointer, SchemaRegistry, SetOutcome, StructFlag, StructId,
	Target, Value, default_value,
};

/// Truncate to at most `max_bytes`, on a character boundary.
fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
	if text.len() <= max_bytes {
		return text;
	}
	let mut end = max_bytes;
	while !text.is_char_boundary(end) {
		end -= 1;
	}
	&text[..end]
}

impl SchemaRegistry {
	/// Properties of a struct: base-chain properties not shadowed by a derived struct, root
	/// first, then own properties. Built-in properties are skipped unless `include_builtin`.
	pub fn properties_of(&self, id: StructId, include_builtin: bool) -> impl Iterator<Item = PropertyId> + '_ {
		let mut chain: Vec<StructId> = self.base_chain(id).collect();
		chain.reverse();
		let depth = chain.len();
		chain.into_iter().enumerate().flat_map(move |(level, struct_id)| {
			let derived: Vec<StructId> = self.base_chain(id).take(depth - level - 1).collect();
			self.structs
				.get(struct_id)
				.map_or(&[][..], |def| def.properties.as_slice())
				.iter()
				.copied()
				.filter(move |prop| {
					let Some(def) = self.properties.get(*prop) else {
						return false;
					};
					if !include_builtin && def.internal.contains(PropInternal::BUILTIN) {
						return false;
					}
					!derived.iter().any(|struct_id| self.own_property((*struct_id).into(), &def.identifier).is_some())
				})
		})
	}

	/// Property by identifier, searching the struct then its bases.
	pub fn find_property(&self, id: StructId, identifier: &str) -> Option<PropertyId> {
		self.base_chain(id).find_map(|struct_id| self.own_property(struct_id.into(), identifier))
	}

	/// Property of the instance's refined struct by identifier.
	pub fn lookup_property(&self, heap: &Heap, ptr: &RnaPointer, identifier: &str) -> Option<PropertyId> {
		self.find_property(self.refine_struct(heap, ptr)?, identifier)
	}

	/// Current value; `None` for null pointers, unmapped memory, or unreadable properties.
	///
	/// Pointer values come back refined to their most specific struct.
	pub fn get(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<Value> {
		let def = self.properties.get(prop)?;
		if ptr.is_null() {
			return None;
		}
		if def.property_type() == PropertyType::Collection {
			return Some(Value::Collection(self.collection_items(heap, prop, ptr)));
		}
		let access = Access { registry: self, heap };
		let value = match &def.accessors.get {
			Some(get) => get(&access, ptr)?,
			None => return None,
		};
		match (value, &def.kind) {
			(Value::Pointer(target), PropertyKind::Pointer(info)) if !target.is_null() => {
				let dynamic = info.type_fn.as_ref().and_then(|type_fn| type_fn(&access, &target));
				let target = RnaPointer {
					struct_type: dynamic.or(target.struct_type),
					..target
				};
				Some(Value::Pointer(self.refine(heap, &target)))
			}
			(value, _) => Some(value),
		}
	}

	/// Write a value after clamping it to the hard range, then run the update callback.
	///
	/// Rejected when the property is read-only (by flag or by its editable callback), the
	/// value has the wrong shape, an enum value is not an item, a pointer target is refused,
	/// or memory is not mapped.
	pub fn set(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: &Value) -> SetOutcome {
		let Some(def) = self.properties.get(prop) else {
			return SetOutcome::Rejected;
		};
		if ptr.is_null() || !self.editable_on(def, heap, ptr) {
			return SetOutcome::Rejected;
		}
		let Some(setter) = def.accessors.set.clone() else {
			return SetOutcome::Rejected;
		};
		let Some((value, clamped)) = self.normalize(def, heap, ptr, value) else {
			tracing::trace!(property = %self.property_label(prop), "value rejected");
			return SetOutcome::Rejected;
		};
		let stored = setter(&mut AccessMut { registry: self, heap: &mut *heap }, ptr, &value);
		if !stored {
			return SetOutcome::Rejected;
		}
		self.property_update(heap, prop, ptr);
		if clamped { SetOutcome::Clamped } else { SetOutcome::Stored }
	}

	/// Whether `prop` may be written on this instance.
	pub fn is_property_editable(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> bool {
		self.properties.get(prop).is_some_and(|def| self.editable_on(def, heap, ptr))
	}

	fn editable_on(&self, def: &PropertyDef, heap: &Heap, ptr: &RnaPointer) -> bool {
		def.is_editable() && def.editable.as_ref().is_none_or(|editable| editable(&Access { registry: self, heap }, ptr))
	}

	/// Run the update callback of `prop` for `ptr`, as after a write made outside
	/// [`SchemaRegistry::set`].
	pub fn property_update(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer) {
		let Some(update) = self.properties.get(prop).and_then(|def| def.update.clone()) else {
			return;
		};
		update(&mut AccessMut { registry: self, heap }, ptr, prop);
	}

	/// Coerce and clamp `value` for `def`; the flag reports whether clamping changed it.
	fn normalize(&self, def: &PropertyDef, heap: &Heap, owner: &RnaPointer, value: &Value) -> Option<(Value, bool)> {
		let length = def.array_length;
		Some(match (&def.kind, value) {
			(PropertyKind::Boolean(_), Value::Bool(_)) if length == 0 => (value.clone(), false),
			(PropertyKind::Boolean(_), Value::BoolArray(values)) if values.len() == length && length > 0 => (value.clone(), false),
			(PropertyKind::Int(info), Value::Int(raw)) if length == 0 => {
				let stored = info.clamp(*raw);
				(Value::Int(stored), stored != *raw)
			}
			(PropertyKind::Int(info), Value::IntArray(values)) if values.len() == length && length > 0 => {
				let stored: Vec<i32> = values.iter().map(|raw| info.clamp(*raw)).collect();
				let clamped = stored != *values;
				(Value::IntArray(stored), clamped)
			}
			(PropertyKind::Float(info), Value::Float(_) | Value::Int(_)) if length == 0 => {
				let raw = value.as_float()?;
				let stored = info.clamp(raw);
				(Value::Float(stored), stored.to_bits() != raw.to_bits())
			}
			(PropertyKind::Float(info), Value::FloatArray(values)) if values.len() == length && length > 0 => {
				let stored: Vec<f32> = values.iter().map(|raw| info.clamp(*raw)).collect();
				let clamped = stored.iter().zip(values).any(|(stored, raw)| stored.to_bits() != raw.to_bits());
				(Value::FloatArray(stored), clamped)
			}
			(PropertyKind::String(info), Value::String(text)) => {
				let stored = match info.max_length {
					0 => text.as_str(),
					max => truncate_utf8(text, max.saturating_sub(1)),
				};
				(Value::String(stored.to_owned()), stored.len() != text.len())
			}
			(PropertyKind::Enum(info), Value::Enum(raw) | Value::Int(raw)) => {
				let known = if def.flag.contains(PropFlag::ENUM_FLAG) {
					raw & !info.mask() == 0
				} else {
					info.item(*raw).is_some()
				};
				if !known {
					return None;
				}
				(Value::Enum(*raw), false)
			}
			(PropertyKind::Pointer(info), Value::Pointer(target)) => {
				if target.is_null() {
					if def.flag.contains(PropFlag::NEVER_NULL) {
						return None;
					}
					return Some((Value::Pointer(RnaPointer::NULL), false));
				}
				let declared = info.target.as_ref().and_then(|target| target.id());
				let actual = self.refine_struct(heap, target);
				if let (Some(declared), Some(actual)) = (declared, actual)
					&& !self.is_derived_from(actual, declared)
				{
					return None;
				}
				if let Some(poll) = &def.poll
					&& !poll(&Access { registry: self, heap }, owner, target)
				{
					return None;
				}
				(value.clone(), false)
			}
			_ => return None,
		})
	}

	/// String byte length or collection item count.
	pub fn length(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<usize> {
		let def = self.properties.get(prop)?;
		if ptr.is_null() {
			return None;
		}
		if let Some(length) = &def.accessors.length {
			return length(&Access { registry: self, heap }, ptr);
		}
		match def.property_type() {
			PropertyType::String => self.get_string(heap, prop, ptr).map(|text| text.len()),
			PropertyType::Collection => Some(self.collection_items(heap, prop, ptr).len()),
			_ if def.array_length > 0 => Some(def.array_length),
			_ => None,
		}
	}

	/// Default value as declared on the property.
	pub fn default_of(&self, prop: PropertyId) -> Option<Value> {
		let def = self.properties.get(prop)?;
		default_value(&def.kind, def.array_length)
	}

	/// Boolean value.
	pub fn get_bool(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<bool> {
		self.get(heap, prop, ptr)?.as_bool()
	}

	/// Int value.
	pub fn get_int(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<i32> {
		match self.get(heap, prop, ptr)? {
			Value::Int(value) => Some(value),
			_ => None,
		}
	}

	/// Float value.
	pub fn get_float(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<f32> {
		match self.get(heap, prop, ptr)? {
			Value::Float(value) => Some(value),
			_ => None,
		}
	}

	/// String value.
	pub fn get_string(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<String> {
		match self.get(heap, prop, ptr)? {
			Value::String(value) => Some(value),
			_ => None,
		}
	}

	/// Enum value.
	pub fn get_enum(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<i32> {
		match self.get(heap, prop, ptr)? {
			Value::Enum(value) => Some(value),
			_ => None,
		}
	}

	/// Identifier of the current item of a plain enum.
	pub fn get_enum_identifier(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<String> {
		let value = self.get_enum(heap, prop, ptr)?;
		match &self.properties.get(prop)?.kind {
			PropertyKind::Enum(info) => info.item(value).map(|item| item.identifier.to_string()),
			_ => None,
		}
	}

	/// Pointer value; null pointers come back as [`RnaPointer::NULL`].
	pub fn get_pointer(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<RnaPointer> {
		self.get(heap, prop, ptr)?.as_pointer()
	}

	/// Boolean array value.
	pub fn get_bool_array(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<Vec<bool>> {
		match self.get(heap, prop, ptr)? {
			Value::BoolArray(values) => Some(values),
			_ => None,
		}
	}

	/// Int array value.
	pub fn get_int_array(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<Vec<i32>> {
		match self.get(heap, prop, ptr)? {
			Value::IntArray(values) => Some(values),
			_ => None,
		}
	}

	/// Float array value.
	pub fn get_float_array(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<Vec<f32>> {
		match self.get(heap, prop, ptr)? {
			Value::FloatArray(values) => Some(values),
			_ => None,
		}
	}

	/// Write a boolean.
	pub fn set_bool(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: bool) -> SetOutcome {
		self.set(heap, prop, ptr, &Value::Bool(value))
	}

	/// Write an int.
	pub fn set_int(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: i32) -> SetOutcome {
		self.set(heap, prop, ptr, &Value::Int(value))
	}

	/// Write a float.
	pub fn set_float(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: f32) -> SetOutcome {
		self.set(heap, prop, ptr, &Value::Float(value))
	}

	/// Write a string.
	pub fn set_string(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: &str) -> SetOutcome {
		self.set(heap, prop, ptr, &Value::String(value.to_owned()))
	}

	/// Write an enum value.
	pub fn set_enum(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: i32) -> SetOutcome {
		self.set(heap, prop, ptr, &Value::Enum(value))
	}

	/// Write an enum value by item identifier.
	pub fn set_enum_identifier(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, identifier: &str) -> SetOutcome {
		let value = match self.properties.get(prop).map(|def| &def.kind) {
			Some(PropertyKind::Enum(info)) => info.item_by_identifier(identifier).map(|item| item.value),
			_ => None,
		};
		match value {
			Some(value) => self.set_enum(heap, prop, ptr, value),
			None => SetOutcome::Rejected,
		}
	}

	/// Write a pointer.
	pub fn set_pointer(&self, heap: &mut Heap, prop: PropertyId, ptr: &RnaPointer, value: RnaPointer) -> SetOutcome {
		self.set(heap, prop, ptr, &Value::Pointer(value))
	}

	/// Textual locator of an instance, from its struct's path callback.
	///
	/// An identified object referenced directly has the empty path.
	pub fn path_of(&self, heap: &Heap, ptr: &RnaPointer) -> Option<String> {
		let struct_type = self.refine_struct(heap, ptr)?;
		let def = self.structs.get(struct_type)?;
		if let Some(path) = &def.path {
			return path(&Access { registry: self, heap }, ptr);
		}
		let is_owner = def.flag.contains(StructFlag::ID) && ptr.addr() == Some(ptr.owner);
		is_owner.then(String::new)
	}

	/// Value of the instance's name property.
	pub fn name_of(&self, heap: &Heap, ptr: &RnaPointer) -> Option<String> {
		let struct_type = self.refine_struct(heap, ptr)?;
		let name_property = self.base_chain(struct_type).find_map(|id| self.structs.get(id)?.name_property)?;
		self.get_string(heap, name_property, ptr)
	}

	/// Item of a collection whose name property equals `key`.
	pub fn collection_lookup_string(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer, key: &str) -> Option<RnaPointer> {
		self.collection_iter(heap, prop, ptr).find(|item| self.name_of(heap, item).as_deref() == Some(key))
	}

	/// Item of a collection by position.
	pub fn collection_lookup_index(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer, index: usize) -> Option<RnaPointer> {
		self.collection_iter(heap, prop, ptr).nth(index)
	}

	/// Pointer to the struct descriptor of `id`, viewed through the `Struct` meta struct.
	pub fn struct_pointer(&self, id: StructId) -> RnaPointer {
		RnaPointer::to_target(self.meta.struct_, Target::Struct(id))
	}

	/// Identified objects reachable from `ptr` through pointers, deduplicated.
	pub fn referenced_ids(&self, heap: &Heap, ptr: &RnaPointer) -> Vec<RnaPointer> {
		let mut seen = HashSet::new();
		let mut out = Vec::new();
		self.walk_references(heap, ptr, &crate::rna::WalkOptions::default(), |edge| {
			let is_id = edge
				.to
				.struct_type
				.and_then(|id| self.structs.get(id))
				.is_some_and(|def| def.flag.contains(StructFlag::ID));
			if is_id && seen.insert(edge.to) {
				out.push(edge.to);
			}
			std::ops::ControlFlow::Continue(())
		});
		out
	}
}
