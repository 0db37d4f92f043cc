use serde::Serialize;

use crate::dna::{Heap, Primitive};
use crate::rna::{PropInternal, PropertyId, PropertyKind, PropertyType, RnaPointer, SchemaRegistry, Value};

/// Direct memory access annotation for numeric properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawAccess {
	/// Member offset inside the instance.
	pub offset: usize,
	/// Storage type.
	pub raw_type: Primitive,
	/// Element count; `0` for scalars.
	pub array_length: usize,
}

impl RawAccess {
	fn read(&self, heap: &Heap, addr: u64) -> Option<Vec<f64>> {
		let count = self.array_length.max(1);
		let size = self.raw_type.size();
		let bytes = heap.bytes(addr.checked_add(self.offset as u64)?, size.checked_mul(count)?)?;
		bytes.chunks_exact(size).map(|chunk| self.raw_type.read_float(chunk)).collect()
	}
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
	Some(match value {
		Value::Bool(value) => vec![f64::from(u8::from(*value))],
		Value::Int(value) | Value::Enum(value) => vec![f64::from(*value)],
		Value::Float(value) => vec![f64::from(*value)],
		Value::BoolArray(values) => values.iter().map(|value| f64::from(u8::from(*value))).collect(),
		Value::IntArray(values) => values.iter().map(|value| f64::from(*value)).collect(),
		Value::FloatArray(values) => values.iter().map(|value| f64::from(*value)).collect(),
		_ => return None,
	})
}

impl SchemaRegistry {
	/// Raw access annotation of a property, when generation granted one.
	pub fn raw_access(&self, prop: PropertyId) -> Option<RawAccess> {
		let def = self.properties.get(prop)?;
		if !def.internal.contains(PropInternal::RAW_ACCESS) {
			return None;
		}
		def.raw
	}

	/// Numeric value of `prop` as a flat list, read straight from memory when the property
	/// has raw access and through the getter otherwise.
	pub fn raw_array_read(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Option<Vec<f64>> {
		if let (Some(raw), Some(addr)) = (self.raw_access(prop), ptr.addr()) {
			return raw.read(heap, addr);
		}
		numbers(&self.get(heap, prop, ptr)?)
	}

	/// `item_prop` of every item of the collection `prop`, concatenated.
	///
	/// Items whose struct does not own `item_prop` are skipped.
	pub fn collection_raw_read(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer, item_prop: PropertyId) -> Option<Vec<f64>> {
		let def = self.properties.get(item_prop)?;
		if !matches!(def.property_type(), PropertyType::Boolean | PropertyType::Int | PropertyType::Float | PropertyType::Enum) {
			return None;
		}
		let stride = def.array_length.max(1);
		let raw = self.raw_access(item_prop);
		let mut out = Vec::new();
		for item in self.collection_items(heap, prop, ptr) {
			let owns = item
				.struct_type
				.is_some_and(|struct_type| self.properties_of(struct_type, false).any(|id| id == item_prop));
			if !owns {
				continue;
			}
			let values = match (raw, item.addr()) {
				(Some(raw), Some(addr)) => raw.read(heap, addr),
				_ => self.get(heap, item_prop, &item).as_ref().and_then(numbers),
			};
			let values = values?;
			if values.len() != stride {
				return None;
			}
			out.extend(values);
		}
		Some(out)
	}
}

/// Raw eligibility: numeric storage bound directly with no value conversion.
pub(crate) fn raw_annotation(kind: &PropertyKind, binding: &crate::rna::PropertyBinding, array_length: usize) -> Option<RawAccess> {
	let field = &binding.field;
	let raw_type = field.primitive?;
	if !field.is_direct() || field.pointer_level != 0 {
		return None;
	}
	let numeric = match kind {
		PropertyKind::Int(_) => !raw_type.is_float(),
		PropertyKind::Float(_) => raw_type.is_float(),
		_ => false,
	};
	numeric.then_some(RawAccess {
		offset: field.offset,
		raw_type,
		array_length,
	})
}
