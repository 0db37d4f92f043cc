use crate::dna::Heap;
use crate::rna::{Access, IterState, PropertyId, PropertyType, RnaPointer, SchemaRegistry};

/// Caller-owned cursor over one collection.
///
/// Each [`SchemaRegistry::collection_begin`] returns an independent cursor; nothing is shared
/// between iterations.
#[derive(Debug, Clone)]
pub struct CollectionIter {
	prop: PropertyId,
	parent: RnaPointer,
	state: IterState,
}

impl CollectionIter {
	/// Collection property being iterated.
	pub fn property(&self) -> PropertyId {
		self.prop
	}

	/// Instance owning the collection.
	pub fn parent(&self) -> &RnaPointer {
		&self.parent
	}

	/// Raw cursor state.
	pub fn state(&self) -> &IterState {
		&self.state
	}
}

/// Items of a collection as a Rust iterator.
pub struct CollectionItems<'a> {
	registry: &'a SchemaRegistry,
	heap: &'a Heap,
	iter: CollectionIter,
	started: bool,
}

impl Iterator for CollectionItems<'_> {
	type Item = RnaPointer;

	fn next(&mut self) -> Option<RnaPointer> {
		if self.started {
			self.registry.collection_next(self.heap, &mut self.iter);
		}
		self.started = true;
		while self.registry.collection_valid(&self.iter) {
			if let Some(item) = self.registry.collection_item(self.heap, &self.iter) {
				return Some(item);
			}
			// Null entries are skipped.
			self.registry.collection_next(self.heap, &mut self.iter);
		}
		self.registry.collection_end(&mut self.iter);
		None
	}
}

impl SchemaRegistry {
	/// Start iterating the collection `prop` of `ptr`; non-collections and null pointers give
	/// an exhausted cursor.
	pub fn collection_begin(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> CollectionIter {
		let state = match self.properties.get(prop) {
			Some(def) if def.property_type() == PropertyType::Collection && !ptr.is_null() => match &def.accessors.begin {
				Some(begin) => begin(&Access { registry: self, heap }, ptr),
				None => IterState::Done,
			},
			_ => IterState::Done,
		};
		CollectionIter { prop, parent: *ptr, state }
	}

	/// Whether the cursor is positioned on an item.
	pub fn collection_valid(&self, iter: &CollectionIter) -> bool {
		iter.state.is_valid()
	}

	/// Current item, refined to its most specific struct.
	pub fn collection_item(&self, heap: &Heap, iter: &CollectionIter) -> Option<RnaPointer> {
		if !iter.state.is_valid() {
			return None;
		}
		let item = self.properties.get(iter.prop)?.accessors.item.as_ref()?;
		let ptr = item(&Access { registry: self, heap }, &iter.parent, &iter.state)?;
		Some(self.refine(heap, &ptr))
	}

	/// Advance the cursor.
	pub fn collection_next(&self, heap: &Heap, iter: &mut CollectionIter) {
		if !iter.state.is_valid() {
			return;
		}
		match self.properties.get(iter.prop).and_then(|def| def.accessors.next.as_ref()) {
			Some(next) => next(&Access { registry: self, heap }, &mut iter.state),
			None => iter.state = IterState::Done,
		}
	}

	/// Release the cursor.
	pub fn collection_end(&self, iter: &mut CollectionIter) {
		match self.properties.get(iter.prop).and_then(|def| def.accessors.end.as_ref()) {
			Some(end) => end(&mut iter.state),
			None => iter.state = IterState::Done,
		}
	}

	/// Items of the collection as an iterator.
	pub fn collection_iter<'a>(&'a self, heap: &'a Heap, prop: PropertyId, ptr: &RnaPointer) -> CollectionItems<'a> {
		CollectionItems {
			registry: self,
			heap,
			iter: self.collection_begin(heap, prop, ptr),
			started: false,
		}
	}

	/// Items of the collection, collected.
	pub fn collection_items(&self, heap: &Heap, prop: PropertyId, ptr: &RnaPointer) -> Vec<RnaPointer> {
		self.collection_iter(heap, prop, ptr).collect()
	}
}
