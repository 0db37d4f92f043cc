use std::collections::HashSet;
use std::sync::Arc;

use crate::dna::Heap;
use crate::rna::{Hook, RnaPointer, SchemaRegistry, Value};

/// Read-only view handed to accessors.
#[derive(Clone, Copy)]
pub struct Access<'a> {
	/// Descriptors.
	pub registry: &'a SchemaRegistry,
	/// Instance memory.
	pub heap: &'a Heap,
}

/// Mutable view handed to setters.
pub struct AccessMut<'a> {
	/// Descriptors.
	pub registry: &'a SchemaRegistry,
	/// Instance memory.
	pub heap: &'a mut Heap,
}

impl AccessMut<'_> {
	/// Reborrow as a read-only view.
	pub fn as_access(&self) -> Access<'_> {
		Access {
			registry: self.registry,
			heap: self.heap,
		}
	}
}

/// Value getter.
pub type GetFn = dyn Fn(&Access<'_>, &RnaPointer) -> Option<Value> + Send + Sync;
/// Value setter; receives an already clamped value and reports whether it was stored.
pub type SetFn = dyn Fn(&mut AccessMut<'_>, &RnaPointer, &Value) -> bool + Send + Sync;
/// String or collection length.
pub type LengthFn = dyn Fn(&Access<'_>, &RnaPointer) -> Option<usize> + Send + Sync;
/// Collection iteration start.
pub type BeginFn = dyn Fn(&Access<'_>, &RnaPointer) -> IterState + Send + Sync;
/// Collection iteration step.
pub type NextFn = dyn Fn(&Access<'_>, &mut IterState) + Send + Sync;
/// Collection iteration teardown.
pub type EndFn = dyn Fn(&mut IterState) + Send + Sync;
/// Current collection item.
pub type ItemFn = dyn Fn(&Access<'_>, &RnaPointer, &IterState) -> Option<RnaPointer> + Send + Sync;

/// Caller-owned collection cursor state.
#[derive(Debug, Clone, PartialEq)]
pub enum IterState {
	/// Exhausted.
	Done,
	/// Walking a linked list through each link's leading `next` pointer.
	ListBase {
		/// Current link address.
		link: u64,
		/// Links already visited; a revisit ends iteration.
		seen: HashSet<u64>,
	},
	/// Stepping through an array of inline items or item pointers.
	Array {
		/// First element address.
		base: u64,
		/// Bytes between elements.
		stride: usize,
		/// Current element.
		index: usize,
		/// Element count.
		length: usize,
		/// Elements hold pointers to items rather than the items.
		indirect: bool,
	},
	/// Precomputed items, used by hand-written collections.
	Items {
		/// Items.
		items: Vec<RnaPointer>,
		/// Current position.
		index: usize,
	},
}

impl IterState {
	/// Whether the cursor is positioned on an item.
	pub fn is_valid(&self) -> bool {
		match self {
			Self::Done => false,
			Self::ListBase { link, .. } => *link != 0,
			Self::Array { index, length, .. } => index < length,
			Self::Items { items, index } => *index < items.len(),
		}
	}
}

/// Accessor set for one property.
///
/// Generated sets fill the slots from the property's binding; hand-written sets are built
/// with the `with_*` methods and take precedence slot by slot.
#[derive(Clone, Default, Debug)]
pub struct Accessors {
	/// Getter.
	pub get: Option<Hook<GetFn>>,
	/// Setter.
	pub set: Option<Hook<SetFn>>,
	/// Length function.
	pub length: Option<Hook<LengthFn>>,
	/// Collection begin.
	pub begin: Option<Hook<BeginFn>>,
	/// Collection next.
	pub next: Option<Hook<NextFn>>,
	/// Collection end.
	pub end: Option<Hook<EndFn>>,
	/// Collection current item.
	pub item: Option<Hook<ItemFn>>,
}

impl Accessors {
	/// Replace the getter.
	pub fn with_get(mut self, f: impl Fn(&Access<'_>, &RnaPointer) -> Option<Value> + Send + Sync + 'static) -> Self {
		self.get = Some(Hook(Arc::new(f)));
		self
	}

	/// Replace the setter.
	pub fn with_set(mut self, f: impl Fn(&mut AccessMut<'_>, &RnaPointer, &Value) -> bool + Send + Sync + 'static) -> Self {
		self.set = Some(Hook(Arc::new(f)));
		self
	}

	/// Replace the length function.
	pub fn with_length(mut self, f: impl Fn(&Access<'_>, &RnaPointer) -> Option<usize> + Send + Sync + 'static) -> Self {
		self.length = Some(Hook(Arc::new(f)));
		self
	}

	/// Replace begin.
	pub fn with_begin(mut self, f: impl Fn(&Access<'_>, &RnaPointer) -> IterState + Send + Sync + 'static) -> Self {
		self.begin = Some(Hook(Arc::new(f)));
		self
	}

	/// Replace next.
	pub fn with_next(mut self, f: impl Fn(&Access<'_>, &mut IterState) + Send + Sync + 'static) -> Self {
		self.next = Some(Hook(Arc::new(f)));
		self
	}

	/// Replace end.
	pub fn with_end(mut self, f: impl Fn(&mut IterState) + Send + Sync + 'static) -> Self {
		self.end = Some(Hook(Arc::new(f)));
		self
	}

	/// Replace the item function.
	pub fn with_item(mut self, f: impl Fn(&Access<'_>, &RnaPointer, &IterState) -> Option<RnaPointer> + Send + Sync + 'static) -> Self {
		self.item = Some(Hook(Arc::new(f)));
		self
	}

	/// Hand-written collection over a precomputed item list.
	pub fn with_items(self, f: impl Fn(&Access<'_>, &RnaPointer) -> Vec<RnaPointer> + Send + Sync + 'static) -> Self {
		self.with_begin(move |access, ptr| IterState::Items {
			items: f(access, ptr),
			index: 0,
		})
		.with_next(|_, state| {
			if let IterState::Items { index, .. } = state {
				*index += 1;
			}
		})
		.with_item(|_, _, state| match state {
			IterState::Items { items, index } => items.get(*index).copied(),
			_ => None,
		})
	}

	/// Slots from `self`, falling back to `fallback` for empty ones.
	pub fn or(&self, fallback: &Accessors) -> Accessors {
		Accessors {
			get: self.get.clone().or_else(|| fallback.get.clone()),
			set: self.set.clone().or_else(|| fallback.set.clone()),
			length: self.length.clone().or_else(|| fallback.length.clone()),
			begin: self.begin.clone().or_else(|| fallback.begin.clone()),
			next: self.next.clone().or_else(|| fallback.next.clone()),
			end: self.end.clone().or_else(|| fallback.end.clone()),
			item: self.item.clone().or_else(|| fallback.item.clone()),
		}
	}

	/// Whether no slot is filled.
	pub fn is_empty(&self) -> bool {
		self.get.is_none()
			&& self.set.is_none()
			&& self.length.is_none()
			&& self.begin.is_none()
			&& self.next.is_none()
			&& self.end.is_none()
			&& self.item.is_none()
	}
}

/// Generated accessor name, `<struct>_<property>_<op>`.
pub fn accessor_name(struct_identifier: &str, property: &str, op: &str) -> String {
	format!("{struct_identifier}_{property}_{op}")
}
