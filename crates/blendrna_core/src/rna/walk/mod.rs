use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::dna::Heap;
use crate::rna::{PropertyId, PropertyType, RnaPointer, SchemaRegistry, StructFlag, Value};

/// Reference walk limits.
#[derive(Debug, Clone)]
pub struct WalkOptions {
	/// Deepest nesting followed below the start instance.
	pub max_depth: usize,
	/// Stop after reporting this many edges.
	pub max_edges: usize,
	/// Report null pointers as edges.
	pub include_null: bool,
}

impl Default for WalkOptions {
	fn default() -> Self {
		Self {
			max_depth: 32,
			max_edges: 65536,
			include_null: false,
		}
	}
}

/// One reference found by the walk.
#[derive(Debug, Clone)]
pub struct WalkEdge {
	/// Instance holding the reference.
	pub from: RnaPointer,
	/// Pointer or collection property.
	pub property: PropertyId,
	/// Item position for collection references.
	pub index: Option<usize>,
	/// Referenced instance, refined.
	pub to: RnaPointer,
	/// Nesting level of `from`; `0` for the start instance.
	pub depth: usize,
}

/// Why the walk ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
	/// The visitor asked to stop.
	Visitor,
	/// `max_edges` was reached.
	MaxEdges,
}

/// Walk summary.
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
	/// Edges reported to the visitor.
	pub edges: usize,
	/// Instances whose properties were scanned.
	pub scanned: usize,
	/// Early stop reason.
	pub stop: Option<WalkStop>,
}

struct Walker<'a, F> {
	registry: &'a SchemaRegistry,
	heap: &'a Heap,
	options: &'a WalkOptions,
	visit: F,
	seen: HashSet<(u64, Option<crate::rna::StructId>)>,
	result: WalkResult,
}

impl<F: FnMut(&WalkEdge) -> ControlFlow<()>> Walker<'_, F> {
	fn scan(&mut self, from: RnaPointer, depth: usize) -> ControlFlow<()> {
		let Some(addr) = from.addr() else {
			return ControlFlow::Continue(());
		};
		if !self.seen.insert((addr, from.struct_type)) {
			return ControlFlow::Continue(());
		}
		let Some(struct_type) = from.struct_type else {
			return ControlFlow::Continue(());
		};
		self.result.scanned += 1;

		let registry = self.registry;
		for property in registry.properties_of(struct_type, false) {
			let Some(def) = registry.property(property) else {
				continue;
			};
			let targets = match def.property_type() {
				PropertyType::Pointer => match registry.get(self.heap, property, &from) {
					Some(Value::Pointer(to)) => vec![(None, to)],
					_ => Vec::new(),
				},
				PropertyType::Collection => registry
					.collection_items(self.heap, property, &from)
					.into_iter()
					.enumerate()
					.map(|(index, to)| (Some(index), to))
					.collect(),
				_ => continue,
			};
			for (index, to) in targets {
				if to.is_null() && !self.options.include_null {
					continue;
				}
				// Descriptor targets such as `rna_type` are not instance data.
				if !to.is_null() && to.addr().is_none() {
					continue;
				}
				self.edge(WalkEdge {
					from,
					property,
					index,
					to,
					depth,
				})?;
			}
		}
		ControlFlow::Continue(())
	}

	fn edge(&mut self, edge: WalkEdge) -> ControlFlow<()> {
		if self.result.edges >= self.options.max_edges {
			self.result.stop = Some(WalkStop::MaxEdges);
			return ControlFlow::Break(());
		}
		self.result.edges += 1;
		if (self.visit)(&edge).is_break() {
			self.result.stop = Some(WalkStop::Visitor);
			return ControlFlow::Break(());
		}
		let crosses_id = edge
			.to
			.struct_type
			.and_then(|id| self.registry.struct_def(id))
			.is_some_and(|def| def.flag.contains(StructFlag::ID));
		if crosses_id || edge.depth + 1 > self.options.max_depth {
			return ControlFlow::Continue(());
		}
		self.scan(edge.to, edge.depth + 1)
	}
}

impl SchemaRegistry {
	/// Report every pointer and collection reference reachable from `ptr`.
	///
	/// Recursion follows nested data but stops at identified objects: the edge into one is
	/// reported, its own properties are not scanned. Instances are scanned at most once.
	pub fn walk_references(&self, heap: &Heap, ptr: &RnaPointer, options: &WalkOptions, visit: impl FnMut(&WalkEdge) -> ControlFlow<()>) -> WalkResult {
		let mut walker = Walker {
			registry: self,
			heap,
			options,
			visit,
			seen: HashSet::new(),
			result: WalkResult::default(),
		};
		let start = self.refine(heap, ptr);
		let _ = walker.scan(start, 0);
		tracing::trace!(edges = walker.result.edges, scanned = walker.result.scanned, "reference walk finished");
		walker.result
	}
}

#[cfg(test)]
mod tests;
