use std::ops::ControlFlow;

use crate::dna::{Heap, LayoutBuilder};
use crate::rna::{RnaPointer, SchemaRegistry, StructFlag, WalkEdge, WalkOptions, WalkStop};

struct Graph {
	registry: SchemaRegistry,
	heap: Heap,
	a: u64,
	b: u64,
	start: RnaPointer,
}

// A and B point at each other; A also holds a list of Tags and an Object reference.
fn graph() -> Graph {
	let layout = LayoutBuilder::new(8)
		.struct_def("A", &[("B", "*b"), ("ListBase", "tags"), ("Object", "*ob")])
		.struct_def("B", &[("A", "*a"), ("int", "value")])
		.struct_def("Tag", &[("Tag", "*next"), ("Tag", "*prev")])
		.struct_def("Object", &[("A", "*owner")])
		.build()
		.expect("layout builds");
	let mut registry = SchemaRegistry::with_layout(layout);
	let a = registry.define_struct("A", None);
	let b = registry.define_struct("B", None);
	registry.define_struct("Tag", None);
	let object = registry.define_struct("Object", None);
	registry.set_struct_flag(object, StructFlag::ID);
	registry.def_pointer(a, "b", "B", "B", "");
	registry.def_collection(a, "tags", "Tag", "Tags", "");
	registry.def_pointer(a, "ob", "Object", "Object", "");
	registry.def_pointer(b, "a", "A", "A", "");
	registry.def_pointer(object, "owner", "A", "Owner", "");
	registry.generate().expect("schema generates");

	let mut heap = Heap::new();
	let a_addr = heap.alloc(32);
	let b_addr = heap.alloc(12);
	assert!(heap.write_ptr(a_addr, b_addr));
	assert!(heap.write_ptr(b_addr, a_addr));
	Graph {
		registry,
		heap,
		a: a_addr,
		b: b_addr,
		start: RnaPointer::new(a, a_addr),
	}
}

fn collect(fx: &Graph, options: &WalkOptions) -> (Vec<WalkEdge>, crate::rna::WalkResult) {
	let mut edges = Vec::new();
	let result = fx.registry.walk_references(&fx.heap, &fx.start, options, |edge| {
		edges.push(edge.clone());
		ControlFlow::Continue(())
	});
	(edges, result)
}

fn property_name(fx: &Graph, edge: &WalkEdge) -> String {
	fx.registry.property(edge.property).map(|prop| prop.identifier.to_string()).unwrap_or_default()
}

#[test]
fn cycles_terminate() {
	let fx = graph();
	let (edges, result) = collect(&fx, &WalkOptions::default());
	assert_eq!(result.edges, 2);
	assert_eq!(result.scanned, 2);
	assert_eq!(result.stop, None);
	assert_eq!(edges[0].to.addr(), Some(fx.b));
	assert_eq!(edges[0].depth, 0);
	assert_eq!(edges[1].to.addr(), Some(fx.a));
	assert_eq!(edges[1].depth, 1);
	assert_eq!(property_name(&fx, &edges[1]), "a");
}

#[test]
fn null_references_are_optional() {
	let fx = graph();
	let options = WalkOptions {
		include_null: true,
		..WalkOptions::default()
	};
	let (edges, _) = collect(&fx, &options);
	let null: Vec<String> = edges.iter().filter(|edge| edge.to.is_null()).map(|edge| property_name(&fx, edge)).collect();
	assert_eq!(null, ["ob"]);
}

#[test]
fn collection_items_carry_their_index() {
	let mut fx = graph();
	let first = fx.heap.alloc(16);
	let second = fx.heap.alloc(16);
	assert!(fx.heap.write_ptr(fx.a + 8, first));
	assert!(fx.heap.write_ptr(fx.a + 16, second));
	assert!(fx.heap.write_ptr(first, second));
	assert!(fx.heap.write_ptr(second + 8, first));

	let (edges, result) = collect(&fx, &WalkOptions::default());
	let indices: Vec<(u64, usize)> = edges
		.iter()
		.filter_map(|edge| Some((edge.to.addr()?, edge.index?)))
		.collect();
	assert_eq!(indices, [(first, 0), (second, 1)]);
	assert_eq!(result.scanned, 4);
}

#[test]
fn identified_objects_are_not_entered() {
	let mut fx = graph();
	let object = fx.heap.alloc(8);
	assert!(fx.heap.write_ptr(fx.a + 24, object));
	assert!(fx.heap.write_ptr(object, fx.a));

	let (edges, result) = collect(&fx, &WalkOptions::default());
	let into_object = edges.iter().filter(|edge| edge.to.addr() == Some(object)).count();
	assert_eq!(into_object, 1);
	assert!(edges.iter().all(|edge| edge.from.addr() != Some(object)));
	assert_eq!(result.scanned, 2);
}

#[test]
fn limits_stop_the_walk() {
	let fx = graph();
	let shallow = WalkOptions {
		max_depth: 0,
		..WalkOptions::default()
	};
	let (_, result) = collect(&fx, &shallow);
	assert_eq!((result.edges, result.scanned), (1, 1));
	assert_eq!(result.stop, None);

	let capped = WalkOptions {
		max_edges: 1,
		..WalkOptions::default()
	};
	let (edges, result) = collect(&fx, &capped);
	assert_eq!(edges.len(), 1);
	assert_eq!(result.stop, Some(WalkStop::MaxEdges));
}

#[test]
fn visitor_can_break() {
	let fx = graph();
	let mut seen = 0;
	let result = fx.registry.walk_references(&fx.heap, &fx.start, &WalkOptions::default(), |_| {
		seen += 1;
		ControlFlow::Break(())
	});
	assert_eq!(seen, 1);
	assert_eq!(result.stop, Some(WalkStop::Visitor));
}
