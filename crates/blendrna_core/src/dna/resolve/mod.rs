use serde::Serialize;

use crate::dna::{LayoutTable, PlacedMember, Primitive};

/// Location of a schema property inside a layout struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldBinding {
	/// Struct the path starts from.
	pub struct_name: Box<str>,
	/// Path as written, such as `flag`, `id.name`, or `data->count`.
	pub path: Box<str>,
	/// Type name of the final member.
	pub type_name: Box<str>,
	/// Primitive storage of the final member, `None` for struct-typed members.
	pub primitive: Option<Primitive>,
	/// Offsets of pointer members crossed with `->`, relative to the struct each one lives in.
	pub hops: Vec<usize>,
	/// Offset of the final member, relative to the start of the last struct reached.
	pub offset: usize,
	/// Size of one element; pointer width for pointer members.
	pub elem_size: usize,
	/// Pointer indirection of the final member.
	pub pointer_level: u8,
	/// Element count, `0` for scalars.
	pub array_length: usize,
}

impl FieldBinding {
	/// Whether the member lives directly inside the instance, without pointer hops.
	pub fn is_direct(&self) -> bool {
		self.hops.is_empty()
	}

	/// Bytes covered by the member.
	pub fn total_size(&self) -> usize {
		self.elem_size * self.array_length.max(1)
	}
}

struct Segment<'p> {
	name: &'p str,
	index: Option<usize>,
	through_pointer: bool,
}

fn split_path(path: &str) -> Option<Vec<Segment<'_>>> {
	let mut segments = Vec::new();
	for (hop, chunk) in path.split("->").enumerate() {
		for (step, part) in chunk.split('.').enumerate() {
			let part = part.trim();
			let (name, index) = match part.split_once('[') {
				Some((name, rest)) => (name, Some(rest.strip_suffix(']')?.trim().parse::<usize>().ok()?)),
				None => (part, None),
			};
			if name.is_empty() {
				return None;
			}
			segments.push(Segment {
				name,
				index,
				through_pointer: hop > 0 && step == 0,
			});
		}
	}
	Some(segments)
}

/// Resolve `path` inside `struct_name` to a byte location.
///
/// Segments are separated by `.` for nested value structs and `->` for structs reached
/// through a pointer. A trailing `[i]` selects one element of an array member. Returns `None`
/// when the path is malformed or any struct or member along it is absent.
pub fn resolve_binding(table: &LayoutTable, struct_name: &str, path: &str) -> Option<FieldBinding> {
	let segments = split_path(path)?;
	let mut current = struct_name;
	let mut base = 0_usize;
	let mut hops = Vec::new();
	let mut previous: Option<PlacedMember<'_>> = None;

	for segment in &segments {
		if let Some(parent) = previous {
			match (segment.through_pointer, parent.decl.pointer_depth) {
				(false, 0) => base += parent.offset,
				(true, 1) => {
					hops.push(base + parent.offset);
					base = 0;
				}
				_ => return None,
			}
			current = parent.type_name;
		}

		let (_, item) = table.find_struct(current)?;
		let mut member = table.placed_members(item).find(|member| member.decl.ident == segment.name)?;
		if let Some(index) = segment.index {
			if index >= member.decl.array_len? {
				return None;
			}
			member.offset += index * member.elem_size;
			member.decl.array_len = None;
		}
		previous = Some(member);
	}

	let member = previous?;
	Some(FieldBinding {
		struct_name: struct_name.into(),
		path: path.into(),
		type_name: member.type_name.into(),
		primitive: if member.decl.is_pointer() { None } else { Primitive::from_type_name(member.type_name) },
		hops,
		offset: base + member.offset,
		elem_size: member.elem_size,
		pointer_level: member.decl.pointer_depth,
		array_length: member.decl.array_len.unwrap_or(0),
	})
}
