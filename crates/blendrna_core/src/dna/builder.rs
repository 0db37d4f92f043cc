use std::collections::HashMap;

use serde::Deserialize;

use crate::dna::{Declarator, DnaError, LayoutMember, LayoutStruct, LayoutTable, Primitive, Result};

/// Programmatic construction of a [`LayoutTable`].
///
/// Struct sizes are the sum of member sizes; no implicit padding is inserted, matching how
/// Blender lays out DNA structs. `ListBase { void *first, *last; }` is always declared.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
	pointer_size: usize,
	names: Vec<Box<str>>,
	name_lookup: HashMap<Box<str>, u16>,
	types: Vec<Box<str>>,
	type_lookup: HashMap<Box<str>, u16>,
	structs: Vec<(u16, Vec<LayoutMember>)>,
}

impl LayoutBuilder {
	/// Start an empty table with the given pointer width.
	pub fn new(pointer_size: usize) -> Self {
		let builder = Self {
			pointer_size,
			names: Vec::new(),
			name_lookup: HashMap::new(),
			types: Vec::new(),
			type_lookup: HashMap::new(),
			structs: Vec::new(),
		};
		builder.struct_def("ListBase", &[("void", "*first"), ("void", "*last")])
	}

	/// Declare a struct from `(type, declarator)` pairs, replacing an earlier declaration.
	pub fn struct_def(mut self, name: &str, members: &[(&str, &str)]) -> Self {
		let type_idx = self.intern_type(name);
		let members = members
			.iter()
			.map(|(type_name, decl)| LayoutMember {
				type_idx: self.intern_type(type_name),
				name_idx: self.intern_name(decl),
			})
			.collect();
		match self.structs.iter_mut().find(|(existing, _)| *existing == type_idx) {
			Some(slot) => slot.1 = members,
			None => self.structs.push((type_idx, members)),
		}
		self
	}

	/// Compute type sizes and produce the table.
	pub fn build(self) -> Result<LayoutTable> {
		for (kind, count) in [("name", self.names.len()), ("type", self.types.len())] {
			if count > usize::from(u16::MAX) {
				return Err(DnaError::TableOverflow { kind, count });
			}
		}

		let by_type: HashMap<u16, usize> = self.structs.iter().enumerate().map(|(idx, (type_idx, _))| (*type_idx, idx)).collect();
		let mut sizes: Vec<Option<usize>> = vec![None; self.types.len()];
		for type_idx in 0..self.types.len() as u16 {
			self.size_of(type_idx, &by_type, &mut sizes, &mut Vec::new())?;
		}

		let tlen = sizes
			.iter()
			.map(|size| {
				let size = size.unwrap_or(0);
				u16::try_from(size).map_err(|_| DnaError::TableOverflow { kind: "type size", count: size })
			})
			.collect::<Result<Vec<_>>>()?;
		let structs = self.structs.into_iter().map(|(type_idx, members)| LayoutStruct { type_idx, members }).collect();
		LayoutTable::from_parts(self.names, self.types, tlen, structs, self.pointer_size)
	}

	/// Size of a type; opaque non-struct, non-primitive types are sized `0` until used inline.
	fn size_of(&self, type_idx: u16, by_type: &HashMap<u16, usize>, sizes: &mut Vec<Option<usize>>, stack: &mut Vec<u16>) -> Result<usize> {
		if let Some(size) = sizes[usize::from(type_idx)] {
			return Ok(size);
		}
		let name = &self.types[usize::from(type_idx)];
		let Some(struct_idx) = by_type.get(&type_idx) else {
			let size = Primitive::from_type_name(name).map_or(0, Primitive::size);
			sizes[usize::from(type_idx)] = Some(size);
			return Ok(size);
		};
		if stack.contains(&type_idx) {
			return Err(DnaError::UnknownType { name: name.to_string() });
		}

		stack.push(type_idx);
		let mut total = 0_usize;
		for member in &self.structs[*struct_idx].1 {
			let decl = Declarator::parse(&self.names[usize::from(member.name_idx)]);
			let elem = if decl.is_pointer() {
				self.pointer_size
			} else {
				let size = self.size_of(member.type_idx, by_type, sizes, stack)?;
				if size == 0 {
					return Err(DnaError::UnknownType {
						name: self.types[usize::from(member.type_idx)].to_string(),
					});
				}
				size
			};
			total += elem * decl.element_count();
		}
		stack.pop();

		sizes[usize::from(type_idx)] = Some(total);
		Ok(total)
	}

	fn intern_type(&mut self, name: &str) -> u16 {
		intern(&mut self.types, &mut self.type_lookup, name)
	}

	fn intern_name(&mut self, name: &str) -> u16 {
		intern(&mut self.names, &mut self.name_lookup, name)
	}
}

fn intern(table: &mut Vec<Box<str>>, lookup: &mut HashMap<Box<str>, u16>, value: &str) -> u16 {
	if let Some(idx) = lookup.get(value) {
		return *idx;
	}
	let idx = table.len() as u16;
	table.push(value.into());
	lookup.insert(value.into(), idx);
	idx
}

/// JSON description of a layout table.
///
/// ```json
/// { "pointer_size": 8, "structs": [ { "name": "Item", "members": [ { "type": "int", "name": "count" } ] } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutSpec {
	/// Pointer width, defaults to 8.
	#[serde(default = "default_pointer_size")]
	pub pointer_size: usize,
	/// Struct declarations.
	pub structs: Vec<LayoutSpecStruct>,
}

/// One struct in a [`LayoutSpec`].
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutSpecStruct {
	/// Struct type name.
	pub name: String,
	/// Members in declaration order.
	pub members: Vec<LayoutSpecMember>,
}

/// One member in a [`LayoutSpecStruct`].
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutSpecMember {
	/// Member type name.
	#[serde(rename = "type")]
	pub type_name: String,
	/// Declarator text.
	pub name: String,
}

fn default_pointer_size() -> usize {
	8
}

impl LayoutSpec {
	/// Build the described table.
	pub fn build(&self) -> Result<LayoutTable> {
		self.structs
			.iter()
			.fold(LayoutBuilder::new(self.pointer_size), |builder, item| {
				let members: Vec<(&str, &str)> = item.members.iter().map(|member| (member.type_name.as_str(), member.name.as_str())).collect();
				builder.struct_def(&item.name, &members)
			})
			.build()
	}
}

impl LayoutTable {
	/// Parse and build a table from its JSON description.
	pub fn from_json(text: &str) -> Result<Self> {
		let spec: LayoutSpec = serde_json::from_str(text)?;
		spec.build()
	}
}
