use std::collections::HashMap;

use crate::dna::bytes::Cursor;
use crate::dna::{Declarator, DnaError, Endianness, Primitive, Result};

/// Struct-layout table: every struct type, its members, and type sizes.
///
/// Mirrors the `SDNA` block of a `.blend` file: a flat name table, a flat type table with
/// sizes, and per-struct member lists referencing both by index.
#[derive(Debug, Clone)]
pub struct LayoutTable {
	/// Member declarators (`*next`, `name[64]`, ...).
	pub names: Vec<Box<str>>,
	/// Type names, primitives and structs alike.
	pub types: Vec<Box<str>>,
	/// Byte size for each entry of `types`.
	pub tlen: Vec<u16>,
	/// Struct declarations.
	pub structs: Vec<LayoutStruct>,
	/// Width of pointer members in bytes.
	pub pointer_size: usize,
	struct_for_type: Vec<Option<u32>>,
	type_by_name: HashMap<Box<str>, u16>,
}

/// One struct declaration.
#[derive(Debug, Clone)]
pub struct LayoutStruct {
	/// Index into [`LayoutTable::types`] for the struct name.
	pub type_idx: u16,
	/// Members in declaration order.
	pub members: Vec<LayoutMember>,
}

/// One struct member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMember {
	/// Index into [`LayoutTable::types`].
	pub type_idx: u16,
	/// Index into [`LayoutTable::names`].
	pub name_idx: u16,
}

/// Member with its declarator and byte placement resolved.
#[derive(Debug, Clone, Copy)]
pub struct PlacedMember<'a> {
	/// Type name of the member.
	pub type_name: &'a str,
	/// Parsed declarator.
	pub decl: Declarator<'a>,
	/// Byte offset from the start of the owning struct.
	pub offset: usize,
	/// Size of one element in bytes.
	pub elem_size: usize,
}

impl PlacedMember<'_> {
	/// Total member size in bytes.
	pub fn size(&self) -> usize {
		self.elem_size * self.decl.element_count()
	}
}

impl LayoutTable {
	/// Assemble a table from raw parts, validating every index.
	pub fn from_parts(names: Vec<Box<str>>, types: Vec<Box<str>>, tlen: Vec<u16>, structs: Vec<LayoutStruct>, pointer_size: usize) -> Result<Self> {
		if !matches!(pointer_size, 4 | 8) {
			return Err(DnaError::UnsupportedPointerSize { size: pointer_size });
		}
		if tlen.len() != types.len() {
			return Err(DnaError::IndexOutOfRange {
				kind: "tlen",
				idx: tlen.len() as u32,
				max: types.len() as u32,
			});
		}

		let mut struct_for_type = vec![None; types.len()];
		for (idx, item) in structs.iter().enumerate() {
			check_index("struct.type_idx", item.type_idx, types.len())?;
			for member in &item.members {
				check_index("member.type_idx", member.type_idx, types.len())?;
				check_index("member.name_idx", member.name_idx, names.len())?;
			}
			let slot = &mut struct_for_type[usize::from(item.type_idx)];
			if slot.is_some() {
				return Err(DnaError::DuplicateStruct {
					type_name: types[usize::from(item.type_idx)].to_string(),
				});
			}
			*slot = Some(idx as u32);
		}

		let type_by_name = types.iter().enumerate().map(|(idx, name)| (name.clone(), idx as u16)).collect();

		Ok(Self {
			names,
			types,
			tlen,
			structs,
			pointer_size,
			struct_for_type,
			type_by_name,
		})
	}

	/// Parse a `DNA1` payload.
	pub fn parse(payload: &[u8], order: Endianness, pointer_size: usize) -> Result<Self> {
		let mut cursor = Cursor::new(payload);
		expect_tag(&mut cursor, *b"SDNA")?;

		expect_tag(&mut cursor, *b"NAME")?;
		let names = read_strings(&mut cursor, order)?;

		expect_tag(&mut cursor, *b"TYPE")?;
		let types = read_strings(&mut cursor, order)?;

		expect_tag(&mut cursor, *b"TLEN")?;
		let tlen = (0..types.len()).map(|_| cursor.u16(order)).collect::<Result<Vec<_>>>()?;
		cursor.align4()?;

		expect_tag(&mut cursor, *b"STRC")?;
		let count = cursor.u32(order)? as usize;
		let mut structs = Vec::with_capacity(count.min(4096));
		for _ in 0..count {
			let type_idx = cursor.u16(order)?;
			let member_count = cursor.u16(order)?;
			let members = (0..member_count)
				.map(|_| -> Result<LayoutMember> {
					Ok(LayoutMember {
						type_idx: cursor.u16(order)?,
						name_idx: cursor.u16(order)?,
					})
				})
				.collect::<Result<Vec<_>>>()?;
			structs.push(LayoutStruct { type_idx, members });
		}

		Self::from_parts(names, types, tlen, structs, pointer_size)
	}

	/// Serialize as a little-endian `DNA1` payload.
	pub fn to_sdna_bytes(&self) -> Vec<u8> {
		let mut out = b"SDNA".to_vec();
		write_strings(&mut out, *b"NAME", &self.names);
		write_strings(&mut out, *b"TYPE", &self.types);
		out.extend_from_slice(b"TLEN");
		for len in &self.tlen {
			out.extend_from_slice(&len.to_le_bytes());
		}
		pad4(&mut out);
		out.extend_from_slice(b"STRC");
		out.extend_from_slice(&(self.structs.len() as u32).to_le_bytes());
		for item in &self.structs {
			out.extend_from_slice(&item.type_idx.to_le_bytes());
			out.extend_from_slice(&(item.members.len() as u16).to_le_bytes());
			for member in &item.members {
				out.extend_from_slice(&member.type_idx.to_le_bytes());
				out.extend_from_slice(&member.name_idx.to_le_bytes());
			}
		}
		out
	}

	/// Type index for a type name.
	pub fn type_index(&self, name: &str) -> Option<u16> {
		self.type_by_name.get(name).copied()
	}

	/// Type name by index.
	pub fn type_name(&self, type_idx: u16) -> &str {
		&self.types[usize::from(type_idx)]
	}

	/// Member declarator text by name index.
	pub fn member_name(&self, name_idx: u16) -> &str {
		&self.names[usize::from(name_idx)]
	}

	/// Size of a type in bytes.
	pub fn type_size(&self, type_idx: u16) -> usize {
		usize::from(self.tlen[usize::from(type_idx)])
	}

	/// Struct declaration by layout struct index.
	pub fn struct_by_index(&self, sdna_nr: u32) -> Option<&LayoutStruct> {
		self.structs.get(sdna_nr as usize)
	}

	/// Struct declaration and its index by struct name.
	pub fn find_struct(&self, name: &str) -> Option<(u32, &LayoutStruct)> {
		let type_idx = self.type_index(name)?;
		let sdna_nr = self.struct_for_type[usize::from(type_idx)]?;
		Some((sdna_nr, &self.structs[sdna_nr as usize]))
	}

	/// Declared size of a struct in bytes.
	pub fn struct_size(&self, name: &str) -> Option<usize> {
		self.type_index(name).filter(|idx| self.struct_for_type[usize::from(*idx)].is_some()).map(|idx| self.type_size(idx))
	}

	/// Primitive storage for a type index, if it is not a struct.
	pub fn primitive(&self, type_idx: u16) -> Option<Primitive> {
		Primitive::from_type_name(self.type_name(type_idx))
	}

	/// Members of `item` with offsets computed in declaration order.
	pub fn placed_members<'a>(&'a self, item: &'a LayoutStruct) -> impl Iterator<Item = PlacedMember<'a>> + 'a {
		let mut offset = 0_usize;
		item.members.iter().map(move |member| {
			let decl = Declarator::parse(self.member_name(member.name_idx));
			let elem_size = if decl.is_pointer() { self.pointer_size } else { self.type_size(member.type_idx) };
			let placed = PlacedMember {
				type_name: self.type_name(member.type_idx),
				decl,
				offset,
				elem_size,
			};
			offset += placed.size();
			placed
		})
	}
}

fn expect_tag(cursor: &mut Cursor<'_>, expected: [u8; 4]) -> Result<()> {
	let at = cursor.pos();
	let got = cursor.code4()?;
	if got != expected {
		return Err(DnaError::BadTag { expected, got, at });
	}
	Ok(())
}

fn read_strings(cursor: &mut Cursor<'_>, order: Endianness) -> Result<Vec<Box<str>>> {
	let count = cursor.u32(order)? as usize;
	let strings = (0..count).map(|_| cursor.cstr()).collect::<Result<Vec<_>>>()?;
	cursor.align4()?;
	Ok(strings)
}

fn write_strings(out: &mut Vec<u8>, tag: [u8; 4], strings: &[Box<str>]) {
	out.extend_from_slice(&tag);
	out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
	for item in strings {
		out.extend_from_slice(item.as_bytes());
		out.push(0);
	}
	pad4(out);
}

fn pad4(out: &mut Vec<u8>) {
	while out.len() % 4 != 0 {
		out.push(0);
	}
}

fn check_index(kind: &'static str, idx: u16, len: usize) -> Result<()> {
	if usize::from(idx) >= len {
		return Err(DnaError::IndexOutOfRange {
			kind,
			idx: u32::from(idx),
			max: len.saturating_sub(1) as u32,
		});
	}
	Ok(())
}
