use std::path::PathBuf;

use blendrna::dna::{BlendSource, DnaError, LayoutTable};
use blendrna::rna::Result;
use serde::Serialize;

use crate::cmd::util::{is_json, load_layout};

#[derive(Serialize)]
struct LayoutJson {
	path: String,
	compression: Option<&'static str>,
	version: Option<u16>,
	pointer_size: usize,
	names: usize,
	types: usize,
	structs: usize,
	#[serde(rename = "struct", skip_serializing_if = "Option::is_none")]
	detail: Option<StructJson>,
}

#[derive(Serialize)]
struct StructJson {
	name: String,
	sdna_index: u32,
	size: usize,
	members: Vec<MemberJson>,
}

#[derive(Serialize)]
struct MemberJson {
	#[serde(rename = "type")]
	type_name: String,
	name: String,
	offset: usize,
	size: usize,
}

pub fn run(path: PathBuf, struct_name: Option<String>, json: bool) -> Result<()> {
	let (table, compression, version) = if is_json(&path) {
		(load_layout(&path)?, None, None)
	} else {
		let source = BlendSource::open(&path)?;
		let table = source.layout_table()?;
		(table, Some(source.compression.as_str()), Some(source.header.version))
	};
	let detail = struct_name.map(|name| describe(&table, &name)).transpose()?;

	let out = LayoutJson {
		path: path.display().to_string(),
		compression,
		version,
		pointer_size: table.pointer_size,
		names: table.names.len(),
		types: table.types.len(),
		structs: table.structs.len(),
		detail,
	};
	if json {
		println!("{}", serde_json::to_string_pretty(&out)?);
		return Ok(());
	}

	println!("path: {}", out.path);
	if let Some(compression) = out.compression {
		println!("compression: {compression}");
	}
	if let Some(version) = out.version {
		println!("version: {version}");
	}
	println!("pointer_size: {}", out.pointer_size);
	println!("layout_names: {}", out.names);
	println!("layout_types: {}", out.types);
	println!("layout_structs: {}", out.structs);
	if let Some(item) = out.detail {
		println!("struct: {}", item.name);
		println!("sdna_index: {}", item.sdna_index);
		println!("size: {}", item.size);
		for member in &item.members {
			println!("  {:>5} {} {} ({} bytes)", member.offset, member.type_name, member.name, member.size);
		}
	}
	Ok(())
}

fn describe(table: &LayoutTable, name: &str) -> blendrna::dna::Result<StructJson> {
	let (sdna_index, item) = table.find_struct(name).ok_or_else(|| DnaError::StructNotFound { name: name.to_owned() })?;
	let members = table
		.placed_members(item)
		.zip(&item.members)
		.map(|(placed, member)| MemberJson {
			type_name: placed.type_name.to_owned(),
			name: table.member_name(member.name_idx).to_owned(),
			offset: placed.offset,
			size: placed.size(),
		})
		.collect();
	Ok(StructJson {
		name: name.to_owned(),
		sdna_index,
		size: table.struct_size(name).unwrap_or_default(),
		members,
	})
}
