use std::path::PathBuf;

use blendrna::dna::{DnaError, resolve_binding};
use blendrna::rna::Result;

use crate::cmd::util::load_layout;

pub fn run(layout: PathBuf, struct_name: &str, path: &str, json: bool) -> Result<()> {
	let table = load_layout(&layout)?;
	if table.find_struct(struct_name).is_none() {
		return Err(DnaError::StructNotFound { name: struct_name.to_owned() }.into());
	}
	let binding = resolve_binding(&table, struct_name, path).ok_or_else(|| DnaError::MemberPathNotFound {
		struct_name: struct_name.to_owned(),
		path: path.to_owned(),
	})?;

	if json {
		println!("{}", serde_json::to_string_pretty(&binding)?);
		return Ok(());
	}

	println!("struct: {}", binding.struct_name);
	println!("path: {}", binding.path);
	println!("type: {}", binding.type_name);
	if let Some(primitive) = binding.primitive {
		println!("primitive: {}", primitive.type_name());
	}
	for (depth, hop) in binding.hops.iter().enumerate() {
		println!("hop[{depth}]: pointer at +{hop}");
	}
	println!("offset: {}", binding.offset);
	println!("elem_size: {}", binding.elem_size);
	println!("pointer_level: {}", binding.pointer_level);
	println!("array_length: {}", binding.array_length);
	Ok(())
}
