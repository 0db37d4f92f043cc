use std::path::PathBuf;

use blendrna::dna::{BlendSource, DnaError};
use blendrna::rna::{Result, RnaPointer, StructFlag, Value};
use serde::Serialize;

use crate::cmd::util::{load_schema, parse_addr};

#[derive(Serialize)]
struct ReadJson {
	#[serde(rename = "struct")]
	struct_name: String,
	addr: String,
	name: Option<String>,
	properties: Vec<PropertyJson>,
}

#[derive(Serialize)]
struct PropertyJson {
	identifier: String,
	value: serde_json::Value,
}

pub fn run(path: PathBuf, manifest: PathBuf, struct_name: &str, addr: &str, json: bool) -> Result<()> {
	let addr = parse_addr(addr)?;
	let source = BlendSource::open(&path)?;
	let mut registry = load_schema(&manifest, Some(source.layout_table()?))?;
	registry.generate()?;
	let (heap, skipped) = source.load_heap()?;
	if skipped > 0 {
		tracing::warn!(skipped, "overlapping blocks were not loaded");
	}

	let id = registry
		.find_struct(struct_name)
		.ok_or_else(|| DnaError::StructNotFound { name: struct_name.to_owned() })?;
	let is_id = registry.struct_def(id).is_some_and(|def| def.flag.contains(StructFlag::ID));
	let ptr = if is_id { RnaPointer::new_id(id, addr) } else { RnaPointer::new(id, addr) };
	let ptr = registry.refine(&heap, &ptr);

	let properties: Vec<PropertyJson> = registry
		.properties_of(ptr.struct_type.unwrap_or(id), false)
		.filter_map(|prop| {
			let def = registry.property(prop)?;
			let value = registry.get(&heap, prop, &ptr)?;
			Some(PropertyJson {
				identifier: def.identifier.to_string(),
				value: render(&value),
			})
		})
		.collect();
	let out = ReadJson {
		struct_name: registry.struct_identifier(ptr.struct_type.unwrap_or(id)).to_owned(),
		addr: format!("0x{addr:x}"),
		name: registry.name_of(&heap, &ptr),
		properties,
	};

	if json {
		println!("{}", serde_json::to_string_pretty(&out)?);
		return Ok(());
	}
	println!("struct: {}", out.struct_name);
	println!("addr: {}", out.addr);
	if let Some(name) = &out.name {
		println!("name: {name}");
	}
	for prop in &out.properties {
		println!("  {} = {}", prop.identifier, prop.value);
	}
	Ok(())
}

// Pointers render as hex addresses; descriptor targets have none and render as null.
fn render(value: &Value) -> serde_json::Value {
	match value {
		Value::Pointer(ptr) => ptr.addr().map_or(serde_json::Value::Null, |addr| format!("0x{addr:x}").into()),
		Value::Collection(items) => items
			.iter()
			.map(|item| item.addr().map_or(serde_json::Value::Null, |addr| format!("0x{addr:x}").into()))
			.collect(),
		other => other.to_json(),
	}
}

#[cfg(test)]
mod tests;
