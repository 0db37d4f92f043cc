use std::path::PathBuf;

use blendrna::rna::{GenerateOptions, GenerationReport, Result, SchemaSummary};
use serde::Serialize;

use crate::cmd::util::{load_layout, load_schema};

/// Output and generation switches for the `schema` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOptions {
	/// Collections missing accessors are warnings.
	pub lenient: bool,
	/// Skip raw access annotations.
	pub no_raw: bool,
	/// Print JSON.
	pub json: bool,
}

#[derive(Serialize)]
struct SchemaJson {
	generation: GenerationReport,
	summary: SchemaSummary,
}

pub fn run(manifest: PathBuf, layout: Option<PathBuf>, options: SchemaOptions) -> Result<()> {
	let layout = layout.map(|path| load_layout(&path)).transpose()?;
	let mut registry = load_schema(&manifest, layout)?;
	let generation = registry.generate_with(&GenerateOptions {
		strict_collections: !options.lenient,
		raw_access: !options.no_raw,
	})?;
	let summary = SchemaSummary::from_registry(&registry);

	if options.json {
		println!("{}", serde_json::to_string_pretty(&SchemaJson { generation, summary })?);
		return Ok(());
	}

	println!("manifest: {}", manifest.display());
	println!("structs: {}", generation.structs);
	println!("properties: {}", generation.properties);
	for plan in &generation.plans {
		let template = plan.template.map_or("manual", |template| template.as_str());
		let member = plan.binding.as_ref().map_or("-", |binding| &*binding.field.path);
		println!("  {}.{} {} {} [{}]", plan.struct_identifier, plan.identifier, template, member, plan.accessors.join(", "));
		if let Some(raw) = plan.raw {
			println!("    raw: +{} {} x{}", raw.offset, raw.raw_type.type_name(), raw.array_length.max(1));
		}
	}
	for call in &generation.calls {
		println!("  {call}");
	}
	Ok(())
}
