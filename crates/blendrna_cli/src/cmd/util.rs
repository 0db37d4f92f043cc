use std::path::Path;

use blendrna::dna::{BlendSource, DnaError, LayoutTable};
use blendrna::rna::{Result, SchemaManifest, SchemaRegistry};

/// Whether `path` names a JSON layout description rather than a `.blend` file.
pub(crate) fn is_json(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a layout table from a JSON description or the `DNA1` block of a `.blend` file.
pub(crate) fn load_layout(path: &Path) -> blendrna::dna::Result<LayoutTable> {
	if is_json(path) {
		return LayoutTable::from_json(&std::fs::read_to_string(path)?);
	}
	BlendSource::open(path)?.layout_table()
}

/// Build a registry over `layout` and apply the manifest at `manifest`.
pub(crate) fn load_schema(manifest: &Path, layout: Option<LayoutTable>) -> Result<SchemaRegistry> {
	let mut registry = match layout {
		Some(layout) => SchemaRegistry::with_layout(layout),
		None => SchemaRegistry::new(),
	};
	SchemaManifest::load(manifest)?.apply(&mut registry)?;
	Ok(registry)
}

/// Parse decimal or `0x`-prefixed hex address literal.
pub(crate) fn parse_addr(value: &str) -> blendrna::dna::Result<u64> {
	let parsed = if let Some(stripped) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
		u64::from_str_radix(stripped, 16)
	} else {
		value.parse::<u64>()
	};

	parsed.map_err(|_| DnaError::InvalidAddress { value: value.to_owned() })
}
