use std::io::Read;

use crate::dna::{DnaError, Result};

const BLEND_MAGIC: &[u8] = b"BLENDER";
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;

/// Compression detected on a layout source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Plain bytes.
	None,
	/// zstd frame stream.
	Zstd,
}

impl Compression {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Detect compression and return the decoded blend bytes.
pub(crate) fn decode_bytes(raw: Vec<u8>) -> Result<(Compression, Vec<u8>)> {
	if raw.starts_with(BLEND_MAGIC) {
		return Ok((Compression::None, raw));
	}
	if !raw.starts_with(&ZSTD_MAGIC) {
		let mut magic = [0_u8; 4];
		let take = raw.len().min(4);
		magic[..take].copy_from_slice(&raw[..take]);
		return Err(DnaError::UnknownMagic { magic });
	}

	// `take` bounds the read; one extra byte detects overflow.
	let decoder = zstd::stream::read::Decoder::new(raw.as_slice())?;
	let mut out = Vec::new();
	decoder.take(MAX_DECOMPRESSED_BYTES as u64 + 1).read_to_end(&mut out)?;
	if out.len() > MAX_DECOMPRESSED_BYTES {
		return Err(DnaError::DecompressedTooLarge { limit: MAX_DECOMPRESSED_BYTES });
	}
	if !out.starts_with(BLEND_MAGIC) {
		return Err(DnaError::NotBlendAfterDecompress);
	}
	Ok((Compression::Zstd, out))
}
