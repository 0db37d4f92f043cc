use std::fs;
use std::path::Path;

use crate::dna::compression::decode_bytes;
use crate::dna::{Block, BlockIter, Compression, DnaError, Endianness, Heap, LayoutTable, Result, SourceHeader};

/// Decoded `.blend` file used as a source of layout tables and stored instances.
pub struct BlendSource {
	/// Parsed file header.
	pub header: SourceHeader,
	/// Compression found on disk.
	pub compression: Compression,
	bytes: Vec<u8>,
}

impl BlendSource {
	/// Read and decode a file.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		Self::from_bytes(fs::read(path)?)
	}

	/// Decode an in-memory file image.
	pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
		let (compression, bytes) = decode_bytes(raw)?;
		let header = SourceHeader::parse(&bytes)?;
		Ok(Self { header, compression, bytes })
	}

	/// Iterate block records.
	pub fn blocks(&self) -> BlockIter<'_> {
		BlockIter::new(&self.bytes, self.header.header_size, self.header)
	}

	/// Parse the `DNA1` block into a layout table.
	pub fn layout_table(&self) -> Result<LayoutTable> {
		for block in self.blocks() {
			let block = block?;
			if block.head.code == *b"DNA1" {
				return LayoutTable::parse(block.payload, self.header.endianness, self.header.pointer_size);
			}
		}
		Err(DnaError::LayoutBlockMissing)
	}

	/// Copy every addressed data block into a fresh heap at its stored address.
	///
	/// Blocks whose ranges collide with an earlier block are skipped and counted.
	pub fn load_heap(&self) -> Result<(Heap, usize)> {
		if self.header.endianness != Endianness::Little || self.header.pointer_size != Heap::POINTER_SIZE {
			return Err(DnaError::UnsupportedInstanceLayout {
				endianness: self.header.endianness.as_str(),
				pointer_size: self.header.pointer_size,
			});
		}

		let mut heap = Heap::new();
		let mut skipped = 0_usize;
		for block in self.blocks() {
			let Block { head, payload, .. } = block?;
			if head.is_end() || head.code == *b"DNA1" || head.old == 0 || payload.is_empty() {
				continue;
			}
			let count = usize::try_from(head.nr).unwrap_or(usize::MAX);
			if heap.insert(head.old, payload.to_vec(), Some(head.sdna_nr), count).is_err() {
				skipped += 1;
			}
		}
		if skipped > 0 {
			tracing::debug!(skipped, "overlapping blocks left out of heap import");
		}
		Ok((heap, skipped))
	}
}

/// Encode a minimal modern file around `layout`, followed by `(code, old, sdna_nr, payload)` blocks.
pub fn encode_blend(layout: &LayoutTable, blocks: &[([u8; 4], u64, u32, &[u8])]) -> Vec<u8> {
	fn push_block(out: &mut Vec<u8>, code: [u8; 4], sdna_nr: u32, old: u64, nr: i64, payload: &[u8]) {
		out.extend_from_slice(&code);
		out.extend_from_slice(&sdna_nr.to_le_bytes());
		out.extend_from_slice(&old.to_le_bytes());
		out.extend_from_slice(&(payload.len() as i64).to_le_bytes());
		out.extend_from_slice(&nr.to_le_bytes());
		out.extend_from_slice(payload);
	}

	let mut out = b"BLENDER17-01v0500".to_vec();
	for (code, old, sdna_nr, payload) in blocks {
		push_block(&mut out, *code, *sdna_nr, *old, 1, payload);
	}
	push_block(&mut out, *b"DNA1", 0, 0, 1, &layout.to_sdna_bytes());
	push_block(&mut out, *b"ENDB", 0, 0, 0, &[]);
	out
}

#[cfg(test)]
mod tests;
