use std::collections::BTreeMap;

use crate::dna::{DnaError, Result};

const FIRST_ADDRESS: u64 = 0x1000;
const ALIGN: u64 = 16;

/// Addressable instance memory.
///
/// Instances are byte blocks placed at stable addresses; pointer members hold those
/// addresses. Values are little-endian and pointers are 8 bytes wide. Ad hoc properties that
/// have no layout member live in a side table keyed by instance address.
#[derive(Debug, Default, Clone)]
pub struct Heap {
	starts: Vec<u64>,
	blocks: Vec<HeapBlock>,
	next_free: u64,
	custom: BTreeMap<(u64, Box<str>), serde_json::Value>,
}

/// One contiguous allocation.
#[derive(Debug, Clone)]
pub struct HeapBlock {
	/// Start address.
	pub addr: u64,
	/// Layout struct index of the elements, when known.
	pub sdna_nr: Option<u32>,
	/// Number of elements stored back to back.
	pub count: usize,
	bytes: Vec<u8>,
}

impl HeapBlock {
	/// Block contents.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// One-past-the-end address.
	pub fn end(&self) -> u64 {
		self.addr + self.bytes.len() as u64
	}
}

impl Heap {
	/// Width of pointers stored in heap memory.
	pub const POINTER_SIZE: usize = 8;

	/// Empty heap.
	pub fn new() -> Self {
		Self {
			next_free: FIRST_ADDRESS,
			..Self::default()
		}
	}

	/// Allocate `size` zeroed bytes and return the address.
	pub fn alloc(&mut self, size: usize) -> u64 {
		self.alloc_typed(size, None, 1)
	}

	/// Allocate `count` zeroed elements of `elem_size` bytes tagged with a layout struct index.
	pub fn alloc_typed(&mut self, elem_size: usize, sdna_nr: Option<u32>, count: usize) -> u64 {
		let addr = self.next_free.max(FIRST_ADDRESS);
		let len = (elem_size * count).max(1);
		// Keep a gap so one-past-the-end addresses never alias the next block.
		self.next_free = (addr + len as u64 + ALIGN).next_multiple_of(ALIGN);
		self.starts.push(addr);
		self.blocks.push(HeapBlock {
			addr,
			sdna_nr,
			count,
			bytes: vec![0; len],
		});
		addr
	}

	/// Place `bytes` at a caller-chosen address, as when importing stored blocks.
	pub fn insert(&mut self, addr: u64, bytes: Vec<u8>, sdna_nr: Option<u32>, count: usize) -> Result<()> {
		let Some(end) = addr.checked_add(bytes.len() as u64).filter(|end| end.checked_add(ALIGN).is_some()) else {
			return Err(DnaError::HeapAddressOutOfRange { addr });
		};
		let idx = self.starts.partition_point(|start| *start < addr);
		let overlaps_prev = idx > 0 && self.blocks[idx - 1].end() > addr;
		let overlaps_next = self.starts.get(idx).is_some_and(|next| *next < end.max(addr + 1));
		if addr == 0 || overlaps_prev || overlaps_next {
			return Err(DnaError::HeapOverlap { addr });
		}

		self.starts.insert(idx, addr);
		self.blocks.insert(idx, HeapBlock { addr, sdna_nr, count, bytes });
		self.next_free = self.next_free.max((end + ALIGN).next_multiple_of(ALIGN));
		Ok(())
	}

	/// Number of allocations.
	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	/// Whether nothing has been allocated.
	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	/// Allocations in address order.
	pub fn blocks(&self) -> &[HeapBlock] {
		&self.blocks
	}

	/// Block containing `addr` and the offset of `addr` inside it.
	pub fn block_at(&self, addr: u64) -> Option<(&HeapBlock, usize)> {
		let idx = self.locate(addr)?;
		let block = &self.blocks[idx];
		Some((block, (addr - block.addr) as usize))
	}

	fn locate(&self, addr: u64) -> Option<usize> {
		if addr == 0 {
			return None;
		}
		let idx = self.starts.partition_point(|start| *start <= addr).checked_sub(1)?;
		(addr < self.blocks[idx].end()).then_some(idx)
	}

	/// `len` bytes starting at `addr`, if they lie inside one block.
	pub fn bytes(&self, addr: u64, len: usize) -> Option<&[u8]> {
		let (block, offset) = self.block_at(addr)?;
		block.bytes.get(offset..offset.checked_add(len)?)
	}

	/// Mutable view of `len` bytes starting at `addr`.
	pub fn bytes_mut(&mut self, addr: u64, len: usize) -> Option<&mut [u8]> {
		let idx = self.locate(addr)?;
		let block = &mut self.blocks[idx];
		let offset = (addr - block.addr) as usize;
		block.bytes.get_mut(offset..offset.checked_add(len)?)
	}

	/// Copy `data` to `addr`; `false` when the range is not mapped.
	pub fn write(&mut self, addr: u64, data: &[u8]) -> bool {
		match self.bytes_mut(addr, data.len()) {
			Some(dst) => {
				dst.copy_from_slice(data);
				true
			}
			None => false,
		}
	}

	/// Read the pointer stored at `addr`.
	pub fn read_ptr(&self, addr: u64) -> Option<u64> {
		let raw = self.bytes(addr, Self::POINTER_SIZE)?;
		Some(u64::from_le_bytes(raw.try_into().ok()?))
	}

	/// Store a pointer at `addr`.
	pub fn write_ptr(&mut self, addr: u64, value: u64) -> bool {
		self.write(addr, &value.to_le_bytes())
	}

	/// Zero-terminated string starting at `addr`, bounded by the containing block.
	pub fn read_cstr(&self, addr: u64, max_len: Option<usize>) -> Option<String> {
		let (block, offset) = self.block_at(addr)?;
		let rest = &block.bytes[offset..];
		let rest = &rest[..max_len.map_or(rest.len(), |max| max.min(rest.len()))];
		let len = rest.iter().position(|byte| *byte == 0).unwrap_or(rest.len());
		Some(String::from_utf8_lossy(&rest[..len]).into_owned())
	}

	/// Allocate a zero-terminated copy of `text`.
	pub fn alloc_cstr(&mut self, text: &str) -> u64 {
		let addr = self.alloc(text.len() + 1);
		self.write(addr, text.as_bytes());
		addr
	}

	/// Ad hoc value stored for `(addr, key)`.
	pub fn custom(&self, addr: u64, key: &str) -> Option<&serde_json::Value> {
		self.custom.get(&(addr, Box::from(key)))
	}

	/// Store an ad hoc value; `false` when `addr` is not mapped.
	pub fn set_custom(&mut self, addr: u64, key: &str, value: serde_json::Value) -> bool {
		if self.locate(addr).is_none() {
			return false;
		}
		self.custom.insert((addr, key.into()), value);
		true
	}

	/// Drop every ad hoc value stored under `key`, returning how many were removed.
	pub fn remove_custom_key(&mut self, key: &str) -> usize {
		let before = self.custom.len();
		self.custom.retain(|(_, stored), _| &**stored != key);
		before - self.custom.len()
	}
}

#[cfg(test)]
mod tests;
