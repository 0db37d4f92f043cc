use crate::dna::{DnaError, Endianness, Result};

/// Bounded forward reader over a byte slice.
pub(crate) struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	pub(crate) fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	pub(crate) fn pos(&self) -> usize {
		self.pos
	}

	pub(crate) fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
		let rem = self.remaining();
		if n > rem {
			return Err(DnaError::UnexpectedEof { at: self.pos, need: n, rem });
		}
		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut out = [0_u8; N];
		out.copy_from_slice(self.take(N)?);
		Ok(out)
	}

	pub(crate) fn code4(&mut self) -> Result<[u8; 4]> {
		self.array()
	}

	pub(crate) fn u16(&mut self, order: Endianness) -> Result<u16> {
		let raw = self.array()?;
		Ok(match order {
			Endianness::Little => u16::from_le_bytes(raw),
			Endianness::Big => u16::from_be_bytes(raw),
		})
	}

	pub(crate) fn u32(&mut self, order: Endianness) -> Result<u32> {
		let raw = self.array()?;
		Ok(match order {
			Endianness::Little => u32::from_le_bytes(raw),
			Endianness::Big => u32::from_be_bytes(raw),
		})
	}

	pub(crate) fn i32(&mut self, order: Endianness) -> Result<i32> {
		Ok(self.u32(order)? as i32)
	}

	pub(crate) fn u64(&mut self, order: Endianness) -> Result<u64> {
		let raw = self.array()?;
		Ok(match order {
			Endianness::Little => u64::from_le_bytes(raw),
			Endianness::Big => u64::from_be_bytes(raw),
		})
	}

	pub(crate) fn i64(&mut self, order: Endianness) -> Result<i64> {
		Ok(self.u64(order)? as i64)
	}

	/// Pointer-width unsigned value widened to `u64`.
	pub(crate) fn ptr(&mut self, pointer_size: usize, order: Endianness) -> Result<u64> {
		match pointer_size {
			4 => self.u32(order).map(u64::from),
			8 => self.u64(order),
			size => Err(DnaError::UnsupportedPointerSize { size }),
		}
	}

	pub(crate) fn align4(&mut self) -> Result<()> {
		let pad = (4 - self.pos % 4) % 4;
		self.take(pad).map(|_| ())
	}

	/// Zero-terminated string, decoded lossily.
	pub(crate) fn cstr(&mut self) -> Result<Box<str>> {
		let rest = &self.bytes[self.pos.min(self.bytes.len())..];
		let Some(len) = rest.iter().position(|byte| *byte == 0) else {
			return Err(DnaError::UnexpectedEof {
				at: self.pos,
				need: 1,
				rem: self.remaining(),
			});
		};
		let raw = self.take(len + 1)?;
		Ok(String::from_utf8_lossy(&raw[..len]).into())
	}
}
