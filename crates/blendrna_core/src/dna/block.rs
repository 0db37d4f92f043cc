use crate::dna::bytes::Cursor;
use crate::dna::{DnaError, Result, SourceHeader};

/// Parsed block header.
#[derive(Debug, Clone, Copy)]
pub struct BlockHeader {
	/// Four-byte block code such as `DNA1` or `OB\0\0`.
	pub code: [u8; 4],
	/// Layout struct index describing the payload.
	pub sdna_nr: u32,
	/// Address the payload had when the file was written.
	pub old: u64,
	/// Payload length in bytes.
	pub len: u64,
	/// Number of struct elements in the payload.
	pub nr: u64,
}

impl BlockHeader {
	fn parse(cursor: &mut Cursor<'_>, header: &SourceHeader) -> Result<Self> {
		let order = header.endianness;
		let code = cursor.code4()?;
		if header.is_legacy() {
			let len = non_negative("len", i64::from(cursor.i32(order)?))?;
			let old = cursor.ptr(header.pointer_size, order)?;
			let sdna_nr = cursor.u32(order)?;
			let nr = non_negative("nr", i64::from(cursor.i32(order)?))?;
			return Ok(Self { code, sdna_nr, old, len, nr });
		}

		let sdna_nr = cursor.u32(order)?;
		let old = cursor.u64(order)?;
		let len = non_negative("len", cursor.i64(order)?)?;
		let nr = non_negative("nr", cursor.i64(order)?)?;
		Ok(Self { code, sdna_nr, old, len, nr })
	}

	/// Whether this is the terminating `ENDB` record.
	pub fn is_end(&self) -> bool {
		self.code == *b"ENDB"
	}
}

fn non_negative(field: &'static str, value: i64) -> Result<u64> {
	u64::try_from(value).map_err(|_| DnaError::NegativeBlockField { field, value })
}

/// One block record borrowed from the decoded file bytes.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
	/// Parsed header.
	pub head: BlockHeader,
	/// Payload bytes.
	pub payload: &'a [u8],
	/// File offset of the header.
	pub file_offset: usize,
}

/// Iterator over consecutive block records; stops after `ENDB` or the first error.
pub struct BlockIter<'a> {
	cursor: Cursor<'a>,
	base: usize,
	header: SourceHeader,
	done: bool,
}

impl<'a> BlockIter<'a> {
	/// Start iterating at `offset`.
	pub fn new(bytes: &'a [u8], offset: usize, header: SourceHeader) -> Self {
		Self {
			cursor: Cursor::new(bytes.get(offset..).unwrap_or_default()),
			base: offset,
			header,
			done: false,
		}
	}

	fn read_block(&mut self) -> Result<Block<'a>> {
		let file_offset = self.base + self.cursor.pos();
		let head = BlockHeader::parse(&mut self.cursor, &self.header)?;
		let rem = self.cursor.remaining();
		let len = usize::try_from(head.len)
			.ok()
			.filter(|len| *len <= rem)
			.ok_or(DnaError::BlockLenOutOfRange { at: file_offset, len: head.len, rem })?;
		let payload = self.cursor.take(len)?;
		Ok(Block { head, payload, file_offset })
	}
}

impl<'a> Iterator for BlockIter<'a> {
	type Item = Result<Block<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.cursor.remaining() == 0 {
			self.done = true;
			return None;
		}

		let block = self.read_block();
		self.done = match &block {
			Ok(block) => block.head.is_end(),
			Err(_) => true,
		};
		Some(block)
	}
}
