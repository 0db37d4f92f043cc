use crate::dna::{DnaError, Result};

/// Byte order marker stored in blend headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// `v` marker.
	Little,
	/// `V` marker.
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}

	fn from_marker(byte: u8) -> Option<Self> {
		match byte {
			b'v' => Some(Self::Little),
			b'V' => Some(Self::Big),
			_ => None,
		}
	}
}

/// File header of a `.blend` layout source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceHeader {
	/// Header length in bytes; blocks start right after it.
	pub header_size: usize,
	/// `0` for legacy `BLENDER-v302` headers, `1` for `BLENDER17-01v0500` headers.
	pub format_version: u16,
	/// Blender version as decimal digits.
	pub version: u16,
	/// Pointer width in bytes.
	pub pointer_size: usize,
	/// Byte order of every multi-byte value in the file.
	pub endianness: Endianness,
}

impl SourceHeader {
	/// Legacy header length.
	pub const LEGACY_SIZE: usize = 12;
	/// Modern header length.
	pub const V1_SIZE: usize = 17;

	/// Parse the header at the start of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		if !bytes.starts_with(b"BLENDER") {
			return Err(DnaError::InvalidHeader);
		}
		match bytes.get(7) {
			Some(byte) if byte.is_ascii_digit() => Self::parse_v1(bytes),
			Some(_) => Self::parse_legacy(bytes),
			None => Err(DnaError::InvalidHeader),
		}
	}

	/// Whether block headers use the legacy pointer-sized layout.
	pub fn is_legacy(&self) -> bool {
		self.format_version == 0
	}

	fn parse_v1(bytes: &[u8]) -> Result<Self> {
		let raw = bytes.get(..Self::V1_SIZE).ok_or(DnaError::UnexpectedEof {
			at: 0,
			need: Self::V1_SIZE,
			rem: bytes.len(),
		})?;
		let header_size = digits(&raw[7..9]).ok_or(DnaError::InvalidHeader)? as usize;
		if header_size != Self::V1_SIZE {
			return Err(DnaError::UnsupportedPointerSize { size: header_size });
		}
		if raw[9] != b'-' {
			return Err(DnaError::InvalidHeader);
		}
		let format_version = digits(&raw[10..12]).ok_or(DnaError::InvalidHeader)?;
		if format_version != 1 {
			return Err(DnaError::UnsupportedFormatVersion { version: format_version });
		}

		Ok(Self {
			header_size,
			format_version,
			version: digits(&raw[13..17]).ok_or(DnaError::InvalidHeader)?,
			pointer_size: 8,
			endianness: Endianness::from_marker(raw[12]).ok_or(DnaError::InvalidHeader)?,
		})
	}

	fn parse_legacy(bytes: &[u8]) -> Result<Self> {
		let raw = bytes.get(..Self::LEGACY_SIZE).ok_or(DnaError::InvalidHeader)?;
		let pointer_size = match raw[7] {
			b'_' => 4,
			b'-' => 8,
			_ => return Err(DnaError::InvalidHeader),
		};

		Ok(Self {
			header_size: Self::LEGACY_SIZE,
			format_version: 0,
			version: digits(&raw[9..12]).ok_or(DnaError::InvalidHeader)?,
			pointer_size,
			endianness: Endianness::from_marker(raw[8]).ok_or(DnaError::InvalidHeader)?,
		})
	}
}

fn digits(bytes: &[u8]) -> Option<u16> {
	if bytes.is_empty() {
		return None;
	}
	bytes.iter().try_fold(0_u16, |acc, byte| {
		byte.is_ascii_digit().then(|| acc * 10 + u16::from(byte - b'0'))
	})
}

#[cfg(test)]
mod tests {
	use crate::dna::{DnaError, Endianness, SourceHeader};

	#[test]
	fn parses_v1_header() {
		let header = SourceHeader::parse(b"BLENDER17-01v0500").expect("header parses");
		assert_eq!(header.header_size, 17);
		assert_eq!(header.version, 500);
		assert_eq!(header.pointer_size, 8);
		assert_eq!(header.endianness, Endianness::Little);
		assert!(!header.is_legacy());
	}

	#[test]
	fn rejects_unknown_v1_header_size() {
		let err = SourceHeader::parse(b"BLENDER18-01v0500X").expect_err("size 18 is rejected");
		assert!(matches!(err, DnaError::UnsupportedPointerSize { size: 18 }));
	}

	#[test]
	fn parses_legacy_headers() {
		let little = SourceHeader::parse(b"BLENDER-v302").expect("legacy header parses");
		assert!(little.is_legacy());
		assert_eq!(little.pointer_size, 8);
		assert_eq!(little.version, 302);

		let big = SourceHeader::parse(b"BLENDER_V248").expect("big-endian header parses");
		assert_eq!(big.pointer_size, 4);
		assert_eq!(big.endianness, Endianness::Big);
	}

	#[test]
	fn rejects_foreign_magic() {
		assert!(matches!(SourceHeader::parse(b"NOTBLEND-v302"), Err(DnaError::InvalidHeader)));
	}
}
