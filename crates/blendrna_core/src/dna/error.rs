use thiserror::Error;

/// Result alias for layout loading and memory operations.
pub type Result<T> = std::result::Result<T, DnaError>;

/// Failures while reading layout sources or populating instance memory.
#[derive(Debug, Error)]
pub enum DnaError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// File did not start with a known magic marker.
	#[error("unknown file magic: {magic:?}")]
	UnknownMagic {
		/// First four bytes seen.
		magic: [u8; 4],
	},
	/// Decompressed payload did not contain a blend header.
	#[error("zstd payload is not a blend file")]
	NotBlendAfterDecompress,
	/// Decompressed payload exceeded the configured ceiling.
	#[error("decompressed payload exceeds {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum accepted size in bytes.
		limit: usize,
	},
	/// Header prefix was malformed.
	#[error("invalid blend header")]
	InvalidHeader,
	/// Header declared a container version this crate cannot read.
	#[error("unsupported blend format version {version}")]
	UnsupportedFormatVersion {
		/// Declared format version.
		version: u16,
	},
	/// Pointer width is neither 4 nor 8 bytes.
	#[error("unsupported pointer size {size}")]
	UnsupportedPointerSize {
		/// Declared pointer width or header size.
		size: usize,
	},
	/// Read past the end of the available bytes.
	#[error("unexpected eof at {at}: need={need}, rem={rem}")]
	UnexpectedEof {
		/// Byte offset of the failed read.
		at: usize,
		/// Requested byte count.
		need: usize,
		/// Bytes remaining at that point.
		rem: usize,
	},
	/// A signed block header field was negative.
	#[error("negative block {field}: {value}")]
	NegativeBlockField {
		/// Header field name.
		field: &'static str,
		/// Value read from the file.
		value: i64,
	},
	/// Block payload extends past the end of the file.
	#[error("block at {at} declares {len} bytes, {rem} remain")]
	BlockLenOutOfRange {
		/// File offset of the block header.
		at: usize,
		/// Declared payload length.
		len: u64,
		/// Bytes remaining after the header.
		rem: usize,
	},
	/// No `DNA1` block was present.
	#[error("layout block DNA1 not found")]
	LayoutBlockMissing,
	/// SDNA section tag mismatch.
	#[error("bad SDNA tag at {at}: expected {expected:?}, got {got:?}")]
	BadTag {
		/// Tag required at this position.
		expected: [u8; 4],
		/// Tag actually read.
		got: [u8; 4],
		/// Byte offset inside the payload.
		at: usize,
	},
	/// Table index points past the end of its table.
	#[error("layout index out of range for {kind}: idx={idx}, max={max}")]
	IndexOutOfRange {
		/// Index category.
		kind: &'static str,
		/// Offending index.
		idx: u32,
		/// Largest valid index.
		max: u32,
	},
	/// Two struct declarations share one type.
	#[error("duplicate layout struct for type {type_name}")]
	DuplicateStruct {
		/// Type name declared twice.
		type_name: String,
	},
	/// A layout description named a type that has no size.
	#[error("unknown layout type {name}")]
	UnknownType {
		/// Type name that could not be sized.
		name: String,
	},
	/// Too many names or types for the 16-bit SDNA tables.
	#[error("layout table overflow: {kind} count {count}")]
	TableOverflow {
		/// Table that overflowed.
		kind: &'static str,
		/// Entry count.
		count: usize,
	},
	/// Named struct is not declared in the layout table.
	#[error("layout struct not found: {name}")]
	StructNotFound {
		/// Requested struct type name.
		name: String,
	},
	/// Member path did not resolve inside a struct.
	#[error("member path {path} not found in {struct_name}")]
	MemberPathNotFound {
		/// Struct the path starts from.
		struct_name: String,
		/// Requested path.
		path: String,
	},
	/// Address literal was neither decimal nor `0x` hex.
	#[error("invalid address literal: {value}")]
	InvalidAddress {
		/// Text as given.
		value: String,
	},
	/// JSON layout description failed to parse.
	#[error("layout json: {0}")]
	Json(#[from] serde_json::Error),
	/// Inserted memory block overlaps an existing one.
	#[error("heap block at 0x{addr:016x} overlaps existing memory")]
	HeapOverlap {
		/// Start address of the rejected block.
		addr: u64,
	},
	/// Inserted memory block would extend past the address space.
	#[error("heap block at 0x{addr:016x} extends past the address space")]
	HeapAddressOutOfRange {
		/// Start address of the rejected block.
		addr: u64,
	},
	/// Instance memory can only be imported from little-endian 64-bit files.
	#[error("instance import needs little-endian 8-byte pointers, got {endianness} with {pointer_size}-byte pointers")]
	UnsupportedInstanceLayout {
		/// Source byte order label.
		endianness: &'static str,
		/// Source pointer width.
		pointer_size: usize,
	},
}
