mod block;
mod builder;
mod bytes;
mod compression;
mod decl;
mod error;
mod header;
mod heap;
mod layout;
mod primitive;
mod resolve;
mod source;

/// Block records and iteration.
pub use block::{Block, BlockHeader, BlockIter};
/// Programmatic and JSON layout construction.
pub use builder::{LayoutBuilder, LayoutSpec, LayoutSpecMember, LayoutSpecStruct};
/// Compression detected on layout sources.
pub use compression::Compression;
/// Member declarator parsing.
pub use decl::Declarator;
/// Error and result aliases.
pub use error::{DnaError, Result};
/// File header representation.
pub use header::{Endianness, SourceHeader};
/// Instance memory.
pub use heap::{Heap, HeapBlock};
/// Layout tables.
pub use layout::{LayoutMember, LayoutStruct, LayoutTable, PlacedMember};
/// Primitive storage types.
pub use primitive::Primitive;
/// Member path resolution.
pub use resolve::{FieldBinding, resolve_binding};
/// `.blend` layout sources.
pub use source::{BlendSource, encode_blend};
