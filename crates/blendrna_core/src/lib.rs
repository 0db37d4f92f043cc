//! Schema-driven reflection and accessor generation over Blender struct layouts.
//!
//! [`dna`] describes how native structs are laid out in memory; [`rna`] declares a typed
//! schema on top of those layouts and builds accessors that read and write instances.

/// Struct-layout tables, `.blend` layout loading, and instance memory.
pub mod dna;
/// Schema registry, accessor generation, runtime introspection, and callable functions.
pub mod rna;
