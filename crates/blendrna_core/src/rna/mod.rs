mod access;
mod accessor;
mod arena;
mod binding;
mod call;
mod define;
mod error;
mod flags;
mod function;
mod generate;
mod ident;
mod iter;
mod manifest;
mod meta;
mod raw;
mod refine;
mod registry;
mod runtime;
mod types;
mod value;
mod walk;

/// Accessor slots and the views handed to them.
pub use accessor::{Access, AccessMut, Accessors, BeginFn, EndFn, GetFn, ItemFn, IterState, LengthFn, NextFn, SetFn, accessor_name};
/// Layout member bindings.
pub use binding::{LengthSource, PropertyBinding, field_address};
/// Function invocation.
pub use call::{CallContext, CallError, CallFn, CallFrame, PARAM_ALIGN, ParameterList, Report, ReportLevel, ReportList};
/// Error and result aliases.
pub use error::{DefinitionError, Result, RnaError};
/// Descriptor flag sets.
pub use flags::{FuncFlag, ParamFlag, PropFlag, PropInternal, StructFlag};
/// Accessor generation.
pub use generate::{AccessorPlan, GenerateOptions, GenerationReport, Template};
/// Identifier rules.
pub use ident::{IdentKind, IdentifierIssue, MAX_ARRAY_LENGTH, RESERVED_KEYWORDS, RESERVED_PROPERTY_WORDS, sanitize_identifier, validate_identifier};
/// Collection iteration.
pub use iter::{CollectionItems, CollectionIter};
/// Declarative schemas and registry summaries.
pub use manifest::{
	BindManifest, FunctionManifest, FunctionSummary, PropertyManifest, PropertySummary, RefineManifest, SchemaManifest, SchemaSummary, StructManifest,
	StructSummary, UiRangeManifest,
};
/// Direct memory access annotations.
pub use raw::RawAccess;
/// Dynamic type resolution.
pub use refine::{Refine, RefineFn};
/// Descriptor storage.
pub use registry::{MetaStructs, SchemaRegistry};
/// Descriptors and handles.
pub use types::{
	BooleanInfo, CollectionInfo, Container, EditableFn, EnumInfo, EnumItem, FloatInfo, FunctionDef, FunctionId, Hook, IntInfo, PathFn, PointerInfo, PollFn, PropertyDef,
	PropertyId, PropertyKind, PropertySubtype, PropertyType, RegisterFn, StringInfo, StructDef, StructId, StructRef, TypeFn, UnregisterFn, UpdateFn,
};
/// Instance references and values.
pub use value::{RnaPointer, SetOutcome, Target, Value};
/// Reference graph traversal.
pub use walk::{WalkEdge, WalkOptions, WalkResult, WalkStop};

pub(crate) use generate::default_value;
pub(crate) use raw::raw_annotation;
