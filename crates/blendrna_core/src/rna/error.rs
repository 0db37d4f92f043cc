use thiserror::Error;

use crate::dna::DnaError;
use crate::rna::{IdentKind, IdentifierIssue, PropertyType};

/// Result alias for whole-run registry operations.
pub type Result<T> = std::result::Result<T, RnaError>;

/// Whole-run failure.
#[derive(Debug, Error)]
pub enum RnaError {
	/// Registration recorded definition errors; generation refuses to finish.
	#[error("schema has {count} definition error(s)")]
	DefinitionErrors {
		/// Number of recorded errors.
		count: usize,
	},
	/// Layout table could not be loaded.
	#[error(transparent)]
	Layout(#[from] DnaError),
	/// Manifest JSON failed to parse.
	#[error("manifest: {0}")]
	Manifest(#[from] serde_json::Error),
	/// Manifest IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
}

/// One registration failure. Recorded on the registry; never aborts registration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
	/// Identifier failed validation.
	#[error("{kind} identifier {identifier:?}: {issue}")]
	InvalidIdentifier {
		/// What was being named.
		kind: IdentKind,
		/// Rejected identifier.
		identifier: String,
		/// Reason.
		issue: IdentifierIssue,
	},
	/// Struct identifier already registered.
	#[error("struct {identifier} is already defined")]
	DuplicateStruct {
		/// Identifier.
		identifier: String,
	},
	/// Property identifier already used in the same container.
	#[error("property {property} is already defined")]
	DuplicateProperty {
		/// `Owner.identifier`.
		property: String,
	},
	/// Function identifier already used on the struct.
	#[error("function {function} is already defined")]
	DuplicateFunction {
		/// `Owner.identifier`.
		function: String,
	},
	/// Referenced struct does not exist.
	#[error("{context}: struct {name} not found")]
	UnknownStruct {
		/// Where the reference was made.
		context: String,
		/// Missing struct identifier.
		name: String,
	},
	/// Handle no longer resolves.
	#[error("stale {kind} handle")]
	StaleHandle {
		/// Descriptor kind.
		kind: &'static str,
	},
	/// Binding requested while no layout table is attached.
	#[error("{context}: no layout table attached")]
	NoLayoutTable {
		/// Struct or property being bound.
		context: String,
	},
	/// Layout struct missing from the table.
	#[error("layout struct {struct_name} not found")]
	LayoutStructNotFound {
		/// Layout struct name.
		struct_name: String,
	},
	/// Member path did not resolve.
	#[error("{property}: member {struct_name}.{path} not found")]
	MemberNotFound {
		/// `Owner.identifier`.
		property: String,
		/// Layout struct searched.
		struct_name: String,
		/// Member path.
		path: String,
	},
	/// Member type cannot hold the property kind.
	#[error("{property}: member of type {type_name} cannot back a {kind} property")]
	IncompatibleMember {
		/// `Owner.identifier`.
		property: String,
		/// Member type name.
		type_name: String,
		/// Property kind.
		kind: PropertyType,
	},
	/// Operation applies to a different property kind.
	#[error("{property}: {operation} needs a {expected} property, got {got}")]
	KindMismatch {
		/// `Owner.identifier`.
		property: String,
		/// Rejected operation.
		operation: &'static str,
		/// Kind the operation applies to.
		expected: PropertyType,
		/// Actual kind.
		got: PropertyType,
	},
	/// Array length outside `1..=MAX_ARRAY_LENGTH`.
	#[error("{property}: array length {length} exceeds {max}")]
	ArrayTooLong {
		/// `Owner.identifier`.
		property: String,
		/// Requested length.
		length: usize,
		/// Maximum length.
		max: usize,
	},
	/// Kind cannot be an array.
	#[error("{property}: {kind} properties cannot be arrays")]
	ArrayNotAllowed {
		/// `Owner.identifier`.
		property: String,
		/// Property kind.
		kind: PropertyType,
	},
	/// Array default length differs from the array length.
	#[error("{property}: array default has {got} values, expected {expected}")]
	ArrayDefaultLength {
		/// `Owner.identifier`.
		property: String,
		/// Array length.
		expected: usize,
		/// Default length.
		got: usize,
	},
	/// Minimum above maximum.
	#[error("{property}: range minimum exceeds maximum")]
	RangeInverted {
		/// `Owner.identifier`.
		property: String,
	},
	/// Requested range does not overlap what the bound member can store.
	#[error("{property}: range lies outside what {type_name} can store")]
	RangeOutsideStorage {
		/// `Owner.identifier`.
		property: String,
		/// Type name of the bound member.
		type_name: String,
	},
	/// Enum item rejected.
	#[error("{property}: enum item {identifier:?}: {reason}")]
	InvalidEnumItem {
		/// `Owner.identifier`.
		property: String,
		/// Item identifier.
		identifier: String,
		/// Reason.
		reason: String,
	},
	/// Enum default absent from the items.
	#[error("{property}: default {value} is not an item value")]
	EnumDefaultMissing {
		/// `Owner.identifier`.
		property: String,
		/// Offending default.
		value: i32,
	},
	/// Name property is not a string.
	#[error("{property}: name property must be a string")]
	NamePropertyNotString {
		/// `Owner.identifier`.
		property: String,
	},
	/// Pointer or collection without a target struct.
	#[error("{property}: no struct type set")]
	MissingStructType {
		/// `Owner.identifier`.
		property: String,
	},
	/// Collection lacks part of the iteration protocol.
	#[error("{property}: collection has no {missing} accessor")]
	MissingCollectionAccessor {
		/// `Owner.identifier`.
		property: String,
		/// Missing operation.
		missing: &'static str,
	},
	/// Struct property with neither a layout binding nor a getter.
	#[error("{property}: no layout member and no getter")]
	Unbound {
		/// `Owner.identifier`.
		property: String,
	},
	/// Read-only property carries a setter override.
	#[error("{property}: read-only property has a setter")]
	ReadOnlySetter {
		/// `Owner.identifier`.
		property: String,
	},
	/// Discriminant member is not an integer.
	#[error("{struct_name}: refine discriminant {path} is not an integer member")]
	RefineDiscriminant {
		/// Struct identifier.
		struct_name: String,
		/// Member path.
		path: String,
	},
	/// Function call target not registered.
	#[error("{function}: call target {target} is not registered")]
	UnknownCallTarget {
		/// `Owner.identifier`.
		function: String,
		/// Missing target name.
		target: String,
	},
	/// Return parameter rejected.
	#[error("{function}: invalid return parameter: {reason}")]
	InvalidReturn {
		/// `Owner.identifier`.
		function: String,
		/// Reason.
		reason: &'static str,
	},
	/// Struct does not accept ad hoc properties.
	#[error("{struct_name}: struct does not accept runtime properties")]
	NoIdProperties {
		/// Struct identifier.
		struct_name: String,
	},
	/// Runtime operation on a descriptor defined at registration.
	#[error("{identifier}: not a runtime descriptor")]
	NotRuntime {
		/// Descriptor identifier.
		identifier: String,
	},
	/// Operation applies to struct properties only, or to parameters only.
	#[error("{property}: {operation} does not apply here")]
	WrongContainer {
		/// `Owner.identifier`.
		property: String,
		/// Rejected operation.
		operation: &'static str,
	},
}
