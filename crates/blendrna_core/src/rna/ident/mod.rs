use std::fmt;

/// Largest accepted array length for array properties.
pub const MAX_ARRAY_LENGTH: usize = 64;

/// Words rejected as identifiers of any kind.
pub const RESERVED_KEYWORDS: &[&str] = &[
	"and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif", "else", "except", "finally", "for", "from",
	"global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Words additionally rejected for property identifiers; they collide with mapping methods.
pub const RESERVED_PROPERTY_WORDS: &[&str] = &["keys", "values", "items", "get"];

/// What an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
	/// Struct identifier; mixed case allowed.
	Struct,
	/// Property or parameter identifier; lowercase only.
	Property,
	/// Function identifier.
	Function,
	/// Enum item identifier; only spaces are rejected.
	EnumItem,
}

impl IdentKind {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Struct => "struct",
			Self::Property => "property",
			Self::Function => "function",
			Self::EnumItem => "enum item",
		}
	}
}

impl fmt::Display for IdentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Why an identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierIssue {
	/// Identifier is empty.
	Empty,
	/// First character is not alphabetic.
	LeadingNonAlpha,
	/// A character outside `[A-Za-z0-9_]`.
	InvalidChar(char),
	/// Uppercase character in a property identifier.
	Uppercase,
	/// Reserved word.
	Reserved,
	/// Enum item identifier contains a space.
	Space,
}

impl fmt::Display for IdentifierIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("identifier is empty"),
			Self::LeadingNonAlpha => f.write_str("first character must be alphabetic"),
			Self::InvalidChar(ch) => write!(f, "character {ch:?} is not alphanumeric or '_'"),
			Self::Uppercase => f.write_str("property identifiers must be lowercase"),
			Self::Reserved => f.write_str("identifier is a reserved word"),
			Self::Space => f.write_str("spaces are not allowed"),
		}
	}
}

/// Check `identifier` against the rules for `kind`.
pub fn validate_identifier(identifier: &str, kind: IdentKind) -> Result<(), IdentifierIssue> {
	if kind == IdentKind::EnumItem {
		return if identifier.contains(' ') { Err(IdentifierIssue::Space) } else { Ok(()) };
	}

	match identifier.chars().next() {
		None => return Err(IdentifierIssue::Empty),
		Some(first) if !first.is_ascii_alphabetic() => return Err(IdentifierIssue::LeadingNonAlpha),
		Some(_) => {}
	}
	if let Some(bad) = identifier.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_')) {
		return Err(IdentifierIssue::InvalidChar(bad));
	}
	if kind == IdentKind::Property && identifier.chars().any(|ch| ch.is_ascii_uppercase()) {
		return Err(IdentifierIssue::Uppercase);
	}
	if RESERVED_KEYWORDS.contains(&identifier) || (kind == IdentKind::Property && RESERVED_PROPERTY_WORDS.contains(&identifier)) {
		return Err(IdentifierIssue::Reserved);
	}
	Ok(())
}

/// Turn arbitrary text into an identifier that passes [`validate_identifier`] for `kind`.
///
/// Invalid characters become `_`, text not starting with a letter gains an `x` prefix, and
/// reserved words gain a trailing `_`.
pub fn sanitize_identifier(text: &str, kind: IdentKind) -> String {
	let mut out: String = text
		.chars()
		.map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
		.map(|ch| if kind == IdentKind::Property { ch.to_ascii_lowercase() } else { ch })
		.collect();

	if !out.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
		out.insert(0, 'x');
	}
	if validate_identifier(&out, kind) == Err(IdentifierIssue::Reserved) {
		out.push('_');
	}
	out
}
