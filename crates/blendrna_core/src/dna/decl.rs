/// Member declarator split into identifier, indirection, and array extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declarator<'a> {
	/// Bare member identifier.
	pub ident: &'a str,
	/// Number of `*` markers.
	pub pointer_depth: u8,
	/// Product of all `[N]` extents, `None` for non-array members.
	pub array_len: Option<usize>,
	/// `(*name)(...)` style declarator.
	pub is_function_pointer: bool,
}

impl<'a> Declarator<'a> {
	/// Parse declarator text such as `*next`, `name[64]`, `mat[4][4]` or `(*free)()`.
	pub fn parse(raw: &'a str) -> Self {
		let text = raw.trim();
		if let Some(inner) = text.strip_prefix('(').and_then(|rest| rest.split(')').next()) {
			let stars = inner.bytes().take_while(|byte| *byte == b'*').count();
			return Self {
				ident: inner[stars..].trim(),
				pointer_depth: stars.max(1) as u8,
				array_len: None,
				is_function_pointer: true,
			};
		}

		let stars = text.bytes().take_while(|byte| *byte == b'*').count();
		let rest = &text[stars..];
		let (ident, dims) = rest.split_at(rest.find('[').unwrap_or(rest.len()));
		let array_len = (!dims.is_empty()).then(|| {
			dims.split('[')
				.filter_map(|part| part.split(']').next())
				.filter(|part| !part.is_empty())
				.map(|part| part.trim().parse::<usize>().unwrap_or(1))
				.product()
		});

		Self {
			ident: ident.trim(),
			pointer_depth: stars as u8,
			array_len,
			is_function_pointer: false,
		}
	}

	/// Whether the member stores an address rather than an inline value.
	pub fn is_pointer(&self) -> bool {
		self.pointer_depth > 0 || self.is_function_pointer
	}

	/// Element count used for size computation.
	pub fn element_count(&self) -> usize {
		self.array_len.unwrap_or(1)
	}
}
