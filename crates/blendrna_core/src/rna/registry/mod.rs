use std::collections::HashMap;
use std::sync::Arc;

use crate::dna::LayoutTable;
use crate::rna::arena::{Arena, ArenaId, Key};
use crate::rna::{CallFn, Container, DefinitionError, FunctionDef, FunctionId, Hook, PropertyDef, PropertyId, StructDef, StructId};

/// Structs created at init that describe descriptors themselves.
#[derive(Debug, Clone, Copy)]
pub struct MetaStructs {
	/// `Struct`: a struct descriptor.
	pub struct_: StructId,
	/// `Property`: a property descriptor.
	pub property: StructId,
	/// `Function`: a function descriptor.
	pub function: StructId,
	/// `EnumPropertyItem`: one enum item.
	pub enum_item: StructId,
}

/// Owner of every struct, property, and function descriptor.
///
/// Registration mutates the registry and records failures instead of stopping; once
/// [`SchemaRegistry::generate`] succeeds the registry serves the runtime introspection API.
pub struct SchemaRegistry {
	pub(crate) structs: Arena<StructId, StructDef>,
	pub(crate) properties: Arena<PropertyId, PropertyDef>,
	pub(crate) functions: Arena<FunctionId, FunctionDef>,
	pub(crate) struct_order: Vec<StructId>,
	pub(crate) struct_by_name: HashMap<Box<str>, StructId>,
	pub(crate) call_targets: HashMap<Box<str>, Hook<CallFn>>,
	pub(crate) layout: Option<Arc<LayoutTable>>,
	pub(crate) errors: Vec<DefinitionError>,
	pub(crate) generated: bool,
	pub(crate) meta: MetaStructs,
}

impl Default for SchemaRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl SchemaRegistry {
	/// Registry without a layout table; properties can only use hand-written accessors.
	pub fn new() -> Self {
		Self::build(None)
	}

	/// Registry binding properties into `layout`.
	pub fn with_layout(layout: LayoutTable) -> Self {
		Self::build(Some(Arc::new(layout)))
	}

	fn build(layout: Option<Arc<LayoutTable>>) -> Self {
		let placeholder = StructId::from_key(Key { index: u32::MAX, generation: 0 });
		let mut registry = Self {
			structs: Arena::default(),
			properties: Arena::default(),
			functions: Arena::default(),
			struct_order: Vec::new(),
			struct_by_name: HashMap::new(),
			call_targets: HashMap::new(),
			layout,
			errors: Vec::new(),
			generated: false,
			meta: MetaStructs {
				struct_: placeholder,
				property: placeholder,
				function: placeholder,
				enum_item: placeholder,
			},
		};
		registry.meta = crate::rna::meta::define_meta_structs(&mut registry);
		registry
	}

	/// Attached layout table.
	pub fn layout(&self) -> Option<&LayoutTable> {
		self.layout.as_deref()
	}

	/// Meta struct handles.
	pub fn meta(&self) -> &MetaStructs {
		&self.meta
	}

	/// Struct descriptor.
	pub fn struct_def(&self, id: StructId) -> Option<&StructDef> {
		self.structs.get(id)
	}

	/// Property descriptor.
	pub fn property(&self, id: PropertyId) -> Option<&PropertyDef> {
		self.properties.get(id)
	}

	/// Function descriptor.
	pub fn function(&self, id: FunctionId) -> Option<&FunctionDef> {
		self.functions.get(id)
	}

	/// Struct by identifier.
	pub fn find_struct(&self, identifier: &str) -> Option<StructId> {
		self.struct_by_name.get(identifier).copied()
	}

	/// Structs in definition order.
	pub fn struct_ids(&self) -> impl Iterator<Item = StructId> + '_ {
		self.struct_order.iter().copied()
	}

	/// Structs ordered by identifier, for stable output.
	pub fn sorted_struct_ids(&self) -> Vec<StructId> {
		let mut ids: Vec<StructId> = self.struct_ids().collect();
		ids.sort_by(|a, b| self.struct_identifier(*a).cmp(self.struct_identifier(*b)));
		ids
	}

	/// Number of live descriptors as `(structs, properties, functions)`.
	pub fn counts(&self) -> (usize, usize, usize) {
		(self.structs.len(), self.properties.len(), self.functions.len())
	}

	/// Struct identifier, or `""` for stale handles.
	pub fn struct_identifier(&self, id: StructId) -> &str {
		self.structs.get(id).map_or("", |def| &def.identifier)
	}

	/// `base`, its base, and so on, starting with `id` itself.
	pub fn base_chain(&self, id: StructId) -> impl Iterator<Item = StructId> + '_ {
		let limit = self.struct_order.len() + 1;
		std::iter::successors(Some(id), |current| self.structs.get(*current).and_then(|def| def.base))
			.take(limit)
			.filter(|id| self.structs.get(*id).is_some())
	}

	/// Whether `id` is `ancestor` or derives from it.
	pub fn is_derived_from(&self, id: StructId, ancestor: StructId) -> bool {
		self.base_chain(id).any(|item| item == ancestor)
	}

	/// Recorded definition errors, in order.
	pub fn errors(&self) -> &[DefinitionError] {
		&self.errors
	}

	/// Sticky error flag.
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Whether accessors have been generated.
	pub fn is_generated(&self) -> bool {
		self.generated
	}

	/// Record a definition error; registration continues.
	pub(crate) fn report(&mut self, error: DefinitionError) {
		tracing::error!(%error, "definition error");
		self.errors.push(error);
	}

	/// `Owner.identifier` label used in diagnostics.
	pub fn property_label(&self, id: PropertyId) -> String {
		let Some(def) = self.properties.get(id) else {
			return "<stale>".to_owned();
		};
		let owner = match def.owner {
			Container::Struct(owner) => self.struct_identifier(owner).to_owned(),
			Container::Function(func) => self.function_label(func),
		};
		format!("{owner}.{}", def.identifier)
	}

	/// `Owner.identifier` label for a function.
	pub fn function_label(&self, id: FunctionId) -> String {
		match self.functions.get(id) {
			Some(def) => format!("{}.{}", self.struct_identifier(def.owner), def.identifier),
			None => "<stale>".to_owned(),
		}
	}

	/// Property list of a container.
	pub(crate) fn container_properties(&self, container: Container) -> &[PropertyId] {
		match container {
			Container::Struct(id) => self.structs.get(id).map_or(&[], |def| def.properties.as_slice()),
			Container::Function(id) => self.functions.get(id).map_or(&[], |def| def.parameters.as_slice()),
		}
	}

	/// Own property of a container by identifier.
	pub(crate) fn own_property(&self, container: Container, identifier: &str) -> Option<PropertyId> {
		self.container_properties(container)
			.iter()
			.copied()
			.find(|id| self.properties.get(*id).is_some_and(|def| &*def.identifier == identifier))
	}
}
