use crate::rna::{Container, DefinitionError, FunctionId, PropFlag, PropInternal, PropertyId, PropertySubtype, PropertyType, SchemaRegistry, StructFlag, StructId};

impl SchemaRegistry {
	/// Define a struct at run time.
	///
	/// Runtime structs are reference counted starting at one; see
	/// [`SchemaRegistry::release_runtime_struct`].
	pub fn define_runtime_struct(&mut self, identifier: &str, base: Option<StructId>) -> StructId {
		let id = self.define_struct_from(identifier, base);
		let generated = self.generated;
		let builtins = match self.structs.get_mut(id) {
			Some(def) => {
				def.flag |= StructFlag::RUNTIME;
				if generated {
					def.flag |= StructFlag::GENERATED;
				}
				def.properties.clone()
			}
			None => Vec::new(),
		};
		for prop in builtins {
			if let Some(def) = self.properties.get_mut(prop) {
				def.internal |= PropInternal::RUNTIME;
				def.accessors = def.overrides.clone();
			}
		}
		tracing::debug!(identifier, "runtime struct defined");
		id
	}

	/// Add an ad hoc property whose values live in the heap's per-instance side table.
	///
	/// Accessors are in effect immediately and follow later range, default, and flag edits.
	pub fn define_runtime_property(&mut self, owner: StructId, identifier: &str, ty: PropertyType) -> Option<PropertyId> {
		let Some(def) = self.structs.get(owner) else {
			self.report(DefinitionError::StaleHandle { kind: "struct" });
			return None;
		};
		if def.flag.contains(StructFlag::NO_IDPROPERTIES) {
			let struct_name = def.identifier.to_string();
			self.report(DefinitionError::NoIdProperties { struct_name });
			return None;
		}
		let id = self.define_property(owner, identifier, ty, PropertySubtype::None);
		if !self.properties.contains(id) {
			return None;
		}
		if let Some(def) = self.properties.get_mut(id) {
			def.binding = None;
			def.flag |= PropFlag::IDPROPERTY;
			def.internal |= PropInternal::RUNTIME;
		}
		self.refresh_runtime_accessors(id);
		tracing::debug!(property = %self.property_label(id), "runtime property defined");
		Some(id)
	}

	/// Rebuild the accessors of a runtime property after an edit.
	pub(crate) fn refresh_runtime_accessors(&mut self, id: PropertyId) {
		let Some(def) = self.properties.get(id).filter(|def| def.internal.contains(PropInternal::RUNTIME)) else {
			return;
		};
		let (_, generated) = self.build_accessors(def);
		let accessors = def.overrides.or(&generated);
		if let Some(def) = self.properties.get_mut(id) {
			def.accessors = accessors;
		}
	}

	/// Take another reference to a runtime struct.
	pub fn retain_runtime_struct(&mut self, id: StructId) -> bool {
		match self.structs.get_mut(id).filter(|def| def.flag.contains(StructFlag::RUNTIME)) {
			Some(def) => {
				def.refcount += 1;
				true
			}
			None => false,
		}
	}

	/// Drop a reference to a runtime struct; the last one frees it with its properties and functions.
	///
	/// Returns whether the struct was freed. Handles to it resolve to `None` afterwards.
	pub fn release_runtime_struct(&mut self, id: StructId) -> bool {
		let Some(def) = self.structs.get_mut(id) else {
			return false;
		};
		if !def.flag.contains(StructFlag::RUNTIME) {
			let identifier = def.identifier.to_string();
			self.report(DefinitionError::NotRuntime { identifier });
			return false;
		}
		def.refcount = def.refcount.saturating_sub(1);
		if def.refcount > 0 {
			return false;
		}
		self.free_struct(id);
		true
	}

	fn free_struct(&mut self, id: StructId) {
		let Some(def) = self.structs.remove(id) else {
			return;
		};
		for prop in def.properties {
			self.properties.remove(prop);
		}
		for func in def.functions {
			self.free_function(func);
		}
		self.struct_order.retain(|item| *item != id);
		if self.struct_by_name.get(&def.identifier) == Some(&id) {
			self.struct_by_name.remove(&def.identifier);
		}
		tracing::debug!(identifier = %def.identifier, "runtime struct freed");
	}

	fn free_function(&mut self, id: FunctionId) {
		if let Some(def) = self.functions.remove(id) {
			for param in def.parameters {
				self.properties.remove(param);
			}
		}
	}

	/// Take another reference to a runtime property.
	pub fn retain_runtime_property(&mut self, id: PropertyId) -> bool {
		match self.properties.get_mut(id).filter(|def| def.internal.contains(PropInternal::RUNTIME)) {
			Some(def) => {
				def.refcount += 1;
				true
			}
			None => false,
		}
	}

	/// Drop a reference to a runtime property; the last one unlinks and frees it.
	///
	/// Values already stored on instances stay in the heap until
	/// [`crate::dna::Heap::remove_custom_key`] clears them.
	pub fn release_runtime_property(&mut self, id: PropertyId) -> bool {
		let Some(def) = self.properties.get_mut(id) else {
			return false;
		};
		if !def.internal.contains(PropInternal::RUNTIME) {
			let identifier = def.identifier.to_string();
			self.report(DefinitionError::NotRuntime { identifier });
			return false;
		}
		def.refcount = def.refcount.saturating_sub(1);
		if def.refcount > 0 {
			return false;
		}
		let Some(def) = self.properties.remove(id) else {
			return false;
		};
		match def.owner {
			Container::Struct(owner) => {
				if let Some(owner) = self.structs.get_mut(owner) {
					owner.properties.retain(|item| *item != id);
					if owner.name_property == Some(id) {
						owner.name_property = None;
					}
					if owner.iterator_property == Some(id) {
						owner.iterator_property = None;
					}
				}
			}
			Container::Function(owner) => {
				if let Some(owner) = self.functions.get_mut(owner) {
					owner.parameters.retain(|item| *item != id);
					if owner.return_param == Some(id) {
						owner.return_param = None;
					}
				}
			}
		}
		tracing::debug!(identifier = %def.identifier, "runtime property freed");
		true
	}

	/// Create a runtime subtype of `base` through its register callback.
	///
	/// Without a callback the subtype is a plain runtime struct deriving from `base`. An
	/// existing runtime struct with the same identifier is unregistered first; a registered
	/// struct with that identifier is a definition error.
	pub fn register_struct(&mut self, base: StructId, identifier: &str) -> Option<StructId> {
		let Some(base_def) = self.structs.get(base) else {
			self.report(DefinitionError::StaleHandle { kind: "struct" });
			return None;
		};
		let register = base_def.register.clone();
		if let Some(existing) = self.find_struct(identifier) {
			let runtime = self.structs.get(existing).is_some_and(|def| def.flag.contains(StructFlag::RUNTIME));
			if !runtime {
				self.report(DefinitionError::DuplicateStruct {
					identifier: identifier.to_owned(),
				});
				return None;
			}
			tracing::debug!(identifier, "replacing runtime struct");
			if let Some(def) = self.structs.get_mut(existing) {
				def.refcount = 1;
			}
			self.unregister_struct(existing);
		}

		let id = match register {
			Some(register) => register(self, base, identifier)?,
			None => self.define_runtime_struct(identifier, Some(base)),
		};
		if let Some(def) = self.structs.get_mut(id) {
			def.flag |= StructFlag::RUNTIME;
		}
		Some(id)
	}

	/// Run the struct's unregister callback and drop one reference.
	pub fn unregister_struct(&mut self, id: StructId) -> bool {
		let Some(def) = self.structs.get(id).filter(|def| def.flag.contains(StructFlag::RUNTIME)) else {
			return false;
		};
		if let Some(unregister) = def.unregister.clone() {
			unregister(self, id);
		}
		self.release_runtime_struct(id)
	}
}

#[cfg(test)]
mod tests;
