use std::sync::Arc;

use crate::rna::{
	CallFn, CallFrame, Container, DefinitionError, FuncFlag, FunctionDef, FunctionId, Hook, IdentKind, ParamFlag, PropertyId, SchemaRegistry, StructId, Value,
	validate_identifier,
};

impl SchemaRegistry {
	/// Define a function on a struct, implemented by the call target registered as
	/// `call_target`. Duplicate identifiers on the same struct are rejected.
	pub fn define_function(&mut self, owner: StructId, identifier: &str, call_target: &str) -> Option<FunctionId> {
		if let Err(issue) = validate_identifier(identifier, IdentKind::Function) {
			self.report(DefinitionError::InvalidIdentifier {
				kind: IdentKind::Function,
				identifier: identifier.to_owned(),
				issue,
			});
		}
		let Some(def) = self.structs.get(owner) else {
			self.report(DefinitionError::StaleHandle { kind: "struct" });
			return None;
		};
		let duplicate = def
			.functions
			.iter()
			.any(|func| self.functions.get(*func).is_some_and(|func| &*func.identifier == identifier));
		if duplicate {
			let function = format!("{}.{identifier}", def.identifier);
			self.report(DefinitionError::DuplicateFunction { function });
			return None;
		}

		let id = self.functions.insert(FunctionDef {
			identifier: identifier.into(),
			description: "".into(),
			flag: FuncFlag::empty(),
			owner,
			parameters: Vec::new(),
			return_param: None,
			call_target: call_target.into(),
			call: None,
			refcount: 1,
		});
		if let Some(def) = self.structs.get_mut(owner) {
			def.functions.push(id);
		}
		Some(id)
	}

	/// Make `param` the function's return value. At most one; arrays cannot be returned.
	pub fn set_function_return(&mut self, func: FunctionId, param: PropertyId) {
		let function = self.function_label(func);
		let reason = match (self.functions.get(func), self.properties.get(param)) {
			(None, _) | (_, None) => Some("stale handle"),
			(Some(def), Some(_)) if !def.parameters.contains(&param) => Some("not a parameter of this function"),
			(Some(def), Some(_)) if def.return_param.is_some_and(|current| current != param) => Some("function already has a return parameter"),
			(Some(_), Some(prop)) if prop.is_array() => Some("array parameters cannot be returned"),
			_ => None,
		};
		if let Some(reason) = reason {
			return self.report(DefinitionError::InvalidReturn { function, reason });
		}
		if let Some(def) = self.functions.get_mut(func) {
			def.return_param = Some(param);
		}
		self.set_param_flag(param, ParamFlag::RETURN | ParamFlag::OUTPUT);
	}

	/// Mark `param` as written by the call target.
	pub fn set_function_output(&mut self, param: PropertyId) {
		self.set_param_flag(param, ParamFlag::OUTPUT);
	}

	/// Set function flags.
	pub fn set_function_flag(&mut self, func: FunctionId, flag: FuncFlag) {
		match self.functions.get_mut(func) {
			Some(def) => def.flag |= flag,
			None => self.report(DefinitionError::StaleHandle { kind: "function" }),
		}
	}

	/// Tooltip text.
	pub fn set_function_description(&mut self, func: FunctionId, description: &str) {
		match self.functions.get_mut(func) {
			Some(def) => def.description = description.into(),
			None => self.report(DefinitionError::StaleHandle { kind: "function" }),
		}
	}

	/// Register the implementation behind a call target name.
	pub fn register_call_target(&mut self, name: &str, f: impl Fn(&mut CallFrame<'_>) -> Option<Value> + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<CallFn>);
		for def in self.functions.iter_mut().map(|(_, def)| def).filter(|def| &*def.call_target == name) {
			def.call = Some(hook.clone());
		}
		self.call_targets.insert(name.into(), hook);
	}

	/// Function by identifier, searching the struct then its bases.
	pub fn find_function(&self, owner: StructId, identifier: &str) -> Option<FunctionId> {
		self.base_chain(owner).find_map(|id| {
			self.structs
				.get(id)?
				.functions
				.iter()
				.copied()
				.find(|func| self.functions.get(*func).is_some_and(|def| &*def.identifier == identifier))
		})
	}

	/// Parameter of a function by identifier.
	pub fn find_parameter(&self, func: FunctionId, identifier: &str) -> Option<PropertyId> {
		self.own_property(Container::Function(func), identifier)
	}
}
