use serde::Serialize;

use crate::rna::{
	Accessors, Container, DefinitionError, PropFlag, PropInternal, PropertyBinding, PropertyDef, PropertyId, PropertyKind, PropertyType, RawAccess, Refine,
	RnaError, SchemaRegistry, StructFlag, StructId, StructRef, accessor_name, raw_annotation,
};

mod template;

pub use template::Template;
pub(crate) use template::{TemplateInput, build, default_value};

/// Accessor generation knobs.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
	/// Collections lacking begin, next, or get are definition errors rather than warnings.
	pub strict_collections: bool,
	/// Record raw access annotations for directly bound numeric properties.
	pub raw_access: bool,
}

impl Default for GenerateOptions {
	fn default() -> Self {
		Self {
			strict_collections: true,
			raw_access: true,
		}
	}
}

/// What the generator built for one property.
#[derive(Debug, Clone, Serialize)]
pub struct AccessorPlan {
	/// Owning struct identifier.
	pub struct_identifier: String,
	/// Property identifier.
	pub identifier: String,
	/// Property kind.
	#[serde(rename = "type")]
	pub ty: PropertyType,
	/// Template used; `None` when every accessor is hand-written.
	pub template: Option<Template>,
	/// Hand-written accessors are in effect.
	pub manual: bool,
	/// Names of the accessors in effect.
	pub accessors: Vec<String>,
	/// Member backing the property.
	pub binding: Option<PropertyBinding>,
	/// Raw access annotation.
	pub raw: Option<RawAccess>,
}

/// Summary of a successful generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
	/// Structs processed.
	pub structs: usize,
	/// Struct properties processed.
	pub properties: usize,
	/// Per-property plans in definition order.
	pub plans: Vec<AccessorPlan>,
	/// Function call entry names.
	pub calls: Vec<String>,
}

/// Names of the accessor slots that are filled.
pub(crate) fn slot_names(struct_identifier: &str, property: &str, accessors: &Accessors) -> Vec<String> {
	[
		("get", accessors.get.is_some() || accessors.item.is_some()),
		("set", accessors.set.is_some()),
		("length", accessors.length.is_some()),
		("begin", accessors.begin.is_some()),
		("next", accessors.next.is_some()),
		("end", accessors.end.is_some()),
	]
	.into_iter()
	.filter(|(_, present)| *present)
	.map(|(op, _)| accessor_name(struct_identifier, property, op))
	.collect()
}

impl SchemaRegistry {
	/// Run the accessor generator with default options.
	pub fn generate(&mut self) -> Result<GenerationReport, RnaError> {
		self.generate_with(&GenerateOptions::default())
	}

	/// Resolve struct references, build accessors, and validate the schema.
	///
	/// Fails when any definition error was recorded, before or during generation.
	pub fn generate_with(&mut self, options: &GenerateOptions) -> Result<GenerationReport, RnaError> {
		self.resolve_struct_refs();

		let mut report = GenerationReport::default();
		for struct_id in self.struct_order.clone() {
			let Some(def) = self.structs.get(struct_id) else {
				continue;
			};
			report.structs += 1;
			for prop in def.properties.clone() {
				if let Some(plan) = self.generate_property(prop, options) {
					report.properties += 1;
					report.plans.push(plan);
				}
			}
			for func in self.structs.get(struct_id).map(|def| def.functions.clone()).unwrap_or_default() {
				if let Some(name) = self.link_call_target(func) {
					report.calls.push(name);
				}
			}
		}

		if self.has_errors() {
			let count = self.errors.len();
			tracing::error!(count, "accessor generation failed");
			return Err(RnaError::DefinitionErrors { count });
		}
		for struct_id in self.struct_order.clone() {
			if let Some(def) = self.structs.get_mut(struct_id) {
				def.flag |= StructFlag::GENERATED;
			}
		}
		self.generated = true;
		tracing::debug!(structs = report.structs, properties = report.properties, "accessors generated");
		Ok(report)
	}

	fn find_struct_for_layout(&self, type_name: &str) -> Option<StructId> {
		self.find_struct(type_name)
			.filter(|id| self.structs.get(*id).is_some_and(|def| def.sdna.as_deref() == Some(type_name)))
			.or_else(|| {
				self.struct_ids()
					.find(|id| self.structs.get(*id).is_some_and(|def| def.sdna.as_deref() == Some(type_name) && def.sdna_member.is_none()))
			})
	}

	fn resolve_struct_refs(&mut self) {
		let ids: Vec<PropertyId> = self.properties.iter().map(|(id, _)| id).collect();
		for id in ids {
			let Some(def) = self.properties.get(id) else {
				continue;
			};
			if !matches!(def.property_type(), PropertyType::Pointer | PropertyType::Collection) {
				continue;
			}
			let runtime = def.internal.contains(PropInternal::RUNTIME);
			let resolved = match def.kind.struct_ref() {
				Some(StructRef::Resolved(target)) => Ok(*target),
				Some(StructRef::Named(name)) => self.find_struct(name).ok_or_else(|| DefinitionError::UnknownStruct {
					context: self.property_label(id),
					name: name.to_string(),
				}),
				None => def
					.binding
					.as_ref()
					.and_then(|binding| self.find_struct_for_layout(&binding.field.type_name))
					.ok_or_else(|| DefinitionError::MissingStructType {
						property: self.property_label(id),
					}),
			};
			let target = match resolved {
				Ok(target) => target,
				Err(_) if runtime => continue,
				Err(error) => {
					self.report(error);
					continue;
				}
			};
			let refcounted = self.structs.get(target).is_some_and(|def| def.flag.contains(StructFlag::ID_REFCOUNT));
			if let Some(def) = self.properties.get_mut(id) {
				match &mut def.kind {
					PropertyKind::Pointer(info) => {
						info.target = Some(StructRef::Resolved(target));
						if refcounted {
							def.flag |= PropFlag::ID_REFCOUNT;
						}
					}
					PropertyKind::Collection(info) => info.item = Some(StructRef::Resolved(target)),
					_ => {}
				}
			}
		}

		for struct_id in self.struct_order.clone() {
			let Some(Refine::Discriminant { variants, .. }) = self.structs.get(struct_id).and_then(|def| def.refine.as_ref()) else {
				continue;
			};
			let mut missing = Vec::new();
			let resolved: Vec<_> = variants
				.iter()
				.map(|(value, target)| match target {
					StructRef::Named(name) => match self.find_struct(name) {
						Some(found) => (*value, StructRef::Resolved(found)),
						None => {
							missing.push(name.to_string());
							(*value, target.clone())
						}
					},
					StructRef::Resolved(_) => (*value, target.clone()),
				})
				.collect();
			let context = format!("refine of {}", self.struct_identifier(struct_id));
			for name in missing {
				self.report(DefinitionError::UnknownStruct {
					context: context.clone(),
					name,
				});
			}
			if let Some(Refine::Discriminant { variants, .. }) = self.structs.get_mut(struct_id).and_then(|def| def.refine.as_mut()) {
				*variants = resolved;
			}
		}
	}

	fn template_input(&self, def: &PropertyDef) -> TemplateInput {
		let target = def.kind.struct_ref().and_then(StructRef::id);
		let item_size = def
			.binding
			.as_ref()
			.and_then(|binding| self.layout()?.struct_size(&binding.field.type_name))
			.unwrap_or(0);
		TemplateInput {
			identifier: def.identifier.clone(),
			binding: def.binding.clone(),
			array_length: def.array_length,
			kind: def.kind.clone(),
			editable: def.is_editable(),
			target,
			target_is_id: target.is_some_and(|target| self.structs.get(target).is_some_and(|def| def.flag.contains(StructFlag::ID))),
			item_size,
		}
	}

	/// Accessors for a property from its binding or runtime storage.
	pub(crate) fn build_accessors(&self, def: &PropertyDef) -> (Option<Template>, Accessors) {
		let template = if def.flag.contains(PropFlag::IDPROPERTY) {
			Some(Template::IdProperty)
		} else {
			def.binding.as_ref().and_then(|binding| template::select(def, binding))
		};
		match template {
			Some(template) => (Some(template), build(template, self.template_input(def))),
			None => (None, Accessors::default()),
		}
	}

	fn generate_property(&mut self, id: PropertyId, options: &GenerateOptions) -> Option<AccessorPlan> {
		let def = self.properties.get(id)?;
		let Container::Struct(owner) = def.owner else {
			return None;
		};
		let label = self.property_label(id);
		let mut errors = self.validate_property(def, &label);

		let (template, generated) = self.build_accessors(def);
		let accessors = def.overrides.or(&generated);
		if template.is_none() && accessors.get.is_none() && accessors.begin.is_none() {
			errors.push(DefinitionError::Unbound { property: label.clone() });
		}
		if def.property_type() == PropertyType::Collection {
			for (missing, present) in [("begin", accessors.begin.is_some()), ("next", accessors.next.is_some()), ("get", accessors.item.is_some())] {
				if present {
					continue;
				}
				if options.strict_collections {
					errors.push(DefinitionError::MissingCollectionAccessor {
						property: label.clone(),
						missing,
					});
				} else {
					tracing::warn!(property = %label, missing, "collection accessor missing");
				}
			}
		}

		let raw = match (&def.binding, options.raw_access && def.overrides.get.is_none()) {
			(Some(binding), true) => raw_annotation(&def.kind, binding, def.array_length),
			_ => None,
		};
		let plan = AccessorPlan {
			struct_identifier: self.struct_identifier(owner).to_owned(),
			identifier: def.identifier.to_string(),
			ty: def.property_type(),
			template,
			manual: !def.overrides.is_empty(),
			accessors: slot_names(self.struct_identifier(owner), &def.identifier, &accessors),
			binding: def.binding.clone(),
			raw,
		};
		tracing::debug!(property = %label, template = template.map(Template::as_str), "accessors built");

		for error in errors {
			self.report(error);
		}
		let def = self.properties.get_mut(id)?;
		def.accessors = accessors;
		def.raw = raw;
		def.internal.set(PropInternal::RAW_ACCESS, raw.is_some());
		def.internal.set(PropInternal::RAW_ARRAY, raw.is_some_and(|raw| raw.array_length > 0));
		Some(plan)
	}

	fn validate_property(&self, def: &PropertyDef, label: &str) -> Vec<DefinitionError> {
		let mut errors = Vec::new();
		if !def.is_editable() && def.overrides.set.is_some() {
			errors.push(DefinitionError::ReadOnlySetter { property: label.to_owned() });
		}
		if let PropertyKind::Enum(info) = &def.kind {
			let is_flag = def.flag.contains(PropFlag::ENUM_FLAG);
			let missing = if is_flag {
				info.default & !info.mask() != 0
			} else {
				info.item(info.default).is_none()
			};
			if missing {
				errors.push(DefinitionError::EnumDefaultMissing {
					property: label.to_owned(),
					value: info.default,
				});
			}
			let range = def.binding.as_ref().and_then(|binding| binding.field.primitive?.int_range());
			if let Some((min, max)) = range {
				for item in info.values().filter(|item| item.value < min || item.value > max) {
					errors.push(DefinitionError::InvalidEnumItem {
						property: label.to_owned(),
						identifier: item.identifier.to_string(),
						reason: format!("value {} does not fit the bound member", item.value),
					});
				}
			}
		}
		errors
	}

	fn link_call_target(&mut self, func: crate::rna::FunctionId) -> Option<String> {
		let def = self.functions.get(func)?;
		let name = accessor_name(self.struct_identifier(def.owner), &def.identifier, "call");
		match self.call_targets.get(&def.call_target).cloned() {
			Some(target) => {
				if let Some(def) = self.functions.get_mut(func) {
					def.call = Some(target);
				}
				Some(name)
			}
			None => {
				let error = DefinitionError::UnknownCallTarget {
					function: self.function_label(func),
					target: def.call_target.to_string(),
				};
				self.report(error);
				None
			}
		}
	}
}

#[cfg(test)]
mod tests;
