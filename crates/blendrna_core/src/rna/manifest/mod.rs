use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::rna::generate::slot_names;

use crate::rna::{
	Container, EnumItem, FuncFlag, ParamFlag, PropFlag, PropInternal, PropertyId, PropertySubtype, PropertyType, RawAccess, Result, RnaError, SchemaRegistry,
	StructFlag, StructId, StructRef,
};

/// Declarative schema, applied with the same calls as hand-written registration.
///
/// ```json
/// { "structs": [ { "identifier": "Item", "name_property": "name", "properties": [
///     { "identifier": "name", "type": "string", "max_length": 64 },
///     { "identifier": "count", "type": "int", "range": [0, 1000] } ] } ] }
/// ```
///
/// Structs are defined in order, so a base must be listed before the structs deriving from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaManifest {
	/// Struct declarations.
	pub structs: Vec<StructManifest>,
}

/// One struct in a [`SchemaManifest`].
#[derive(Debug, Clone, Deserialize)]
pub struct StructManifest {
	/// Identifier.
	pub identifier: String,
	/// Base struct identifier.
	#[serde(default)]
	pub base: Option<String>,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Tooltip text.
	#[serde(default)]
	pub description: Option<String>,
	/// Layout struct, when it differs from the identifier.
	#[serde(default)]
	pub sdna: Option<String>,
	/// Member of `sdna` holding the data.
	#[serde(default)]
	pub sdna_member: Option<String>,
	/// Instances are identified objects.
	#[serde(default)]
	pub id: bool,
	/// Identified objects are reference counted.
	#[serde(default)]
	pub id_refcount: bool,
	/// Instances cannot carry runtime properties.
	#[serde(default)]
	pub no_idproperties: bool,
	/// String property naming instances.
	#[serde(default)]
	pub name_property: Option<String>,
	/// Collection property iterated when the struct is treated as a sequence.
	#[serde(default)]
	pub iterator_property: Option<String>,
	/// Dynamic type resolution table.
	#[serde(default)]
	pub refine: Option<RefineManifest>,
	/// Properties in definition order.
	#[serde(default)]
	pub properties: Vec<PropertyManifest>,
	/// Functions in definition order.
	#[serde(default)]
	pub functions: Vec<FunctionManifest>,
}

/// Integer discriminant to subtype table.
#[derive(Debug, Clone, Deserialize)]
pub struct RefineManifest {
	/// Member path of the discriminant.
	pub path: String,
	/// `[value, struct]` pairs.
	pub variants: Vec<(i64, String)>,
}

/// UI range of a numeric property.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UiRangeManifest {
	/// Soft minimum.
	pub min: f64,
	/// Soft maximum.
	pub max: f64,
	/// Step.
	#[serde(default = "default_step")]
	pub step: f64,
	/// Displayed digits.
	#[serde(default = "default_precision")]
	pub precision: u8,
}

fn default_step() -> f64 {
	1.0
}

fn default_precision() -> u8 {
	3
}

/// Layout member backing a property.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindManifest {
	/// Member path, such as `flag` or `data->count`.
	pub path: String,
	/// Bit mask for boolean flags.
	#[serde(default)]
	pub bit: u64,
	/// Boolean reads as the inverse of the bit.
	#[serde(default)]
	pub negative: bool,
	/// Boolean array spread over consecutive bits.
	#[serde(default)]
	pub bitset_length: Option<usize>,
	/// Enum stored as the OR of item bits.
	#[serde(default)]
	pub bitflag: bool,
	/// Member holding the item count of a pointer-backed collection.
	#[serde(default)]
	pub length: Option<String>,
}

/// One property or function parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyManifest {
	/// Identifier.
	pub identifier: String,
	/// Kind.
	#[serde(rename = "type")]
	pub ty: PropertyType,
	/// Semantic subtype.
	#[serde(default)]
	pub subtype: PropertySubtype,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Tooltip text.
	#[serde(default)]
	pub description: Option<String>,
	/// Fixed array length.
	#[serde(default)]
	pub array_length: Option<usize>,
	/// Hard range.
	#[serde(default)]
	pub range: Option<(f64, f64)>,
	/// UI range.
	#[serde(default)]
	pub ui_range: Option<UiRangeManifest>,
	/// Default value; enums accept an item identifier.
	#[serde(default)]
	pub default: Option<serde_json::Value>,
	/// Enum items.
	#[serde(default)]
	pub items: Vec<EnumItem>,
	/// Enum values combine as bit flags.
	#[serde(default)]
	pub enum_flag: bool,
	/// Pointer target or collection item struct.
	#[serde(default)]
	pub struct_type: Option<String>,
	/// String capacity including the terminator.
	#[serde(default)]
	pub max_length: Option<usize>,
	/// Explicit binding; without it the member named like the property is used when present.
	#[serde(default)]
	pub bind: Option<BindManifest>,
	/// Not writable through the runtime API.
	#[serde(default)]
	pub readonly: bool,
	/// Hidden from user-facing introspection.
	#[serde(default)]
	pub hidden: bool,
	/// Pointer may not be null.
	#[serde(default)]
	pub never_null: bool,
	/// Parameter must be supplied.
	#[serde(default)]
	pub required: bool,
	/// Parameter is written by the call target.
	#[serde(default)]
	pub output: bool,
	/// Parameter holds the return value.
	#[serde(default, rename = "return")]
	pub is_return: bool,
}

/// One function.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionManifest {
	/// Identifier.
	pub identifier: String,
	/// Name of the registered call target.
	pub call: String,
	/// Tooltip text.
	#[serde(default)]
	pub description: Option<String>,
	/// Called without a receiver.
	#[serde(default)]
	pub no_self: bool,
	/// Receives the owning identified object.
	#[serde(default)]
	pub use_self_id: bool,
	/// Receives the ambient context.
	#[serde(default)]
	pub use_context: bool,
	/// Receives a report sink.
	#[serde(default)]
	pub use_reports: bool,
	/// Parameters in declaration order.
	#[serde(default)]
	pub parameters: Vec<PropertyManifest>,
}

impl SchemaManifest {
	/// Parse a manifest.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	/// Read and parse a manifest file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let text = std::fs::read_to_string(path)?;
		Self::from_json(&text)
	}

	/// Register everything the manifest declares.
	///
	/// Definition errors are recorded on the registry as usual; the call fails when this
	/// manifest added any.
	pub fn apply(&self, registry: &mut SchemaRegistry) -> Result<Vec<StructId>> {
		let before = registry.errors().len();
		let mut ids = Vec::with_capacity(self.structs.len());
		for item in &self.structs {
			ids.push(item.apply(registry));
		}
		let count = registry.errors().len() - before;
		tracing::debug!(structs = ids.len(), errors = count, "manifest applied");
		if count > 0 {
			return Err(RnaError::DefinitionErrors { count });
		}
		Ok(ids)
	}
}

impl StructManifest {
	fn apply(&self, registry: &mut SchemaRegistry) -> StructId {
		let id = registry.define_struct(&self.identifier, self.base.as_deref());
		if self.name.is_some() || self.description.is_some() {
			registry.set_struct_ui_text(id, self.name.as_deref().unwrap_or(&self.identifier), self.description.as_deref().unwrap_or(""));
		}
		match (&self.sdna, &self.sdna_member) {
			(Some(sdna), Some(member)) => registry.set_struct_sdna_from(id, sdna, member),
			(Some(sdna), None) => registry.set_struct_sdna(id, sdna),
			(None, _) => {}
		}
		let flags = [
			(StructFlag::ID, self.id),
			(StructFlag::ID_REFCOUNT, self.id_refcount),
			(StructFlag::NO_IDPROPERTIES, self.no_idproperties),
		];
		for (flag, wanted) in flags {
			if wanted {
				registry.set_struct_flag(id, flag);
			}
		}

		let properties: Vec<(PropertyId, &str)> = self
			.properties
			.iter()
			.map(|prop| (prop.apply(registry, Container::Struct(id)), prop.identifier.as_str()))
			.collect();
		let find = |registry: &SchemaRegistry, name: &str| {
			properties
				.iter()
				.find(|(_, identifier)| *identifier == name)
				.map(|(prop, _)| *prop)
				.or_else(|| registry.find_property(id, name))
		};
		let name_property = self.name_property.as_deref().and_then(|name| find(registry, name));
		if let Some(prop) = name_property {
			registry.set_struct_name_property(id, prop);
		}
		let iterator_property = self.iterator_property.as_deref().and_then(|name| find(registry, name));
		if let Some(prop) = iterator_property {
			registry.set_struct_iterator_property(id, prop);
		}
		if let Some(refine) = &self.refine {
			let variants: Vec<(i64, &str)> = refine.variants.iter().map(|(value, name)| (*value, name.as_str())).collect();
			registry.set_refine_discriminant(id, &refine.path, &variants);
		}
		for func in &self.functions {
			func.apply(registry, id);
		}
		id
	}
}

impl FunctionManifest {
	fn apply(&self, registry: &mut SchemaRegistry, owner: StructId) {
		let Some(func) = registry.define_function(owner, &self.identifier, &self.call) else {
			return;
		};
		if let Some(description) = &self.description {
			registry.set_function_description(func, description);
		}
		let flags = [
			(FuncFlag::NO_SELF, self.no_self),
			(FuncFlag::USE_SELF_ID, self.use_self_id),
			(FuncFlag::USE_CONTEXT, self.use_context),
			(FuncFlag::USE_REPORTS, self.use_reports),
		];
		for (flag, wanted) in flags {
			if wanted {
				registry.set_function_flag(func, flag);
			}
		}
		for param in &self.parameters {
			let id = param.apply(registry, Container::Function(func));
			if param.is_return {
				registry.set_function_return(func, id);
			} else if param.output {
				registry.set_function_output(id);
			}
			if param.required {
				registry.set_param_flag(id, ParamFlag::REQUIRED);
			}
		}
	}
}

impl PropertyManifest {
	fn apply(&self, registry: &mut SchemaRegistry, container: Container) -> PropertyId {
		let id = registry.define_property(container, &self.identifier, self.ty, self.subtype);
		if self.name.is_some() || self.description.is_some() {
			registry.set_ui_text(id, self.name.as_deref().unwrap_or(&self.identifier), self.description.as_deref().unwrap_or(""));
		}
		if let Some(length) = self.array_length {
			registry.set_array(id, length);
		}
		if let Some((min, max)) = self.range {
			registry.set_range(id, min, max);
		}
		if let Some(ui) = self.ui_range {
			registry.set_ui_range(id, ui.min, ui.max, ui.step, ui.precision);
		}
		if let Some(max_length) = self.max_length {
			registry.set_string_maxlength(id, max_length);
		}
		if self.enum_flag {
			registry.set_flag(id, PropFlag::ENUM_FLAG);
		}
		if !self.items.is_empty() {
			registry.set_enum_items(id, self.items.clone());
		}
		if let Some(type_name) = &self.struct_type {
			registry.set_struct_type(id, type_name);
		}
		if let Some(bind) = &self.bind {
			self.bind(registry, id, bind);
		}
		if let Some(default) = &self.default {
			self.apply_default(registry, id, default);
		}
		for (flag, wanted) in [(PropFlag::HIDDEN, self.hidden), (PropFlag::NEVER_NULL, self.never_null)] {
			if wanted {
				registry.set_flag(id, flag);
			}
		}
		if self.readonly {
			registry.clear_flag(id, PropFlag::EDITABLE);
		}
		if self.required && matches!(container, Container::Struct(_)) {
			registry.set_flag(id, PropFlag::REQUIRED);
		}
		id
	}

	fn bind(&self, registry: &mut SchemaRegistry, id: PropertyId, bind: &BindManifest) {
		let path = bind.path.as_str();
		match self.ty {
			PropertyType::Boolean => match bind.bitset_length {
				Some(length) => registry.bind_boolean_bitset_array(id, path, bind.bit, length),
				None if bind.negative => registry.bind_boolean_negative(id, path, bind.bit),
				None => registry.bind_boolean(id, path, bind.bit),
			},
			PropertyType::Int => registry.bind_int(id, path),
			PropertyType::Float => registry.bind_float(id, path),
			PropertyType::Enum if bind.bitflag => registry.bind_enum_bitflag(id, path),
			PropertyType::Enum => registry.bind_enum(id, path),
			PropertyType::String => registry.bind_string(id, path),
			PropertyType::Pointer => registry.bind_pointer(id, path),
			PropertyType::Collection => registry.bind_collection(id, path, bind.length.as_deref()),
		}
	}

	fn apply_default(&self, registry: &mut SchemaRegistry, id: PropertyId, default: &serde_json::Value) {
		use serde_json::Value as Json;
		match (self.ty, default) {
			(PropertyType::Boolean, Json::Bool(value)) => registry.set_boolean_default(id, *value),
			(PropertyType::Boolean, Json::Array(values)) => {
				let values: Vec<bool> = values.iter().filter_map(Json::as_bool).collect();
				registry.set_boolean_array_default(id, &values);
			}
			(PropertyType::Int, Json::Number(value)) => {
				if let Some(value) = value.as_i64().and_then(|value| i32::try_from(value).ok()) {
					registry.set_int_default(id, value);
				}
			}
			(PropertyType::Int, Json::Array(values)) => {
				let values: Vec<i32> = values.iter().filter_map(|value| i32::try_from(value.as_i64()?).ok()).collect();
				registry.set_int_array_default(id, &values);
			}
			(PropertyType::Float, Json::Number(value)) => {
				if let Some(value) = value.as_f64() {
					registry.set_float_default(id, value as f32);
				}
			}
			(PropertyType::Float, Json::Array(values)) => {
				let values: Vec<f32> = values.iter().filter_map(|value| Some(value.as_f64()? as f32)).collect();
				registry.set_float_array_default(id, &values);
			}
			(PropertyType::String, Json::String(value)) => registry.set_string_default(id, value),
			(PropertyType::Enum, Json::Number(value)) => {
				if let Some(value) = value.as_i64().and_then(|value| i32::try_from(value).ok()) {
					registry.set_enum_default(id, value);
				}
			}
			(PropertyType::Enum, Json::String(identifier)) => {
				let value = self.items.iter().find(|item| *item.identifier == **identifier).map(|item| item.value);
				match value {
					Some(value) => registry.set_enum_default(id, value),
					None => tracing::warn!(property = %self.identifier, default = %identifier, "enum default names no item"),
				}
			}
			_ => tracing::warn!(property = %self.identifier, "default does not match the property type"),
		}
	}
}

/// Registry contents in identifier order, for reports and snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
	/// Structs sorted by identifier.
	pub structs: Vec<StructSummary>,
	/// Recorded definition errors.
	pub errors: Vec<String>,
}

/// One struct in a [`SchemaSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct StructSummary {
	/// Identifier.
	pub identifier: String,
	/// Base identifier.
	pub base: Option<String>,
	/// Layout struct.
	pub sdna: Option<String>,
	/// Instances are identified objects.
	pub id: bool,
	/// Defined at run time.
	pub runtime: bool,
	/// Name property identifier.
	pub name_property: Option<String>,
	/// Own properties, built-ins excluded, in definition order.
	pub properties: Vec<PropertySummary>,
	/// Own functions in definition order.
	pub functions: Vec<FunctionSummary>,
}

/// One property in a [`SchemaSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct PropertySummary {
	/// Identifier.
	pub identifier: String,
	/// Kind.
	#[serde(rename = "type")]
	pub ty: PropertyType,
	/// Element count.
	pub array_length: usize,
	/// Writable.
	pub editable: bool,
	/// Target or item struct.
	pub struct_type: Option<String>,
	/// Bound layout member path.
	pub member: Option<String>,
	/// Accessors in effect, by name.
	pub accessors: Vec<String>,
	/// Raw access annotation.
	pub raw: Option<RawAccess>,
}

/// One function in a [`SchemaSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSummary {
	/// Identifier.
	pub identifier: String,
	/// Call entry name.
	pub call: String,
	/// Parameter identifiers in declaration order.
	pub parameters: Vec<String>,
	/// Return parameter identifier.
	#[serde(rename = "return")]
	pub return_param: Option<String>,
}

impl SchemaSummary {
	/// Summarize every struct in the registry.
	pub fn from_registry(registry: &SchemaRegistry) -> Self {
		let structs = registry
			.sorted_struct_ids()
			.into_iter()
			.filter_map(|id| {
				let def = registry.struct_def(id)?;
				let identifier_of = |prop: PropertyId| registry.property(prop).map(|def| def.identifier.to_string());
				Some(StructSummary {
					identifier: def.identifier.to_string(),
					base: def.base.map(|base| registry.struct_identifier(base).to_owned()),
					sdna: def.sdna.as_deref().map(str::to_owned),
					id: def.flag.contains(StructFlag::ID),
					runtime: def.flag.contains(StructFlag::RUNTIME),
					name_property: def.name_property.and_then(identifier_of),
					properties: def.properties.iter().filter_map(|prop| property_summary(registry, id, *prop)).collect(),
					functions: def
						.functions
						.iter()
						.filter_map(|func| {
							let fdef = registry.function(*func)?;
							Some(FunctionSummary {
								identifier: fdef.identifier.to_string(),
								call: crate::rna::accessor_name(&def.identifier, &fdef.identifier, "call"),
								parameters: fdef.parameters.iter().filter_map(|param| identifier_of(*param)).collect(),
								return_param: fdef.return_param.and_then(identifier_of),
							})
						})
						.collect(),
				})
			})
			.collect();
		Self {
			structs,
			errors: registry.errors().iter().map(ToString::to_string).collect(),
		}
	}
}

fn property_summary(registry: &SchemaRegistry, owner: StructId, prop: PropertyId) -> Option<PropertySummary> {
	let def = registry.property(prop)?;
	if def.internal.contains(PropInternal::BUILTIN) {
		return None;
	}
	let owner = registry.struct_identifier(owner);
	Some(PropertySummary {
		identifier: def.identifier.to_string(),
		ty: def.property_type(),
		array_length: def.array_length,
		editable: def.is_editable(),
		struct_type: def.kind.struct_ref().map(|target| match target {
			StructRef::Named(name) => name.to_string(),
			StructRef::Resolved(id) => registry.struct_identifier(*id).to_owned(),
		}),
		member: def.binding.as_ref().map(|binding| binding.field.path.to_string()),
		accessors: slot_names(owner, &def.identifier, &def.accessors),
		raw: def.raw,
	})
}

#[cfg(test)]
mod tests;
