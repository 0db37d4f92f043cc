use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::rna::{
	Access, AccessMut, Accessors, Container, DefinitionError, EnumItem, Hook, IdentKind, MAX_ARRAY_LENGTH, ParamFlag, PropFlag, PropInternal, PropertyDef, PropertyId,
	PropertyKind, PropertySubtype, PropertyType, EditableFn, PollFn, RegisterFn, RnaPointer, SchemaRegistry, StructDef, StructFlag, StructId, StructRef,
	UnregisterFn, UpdateFn, validate_identifier,
};

impl SchemaRegistry {
	/// Define a struct, deriving from the struct named `base` when given.
	///
	/// A missing base is a definition error; the struct is still created, without a base.
	pub fn define_struct(&mut self, identifier: &str, base: Option<&str>) -> StructId {
		let base_id = base.and_then(|name| {
			let found = self.find_struct(name);
			if found.is_none() {
				self.report(DefinitionError::UnknownStruct {
					context: format!("struct {identifier}"),
					name: name.to_owned(),
				});
			}
			found
		});
		self.define_struct_from(identifier, base_id)
	}

	/// Define a struct deriving from `base`.
	///
	/// Root structs receive the built-in `rna_properties` and `rna_type` properties; derived
	/// structs inherit flags, layout struct, name and iterator properties, and callbacks.
	pub fn define_struct_from(&mut self, identifier: &str, base: Option<StructId>) -> StructId {
		if let Err(issue) = validate_identifier(identifier, IdentKind::Struct) {
			self.report(DefinitionError::InvalidIdentifier {
				kind: IdentKind::Struct,
				identifier: identifier.to_owned(),
				issue,
			});
		}
		if let Some(existing) = self.find_struct(identifier) {
			self.report(DefinitionError::DuplicateStruct {
				identifier: identifier.to_owned(),
			});
			return existing;
		}

		let in_layout = self.layout().is_some_and(|layout| layout.find_struct(identifier).is_some());
		let base_def = base.and_then(|id| self.structs.get(id));
		let def = StructDef {
			identifier: identifier.into(),
			name: identifier.into(),
			description: "".into(),
			flag: base_def.map_or(StructFlag::empty(), |def| def.flag & !(StructFlag::RUNTIME | StructFlag::GENERATED)),
			base: base_def.and(base),
			sdna: if in_layout { Some(identifier.into()) } else { base_def.and_then(|def| def.sdna.clone()) },
			sdna_member: if in_layout { None } else { base_def.and_then(|def| def.sdna_member.clone()) },
			name_property: base_def.and_then(|def| def.name_property),
			iterator_property: base_def.and_then(|def| def.iterator_property),
			refine: base_def.and_then(|def| def.refine.clone()),
			path: base_def.and_then(|def| def.path.clone()),
			register: base_def.and_then(|def| def.register.clone()),
			unregister: base_def.and_then(|def| def.unregister.clone()),
			properties: Vec::new(),
			functions: Vec::new(),
			refcount: 1,
		};
		let has_base = def.base.is_some();

		let id = self.structs.insert(def);
		self.struct_order.push(id);
		self.struct_by_name.insert(identifier.into(), id);
		if !has_base {
			self.add_builtin_properties(id);
		}
		tracing::debug!(identifier, has_base, "struct defined");
		id
	}

	/// Define a property on a struct or a function parameter.
	///
	/// Struct properties are bound right away when the layout struct has a member with the
	/// same identifier and a compatible type; misses are silent.
	pub fn define_property(&mut self, container: impl Into<Container>, identifier: &str, ty: PropertyType, subtype: PropertySubtype) -> PropertyId {
		let container = container.into();
		if let Err(issue) = validate_identifier(identifier, IdentKind::Property) {
			self.report(DefinitionError::InvalidIdentifier {
				kind: IdentKind::Property,
				identifier: identifier.to_owned(),
				issue,
			});
		}
		if let Some(existing) = self.own_property(container, identifier) {
			self.report(DefinitionError::DuplicateProperty {
				property: self.property_label(existing),
			});
			return self.properties.dangling();
		}
		let linked = match container {
			Container::Struct(owner) => self.structs.contains(owner),
			Container::Function(owner) => self.functions.contains(owner),
		};
		if !linked {
			self.report(DefinitionError::StaleHandle { kind: "container" });
			return self.properties.dangling();
		}

		let mut flag = PropFlag::empty();
		if !matches!(ty, PropertyType::Pointer | PropertyType::Collection) {
			flag |= PropFlag::EDITABLE;
			if ty != PropertyType::String {
				flag |= PropFlag::ANIMATABLE;
			}
		}
		let id = self.properties.insert(PropertyDef {
			identifier: identifier.into(),
			name: identifier.into(),
			description: "".into(),
			owner: container,
			flag,
			internal: PropInternal::empty(),
			param_flag: ParamFlag::empty(),
			subtype,
			array_length: 0,
			kind: PropertyKind::new(ty, subtype),
			binding: None,
			overrides: Accessors::default(),
			accessors: Accessors::default(),
			raw: None,
			update: None,
			editable: None,
			poll: None,
			refcount: 1,
		});

		match container {
			Container::Struct(owner) => self.structs.get_mut(owner).map(|def| def.properties.push(id)),
			Container::Function(owner) => self.functions.get_mut(owner).map(|def| def.parameters.push(id)),
		};
		if matches!(container, Container::Struct(_)) {
			self.probe_binding(id);
		}
		id
	}

	/// Boolean property with a default.
	pub fn def_boolean(&mut self, container: impl Into<Container>, identifier: &str, default: bool, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Boolean, PropertySubtype::None);
		self.set_boolean_default(id, default);
		self.set_ui_text(id, name, description);
		id
	}

	/// Boolean array property sized by `defaults`.
	pub fn def_boolean_array(&mut self, container: impl Into<Container>, identifier: &str, defaults: &[bool], name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Boolean, PropertySubtype::None);
		self.set_array(id, defaults.len());
		self.set_boolean_array_default(id, defaults);
		self.set_ui_text(id, name, description);
		id
	}

	/// Int property with a default and hard range.
	pub fn def_int(&mut self, container: impl Into<Container>, identifier: &str, default: i32, range: RangeInclusive<i32>, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Int, PropertySubtype::None);
		self.set_range(id, f64::from(*range.start()), f64::from(*range.end()));
		self.set_int_default(id, default);
		self.set_ui_text(id, name, description);
		id
	}

	/// Int array property sized by `defaults`.
	pub fn def_int_array(&mut self, container: impl Into<Container>, identifier: &str, defaults: &[i32], name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Int, PropertySubtype::None);
		self.set_array(id, defaults.len());
		self.set_int_array_default(id, defaults);
		self.set_ui_text(id, name, description);
		id
	}

	/// Float property with a default and hard range.
	pub fn def_float(&mut self, container: impl Into<Container>, identifier: &str, default: f32, range: RangeInclusive<f32>, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Float, PropertySubtype::None);
		self.set_range(id, f64::from(*range.start()), f64::from(*range.end()));
		self.set_float_default(id, default);
		self.set_ui_text(id, name, description);
		id
	}

	/// Float array property sized by `defaults`.
	pub fn def_float_array(&mut self, container: impl Into<Container>, identifier: &str, defaults: &[f32], subtype: PropertySubtype, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Float, subtype);
		self.set_array(id, defaults.len());
		self.set_float_array_default(id, defaults);
		self.set_ui_text(id, name, description);
		id
	}

	/// String property; `max_length` counts the terminator, `0` is unbounded.
	pub fn def_string(&mut self, container: impl Into<Container>, identifier: &str, default: &str, max_length: usize, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::String, PropertySubtype::None);
		if max_length > 0 {
			self.set_string_maxlength(id, max_length);
		}
		self.set_string_default(id, default);
		self.set_ui_text(id, name, description);
		id
	}

	/// Enum property.
	pub fn def_enum(&mut self, container: impl Into<Container>, identifier: &str, items: Vec<EnumItem>, default: i32, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Enum, PropertySubtype::None);
		self.set_enum_items(id, items);
		self.set_enum_default(id, default);
		self.set_ui_text(id, name, description);
		id
	}

	/// Bitflag enum property; values combine with OR.
	pub fn def_enum_flag(&mut self, container: impl Into<Container>, identifier: &str, items: Vec<EnumItem>, default: i32, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Enum, PropertySubtype::None);
		self.set_flag(id, PropFlag::ENUM_FLAG);
		self.set_enum_items(id, items);
		self.set_enum_default(id, default);
		self.set_ui_text(id, name, description);
		id
	}

	/// Pointer property targeting the struct named `type_name`.
	pub fn def_pointer(&mut self, container: impl Into<Container>, identifier: &str, type_name: &str, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Pointer, PropertySubtype::None);
		self.set_struct_type(id, type_name);
		self.set_ui_text(id, name, description);
		id
	}

	/// Collection property of the struct named `type_name`.
	pub fn def_collection(&mut self, container: impl Into<Container>, identifier: &str, type_name: &str, name: &str, description: &str) -> PropertyId {
		let id = self.define_property(container, identifier, PropertyType::Collection, PropertySubtype::None);
		self.set_struct_type(id, type_name);
		self.set_ui_text(id, name, description);
		id
	}

	pub(crate) fn edit_property(&mut self, id: PropertyId, edit: impl FnOnce(&mut PropertyDef, &str) -> Result<(), DefinitionError>) {
		let label = self.property_label(id);
		let outcome = match self.properties.get_mut(id) {
			Some(def) => edit(def, &label),
			None => Err(DefinitionError::StaleHandle { kind: "property" }),
		};
		match outcome {
			Ok(()) => self.refresh_runtime_accessors(id),
			Err(error) => self.report(error),
		}
	}

	pub(crate) fn edit_struct(&mut self, id: StructId, edit: impl FnOnce(&mut StructDef) -> Result<(), DefinitionError>) {
		let outcome = match self.structs.get_mut(id) {
			Some(def) => edit(def),
			None => Err(DefinitionError::StaleHandle { kind: "struct" }),
		};
		if let Err(error) = outcome {
			self.report(error);
		}
	}

	/// Display name and tooltip.
	pub fn set_ui_text(&mut self, id: PropertyId, name: &str, description: &str) {
		self.edit_property(id, |def, _| {
			def.name = name.into();
			def.description = description.into();
			Ok(())
		});
	}

	/// Set flags.
	pub fn set_flag(&mut self, id: PropertyId, flag: PropFlag) {
		self.edit_property(id, |def, _| {
			def.flag |= flag;
			Ok(())
		});
	}

	/// Clear flags.
	pub fn clear_flag(&mut self, id: PropertyId, flag: PropFlag) {
		self.edit_property(id, |def, _| {
			def.flag &= !flag;
			Ok(())
		});
	}

	/// Set parameter flags; only valid on function parameters.
	pub fn set_param_flag(&mut self, id: PropertyId, flag: ParamFlag) {
		self.edit_property(id, |def, label| {
			if !matches!(def.owner, Container::Function(_)) {
				return Err(DefinitionError::WrongContainer {
					property: label.to_owned(),
					operation: "parameter flags",
				});
			}
			def.param_flag |= flag;
			if flag.contains(ParamFlag::REQUIRED) {
				def.flag |= PropFlag::REQUIRED;
			}
			Ok(())
		});
	}

	/// Make the property a fixed-length array; `0` makes it scalar.
	pub fn set_array(&mut self, id: PropertyId, length: usize) {
		self.edit_property(id, |def, label| {
			if length > MAX_ARRAY_LENGTH {
				return Err(DefinitionError::ArrayTooLong {
					property: label.to_owned(),
					length,
					max: MAX_ARRAY_LENGTH,
				});
			}
			if length > 0 && !def.property_type().supports_array() {
				return Err(DefinitionError::ArrayNotAllowed {
					property: label.to_owned(),
					kind: def.property_type(),
				});
			}
			def.array_length = length;
			Ok(())
		});
	}

	/// Hard range for int and float properties; soft bounds outside it are pulled in.
	///
	/// A bound member keeps the range inside what its storage can hold.
	pub fn set_range(&mut self, id: PropertyId, min: f64, max: f64) {
		self.edit_property(id, |def, label| {
			if min > max {
				return Err(DefinitionError::RangeInverted { property: label.to_owned() });
			}
			let (min, max) = match def.binding.as_ref().and_then(|binding| binding.storage_range(def.property_type())) {
				Some((low, high)) if min > high || max < low => {
					return Err(DefinitionError::RangeOutsideStorage {
						property: label.to_owned(),
						type_name: def.binding.as_ref().map(|binding| binding.field.type_name.to_string()).unwrap_or_default(),
					});
				}
				Some((low, high)) => (min.max(low), max.min(high)),
				None => (min, max),
			};
			match &mut def.kind {
				PropertyKind::Int(info) => {
					info.hard_min = min.max(f64::from(i32::MIN)) as i32;
					info.hard_max = max.min(f64::from(i32::MAX)) as i32;
					if info.soft_min < info.hard_min || info.soft_min > info.hard_max {
						info.soft_min = info.hard_min;
					}
					if info.soft_max < info.hard_min || info.soft_max > info.hard_max {
						info.soft_max = info.hard_max;
					}
				}
				PropertyKind::Float(info) => {
					info.hard_min = min as f32;
					info.hard_max = max as f32;
					if info.soft_min < info.hard_min || info.soft_min > info.hard_max {
						info.soft_min = info.hard_min;
					}
					if info.soft_max < info.hard_min || info.soft_max > info.hard_max {
						info.soft_max = info.hard_max;
					}
				}
				other => {
					return Err(DefinitionError::KindMismatch {
						property: label.to_owned(),
						operation: "range",
						expected: PropertyType::Int,
						got: other.property_type(),
					});
				}
			}
			Ok(())
		});
	}

	/// Soft range, step, and precision; presentation only.
	pub fn set_ui_range(&mut self, id: PropertyId, min: f64, max: f64, step: f64, precision: u8) {
		self.edit_property(id, |def, label| {
			if min > max {
				return Err(DefinitionError::RangeInverted { property: label.to_owned() });
			}
			match &mut def.kind {
				PropertyKind::Int(info) => {
					info.soft_min = min as i32;
					info.soft_max = max as i32;
					info.step = step as i32;
				}
				PropertyKind::Float(info) => {
					info.soft_min = min as f32;
					info.soft_max = max as f32;
					info.step = step as f32;
					info.precision = precision;
				}
				other => {
					return Err(DefinitionError::KindMismatch {
						property: label.to_owned(),
						operation: "ui range",
						expected: PropertyType::Float,
						got: other.property_type(),
					});
				}
			}
			Ok(())
		});
	}

	/// Scalar boolean default.
	pub fn set_boolean_default(&mut self, id: PropertyId, value: bool) {
		self.edit_kind(id, "boolean default", PropertyType::Boolean, |kind| {
			if let PropertyKind::Boolean(info) = kind {
				info.default = value;
			}
		});
	}

	/// Per-element boolean default.
	pub fn set_boolean_array_default(&mut self, id: PropertyId, values: &[bool]) {
		if self.check_array_default(id, values.len()) {
			self.edit_kind(id, "boolean array default", PropertyType::Boolean, |kind| {
				if let PropertyKind::Boolean(info) = kind {
					info.array_default = values.to_vec();
				}
			});
		}
	}

	/// Scalar int default.
	pub fn set_int_default(&mut self, id: PropertyId, value: i32) {
		self.edit_kind(id, "int default", PropertyType::Int, |kind| {
			if let PropertyKind::Int(info) = kind {
				info.default = value;
			}
		});
	}

	/// Per-element int default.
	pub fn set_int_array_default(&mut self, id: PropertyId, values: &[i32]) {
		if self.check_array_default(id, values.len()) {
			self.edit_kind(id, "int array default", PropertyType::Int, |kind| {
				if let PropertyKind::Int(info) = kind {
					info.array_default = values.to_vec();
				}
			});
		}
	}

	/// Scalar float default.
	pub fn set_float_default(&mut self, id: PropertyId, value: f32) {
		self.edit_kind(id, "float default", PropertyType::Float, |kind| {
			if let PropertyKind::Float(info) = kind {
				info.default = value;
			}
		});
	}

	/// Per-element float default.
	pub fn set_float_array_default(&mut self, id: PropertyId, values: &[f32]) {
		if self.check_array_default(id, values.len()) {
			self.edit_kind(id, "float array default", PropertyType::Float, |kind| {
				if let PropertyKind::Float(info) = kind {
					info.array_default = values.to_vec();
				}
			});
		}
	}

	/// String default.
	pub fn set_string_default(&mut self, id: PropertyId, value: &str) {
		self.edit_kind(id, "string default", PropertyType::String, |kind| {
			if let PropertyKind::String(info) = kind {
				info.default = value.into();
			}
		});
	}

	/// Maximum byte length including the terminator.
	pub fn set_string_maxlength(&mut self, id: PropertyId, max_length: usize) {
		self.edit_kind(id, "string max length", PropertyType::String, |kind| {
			if let PropertyKind::String(info) = kind {
				info.max_length = max_length;
			}
		});
	}

	/// Enum default; checked against the items during generation.
	pub fn set_enum_default(&mut self, id: PropertyId, value: i32) {
		self.edit_kind(id, "enum default", PropertyType::Enum, |kind| {
			if let PropertyKind::Enum(info) = kind {
				info.default = value;
			}
		});
	}

	/// Enum items. A plain enum whose default is not among them defaults to the first item.
	pub fn set_enum_items(&mut self, id: PropertyId, items: Vec<EnumItem>) {
		let label = self.property_label(id);
		for item in &items {
			if let Err(issue) = validate_identifier(&item.identifier, IdentKind::EnumItem) {
				self.report(DefinitionError::InvalidEnumItem {
					property: label.clone(),
					identifier: item.identifier.to_string(),
					reason: issue.to_string(),
				});
			}
		}
		let is_flag = self.property(id).is_some_and(|def| def.flag.contains(PropFlag::ENUM_FLAG));
		self.edit_kind(id, "enum items", PropertyType::Enum, |kind| {
			if let PropertyKind::Enum(info) = kind {
				info.items = items;
				if !is_flag && info.item(info.default).is_none() {
					let first = info.values().next().map(|item| item.value);
					if let Some(first) = first {
						info.default = first;
					}
				}
			}
		});
	}

	/// Target struct of a pointer or item struct of a collection, by identifier.
	pub fn set_struct_type(&mut self, id: PropertyId, type_name: &str) {
		let target = match self.find_struct(type_name) {
			Some(found) => StructRef::Resolved(found),
			None => StructRef::Named(type_name.into()),
		};
		self.set_struct_ref(id, target);
	}

	/// Target struct of a pointer or item struct of a collection.
	pub fn set_struct_type_id(&mut self, id: PropertyId, target: StructId) {
		self.set_struct_ref(id, StructRef::Resolved(target));
	}

	fn set_struct_ref(&mut self, id: PropertyId, target: StructRef) {
		self.edit_property(id, |def, label| match &mut def.kind {
			PropertyKind::Pointer(info) => {
				info.target = Some(target);
				Ok(())
			}
			PropertyKind::Collection(info) => {
				info.item = Some(target);
				Ok(())
			}
			other => Err(DefinitionError::KindMismatch {
				property: label.to_owned(),
				operation: "struct type",
				expected: PropertyType::Pointer,
				got: other.property_type(),
			}),
		});
	}

	/// Dynamic target type of a pointer, evaluated on every read.
	pub fn set_pointer_type_fn(&mut self, id: PropertyId, f: impl Fn(&Access<'_>, &RnaPointer) -> Option<StructId> + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<crate::rna::TypeFn>);
		self.edit_kind(id, "pointer type function", PropertyType::Pointer, |kind| {
			if let PropertyKind::Pointer(info) = kind {
				info.type_fn = Some(hook);
			}
		});
	}

	/// Hand-written accessors; filled slots replace generated ones.
	pub fn set_accessors(&mut self, id: PropertyId, accessors: Accessors) {
		self.edit_property(id, |def, _| {
			def.overrides = accessors.or(&def.overrides);
			Ok(())
		});
	}

	/// Callback run after every successful [`SchemaRegistry::set`] of this property.
	pub fn set_update(&mut self, id: PropertyId, f: impl Fn(&mut AccessMut<'_>, &RnaPointer, PropertyId) + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<UpdateFn>);
		self.edit_property(id, |def, _| {
			def.update = Some(hook);
			Ok(())
		});
	}

	/// Per-instance editability; only asked when the property is flagged editable.
	pub fn set_editable_func(&mut self, id: PropertyId, f: impl Fn(&Access<'_>, &RnaPointer) -> bool + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<EditableFn>);
		self.edit_property(id, |def, _| {
			def.editable = Some(hook);
			Ok(())
		});
	}

	/// Filter for pointer targets, called with the owning instance and the candidate.
	pub fn set_poll(&mut self, id: PropertyId, f: impl Fn(&Access<'_>, &RnaPointer, &RnaPointer) -> bool + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<PollFn>);
		self.edit_property(id, |def, label| {
			if def.property_type() != PropertyType::Pointer {
				return Err(DefinitionError::KindMismatch {
					property: label.to_owned(),
					operation: "poll",
					expected: PropertyType::Pointer,
					got: def.property_type(),
				});
			}
			def.poll = Some(hook);
			Ok(())
		});
	}

	fn edit_kind(&mut self, id: PropertyId, operation: &'static str, expected: PropertyType, edit: impl FnOnce(&mut PropertyKind)) {
		self.edit_property(id, |def, label| {
			let got = def.property_type();
			if got != expected {
				return Err(DefinitionError::KindMismatch {
					property: label.to_owned(),
					operation,
					expected,
					got,
				});
			}
			edit(&mut def.kind);
			Ok(())
		});
	}

	fn check_array_default(&mut self, id: PropertyId, got: usize) -> bool {
		let Some(expected) = self.property(id).map(|def| def.array_length) else {
			return true;
		};
		if expected != got {
			self.report(DefinitionError::ArrayDefaultLength {
				property: self.property_label(id),
				expected,
				got,
			});
			return false;
		}
		true
	}

	/// Display name and tooltip of a struct.
	pub fn set_struct_ui_text(&mut self, id: StructId, name: &str, description: &str) {
		self.edit_struct(id, |def| {
			def.name = name.into();
			def.description = description.into();
			Ok(())
		});
	}

	/// Set struct flags.
	pub fn set_struct_flag(&mut self, id: StructId, flag: StructFlag) {
		self.edit_struct(id, |def| {
			def.flag |= flag;
			Ok(())
		});
	}

	/// Bind the struct's properties into the layout struct `layout_name`.
	pub fn set_struct_sdna(&mut self, id: StructId, layout_name: &str) {
		self.set_struct_sdna_inner(id, layout_name, None);
	}

	/// Instances point at a `layout_name` whose member `member` holds the bound data.
	pub fn set_struct_sdna_from(&mut self, id: StructId, layout_name: &str, member: &str) {
		self.set_struct_sdna_inner(id, layout_name, Some(member));
	}

	fn set_struct_sdna_inner(&mut self, id: StructId, layout_name: &str, member: Option<&str>) {
		let found = match self.layout() {
			None => Err(DefinitionError::NoLayoutTable {
				context: self.struct_identifier(id).to_owned(),
			}),
			Some(layout) if layout.find_struct(layout_name).is_none() => Err(DefinitionError::LayoutStructNotFound {
				struct_name: layout_name.to_owned(),
			}),
			Some(_) => Ok(()),
		};
		match found {
			Ok(()) => self.edit_struct(id, |def| {
				def.sdna = Some(layout_name.into());
				def.sdna_member = member.map(Into::into);
				Ok(())
			}),
			Err(error) => self.report(error),
		}
	}

	/// String property naming instances; used for string lookup in collections.
	pub fn set_struct_name_property(&mut self, id: StructId, property: PropertyId) {
		let ty = self.property(property).map(PropertyDef::property_type);
		if ty != Some(PropertyType::String) {
			self.report(DefinitionError::NamePropertyNotString {
				property: self.property_label(property),
			});
			return;
		}
		self.edit_struct(id, |def| {
			def.name_property = Some(property);
			Ok(())
		});
	}

	/// Collection iterated when instances are treated as sequences.
	pub fn set_struct_iterator_property(&mut self, id: StructId, property: PropertyId) {
		let ty = self.property(property).map(PropertyDef::property_type);
		if ty != Some(PropertyType::Collection) {
			self.report(DefinitionError::KindMismatch {
				property: self.property_label(property),
				operation: "iterator property",
				expected: PropertyType::Collection,
				got: ty.unwrap_or(PropertyType::Collection),
			});
			return;
		}
		self.edit_struct(id, |def| {
			def.iterator_property = Some(property);
			Ok(())
		});
	}

	/// Subtype registration callbacks used by [`SchemaRegistry::register_struct`].
	pub fn set_register_funcs(
		&mut self,
		id: StructId,
		register: impl Fn(&mut SchemaRegistry, StructId, &str) -> Option<StructId> + Send + Sync + 'static,
		unregister: impl Fn(&mut SchemaRegistry, StructId) + Send + Sync + 'static,
	) {
		let register = Hook(Arc::new(register) as Arc<RegisterFn>);
		let unregister = Hook(Arc::new(unregister) as Arc<UnregisterFn>);
		self.edit_struct(id, |def| {
			def.register = Some(register);
			def.unregister = Some(unregister);
			Ok(())
		});
	}

	/// Locator callback used by [`SchemaRegistry::path_of`].
	pub fn set_path_func(&mut self, id: StructId, f: impl Fn(&Access<'_>, &RnaPointer) -> Option<String> + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<crate::rna::PathFn>);
		self.edit_struct(id, |def| {
			def.path = Some(hook);
			Ok(())
		});
	}
}

#[cfg(test)]
mod tests;
