//! Structs describing the descriptors themselves, so schemas can be browsed through the same
//! runtime API as instance data.

use crate::rna::{
	Access, Accessors, Container, EnumItem, MetaStructs, PropFlag, PropInternal, PropertyId, PropertySubtype, PropertyType, RnaPointer, SchemaRegistry,
	StructId, Target, Value,
};

const PROPERTY_TYPE_ITEMS: [(PropertyType, &str); 7] = [
	(PropertyType::Boolean, "BOOLEAN"),
	(PropertyType::Int, "INT"),
	(PropertyType::Float, "FLOAT"),
	(PropertyType::String, "STRING"),
	(PropertyType::Enum, "ENUM"),
	(PropertyType::Pointer, "POINTER"),
	(PropertyType::Collection, "COLLECTION"),
];

fn read_only(registry: &mut SchemaRegistry, owner: StructId, identifier: &str, ty: PropertyType, accessors: Accessors) -> PropertyId {
	let id = registry.define_property(owner, identifier, ty, PropertySubtype::None);
	registry.clear_flag(id, PropFlag::EDITABLE | PropFlag::ANIMATABLE);
	registry.set_accessors(id, accessors);
	id
}

fn text(value: &str) -> Option<Value> {
	Some(Value::String(value.to_owned()))
}

/// Define `Struct`, `Property`, `Function`, and `EnumPropertyItem`.
pub(crate) fn define_meta_structs(registry: &mut SchemaRegistry) -> MetaStructs {
	let meta = MetaStructs {
		struct_: registry.define_struct_from("Struct", None),
		property: registry.define_struct_from("Property", None),
		function: registry.define_struct_from("Function", None),
		enum_item: registry.define_struct_from("EnumPropertyItem", None),
	};
	registry.meta = meta;
	for id in [meta.struct_, meta.property, meta.function, meta.enum_item] {
		registry.add_builtin_properties(id);
	}
	registry.set_struct_ui_text(meta.struct_, "Struct Definition", "Schema struct definition");
	registry.set_struct_ui_text(meta.property, "Property Definition", "Schema property definition");
	registry.set_struct_ui_text(meta.function, "Function Definition", "Schema function definition");
	registry.set_struct_ui_text(meta.enum_item, "Enum Item Definition", "One item of an enum property");

	define_struct_meta(registry, meta);
	define_property_meta(registry, meta);
	define_function_meta(registry, meta);
	define_enum_item_meta(registry, meta);
	meta
}

fn define_struct_meta(registry: &mut SchemaRegistry, meta: MetaStructs) {
	let owner = meta.struct_;
	let field = |f: fn(&crate::rna::StructDef) -> &str| {
		Accessors::default().with_get(move |access: &Access<'_>, ptr: &RnaPointer| match ptr.target {
			Target::Struct(id) => text(f(access.registry.struct_def(id)?)),
			_ => None,
		})
	};
	let identifier = read_only(registry, owner, "identifier", PropertyType::String, field(|def| &*def.identifier));
	read_only(registry, owner, "name", PropertyType::String, field(|def| &*def.name));
	read_only(registry, owner, "description", PropertyType::String, field(|def| &*def.description));
	registry.set_struct_name_property(owner, identifier);

	let base = read_only(
		registry,
		owner,
		"base",
		PropertyType::Pointer,
		Accessors::default().with_get(|access, ptr| {
			let Target::Struct(id) = ptr.target else {
				return None;
			};
			let base = access.registry.struct_def(id)?.base;
			Some(Value::Pointer(base.map_or(RnaPointer::NULL, |base| RnaPointer::to_target(access.registry.meta().struct_, Target::Struct(base)))))
		}),
	);
	registry.set_struct_type_id(base, owner);

	let properties = read_only(
		registry,
		owner,
		"properties",
		PropertyType::Collection,
		Accessors::default().with_items(|access, ptr| match ptr.target {
			Target::Struct(id) => property_pointers(access, access.registry.struct_def(id).map_or(&[], |def| def.properties.as_slice())),
			_ => Vec::new(),
		}),
	);
	registry.set_struct_type_id(properties, meta.property);

	let functions = read_only(
		registry,
		owner,
		"functions",
		PropertyType::Collection,
		Accessors::default().with_items(|access, ptr| {
			let Target::Struct(id) = ptr.target else {
				return Vec::new();
			};
			let function = access.registry.meta().function;
			access
				.registry
				.struct_def(id)
				.map(|def| def.functions.iter().map(|func| RnaPointer::to_target(function, Target::Function(*func))).collect())
				.unwrap_or_default()
		}),
	);
	registry.set_struct_type_id(functions, meta.function);
}

fn property_pointers(access: &Access<'_>, ids: &[PropertyId]) -> Vec<RnaPointer> {
	let property = access.registry.meta().property;
	ids.iter().map(|id| RnaPointer::to_target(property, Target::Property(*id))).collect()
}

fn define_property_meta(registry: &mut SchemaRegistry, meta: MetaStructs) {
	let owner = meta.property;
	let field = |f: fn(&crate::rna::PropertyDef) -> &str| {
		Accessors::default().with_get(move |access: &Access<'_>, ptr: &RnaPointer| match ptr.target {
			Target::Property(id) => text(f(access.registry.property(id)?)),
			_ => None,
		})
	};
	let identifier = read_only(registry, owner, "identifier", PropertyType::String, field(|def| &*def.identifier));
	read_only(registry, owner, "name", PropertyType::String, field(|def| &*def.name));
	read_only(registry, owner, "description", PropertyType::String, field(|def| &*def.description));
	registry.set_struct_name_property(owner, identifier);

	let ty = read_only(
		registry,
		owner,
		"type",
		PropertyType::Enum,
		Accessors::default().with_get(|access, ptr| {
			let Target::Property(id) = ptr.target else {
				return None;
			};
			let ty = access.registry.property(id)?.property_type();
			PROPERTY_TYPE_ITEMS.iter().position(|(item, _)| *item == ty).map(|index| Value::Enum(index as i32))
		}),
	);
	let items = PROPERTY_TYPE_ITEMS
		.iter()
		.enumerate()
		.map(|(index, (ty, identifier))| EnumItem::new(index as i32, identifier, ty.as_str()))
		.collect();
	registry.set_enum_items(ty, items);

	let flag = |f: fn(&crate::rna::PropertyDef) -> bool| {
		Accessors::default().with_get(move |access: &Access<'_>, ptr: &RnaPointer| match ptr.target {
			Target::Property(id) => Some(Value::Bool(f(access.registry.property(id)?))),
			_ => None,
		})
	};
	read_only(registry, owner, "is_readonly", PropertyType::Boolean, flag(|def| !def.is_editable()));
	read_only(registry, owner, "is_hidden", PropertyType::Boolean, flag(|def| def.flag.contains(PropFlag::HIDDEN)));
	read_only(registry, owner, "is_required", PropertyType::Boolean, flag(|def| def.flag.contains(PropFlag::REQUIRED)));
	read_only(registry, owner, "is_runtime", PropertyType::Boolean, flag(|def| def.internal.contains(PropInternal::RUNTIME)));

	read_only(
		registry,
		owner,
		"array_length",
		PropertyType::Int,
		Accessors::default().with_get(|access, ptr| match ptr.target {
			Target::Property(id) => Some(Value::Int(access.registry.property(id)?.array_length as i32)),
			_ => None,
		}),
	);

	let fixed_type = read_only(
		registry,
		owner,
		"fixed_type",
		PropertyType::Pointer,
		Accessors::default().with_get(|access, ptr| {
			let Target::Property(id) = ptr.target else {
				return None;
			};
			let target = access.registry.property(id)?.kind.struct_ref().and_then(|target| target.id());
			let meta = access.registry.meta().struct_;
			Some(Value::Pointer(target.map_or(RnaPointer::NULL, |target| RnaPointer::to_target(meta, Target::Struct(target)))))
		}),
	);
	registry.set_struct_type_id(fixed_type, meta.struct_);

	let enum_items = read_only(
		registry,
		owner,
		"enum_items",
		PropertyType::Collection,
		Accessors::default().with_items(|access, ptr| {
			let Target::Property(id) = ptr.target else {
				return Vec::new();
			};
			let enum_item = access.registry.meta().enum_item;
			match access.registry.property(id).map(|def| &def.kind) {
				Some(crate::rna::PropertyKind::Enum(info)) => (0..info.items.len() as u32)
					.filter(|index| !info.items[*index as usize].is_separator())
					.map(|index| RnaPointer::to_target(enum_item, Target::EnumItem(id, index)))
					.collect(),
				_ => Vec::new(),
			}
		}),
	);
	registry.set_struct_type_id(enum_items, meta.enum_item);
}

fn define_function_meta(registry: &mut SchemaRegistry, meta: MetaStructs) {
	let owner = meta.function;
	let identifier = read_only(
		registry,
		owner,
		"identifier",
		PropertyType::String,
		Accessors::default().with_get(|access, ptr| match ptr.target {
			Target::Function(id) => text(&access.registry.function(id)?.identifier),
			_ => None,
		}),
	);
	read_only(
		registry,
		owner,
		"description",
		PropertyType::String,
		Accessors::default().with_get(|access, ptr| match ptr.target {
			Target::Function(id) => text(&access.registry.function(id)?.description),
			_ => None,
		}),
	);
	registry.set_struct_name_property(owner, identifier);

	read_only(
		registry,
		owner,
		"use_self",
		PropertyType::Boolean,
		Accessors::default().with_get(|access, ptr| match ptr.target {
			Target::Function(id) => Some(Value::Bool(!access.registry.function(id)?.flag.contains(crate::rna::FuncFlag::NO_SELF))),
			_ => None,
		}),
	);

	let parameters = read_only(
		registry,
		owner,
		"parameters",
		PropertyType::Collection,
		Accessors::default().with_items(|access, ptr| match ptr.target {
			Target::Function(id) => property_pointers(access, access.registry.function(id).map_or(&[], |def| def.parameters.as_slice())),
			_ => Vec::new(),
		}),
	);
	registry.set_struct_type_id(parameters, meta.property);
}

fn enum_item<'a>(access: &Access<'a>, ptr: &RnaPointer) -> Option<&'a EnumItem> {
	let Target::EnumItem(id, index) = ptr.target else {
		return None;
	};
	match &access.registry.property(id)?.kind {
		crate::rna::PropertyKind::Enum(info) => info.items.get(index as usize),
		_ => None,
	}
}

fn define_enum_item_meta(registry: &mut SchemaRegistry, meta: MetaStructs) {
	let owner = meta.enum_item;
	let identifier = read_only(
		registry,
		owner,
		"identifier",
		PropertyType::String,
		Accessors::default().with_get(|access, ptr| text(&enum_item(access, ptr)?.identifier)),
	);
	read_only(
		registry,
		owner,
		"name",
		PropertyType::String,
		Accessors::default().with_get(|access, ptr| text(&enum_item(access, ptr)?.name)),
	);
	read_only(
		registry,
		owner,
		"description",
		PropertyType::String,
		Accessors::default().with_get(|access, ptr| text(&enum_item(access, ptr)?.description)),
	);
	read_only(
		registry,
		owner,
		"value",
		PropertyType::Int,
		Accessors::default().with_get(|access, ptr| Some(Value::Int(enum_item(access, ptr)?.value))),
	);
	registry.set_struct_name_property(owner, identifier);
}

impl SchemaRegistry {
	/// Add `rna_properties` and `rna_type` to a root struct.
	pub(crate) fn add_builtin_properties(&mut self, id: StructId) {
		let meta = self.meta;
		if self.structs.get(meta.property).is_none() || self.structs.get(meta.struct_).is_none() {
			return;
		}
		if self.own_property(Container::Struct(id), "rna_properties").is_some() {
			return;
		}

		let properties = self.define_property(id, "rna_properties", PropertyType::Collection, PropertySubtype::None);
		self.set_ui_text(properties, "Properties", "Properties of this struct");
		self.clear_flag(properties, PropFlag::EDITABLE | PropFlag::ANIMATABLE);
		self.set_struct_type_id(properties, meta.property);
		self.set_accessors(
			properties,
			Accessors::default().with_items(|access, ptr| {
				let Some(struct_type) = access.registry.refine_struct(access.heap, ptr).or(ptr.struct_type) else {
					return Vec::new();
				};
				let ids: Vec<PropertyId> = access.registry.properties_of(struct_type, false).collect();
				property_pointers(access, &ids)
			}),
		);
		if let Some(def) = self.properties.get_mut(properties) {
			def.internal |= PropInternal::BUILTIN;
		}

		let rna_type = self.define_property(id, "rna_type", PropertyType::Pointer, PropertySubtype::None);
		self.set_ui_text(rna_type, "RNA", "Struct definition of this data");
		self.set_flag(rna_type, PropFlag::HIDDEN | PropFlag::NEVER_NULL);
		self.set_struct_type_id(rna_type, meta.struct_);
		self.set_accessors(
			rna_type,
			Accessors::default().with_get(|access, ptr| {
				let struct_type = access.registry.refine_struct(access.heap, ptr)?;
				Some(Value::Pointer(RnaPointer::to_target(access.registry.meta().struct_, Target::Struct(struct_type))))
			}),
		);
	}
}
