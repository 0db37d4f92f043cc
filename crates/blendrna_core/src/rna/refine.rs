use std::sync::Arc;

use crate::dna::{FieldBinding, Heap, resolve_binding};
use crate::rna::{Access, DefinitionError, Hook, RnaPointer, SchemaRegistry, StructId, StructRef, field_address};

/// Picks the concrete struct of an instance.
pub type RefineFn = dyn Fn(&Access<'_>, &RnaPointer) -> Option<StructId> + Send + Sync;

/// Dynamic type resolution of a struct's instances.
#[derive(Debug, Clone)]
pub enum Refine {
	/// Integer member whose value selects the concrete struct.
	Discriminant {
		/// Discriminant member.
		field: FieldBinding,
		/// Value to struct table; unlisted values keep the input struct.
		variants: Vec<(i64, StructRef)>,
	},
	/// Hand-written resolution.
	Custom(Hook<RefineFn>),
}

impl Refine {
	fn resolve(&self, access: &Access<'_>, ptr: &RnaPointer) -> Option<StructId> {
		match self {
			Self::Custom(f) => f(access, ptr),
			Self::Discriminant { field, variants } => {
				let primitive = field.primitive?;
				let addr = field_address(access.heap, ptr.addr()?, field)?;
				let value = primitive.read_int(access.heap.bytes(addr, field.elem_size)?)?;
				variants.iter().find(|(key, _)| *key == value).and_then(|(_, target)| match target {
					StructRef::Resolved(id) => Some(*id),
					StructRef::Named(name) => access.registry.find_struct(name),
				})
			}
		}
	}
}

impl SchemaRegistry {
	/// Refine instances through the integer member at `path` of the struct's layout struct.
	///
	/// Derived structs inherit the table, so refining an already refined pointer is a no-op.
	pub fn set_refine_discriminant(&mut self, id: StructId, path: &str, variants: &[(i64, &str)]) {
		let struct_name = self.struct_identifier(id).to_owned();
		let field = match (self.layout(), self.structs.get(id).and_then(|def| def.sdna.as_deref())) {
			(None, _) => Err(DefinitionError::NoLayoutTable { context: struct_name }),
			(Some(_), None) => Err(DefinitionError::LayoutStructNotFound { struct_name }),
			(Some(layout), Some(sdna)) => resolve_binding(layout, sdna, path)
				.filter(|field| field.pointer_level == 0 && field.array_length == 0 && field.primitive.is_some_and(|primitive| !primitive.is_float()))
				.ok_or(DefinitionError::RefineDiscriminant {
					struct_name,
					path: path.to_owned(),
				}),
		};
		let field = match field {
			Ok(field) => field,
			Err(error) => return self.report(error),
		};
		let variants = variants
			.iter()
			.map(|(value, name)| {
				let target = match self.find_struct(name) {
					Some(found) => StructRef::Resolved(found),
					None => StructRef::Named((*name).into()),
				};
				(*value, target)
			})
			.collect();
		self.edit_struct(id, |def| {
			def.refine = Some(Refine::Discriminant { field, variants });
			Ok(())
		});
	}

	/// Refine instances through a callback.
	pub fn set_refine_func(&mut self, id: StructId, f: impl Fn(&Access<'_>, &RnaPointer) -> Option<StructId> + Send + Sync + 'static) {
		let hook = Hook(Arc::new(f) as Arc<RefineFn>);
		self.edit_struct(id, |def| {
			def.refine = Some(Refine::Custom(hook));
			Ok(())
		});
	}

	/// Most specific struct describing the instance `ptr` points at.
	///
	/// Falls back to `ptr`'s struct when no refinement applies.
	pub fn refine_struct(&self, heap: &Heap, ptr: &RnaPointer) -> Option<StructId> {
		let mut current = ptr.struct_type?;
		let access = Access { registry: self, heap };
		for _ in 0..=self.struct_order.len() {
			let Some(refine) = self.structs.get(current).and_then(|def| def.refine.as_ref()) else {
				break;
			};
			let probe = RnaPointer { struct_type: Some(current), ..*ptr };
			match refine.resolve(&access, &probe) {
				Some(next) if next != current && self.structs.get(next).is_some() => current = next,
				_ => break,
			}
		}
		Some(current)
	}

	/// `ptr` retyped to its most specific struct.
	pub fn refine(&self, heap: &Heap, ptr: &RnaPointer) -> RnaPointer {
		RnaPointer {
			struct_type: self.refine_struct(heap, ptr).or(ptr.struct_type),
			..*ptr
		}
	}
}
