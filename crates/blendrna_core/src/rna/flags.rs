bitflags::bitflags! {
	/// Public property flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PropFlag: u32 {
		/// Value can be written through the runtime API.
		const EDITABLE = 1 << 0;
		/// Value can be keyframed.
		const ANIMATABLE = 1 << 1;
		/// Function parameter must be supplied by the caller.
		const REQUIRED = 1 << 2;
		/// Not listed in user-facing introspection.
		const HIDDEN = 1 << 3;
		/// Pointer target is a reference-counted identified object.
		const ID_REFCOUNT = 1 << 4;
		/// Pointer may not be set to null.
		const NEVER_NULL = 1 << 5;
		/// Enum values combine as bit flags.
		const ENUM_FLAG = 1 << 6;
		/// Value is stored as an ad hoc per-instance entry instead of a layout member.
		const IDPROPERTY = 1 << 7;
	}
}

bitflags::bitflags! {
	/// Flags managed by the registry itself.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PropInternal: u8 {
		/// Built-in reflection property (`rna_properties`).
		const BUILTIN = 1 << 0;
		/// Added after generation.
		const RUNTIME = 1 << 1;
		/// Eligible for direct memory reads.
		const RAW_ACCESS = 1 << 2;
		/// Raw access covers a contiguous array.
		const RAW_ARRAY = 1 << 3;
	}
}

bitflags::bitflags! {
	/// Flags on function parameters.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ParamFlag: u8 {
		/// Caller must set the parameter before calling.
		const REQUIRED = 1 << 0;
		/// Written by the call target.
		const OUTPUT = 1 << 1;
		/// Holds the return value.
		const RETURN = 1 << 2;
	}
}

bitflags::bitflags! {
	/// Struct flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct StructFlag: u16 {
		/// Instances are identified objects that own their data.
		const ID = 1 << 0;
		/// Identified objects are reference counted.
		const ID_REFCOUNT = 1 << 1;
		/// Defined at run time.
		const RUNTIME = 1 << 2;
		/// Accessors have been generated.
		const GENERATED = 1 << 3;
		/// Instances cannot carry ad hoc properties.
		const NO_IDPROPERTIES = 1 << 4;
	}
}

bitflags::bitflags! {
	/// Function flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct FuncFlag: u16 {
		/// Called without an implicit receiver.
		const NO_SELF = 1 << 0;
		/// Receives the identified object owning the receiver.
		const USE_SELF_ID = 1 << 1;
		/// Receives the ambient call context.
		const USE_CONTEXT = 1 << 2;
		/// Receives a report sink.
		const USE_REPORTS = 1 << 3;
		/// Implemented by registered subtypes.
		const REGISTER = 1 << 4;
		/// Registered subtypes may omit the implementation.
		const REGISTER_OPTIONAL = (1 << 5) | (1 << 4);
		/// Defined at run time.
		const RUNTIME = 1 << 6;
	}
}
