//! Symbol table: an arena of types, methods, fields, properties, locals,
//! parameters and labels addressed by typed ids.
//!
//! The table is shared by the legality pass (read-only) and the lowering
//! pass, which interns constructed types and synthesizes temporaries.
//!
//! # Architecture
//!
//! ```text
//! SymbolTable
//!     ├── types        Vec<TypeDef>        (TypeId)
//!     ├── methods      Vec<MethodDef>      (MethodId)
//!     ├── fields       Vec<FieldDef>       (FieldId)
//!     ├── properties   Vec<PropertyDef>    (PropertyId)
//!     ├── locals       Vec<LocalDef>       (LocalId)
//!     ├── parameters   Vec<ParamDef>       (ParamId)
//!     ├── labels       Vec<LabelDef>       (LabelId)
//!     └── indexes      TypeHash -> id      (name lookup)
//! ```

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use std::fmt;

use crate::type_hash::TypeHash;
use crate::types::{SpecialType, TypeDef, TypeFlags, TypeId, TypeKind};
use crate::well_known::WellKnownType;

macro_rules! symbol_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

symbol_id!(
    /// Arena index of a method, constructor, accessor, lambda or local function.
    MethodId
);
symbol_id!(FieldId);
symbol_id!(PropertyId);
symbol_id!(LocalId);
symbol_id!(ParamId);
symbol_id!(LabelId);

/// How a parameter, local or return value is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
    In,
}

/// What kind of method a [`MethodDef`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Ordinary,
    Constructor,
    PropertyGet,
    PropertySet,
    UserDefinedOperator,
    Conversion,
    DelegateInvoke,
    /// Lambda or anonymous method.
    Lambda,
    LocalFunction,
    /// Expression-tree factory method.
    Factory,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u16 {
        const STATIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const VIRTUAL = 1 << 2;
        const EXTENSION = 1 << 3;
        const ASYNC = 1 << 4;
        /// A partial method with no implementing declaration.
        const OMITTED_PARTIAL = 1 << 5;
        /// `static` local function or lambda; may not capture.
        const STATIC_LOCAL_FUNCTION = 1 << 6;
        const VARARG = 1 << 7;
    }
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub containing_type: Option<TypeId>,
    pub params: Vec<ParamId>,
    pub return_type: TypeId,
    pub return_ref_kind: RefKind,
    pub kind: MethodKind,
    pub flags: MethodFlags,
    pub generic_arity: u8,
    /// Enclosing function for lambdas and local functions.
    pub owner: Option<MethodId>,
}

impl MethodDef {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeId,
    pub ref_kind: RefKind,
    pub is_optional: bool,
    /// `params T[]` parameter.
    pub is_params: bool,
    pub ordinal: usize,
    pub owner: Option<MethodId>,
}

#[derive(Debug, Clone)]
pub struct LocalDef {
    pub name: String,
    pub ty: TypeId,
    pub ref_kind: RefKind,
    pub is_const: bool,
    /// Temporaries introduced by lowering rather than by source.
    pub synthesized: bool,
    pub owner: Option<MethodId>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub containing_type: TypeId,
    pub ty: TypeId,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub containing_type: TypeId,
    pub ty: TypeId,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,
    /// Indexer parameters; empty for ordinary properties.
    pub params: Vec<ParamId>,
    pub ref_kind: RefKind,
    pub is_static: bool,
    pub is_abstract: bool,
}

impl PropertyDef {
    #[inline]
    pub fn is_indexer(&self) -> bool {
        !self.params.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LabelDef {
    pub name: String,
}

/// Result of probing for an optional type by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeProbe {
    Present(TypeId),
    Absent,
    /// The name falls under a namespace whose defining reference could not
    /// be loaded.
    Unresolved,
}

/// Arena of all symbols visible to the passes.
#[derive(Debug)]
pub struct SymbolTable {
    types: Vec<TypeDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    locals: Vec<LocalDef>,
    params: Vec<ParamDef>,
    labels: Vec<LabelDef>,

    special: Vec<TypeId>,
    dynamic: TypeId,
    error: TypeId,
    type_index: FxHashMap<TypeHash, TypeId>,
    method_index: FxHashMap<(TypeId, TypeHash), Vec<MethodId>>,
    field_index: FxHashMap<(TypeId, TypeHash), FieldId>,
    property_index: FxHashMap<(TypeId, TypeHash), PropertyId>,

    arrays: FxHashMap<(TypeId, u32), TypeId>,
    nullables: FxHashMap<TypeId, TypeId>,
    expression_trees: FxHashMap<TypeId, TypeId>,
    pointers: FxHashMap<TypeId, TypeId>,

    unresolved_namespaces: Vec<String>,
    synthesized_count: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table containing the special types, `dynamic` and the error type.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            locals: Vec::new(),
            params: Vec::new(),
            labels: Vec::new(),
            special: Vec::with_capacity(SpecialType::ALL.len()),
            dynamic: TypeId(0),
            error: TypeId(0),
            type_index: FxHashMap::default(),
            method_index: FxHashMap::default(),
            field_index: FxHashMap::default(),
            property_index: FxHashMap::default(),
            arrays: FxHashMap::default(),
            nullables: FxHashMap::default(),
            expression_trees: FxHashMap::default(),
            pointers: FxHashMap::default(),
            unresolved_namespaces: Vec::new(),
            synthesized_count: 0,
        };

        for special in SpecialType::ALL {
            let id = table.declare_type(special.name(), TypeKind::Special(special), TypeFlags::empty(), None);
            table.special.push(id);
        }
        // Object is declared after the types that name it as a base.
        let object = table.special(SpecialType::Object);
        for special in SpecialType::ALL {
            if !matches!(special, SpecialType::Object | SpecialType::Void) {
                let id = table.special(special);
                table.types[id.index()].base = Some(object);
            }
        }
        table.dynamic = table.declare_type("dynamic", TypeKind::Dynamic, TypeFlags::empty(), Some(object));
        table.error = table.declare_type("?", TypeKind::Error, TypeFlags::empty(), None);
        table
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Declare a named type.
    pub fn declare_type(
        &mut self,
        name: impl Into<String>,
        kind: TypeKind,
        flags: TypeFlags,
        base: Option<TypeId>,
    ) -> TypeId {
        let name = name.into();
        let id = TypeId(self.types.len() as u32);
        self.type_index.insert(TypeHash::from_name(&name), id);
        self.types.push(TypeDef { name, kind, flags, base });
        id
    }

    /// Declare a class deriving from `object` (or `base` when given).
    pub fn declare_class(&mut self, name: impl Into<String>, base: Option<TypeId>) -> TypeId {
        let base = base.or_else(|| Some(self.special(SpecialType::Object)));
        self.declare_type(name, TypeKind::Class, TypeFlags::empty(), base)
    }

    pub fn declare_struct(&mut self, name: impl Into<String>, flags: TypeFlags) -> TypeId {
        let object = self.special(SpecialType::Object);
        self.declare_type(name, TypeKind::Struct, flags | TypeFlags::VALUE_TYPE, Some(object))
    }

    pub fn declare_enum(&mut self, name: impl Into<String>, underlying: SpecialType) -> TypeId {
        let underlying = self.special(underlying);
        let object = self.special(SpecialType::Object);
        self.declare_type(name, TypeKind::Enum { underlying }, TypeFlags::VALUE_TYPE, Some(object))
    }

    /// Declare a delegate type together with its `Invoke` method.
    pub fn declare_delegate(
        &mut self,
        name: impl Into<String>,
        return_type: TypeId,
        params: &[(&str, TypeId)],
    ) -> TypeId {
        let object = self.special(SpecialType::Object);
        let delegate = self.declare_type(name, TypeKind::Delegate { invoke: None }, TypeFlags::empty(), Some(object));
        let invoke = self.declare_method("Invoke", Some(delegate), return_type, MethodKind::DelegateInvoke, MethodFlags::empty());
        for (param_name, ty) in params {
            self.add_parameter(invoke, *param_name, *ty);
        }
        self.types[delegate.index()].kind = TypeKind::Delegate { invoke: Some(invoke) };
        delegate
    }

    #[inline]
    pub fn special(&self, special: SpecialType) -> TypeId {
        self.special[special as usize]
    }

    #[inline]
    pub fn dynamic_type(&self) -> TypeId {
        self.dynamic
    }

    #[inline]
    pub fn error_type(&self) -> TypeId {
        self.error
    }

    #[inline]
    pub fn ty(&self, id: TypeId) -> &TypeDef {
        &self.types[id.index()]
    }

    #[inline]
    pub fn type_name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(&TypeHash::from_name(name)).copied()
    }

    #[inline]
    pub fn well_known(&self, ty: WellKnownType) -> Option<TypeId> {
        self.lookup_type(ty.name())
    }

    /// Record that the reference defining `namespace` failed to load.
    pub fn mark_unresolved_namespace(&mut self, namespace: impl Into<String>) {
        self.unresolved_namespaces.push(namespace.into());
    }

    /// Look up an optional type, distinguishing "not there" from "could not tell".
    pub fn probe_type(&self, name: &str) -> TypeProbe {
        if let Some(id) = self.lookup_type(name) {
            return TypeProbe::Present(id);
        }
        let unresolved = self.unresolved_namespaces.iter().any(|ns| {
            name.strip_prefix(ns.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        });
        if unresolved { TypeProbe::Unresolved } else { TypeProbe::Absent }
    }

    /// The single-dimensional or multi-dimensional array of `element`.
    pub fn array_of(&mut self, element: TypeId, rank: u32) -> TypeId {
        if let Some(&id) = self.arrays.get(&(element, rank)) {
            return id;
        }
        let commas = ",".repeat(rank.saturating_sub(1) as usize);
        let name = format!("{}[{}]", self.type_name(element), commas);
        let object = self.special(SpecialType::Object);
        let id = self.declare_type(name, TypeKind::Array { element, rank }, TypeFlags::empty(), Some(object));
        self.arrays.insert((element, rank), id);
        id
    }

    pub fn nullable_of(&mut self, underlying: TypeId) -> TypeId {
        if self.is_nullable(underlying) {
            return underlying;
        }
        if let Some(&id) = self.nullables.get(&underlying) {
            return id;
        }
        let name = format!("{}?", self.type_name(underlying));
        let id = self.declare_type(name, TypeKind::Nullable { underlying }, TypeFlags::VALUE_TYPE, None);
        self.nullables.insert(underlying, id);
        id
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        if let Some(&id) = self.pointers.get(&pointee) {
            return id;
        }
        let name = format!("{}*", self.type_name(pointee));
        let id = self.declare_type(name, TypeKind::Pointer { pointee }, TypeFlags::VALUE_TYPE, None);
        self.pointers.insert(pointee, id);
        id
    }

    /// `Expression<D>`; derives from `LambdaExpression` when that type exists.
    pub fn expression_tree_of(&mut self, delegate: TypeId) -> TypeId {
        if let Some(&id) = self.expression_trees.get(&delegate) {
            return id;
        }
        let name = format!("System.Linq.Expressions.Expression<{}>", self.type_name(delegate));
        let base = self.lookup_type("System.Linq.Expressions.LambdaExpression");
        let id = self.declare_type(name, TypeKind::ExpressionTree { delegate }, TypeFlags::empty(), base);
        self.expression_trees.insert(delegate, id);
        id
    }

    pub fn is_nullable(&self, id: TypeId) -> bool {
        matches!(self.ty(id).kind, TypeKind::Nullable { .. })
    }

    pub fn nullable_underlying(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id).kind {
            TypeKind::Nullable { underlying } => Some(underlying),
            _ => None,
        }
    }

    /// `T` for `T?`, otherwise the type itself.
    pub fn strip_nullable(&self, id: TypeId) -> TypeId {
        self.nullable_underlying(id).unwrap_or(id)
    }

    pub fn enum_underlying(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id).kind {
            TypeKind::Enum { underlying } => Some(underlying),
            _ => None,
        }
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        self.enum_underlying(id).is_some()
    }

    pub fn special_type(&self, id: TypeId) -> Option<SpecialType> {
        self.ty(id).special()
    }

    pub fn is_special(&self, id: TypeId, special: SpecialType) -> bool {
        self.special_type(id) == Some(special)
    }

    pub fn is_dynamic(&self, id: TypeId) -> bool {
        matches!(self.ty(id).kind, TypeKind::Dynamic)
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.ty(id).kind, TypeKind::Pointer { .. })
    }

    pub fn is_ref_like(&self, id: TypeId) -> bool {
        self.ty(id).flags.contains(TypeFlags::REF_LIKE)
    }

    pub fn is_value_type(&self, id: TypeId) -> bool {
        self.ty(id).is_value_type()
    }

    pub fn is_reference_type(&self, id: TypeId) -> bool {
        self.ty(id).is_reference_type()
    }

    pub fn is_delegate(&self, id: TypeId) -> bool {
        matches!(self.ty(id).kind, TypeKind::Delegate { .. })
    }

    pub fn is_expression_tree(&self, id: TypeId) -> bool {
        matches!(self.ty(id).kind, TypeKind::ExpressionTree { .. })
    }

    /// `D` for `Expression<D>`.
    pub fn expression_tree_delegate(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id).kind {
            TypeKind::ExpressionTree { delegate } => Some(delegate),
            _ => None,
        }
    }

    pub fn delegate_invoke(&self, id: TypeId) -> Option<MethodId> {
        match self.ty(id).kind {
            TypeKind::Delegate { invoke } => invoke,
            _ => None,
        }
    }

    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id).kind {
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn array_rank(&self, id: TypeId) -> Option<u32> {
        match self.ty(id).kind {
            TypeKind::Array { rank, .. } => Some(rank),
            _ => None,
        }
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.ty(id).kind, TypeKind::Error)
    }

    /// Whether `derived` is `base` or inherits from it.
    pub fn derives_from(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = Some(derived);
        while let Some(ty) = current {
            if ty == base {
                return true;
            }
            current = self.ty(ty).base;
        }
        false
    }

    /// Whether a value of type `from` can be passed where `to` is expected
    /// without an explicit conversion node.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to || self.is_error(from) || self.is_error(to) {
            return true;
        }
        if self.is_special(to, SpecialType::Object) {
            return true;
        }
        if self.derives_from(from, to) {
            return true;
        }
        match (&self.ty(from).kind, &self.ty(to).kind) {
            (
                TypeKind::Array { element: fe, rank: fr },
                TypeKind::Array { element: te, rank: tr },
            ) => fr == tr && self.is_reference_type(*fe) && self.is_assignable(*fe, *te),
            _ => false,
        }
    }

    // =========================================================================
    // Methods and parameters
    // =========================================================================

    pub fn declare_method(
        &mut self,
        name: impl Into<String>,
        containing_type: Option<TypeId>,
        return_type: TypeId,
        kind: MethodKind,
        flags: MethodFlags,
    ) -> MethodId {
        let name = name.into();
        let id = MethodId(self.methods.len() as u32);
        if let Some(owner) = containing_type {
            self.method_index
                .entry((owner, TypeHash::from_member(&name)))
                .or_default()
                .push(id);
        }
        self.methods.push(MethodDef {
            name,
            containing_type,
            params: Vec::new(),
            return_type,
            return_ref_kind: RefKind::None,
            kind,
            flags,
            generic_arity: 0,
            owner: None,
        });
        id
    }

    pub fn add_parameter(&mut self, method: MethodId, name: impl Into<String>, ty: TypeId) -> ParamId {
        let id = ParamId(self.params.len() as u32);
        let ordinal = self.methods[method.index()].params.len();
        self.params.push(ParamDef {
            name: name.into(),
            ty,
            ref_kind: RefKind::None,
            is_optional: false,
            is_params: false,
            ordinal,
            owner: Some(method),
        });
        self.methods[method.index()].params.push(id);
        id
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    #[inline]
    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDef {
        &mut self.methods[id.index()]
    }

    #[inline]
    pub fn param(&self, id: ParamId) -> &ParamDef {
        &self.params[id.index()]
    }

    #[inline]
    pub fn param_mut(&mut self, id: ParamId) -> &mut ParamDef {
        &mut self.params[id.index()]
    }

    /// Overloads named `name` declared directly on `ty`.
    pub fn find_methods(&self, ty: TypeId, name: &str) -> &[MethodId] {
        self.method_index
            .get(&(ty, TypeHash::from_member(name)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The type of parameter `ordinal` of `method`.
    pub fn param_type(&self, method: MethodId, ordinal: usize) -> Option<TypeId> {
        self.method(method).params.get(ordinal).map(|p| self.param(*p).ty)
    }

    // =========================================================================
    // Fields and properties
    // =========================================================================

    pub fn declare_field(
        &mut self,
        containing_type: TypeId,
        name: impl Into<String>,
        ty: TypeId,
        is_static: bool,
    ) -> FieldId {
        let name = name.into();
        let id = FieldId(self.fields.len() as u32);
        self.field_index
            .insert((containing_type, TypeHash::from_member(&name)), id);
        self.fields.push(FieldDef { name, containing_type, ty, is_static });
        id
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    pub fn find_field(&self, ty: TypeId, name: &str) -> Option<FieldId> {
        self.field_index.get(&(ty, TypeHash::from_member(name))).copied()
    }

    /// Declare a property with a getter and, when `writable`, a setter.
    pub fn declare_property(
        &mut self,
        containing_type: TypeId,
        name: impl Into<String>,
        ty: TypeId,
        writable: bool,
    ) -> PropertyId {
        let name = name.into();
        let void = self.special(SpecialType::Void);
        let getter = self.declare_method(format!("get_{name}"), Some(containing_type), ty, MethodKind::PropertyGet, MethodFlags::empty());
        let setter = writable.then(|| {
            let setter = self.declare_method(format!("set_{name}"), Some(containing_type), void, MethodKind::PropertySet, MethodFlags::empty());
            self.add_parameter(setter, "value", ty);
            setter
        });
        let id = PropertyId(self.properties.len() as u32);
        self.property_index
            .insert((containing_type, TypeHash::from_member(&name)), id);
        self.properties.push(PropertyDef {
            name,
            containing_type,
            ty,
            getter: Some(getter),
            setter,
            params: Vec::new(),
            ref_kind: RefKind::None,
            is_static: false,
            is_abstract: false,
        });
        id
    }

    /// Declare an indexer (`this[...]`) with the given parameters.
    pub fn declare_indexer(
        &mut self,
        containing_type: TypeId,
        ty: TypeId,
        params: &[(&str, TypeId)],
        writable: bool,
    ) -> PropertyId {
        let id = self.declare_property(containing_type, "Item", ty, writable);
        let getter = self.properties[id.index()].getter;
        let setter = self.properties[id.index()].setter;
        let mut indexer_params = Vec::with_capacity(params.len());
        for (name, param_ty) in params {
            if let Some(getter) = getter {
                indexer_params.push(self.add_parameter(getter, *name, *param_ty));
            }
        }
        if let Some(setter) = setter {
            // Index parameters come first; the value parameter moves to the end.
            let value = self.methods[setter.index()].params.remove(0);
            for (name, param_ty) in params {
                self.add_parameter(setter, *name, *param_ty);
            }
            self.methods[setter.index()].params.push(value);
            let count = self.methods[setter.index()].params.len();
            for ordinal in 0..count {
                let param = self.methods[setter.index()].params[ordinal];
                self.params[param.index()].ordinal = ordinal;
            }
        }
        self.properties[id.index()].params = indexer_params;
        id
    }

    #[inline]
    pub fn property(&self, id: PropertyId) -> &PropertyDef {
        &self.properties[id.index()]
    }

    #[inline]
    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyDef {
        &mut self.properties[id.index()]
    }

    pub fn find_property(&self, ty: TypeId, name: &str) -> Option<PropertyId> {
        self.property_index.get(&(ty, TypeHash::from_member(name))).copied()
    }

    // =========================================================================
    // Locals and labels
    // =========================================================================

    pub fn declare_local(&mut self, name: impl Into<String>, ty: TypeId, owner: Option<MethodId>) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(LocalDef {
            name: name.into(),
            ty,
            ref_kind: RefKind::None,
            is_const: false,
            synthesized: false,
            owner,
        });
        id
    }

    /// Create a compiler temporary; names are unique within the table.
    pub fn synthesize_local(&mut self, ty: TypeId, hint: &str) -> LocalId {
        self.synthesized_count += 1;
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(LocalDef {
            name: format!("<{hint}>{}", self.synthesized_count),
            ty,
            ref_kind: RefKind::None,
            is_const: false,
            synthesized: true,
            owner: None,
        });
        id
    }

    /// Create a parameter owned by no method, for synthesized lambdas.
    pub fn synthesize_parameter(&mut self, ty: TypeId, name: &str) -> ParamId {
        let id = ParamId(self.params.len() as u32);
        self.params.push(ParamDef {
            name: name.to_string(),
            ty,
            ref_kind: RefKind::None,
            is_optional: false,
            is_params: false,
            ordinal: 0,
            owner: None,
        });
        id
    }

    #[inline]
    pub fn local(&self, id: LocalId) -> &LocalDef {
        &self.locals[id.index()]
    }

    #[inline]
    pub fn local_mut(&mut self, id: LocalId) -> &mut LocalDef {
        &mut self.locals[id.index()]
    }

    pub fn declare_label(&mut self, name: impl Into<String>) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(LabelDef { name: name.into() });
        id
    }

    #[inline]
    pub fn label(&self, id: LabelId) -> &LabelDef {
        &self.labels[id.index()]
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
