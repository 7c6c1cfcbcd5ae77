//! Thread-safe in-memory type host.
//!
//! `TypeStore` is the reference implementation of the Type Model
//! capabilities. It plays the role a runtime's reflection facility plays for
//! a real host: declarations are loaded into it (possibly after analyzers are
//! already in use), constructed types and arrays are interned on demand.
//!
//! ## Usage
//!
//! ```ignore
//! let store = TypeStore::new();
//! let list = store.declare(TypeDecl::class("List").with_params(&["T"]));
//! let t = store.param(list, 0).expect("List has T");
//! store.add_interface(list, store.make_generic_type(ienumerable, &[t])?)?;
//! let list_int = store.make_generic_type(list, &[TypeId::INT])?;
//! ```

use crate::error::ModelError;
use crate::format::format_type;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::member::{IndexerInfo, MemberInfo};
use crate::model::{TypeComposition, TypeConstraints, TypeHierarchy, TypeMembers, TypeModel};
use crate::types::{DeclKind, DeclaredType, GenericParam, SpecialConstraints, TypeData, TypeId, TypeList};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Global counter for assigning unique instance IDs to `TypeStore` instances.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Highest supported array rank.
pub const MAX_ARRAY_RANK: u8 = 32;

// =============================================================================
// TypeDecl - declaration builder
// =============================================================================

/// Description of a type to declare.
#[derive(Clone, Debug)]
pub struct TypeDecl {
    name: String,
    kind: DeclKind,
    params: Vec<String>,
    is_abstract: bool,
    has_default_constructor: bool,
}

impl TypeDecl {
    fn new(name: &str, kind: DeclKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            params: Vec::new(),
            is_abstract: false,
            has_default_constructor: kind != DeclKind::Interface,
        }
    }

    /// Reference type with a default constructor.
    pub fn class(name: &str) -> Self {
        Self::new(name, DeclKind::Class)
    }

    /// Value type.
    pub fn value(name: &str) -> Self {
        Self::new(name, DeclKind::Struct)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, DeclKind::Interface)
    }

    pub fn with_params(mut self, names: &[&str]) -> Self {
        self.params = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Only public non-default constructors exist.
    pub fn without_default_constructor(mut self) -> Self {
        self.has_default_constructor = false;
        self
    }
}

// =============================================================================
// TypeStore
// =============================================================================

/// Storage for declared, constructed, parameter and array types.
///
/// Uses `DashMap` so declarations, lookups and on-demand construction can
/// run from multiple threads.
pub struct TypeStore {
    /// Unique instance ID for debugging
    instance_id: u64,
    types: DashMap<TypeId, Arc<TypeData>>,
    by_name: DashMap<Arc<str>, TypeId>,
    constructed: DashMap<(TypeId, TypeList), TypeId>,
    arrays: DashMap<(TypeId, u8), TypeId>,
    /// Single-parameter generic definitions every rank-1 array implements.
    array_interfaces: RwLock<Vec<TypeId>>,
    next_id: AtomicU32,
    generation: AtomicU64,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    /// Create a store holding only the prelude types.
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "TypeStore::new - creating new instance");
        let store = Self {
            instance_id,
            types: DashMap::new(),
            by_name: DashMap::new(),
            constructed: DashMap::new(),
            arrays: DashMap::new(),
            array_interfaces: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
            generation: AtomicU64::new(0),
        };
        store.register_prelude();
        store
    }

    fn register_prelude(&self) {
        // Order must match the TypeId constants.
        let object = self.declare(TypeDecl::class("object"));
        let value_type = self.declare(TypeDecl::class("ValueType").with_abstract(true));
        let array = self.declare(
            TypeDecl::class("Array")
                .with_abstract(true)
                .without_default_constructor(),
        );
        let bool_ty = self.declare(TypeDecl::value("bool"));
        let int_ty = self.declare(TypeDecl::value("int"));
        let long_ty = self.declare(TypeDecl::value("long"));
        let double_ty = self.declare(TypeDecl::value("double"));
        let string_ty = self.declare(TypeDecl::class("string").without_default_constructor());
        debug_assert_eq!(
            [object, value_type, array, bool_ty, int_ty, long_ty, double_ty, string_ty],
            [
                TypeId::OBJECT,
                TypeId::VALUE_TYPE,
                TypeId::ARRAY,
                TypeId::BOOL,
                TypeId::INT,
                TypeId::LONG,
                TypeId::DOUBLE,
                TypeId::STRING
            ]
        );
        if let Some(mut entry) = self.types.get_mut(&TypeId::OBJECT) {
            if let TypeData::Declared(decl) = Arc::make_mut(entry.value_mut()) {
                decl.base = None;
            }
        }
    }

    fn allocate(&self) -> TypeId {
        TypeId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Raw data behind a handle.
    pub fn get(&self, ty: TypeId) -> Option<Arc<TypeData>> {
        self.types.get(&ty).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        self.types.contains_key(&ty)
    }

    /// Number of types, including constructed types and arrays.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a declared type by name.
    pub fn find(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).map(|r| *r.value())
    }

    // -------------------------------------------------------------------------
    // Declaration
    // -------------------------------------------------------------------------

    /// Declare a type and its generic parameters.
    ///
    /// The base type defaults to `OBJECT` for classes and `VALUE_TYPE` for
    /// structs; interfaces have none.
    pub fn declare(&self, decl: TypeDecl) -> TypeId {
        let id = self.allocate();
        let base = match decl.kind {
            DeclKind::Class => Some(TypeId::OBJECT),
            DeclKind::Struct => Some(TypeId::VALUE_TYPE),
            DeclKind::Interface => None,
        };

        let mut params = TypeList::with_capacity(decl.params.len());
        for (position, name) in decl.params.iter().enumerate() {
            let param_id = self.allocate();
            self.types.insert(
                param_id,
                Arc::new(TypeData::Parameter(GenericParam {
                    name: Arc::from(name.as_str()),
                    owner: id,
                    position: position as u32,
                    special: SpecialConstraints::empty(),
                    constraints: Vec::new(),
                })),
            );
            params.push(param_id);
        }

        let name: Arc<str> = Arc::from(decl.name.as_str());
        trace!(
            instance_id = self.instance_id,
            type_id = id.0,
            name = %name,
            kind = ?decl.kind,
            arity = params.len(),
            "TypeStore::declare"
        );
        self.types.insert(
            id,
            Arc::new(TypeData::Declared(DeclaredType {
                name: Arc::clone(&name),
                kind: decl.kind,
                is_abstract: decl.is_abstract,
                has_default_constructor: decl.has_default_constructor,
                base,
                interfaces: Vec::new(),
                params,
                members: Vec::new(),
                indexer: None,
            })),
        );
        self.by_name.insert(name, id);
        self.bump_generation();
        id
    }

    /// Generic parameters of a declared type, in position order.
    pub fn params(&self, ty: TypeId) -> TypeList {
        match self.get(ty).as_deref() {
            Some(TypeData::Declared(decl)) => decl.params.clone(),
            _ => TypeList::new(),
        }
    }

    pub fn param(&self, ty: TypeId, position: usize) -> Option<TypeId> {
        self.params(ty).get(position).copied()
    }

    fn update_declared<F>(&self, ty: TypeId, update: F) -> Result<(), ModelError>
    where
        F: FnOnce(&mut DeclaredType),
    {
        let updated = {
            let mut entry = self.types.get_mut(&ty).ok_or(ModelError::UnknownType(ty))?;
            match Arc::make_mut(entry.value_mut()) {
                TypeData::Declared(decl) => {
                    update(decl);
                    true
                }
                _ => false,
            }
        };
        if !updated {
            return Err(ModelError::UnknownType(ty));
        }
        self.bump_generation();
        Ok(())
    }

    /// Replace the base type of a class.
    pub fn set_base(&self, ty: TypeId, base: TypeId) -> Result<(), ModelError> {
        if !self.contains(base) {
            return Err(ModelError::UnknownType(base));
        }
        self.update_declared(ty, |decl| decl.base = Some(base))
    }

    pub fn add_interface(&self, ty: TypeId, interface: TypeId) -> Result<(), ModelError> {
        if !self.contains(interface) {
            return Err(ModelError::UnknownType(interface));
        }
        self.update_declared(ty, |decl| {
            if !decl.interfaces.contains(&interface) {
                decl.interfaces.push(interface);
            }
        })
    }

    /// Attach a member; returns the stored member with `declaring_type` set.
    pub fn add_member(&self, ty: TypeId, mut member: MemberInfo) -> Result<Arc<MemberInfo>, ModelError> {
        member.declaring_type = ty;
        let member = Arc::new(member);
        let stored = Arc::clone(&member);
        self.update_declared(ty, move |decl| decl.members.push(stored))?;
        Ok(member)
    }

    pub fn set_indexer(&self, ty: TypeId, indexer: IndexerInfo) -> Result<(), ModelError> {
        let indexer = Arc::new(indexer);
        self.update_declared(ty, move |decl| decl.indexer = Some(indexer))
    }

    /// Set special and type constraints of a generic parameter.
    pub fn set_constraints(
        &self,
        param: TypeId,
        special: SpecialConstraints,
        constraints: Vec<TypeId>,
    ) -> Result<(), ModelError> {
        if let Some(&missing) = constraints.iter().find(|c| !self.contains(**c)) {
            return Err(ModelError::UnknownType(missing));
        }
        let updated = {
            let mut entry = self.types.get_mut(&param).ok_or(ModelError::UnknownType(param))?;
            match Arc::make_mut(entry.value_mut()) {
                TypeData::Parameter(info) => {
                    info.special = special;
                    info.constraints = constraints;
                    true
                }
                _ => false,
            }
        };
        if !updated {
            return Err(ModelError::NotGenericParameter(self.display_type(param)));
        }
        self.bump_generation();
        Ok(())
    }

    /// Configure the generic interfaces every rank-1 array implements.
    ///
    /// Each must be a single-parameter generic definition.
    pub fn set_array_interfaces(&self, interfaces: Vec<TypeId>) -> Result<(), ModelError> {
        for &iface in &interfaces {
            if self.params(iface).len() != 1 {
                return Err(ModelError::NotGenericDefinition(self.display_type(iface)));
            }
        }
        match self.array_interfaces.write() {
            Ok(mut guard) => *guard = interfaces,
            Err(e) => *e.into_inner() = interfaces,
        }
        self.bump_generation();
        Ok(())
    }

    fn array_interface_definitions(&self) -> Vec<TypeId> {
        match self.array_interfaces.read() {
            Ok(guard) => guard.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn declared(&self, ty: TypeId) -> Option<Arc<TypeData>> {
        let data = self.get(ty)?;
        match &*data {
            TypeData::Declared(_) => Some(data),
            TypeData::Constructed { definition, .. } => self.get(*definition),
            _ => None,
        }
    }

    /// Substitution from a constructed type's definition parameters to its
    /// arguments. Empty for everything else.
    fn substitution_of(&self, ty: TypeId) -> TypeSubstitution {
        match self.get(ty).as_deref() {
            Some(TypeData::Constructed { definition, args }) => {
                TypeSubstitution::from_args(&self.params(*definition), args)
            }
            _ => TypeSubstitution::new(),
        }
    }

    fn substitute(&self, ty: TypeId, subst: &TypeSubstitution) -> Option<TypeId> {
        match instantiate_type(self, ty, subst) {
            Ok(result) => Some(result),
            Err(err) => {
                debug!(type_id = ty.0, %err, "TypeStore::substitute failed");
                None
            }
        }
    }
}

// =============================================================================
// Capability implementations
// =============================================================================

impl TypeHierarchy for TypeStore {
    fn base_type(&self, ty: TypeId) -> Option<TypeId> {
        let data = self.get(ty)?;
        match &*data {
            TypeData::Declared(decl) => decl.base,
            TypeData::Constructed { definition, .. } => {
                let base = self.declared(*definition)?.as_declared()?.base?;
                self.substitute(base, &self.substitution_of(ty))
            }
            TypeData::Parameter(param) => {
                if param.special.contains(SpecialConstraints::VALUE_TYPE) {
                    return Some(TypeId::VALUE_TYPE);
                }
                let class_constraint = param
                    .constraints
                    .iter()
                    .copied()
                    .find(|&c| !self.is_interface(c));
                Some(class_constraint.unwrap_or(TypeId::OBJECT))
            }
            TypeData::Array { .. } => Some(TypeId::ARRAY),
        }
    }

    fn interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let Some(data) = self.get(ty) else {
            return Vec::new();
        };
        match &*data {
            TypeData::Declared(decl) => decl.interfaces.clone(),
            TypeData::Constructed { definition, .. } => {
                let Some(def) = self.declared(*definition) else {
                    return Vec::new();
                };
                let Some(decl) = def.as_declared() else {
                    return Vec::new();
                };
                let subst = self.substitution_of(ty);
                decl.interfaces
                    .iter()
                    .filter_map(|&iface| self.substitute(iface, &subst))
                    .collect()
            }
            TypeData::Parameter(param) => param
                .constraints
                .iter()
                .copied()
                .filter(|&c| self.is_interface(c))
                .collect(),
            TypeData::Array { element, rank } => {
                if *rank != 1 {
                    return Vec::new();
                }
                self.array_interface_definitions()
                    .into_iter()
                    .filter_map(|iface| self.make_generic_type(iface, &[*element]).ok())
                    .collect()
            }
        }
    }

    fn value_kind(&self, ty: TypeId) -> Option<bool> {
        let data = self.get(ty)?;
        match &*data {
            TypeData::Declared(decl) => Some(decl.kind == DeclKind::Struct),
            TypeData::Constructed { definition, .. } => self.value_kind(*definition),
            TypeData::Parameter(param) => {
                if param.special.contains(SpecialConstraints::VALUE_TYPE) {
                    Some(true)
                } else if param.special.contains(SpecialConstraints::REFERENCE_TYPE) {
                    Some(false)
                } else if param.constraints.iter().any(|&c| {
                    !self.is_interface(c)
                        && !self.is_generic_parameter(c)
                        && self.value_kind(c) == Some(false)
                }) {
                    // A class constraint forces a reference type.
                    Some(false)
                } else {
                    None
                }
            }
            TypeData::Array { .. } => Some(false),
        }
    }

    fn is_interface(&self, ty: TypeId) -> bool {
        self.declared(ty)
            .and_then(|d| d.as_declared().map(|decl| decl.kind == DeclKind::Interface))
            .unwrap_or(false)
    }

    fn is_abstract(&self, ty: TypeId) -> bool {
        self.declared(ty)
            .and_then(|d| {
                d.as_declared()
                    .map(|decl| decl.is_abstract || decl.kind == DeclKind::Interface)
            })
            .unwrap_or(false)
    }

    fn has_default_constructor(&self, ty: TypeId) -> bool {
        let Some(data) = self.get(ty) else {
            return false;
        };
        match &*data {
            TypeData::Declared(decl) => match decl.kind {
                DeclKind::Struct => true,
                DeclKind::Interface => false,
                DeclKind::Class => decl.has_default_constructor && !decl.is_abstract,
            },
            TypeData::Constructed { definition, .. } => self.has_default_constructor(*definition),
            TypeData::Parameter(param) => param
                .special
                .intersects(SpecialConstraints::DEFAULT_CONSTRUCTOR | SpecialConstraints::VALUE_TYPE),
            TypeData::Array { .. } => false,
        }
    }
}

impl TypeComposition for TypeStore {
    fn generic_arguments(&self, ty: TypeId) -> TypeList {
        match self.get(ty).as_deref() {
            Some(TypeData::Declared(decl)) => decl.params.clone(),
            Some(TypeData::Constructed { args, .. }) => args.clone(),
            _ => TypeList::new(),
        }
    }

    fn generic_definition(&self, ty: TypeId) -> Option<TypeId> {
        match self.get(ty).as_deref()? {
            TypeData::Declared(decl) if decl.is_generic_definition() => Some(ty),
            TypeData::Constructed { definition, .. } => Some(*definition),
            _ => None,
        }
    }

    fn is_generic_parameter(&self, ty: TypeId) -> bool {
        matches!(self.get(ty).as_deref(), Some(TypeData::Parameter(_)))
    }

    fn is_generic_definition(&self, ty: TypeId) -> bool {
        matches!(
            self.get(ty).as_deref(),
            Some(TypeData::Declared(decl)) if decl.is_generic_definition()
        )
    }

    fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.get(ty).as_deref(), Some(TypeData::Array { .. }))
    }

    fn element_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.get(ty).as_deref()? {
            TypeData::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    fn array_rank(&self, ty: TypeId) -> u8 {
        match self.get(ty).as_deref() {
            Some(TypeData::Array { rank, .. }) => *rank,
            _ => 0,
        }
    }

    fn make_generic_type(&self, definition: TypeId, args: &[TypeId]) -> Result<TypeId, ModelError> {
        let params = self.params(definition);
        if params.is_empty() {
            return Err(ModelError::NotGenericDefinition(self.display_type(definition)));
        }
        if params.len() != args.len() {
            return Err(ModelError::ArityMismatch {
                definition: self.display_type(definition),
                expected: params.len(),
                actual: args.len(),
            });
        }
        if let Some(&missing) = args.iter().find(|a| !self.contains(**a)) {
            return Err(ModelError::UnknownType(missing));
        }
        if params.as_slice() == args {
            return Ok(definition);
        }

        let key = (definition, TypeList::from_slice(args));
        if let Some(existing) = self.constructed.get(&key) {
            return Ok(*existing.value());
        }
        let id = *self
            .constructed
            .entry(key)
            .or_insert_with(|| {
                let id = self.allocate();
                trace!(
                    instance_id = self.instance_id,
                    type_id = id.0,
                    definition = definition.0,
                    "TypeStore::make_generic_type - interned"
                );
                self.types.insert(
                    id,
                    Arc::new(TypeData::Constructed {
                        definition,
                        args: TypeList::from_slice(args),
                    }),
                );
                id
            })
            .value();
        Ok(id)
    }

    fn make_array_type(&self, element: TypeId, rank: u8) -> Result<TypeId, ModelError> {
        if rank == 0 || rank > MAX_ARRAY_RANK {
            return Err(ModelError::InvalidRank {
                rank: u32::from(rank),
                max: MAX_ARRAY_RANK,
            });
        }
        if !self.contains(element) {
            return Err(ModelError::UnknownType(element));
        }
        let key = (element, rank);
        if let Some(existing) = self.arrays.get(&key) {
            return Ok(*existing.value());
        }
        let id = *self
            .arrays
            .entry(key)
            .or_insert_with(|| {
                let id = self.allocate();
                self.types
                    .insert(id, Arc::new(TypeData::Array { element, rank }));
                id
            })
            .value();
        Ok(id)
    }

    fn display_type(&self, ty: TypeId) -> String {
        let mut out = String::new();
        format_type(self, ty, &mut out);
        out
    }
}

impl TypeConstraints for TypeStore {
    fn parameter_owner(&self, param: TypeId) -> Option<TypeId> {
        self.get(param)?.as_parameter().map(|p| p.owner)
    }

    fn parameter_position(&self, param: TypeId) -> Option<u32> {
        self.get(param)?.as_parameter().map(|p| p.position)
    }

    fn parameter_name(&self, param: TypeId) -> Option<Arc<str>> {
        self.get(param)?.as_parameter().map(|p| Arc::clone(&p.name))
    }

    fn special_constraints(&self, param: TypeId) -> SpecialConstraints {
        self.get(param)
            .and_then(|d| d.as_parameter().map(|p| p.special))
            .unwrap_or_default()
    }

    fn type_constraints(&self, param: TypeId) -> Vec<TypeId> {
        self.get(param)
            .and_then(|d| d.as_parameter().map(|p| p.constraints.clone()))
            .unwrap_or_default()
    }
}

impl TypeMembers for TypeStore {
    fn declared_members(&self, ty: TypeId) -> Vec<Arc<MemberInfo>> {
        self.declared(ty)
            .and_then(|d| d.as_declared().map(|decl| decl.members.clone()))
            .unwrap_or_default()
    }

    fn declared_indexer(&self, ty: TypeId) -> Option<Arc<IndexerInfo>> {
        self.declared(ty)?.as_declared()?.indexer.clone()
    }
}

impl TypeModel for TypeStore {
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../tests/store_tests.rs"]
mod tests;
