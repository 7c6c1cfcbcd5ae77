//! Type Model capability traits.
//!
//! The analyzers never touch a concrete host. They consume type metadata
//! through three capability sets:
//!
//! | Capability | Answers |
//! |------------|---------|
//! | `TypeHierarchy` | base type, declared interfaces, value-type-ness, constructibility |
//! | `TypeComposition` | generic arguments/definitions, arrays, construction |
//! | `TypeConstraints` | parameter owner, position, special and type constraints |
//!
//! `TypeMembers` is a fourth capability used only by member-path access.
//! `TypeStore` implements all four; any other host (a parsed metadata table,
//! a foreign reflection bridge) can implement them instead.

use crate::error::ModelError;
use crate::member::{IndexerInfo, MemberInfo};
use crate::types::{SpecialConstraints, TypeId, TypeList};
use std::sync::Arc;

/// Inheritance queries.
pub trait TypeHierarchy {
    /// Direct base type. `None` for `OBJECT`, interfaces, and unknown ids.
    ///
    /// For constructed types the result has the definition's parameters
    /// substituted by the type's arguments.
    fn base_type(&self, ty: TypeId) -> Option<TypeId>;

    /// Directly declared interfaces (not the transitive closure), substituted
    /// like `base_type`.
    fn interfaces(&self, ty: TypeId) -> Vec<TypeId>;

    /// `Some(true)` for value types, `Some(false)` for reference types, `None`
    /// when unknown (an unconstrained generic parameter).
    fn value_kind(&self, ty: TypeId) -> Option<bool>;

    fn is_interface(&self, ty: TypeId) -> bool;

    fn is_abstract(&self, ty: TypeId) -> bool;

    /// Whether a visible zero-argument constructor exists on a non-abstract
    /// type (or the type is a value type).
    fn has_default_constructor(&self, ty: TypeId) -> bool;
}

/// Structural queries and construction.
pub trait TypeComposition {
    /// Generic arguments: the parameters of a definition, the arguments of a
    /// constructed type, empty otherwise.
    fn generic_arguments(&self, ty: TypeId) -> TypeList;

    /// The generic definition of a generic type (a definition is its own
    /// definition). `None` for non-generic types, parameters and arrays.
    fn generic_definition(&self, ty: TypeId) -> Option<TypeId>;

    fn is_generic_parameter(&self, ty: TypeId) -> bool;

    fn is_generic_definition(&self, ty: TypeId) -> bool;

    /// Definition or constructed type.
    fn is_generic_type(&self, ty: TypeId) -> bool {
        self.generic_definition(ty).is_some()
    }

    fn is_array(&self, ty: TypeId) -> bool;

    fn element_type(&self, ty: TypeId) -> Option<TypeId>;

    /// Array rank; 0 for non-arrays.
    fn array_rank(&self, ty: TypeId) -> u8;

    /// Whether any generic parameter occurs in the type tree.
    fn contains_generic_parameters(&self, ty: TypeId) -> bool {
        if self.is_generic_parameter(ty) || self.is_generic_definition(ty) {
            return true;
        }
        if let Some(element) = self.element_type(ty) {
            return self.contains_generic_parameters(element);
        }
        self.generic_arguments(ty)
            .iter()
            .any(|&arg| self.contains_generic_parameters(arg))
    }

    /// Construct `definition<args...>`. Constructing a definition with its
    /// own parameters returns the definition.
    fn make_generic_type(&self, definition: TypeId, args: &[TypeId]) -> Result<TypeId, ModelError>;

    fn make_array_type(&self, element: TypeId, rank: u8) -> Result<TypeId, ModelError>;

    /// Human-readable name, e.g. `Dictionary<string, List<int>>`.
    fn display_type(&self, ty: TypeId) -> String;
}

/// Generic parameter queries.
pub trait TypeConstraints {
    /// Declared type owning the parameter.
    fn parameter_owner(&self, param: TypeId) -> Option<TypeId>;

    fn parameter_position(&self, param: TypeId) -> Option<u32>;

    fn parameter_name(&self, param: TypeId) -> Option<Arc<str>>;

    fn special_constraints(&self, param: TypeId) -> SpecialConstraints;

    /// Type constraints in declaration order. May reference sibling
    /// parameters of the same owner.
    fn type_constraints(&self, param: TypeId) -> Vec<TypeId>;
}

/// Member metadata, consumed by member-path access.
pub trait TypeMembers {
    /// Members declared directly on the type (or on its definition, for
    /// constructed types). Declared types are left unsubstituted.
    fn declared_members(&self, ty: TypeId) -> Vec<Arc<MemberInfo>>;

    /// Integer indexer declared directly on the type (or its definition).
    fn declared_indexer(&self, ty: TypeId) -> Option<Arc<IndexerInfo>>;
}

/// The full capability set required by the analyzers.
pub trait TypeModel: TypeHierarchy + TypeComposition + TypeConstraints + Send + Sync {
    /// Monotonic counter bumped whenever new types are loaded or existing
    /// declarations change. Caches compare it to detect staleness.
    fn generation(&self) -> u64 {
        0
    }
}
