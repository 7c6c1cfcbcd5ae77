//! Core type representation for the reference host.
//!
//! `TypeId` is an opaque, copyable handle. Everything else in this module is
//! the data a `TypeStore` keeps behind those handles.

use crate::member::{IndexerInfo, MemberInfo};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

// =============================================================================
// TypeId
// =============================================================================

/// Opaque handle into a type model.
///
/// Identity-comparable: two handles are equal iff they denote the same type.
/// Constructed generic types and arrays are interned, so `List<int>` built
/// twice yields the same `TypeId`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Root of every hierarchy.
    pub const OBJECT: Self = Self(0);
    /// Base of all value types.
    pub const VALUE_TYPE: Self = Self(1);
    /// Base of all array types.
    pub const ARRAY: Self = Self(2);
    pub const BOOL: Self = Self(3);
    pub const INT: Self = Self(4);
    pub const LONG: Self = Self(5);
    pub const DOUBLE: Self = Self(6);
    pub const STRING: Self = Self(7);

    /// First id handed out to user declarations.
    pub const FIRST_USER: u32 = 8;

    /// Check if this is one of the prelude types registered by `TypeStore::new`.
    pub const fn is_prelude(self) -> bool {
        self.0 < Self::FIRST_USER
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inline list of type arguments; most generics have at most four.
pub type TypeList = SmallVec<[TypeId; 4]>;

// =============================================================================
// Special constraints
// =============================================================================

bitflags! {
    /// Non-type constraints on a generic parameter.
    ///
    /// Independent of the parameter's type constraints.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SpecialConstraints: u8 {
        /// Argument must be a reference type (`class`).
        const REFERENCE_TYPE = 1 << 0;
        /// Argument must be a value type (`struct`).
        const VALUE_TYPE = 1 << 1;
        /// Argument must have a visible zero-argument constructor (`new()`).
        const DEFAULT_CONSTRUCTOR = 1 << 2;
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// Kind of a declared (non-constructed, non-array, non-parameter) type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    /// Reference type with optional base class.
    Class,
    /// Value type; implicitly derives from `VALUE_TYPE` and is always
    /// default-constructible.
    Struct,
    /// Contract type; never has a base class.
    Interface,
}

/// A declared type: class, struct or interface, optionally generic.
#[derive(Clone, Debug)]
pub struct DeclaredType {
    pub name: Arc<str>,
    pub kind: DeclKind,
    pub is_abstract: bool,
    /// Whether a visible zero-argument constructor exists.
    pub has_default_constructor: bool,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// Generic parameters, in position order. Empty for non-generic types.
    pub params: TypeList,
    pub members: Vec<Arc<MemberInfo>>,
    pub indexer: Option<Arc<IndexerInfo>>,
}

impl DeclaredType {
    pub fn is_generic_definition(&self) -> bool {
        !self.params.is_empty()
    }
}

/// A generic parameter of a declared type.
#[derive(Clone, Debug)]
pub struct GenericParam {
    pub name: Arc<str>,
    /// Declared type that owns this parameter.
    pub owner: TypeId,
    /// 0-based position in the owner's parameter list.
    pub position: u32,
    pub special: SpecialConstraints,
    /// Type constraints, possibly referencing sibling parameters.
    pub constraints: Vec<TypeId>,
}

// =============================================================================
// TypeData
// =============================================================================

/// Everything a `TypeStore` knows about one `TypeId`.
#[derive(Clone, Debug)]
pub enum TypeData {
    /// Class / struct / interface, generic definition or not.
    Declared(DeclaredType),
    /// A generic definition supplied with arguments (some may still be
    /// parameters, making the type partially open).
    Constructed { definition: TypeId, args: TypeList },
    /// An unbound type slot.
    Parameter(GenericParam),
    /// Array of `element` with the given rank (1 for `T[]`, 2 for `T[,]`).
    Array { element: TypeId, rank: u8 },
}

impl TypeData {
    pub fn as_declared(&self) -> Option<&DeclaredType> {
        match self {
            Self::Declared(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&GenericParam> {
        match self {
            Self::Parameter(param) => Some(param),
            _ => None,
        }
    }
}
