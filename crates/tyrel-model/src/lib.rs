//! Type Model for generic-type analysis.
//!
//! This crate defines what the analyzers need to know about a host's types,
//! as capability traits, and ships `TypeStore`, an in-memory host:
//!
//! - **Capabilities**: `TypeHierarchy`, `TypeComposition`, `TypeConstraints`
//!   (together `TypeModel`), plus `TypeMembers` for member-path access
//! - **Handles**: `TypeId` comparisons are O(1) identity checks; constructed
//!   types and arrays are interned
//! - **Substitution**: `TypeSubstitution` / `instantiate_type`
//! - **Values**: `Value`, `HostObject`, `HostArray` for member access at runtime

mod error;
mod format;
pub mod instantiate;
pub mod member;
pub mod model;
pub mod store;
pub mod types;
pub mod value;

pub use error::ModelError;
pub use instantiate::{TypeSubstitution, instantiate_type};
pub use member::{
    GetterFn, IndexGetFn, IndexSetFn, IndexerInfo, MemberBody, MemberInfo, MemberKind, MethodFn,
    SetterFn,
};
pub use model::{TypeComposition, TypeConstraints, TypeHierarchy, TypeMembers, TypeModel};
pub use store::{MAX_ARRAY_RANK, TypeDecl, TypeStore};
pub use types::{DeclKind, DeclaredType, GenericParam, SpecialConstraints, TypeData, TypeId, TypeList};
pub use value::{ArrayRef, HostArray, HostObject, ObjectRef, Value};

#[cfg(test)]
#[path = "../tests/value_tests.rs"]
mod value_tests;
