//! Type classification for analyzer dispatch.
//!
//! Decides which analyzer kind applies to a type, and for open types which
//! shape the open-type analyzer works over.

use crate::hierarchy::first_generic_ancestor;
use serde::Serialize;
use tyrel_model::{TypeId, TypeModel};

/// Which analyzer a type gets from `AnalyzerFactory::get_analyzer`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AnalyzerKind {
    Parameter,
    Definition,
    OpenType,
}

/// How an open type carries its arguments.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpenShape {
    /// A bare generic parameter; its only argument is itself.
    Parameter(TypeId),
    /// A generic type, or a plain type deriving from one. `effective` is the
    /// type itself when generic, otherwise its first generic ancestor.
    Generic { definition: TypeId, effective: TypeId },
    /// An array whose element type is itself open.
    Array { element: TypeId, rank: u8 },
}

/// Classify `ty`. `None` means no analyzer applies.
pub fn classify(model: &dyn TypeModel, ty: TypeId) -> Option<AnalyzerKind> {
    if model.is_generic_parameter(ty) {
        return Some(AnalyzerKind::Parameter);
    }
    if model.is_generic_definition(ty) {
        return Some(AnalyzerKind::Definition);
    }
    open_shape(model, ty).map(|_| AnalyzerKind::OpenType)
}

/// Shape of `ty` as an open type, if it is one.
///
/// Generic definitions are open types too: the factory dispatches them to
/// the definition analyzer, but `open_type_analyzer` accepts them.
pub fn open_shape(model: &dyn TypeModel, ty: TypeId) -> Option<OpenShape> {
    if model.is_generic_parameter(ty) {
        return Some(OpenShape::Parameter(ty));
    }
    if let Some(element) = model.element_type(ty) {
        return open_shape(model, element).map(|_| OpenShape::Array {
            element,
            rank: model.array_rank(ty),
        });
    }
    if let Some(definition) = model.generic_definition(ty) {
        return Some(OpenShape::Generic {
            definition,
            effective: ty,
        });
    }
    let effective = first_generic_ancestor(model, ty)?;
    let definition = model.generic_definition(effective)?;
    Some(OpenShape::Generic {
        definition,
        effective,
    })
}

#[cfg(test)]
#[path = "../tests/classify_tests.rs"]
mod tests;
