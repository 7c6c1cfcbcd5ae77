//! Descent into type trees: generic arguments and array elements.
//!
//! Used for parameter flattening, dependency-edge discovery and the position
//! paths inference follows.

use crate::recursion::{RecursionGuard, RecursionProfile};
use indexmap::IndexSet;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::trace;
use tyrel_model::{TypeId, TypeModel};

/// One step of a position path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PathStep {
    /// Into the generic argument at this index.
    Argument(u32),
    /// Into an array's element type.
    Element,
}

/// Where a parameter occurs inside a constraint expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionPath {
    /// The constraint expression the path starts at.
    pub constraint: TypeId,
    pub steps: SmallVec<[PathStep; 4]>,
}

/// Distinct generic parameters occurring in `ty`, depth-first, appended to
/// `out` in first-occurrence order.
pub fn collect_generic_parameters(model: &dyn TypeModel, ty: TypeId, out: &mut IndexSet<TypeId>) {
    let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeTree);
    collect_inner(model, ty, out, &mut guard);
}

fn collect_inner(
    model: &dyn TypeModel,
    ty: TypeId,
    out: &mut IndexSet<TypeId>,
    guard: &mut RecursionGuard<TypeId>,
) {
    if model.is_generic_parameter(ty) {
        out.insert(ty);
        return;
    }
    let result = guard.scope(ty, |guard| {
        if let Some(element) = model.element_type(ty) {
            collect_inner(model, element, out, guard);
            return;
        }
        for arg in model.generic_arguments(ty) {
            collect_inner(model, arg, out, guard);
        }
    });
    if let Err(reason) = result {
        trace!(ty = ty.0, ?reason, "collect_generic_parameters: descent stopped");
    }
}

/// Every path at which `param` occurs inside `root`, in depth-first order.
///
/// `root == param` yields a single empty path.
pub fn parameter_paths(model: &dyn TypeModel, root: TypeId, param: TypeId) -> Vec<PositionPath> {
    let mut found = Vec::new();
    let mut steps = SmallVec::new();
    let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeTree);
    paths_inner(model, root, param, &mut steps, &mut found, &mut guard);
    found
        .into_iter()
        .map(|steps| PositionPath {
            constraint: root,
            steps,
        })
        .collect()
}

fn paths_inner(
    model: &dyn TypeModel,
    ty: TypeId,
    param: TypeId,
    steps: &mut SmallVec<[PathStep; 4]>,
    found: &mut Vec<SmallVec<[PathStep; 4]>>,
    guard: &mut RecursionGuard<TypeId>,
) {
    if ty == param {
        found.push(steps.clone());
        return;
    }
    if model.is_generic_parameter(ty) {
        return;
    }
    let result = guard.scope(ty, |guard| {
        if let Some(element) = model.element_type(ty) {
            steps.push(PathStep::Element);
            paths_inner(model, element, param, steps, found, guard);
            steps.pop();
            return;
        }
        for (index, arg) in model.generic_arguments(ty).into_iter().enumerate() {
            steps.push(PathStep::Argument(index as u32));
            paths_inner(model, arg, param, steps, found, guard);
            steps.pop();
        }
    });
    if let Err(reason) = result {
        trace!(ty = ty.0, ?reason, "parameter_paths: descent stopped");
    }
}

/// Sibling parameters of `owner` referenced anywhere in `constraints`,
/// excluding `param` itself.
pub fn sibling_references(
    model: &dyn TypeModel,
    param: TypeId,
    owner: TypeId,
    constraints: &[TypeId],
) -> IndexSet<TypeId> {
    let mut occurring = IndexSet::new();
    for &constraint in constraints {
        collect_generic_parameters(model, constraint, &mut occurring);
    }
    occurring
        .into_iter()
        .filter(|&other| other != param && model.parameter_owner(other) == Some(owner))
        .collect()
}

#[cfg(test)]
#[path = "../tests/type_tree_tests.rs"]
mod tests;
