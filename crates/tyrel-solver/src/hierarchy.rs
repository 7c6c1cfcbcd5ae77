//! Hierarchy walking: ancestors, generic ancestor search, assignability and
//! hierarchy-relative argument extraction.
//!
//! Interface graphs share ancestors (diamonds), so every walk here is an
//! explicit visited-set traversal rather than naive recursion.

use crate::error::{AnalysisError, AnalysisResult};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;
use tyrel_common::limits::{MAX_HIERARCHY_DEPTH, MAX_HIERARCHY_NODES};
use tyrel_model::{TypeId, TypeList, TypeModel, TypeSubstitution, instantiate_type};

// =============================================================================
// Ancestor walk
// =============================================================================

/// Lazy walk over a type and its ancestors.
///
/// Yields the type itself, then its base chain up to the root, then the
/// interfaces of every chain member depth-first. Each type is yielded once.
pub struct Ancestors<'m> {
    model: &'m dyn TypeModel,
    visited: FxHashSet<TypeId>,
    next_base: Option<TypeId>,
    chain: SmallVec<[TypeId; 8]>,
    chain_cursor: usize,
    stack: Vec<TypeId>,
    yielded: u32,
}

impl<'m> Ancestors<'m> {
    pub fn new(model: &'m dyn TypeModel, ty: TypeId) -> Self {
        Self {
            model,
            visited: FxHashSet::default(),
            next_base: Some(ty),
            chain: SmallVec::new(),
            chain_cursor: 0,
            stack: Vec::new(),
            yielded: 0,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        if self.yielded >= MAX_HIERARCHY_NODES {
            trace!(yielded = self.yielded, "Ancestors: node limit reached");
            return None;
        }

        if let Some(base) = self.next_base.take()
            && self.chain.len() < MAX_HIERARCHY_DEPTH as usize
            && self.visited.insert(base)
        {
            self.chain.push(base);
            self.next_base = self.model.base_type(base);
            self.yielded += 1;
            return Some(base);
        }

        loop {
            if let Some(iface) = self.stack.pop() {
                if !self.visited.insert(iface) {
                    continue;
                }
                self.stack
                    .extend(self.model.interfaces(iface).into_iter().rev());
                self.yielded += 1;
                return Some(iface);
            }
            let &owner = self.chain.get(self.chain_cursor)?;
            self.chain_cursor += 1;
            self.stack
                .extend(self.model.interfaces(owner).into_iter().rev());
        }
    }
}

/// First ancestor of `ty` (including `ty`) constructed from `definition`.
pub fn find_generic_ancestor(model: &dyn TypeModel, ty: TypeId, definition: TypeId) -> Option<TypeId> {
    Ancestors::new(model, ty).find(|&ancestor| model.generic_definition(ancestor) == Some(definition))
}

/// First generic ancestor of `ty`, excluding `ty` itself.
pub fn first_generic_ancestor(model: &dyn TypeModel, ty: TypeId) -> Option<TypeId> {
    Ancestors::new(model, ty)
        .skip(1)
        .find(|&ancestor| model.is_generic_type(ancestor))
}

// =============================================================================
// Assignability
// =============================================================================

/// Whether a value of `source` can be used where `target` is expected.
///
/// Rules, in order:
/// - identity, and everything is assignable to `OBJECT`
/// - arrays of equal rank are covariant in reference-type elements
/// - `target` is an ancestor of `source` (base chain or interface closure)
/// - a generic parameter is assignable wherever one of its type constraints is
///
/// This is not a variance-aware checker: `List<string>` is not assignable to
/// `List<object>`.
pub fn is_assignable(model: &dyn TypeModel, source: TypeId, target: TypeId) -> bool {
    AssignabilityChecker::new(model).check(source, target)
}

/// Assignability with a guard over `(source, target)` pairs, so mutually
/// constrained parameters (`T : U`, `U : T`) terminate.
pub struct AssignabilityChecker<'m> {
    model: &'m dyn TypeModel,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'m> AssignabilityChecker<'m> {
    pub fn new(model: &'m dyn TypeModel) -> Self {
        Self {
            model,
            guard: RecursionGuard::with_profile(RecursionProfile::Assignability),
        }
    }

    pub fn check(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target || target == TypeId::OBJECT {
            return true;
        }
        match self.guard.enter((source, target)) {
            RecursionResult::Entered => {
                let result = self.check_inner(source, target);
                self.guard.leave((source, target));
                result
            }
            RecursionResult::Cycle => false,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                trace!(
                    source = source.0,
                    target = target.0,
                    "is_assignable: recursion limit exceeded"
                );
                false
            }
        }
    }

    fn check_inner(&mut self, source: TypeId, target: TypeId) -> bool {
        let model = self.model;

        if model.is_array(source) && model.is_array(target) {
            if model.array_rank(source) == model.array_rank(target)
                && let (Some(source_elem), Some(target_elem)) =
                    (model.element_type(source), model.element_type(target))
                && (source_elem == target_elem
                    || (model.value_kind(source_elem) == Some(false)
                        && self.check(source_elem, target_elem)))
            {
                return true;
            }
        }

        if Ancestors::new(model, source).any(|ancestor| ancestor == target) {
            return true;
        }

        if model.is_generic_parameter(source) {
            return model
                .type_constraints(source)
                .into_iter()
                .any(|constraint| self.check(constraint, target));
        }

        false
    }
}

// =============================================================================
// Hierarchy-relative arguments
// =============================================================================

/// Arguments of `ty` relative to `target`.
///
/// `target` is a generic definition, or an array whose innermost element is
/// one (`List[]`). For a definition target, the ancestors of `ty`'s own
/// definition are searched for a type constructed from `target`; its raw
/// arguments are then resolved through the substitution from `ty`'s
/// definition parameters to `ty`'s arguments. Parameters without a binding
/// pass through unchanged.
///
/// For an array target, `ty` must be an array of equal rank and the search
/// recurses into the element types. An innermost target element that is a
/// bare parameter (`T[]`) yields `ty`'s element, which must not itself be an
/// array (`T[][]` against `T[]` is `UnsupportedShape`).
pub fn generic_arguments_relative_to(
    model: &dyn TypeModel,
    ty: TypeId,
    target: TypeId,
) -> AnalysisResult<TypeList> {
    if model.is_array(target) {
        let (Some(element), Some(target_element)) = (model.element_type(ty), model.element_type(target)) else {
            return Err(AnalysisError::UnsupportedShape(format!(
                "{} is not an array, expected a match for {}",
                model.display_type(ty),
                model.display_type(target)
            )));
        };
        let (rank, target_rank) = (model.array_rank(ty), model.array_rank(target));
        if rank != target_rank {
            return Err(AnalysisError::UnsupportedShape(format!(
                "array rank mismatch: {} has rank {rank}, {} has rank {target_rank}",
                model.display_type(ty),
                model.display_type(target)
            )));
        }
        if model.is_generic_parameter(target_element) {
            // `T[]` binds T to the element itself; nesting depths must agree.
            if model.is_array(element) {
                return Err(AnalysisError::UnsupportedShape(format!(
                    "array nesting mismatch: {} against {}",
                    model.display_type(ty),
                    model.display_type(target)
                )));
            }
            return Ok(TypeList::from_slice(&[element]));
        }
        return generic_arguments_relative_to(model, element, target_element);
    }

    if !model.is_generic_definition(target) {
        return Err(AnalysisError::InvalidArgument(format!(
            "{} is not a generic type definition",
            model.display_type(target)
        )));
    }

    // Walk the definition's raw hierarchy, then substitute once.
    let (start, subst) = match model.generic_definition(ty) {
        Some(definition) if definition != ty => (
            definition,
            TypeSubstitution::from_args(
                &model.generic_arguments(definition),
                &model.generic_arguments(ty),
            ),
        ),
        _ => (ty, TypeSubstitution::new()),
    };

    let Some(found) = find_generic_ancestor(model, start, target) else {
        return Err(AnalysisError::NoSuchAncestor {
            ty: model.display_type(ty),
            definition: model.display_type(target),
        });
    };

    trace!(
        ty = ty.0,
        target = target.0,
        found = found.0,
        substitutions = subst.len(),
        "generic_arguments_relative_to: ancestor found"
    );

    model
        .generic_arguments(found)
        .into_iter()
        .map(|arg| instantiate_type(model, arg, &subst).map_err(AnalysisError::from))
        .collect()
}

#[cfg(test)]
#[path = "../tests/hierarchy_tests.rs"]
mod tests;
