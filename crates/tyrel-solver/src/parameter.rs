//! Parameter analyzer: constraints of one generic parameter, its dependency
//! edges to sibling parameters, and inference from a dependent's binding.
//!
//! ## Dependency edges
//!
//! `A.references` holds the siblings occurring anywhere inside A's type
//! constraints (found by descending through generic arguments and array
//! elements). `referenced_by` is the inverse, computed by scanning every
//! sibling's constraints. For `Pair<TKey, TValue> where TValue : IContainer<TKey>`:
//!
//! ```text
//! TValue.references    = { TKey }
//! TKey.referenced_by   = { TValue }
//! ```
//!
//! A parameter never references itself (`T : IComparable<T>` adds no edge).

use crate::error::{AnalysisError, AnalysisResult};
use crate::factory::AnalyzerFactory;
use crate::hierarchy::{generic_arguments_relative_to, is_assignable};
use crate::query_trace;
use crate::type_tree::{PathStep, PositionPath, parameter_paths, sibling_references};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use tyrel_model::{SpecialConstraints, TypeId, TypeModel};

/// Immutable facts about one generic parameter.
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    pub(crate) param: TypeId,
    pub(crate) owner: TypeId,
    pub(crate) name: Arc<str>,
    pub(crate) position: u32,
    pub(crate) special: SpecialConstraints,
    pub(crate) constraints: Vec<TypeId>,
    pub(crate) references: IndexSet<TypeId>,
    pub(crate) referenced_by: IndexSet<TypeId>,
}

impl ParameterDescriptor {
    pub(crate) fn build(model: &dyn TypeModel, param: TypeId) -> AnalysisResult<Self> {
        if !model.is_generic_parameter(param) {
            return Err(AnalysisError::InvalidArgument(format!(
                "{} is not a generic parameter",
                model.display_type(param)
            )));
        }
        let (Some(owner), Some(position)) = (model.parameter_owner(param), model.parameter_position(param)) else {
            return Err(AnalysisError::InvalidArgument(format!(
                "generic parameter {} has no owning definition",
                model.display_type(param)
            )));
        };
        let name = model
            .parameter_name(param)
            .unwrap_or_else(|| Arc::from(model.display_type(param)));
        let constraints = model.type_constraints(param);
        let references = sibling_references(model, param, owner, &constraints);

        let mut referenced_by = IndexSet::new();
        for sibling in model.generic_arguments(owner) {
            if sibling == param {
                continue;
            }
            let sibling_constraints = model.type_constraints(sibling);
            if sibling_references(model, sibling, owner, &sibling_constraints).contains(&param) {
                referenced_by.insert(sibling);
            }
        }

        trace!(
            param = param.0,
            owner = owner.0,
            position,
            references = references.len(),
            referenced_by = referenced_by.len(),
            "ParameterDescriptor::build"
        );

        Ok(Self {
            param,
            owner,
            name,
            position,
            special: model.special_constraints(param),
            constraints,
            references,
            referenced_by,
        })
    }
}

/// Analyzer for a single generic parameter.
#[derive(Clone)]
pub struct ParameterAnalyzer<'f> {
    factory: &'f AnalyzerFactory,
    descriptor: Arc<ParameterDescriptor>,
}

impl fmt::Debug for ParameterAnalyzer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterAnalyzer")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

impl<'f> ParameterAnalyzer<'f> {
    pub(crate) fn new(factory: &'f AnalyzerFactory, descriptor: Arc<ParameterDescriptor>) -> Self {
        Self {
            factory,
            descriptor,
        }
    }

    #[inline]
    pub fn parameter(&self) -> TypeId {
        self.descriptor.param
    }

    #[inline]
    pub fn owner(&self) -> TypeId {
        self.descriptor.owner
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    #[inline]
    pub fn position(&self) -> u32 {
        self.descriptor.position
    }

    #[inline]
    pub fn special_constraints(&self) -> SpecialConstraints {
        self.descriptor.special
    }

    /// Declared type constraints, in declaration order.
    pub fn type_constraints(&self) -> &[TypeId] {
        &self.descriptor.constraints
    }

    /// Siblings occurring in this parameter's constraints.
    pub fn references(&self) -> &IndexSet<TypeId> {
        &self.descriptor.references
    }

    /// Siblings whose constraints mention this parameter.
    pub fn referenced_by(&self) -> &IndexSet<TypeId> {
        &self.descriptor.referenced_by
    }

    pub fn descriptor(&self) -> &ParameterDescriptor {
        &self.descriptor
    }

    // -------------------------------------------------------------------------
    // Constraint satisfaction
    // -------------------------------------------------------------------------

    /// Whether `candidate` satisfies the declared special and type constraints.
    pub fn satisfies_constraints(&self, candidate: TypeId) -> bool {
        self.satisfies_constraints_with(candidate, &self.descriptor.constraints)
    }

    /// Like `satisfies_constraints`, against a caller-supplied constraint set
    /// (typically the declared constraints with sibling bindings substituted).
    ///
    /// Special constraints are checked first. A type constraint accepts the
    /// candidate when the candidate is assignable to it, or when the
    /// constraint is open and completes against the candidate with
    /// inheritance allowed. Structural errors answer `false`.
    pub fn satisfies_constraints_with(&self, candidate: TypeId, constraints: &[TypeId]) -> bool {
        let query_id = query_trace::enabled().then(|| {
            let query_id = query_trace::next_query_id();
            query_trace::relation_start(query_id, "satisfies_constraints", candidate, self.descriptor.param);
            query_id
        });

        let result = self.satisfies_special(candidate)
            && constraints
                .iter()
                .all(|&constraint| self.satisfies_type_constraint(candidate, constraint));

        if let Some(query_id) = query_id {
            query_trace::bool_end(query_id, "satisfies_constraints", result);
        }
        result
    }

    fn satisfies_special(&self, candidate: TypeId) -> bool {
        let model = self.factory.model();
        let special = self.descriptor.special;
        let value_kind = model.value_kind(candidate);

        if special.contains(SpecialConstraints::REFERENCE_TYPE) && value_kind != Some(false) {
            trace!(candidate = candidate.0, "satisfies_special: not a reference type");
            return false;
        }
        if special.contains(SpecialConstraints::VALUE_TYPE) && value_kind != Some(true) {
            trace!(candidate = candidate.0, "satisfies_special: not a value type");
            return false;
        }
        if special.contains(SpecialConstraints::DEFAULT_CONSTRUCTOR)
            && value_kind != Some(true)
            && !(model.has_default_constructor(candidate) && !model.is_abstract(candidate))
        {
            trace!(candidate = candidate.0, "satisfies_special: no default constructor");
            return false;
        }
        true
    }

    fn satisfies_type_constraint(&self, candidate: TypeId, constraint: TypeId) -> bool {
        let model = self.factory.model();
        if is_assignable(model, candidate, constraint) {
            return true;
        }
        if !model.contains_generic_parameters(constraint) {
            return false;
        }
        match self
            .factory
            .open_type_analyzer_unsynced(constraint)
            .and_then(|open| open.get_completed_generic_arguments(candidate, true))
        {
            Ok(_) => true,
            Err(err) => {
                trace!(
                    candidate = candidate.0,
                    constraint = constraint.0,
                    %err,
                    "satisfies_type_constraint: open constraint did not complete"
                );
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Inference
    // -------------------------------------------------------------------------

    /// First position at which this parameter occurs in `dependent`'s
    /// constraints.
    ///
    /// `dependent` must be in `referenced_by`.
    pub fn position_path(&self, dependent: TypeId) -> AnalysisResult<Option<PositionPath>> {
        let constraints = self.dependent_constraints(dependent)?;
        let model = self.factory.model();
        Ok(constraints
            .iter()
            .find_map(|&constraint| parameter_paths(model, constraint, self.descriptor.param).into_iter().next()))
    }

    /// Infer this parameter's binding from a dependent sibling's binding.
    ///
    /// Locates this parameter inside the dependent's constraints and walks
    /// the same position path through `dependent_concrete`, taking arguments
    /// relative to each generic definition on the way. The first occurrence
    /// that walks successfully wins; later occurrences that disagree are
    /// reported at debug level and otherwise ignored.
    ///
    /// `Ok(None)` when no occurrence can be walked through the concrete type.
    pub fn try_infer_type_from(&self, dependent: TypeId, dependent_concrete: TypeId) -> AnalysisResult<Option<TypeId>> {
        let constraints = self.dependent_constraints(dependent)?;
        let model = self.factory.model();
        let param = self.descriptor.param;

        let mut inferred: Option<TypeId> = None;
        for &constraint in &constraints {
            for path in parameter_paths(model, constraint, param) {
                let walked = match walk_position_path(model, &path, dependent_concrete) {
                    Ok(ty) => ty,
                    Err(err) => {
                        trace!(
                            param = param.0,
                            constraint = constraint.0,
                            %err,
                            "try_infer_type_from: occurrence not walkable"
                        );
                        continue;
                    }
                };
                match inferred {
                    None => inferred = Some(walked),
                    Some(first) if first != walked => debug!(
                        param = %self.descriptor.name,
                        first = %model.display_type(first),
                        ignored = %model.display_type(walked),
                        "try_infer_type_from: later occurrence disagrees with the first"
                    ),
                    Some(_) => {}
                }
            }
        }
        Ok(inferred)
    }

    fn dependent_constraints(&self, dependent: TypeId) -> AnalysisResult<Vec<TypeId>> {
        if !self.descriptor.referenced_by.contains(&dependent) {
            let model = self.factory.model();
            return Err(AnalysisError::InvalidArgument(format!(
                "{} does not reference {} in its constraints",
                model.display_type(dependent),
                self.descriptor.name
            )));
        }
        Ok(self.factory.parameter_descriptor(dependent)?.constraints.clone())
    }
}

/// Follow `path` through `concrete`: argument steps take the arguments of the
/// current concrete node relative to the definition of the open node at the
/// same position.
fn walk_position_path(model: &dyn TypeModel, path: &PositionPath, concrete: TypeId) -> AnalysisResult<TypeId> {
    let mut open = path.constraint;
    let mut current = concrete;
    for &step in &path.steps {
        match step {
            PathStep::Argument(index) => {
                let index = index as usize;
                let definition = model.generic_definition(open).ok_or_else(|| {
                    AnalysisError::UnsupportedShape(format!("{} is not generic", model.display_type(open)))
                })?;
                let args = generic_arguments_relative_to(model, current, definition)?;
                let open_args = model.generic_arguments(open);
                let (Some(&next), Some(&next_open)) = (args.get(index), open_args.get(index)) else {
                    return Err(AnalysisError::UnsupportedShape(format!(
                        "argument {index} missing on {}",
                        model.display_type(current)
                    )));
                };
                current = next;
                open = next_open;
            }
            PathStep::Element => {
                let (Some(next), Some(next_open)) = (model.element_type(current), model.element_type(open)) else {
                    return Err(AnalysisError::UnsupportedShape(format!(
                        "{} is not an array",
                        model.display_type(current)
                    )));
                };
                if model.array_rank(current) != model.array_rank(open) {
                    return Err(AnalysisError::UnsupportedShape(format!(
                        "array rank mismatch between {} and {}",
                        model.display_type(current),
                        model.display_type(open)
                    )));
                }
                current = next;
                open = next_open;
            }
        }
    }
    Ok(current)
}

#[cfg(test)]
#[path = "../tests/parameter_tests.rs"]
mod tests;
