//! Open-type analyzer: arguments relative to ancestor definitions,
//! completion against concrete types, and extended construction.
//!
//! Applies to generic definitions, partially or fully constructed generics,
//! arrays of open element types, bare generic parameters, and plain types
//! that derive from a generic type (analyzed through their first generic
//! ancestor).
//!
//! ## Generic parameters of an open type
//!
//! A bound slot may itself be open (`Pair<A[], List<B>>`), so the parameters
//! an open type is completed over are the distinct parameters occurring
//! anywhere in its argument trees, depth-first: `[A, B]` here. Completion
//! returns one binding per such parameter and `make_generic_type_extended`
//! takes one argument per parameter, in the same order.

use crate::arguments::ArgumentVector;
use crate::classify::{OpenShape, open_shape};
use crate::error::{AnalysisError, AnalysisResult};
use crate::factory::AnalyzerFactory;
use crate::hierarchy::{find_generic_ancestor, generic_arguments_relative_to, is_assignable};
use crate::query_trace;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::type_tree::collect_generic_parameters;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use tyrel_model::{TypeId, TypeList, TypeModel, TypeSubstitution, instantiate_type};

/// Immutable facts about an open type.
#[derive(Clone, Debug)]
pub struct OpenTypeDescriptor {
    pub(crate) ty: TypeId,
    pub(crate) shape: OpenShape,
    pub(crate) arguments: ArgumentVector,
    pub(crate) generic_parameters: TypeList,
}

impl OpenTypeDescriptor {
    pub(crate) fn build(model: &dyn TypeModel, ty: TypeId) -> AnalysisResult<Self> {
        let shape = open_shape(model, ty).ok_or_else(|| {
            AnalysisError::InvalidArgument(format!(
                "{} is not an open generic type and derives from none",
                model.display_type(ty)
            ))
        })?;

        let mut params = IndexSet::new();
        collect_generic_parameters(model, ty, &mut params);

        Ok(Self {
            ty,
            shape,
            arguments: shape_arguments(model, shape),
            generic_parameters: params.into_iter().collect(),
        })
    }
}

fn shape_arguments(model: &dyn TypeModel, shape: OpenShape) -> ArgumentVector {
    match shape {
        OpenShape::Parameter(param) => ArgumentVector::unbound(&[param]),
        OpenShape::Generic { effective, .. } => {
            ArgumentVector::from_types(model, &model.generic_arguments(effective))
        }
        OpenShape::Array { element, .. } => open_shape(model, element)
            .map(|inner| shape_arguments(model, inner))
            .unwrap_or_default(),
    }
}

/// Analyzer for an open type.
#[derive(Clone)]
pub struct OpenTypeAnalyzer<'f> {
    factory: &'f AnalyzerFactory,
    descriptor: Arc<OpenTypeDescriptor>,
}

impl fmt::Debug for OpenTypeAnalyzer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenTypeAnalyzer")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

impl<'f> OpenTypeAnalyzer<'f> {
    pub(crate) fn new(factory: &'f AnalyzerFactory, descriptor: Arc<OpenTypeDescriptor>) -> Self {
        Self {
            factory,
            descriptor,
        }
    }

    #[inline]
    pub fn analyzed_type(&self) -> TypeId {
        self.descriptor.ty
    }

    #[inline]
    pub fn shape(&self) -> OpenShape {
        self.descriptor.shape
    }

    /// Generic definition the arguments belong to. `None` for parameters;
    /// for arrays, the element's definition.
    pub fn definition(&self) -> Option<TypeId> {
        let mut shape = self.descriptor.shape;
        loop {
            match shape {
                OpenShape::Parameter(_) => return None,
                OpenShape::Generic { definition, .. } => return Some(definition),
                OpenShape::Array { element, .. } => shape = open_shape(self.factory.model(), element)?,
            }
        }
    }

    /// Current argument vector.
    pub fn arguments(&self) -> &ArgumentVector {
        &self.descriptor.arguments
    }

    /// Every argument, bound or not, in slot order.
    pub fn parameters(&self) -> TypeList {
        self.descriptor.arguments.types()
    }

    /// Distinct generic parameters occurring anywhere in the type, depth-first.
    pub fn generic_parameters(&self) -> &[TypeId] {
        &self.descriptor.generic_parameters
    }

    /// Types of the bound slots.
    pub fn substituted_parameters(&self) -> TypeList {
        self.descriptor.arguments.bound_types()
    }

    // -------------------------------------------------------------------------
    // Hierarchy queries
    // -------------------------------------------------------------------------

    /// Whether the type is, derives from or implements a type constructed
    /// from `target`. Arrays match array targets of equal rank elementwise.
    pub fn is_implements_generic_definition(&self, target: TypeId) -> bool {
        let model = self.factory.model();
        let query_id = query_trace::enabled().then(|| {
            let query_id = query_trace::next_query_id();
            query_trace::relation_start(query_id, "is_implements_generic_definition", self.descriptor.ty, target);
            query_id
        });

        let result = implements_generic_definition(model, self.descriptor.ty, target);

        if let Some(query_id) = query_id {
            query_trace::bool_end(query_id, "is_implements_generic_definition", result);
        }
        result
    }

    /// Arguments of this type relative to `target` (a generic definition, or
    /// an array of one).
    ///
    /// `NoSuchAncestor` when neither the type nor any ancestor is constructed
    /// from `target`; `UnsupportedShape` on array rank or nesting mismatch.
    pub fn get_generic_arguments_relative_to(&self, target: TypeId) -> AnalysisResult<ArgumentVector> {
        let model = self.factory.model();
        let args = generic_arguments_relative_to(model, self.descriptor.ty, target)?;
        Ok(ArgumentVector::from_types(model, &args))
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Bindings the generic parameters take when this type is matched
    /// against `concrete`, in `generic_parameters()` order.
    ///
    /// With `allow_inheritance` the concrete type may be any type deriving
    /// from or implementing this type's definition; otherwise definitions
    /// must match exactly. Closed slots must equal the concrete slot
    /// (`ArgumentMismatch`), and so must two occurrences of one parameter.
    pub fn get_completed_generic_arguments(&self, concrete: TypeId, allow_inheritance: bool) -> AnalysisResult<TypeList> {
        let model = self.factory.model();
        let query_id = query_trace::enabled().then(|| {
            let query_id = query_trace::next_query_id();
            query_trace::relation_start(query_id, "get_completed_generic_arguments", self.descriptor.ty, concrete);
            query_id
        });

        let mut completion = Completion::new(model);
        let result = match self.descriptor.shape {
            OpenShape::Parameter(param) => completion.bind(param, concrete),
            OpenShape::Generic {
                definition,
                effective,
            } => completion.complete_generic(
                definition,
                &model.generic_arguments(effective),
                concrete,
                allow_inheritance,
            ),
            OpenShape::Array { .. } => completion.complete(self.descriptor.ty, concrete, allow_inheritance),
        }
        .and_then(|()| completion.finish(&self.descriptor.generic_parameters));

        if let Some(query_id) = query_id {
            query_trace::bool_end(query_id, "get_completed_generic_arguments", result.is_ok());
        }
        result
    }

    pub fn try_get_completed_generic_arguments(&self, concrete: TypeId, allow_inheritance: bool) -> Option<TypeList> {
        self.get_completed_generic_arguments(concrete, allow_inheritance)
            .map_err(|err| {
                trace!(
                    ty = self.descriptor.ty.0,
                    concrete = concrete.0,
                    %err,
                    "try_get_completed_generic_arguments"
                );
            })
            .ok()
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Bind the generic parameters to `provided` (one per parameter, in
    /// `generic_parameters()` order) and construct the resulting type.
    ///
    /// With `validate_on_construct` set, each binding is first checked against
    /// its own parameter's constraints (other bindings substituted). Then every
    /// constructed generic in the result, array elements included, is checked
    /// against its definition, so already bound slots are validated together
    /// with the new ones.
    pub fn make_generic_type_extended(&self, provided: &[TypeId]) -> AnalysisResult<TypeId> {
        let model = self.factory.model();
        let subst = self.substitution_for(provided)?;
        if self.factory.options().validate_on_construct
            && let Some((parameter, candidate)) = self.first_violation(provided, &subst)?
        {
            return Err(AnalysisError::ConstraintViolation {
                parameter,
                candidate: model.display_type(candidate),
            });
        }
        Ok(instantiate_type(model, self.descriptor.ty, &subst)?)
    }

    /// Whether `make_generic_type_extended(provided)` would pass validation.
    pub fn satisfies_constraints_for_construction(&self, provided: &[TypeId]) -> bool {
        let checked = self
            .substitution_for(provided)
            .and_then(|subst| self.first_violation(provided, &subst));
        match checked {
            Ok(violation) => violation.is_none(),
            Err(err) => {
                trace!(ty = self.descriptor.ty.0, %err, "satisfies_constraints_for_construction");
                false
            }
        }
    }

    fn substitution_for(&self, provided: &[TypeId]) -> AnalysisResult<TypeSubstitution> {
        let params = &self.descriptor.generic_parameters;
        if provided.len() != params.len() {
            return Err(AnalysisError::InvalidArgument(format!(
                "{} has {} unbound parameters, got {} arguments",
                self.factory.model().display_type(self.descriptor.ty),
                params.len(),
                provided.len()
            )));
        }
        Ok(TypeSubstitution::from_args(params, provided))
    }

    /// First (parameter name, candidate) pair whose constraint fails.
    fn first_violation(
        &self,
        provided: &[TypeId],
        subst: &TypeSubstitution,
    ) -> AnalysisResult<Option<(String, TypeId)>> {
        let model = self.factory.model();
        for (&param, &arg) in self.descriptor.generic_parameters.iter().zip(provided) {
            let analyzer = self.factory.parameter_analyzer_unsynced(param)?;
            let constraints = analyzer
                .type_constraints()
                .iter()
                .map(|&c| instantiate_type(model, c, subst))
                .collect::<Result<Vec<_>, _>>()?;
            if !analyzer.satisfies_constraints_with(arg, &constraints) {
                return Ok(Some((model.display_type(param), arg)));
            }
        }

        let constructed = instantiate_type(model, self.descriptor.ty, subst)?;
        let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeTree);
        self.first_node_violation(constructed, &mut guard)
    }

    /// Check `ty` and every generic nested in it against its definition,
    /// innermost first.
    fn first_node_violation(
        &self,
        ty: TypeId,
        guard: &mut RecursionGuard<TypeId>,
    ) -> AnalysisResult<Option<(String, TypeId)>> {
        let model = self.factory.model();
        if !guard.enter(ty).is_entered() {
            return Ok(None);
        }
        let found = self.node_violation(model, ty, guard);
        guard.leave(ty);
        found
    }

    fn node_violation(
        &self,
        model: &dyn TypeModel,
        ty: TypeId,
        guard: &mut RecursionGuard<TypeId>,
    ) -> AnalysisResult<Option<(String, TypeId)>> {
        if let Some(element) = model.element_type(ty) {
            return self.first_node_violation(element, guard);
        }
        let Some(definition) = model.generic_definition(ty).filter(|&def| def != ty) else {
            return Ok(None);
        };
        let args = model.generic_arguments(ty);
        for &arg in args.iter() {
            if let Some(found) = self.first_node_violation(arg, guard)? {
                return Ok(Some(found));
            }
        }
        let analyzer = self.factory.definition_analyzer_unsynced(definition)?;
        Ok(analyzer.first_violation(&args)?.map(|position| {
            let parameter = analyzer
                .parameter_name(position)
                .map_or_else(|| position.to_string(), str::to_string);
            (parameter, args[position])
        }))
    }
}

fn implements_generic_definition(model: &dyn TypeModel, ty: TypeId, target: TypeId) -> bool {
    if model.is_array(target) {
        let (Some(element), Some(target_element)) = (model.element_type(ty), model.element_type(target)) else {
            return false;
        };
        if model.array_rank(ty) != model.array_rank(target) {
            return false;
        }
        if model.is_generic_parameter(target_element) {
            return !model.is_array(element);
        }
        return implements_generic_definition(model, element, target_element);
    }
    find_generic_ancestor(model, ty, target).is_some()
}

// =============================================================================
// Completion
// =============================================================================

/// Parameter bindings collected while unifying an open type tree with a
/// concrete one.
struct Completion<'m> {
    model: &'m dyn TypeModel,
    bindings: IndexMap<TypeId, TypeId>,
}

impl<'m> Completion<'m> {
    fn new(model: &'m dyn TypeModel) -> Self {
        Self {
            model,
            bindings: IndexMap::new(),
        }
    }

    fn bind(&mut self, param: TypeId, concrete: TypeId) -> AnalysisResult<()> {
        match self.bindings.get(&param) {
            Some(&existing) if existing != concrete => Err(AnalysisError::ArgumentMismatch {
                context: self.model.display_type(param),
                expected: self.model.display_type(existing),
                actual: self.model.display_type(concrete),
            }),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(param, concrete);
                Ok(())
            }
        }
    }

    /// Match one open node against one concrete node.
    fn complete(&mut self, open: TypeId, concrete: TypeId, allow_inheritance: bool) -> AnalysisResult<()> {
        let model = self.model;
        if model.is_generic_parameter(open) {
            return self.bind(open, concrete);
        }

        if model.is_array(open) {
            let (Some(open_element), Some(element)) = (model.element_type(open), model.element_type(concrete)) else {
                return Err(AnalysisError::UnsupportedShape(format!(
                    "{} is not an array, expected a match for {}",
                    model.display_type(concrete),
                    model.display_type(open)
                )));
            };
            if model.array_rank(open) != model.array_rank(concrete) {
                return Err(AnalysisError::UnsupportedShape(format!(
                    "array rank mismatch: {} vs {}",
                    model.display_type(open),
                    model.display_type(concrete)
                )));
            }
            return self.complete(open_element, element, allow_inheritance);
        }

        if !model.contains_generic_parameters(open) {
            if open == concrete || (allow_inheritance && is_assignable(model, concrete, open)) {
                return Ok(());
            }
            return Err(AnalysisError::ArgumentMismatch {
                context: "completion".to_string(),
                expected: model.display_type(open),
                actual: model.display_type(concrete),
            });
        }

        let Some(definition) = model.generic_definition(open) else {
            return Err(AnalysisError::UnsupportedShape(format!(
                "{} carries parameters but is not generic",
                model.display_type(open)
            )));
        };
        self.complete_generic(definition, &model.generic_arguments(open), concrete, allow_inheritance)
    }

    /// Match the arguments of an open generic node against the concrete
    /// type's arguments for the same definition. Nested slots are invariant.
    fn complete_generic(
        &mut self,
        definition: TypeId,
        open_args: &[TypeId],
        concrete: TypeId,
        allow_inheritance: bool,
    ) -> AnalysisResult<()> {
        let model = self.model;
        let concrete_args = if allow_inheritance {
            generic_arguments_relative_to(model, concrete, definition)?
        } else if model.generic_definition(concrete) == Some(definition) {
            model.generic_arguments(concrete)
        } else {
            return Err(AnalysisError::ArgumentMismatch {
                context: "completion".to_string(),
                expected: model.display_type(definition),
                actual: model.display_type(concrete),
            });
        };

        if concrete_args.len() != open_args.len() {
            return Err(AnalysisError::UnsupportedShape(format!(
                "{} resolved {} arguments for {}, expected {}",
                model.display_type(concrete),
                concrete_args.len(),
                model.display_type(definition),
                open_args.len()
            )));
        }
        for (&open_arg, &concrete_arg) in open_args.iter().zip(&concrete_args) {
            self.complete(open_arg, concrete_arg, false)?;
        }
        Ok(())
    }

    fn finish(&self, params: &[TypeId]) -> AnalysisResult<TypeList> {
        params
            .iter()
            .map(|param| {
                self.bindings.get(param).copied().ok_or_else(|| {
                    AnalysisError::UnsupportedShape(format!(
                        "parameter {} was not reached during completion",
                        self.model.display_type(*param)
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/open_type_tests.rs"]
mod tests;
