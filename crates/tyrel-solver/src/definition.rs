//! Definition analyzer: argument-vector validation, inference and validated
//! construction for one generic definition.
//!
//! ## Inference
//!
//! `try_infer_type_arguments` is a bounded fixpoint over the dependency graph.
//! Each pass visits the unbound slots; a slot is bound from the first
//! dependent sibling that is already bound and lets
//! `ParameterAnalyzer::try_infer_type_from` succeed. Passes repeat until one
//! makes no progress. Bindings are only ever added, so the loop terminates
//! within `arity` productive passes.
//!
//! Mutually dependent parameters that are both unbound stay unbound: this is
//! propagation, not unification.

use crate::arguments::{ArgumentSlot, ArgumentVector};
use crate::error::{AnalysisError, AnalysisResult};
use crate::factory::AnalyzerFactory;
use crate::parameter::{ParameterAnalyzer, ParameterDescriptor};
use crate::query_trace;
use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use tyrel_model::{SpecialConstraints, TypeId, TypeSubstitution, instantiate_type};

/// Parameter descriptors of one generic definition, in position order.
#[derive(Clone, Debug)]
pub struct DefinitionDescriptor {
    pub(crate) definition: TypeId,
    pub(crate) parameters: Vec<Arc<ParameterDescriptor>>,
    pub(crate) by_name: FxHashMap<Arc<str>, usize>,
}

impl DefinitionDescriptor {
    pub(crate) fn build(factory: &AnalyzerFactory, definition: TypeId) -> AnalysisResult<Self> {
        let model = factory.model();
        if !model.is_generic_definition(definition) {
            return Err(AnalysisError::InvalidArgument(format!(
                "{} is not a generic type definition",
                model.display_type(definition)
            )));
        }

        let params = model.generic_arguments(definition);
        let mut parameters = Vec::with_capacity(params.len());
        let mut by_name = FxHashMap::default();
        for (index, &param) in params.iter().enumerate() {
            let descriptor = factory.parameter_descriptor(param)?;
            if descriptor.position as usize != index || descriptor.owner != definition {
                return Err(AnalysisError::InvalidArgument(format!(
                    "parameter {} of {} reports position {} (expected {index})",
                    descriptor.name,
                    model.display_type(definition),
                    descriptor.position
                )));
            }
            by_name.insert(Arc::clone(&descriptor.name), index);
            parameters.push(descriptor);
        }

        trace!(definition = definition.0, arity = parameters.len(), "DefinitionDescriptor::build");
        Ok(Self {
            definition,
            parameters,
            by_name,
        })
    }
}

/// Result of `DefinitionAnalyzer::try_infer_type_arguments`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceOutcome {
    /// Whether at least one slot was bound.
    pub changed: bool,
    pub arguments: ArgumentVector,
}

/// Serializable snapshot of a definition's dependency graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub definition: String,
    pub parameters: Vec<DependencyNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    pub name: String,
    pub position: u32,
    pub special: SpecialConstraints,
    pub constraints: Vec<String>,
    pub references: Vec<String>,
    pub referenced_by: Vec<String>,
}

/// Analyzer for a generic definition.
#[derive(Clone)]
pub struct DefinitionAnalyzer<'f> {
    factory: &'f AnalyzerFactory,
    descriptor: Arc<DefinitionDescriptor>,
}

impl fmt::Debug for DefinitionAnalyzer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionAnalyzer")
            .field("definition", &self.descriptor.definition)
            .field("arity", &self.descriptor.parameters.len())
            .finish()
    }
}

impl<'f> DefinitionAnalyzer<'f> {
    pub(crate) fn new(factory: &'f AnalyzerFactory, descriptor: Arc<DefinitionDescriptor>) -> Self {
        Self {
            factory,
            descriptor,
        }
    }

    #[inline]
    pub fn definition(&self) -> TypeId {
        self.descriptor.definition
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.descriptor.parameters.len()
    }

    /// Parameter types, in position order.
    pub fn parameter_types(&self) -> Vec<TypeId> {
        self.descriptor.parameters.iter().map(|p| p.param).collect()
    }

    pub fn parameter(&self, position: usize) -> Option<ParameterAnalyzer<'f>> {
        let descriptor = self.descriptor.parameters.get(position)?;
        Some(ParameterAnalyzer::new(self.factory, Arc::clone(descriptor)))
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<ParameterAnalyzer<'f>> {
        let &position = self.descriptor.by_name.get(name)?;
        self.parameter(position)
    }

    pub fn parameters(&self) -> impl Iterator<Item = ParameterAnalyzer<'f>> + '_ {
        self.descriptor
            .parameters
            .iter()
            .map(|descriptor| ParameterAnalyzer::new(self.factory, Arc::clone(descriptor)))
    }

    // -------------------------------------------------------------------------
    // Validation and construction
    // -------------------------------------------------------------------------

    /// Whether `args` satisfies every parameter's constraints.
    ///
    /// Each parameter's type constraints are checked after substituting the
    /// whole vector into them, so cross-parameter constraints
    /// (`TValue : IContainer<TKey>`) see the sibling bindings. A slot that is
    /// still its own parameter is checked as such.
    ///
    /// Arity mismatch is `InvalidArgument`.
    pub fn validate_type_arguments(&self, args: &[TypeId]) -> AnalysisResult<bool> {
        self.check_arity(args.len())?;
        let query_id = query_trace::enabled().then(|| {
            let query_id = query_trace::next_query_id();
            query_trace::vector_start(query_id, "validate_type_arguments", self.definition(), args.len());
            query_id
        });

        let result = self.first_violation(args)?.is_none();

        if let Some(query_id) = query_id {
            query_trace::bool_end(query_id, "validate_type_arguments", result);
        }
        Ok(result)
    }

    /// Predicate form of `validate_type_arguments`: any error answers `false`.
    pub fn satisfies_constraints_for_construction(&self, args: &[TypeId]) -> bool {
        self.validate_type_arguments(args).unwrap_or_else(|err| {
            trace!(definition = self.definition().0, %err, "satisfies_constraints_for_construction");
            false
        })
    }

    /// Construct `definition<args...>`, checking constraints first when
    /// `validate_on_construct` is set.
    pub fn make_generic_type(&self, args: &[TypeId]) -> AnalysisResult<TypeId> {
        self.check_arity(args.len())?;
        let model = self.factory.model();
        if self.factory.options().validate_on_construct
            && let Some(position) = self.first_violation(args)?
        {
            return Err(AnalysisError::ConstraintViolation {
                parameter: self.descriptor.parameters[position].name.to_string(),
                candidate: model.display_type(args[position]),
            });
        }
        Ok(model.make_generic_type(self.definition(), args)?)
    }

    pub(crate) fn parameter_name(&self, position: usize) -> Option<&str> {
        self.descriptor.parameters.get(position).map(|p| &*p.name)
    }

    /// Position of the first slot failing its constraints.
    pub(crate) fn first_violation(&self, args: &[TypeId]) -> AnalysisResult<Option<usize>> {
        let model = self.factory.model();
        let subst = TypeSubstitution::from_args(&self.parameter_types(), args);
        for (position, descriptor) in self.descriptor.parameters.iter().enumerate() {
            let constraints = descriptor
                .constraints
                .iter()
                .map(|&c| instantiate_type(model, c, &subst))
                .collect::<Result<Vec<_>, _>>()?;
            let analyzer = ParameterAnalyzer::new(self.factory, Arc::clone(descriptor));
            if !analyzer.satisfies_constraints_with(args[position], &constraints) {
                trace!(
                    definition = self.definition().0,
                    position,
                    candidate = args[position].0,
                    "validate_type_arguments: constraint violated"
                );
                return Ok(Some(position));
            }
        }
        Ok(None)
    }

    fn check_arity(&self, actual: usize) -> AnalysisResult<()> {
        if actual != self.arity() {
            return Err(AnalysisError::InvalidArgument(format!(
                "{} expects {} type arguments, got {actual}",
                self.factory.model().display_type(self.definition()),
                self.arity()
            )));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inference
    // -------------------------------------------------------------------------

    /// Bind unresolved slots of `args` from the bound slots they depend on.
    ///
    /// A slot is unresolved when it holds a generic parameter. Returns a new
    /// vector; `changed` is false when nothing was unresolved or no slot
    /// could be inferred. Running it again on its own output is a no-op.
    ///
    /// Bindings flow only from a bound slot to the parameters its constraints
    /// mention (bound `TValue` yields `TKey`), never the reverse.
    pub fn try_infer_type_arguments(&self, args: &[TypeId]) -> AnalysisResult<InferenceOutcome> {
        self.check_arity(args.len())?;
        let model = self.factory.model();
        let mut arguments = ArgumentVector::from_types(model, args);
        if arguments.is_fully_bound() {
            return Ok(InferenceOutcome {
                changed: false,
                arguments,
            });
        }

        let query_id = query_trace::enabled().then(|| {
            let query_id = query_trace::next_query_id();
            query_trace::vector_start(query_id, "try_infer_type_arguments", self.definition(), args.len());
            query_id
        });

        let mut bound = FixedBitSet::with_capacity(arguments.len());
        for (index, slot) in arguments.iter().enumerate() {
            bound.set(index, slot.is_bound());
        }

        let max_passes = self.factory.options().inference_passes_for(self.arity());
        let mut changed = false;
        let mut passes = 0;
        while passes < max_passes {
            passes += 1;
            let mut progress = false;
            for index in 0..arguments.len() {
                if bound.contains(index) {
                    continue;
                }
                if let Some(ty) = self.infer_slot(index, &arguments, &bound)? {
                    trace!(
                        definition = self.definition().0,
                        position = index,
                        inferred = ty.0,
                        pass = passes,
                        "try_infer_type_arguments: slot bound"
                    );
                    arguments.bind(index, ty);
                    bound.insert(index);
                    progress = true;
                }
            }
            if !progress {
                break;
            }
            changed = true;
        }

        debug!(
            definition = %model.display_type(self.definition()),
            changed,
            passes,
            remaining_unbound = arguments.len() - bound.count_ones(..),
            "try_infer_type_arguments"
        );
        if let Some(query_id) = query_id {
            query_trace::bool_end(query_id, "try_infer_type_arguments", changed);
        }
        Ok(InferenceOutcome { changed, arguments })
    }

    fn infer_slot(&self, index: usize, arguments: &ArgumentVector, bound: &FixedBitSet) -> AnalysisResult<Option<TypeId>> {
        let descriptor = &self.descriptor.parameters[index];
        let analyzer = ParameterAnalyzer::new(self.factory, Arc::clone(descriptor));
        for &dependent in &descriptor.referenced_by {
            let Some(dependent_index) = self.position_of(dependent) else {
                continue;
            };
            if !bound.contains(dependent_index) {
                continue;
            }
            let Some(ArgumentSlot::Bound(concrete)) = arguments.get(dependent_index) else {
                continue;
            };
            if let Some(ty) = analyzer.try_infer_type_from(dependent, concrete)? {
                return Ok(Some(ty));
            }
        }
        Ok(None)
    }

    fn position_of(&self, param: TypeId) -> Option<usize> {
        self.descriptor.parameters.iter().position(|p| p.param == param)
    }

    // -------------------------------------------------------------------------
    // Tooling
    // -------------------------------------------------------------------------

    /// Snapshot of the References / ReferencedBy graph with display names.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let model = self.factory.model();
        let names = |set: &IndexSet<TypeId>| -> Vec<String> { set.iter().map(|&p| model.display_type(p)).collect() };
        DependencyGraph {
            definition: model.display_type(self.definition()),
            parameters: self
                .descriptor
                .parameters
                .iter()
                .map(|p| DependencyNode {
                    name: p.name.to_string(),
                    position: p.position,
                    special: p.special,
                    constraints: p.constraints.iter().map(|&c| model.display_type(c)).collect(),
                    references: names(&p.references),
                    referenced_by: names(&p.referenced_by),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/definition_tests.rs"]
mod tests;
