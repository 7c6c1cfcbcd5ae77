//! Generic-type analysis for the tyrel type model.
//!
//! This crate answers four questions about generic types in a host whose
//! type metadata is exposed through `tyrel_model::TypeModel`:
//!
//! - **Constraints**: what a generic parameter requires, and whether a
//!   candidate satisfies it (`ParameterAnalyzer`)
//! - **Validation**: whether an argument vector satisfies a definition's
//!   constraints, with cross-parameter constraints substituted
//!   (`DefinitionAnalyzer`)
//! - **Relative arguments**: what a type's arguments are relative to an
//!   ancestor definition, and how an open type completes against a concrete
//!   one (`OpenTypeAnalyzer`)
//! - **Inference**: which unbound slots follow from the bound ones through
//!   the parameter dependency graph
//!
//! Analyzers come from an `AnalyzerFactory`, which classifies types and
//! caches one descriptor per type.
//!
//! ## Usage
//!
//! ```ignore
//! let factory = AnalyzerFactory::new(Arc::new(store));
//! let pair = factory.definition_analyzer(pair_def)?;
//! let outcome = pair.try_infer_type_arguments(&[TypeId::INT, tvalue_param])?;
//! ```

pub mod arguments;
pub mod classify;
pub mod definition;
mod error;
pub mod factory;
pub mod hierarchy;
pub mod open_type;
pub mod parameter;
mod query_trace;
pub mod recursion;
pub mod type_tree;

pub use arguments::{ArgumentSlot, ArgumentVector};
pub use classify::{AnalyzerKind, OpenShape, classify, open_shape};
pub use definition::{DefinitionAnalyzer, DependencyGraph, DependencyNode, InferenceOutcome};
pub use error::{AnalysisError, AnalysisResult};
pub use factory::{Analyzer, AnalyzerFactory, CacheStats};
pub use hierarchy::{
    Ancestors, AssignabilityChecker, find_generic_ancestor, generic_arguments_relative_to,
    is_assignable,
};
pub use open_type::OpenTypeAnalyzer;
pub use parameter::ParameterAnalyzer;
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use type_tree::{PathStep, PositionPath};

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod fixtures;

#[cfg(test)]
#[path = "../tests/arguments_tests.rs"]
mod arguments_tests;

#[cfg(test)]
#[path = "../tests/concurrency_tests.rs"]
mod concurrency_tests;
