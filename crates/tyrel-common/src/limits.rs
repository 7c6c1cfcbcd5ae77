//! Centralized limits and thresholds for the generic-type analyzer.
//!
//! Type metadata loaded into a host is finite, but nothing stops a host from
//! describing pathological shapes (a parameter constrained by itself, an
//! interface that lists itself as an ancestor, deeply nested constructions).
//! Every recursive or iterative algorithm in the solver is bounded by one of
//! the constants below.
//!
//! # Categories
//!
//! - **Recursion Depths**: Limits on walks over type trees and hierarchies
//! - **Operation Counts**: Limits on fixpoint iterations

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for rewriting a type tree through a substitution.
///
/// Each nested generic argument or array element adds one level:
///
/// ```text
/// Dictionary<string, List<Pair<int, T[]>>>
/// //          1        2     3       4
/// ```
///
/// Exceeding it surfaces as an `UnsupportedShape` error.
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum depth for walking base types and interfaces.
///
/// Real hierarchies rarely exceed a dozen levels; this only trips on
/// malformed host metadata.
pub const MAX_HIERARCHY_DEPTH: u32 = 100;

/// Maximum depth for constraint checks that recurse through parameter
/// constraints (`T : U`, `U : IFoo<T>`).
///
/// Cycles are detected separately; this bounds long acyclic chains.
pub const MAX_CONSTRAINT_DEPTH: u32 = 32;

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Upper bound on inference passes over a definition's dependency graph.
///
/// A pass that binds nothing ends inference early, so for a definition of
/// arity N at most N + 1 passes ever run. This constant caps hosts with very
/// wide definitions.
pub const MAX_INFERENCE_PASSES: u32 = 64;

/// Upper bound on visited nodes in a single hierarchy traversal.
pub const MAX_HIERARCHY_NODES: u32 = 10_000;
