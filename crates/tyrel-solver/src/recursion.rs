//! Bounded walks over possibly cyclic type metadata.
//!
//! Constraint graphs may loop (`T : U`, `U : T`) and a generic argument may
//! mention its own definition (`Node<Node<T>>`). Every recursive walk in the
//! solver carries a `RecursionGuard` keyed by what it is visiting. Entry is
//! refused when the key is already on the walk, when the walk is too deep,
//! or when it has done too much work overall.
//!
//! Limits come from named profiles over `tyrel_common::limits`:
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::Assignability);
//! ```
//!
//! Debug builds panic when a guard is dropped with keys still entered, which
//! catches a missing `leave()` on an early return.

use rustc_hash::FxHashSet;
use std::hash::Hash;
use tyrel_common::limits::{MAX_CONSTRAINT_DEPTH, MAX_HIERARCHY_DEPTH, MAX_HIERARCHY_NODES};

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Which walk a guard protects, and therefore which limits apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// `is_assignable` following parameter constraints.
    Assignability,
    /// Descent through generic arguments and array elements.
    TypeTree,
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::Assignability => MAX_CONSTRAINT_DEPTH,
            Self::TypeTree => MAX_HIERARCHY_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::Assignability | Self::TypeTree => MAX_HIERARCHY_NODES,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// Outcome of `RecursionGuard::enter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already on the current walk.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        self == Self::Entered
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        self == Self::Cycle
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Keys currently entered, plus depth and work counters.
///
/// Every `Entered` must be paired with a `leave` of the same key; `scope`
/// does the pairing for closures.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    on_walk: FxHashSet<K>,
    depth: u32,
    steps: u32,
    profile: RecursionProfile,
    hit_limit: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self::with_profile(RecursionProfile::Custom {
            max_depth,
            max_iterations,
        })
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            on_walk: FxHashSet::default(),
            depth: 0,
            steps: 0,
            profile,
            hit_limit: false,
        }
    }

    /// Every call counts towards the iteration budget, refused or not.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.steps = self.steps.saturating_add(1);
        let outcome = if self.steps > self.profile.max_iterations() {
            RecursionResult::IterationExceeded
        } else if self.depth >= self.profile.max_depth() {
            RecursionResult::DepthExceeded
        } else if !self.on_walk.insert(key) {
            RecursionResult::Cycle
        } else {
            self.depth += 1;
            RecursionResult::Entered
        };
        if outcome.is_exceeded() {
            self.hit_limit = true;
        }
        outcome
    }

    pub fn leave(&mut self, key: K) {
        let removed = self.on_walk.remove(&key);
        debug_assert!(removed, "RecursionGuard::leave without a matching enter");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` with `key` entered. `f` gets the guard back to recurse with.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce(&mut Self) -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let value = f(self);
                self.leave(key);
                Ok(value)
            }
            refused => Err(refused),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.on_walk.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.steps
    }

    /// Whether any `enter` so far was refused for a limit. Never resets.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.hit_limit
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.on_walk.is_empty() {
            panic!("RecursionGuard dropped with {} keys still entered", self.on_walk.len());
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
