//! Analyzer configuration.

use crate::limits::MAX_INFERENCE_PASSES;
use serde::{Deserialize, Serialize};

/// Tunables for an analyzer factory.
///
/// All fields have defaults, so a partial JSON/TOML document deserializes:
///
/// ```ignore
/// let options: AnalyzerOptions = serde_json::from_str(r#"{ "max_inference_passes": 4 }"#)?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerOptions {
    /// Cap on inference passes. The effective bound is
    /// `min(arity + 1, max_inference_passes)`.
    pub max_inference_passes: u32,

    /// Whether `make_generic_type_extended` checks newly bound slots against
    /// their parameter constraints, and every constructed generic in the
    /// result against its definition, before constructing.
    pub validate_on_construct: bool,

    /// Whether the factory compares the model generation on every lookup and
    /// drops stale descriptors after new types are loaded.
    pub track_generation: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_inference_passes: MAX_INFERENCE_PASSES,
            validate_on_construct: true,
            track_generation: true,
        }
    }
}

impl AnalyzerOptions {
    /// Effective pass bound for a definition with `arity` parameters.
    pub fn inference_passes_for(&self, arity: usize) -> u32 {
        let natural = u32::try_from(arity).unwrap_or(u32::MAX).saturating_add(1);
        natural.min(self.max_inference_passes.max(1))
    }

    pub const fn with_max_inference_passes(mut self, passes: u32) -> Self {
        self.max_inference_passes = passes;
        self
    }

    pub const fn with_validate_on_construct(mut self, validate: bool) -> Self {
        self.validate_on_construct = validate;
        self
    }

    pub const fn with_track_generation(mut self, track: bool) -> Self {
        self.track_generation = track;
        self
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
