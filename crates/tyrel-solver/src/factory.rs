//! Analyzer factory: classification, dispatch and descriptor caching.
//!
//! The factory is an explicit context object, one per type universe. It
//! memoizes one descriptor per distinct type key. Analyzers handed out are
//! cheap borrowed handles over a cached descriptor and the factory, so
//! recursive queries (parameters, ancestors, constraints) go back through the
//! same caches.
//!
//! ## Publication
//!
//! Descriptors are pure functions of type metadata. They are built outside
//! any map lock and published with an atomic insert-if-absent: when two
//! threads race on first use, the loser's descriptor is dropped and both get
//! the first one published.
//!
//! ## Invalidation
//!
//! `refresh()` clears every cache. With `AnalyzerOptions::track_generation`
//! each public lookup also compares the model's `generation()` with the
//! generation the caches were filled at, and clears them when new types were
//! loaded since.

use crate::classify::{AnalyzerKind, classify};
use crate::definition::{DefinitionAnalyzer, DefinitionDescriptor};
use crate::error::{AnalysisError, AnalysisResult};
use crate::open_type::{OpenTypeAnalyzer, OpenTypeDescriptor};
use crate::parameter::{ParameterAnalyzer, ParameterDescriptor};
use crate::query_trace;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};
use tyrel_common::AnalyzerOptions;
use tyrel_model::{TypeId, TypeModel};

/// Global counter for assigning unique instance IDs to factories.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Entry counts and lookup statistics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub parameters: usize,
    pub definitions: usize,
    pub open_types: usize,
    pub hits: u64,
    pub misses: u64,
    /// Model generation the caches currently reflect.
    pub generation: u64,
}

/// Any analyzer, as returned by `AnalyzerFactory::get_analyzer`.
#[derive(Clone, Debug)]
pub enum Analyzer<'f> {
    Parameter(ParameterAnalyzer<'f>),
    Definition(DefinitionAnalyzer<'f>),
    OpenType(OpenTypeAnalyzer<'f>),
}

impl<'f> Analyzer<'f> {
    pub fn kind(&self) -> AnalyzerKind {
        match self {
            Self::Parameter(_) => AnalyzerKind::Parameter,
            Self::Definition(_) => AnalyzerKind::Definition,
            Self::OpenType(_) => AnalyzerKind::OpenType,
        }
    }

    /// The type this analyzer was requested for.
    pub fn analyzed_type(&self) -> TypeId {
        match self {
            Self::Parameter(a) => a.parameter(),
            Self::Definition(a) => a.definition(),
            Self::OpenType(a) => a.analyzed_type(),
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterAnalyzer<'f>> {
        match self {
            Self::Parameter(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_definition(&self) -> Option<&DefinitionAnalyzer<'f>> {
        match self {
            Self::Definition(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_open_type(&self) -> Option<&OpenTypeAnalyzer<'f>> {
        match self {
            Self::OpenType(a) => Some(a),
            _ => None,
        }
    }
}

/// Memoizing analyzer factory over one type model.
pub struct AnalyzerFactory {
    /// Unique instance ID for debugging
    instance_id: u64,
    model: Arc<dyn TypeModel>,
    options: AnalyzerOptions,
    parameters: DashMap<TypeId, Arc<ParameterDescriptor>>,
    definitions: DashMap<TypeId, Arc<DefinitionDescriptor>>,
    open_types: DashMap<TypeId, Arc<OpenTypeDescriptor>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for AnalyzerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerFactory")
            .field("instance_id", &self.instance_id)
            .field("options", &self.options)
            .field("stats", &self.cache_stats())
            .finish()
    }
}

impl AnalyzerFactory {
    pub fn new(model: Arc<dyn TypeModel>) -> Self {
        Self::with_options(model, AnalyzerOptions::default())
    }

    pub fn with_options(model: Arc<dyn TypeModel>, options: AnalyzerOptions) -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        let generation = model.generation();
        trace!(instance_id, generation, ?options, "AnalyzerFactory::new");
        Self {
            instance_id,
            model,
            options,
            parameters: DashMap::new(),
            definitions: DashMap::new(),
            open_types: DashMap::new(),
            generation: AtomicU64::new(generation),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn model(&self) -> &dyn TypeModel {
        &*self.model
    }

    /// Shared handle to the model, for consumers that outlive a borrow.
    pub fn model_arc(&self) -> Arc<dyn TypeModel> {
        Arc::clone(&self.model)
    }

    #[inline]
    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    // -------------------------------------------------------------------------
    // Public entry points
    // -------------------------------------------------------------------------

    /// Classify `ty` and return the matching analyzer.
    ///
    /// Parameters get a parameter analyzer, generic definitions a definition
    /// analyzer, constructed generics / open arrays / generic-derived types an
    /// open-type analyzer. Anything else is `InvalidArgument`, closed arrays
    /// such as `string[]` included even though they implement
    /// `IEnumerable<string>`; query those through
    /// `generic_arguments_relative_to` instead.
    pub fn get_analyzer(&self, ty: TypeId) -> AnalysisResult<Analyzer<'_>> {
        self.sync_generation();
        let trace_enabled = query_trace::enabled();
        let query_id = trace_enabled.then(|| {
            let query_id = query_trace::next_query_id();
            query_trace::unary_start(query_id, "get_analyzer", ty);
            query_id
        });
        let hits_before = self.hits.load(Ordering::Relaxed);

        let result = match classify(self.model(), ty) {
            Some(AnalyzerKind::Parameter) => self.parameter_analyzer_unsynced(ty).map(Analyzer::Parameter),
            Some(AnalyzerKind::Definition) => self.definition_analyzer_unsynced(ty).map(Analyzer::Definition),
            Some(AnalyzerKind::OpenType) => self.open_type_analyzer_unsynced(ty).map(Analyzer::OpenType),
            None => Err(AnalysisError::InvalidArgument(format!(
                "{} is neither a generic parameter, a generic type, nor derived from one",
                self.model.display_type(ty)
            ))),
        };

        if let Some(query_id) = query_id {
            let cache_hit = self.hits.load(Ordering::Relaxed) > hits_before;
            query_trace::type_end(query_id, "get_analyzer", result.is_ok().then_some(ty), cache_hit);
        }
        result
    }

    pub fn parameter_analyzer(&self, ty: TypeId) -> AnalysisResult<ParameterAnalyzer<'_>> {
        self.sync_generation();
        self.parameter_analyzer_unsynced(ty)
    }

    pub fn definition_analyzer(&self, ty: TypeId) -> AnalysisResult<DefinitionAnalyzer<'_>> {
        self.sync_generation();
        self.definition_analyzer_unsynced(ty)
    }

    /// Open-type analyzer for any open shape, generic definitions included.
    pub fn open_type_analyzer(&self, ty: TypeId) -> AnalysisResult<OpenTypeAnalyzer<'_>> {
        self.sync_generation();
        self.open_type_analyzer_unsynced(ty)
    }

    /// Drop every cached descriptor.
    pub fn refresh(&self) {
        self.clear_caches();
        self.generation
            .store(self.model.generation(), Ordering::SeqCst);
        debug!(instance_id = self.instance_id, "AnalyzerFactory::refresh");
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            parameters: self.parameters.len(),
            definitions: self.definitions.len(),
            open_types: self.open_types.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    // -------------------------------------------------------------------------
    // Descriptor caches
    // -------------------------------------------------------------------------

    pub(crate) fn parameter_analyzer_unsynced(&self, ty: TypeId) -> AnalysisResult<ParameterAnalyzer<'_>> {
        let descriptor = self.parameter_descriptor(ty)?;
        Ok(ParameterAnalyzer::new(self, descriptor))
    }

    pub(crate) fn definition_analyzer_unsynced(&self, ty: TypeId) -> AnalysisResult<DefinitionAnalyzer<'_>> {
        let descriptor = self.definition_descriptor(ty)?;
        Ok(DefinitionAnalyzer::new(self, descriptor))
    }

    pub(crate) fn open_type_analyzer_unsynced(&self, ty: TypeId) -> AnalysisResult<OpenTypeAnalyzer<'_>> {
        let descriptor = self.open_type_descriptor(ty)?;
        Ok(OpenTypeAnalyzer::new(self, descriptor))
    }

    pub(crate) fn parameter_descriptor(&self, ty: TypeId) -> AnalysisResult<Arc<ParameterDescriptor>> {
        if let Some(existing) = self.lookup(&self.parameters, ty) {
            return Ok(existing);
        }
        let built = Arc::new(ParameterDescriptor::build(self.model(), ty)?);
        Ok(self.publish(&self.parameters, ty, built))
    }

    pub(crate) fn definition_descriptor(&self, ty: TypeId) -> AnalysisResult<Arc<DefinitionDescriptor>> {
        if let Some(existing) = self.lookup(&self.definitions, ty) {
            return Ok(existing);
        }
        let built = Arc::new(DefinitionDescriptor::build(self, ty)?);
        Ok(self.publish(&self.definitions, ty, built))
    }

    pub(crate) fn open_type_descriptor(&self, ty: TypeId) -> AnalysisResult<Arc<OpenTypeDescriptor>> {
        if let Some(existing) = self.lookup(&self.open_types, ty) {
            return Ok(existing);
        }
        let built = Arc::new(OpenTypeDescriptor::build(self.model(), ty)?);
        Ok(self.publish(&self.open_types, ty, built))
    }

    fn lookup<T>(&self, map: &DashMap<TypeId, Arc<T>>, ty: TypeId) -> Option<Arc<T>> {
        let found = map.get(&ty).map(|entry| Arc::clone(entry.value()));
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Insert-if-absent; returns whichever descriptor ends up in the map.
    fn publish<T>(&self, map: &DashMap<TypeId, Arc<T>>, ty: TypeId, built: Arc<T>) -> Arc<T> {
        let published = Arc::clone(map.entry(ty).or_insert(built).value());
        trace!(
            instance_id = self.instance_id,
            type_id = ty.0,
            "AnalyzerFactory: descriptor published"
        );
        published
    }

    fn clear_caches(&self) {
        self.parameters.clear();
        self.definitions.clear();
        self.open_types.clear();
    }

    /// Clear the caches when the model has loaded new types since they were
    /// filled.
    fn sync_generation(&self) {
        if !self.options.track_generation {
            return;
        }
        let current = self.model.generation();
        let seen = self.generation.load(Ordering::SeqCst);
        if current == seen {
            return;
        }
        if self
            .generation
            .compare_exchange(seen, current, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!(
                instance_id = self.instance_id,
                from = seen,
                to = current,
                "AnalyzerFactory: model generation changed, clearing caches"
            );
            self.clear_caches();
        }
    }
}

#[cfg(test)]
#[path = "../tests/factory_tests.rs"]
mod tests;
