//! Member-path resolution.
//!
//! Resolves a parsed path against a root type, one step at a time. Member
//! lookup walks the root's ancestors (base chain, then interfaces) and the
//! first ancestor declaring the name wins. A member declared on a generic
//! ancestor has its declared type rewritten through the accessed type's
//! arguments relative to that ancestor, so `Orders[0]` on a `List<Order>`
//! yields `Order`, not `T`.
//!
//! Resolved paths are cached per `(root, path, static)` and dropped when the
//! model's generation moves.

use crate::accessor::AccessorBuilder;
use crate::error::AccessError;
use crate::invoker::{InvokerBuilder, MethodCandidate};
use crate::path::{MemberPath, PathToken};
use crate::step::{AccessStep, StepKind, StepSource};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};
use tyrel_model::{MemberInfo, MemberKind, TypeId, TypeMembers, TypeModel, TypeSubstitution, Value, instantiate_type};
use tyrel_solver::{AnalyzerFactory, Ancestors};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PathKey {
    root: TypeId,
    path: Arc<str>,
    is_static: bool,
}

/// A member path resolved against a root type.
#[derive(Debug)]
pub struct ResolvedPath {
    root: TypeId,
    text: Arc<str>,
    is_static: bool,
    steps: Vec<AccessStep>,
}

impl ResolvedPath {
    /// The path that evaluates to its target.
    pub(crate) fn identity(root: TypeId, is_static: bool) -> Self {
        Self {
            root,
            text: Arc::from(""),
            is_static,
            steps: Vec::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> TypeId {
        self.root
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn steps(&self) -> &[AccessStep] {
        &self.steps
    }

    /// Declared type of the value the path yields.
    pub fn value_type(&self) -> TypeId {
        self.steps.last().map_or(self.root, AccessStep::output_type)
    }

    pub fn is_readable(&self) -> bool {
        self.steps.last().is_none_or(AccessStep::is_readable)
    }

    pub fn is_writable(&self) -> bool {
        self.steps.last().is_some_and(AccessStep::is_writable)
    }

    /// Evaluate the path. `target` is the root instance, `None` for static
    /// paths.
    pub fn get(&self, target: Option<&Value>) -> Result<Value, AccessError> {
        let mut current = target.cloned();
        for step in &self.steps {
            current = Some(step.read(current.as_ref())?);
        }
        current.ok_or_else(|| AccessError::NullTarget(self.text.to_string()))
    }

    /// Evaluate all but the last step, then write through the last.
    pub fn set(&self, target: Option<&Value>, value: Value) -> Result<(), AccessError> {
        let Some((last, prefix)) = self.steps.split_last() else {
            return Err(AccessError::NotWritable(self.text.to_string()));
        };
        let mut current = target.cloned();
        for step in prefix {
            current = Some(step.read(current.as_ref())?);
        }
        last.write(current.as_ref(), value)
    }
}

/// Resolves member paths over a type model and hands out accessor and
/// invoker builders.
pub struct MemberPathResolver<M> {
    model: Arc<M>,
    factory: AnalyzerFactory,
    paths: DashMap<PathKey, Arc<ResolvedPath>>,
    generation: AtomicU64,
}

impl<M> fmt::Debug for MemberPathResolver<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberPathResolver")
            .field("cached_paths", &self.paths.len())
            .field("factory", &self.factory)
            .finish()
    }
}

impl<M> MemberPathResolver<M>
where
    M: TypeModel + TypeMembers + 'static,
{
    pub fn new(model: Arc<M>) -> Self {
        let generation = model.generation();
        let factory = AnalyzerFactory::new(model.clone());
        Self {
            model,
            factory,
            paths: DashMap::new(),
            generation: AtomicU64::new(generation),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Analyzer factory used to rewrite members declared on generic ancestors.
    pub fn factory(&self) -> &AnalyzerFactory {
        &self.factory
    }

    pub fn cached_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn clear_cache(&self) {
        self.paths.clear();
        self.factory.refresh();
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Resolve an instance path against `root`.
    pub fn resolve(&self, root: TypeId, path: &str) -> Result<Arc<ResolvedPath>, AccessError> {
        self.resolve_cached(root, path, false)
    }

    /// Resolve a path whose first member is a static member of `root`.
    pub fn resolve_static(&self, root: TypeId, path: &str) -> Result<Arc<ResolvedPath>, AccessError> {
        self.resolve_cached(root, path, true)
    }

    fn resolve_cached(&self, root: TypeId, path: &str, is_static: bool) -> Result<Arc<ResolvedPath>, AccessError> {
        self.sync_generation();
        let key = PathKey {
            root,
            path: Arc::from(path),
            is_static,
        };
        if let Some(existing) = self.paths.get(&key) {
            trace!(root = root.0, path, is_static, "MemberPathResolver: cache hit");
            return Ok(Arc::clone(existing.value()));
        }

        let parsed = MemberPath::parse(path)?;
        let resolved = Arc::new(self.resolve_parsed(root, &parsed, Arc::clone(&key.path), is_static)?);
        debug!(
            root = %self.model.display_type(root),
            path,
            is_static,
            steps = resolved.steps.len(),
            value_type = %self.model.display_type(resolved.value_type()),
            "MemberPathResolver: resolved"
        );
        Ok(Arc::clone(self.paths.entry(key).or_insert(resolved).value()))
    }

    fn resolve_parsed(
        &self,
        root: TypeId,
        path: &MemberPath,
        text: Arc<str>,
        is_static: bool,
    ) -> Result<ResolvedPath, AccessError> {
        let tokens = path.tokens();
        let mut current = root;
        let mut steps = Vec::with_capacity(tokens.len());
        for (position, token) in tokens.iter().enumerate() {
            let step = match token {
                PathToken::Member(name) => self.member_step(current, name, is_static && position == 0)?,
                PathToken::Index(_) if is_static && position == 0 => {
                    return Err(AccessError::InvalidPath {
                        path: text.to_string(),
                        reason: "a static path must begin with a member".to_string(),
                    });
                }
                PathToken::Index(index) => self.index_step(current, *index)?,
            };
            if position + 1 < tokens.len() && !step.is_readable() {
                return Err(AccessError::NotReadable(step.label().to_string()));
            }
            current = step.output_type();
            steps.push(step);
        }
        Ok(ResolvedPath {
            root,
            text,
            is_static,
            steps,
        })
    }

    fn member_step(&self, ty: TypeId, name: &str, want_static: bool) -> Result<AccessStep, AccessError> {
        let (declaring, member) = self.find_member(ty, name, want_static)?;
        let output = self.rewrite_declared(ty, declaring, member.value_type)?;
        trace!(
            ty = ty.0,
            member = name,
            declaring = declaring.0,
            output = output.0,
            "MemberPathResolver: member step"
        );
        Ok(AccessStep::new(
            StepKind::Member,
            Arc::clone(&member.name),
            ty,
            output,
            StepSource::Member(member),
        ))
    }

    /// First ancestor declaring a non-method member (or a zero-argument
    /// method) called `name` with the requested staticness.
    fn find_member(&self, ty: TypeId, name: &str, want_static: bool) -> Result<(TypeId, Arc<MemberInfo>), AccessError> {
        let model: &dyn TypeModel = &*self.model;
        for ancestor in Ancestors::new(model, ty) {
            let mut matching = self
                .model
                .declared_members(ancestor)
                .into_iter()
                .filter(|m| &*m.name == name && m.is_static == want_static)
                .peekable();
            let Some(first) = matching.peek().cloned() else {
                continue;
            };
            let chosen = matching
                .find(|m| m.kind() != MemberKind::Method || m.parameters.is_empty())
                .unwrap_or(first);
            return Ok((ancestor, chosen));
        }
        Err(AccessError::MemberNotFound {
            ty: self.model.display_type(ty),
            member: name.to_string(),
            kind: if want_static { "static" } else { "instance" },
        })
    }

    fn index_step(&self, ty: TypeId, index: usize) -> Result<AccessStep, AccessError> {
        let label: Arc<str> = Arc::from(format!("[{index}]"));
        if let Some(element) = self.model.element_type(ty) {
            if self.model.array_rank(ty) != 1 {
                return Err(AccessError::NotIndexable(self.model.display_type(ty)));
            }
            return Ok(AccessStep::new(
                StepKind::StrongIndex,
                label,
                ty,
                element,
                StepSource::Array { index },
            ));
        }

        let model: &dyn TypeModel = &*self.model;
        for ancestor in Ancestors::new(model, ty) {
            let Some(indexer) = self.model.declared_indexer(ancestor) else {
                continue;
            };
            let element = self.rewrite_declared(ty, ancestor, indexer.element_type)?;
            let kind = if element == TypeId::OBJECT {
                StepKind::WeakIndex
            } else {
                StepKind::StrongIndex
            };
            return Ok(AccessStep::new(
                kind,
                label,
                ty,
                element,
                StepSource::Indexer { indexer, index },
            ));
        }
        Err(AccessError::NotIndexable(self.model.display_type(ty)))
    }

    /// Rewrite a type declared on `declaring` (an ancestor of `accessed`)
    /// through `accessed`'s arguments relative to the declaring definition.
    fn rewrite_declared(&self, accessed: TypeId, declaring: TypeId, declared: TypeId) -> Result<TypeId, AccessError> {
        let model = self.factory.model();
        if !model.contains_generic_parameters(declared) {
            return Ok(declared);
        }
        let Some(definition) = model.generic_definition(declaring) else {
            return Ok(declared);
        };
        let args = self
            .factory
            .open_type_analyzer(accessed)?
            .get_generic_arguments_relative_to(definition)?
            .types();
        let subst = TypeSubstitution::from_args(&model.generic_arguments(definition), &args);
        Ok(instantiate_type(model, declared, &subst)?)
    }

    /// Every method called `name` on `ty`'s ancestors, in ancestor order,
    /// with parameter and return types rewritten like members.
    pub(crate) fn method_candidates(
        &self,
        ty: TypeId,
        name: &str,
        want_static: bool,
    ) -> Result<Vec<MethodCandidate>, AccessError> {
        let model: &dyn TypeModel = &*self.model;
        let mut candidates = Vec::new();
        for ancestor in Ancestors::new(model, ty) {
            for member in self.model.declared_members(ancestor) {
                if &*member.name != name || member.is_static != want_static || member.kind() != MemberKind::Method {
                    continue;
                }
                let parameters = member
                    .parameters
                    .iter()
                    .map(|&p| self.rewrite_declared(ty, ancestor, p))
                    .collect::<Result<Vec<_>, _>>()?;
                let return_type = self.rewrite_declared(ty, ancestor, member.value_type)?;
                candidates.push(MethodCandidate::new(member, parameters, return_type));
            }
        }
        if candidates.is_empty() {
            return Err(AccessError::MemberNotFound {
                ty: self.model.display_type(ty),
                member: name.to_string(),
                kind: if want_static { "static method" } else { "method" },
            });
        }
        Ok(candidates)
    }

    fn sync_generation(&self) {
        let current = self.model.generation();
        let seen = self.generation.load(Ordering::SeqCst);
        if current != seen
            && self
                .generation
                .compare_exchange(seen, current, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            debug!(from = seen, to = current, "MemberPathResolver: model generation changed, clearing paths");
            self.paths.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Accessor builder for an instance path.
    pub fn build_accessor(&self, root: TypeId, path: &str) -> Result<AccessorBuilder<'_, M>, AccessError> {
        Ok(AccessorBuilder::new(self, self.resolve(root, path)?))
    }

    /// Accessor builder for a path starting at a static member of `root`.
    pub fn build_static_accessor(&self, root: TypeId, path: &str) -> Result<AccessorBuilder<'_, M>, AccessError> {
        Ok(AccessorBuilder::new(self, self.resolve_static(root, path)?))
    }

    /// Invoker builder for an instance path ending in a method name
    /// (`Address.Format`).
    pub fn build_invoker(&self, root: TypeId, path: &str) -> Result<InvokerBuilder<'_, M>, AccessError> {
        self.invoker_builder(root, path, false)
    }

    /// Invoker builder for a static method of `root` (`Create`), or an
    /// instance method reached through a static member (`Default.Describe`).
    pub fn build_static_invoker(&self, root: TypeId, path: &str) -> Result<InvokerBuilder<'_, M>, AccessError> {
        self.invoker_builder(root, path, true)
    }

    fn invoker_builder(&self, root: TypeId, path: &str, is_static: bool) -> Result<InvokerBuilder<'_, M>, AccessError> {
        let parsed = MemberPath::parse(path)?;
        let Some((receiver_path, method)) = parsed.split_last_member() else {
            return Err(AccessError::InvalidPath {
                path: path.to_string(),
                reason: "an invoker path must end with a method name".to_string(),
            });
        };
        let receiver = if receiver_path.is_empty() {
            Arc::new(ResolvedPath::identity(root, is_static))
        } else {
            self.resolve_cached(root, &receiver_path.to_string(), is_static)?
        };
        let static_method = is_static && receiver_path.is_empty();
        let candidates = self.method_candidates(receiver.value_type(), method, static_method)?;
        Ok(InvokerBuilder::new(
            self,
            receiver,
            Arc::from(method),
            static_method,
            candidates,
        ))
    }
}

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod tests;
