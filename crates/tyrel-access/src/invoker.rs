//! Method invokers with overload resolution.
//!
//! Candidates are the methods with the requested name on the receiver
//! type's ancestors. Resolution against a list of argument types keeps the
//! candidates of matching arity; an exact positional match wins, otherwise
//! the first candidate whose every parameter is assignable from the
//! corresponding argument type.

use crate::convert::FromValue;
use crate::error::AccessError;
use crate::resolver::{MemberPathResolver, ResolvedPath};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use tyrel_model::{MemberBody, MemberInfo, MethodFn, TypeId, TypeMembers, TypeModel, Value};
use tyrel_solver::is_assignable;

pub type Invoker<R> = Arc<dyn Fn(&Value, &[Value]) -> Result<R, AccessError> + Send + Sync>;
pub type StaticInvoker<R> = Arc<dyn Fn(&[Value]) -> Result<R, AccessError> + Send + Sync>;

/// One overload, with its signature rewritten for the receiver type.
#[derive(Clone, Debug)]
pub struct MethodCandidate {
    member: Arc<MemberInfo>,
    parameters: Vec<TypeId>,
    return_type: TypeId,
}

impl MethodCandidate {
    pub(crate) fn new(member: Arc<MemberInfo>, parameters: Vec<TypeId>, return_type: TypeId) -> Self {
        Self {
            member,
            parameters,
            return_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn member(&self) -> &MemberInfo {
        &self.member
    }

    pub fn parameters(&self) -> &[TypeId] {
        &self.parameters
    }

    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    fn body(&self) -> Option<MethodFn> {
        match &self.member.body {
            MemberBody::Method { invoke } => Some(Arc::clone(invoke)),
            _ => None,
        }
    }
}

/// Builds invokers for one method name on one receiver path.
pub struct InvokerBuilder<'r, M> {
    resolver: &'r MemberPathResolver<M>,
    receiver: Arc<ResolvedPath>,
    method: Arc<str>,
    static_method: bool,
    candidates: Vec<MethodCandidate>,
}

impl<M> fmt::Debug for InvokerBuilder<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokerBuilder")
            .field("receiver", &self.receiver.text())
            .field("method", &self.method)
            .field("static_method", &self.static_method)
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

impl<'r, M> InvokerBuilder<'r, M>
where
    M: TypeModel + TypeMembers + 'static,
{
    pub(crate) fn new(
        resolver: &'r MemberPathResolver<M>,
        receiver: Arc<ResolvedPath>,
        method: Arc<str>,
        static_method: bool,
        candidates: Vec<MethodCandidate>,
    ) -> Self {
        Self {
            resolver,
            receiver,
            method,
            static_method,
            candidates,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn receiver_type(&self) -> TypeId {
        self.receiver.value_type()
    }

    pub fn candidates(&self) -> &[MethodCandidate] {
        &self.candidates
    }

    /// Pick the overload for `argument_types`.
    pub fn resolve_overload(&self, argument_types: &[TypeId]) -> Result<&MethodCandidate, AccessError> {
        let model = self.resolver.factory().model();
        let same_arity: Vec<&MethodCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.parameters.len() == argument_types.len())
            .collect();
        let chosen = same_arity
            .iter()
            .find(|c| c.parameters.as_slice() == argument_types)
            .or_else(|| {
                same_arity.iter().find(|c| {
                    c.parameters
                        .iter()
                        .zip(argument_types)
                        .all(|(&param, &arg)| is_assignable(model, arg, param))
                })
            })
            .copied();
        match chosen {
            Some(candidate) => {
                debug!(
                    method = %self.method,
                    parameters = ?candidate.parameters,
                    "InvokerBuilder: overload resolved"
                );
                Ok(candidate)
            }
            None => Err(AccessError::NoMatchingOverload {
                method: self.method.to_string(),
                arguments: argument_types
                    .iter()
                    .map(|&t| model.display_type(t))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Instance invokers
    // -------------------------------------------------------------------------

    pub fn invoker<R>(&self, argument_types: &[TypeId]) -> Result<Invoker<R>, AccessError>
    where
        R: FromValue + 'static,
    {
        if self.receiver.is_static() {
            return Err(self.wrong_form("static path used for an instance invoker"));
        }
        let (invoke, arity) = self.prepare::<R>(argument_types)?;
        let receiver = Arc::clone(&self.receiver);
        Ok(Arc::new(move |target: &Value, args: &[Value]| {
            check_arity(arity, args)?;
            let this = receiver.get(Some(target))?;
            if this.is_null() {
                return Err(AccessError::NullTarget(receiver.text().to_string()));
            }
            R::from_value(invoke(Some(&this), args).map_err(AccessError::from_host)?)
        }))
    }

    pub fn erased_invoker(&self, argument_types: &[TypeId]) -> Result<Invoker<Value>, AccessError> {
        self.invoker::<Value>(argument_types)
    }

    // -------------------------------------------------------------------------
    // Static invokers
    // -------------------------------------------------------------------------

    pub fn static_invoker<R>(&self, argument_types: &[TypeId]) -> Result<StaticInvoker<R>, AccessError>
    where
        R: FromValue + 'static,
    {
        if !self.receiver.is_static() {
            return Err(self.wrong_form("instance path used for a static invoker"));
        }
        let (invoke, arity) = self.prepare::<R>(argument_types)?;
        if self.static_method {
            return Ok(Arc::new(move |args: &[Value]| {
                check_arity(arity, args)?;
                R::from_value(invoke(None, args).map_err(AccessError::from_host)?)
            }));
        }
        let receiver = Arc::clone(&self.receiver);
        Ok(Arc::new(move |args: &[Value]| {
            check_arity(arity, args)?;
            let this = receiver.get(None)?;
            if this.is_null() {
                return Err(AccessError::NullTarget(receiver.text().to_string()));
            }
            R::from_value(invoke(Some(&this), args).map_err(AccessError::from_host)?)
        }))
    }

    pub fn erased_static_invoker(&self, argument_types: &[TypeId]) -> Result<StaticInvoker<Value>, AccessError> {
        self.static_invoker::<Value>(argument_types)
    }

    fn prepare<R: FromValue>(&self, argument_types: &[TypeId]) -> Result<(MethodFn, usize), AccessError> {
        let candidate = self.resolve_overload(argument_types)?;
        let model = self.resolver.factory().model();
        if !R::accepts_type(model, candidate.return_type) {
            return Err(AccessError::TypeMismatch {
                expected: std::any::type_name::<R>().to_string(),
                actual: model.display_type(candidate.return_type),
            });
        }
        let invoke = candidate
            .body()
            .ok_or_else(|| AccessError::NotReadable(candidate.name().to_string()))?;
        Ok((invoke, candidate.parameters.len()))
    }

    fn wrong_form(&self, reason: &str) -> AccessError {
        AccessError::InvalidPath {
            path: format!("{}.{}", self.receiver.text(), self.method),
            reason: reason.to_string(),
        }
    }
}

fn check_arity(arity: usize, args: &[Value]) -> Result<(), AccessError> {
    if args.len() == arity {
        return Ok(());
    }
    Err(AccessError::TypeMismatch {
        expected: format!("{arity} arguments"),
        actual: format!("{} arguments", args.len()),
    })
}

#[cfg(test)]
#[path = "../tests/invoker_tests.rs"]
mod tests;
