//! Resolved path steps and their compiled closures.
//!
//! A step records what it reads (a member, an indexer slot, an array
//! element), the type it reads from and the type it yields. The closure that
//! performs the read is compiled on first use and cached in the step, so
//! repeated evaluation skips member dispatch entirely.

use crate::error::AccessError;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::trace;
use tyrel_model::{IndexerInfo, MemberBody, MemberInfo, ObjectRef, TypeId, Value};

pub(crate) type ReadFn = Arc<dyn Fn(Option<&Value>) -> Result<Value, AccessError> + Send + Sync>;
pub(crate) type WriteFn = Arc<dyn Fn(Option<&Value>, Value) -> Result<(), AccessError> + Send + Sync>;

/// How a step reaches its value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Field, property, or zero-argument method.
    Member,
    /// Indexer whose element type is `object`.
    WeakIndex,
    /// Typed indexer or array element.
    StrongIndex,
}

#[derive(Clone)]
pub(crate) enum StepSource {
    Member(Arc<MemberInfo>),
    Indexer { indexer: Arc<IndexerInfo>, index: usize },
    Array { index: usize },
}

/// One resolved step of a member path.
pub struct AccessStep {
    kind: StepKind,
    label: Arc<str>,
    input_type: TypeId,
    output_type: TypeId,
    source: StepSource,
    reader: OnceLock<ReadFn>,
    writer: OnceLock<Option<WriteFn>>,
}

impl fmt::Debug for AccessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessStep")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("input_type", &self.input_type)
            .field("output_type", &self.output_type)
            .field("compiled", &self.reader.get().is_some())
            .finish()
    }
}

impl AccessStep {
    pub(crate) fn new(
        kind: StepKind,
        label: Arc<str>,
        input_type: TypeId,
        output_type: TypeId,
        source: StepSource,
    ) -> Self {
        Self {
            kind,
            label,
            input_type,
            output_type,
            source,
            reader: OnceLock::new(),
            writer: OnceLock::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Path text this step stands for (`Orders`, `[2]`).
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn input_type(&self) -> TypeId {
        self.input_type
    }

    /// Declared type of the value the step yields, with the accessed type's
    /// generic arguments substituted.
    #[inline]
    pub fn output_type(&self) -> TypeId {
        self.output_type
    }

    pub fn member(&self) -> Option<&MemberInfo> {
        match &self.source {
            StepSource::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self.source {
            StepSource::Indexer { index, .. } | StepSource::Array { index } => Some(index),
            StepSource::Member(_) => None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.member().is_some_and(|m| m.is_static)
    }

    pub fn is_readable(&self) -> bool {
        match &self.source {
            StepSource::Member(member) => member.is_readable(),
            StepSource::Indexer { .. } | StepSource::Array { .. } => true,
        }
    }

    pub fn is_writable(&self) -> bool {
        match &self.source {
            StepSource::Member(member) => member.is_writable(),
            StepSource::Indexer { indexer, .. } => indexer.set.is_some(),
            StepSource::Array { .. } => true,
        }
    }

    /// Whether the read closure has been compiled yet.
    pub fn is_compiled(&self) -> bool {
        self.reader.get().is_some()
    }

    pub fn read(&self, target: Option<&Value>) -> Result<Value, AccessError> {
        let reader = self.reader.get_or_init(|| self.compile_reader());
        reader(target)
    }

    pub fn write(&self, target: Option<&Value>, value: Value) -> Result<(), AccessError> {
        match self.writer.get_or_init(|| self.compile_writer()) {
            Some(writer) => writer(target, value),
            None => Err(AccessError::NotWritable(self.label.to_string())),
        }
    }

    // -------------------------------------------------------------------------
    // Compilation
    // -------------------------------------------------------------------------

    fn compile_reader(&self) -> ReadFn {
        trace!(step = %self.label, kind = ?self.kind, "AccessStep: compiling reader");
        let label = Arc::clone(&self.label);
        match &self.source {
            StepSource::Member(member) => compile_member_reader(member, label),
            StepSource::Indexer { indexer, index } => {
                let get = Arc::clone(&indexer.get);
                let index = *index;
                Arc::new(move |target: Option<&Value>| {
                    let target = non_null(target, &label)?;
                    get(target, index).map_err(AccessError::from_host)
                })
            }
            StepSource::Array { index } => {
                let index = *index;
                Arc::new(move |target: Option<&Value>| {
                    let target = non_null(target, &label)?;
                    let array = target.as_array().ok_or_else(|| mismatch("array", target))?;
                    array.get(index).ok_or(AccessError::IndexOutOfRange {
                        index,
                        len: array.len(),
                    })
                })
            }
        }
    }

    fn compile_writer(&self) -> Option<WriteFn> {
        trace!(step = %self.label, kind = ?self.kind, "AccessStep: compiling writer");
        let label = Arc::clone(&self.label);
        match &self.source {
            StepSource::Member(member) => compile_member_writer(member, label),
            StepSource::Indexer { indexer, index } => {
                let set = indexer.set.clone()?;
                let index = *index;
                Some(Arc::new(move |target: Option<&Value>, value: Value| {
                    let target = non_null(target, &label)?;
                    set(target, index, value).map_err(AccessError::from_host)
                }))
            }
            StepSource::Array { index } => {
                let index = *index;
                Some(Arc::new(move |target: Option<&Value>, value: Value| {
                    let target = non_null(target, &label)?;
                    let array = target.as_array().ok_or_else(|| mismatch("array", target))?;
                    if array.set(index, value) {
                        Ok(())
                    } else {
                        Err(AccessError::IndexOutOfRange {
                            index,
                            len: array.len(),
                        })
                    }
                }))
            }
        }
    }
}

fn compile_member_reader(member: &Arc<MemberInfo>, label: Arc<str>) -> ReadFn {
    let is_static = member.is_static;
    match &member.body {
        MemberBody::Field {
            storage: Some(cell), ..
        } => {
            let cell = Arc::clone(cell);
            Arc::new(move |_: Option<&Value>| Ok(read_cell(&cell)))
        }
        MemberBody::Field { storage: None, .. } => {
            let name = Arc::clone(&member.name);
            Arc::new(move |target: Option<&Value>| {
                Ok(object_target(target, &label)?.field(&name))
            })
        }
        MemberBody::Property { get: Some(get), .. } => {
            let get = Arc::clone(get);
            Arc::new(move |target: Option<&Value>| {
                let receiver = if is_static { None } else { Some(non_null(target, &label)?) };
                get(receiver).map_err(AccessError::from_host)
            })
        }
        MemberBody::Method { invoke } if member.parameters.is_empty() => {
            let invoke = Arc::clone(invoke);
            Arc::new(move |target: Option<&Value>| {
                let receiver = if is_static { None } else { Some(non_null(target, &label)?) };
                invoke(receiver, &[]).map_err(AccessError::from_host)
            })
        }
        MemberBody::Property { get: None, .. } | MemberBody::Method { .. } => {
            Arc::new(move |_: Option<&Value>| Err(AccessError::NotReadable(label.to_string())))
        }
    }
}

fn compile_member_writer(member: &Arc<MemberInfo>, label: Arc<str>) -> Option<WriteFn> {
    let is_static = member.is_static;
    match &member.body {
        MemberBody::Field { readonly: true, .. } => None,
        MemberBody::Field {
            storage: Some(cell), ..
        } => {
            let cell = Arc::clone(cell);
            Some(Arc::new(move |_: Option<&Value>, value: Value| {
                write_cell(&cell, value);
                Ok(())
            }))
        }
        MemberBody::Field { storage: None, .. } => {
            let name = Arc::clone(&member.name);
            Some(Arc::new(move |target: Option<&Value>, value: Value| {
                object_target(target, &label)?.set_field(&name, value);
                Ok(())
            }))
        }
        MemberBody::Property { set: Some(set), .. } => {
            let set = Arc::clone(set);
            Some(Arc::new(move |target: Option<&Value>, value: Value| {
                let receiver = if is_static { None } else { Some(non_null(target, &label)?) };
                set(receiver, value).map_err(AccessError::from_host)
            }))
        }
        MemberBody::Property { set: None, .. } | MemberBody::Method { .. } => None,
    }
}

fn non_null<'v>(target: Option<&'v Value>, label: &str) -> Result<&'v Value, AccessError> {
    match target {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(AccessError::NullTarget(label.to_string())),
    }
}

fn object_target<'v>(target: Option<&'v Value>, label: &str) -> Result<&'v ObjectRef, AccessError> {
    let target = non_null(target, label)?;
    target.as_object().ok_or_else(|| mismatch("object", target))
}

fn mismatch(expected: &str, actual: &Value) -> AccessError {
    AccessError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{actual:?}"),
    }
}

fn read_cell(cell: &RwLock<Value>) -> Value {
    match cell.read() {
        Ok(guard) => guard.clone(),
        Err(e) => e.into_inner().clone(),
    }
}

fn write_cell(cell: &RwLock<Value>, value: Value) {
    match cell.write() {
        Ok(mut guard) => *guard = value,
        Err(e) => *e.into_inner() = value,
    }
}
