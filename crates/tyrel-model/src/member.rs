//! Member metadata: fields, properties, methods and indexers.
//!
//! Property and method bodies are host closures. Fields need no closure:
//! instance fields live in the `HostObject` slot map, static fields in a
//! storage cell owned by the member itself.

use crate::error::ModelError;
use crate::types::TypeId;
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, RwLock};

pub type GetterFn = Arc<dyn Fn(Option<&Value>) -> Result<Value, ModelError> + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(Option<&Value>, Value) -> Result<(), ModelError> + Send + Sync>;
pub type MethodFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, ModelError> + Send + Sync>;
pub type IndexGetFn = Arc<dyn Fn(&Value, usize) -> Result<Value, ModelError> + Send + Sync>;
pub type IndexSetFn = Arc<dyn Fn(&Value, usize, Value) -> Result<(), ModelError> + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

#[derive(Clone)]
pub enum MemberBody {
    Field {
        readonly: bool,
        /// Backing cell for static fields; `None` for instance fields.
        storage: Option<Arc<RwLock<Value>>>,
    },
    Property {
        get: Option<GetterFn>,
        set: Option<SetterFn>,
    },
    Method {
        invoke: MethodFn,
    },
}

/// A member declared on a type.
#[derive(Clone)]
pub struct MemberInfo {
    pub name: Arc<str>,
    /// Field/property type, or method return type. May reference the
    /// declaring type's generic parameters.
    pub value_type: TypeId,
    /// Method parameter types, in order. Empty for fields and properties.
    pub parameters: Vec<TypeId>,
    pub is_static: bool,
    /// Filled in by `TypeStore::add_member`.
    pub declaring_type: TypeId,
    pub body: MemberBody,
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("value_type", &self.value_type)
            .field("parameters", &self.parameters)
            .field("is_static", &self.is_static)
            .field("declaring_type", &self.declaring_type)
            .finish()
    }
}

impl MemberInfo {
    fn new(name: &str, value_type: TypeId, body: MemberBody) -> Self {
        Self {
            name: Arc::from(name),
            value_type,
            parameters: Vec::new(),
            is_static: false,
            declaring_type: TypeId::OBJECT,
            body,
        }
    }

    /// Writable instance field.
    pub fn field(name: &str, value_type: TypeId) -> Self {
        Self::new(
            name,
            value_type,
            MemberBody::Field {
                readonly: false,
                storage: None,
            },
        )
    }

    /// Read-only instance field.
    pub fn readonly_field(name: &str, value_type: TypeId) -> Self {
        Self::new(
            name,
            value_type,
            MemberBody::Field {
                readonly: true,
                storage: None,
            },
        )
    }

    /// Writable static field with an initial value.
    pub fn static_field(name: &str, value_type: TypeId, initial: Value) -> Self {
        let mut member = Self::new(
            name,
            value_type,
            MemberBody::Field {
                readonly: false,
                storage: Some(Arc::new(RwLock::new(initial))),
            },
        );
        member.is_static = true;
        member
    }

    /// Property without accessors; add them with `with_getter`/`with_setter`.
    pub fn property(name: &str, value_type: TypeId) -> Self {
        Self::new(
            name,
            value_type,
            MemberBody::Property {
                get: None,
                set: None,
            },
        )
    }

    pub fn method<F>(name: &str, return_type: TypeId, parameters: Vec<TypeId>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, ModelError> + Send + Sync + 'static,
    {
        let mut member = Self::new(
            name,
            return_type,
            MemberBody::Method {
                invoke: Arc::new(body),
            },
        );
        member.parameters = parameters;
        member
    }

    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<Value, ModelError> + Send + Sync + 'static,
    {
        if let MemberBody::Property { get, .. } = &mut self.body {
            *get = Some(Arc::new(getter));
        }
        self
    }

    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(Option<&Value>, Value) -> Result<(), ModelError> + Send + Sync + 'static,
    {
        if let MemberBody::Property { set, .. } = &mut self.body {
            *set = Some(Arc::new(setter));
        }
        self
    }

    pub const fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn kind(&self) -> MemberKind {
        match self.body {
            MemberBody::Field { .. } => MemberKind::Field,
            MemberBody::Property { .. } => MemberKind::Property,
            MemberBody::Method { .. } => MemberKind::Method,
        }
    }

    /// Fields, properties with a getter, and zero-argument methods can be read.
    pub fn is_readable(&self) -> bool {
        match &self.body {
            MemberBody::Field { .. } => true,
            MemberBody::Property { get, .. } => get.is_some(),
            MemberBody::Method { .. } => self.parameters.is_empty(),
        }
    }

    pub fn is_writable(&self) -> bool {
        match &self.body {
            MemberBody::Field { readonly, .. } => !readonly,
            MemberBody::Property { set, .. } => set.is_some(),
            MemberBody::Method { .. } => false,
        }
    }
}

// =============================================================================
// Indexers
// =============================================================================

/// Integer indexer of a type (`this[int]`).
#[derive(Clone)]
pub struct IndexerInfo {
    /// Element type; may reference the declaring type's parameters.
    pub element_type: TypeId,
    pub get: IndexGetFn,
    pub set: Option<IndexSetFn>,
}

impl fmt::Debug for IndexerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerInfo")
            .field("element_type", &self.element_type)
            .field("writable", &self.set.is_some())
            .finish()
    }
}

impl IndexerInfo {
    /// Indexer backed by the `items` list of a `HostObject`.
    pub fn items(element_type: TypeId) -> Self {
        Self {
            element_type,
            get: Arc::new(|target, index| {
                let obj = target
                    .as_object()
                    .ok_or_else(|| ModelError::Host("indexer target is not an object".into()))?;
                obj.item(index).ok_or(ModelError::IndexOutOfRange {
                    index,
                    len: obj.item_count(),
                })
            }),
            set: Some(Arc::new(|target, index, value| {
                let obj = target
                    .as_object()
                    .ok_or_else(|| ModelError::Host("indexer target is not an object".into()))?;
                if obj.set_item(index, value) {
                    Ok(())
                } else {
                    Err(ModelError::IndexOutOfRange {
                        index,
                        len: obj.item_count(),
                    })
                }
            })),
        }
    }

    /// Drop the setter.
    pub fn read_only(mut self) -> Self {
        self.set = None;
        self
    }
}
