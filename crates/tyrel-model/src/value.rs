//! Host values: the runtime objects member paths read and write.

use crate::types::TypeId;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type ObjectRef = Arc<HostObject>;
pub type ArrayRef = Arc<HostArray>;

/// A dynamically typed host value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Object(ObjectRef),
    Array(ArrayRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Runtime type of the value, if it carries one.
    ///
    /// Scalars map onto the prelude types; `Null` has no type.
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(TypeId::BOOL),
            Self::Int(_) => Some(TypeId::LONG),
            Self::Float(_) => Some(TypeId::DOUBLE),
            Self::Str(_) => Some(TypeId::STRING),
            Self::Object(obj) => Some(obj.type_id()),
            Self::Array(arr) => Some(arr.type_id()),
        }
    }

    /// Reference identity for objects and arrays, structural equality for
    /// scalars.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl From<ArrayRef> for Value {
    fn from(value: ArrayRef) -> Self {
        Self::Array(value)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(e) => e.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(e) => e.into_inner(),
    }
}

// =============================================================================
// HostObject
// =============================================================================

/// An instance of a declared type.
///
/// Fields live in a name-keyed slot map; `items` backs list-style indexers.
#[derive(Debug)]
pub struct HostObject {
    ty: TypeId,
    fields: RwLock<FxHashMap<Arc<str>, Value>>,
    items: RwLock<Vec<Value>>,
}

impl HostObject {
    pub fn new(ty: TypeId) -> ObjectRef {
        Arc::new(Self {
            ty,
            fields: RwLock::new(FxHashMap::default()),
            items: RwLock::new(Vec::new()),
        })
    }

    pub fn with_items(ty: TypeId, items: Vec<Value>) -> ObjectRef {
        Arc::new(Self {
            ty,
            fields: RwLock::new(FxHashMap::default()),
            items: RwLock::new(items),
        })
    }

    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    /// Read a field; unset fields read as `Null`.
    pub fn field(&self, name: &str) -> Value {
        read(&self.fields).get(name).cloned().unwrap_or_default()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        write(&self.fields).insert(Arc::from(name), value);
    }

    pub fn item(&self, index: usize) -> Option<Value> {
        read(&self.items).get(index).cloned()
    }

    /// Overwrite an existing item. Returns `false` when out of range.
    pub fn set_item(&self, index: usize, value: Value) -> bool {
        match write(&self.items).get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push_item(&self, value: Value) {
        write(&self.items).push(value);
    }

    pub fn item_count(&self) -> usize {
        read(&self.items).len()
    }
}

// =============================================================================
// HostArray
// =============================================================================

/// A rank-1 host array. `ty` is the array type itself (e.g. `int[]`).
#[derive(Debug)]
pub struct HostArray {
    ty: TypeId,
    items: RwLock<Vec<Value>>,
}

impl HostArray {
    pub fn new(ty: TypeId, items: Vec<Value>) -> ArrayRef {
        Arc::new(Self {
            ty,
            items: RwLock::new(items),
        })
    }

    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.items).get(index).cloned()
    }

    /// Overwrite an existing element. Returns `false` when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match write(&self.items).get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
