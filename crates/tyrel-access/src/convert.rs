//! Typed conversions between host values and Rust values.

use crate::error::AccessError;
use tyrel_model::{ObjectRef, TypeId, TypeModel, Value};

fn value_kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "double",
        Value::Str(_) => "string",
        Value::Object(_) => "object",
        Value::Array(_) => "array",
    }
}

fn mismatch(expected: &str, value: &Value) -> AccessError {
    AccessError::TypeMismatch {
        expected: expected.to_string(),
        actual: value_kind_name(value).to_string(),
    }
}

/// Declared types the conversions accept at build time. `OBJECT` is always
/// accepted and checked per value instead.
fn declared_is(ty: TypeId, accepted: &[TypeId]) -> bool {
    ty == TypeId::OBJECT || accepted.contains(&ty)
}

/// Conversion out of a host value.
pub trait FromValue: Sized {
    /// Whether a member declared as `ty` can produce this type.
    fn accepts_type(model: &dyn TypeModel, ty: TypeId) -> bool;

    fn from_value(value: Value) -> Result<Self, AccessError>;
}

/// Conversion into a host value.
pub trait IntoValue {
    /// Whether this type can be stored into a member declared as `ty`.
    fn fits_type(model: &dyn TypeModel, ty: TypeId) -> bool;

    fn into_value(self) -> Value;
}

impl FromValue for Value {
    fn accepts_type(_: &dyn TypeModel, _: TypeId) -> bool {
        true
    }

    fn from_value(value: Value) -> Result<Self, AccessError> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn fits_type(_: &dyn TypeModel, _: TypeId) -> bool {
        true
    }

    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for bool {
    fn accepts_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::BOOL])
    }

    fn from_value(value: Value) -> Result<Self, AccessError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl IntoValue for bool {
    fn fits_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::BOOL])
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for i64 {
    fn accepts_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::INT, TypeId::LONG])
    }

    fn from_value(value: Value) -> Result<Self, AccessError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl IntoValue for i64 {
    fn fits_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::INT, TypeId::LONG])
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for f64 {
    fn accepts_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::DOUBLE, TypeId::INT, TypeId::LONG])
    }

    /// Integers widen.
    fn from_value(value: Value) -> Result<Self, AccessError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl IntoValue for f64 {
    fn fits_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::DOUBLE])
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for String {
    fn accepts_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::STRING])
    }

    fn from_value(value: Value) -> Result<Self, AccessError> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl IntoValue for String {
    fn fits_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::STRING])
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl IntoValue for &str {
    fn fits_type(_: &dyn TypeModel, ty: TypeId) -> bool {
        declared_is(ty, &[TypeId::STRING])
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl FromValue for ObjectRef {
    fn accepts_type(model: &dyn TypeModel, ty: TypeId) -> bool {
        !model.is_array(ty) && model.value_kind(ty) != Some(true)
    }

    fn from_value(value: Value) -> Result<Self, AccessError> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl IntoValue for ObjectRef {
    fn fits_type(model: &dyn TypeModel, ty: TypeId) -> bool {
        !model.is_array(ty) && model.value_kind(ty) != Some(true)
    }

    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn accepts_type(model: &dyn TypeModel, ty: TypeId) -> bool {
        T::accepts_type(model, ty)
    }

    /// `Null` reads as `None`.
    fn from_value(value: Value) -> Result<Self, AccessError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
#[path = "../tests/convert_tests.rs"]
mod tests;
