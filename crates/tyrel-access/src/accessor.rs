//! Getter and setter construction over a resolved path.
//!
//! Typed accessors check at build time that the declared value type of the
//! path can convert to or from the requested Rust type; the returned
//! closures convert each value on the way out or in. Erased accessors work
//! on `Value` directly.

use crate::convert::{FromValue, IntoValue};
use crate::error::AccessError;
use crate::resolver::{MemberPathResolver, ResolvedPath};
use std::sync::Arc;
use tyrel_model::{TypeId, TypeMembers, TypeModel, Value};

pub type Getter<T> = Arc<dyn Fn(&Value) -> Result<T, AccessError> + Send + Sync>;
pub type StaticGetter<T> = Arc<dyn Fn() -> Result<T, AccessError> + Send + Sync>;
pub type Setter<T> = Arc<dyn Fn(&Value, T) -> Result<(), AccessError> + Send + Sync>;
pub type StaticSetter<T> = Arc<dyn Fn(T) -> Result<(), AccessError> + Send + Sync>;

/// Builds getters and setters for one resolved path.
pub struct AccessorBuilder<'r, M> {
    resolver: &'r MemberPathResolver<M>,
    path: Arc<ResolvedPath>,
}

impl<'r, M> AccessorBuilder<'r, M>
where
    M: TypeModel + TypeMembers + 'static,
{
    pub(crate) fn new(resolver: &'r MemberPathResolver<M>, path: Arc<ResolvedPath>) -> Self {
        Self { resolver, path }
    }

    pub fn path(&self) -> &ResolvedPath {
        &self.path
    }

    pub fn value_type(&self) -> TypeId {
        self.path.value_type()
    }

    pub fn can_read(&self) -> bool {
        self.path.is_readable()
    }

    pub fn can_write(&self) -> bool {
        self.path.is_writable()
    }

    // -------------------------------------------------------------------------
    // Instance accessors
    // -------------------------------------------------------------------------

    pub fn getter<T>(&self) -> Result<Getter<T>, AccessError>
    where
        T: FromValue + 'static,
    {
        self.expect_static(false)?;
        self.check_readable::<T>()?;
        let path = Arc::clone(&self.path);
        Ok(Arc::new(move |target: &Value| T::from_value(path.get(Some(target))?)))
    }

    pub fn erased_getter(&self) -> Result<Getter<Value>, AccessError> {
        self.getter::<Value>()
    }

    pub fn setter<T>(&self) -> Result<Setter<T>, AccessError>
    where
        T: IntoValue + 'static,
    {
        self.expect_static(false)?;
        self.check_writable::<T>()?;
        let path = Arc::clone(&self.path);
        Ok(Arc::new(move |target: &Value, value: T| path.set(Some(target), value.into_value())))
    }

    /// Setter taking any `Value`; the value is not checked against the
    /// declared type.
    pub fn erased_setter(&self) -> Result<Setter<Value>, AccessError> {
        self.setter::<Value>()
    }

    // -------------------------------------------------------------------------
    // Static accessors
    // -------------------------------------------------------------------------

    pub fn static_getter<T>(&self) -> Result<StaticGetter<T>, AccessError>
    where
        T: FromValue + 'static,
    {
        self.expect_static(true)?;
        self.check_readable::<T>()?;
        let path = Arc::clone(&self.path);
        Ok(Arc::new(move || T::from_value(path.get(None)?)))
    }

    pub fn erased_static_getter(&self) -> Result<StaticGetter<Value>, AccessError> {
        self.static_getter::<Value>()
    }

    pub fn static_setter<T>(&self) -> Result<StaticSetter<T>, AccessError>
    where
        T: IntoValue + 'static,
    {
        self.expect_static(true)?;
        self.check_writable::<T>()?;
        let path = Arc::clone(&self.path);
        Ok(Arc::new(move |value: T| path.set(None, value.into_value())))
    }

    pub fn erased_static_setter(&self) -> Result<StaticSetter<Value>, AccessError> {
        self.static_setter::<Value>()
    }

    // -------------------------------------------------------------------------
    // Checks
    // -------------------------------------------------------------------------

    fn expect_static(&self, want_static: bool) -> Result<(), AccessError> {
        if self.path.is_static() == want_static {
            return Ok(());
        }
        Err(AccessError::InvalidPath {
            path: self.path.text().to_string(),
            reason: if want_static {
                "instance path used for a static accessor".to_string()
            } else {
                "static path used for an instance accessor".to_string()
            },
        })
    }

    fn check_readable<T: FromValue>(&self) -> Result<(), AccessError> {
        if !self.path.is_readable() {
            return Err(AccessError::NotReadable(self.path.text().to_string()));
        }
        let model = self.resolver.factory().model();
        let value_type = self.value_type();
        if !T::accepts_type(model, value_type) {
            return Err(AccessError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: model.display_type(value_type),
            });
        }
        Ok(())
    }

    fn check_writable<T: IntoValue>(&self) -> Result<(), AccessError> {
        if !self.path.is_writable() {
            return Err(AccessError::NotWritable(self.path.text().to_string()));
        }
        let model = self.resolver.factory().model();
        let value_type = self.value_type();
        if !T::fits_type(model, value_type) {
            return Err(AccessError::TypeMismatch {
                expected: model.display_type(value_type),
                actual: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/accessor_tests.rs"]
mod tests;
