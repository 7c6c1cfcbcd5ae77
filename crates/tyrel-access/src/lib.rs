//! Member-path access over the tyrel type model.
//!
//! Parses textual paths (`Customer.Orders[2].Total`), resolves them step by
//! step against a root type, and builds typed or type-erased getters,
//! setters and method invokers whose per-step closures are compiled on first
//! use.
//!
//! ```ignore
//! let resolver = MemberPathResolver::new(Arc::new(store));
//! let total = resolver.build_accessor(customer, "Orders[0].Total")?.getter::<f64>()?;
//! let value = total(&customer_value)?;
//! ```

pub mod accessor;
pub mod convert;
mod error;
pub mod invoker;
pub mod path;
pub mod resolver;
pub mod step;

pub use accessor::{AccessorBuilder, Getter, Setter, StaticGetter, StaticSetter};
pub use convert::{FromValue, IntoValue};
pub use error::AccessError;
pub use invoker::{Invoker, InvokerBuilder, MethodCandidate, StaticInvoker};
pub use path::{MemberPath, PathToken};
pub use resolver::{MemberPathResolver, ResolvedPath};
pub use step::{AccessStep, StepKind};

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod fixtures;
