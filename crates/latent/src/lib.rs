//! Lazily realized stub objects.
//!
//! A stub stands in for an object that is expensive to construct. Probes
//! (`isa`, `can`) and the stub's own methods are answered without building
//! anything; any other operation realizes the stub on demand. Realization
//! overwrites the stub's cell in place, so every handle to that cell, not only
//! the one that triggered it, sees the realized object afterwards.
//!
//! # Components
//!
//! | Type | Role |
//! |---|---|
//! | [`RealizationRegistry`] | Weak identity map; deduplicates realization and resolves stale references |
//! | [`ProxyAdapter`] | Shape-preserving proxy a cell becomes once realized |
//! | [`Stub::force_realize`] | Realization state machine |
//! | [`Dispatcher`] | Capability probing and catch-all forwarding |
//!
//! # Example
//!
//! ```
//! use latent::{Body, Class, Instance, StubClass, Value};
//!
//! let book = Class::builder("Book")
//! 	.method("pages", |_, _| Ok(Value::Int(412)))
//! 	.build();
//! let target = book.clone();
//! let lazy = StubClass::builder(Class::builder("LazyBook").build())
//! 	.becomes(book)
//! 	.realize_with(move |_| Ok(Instance::new(target.clone(), Body::Scalar(Value::Undef)).into()))
//! 	.build()
//! 	.unwrap();
//!
//! let stub = lazy.instantiate(Body::mapping([("title", "Dune")]));
//! assert!(stub.isa("Book"));
//! assert!(!stub.is_realized());
//! assert_eq!(stub.invoke("pages", &[]).unwrap(), Value::Int(412));
//! assert!(stub.is_realized());
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod object;
pub mod proxy;
pub mod registry;
pub mod stub;

#[cfg(test)]
mod test_fixtures;

pub use config::StubSpec;
pub use dispatch::{Dispatcher, TEARDOWN};
pub use error::{Error, Result, SetupError};
pub use identity::Identity;
pub use object::{Body, Class, ClassBuilder, ClassTable, Instance, Invocant, Method, Shape, Value};
pub use proxy::ProxyAdapter;
pub use registry::{RealizationRegistry, Registration};
pub use stub::{ClassForward, Policy, RealizeSpec, State, Stub, StubClass, StubClassBuilder};
