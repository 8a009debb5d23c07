//! Minimal dynamic object model that stubs and realized objects live in.

mod class;
mod instance;
mod table;
mod value;

pub use class::{Class, ClassBuilder, FallbackFn, Invocant, Method, MethodFn};
pub use instance::Instance;
pub use table::ClassTable;
pub use value::{Body, Shape, Value};

#[cfg(test)]
mod tests;
