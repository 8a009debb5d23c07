//! Shape-preserving proxies installed into a stub cell after realization.
//!
//! A realized stub cell keeps the physical shape it had as a stub. Reads that
//! depend on shape tunnel into the realized object's own view of that shape
//! instead of exposing the proxy's internal slot, so index 0 of a sequence
//! proxy is index 0 of the realized object's sequence, not the object itself.
//!
//! Proxies hold a strong reference to the realized object and nothing else.
//! Dropping a proxy drops that reference only; it never tears down the object,
//! and the object's own teardown does not reach back into the proxy.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::object::{Instance, Shape, Value};

/// Single-value cell. The stored value is the realized-object reference.
#[derive(Debug, Clone)]
pub struct ScalarProxy {
	slot: Value,
	target: Arc<Instance>,
}

impl ScalarProxy {
	pub fn new(target: Arc<Instance>) -> Self {
		Self {
			slot: Value::Object(target.clone()),
			target,
		}
	}

	/// Native single-value read: the stored reference itself.
	pub fn scalar(&self) -> Value {
		self.slot.clone()
	}
}

/// Sequence cell reset to hold exactly one element, the realized object.
#[derive(Debug, Clone)]
pub struct SequenceProxy {
	slot: [Arc<Instance>; 1],
}

impl SequenceProxy {
	pub fn new(target: Arc<Instance>) -> Self {
		Self { slot: [target] }
	}
}

/// Mapping cell. The realized object sits in a dedicated anchor field that is
/// never visible through key lookup.
#[derive(Debug, Clone)]
pub struct MappingProxy {
	anchor: Arc<Instance>,
}

impl MappingProxy {
	pub fn new(target: Arc<Instance>) -> Self {
		Self { anchor: target }
	}
}

/// The proxied form of a stub cell.
#[derive(Debug, Clone)]
pub enum ProxyAdapter {
	Scalar(ScalarProxy),
	Sequence(SequenceProxy),
	Mapping(MappingProxy),
}

impl ProxyAdapter {
	/// Builds the adapter matching the cell's original `shape`.
	pub fn adopt(shape: Shape, target: Arc<Instance>) -> Self {
		match shape {
			Shape::Scalar => Self::Scalar(ScalarProxy::new(target)),
			Shape::Sequence => Self::Sequence(SequenceProxy::new(target)),
			Shape::Mapping => Self::Mapping(MappingProxy::new(target)),
		}
	}

	/// Shape of the cell, unchanged from its stub form.
	pub fn shape(&self) -> Shape {
		match self {
			Self::Scalar(_) => Shape::Scalar,
			Self::Sequence(_) => Shape::Sequence,
			Self::Mapping(_) => Shape::Mapping,
		}
	}

	/// The realized object this cell redirects to.
	pub fn target(&self) -> &Arc<Instance> {
		match self {
			Self::Scalar(proxy) => &proxy.target,
			Self::Sequence(proxy) => &proxy.slot[0],
			Self::Mapping(proxy) => &proxy.anchor,
		}
	}

	pub fn scalar(&self) -> Result<Value> {
		match self {
			Self::Scalar(proxy) => Ok(proxy.scalar()),
			_ => self.target().scalar(),
		}
	}

	pub fn element(&self, index: usize) -> Result<Option<Value>> {
		self.target().element(index)
	}

	pub fn elements(&self) -> Result<Vec<Value>> {
		self.target().elements()
	}

	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		self.target().get(key)
	}

	pub fn entries(&self) -> Result<IndexMap<String, Value>> {
		self.target().entries()
	}

	pub fn insert(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
		self.target().insert(key, value)
	}

	pub fn apply(&self, args: &[Value]) -> Result<Value> {
		Instance::apply(self.target(), args)
	}
}
