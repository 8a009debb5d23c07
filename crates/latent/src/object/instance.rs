use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Body, Class, Invocant, Shape, Value};
use crate::error::Result;

/// A realized object: a class plus a shaped body.
///
/// Owned through `Arc`. Body reads return clones so no lock is held across
/// method calls.
pub struct Instance {
	class: Arc<Class>,
	body: RwLock<Body>,
}

impl Instance {
	pub fn new(class: Arc<Class>, body: Body) -> Arc<Self> {
		Arc::new(Self {
			class,
			body: RwLock::new(body),
		})
	}

	pub fn class(&self) -> &Arc<Class> {
		&self.class
	}

	pub fn isa(&self, candidate: &str) -> bool {
		self.class.isa(candidate)
	}

	pub fn shape(&self) -> Shape {
		self.body.read().shape()
	}

	pub fn body(&self) -> RwLockReadGuard<'_, Body> {
		self.body.read()
	}

	pub fn body_mut(&self) -> RwLockWriteGuard<'_, Body> {
		self.body.write()
	}

	pub fn scalar(&self) -> Result<Value> {
		self.body.read().scalar()
	}

	pub fn element(&self, index: usize) -> Result<Option<Value>> {
		self.body.read().element(index)
	}

	pub fn elements(&self) -> Result<Vec<Value>> {
		self.body.read().elements()
	}

	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		self.body.read().get(key)
	}

	pub fn entries(&self) -> Result<IndexMap<String, Value>> {
		self.body.read().entries()
	}

	pub fn insert(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
		self.body.write().insert(key, value)
	}

	/// Calls the callable held by a scalar body.
	pub fn apply(this: &Arc<Self>, args: &[Value]) -> Result<Value> {
		let method = this.body.read().callable()?;
		method.call(&Invocant::Object(this.clone()), args)
	}

	/// Invokes `method` on this object through its class.
	pub fn invoke(this: &Arc<Self>, method: &str, args: &[Value]) -> Result<Value> {
		this.class.dispatch(&Invocant::Object(this.clone()), method, args)
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("class", &self.class.name())
			.field("ptr", &(self as *const Self))
			.finish_non_exhaustive()
	}
}
