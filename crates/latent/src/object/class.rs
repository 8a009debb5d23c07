use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{Instance, Value};
use crate::error::{Error, Result};
use crate::stub::Stub;

/// Receiver a method is invoked on.
#[derive(Debug, Clone)]
pub enum Invocant {
	/// A realized object.
	Object(Arc<Instance>),
	/// A stub handle, realized or not.
	Stub(Stub),
	/// Class-level (unbound) invocation.
	Class(Arc<Class>),
}

impl Invocant {
	pub fn as_object(&self) -> Option<&Arc<Instance>> {
		match self {
			Self::Object(obj) => Some(obj),
			_ => None,
		}
	}

	pub fn as_stub(&self) -> Option<&Stub> {
		match self {
			Self::Stub(stub) => Some(stub),
			_ => None,
		}
	}

	/// Returns true unless this is a class-level invocation.
	pub fn has_instance(&self) -> bool {
		!matches!(self, Self::Class(_))
	}
}

/// Signature of a method body.
pub type MethodFn = dyn Fn(&Invocant, &[Value]) -> Result<Value> + Send + Sync;

/// Signature of a catch-all handler; receives the requested method name.
pub type FallbackFn = dyn Fn(&Invocant, &str, &[Value]) -> Result<Value> + Send + Sync;

/// Named callable, cheap to clone.
#[derive(Clone)]
pub struct Method {
	name: Arc<str>,
	body: Arc<MethodFn>,
}

impl Method {
	pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
	where
		F: Fn(&Invocant, &[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			body: Arc::new(body),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn call(&self, invocant: &Invocant, args: &[Value]) -> Result<Value> {
		(self.body)(invocant, args)
	}

	/// Returns true if both handles share the same body.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.body, &other.body)
	}
}

impl fmt::Debug for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Method").field("name", &self.name).finish_non_exhaustive()
	}
}

/// Static class descriptor: name, ancestry, method table and optional catch-all.
///
/// Capability probes (`isa`, `can`, `responds_to`) read the descriptor only and
/// never construct an instance.
pub struct Class {
	name: Arc<str>,
	parents: Vec<Arc<Class>>,
	methods: FxHashMap<Arc<str>, Method>,
	fallback: Option<Arc<FallbackFn>>,
}

impl Class {
	pub fn builder(name: impl Into<Arc<str>>) -> ClassBuilder {
		ClassBuilder {
			name: name.into(),
			parents: Vec::new(),
			methods: FxHashMap::default(),
			fallback: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn parents(&self) -> &[Arc<Class>] {
		&self.parents
	}

	/// Returns true if `candidate` is this class or any ancestor.
	pub fn isa(&self, candidate: &str) -> bool {
		*self.name == *candidate || self.parents.iter().any(|parent| parent.isa(candidate))
	}

	/// Resolves `method` along the ancestry, depth-first, left to right.
	pub fn can(&self, method: &str) -> Option<Method> {
		if let Some(found) = self.methods.get(method) {
			return Some(found.clone());
		}
		self.parents.iter().find_map(|parent| parent.can(method))
	}

	/// Returns true if this class defines `method` itself, ignoring ancestors.
	pub fn defines(&self, method: &str) -> bool {
		self.methods.contains_key(method)
	}

	fn find_fallback(&self) -> Option<Arc<FallbackFn>> {
		if let Some(fallback) = &self.fallback {
			return Some(fallback.clone());
		}
		self.parents.iter().find_map(|parent| parent.find_fallback())
	}

	pub fn has_fallback(&self) -> bool {
		self.find_fallback().is_some()
	}

	/// Returns true if a call to `method` would be answered, directly or via a catch-all.
	pub fn responds_to(&self, method: &str) -> bool {
		self.can(method).is_some() || self.has_fallback()
	}

	/// Dispatches `method` against `invocant` using this class's table.
	pub fn dispatch(&self, invocant: &Invocant, method: &str, args: &[Value]) -> Result<Value> {
		if let Some(found) = self.can(method) {
			return found.call(invocant, args);
		}
		match self.find_fallback() {
			Some(fallback) => fallback(invocant, method, args),
			None => Err(Error::unknown_method(self.name(), method)),
		}
	}

	/// Class-level (unbound) invocation.
	pub fn invoke(self: &Arc<Self>, method: &str, args: &[Value]) -> Result<Value> {
		self.dispatch(&Invocant::Class(self.clone()), method, args)
	}
}

impl fmt::Debug for Class {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut methods: Vec<&str> = self.methods.keys().map(|k| &**k).collect();
		methods.sort_unstable();
		f.debug_struct("Class")
			.field("name", &self.name)
			.field("parents", &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>())
			.field("methods", &methods)
			.field("fallback", &self.fallback.is_some())
			.finish()
	}
}

/// Builder for [`Class`].
pub struct ClassBuilder {
	name: Arc<str>,
	parents: Vec<Arc<Class>>,
	methods: FxHashMap<Arc<str>, Method>,
	fallback: Option<Arc<FallbackFn>>,
}

impl ClassBuilder {
	/// Appends a parent; resolution order follows insertion order.
	pub fn parent(mut self, parent: Arc<Class>) -> Self {
		self.parents.push(parent);
		self
	}

	/// Defines (or redefines) a method.
	pub fn method<F>(mut self, name: &str, body: F) -> Self
	where
		F: Fn(&Invocant, &[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		self.methods.insert(Arc::from(name), Method::new(name, body));
		self
	}

	/// Installs a catch-all for names not found in the ancestry.
	pub fn fallback<F>(mut self, body: F) -> Self
	where
		F: Fn(&Invocant, &str, &[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		self.fallback = Some(Arc::new(body));
		self
	}

	pub fn build(self) -> Arc<Class> {
		Arc::new(Class {
			name: self.name,
			parents: self.parents,
			methods: self.methods,
			fallback: self.fallback,
		})
	}
}
