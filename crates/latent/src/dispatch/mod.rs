//! Capability probing and catch-all forwarding for stubs.
//!
//! # Purpose
//!
//! Decide, per operation, whether a stub can answer locally or must realize
//! first. Probes (`isa`, `can`) consult the stub's declared class and the
//! nominal target's static descriptor and never realize.
//!
//! # Data flow
//!
//! 1. [`Dispatcher::invoke`] resolves the stub's own method table while the cell
//!    is unrealized.
//! 2. Anything else goes to [`Dispatcher::forward`]:
//!    * the teardown sentinel is dropped;
//!    * a proxied cell forwards to its realized object;
//!    * class-level calls go to the nominal class;
//!    * instance calls are gated on the nominal class unless the caller is
//!      believed, then realize and forward.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::object::{Class, Instance, Invocant, Method, Value};
use crate::stub::{ClassForward, Stub, StubClass};

/// Name of the lifecycle-teardown operation; never forwarded.
pub const TEARDOWN: &str = "DESTROY";

/// One dispatch decision point: local table, nominal descriptor and, once the
/// cell is proxied, the realized object.
pub struct Dispatcher<'a> {
	record: &'a Arc<StubClass>,
	stub: Option<&'a Stub>,
	realized: Option<Arc<Instance>>,
}

impl<'a> Dispatcher<'a> {
	/// Class-level dispatcher (no instance).
	pub fn for_class(record: &'a Arc<StubClass>) -> Self {
		Self {
			record,
			stub: None,
			realized: None,
		}
	}

	/// Instance dispatcher; snapshots the cell's realized object if any.
	pub fn for_stub(stub: &'a Stub) -> Self {
		Self {
			record: stub.record(),
			stub: Some(stub),
			realized: stub.realized(),
		}
	}

	pub fn has_instance(&self) -> bool {
		self.stub.is_some()
	}

	fn nominal(&self) -> &Arc<Class> {
		self.record.becomes()
	}

	fn invocant(&self) -> Invocant {
		match self.stub {
			Some(stub) => Invocant::Stub(stub.clone()),
			None => Invocant::Class(self.record.class().clone()),
		}
	}

	/// True if the static ancestry or the nominal target satisfies `candidate`.
	pub fn isa(&self, candidate: &str) -> bool {
		if let Some(obj) = &self.realized {
			return obj.isa(candidate);
		}
		self.record.class().isa(candidate) || self.nominal().isa(candidate)
	}

	/// Local methods are returned as-is; methods only the nominal target has
	/// come back wrapped so that calling them on a stub realizes it first.
	pub fn can(&self, method: &str) -> Option<Method> {
		if let Some(obj) = &self.realized {
			return obj.class().can(method);
		}
		if let Some(local) = self.record.class().can(method) {
			return Some(local);
		}
		self.nominal().can(method)?;
		Some(realizing_method(method, self.nominal().clone()))
	}

	/// Full dispatch: local table first (unrealized only), then [`Self::forward`].
	pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
		if self.realized.is_none()
			&& let Some(local) = self.record.class().can(method)
		{
			return local.call(&self.invocant(), args);
		}
		self.forward(method, args)
	}

	/// Catch-all path for names not resolved locally.
	pub fn forward(&self, method: &str, args: &[Value]) -> Result<Value> {
		if method == TEARDOWN {
			trace!(stub = self.record.name(), "teardown not forwarded");
			return Ok(Value::Undef);
		}

		if let Some(obj) = &self.realized {
			return Instance::invoke(obj, method, args);
		}

		let policy = self.record.policy();
		let Some(stub) = self.stub else {
			if policy.class_forward == ClassForward::Verified
				&& !policy.believe_caller
				&& self.nominal().can(method).is_none()
			{
				return Err(Error::unknown_method(self.nominal().name(), method));
			}
			return self.nominal().invoke(method, args);
		};

		if !policy.believe_caller && !self.nominal().responds_to(method) {
			return Err(Error::unknown_method(self.nominal().name(), method));
		}

		let obj = stub.force_realize()?;
		Instance::invoke(&obj, method, args)
	}
}

/// Wraps a nominal-target method so an instance call realizes first and a
/// class-level call goes straight to the nominal class.
fn realizing_method(method: &str, nominal: Arc<Class>) -> Method {
	let name = method.to_string();
	Method::new(method, move |invocant, args| match invocant {
		Invocant::Stub(stub) => {
			let obj = stub.force_realize()?;
			Instance::invoke(&obj, &name, args)
		}
		Invocant::Object(obj) => Instance::invoke(obj, &name, args),
		Invocant::Class(_) => nominal.invoke(&name, args),
	})
}
