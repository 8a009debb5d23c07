//! Stub classes and the shared cells their instances live in.
//!
//! # Mental model
//!
//! * A [`StubClass`] is defined once per stub type and shared by all of its
//!   instances: declared class, nominal target, realize operation, policy and
//!   the registry it reports to.
//! * A [`Stub`] is a handle to a cell. Cloning the handle aliases the cell;
//!   [`Stub::duplicate`] makes a separate cell with the same identity (a stale
//!   duplicate).
//! * A cell starts as `CellState::Stub` holding the stub's own body and is
//!   overwritten in place with a [`ProxyAdapter`] on realization, so every
//!   alias observes the change without rebinding anything.
//!
//! # Lifecycle
//!
//! `Unrealized -> Realized -> Proxied`. `Realized` exists only inside
//! [`Stub::force_realize`] between the realize operation returning and the
//! proxy being installed; callers only ever observe [`State::Unrealized`] or
//! [`State::Proxied`].

mod realize;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::trace;

use crate::dispatch::Dispatcher;
use crate::error::{Result, SetupError};
use crate::identity::Identity;
use crate::object::{Body, Class, Instance, Invocant, Method, Shape, Value};
use crate::proxy::ProxyAdapter;
use crate::registry::RealizationRegistry;

/// Signature of a free realize function.
pub type RealizeFn = dyn Fn(&Stub) -> Result<Value> + Send + Sync;

/// How a stub produces its realized object.
#[derive(Clone)]
pub enum RealizeSpec {
	/// A method resolvable on the stub class, invoked with the stub as receiver.
	Method(Arc<str>),
	/// A free function taking the stub.
	Function(Arc<RealizeFn>),
}

impl fmt::Debug for RealizeSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
			Self::Function(_) => f.write_str("Function(..)"),
		}
	}
}

/// Class-level forwarding behaviour for names the nominal class does not expose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassForward {
	/// Always forward to the nominal class and let it answer.
	#[default]
	Direct,
	/// Fail with `UnknownMethod` unless the nominal class defines the method
	/// (its catch-all does not count) or `believe_caller` is set.
	Verified,
}

/// Per-class diagnostics and dispatch flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
	/// Emit a warning each time an instance is realized.
	pub warn_on_realize: bool,
	/// Emit a warning when a stale reference is redirected to an existing realization.
	pub warn_on_reuse: bool,
	/// Forward unknown names without checking the nominal class first.
	pub believe_caller: bool,
	pub class_forward: ClassForward,
}

/// Definition shared by all instances of one stub type.
pub struct StubClass {
	class: Arc<Class>,
	becomes: Arc<Class>,
	realize: RealizeSpec,
	policy: Policy,
	registry: Arc<RealizationRegistry>,
	source_module: Option<String>,
}

impl StubClass {
	/// Starts a definition for stubs whose local methods and static ancestry
	/// come from `class`.
	pub fn builder(class: Arc<Class>) -> StubClassBuilder {
		StubClassBuilder {
			class,
			becomes: None,
			realize: None,
			policy: Policy::default(),
			registry: None,
			source_module: None,
		}
	}

	pub fn name(&self) -> &str {
		self.class.name()
	}

	/// Declared class: local methods and static ancestry.
	pub fn class(&self) -> &Arc<Class> {
		&self.class
	}

	/// Nominal target class descriptor.
	pub fn becomes(&self) -> &Arc<Class> {
		&self.becomes
	}

	/// Name of the class realization is expected to produce.
	pub fn will_realize(&self) -> &str {
		self.becomes.name()
	}

	pub fn realize_spec(&self) -> &RealizeSpec {
		&self.realize
	}

	pub fn policy(&self) -> Policy {
		self.policy
	}

	pub fn registry(&self) -> &Arc<RealizationRegistry> {
		&self.registry
	}

	pub fn source_module(&self) -> Option<&str> {
		self.source_module.as_deref()
	}

	/// Creates a stub instance with a fresh identity, storing `body` in its cell.
	pub fn instantiate(self: &Arc<Self>, body: Body) -> Stub {
		Stub::from_cell(StubCell {
			record: self.clone(),
			identity: Identity::next(),
			state: RwLock::new(CellState::Stub(body)),
		})
	}

	/// Class-level `isa`; never realizes.
	pub fn isa(self: &Arc<Self>, candidate: &str) -> bool {
		Dispatcher::for_class(self).isa(candidate)
	}

	/// Class-level `can`; never realizes.
	pub fn can(self: &Arc<Self>, method: &str) -> Option<Method> {
		Dispatcher::for_class(self).can(method)
	}

	/// Class-level invocation; never realizes.
	pub fn invoke(self: &Arc<Self>, method: &str, args: &[Value]) -> Result<Value> {
		Dispatcher::for_class(self).invoke(method, args)
	}
}

impl fmt::Debug for StubClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StubClass")
			.field("name", &self.name())
			.field("becomes", &self.will_realize())
			.field("realize", &self.realize)
			.field("policy", &self.policy)
			.finish_non_exhaustive()
	}
}

/// Builder for [`StubClass`]. `becomes` and a realize operation are required.
pub struct StubClassBuilder {
	class: Arc<Class>,
	becomes: Option<Arc<Class>>,
	realize: Option<RealizeSpec>,
	policy: Policy,
	registry: Option<Arc<RealizationRegistry>>,
	source_module: Option<String>,
}

impl StubClassBuilder {
	pub fn becomes(mut self, target: Arc<Class>) -> Self {
		self.becomes = Some(target);
		self
	}

	/// Realizes by calling `method` on the stub.
	pub fn realize_method(mut self, method: impl Into<Arc<str>>) -> Self {
		self.realize = Some(RealizeSpec::Method(method.into()));
		self
	}

	/// Realizes by calling `realize` with the stub.
	pub fn realize_with<F>(mut self, realize: F) -> Self
	where
		F: Fn(&Stub) -> Result<Value> + Send + Sync + 'static,
	{
		self.realize = Some(RealizeSpec::Function(Arc::new(realize)));
		self
	}

	pub fn warn_realization(mut self, enabled: bool) -> Self {
		self.policy.warn_on_realize = enabled;
		self
	}

	pub fn warn_realize_again(mut self, enabled: bool) -> Self {
		self.policy.warn_on_reuse = enabled;
		self
	}

	pub fn believe_caller(mut self, enabled: bool) -> Self {
		self.policy.believe_caller = enabled;
		self
	}

	pub fn class_forward(mut self, mode: ClassForward) -> Self {
		self.policy.class_forward = mode;
		self
	}

	/// Module hint used to locate the nominal class; informational only.
	pub fn source_module(mut self, module: impl Into<String>) -> Self {
		self.source_module = Some(module.into());
		self
	}

	/// Reports realizations to `registry` instead of the process-global one.
	pub fn registry(mut self, registry: Arc<RealizationRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn build(self) -> Result<Arc<StubClass>, SetupError> {
		let stub = self.class.name().to_string();
		let becomes = self.becomes.ok_or_else(|| SetupError::MissingConfiguration {
			stub: stub.clone(),
			option: "becomes",
		})?;
		let realize = self.realize.ok_or_else(|| SetupError::MissingConfiguration {
			stub: stub.clone(),
			option: "realize",
		})?;
		if let RealizeSpec::Method(method) = &realize
			&& self.class.can(method).is_none()
		{
			return Err(SetupError::UnresolvedRealize {
				stub,
				method: method.to_string(),
			});
		}

		Ok(Arc::new(StubClass {
			class: self.class,
			becomes,
			realize,
			policy: self.policy,
			registry: self.registry.unwrap_or_else(RealizationRegistry::global),
			source_module: self.source_module,
		}))
	}
}

/// Observable lifecycle state of a stub cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	Unrealized,
	Proxied,
}

/// Contents of a stub cell.
#[derive(Debug)]
pub(crate) enum CellState {
	/// Not yet realized; holds the stub's own body.
	Stub(Body),
	/// Realized; the body has been replaced by a proxy of the same shape.
	Proxied(ProxyAdapter),
}

struct StubCell {
	record: Arc<StubClass>,
	identity: Identity,
	state: RwLock<CellState>,
}

impl Drop for StubCell {
	fn drop(&mut self) {
		// Teardown of the realized object is independent; only the reference goes.
		trace!(stub = self.record.name(), identity = %self.identity, "stub cell released");
	}
}

/// Handle to a stub cell. Clones alias the same cell.
#[derive(Clone)]
pub struct Stub {
	cell: Arc<StubCell>,
}

impl Stub {
	fn from_cell(cell: StubCell) -> Self {
		Self { cell: Arc::new(cell) }
	}

	pub fn record(&self) -> &Arc<StubClass> {
		&self.cell.record
	}

	pub fn identity(&self) -> Identity {
		self.cell.identity
	}

	pub fn state(&self) -> State {
		match &*self.cell.state.read() {
			CellState::Stub(_) => State::Unrealized,
			CellState::Proxied(_) => State::Proxied,
		}
	}

	pub fn is_realized(&self) -> bool {
		self.state() == State::Proxied
	}

	/// Shape of the cell; identical before and after realization.
	pub fn shape(&self) -> Shape {
		match &*self.cell.state.read() {
			CellState::Stub(body) => body.shape(),
			CellState::Proxied(proxy) => proxy.shape(),
		}
	}

	/// Object held by this cell's proxy, if the cell has been realized.
	pub fn realized(&self) -> Option<Arc<Instance>> {
		match &*self.cell.state.read() {
			CellState::Stub(_) => None,
			CellState::Proxied(proxy) => Some(proxy.target().clone()),
		}
	}

	/// Registry's live realization for this identity, without realizing.
	pub fn realization(&self) -> Option<Arc<Instance>> {
		self.record().registry().lookup(self.identity())
	}

	/// Returns true if both handles alias one cell.
	pub fn same_cell(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.cell, &other.cell)
	}

	/// Copies this stub into a new cell that keeps the same identity.
	pub fn duplicate(&self) -> Self {
		let state = match &*self.cell.state.read() {
			CellState::Stub(body) => CellState::Stub(body.clone()),
			CellState::Proxied(proxy) => CellState::Proxied(proxy.clone()),
		};
		Self::from_cell(StubCell {
			record: self.record().clone(),
			identity: self.identity(),
			state: RwLock::new(state),
		})
	}

	pub fn will_realize(&self) -> &str {
		self.record().will_realize()
	}

	pub fn isa(&self, candidate: &str) -> bool {
		Dispatcher::for_stub(self).isa(candidate)
	}

	pub fn can(&self, method: &str) -> Option<Method> {
		Dispatcher::for_stub(self).can(method)
	}

	/// Invokes `method`, realizing first when it cannot be answered locally.
	pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
		Dispatcher::for_stub(self).invoke(method, args)
	}

	/// Realizes this stub (once per identity) and returns the realized object.
	pub fn force_realize(&self) -> Result<Arc<Instance>> {
		realize::force_realize(self)
	}

	pub fn scalar(&self) -> Result<Value> {
		match &*self.cell.state.read() {
			CellState::Stub(body) => body.scalar(),
			CellState::Proxied(proxy) => proxy.scalar(),
		}
	}

	pub fn element(&self, index: usize) -> Result<Option<Value>> {
		match &*self.cell.state.read() {
			CellState::Stub(body) => body.element(index),
			CellState::Proxied(proxy) => proxy.element(index),
		}
	}

	pub fn elements(&self) -> Result<Vec<Value>> {
		match &*self.cell.state.read() {
			CellState::Stub(body) => body.elements(),
			CellState::Proxied(proxy) => proxy.elements(),
		}
	}

	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		match &*self.cell.state.read() {
			CellState::Stub(body) => body.get(key),
			CellState::Proxied(proxy) => proxy.get(key),
		}
	}

	pub fn entries(&self) -> Result<IndexMap<String, Value>> {
		match &*self.cell.state.read() {
			CellState::Stub(body) => body.entries(),
			CellState::Proxied(proxy) => proxy.entries(),
		}
	}

	pub fn insert(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
		match &mut *self.cell.state.write() {
			CellState::Stub(body) => body.insert(key, value),
			CellState::Proxied(proxy) => proxy.insert(key, value),
		}
	}

	/// Invocable view of the cell.
	pub fn apply(&self, args: &[Value]) -> Result<Value> {
		let (method, invocant) = match &*self.cell.state.read() {
			CellState::Stub(body) => (body.callable()?, Invocant::Stub(self.clone())),
			CellState::Proxied(proxy) => {
				let target = proxy.target().clone();
				let method = target.body().callable()?;
				(method, Invocant::Object(target))
			}
		};
		method.call(&invocant, args)
	}

	/// Overwrites the cell with a proxy to `obj`, keeping its shape.
	///
	/// If the cell was proxied meanwhile (reentrant realization of the same
	/// cell), the existing proxy wins.
	fn install(&self, obj: Arc<Instance>) -> Arc<Instance> {
		let mut state = self.cell.state.write();
		let shape = match &*state {
			CellState::Proxied(proxy) => return proxy.target().clone(),
			CellState::Stub(body) => body.shape(),
		};
		*state = CellState::Proxied(ProxyAdapter::adopt(shape, obj.clone()));
		obj
	}
}

impl fmt::Debug for Stub {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Stub")
			.field("class", &self.record().name())
			.field("identity", &self.identity())
			.field("state", &self.state())
			.finish()
	}
}
