//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;
use crate::object::{Body, Class, Instance, Invocant, Shape, Value};
use crate::registry::RealizationRegistry;
use crate::stub::{Stub, StubClass, StubClassBuilder};

pub(crate) fn document_class() -> Arc<Class> {
	Class::builder("Document")
		.method("kind", |_, _| Ok("document".into()))
		.build()
}

/// Nominal target used throughout: `Book`, a `Document`.
pub(crate) fn target_class() -> Arc<Class> {
	Class::builder("Book")
		.parent(document_class())
		.method("title", |inv, _| {
			let obj = inv.as_object().ok_or_else(|| Error::fault("title needs an instance"))?;
			Ok(obj.get("title")?.unwrap_or_default())
		})
		.method("only_on_target", |_, _| Ok("target-only".into()))
		.method("echo", |_, args| Ok(Value::List(args.to_vec())))
		.method("shelf", |inv, _| match inv {
			Invocant::Class(class) => Ok(format!("shelf:{}", class.name()).into()),
			_ => Ok("shelf:instance".into()),
		})
		.build()
}

pub(crate) fn plain_object(class: &Arc<Class>) -> Arc<Instance> {
	Instance::new(class.clone(), Body::Mapping(Default::default()))
}

/// Stub class `LazyBook` realizing into [`target_class`] via its `load` method,
/// with an isolated registry and a counter of realize runs.
pub(crate) struct Fixture {
	pub registry: Arc<RealizationRegistry>,
	pub record: Arc<StubClass>,
	loads: Arc<AtomicUsize>,
}

impl Fixture {
	pub fn new() -> Self {
		Self::with(|builder| builder)
	}

	pub fn with(configure: impl FnOnce(StubClassBuilder) -> StubClassBuilder) -> Self {
		let loads = Arc::new(AtomicUsize::new(0));
		let registry = Arc::new(RealizationRegistry::new());
		let book = target_class();

		let counter = loads.clone();
		let target = book.clone();
		let declared = Class::builder("LazyBook")
			.parent(Class::builder("Lazy").build())
			.method("load", move |inv, _| {
				let stub = inv.as_stub().ok_or_else(|| Error::fault("load needs a stub"))?;
				counter.fetch_add(1, Ordering::SeqCst);
				Ok(Value::Object(Instance::new(target.clone(), loaded_body(stub)?)))
			})
			.method("header", |inv, _| {
				let stub = inv.as_stub().ok_or_else(|| Error::fault("header needs a stub"))?;
				Ok(stub.get("title")?.unwrap_or_default())
			})
			.build();

		let builder = StubClass::builder(declared)
			.becomes(book)
			.realize_method("load")
			.registry(registry.clone());
		let record = configure(builder).build().expect("fixture stub class builds");

		Self {
			registry,
			record,
			loads,
		}
	}

	pub fn loads(&self) -> usize {
		self.loads.load(Ordering::SeqCst)
	}

	pub fn stub(&self, body: Body) -> Stub {
		self.record.instantiate(body)
	}

	/// Mapping-shaped stub with a `title` header.
	pub fn book(&self) -> Stub {
		self.stub(Body::mapping([("title", "Dune")]))
	}
}

/// Realized body: the stub's own data plus a `loaded` marker, same shape.
fn loaded_body(stub: &Stub) -> Result<Body, Error> {
	Ok(match stub.shape() {
		Shape::Mapping => {
			let mut entries = stub.entries()?;
			entries.insert("loaded".into(), Value::Bool(true));
			Body::Mapping(entries)
		}
		Shape::Sequence => {
			let mut items = stub.elements()?;
			items.push("loaded".into());
			Body::Sequence(items)
		}
		Shape::Scalar => Body::Scalar(stub.scalar()?),
	})
}
