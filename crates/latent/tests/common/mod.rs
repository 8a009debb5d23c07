use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use latent::{Body, Class, Error, Instance, RealizationRegistry, StubClass, Value};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `S` stubs realizing into `R` through `load`, counting constructions.
pub struct Library {
	pub record: Arc<StubClass>,
	pub registry: Arc<RealizationRegistry>,
	loads: Arc<AtomicUsize>,
}

impl Library {
	pub fn new(believe_caller: bool) -> Self {
		init_tracing();
		let loads = Arc::new(AtomicUsize::new(0));
		let registry = Arc::new(RealizationRegistry::new());

		let r = Class::builder("R")
			.method("onlyOnR", |inv, _| {
				let obj = inv.as_object().ok_or_else(|| Error::fault("onlyOnR needs an instance"))?;
				Ok(obj.get("serial")?.unwrap_or_default())
			})
			.method("someOtherMethod", |_, args| Ok(Value::Int(args.len() as i64)))
			.build();

		let counter = loads.clone();
		let target = r.clone();
		let s = Class::builder("S")
			.method("load", move |inv, _| {
				let stub = inv.as_stub().ok_or_else(|| Error::fault("load needs a stub"))?;
				let serial = counter.fetch_add(1, Ordering::SeqCst) as i64 + 1;
				let mut entries = stub.entries()?;
				entries.insert("serial".into(), Value::Int(serial));
				Ok(Value::Object(Instance::new(target.clone(), Body::Mapping(entries))))
			})
			.build();

		let record = StubClass::builder(s)
			.becomes(r)
			.realize_method("load")
			.believe_caller(believe_caller)
			.warn_realization(true)
			.warn_realize_again(true)
			.registry(registry.clone())
			.build()
			.expect("S builds");

		Self {
			record,
			registry,
			loads,
		}
	}

	pub fn loads(&self) -> usize {
		self.loads.load(Ordering::SeqCst)
	}
}
