use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::Class;

type Loader = Box<dyn FnOnce() -> Vec<Arc<Class>> + Send>;

/// A module's loader; emptied by the run that takes it.
type PendingLoader = Arc<Mutex<Option<Loader>>>;

/// Name-to-class lookup with lazily-run loaders.
///
/// A loader is registered under a module name and runs at most once, the
/// first time a lookup names that module as its source. Concurrent lookups
/// naming the same module wait for that run instead of missing its classes.
/// A loader must not resolve through its own module.
#[derive(Default)]
pub struct ClassTable {
	classes: Mutex<FxHashMap<String, Arc<Class>>>,
	loaders: Mutex<FxHashMap<String, PendingLoader>>,
}

impl ClassTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `class`, replacing any previous class of the same name.
	pub fn register(&self, class: Arc<Class>) -> Option<Arc<Class>> {
		self.classes.lock().insert(class.name().to_string(), class)
	}

	/// Registers a loader that defines the classes of `module`.
	pub fn register_loader<F>(&self, module: impl Into<String>, loader: F)
	where
		F: FnOnce() -> Vec<Arc<Class>> + Send + 'static,
	{
		self.loaders
			.lock()
			.insert(module.into(), Arc::new(Mutex::new(Some(Box::new(loader)))));
	}

	pub fn get(&self, name: &str) -> Option<Arc<Class>> {
		self.classes.lock().get(name).cloned()
	}

	/// Resolves `name`, running the loader for `module` first if the class is
	/// not yet known.
	pub fn resolve(&self, name: &str, module: Option<&str>) -> Option<Arc<Class>> {
		if let Some(class) = self.get(name) {
			return Some(class);
		}
		let module = module?;
		let pending = self.loaders.lock().get(module).cloned()?;
		let mut slot = pending.lock();
		if let Some(loader) = slot.take() {
			let loaded = loader();
			tracing::debug!(module, count = loaded.len(), "loaded class module");
			for class in loaded {
				self.register(class);
			}
		}
		drop(slot);
		self.get(name)
	}
}
