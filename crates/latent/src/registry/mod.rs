//! Weak identity registry for realized objects.
//!
//! # Purpose
//!
//! Deduplicate realization: every stub cell sharing an [`Identity`] must end up
//! pointing at the same realized object, including stale duplicates realized
//! later and reentrant attempts made while a realize operation is running.
//!
//! # Invariants
//!
//! * The registry never owns a realized object. Entries are `Weak` handles; an
//!   entry dies with the last strong owner of its object.
//! * At most one live entry per identity. [`RealizationRegistry::register`]
//!   keeps the existing live entry and hands it back instead of replacing it.
//! * Dead entries are pruned lazily on lookup and registration of the same
//!   identity, and wholesale by [`RealizationRegistry::prune`].
//! * Registration sweeps dead entries once the map reaches a threshold that
//!   doubles with the live count, so the map stays proportional to the number
//!   of live realizations.
//!
//! # Concurrency
//!
//! The map sits behind a mutex so register-or-reuse is atomic. Realization
//! itself is not serialized here; two threads may both run a realize
//! operation, and the first to register wins.

use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::identity::Identity;
use crate::object::Instance;

/// Map size below which registration never sweeps.
const SWEEP_FLOOR: usize = 32;

static GLOBAL: LazyLock<Arc<RealizationRegistry>> =
	LazyLock::new(|| Arc::new(RealizationRegistry::new()));

/// Outcome of [`RealizationRegistry::register`].
#[derive(Debug, Clone)]
pub enum Registration {
	/// The offered object is now the registered realization.
	Fresh(Arc<Instance>),
	/// A different live object was already registered; use it instead.
	Reused(Arc<Instance>),
}

impl Registration {
	/// The object every cell of the identity must now point at.
	pub fn object(&self) -> &Arc<Instance> {
		match self {
			Self::Fresh(obj) | Self::Reused(obj) => obj,
		}
	}

	pub fn into_object(self) -> Arc<Instance> {
		match self {
			Self::Fresh(obj) | Self::Reused(obj) => obj,
		}
	}

	pub fn is_reused(&self) -> bool {
		matches!(self, Self::Reused(_))
	}
}

/// Identity to weak realized-object map.
#[derive(Debug, Default)]
pub struct RealizationRegistry {
	entries: Mutex<Entries>,
}

#[derive(Debug)]
struct Entries {
	map: FxHashMap<Identity, Weak<Instance>>,
	sweep_at: usize,
}

impl Default for Entries {
	fn default() -> Self {
		Self {
			map: FxHashMap::default(),
			sweep_at: SWEEP_FLOOR,
		}
	}
}

impl Entries {
	fn sweep(&mut self) -> usize {
		let before = self.map.len();
		self.map.retain(|_, weak| weak.strong_count() > 0);
		self.sweep_at = (self.map.len() * 2).max(SWEEP_FLOOR);
		before - self.map.len()
	}
}

impl RealizationRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Process-wide registry used by stub classes that are not given their own.
	pub fn global() -> Arc<Self> {
		GLOBAL.clone()
	}

	/// Returns the live realization for `identity`, pruning a dead entry.
	pub fn lookup(&self, identity: Identity) -> Option<Arc<Instance>> {
		let mut entries = self.entries.lock();
		let weak = entries.map.get(&identity)?;
		match weak.upgrade() {
			Some(obj) => Some(obj),
			None => {
				entries.map.remove(&identity);
				trace!(%identity, "pruned dead realization");
				None
			}
		}
	}

	/// Registers `loaded` for `identity` unless a different live object already
	/// holds the slot, in which case that object is returned as [`Registration::Reused`].
	pub fn register(&self, identity: Identity, loaded: Arc<Instance>) -> Registration {
		let mut entries = self.entries.lock();
		if let Some(existing) = entries.map.get(&identity).and_then(Weak::upgrade) {
			if Arc::ptr_eq(&existing, &loaded) {
				return Registration::Fresh(existing);
			}
			debug!(%identity, class = existing.class().name(), "identity already realized");
			return Registration::Reused(existing);
		}
		if entries.map.len() >= entries.sweep_at {
			let removed = entries.sweep();
			trace!(removed, live = entries.map.len(), "swept dead realizations");
		}
		entries.map.insert(identity, Arc::downgrade(&loaded));
		debug!(%identity, class = loaded.class().name(), "registered realization");
		Registration::Fresh(loaded)
	}

	/// Drops every dead entry and returns how many were removed.
	pub fn prune(&self) -> usize {
		let removed = self.entries.lock().sweep();
		if removed > 0 {
			trace!(removed, "pruned dead realizations");
		}
		removed
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		self.entries
			.lock()
			.map
			.values()
			.filter(|weak| weak.strong_count() > 0)
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of entries held, dead or alive.
	#[cfg(test)]
	fn held(&self) -> usize {
		self.entries.lock().map.len()
	}
}
