use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Stable opaque key for one stub instance.
///
/// Allocated when a stub is instantiated and shared by every alias and stale
/// duplicate of it. Used only as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(NonZeroU64);

impl Identity {
	/// Allocates a fresh, process-unique identity.
	pub(crate) fn next() -> Self {
		let raw = NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed);
		// The counter starts at 1 and would need 2^64 allocations to wrap.
		Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
	}

	/// Returns the raw key value.
	pub const fn get(self) -> u64 {
		self.0.get()
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:x}", self.0.get())
	}
}
