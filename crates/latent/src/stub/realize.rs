use std::sync::Arc;

use tracing::{debug, warn};

use super::{RealizeSpec, Stub, StubClass};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::object::{Instance, Invocant, Value};

/// Drives a stub cell from `Unrealized` to `Proxied`.
///
/// A cell that is already proxied answers from its proxy without touching the
/// registry. A live registry entry for the identity (a stale duplicate, or an
/// alias realized through another cell) is adopted without running the realize
/// operation. Otherwise the realize operation runs with no lock held; its error
/// is returned unchanged and the cell stays unrealized so a later call can
/// retry.
pub(super) fn force_realize(stub: &Stub) -> Result<Arc<Instance>> {
	if let Some(obj) = stub.realized() {
		return Ok(obj);
	}

	let record = stub.record();
	let identity = stub.identity();

	if let Some(existing) = record.registry().lookup(identity) {
		note_reuse(record, identity, &existing);
		return Ok(stub.install(existing));
	}

	if record.policy().warn_on_realize {
		warn!(
			stub = record.name(),
			%identity,
			target = record.will_realize(),
			"realizing stub"
		);
	}

	let loaded = run_realize(record, stub)?;

	if !loaded.isa(record.will_realize()) {
		warn!(
			stub = record.name(),
			%identity,
			target = record.will_realize(),
			found = loaded.class().name(),
			"realized object does not satisfy its nominal class"
		);
	}

	let registration = record.registry().register(identity, loaded);
	if registration.is_reused() {
		note_reuse(record, identity, registration.object());
	}

	let obj = stub.install(registration.into_object());
	debug!(stub = record.name(), %identity, class = obj.class().name(), "stub proxied");
	Ok(obj)
}

fn run_realize(record: &StubClass, stub: &Stub) -> Result<Arc<Instance>> {
	let produced = match record.realize_spec() {
		RealizeSpec::Method(method) => {
			let found = record
				.class()
				.can(method)
				.ok_or_else(|| Error::unknown_method(record.name(), method))?;
			found.call(&Invocant::Stub(stub.clone()), &[])?
		}
		RealizeSpec::Function(realize) => realize(stub)?,
	};

	match produced {
		Value::Object(obj) => Ok(obj),
		other => Err(Error::NotAnObject {
			stub: record.name().to_string(),
			found: other.kind(),
		}),
	}
}

fn note_reuse(record: &StubClass, identity: Identity, existing: &Instance) {
	if record.policy().warn_on_reuse {
		warn!(
			stub = record.name(),
			%identity,
			class = existing.class().name(),
			"stale reference reused existing realization"
		);
	} else {
		debug!(stub = record.name(), %identity, "stale reference reused existing realization");
	}
}
