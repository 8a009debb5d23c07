//! Error types for stub setup and runtime dispatch.

use thiserror::Error;

use crate::object::Shape;

/// Errors raised while defining a stub class.
///
/// Every variant is fatal and surfaces from `build()`, never from first use.
#[derive(Debug, Error)]
pub enum SetupError {
	/// A required option (`becomes` or `realize`) was not supplied.
	#[error("{stub}: missing required option `{option}`")]
	MissingConfiguration {
		/// Declared stub class name.
		stub: String,
		/// The option that was absent.
		option: &'static str,
	},

	/// `realize` names a method the stub class does not define.
	#[error("{stub}: realize method `{method}` is not defined on the stub class")]
	UnresolvedRealize {
		/// Declared stub class name.
		stub: String,
		/// Method named by the `realize` option.
		method: String,
	},

	/// `becomes` names a class the class table cannot resolve.
	#[error("{stub}: unknown target class `{class}`")]
	UnknownClass {
		/// Declared stub class name.
		stub: String,
		/// Unresolved target class name.
		class: String,
	},

	/// Declarative stub definition could not be parsed.
	#[error("stub definition parse error: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Errors raised by dispatch, realization and shape-specific reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// The nominal target does not expose the requested method.
	#[error("{class} does not define method `{method}`")]
	UnknownMethod {
		/// Class that was probed.
		class: String,
		/// Requested method name.
		method: String,
	},

	/// A shape-specific read hit a cell or body of a different shape.
	#[error("cannot use a {found} value as a {expected}")]
	ShapeMismatch {
		/// Shape the operation needs.
		expected: Shape,
		/// Shape actually present.
		found: Shape,
	},

	/// The realize operation returned something that is not an object.
	#[error("{stub}: realize returned {found}, not an object")]
	NotAnObject {
		/// Declared stub class name.
		stub: String,
		/// Kind of the returned value.
		found: &'static str,
	},

	/// Failure raised by a method body.
	#[error("{0}")]
	Fault(String),
}

impl Error {
	/// Creates a [`Error::Fault`] from any message.
	pub fn fault(message: impl Into<String>) -> Self {
		Self::Fault(message.into())
	}

	pub(crate) fn unknown_method(class: &str, method: &str) -> Self {
		Self::UnknownMethod {
			class: class.to_string(),
			method: method.to_string(),
		}
	}
}

/// Result type for dispatch and realization.
pub type Result<T, E = Error> = std::result::Result<T, E>;
