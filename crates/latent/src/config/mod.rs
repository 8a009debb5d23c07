//! Declarative stub definitions.
//!
//! A definition names the nominal class, the realize method and the policy
//! flags; the declared class supplies the realize method and local methods.
//!
//! ```toml
//! becomes = "Book"
//! realize = "load"
//! source-module = "library"
//! warn-realization = true
//! class-forward = "verified"
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::error::SetupError;
use crate::object::{Class, ClassTable};
use crate::registry::RealizationRegistry;
use crate::stub::{ClassForward, StubClass};

/// Parsed stub definition. Required options are optional here so that their
/// absence is reported as [`SetupError::MissingConfiguration`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct StubSpec {
	pub becomes: Option<String>,
	pub realize: Option<String>,
	pub warn_realization: bool,
	pub warn_realize_again: bool,
	pub believe_caller: bool,
	pub class_forward: ClassForward,
	pub source_module: Option<String>,
}

impl StubSpec {
	pub fn from_toml(input: &str) -> Result<Self, SetupError> {
		Ok(toml::from_str(input)?)
	}

	/// Builds the stub class for `declared`, resolving `becomes` through `classes`.
	pub fn build(&self, declared: Arc<Class>, classes: &ClassTable) -> Result<Arc<StubClass>, SetupError> {
		self.build_with_registry(declared, classes, RealizationRegistry::global())
	}

	/// As [`Self::build`], reporting to `registry`.
	pub fn build_with_registry(
		&self,
		declared: Arc<Class>,
		classes: &ClassTable,
		registry: Arc<RealizationRegistry>,
	) -> Result<Arc<StubClass>, SetupError> {
		let stub = declared.name().to_string();
		let Some(becomes) = self.becomes.as_deref() else {
			return Err(SetupError::MissingConfiguration {
				stub,
				option: "becomes",
			});
		};
		let Some(realize) = self.realize.as_deref() else {
			return Err(SetupError::MissingConfiguration {
				stub,
				option: "realize",
			});
		};
		let target = classes
			.resolve(becomes, self.source_module.as_deref())
			.ok_or_else(|| SetupError::UnknownClass {
				stub: stub.clone(),
				class: becomes.to_string(),
			})?;

		let mut builder = StubClass::builder(declared)
			.becomes(target)
			.realize_method(realize)
			.warn_realization(self.warn_realization)
			.warn_realize_again(self.warn_realize_again)
			.believe_caller(self.believe_caller)
			.class_forward(self.class_forward)
			.registry(registry);
		if let Some(module) = &self.source_module {
			builder = builder.source_module(module.clone());
		}
		builder.build()
	}
}
