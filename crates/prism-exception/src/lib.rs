//! # prism-exception
//!
//! Error types used throughout the Prism crates.
//!
//! Errors fall into four groups:
//!
//! - **Configuration**: bad include/exclude/fieldset input or settings
//!   ([`Error::InvalidArgument`], [`Error::Config`]).
//! - **Resolution**: transformer wiring mistakes detected while a scope is
//!   resolved ([`Error::MissingIncludeHandler`], [`Error::Include`],
//!   [`Error::InvalidTransformOutput`]).
//! - **Data**: transformer output that a serializer cannot represent
//!   ([`Error::MissingIdentifier`]).
//! - **Adapters**: pagination helpers ([`Error::InvalidPage`]).
//!
//! An include handler returning `Ok(None)` is not an error; it only means the
//! relation does not apply to that element.

use thiserror::Error;

/// Result type alias for Prism operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while configuring a manager or resolving a scope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// An argument had the wrong shape or a resource had the wrong kind.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// A transformer declares an include but no handler is registered for it.
	#[error("Transformer '{transformer}' declares include '{include}' but has no handler '{handler}'")]
	MissingIncludeHandler {
		/// Name of the transformer.
		transformer: String,
		/// Include name as requested.
		include: String,
		/// Handler name derived from the include name.
		handler: String,
	},

	/// An include handler failed.
	#[error("Include handler {transformer}::{handler}() failed: {source}")]
	Include {
		/// Name of the transformer.
		transformer: String,
		/// Name of the failing handler.
		handler: String,
		/// Error returned by the handler.
		#[source]
		source: Box<Error>,
	},

	/// A transform function returned something other than a JSON object.
	#[error("Transformer '{transformer}' must return an object, received {found}")]
	InvalidTransformOutput {
		/// Name of the transformer.
		transformer: String,
		/// JSON type that was returned.
		found: &'static str,
	},

	/// A serializer needs an `id` field that the transformed data lacks.
	#[error("Resource objects of type '{}' must have a valid id", .resource_key.as_deref().unwrap_or("<none>"))]
	MissingIdentifier {
		/// Resource key of the offending item.
		resource_key: Option<String>,
	},

	/// Free-form failure raised from user transformers.
	#[error("Transform error: {0}")]
	Transform(String),

	/// Invalid page or cursor input.
	#[error("Invalid page: {0}")]
	InvalidPage(String),

	/// Invalid settings.
	#[error("Configuration error: {0}")]
	Config(String),

	/// JSON encoding failure.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the JSON type name of a value, as used in error messages.
	pub fn json_type_name(value: &serde_json::Value) -> &'static str {
		match value {
			serde_json::Value::Null => "null",
			serde_json::Value::Bool(_) => "boolean",
			serde_json::Value::Number(_) => "number",
			serde_json::Value::String(_) => "string",
			serde_json::Value::Array(_) => "array",
			serde_json::Value::Object(_) => "object",
		}
	}

	/// Check if this error was raised by misconfigured input
	pub fn is_configuration_error(&self) -> bool {
		matches!(self, Error::InvalidArgument(_) | Error::Config(_))
	}

	/// Returns the innermost error, unwrapping nested include failures.
	pub fn root_cause(&self) -> &Error {
		match self {
			Error::Include { source, .. } => source.root_cause(),
			other => other,
		}
	}
}
