//! Manager settings loadable from TOML.

use prism_exception::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default depth of include paths
pub const DEFAULT_RECURSION_LIMIT: usize = 10;

/// Default separator of modifier arguments
pub const DEFAULT_PARAM_DELIMITER: &str = "|";

/// Tunables of a [`Manager`](crate::Manager) and of query-string parsing.
///
/// # Examples
///
/// ```
/// use prism_core::ManagerSettings;
///
/// let settings = ManagerSettings::from_toml_str(r#"
///     recursion_limit = 3
///     include_param = "with"
/// "#).unwrap();
///
/// assert_eq!(settings.recursion_limit, 3);
/// assert_eq!(settings.include_param, "with");
/// assert_eq!(settings.param_delimiter, "|");
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
	/// Maximum number of dot segments kept in an include path
	pub recursion_limit: usize,

	/// Separator between modifier arguments, `limit(5|1)`
	pub param_delimiter: String,

	/// Query parameter carrying includes
	pub include_param: String,

	/// Query parameter carrying excludes
	pub exclude_param: String,

	/// Query parameter prefix of fieldsets, `fields[books]=title`
	pub fieldsets_param: String,
}

impl Default for ManagerSettings {
	fn default() -> Self {
		Self {
			recursion_limit: DEFAULT_RECURSION_LIMIT,
			param_delimiter: DEFAULT_PARAM_DELIMITER.to_string(),
			include_param: "include".to_string(),
			exclude_param: "exclude".to_string(),
			fieldsets_param: "fields".to_string(),
		}
	}
}

impl ManagerSettings {
	/// Parse settings from a TOML document; missing keys keep their defaults.
	pub fn from_toml_str(content: &str) -> Result<Self> {
		let settings: Self =
			toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns [`Error::Config`] if the file cannot be read, parsed or
	/// validated.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path)
			.map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
		Self::from_toml_str(&content)
	}

	/// Set the recursion limit
	pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
		self.recursion_limit = recursion_limit;
		self
	}

	/// Set the modifier argument delimiter
	pub fn with_param_delimiter(mut self, delimiter: impl Into<String>) -> Self {
		self.param_delimiter = delimiter.into();
		self
	}

	/// Reject settings that would make parsing meaningless
	pub fn validate(&self) -> Result<()> {
		if self.recursion_limit == 0 {
			return Err(Error::Config(
				"recursion_limit must be at least 1".to_string(),
			));
		}
		if self.param_delimiter.is_empty() {
			return Err(Error::Config(
				"param_delimiter must not be empty".to_string(),
			));
		}
		for (name, value) in [
			("include_param", &self.include_param),
			("exclude_param", &self.exclude_param),
			("fieldsets_param", &self.fieldsets_param),
		] {
			if value.is_empty() {
				return Err(Error::Config(format!("{} must not be empty", name)));
			}
		}
		Ok(())
	}
}
