//! Per-request configuration of includes, excludes and fieldsets.

use crate::request::RequestParams;
use crate::serializer::{DataArraySerializer, Serializer};
use crate::settings::{DEFAULT_PARAM_DELIMITER, DEFAULT_RECURSION_LIMIT, ManagerSettings};
use crate::{Fieldset, ParamBag, Resource, Scope};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use prism_exception::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

static MODIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(\w+)(\(([^)]+)\))?").expect("Invalid modifier regex pattern")
});

static EMPTY_PARAMS: Lazy<ParamBag> = Lazy::new(ParamBag::empty);

/// Include, exclude or fieldset input before normalisation.
///
/// Strings are split on `,`. JSON values must be a string or an array of
/// strings.
#[derive(Debug, Clone, PartialEq)]
pub enum IncludeInput {
	/// Comma separated entries
	Csv(String),
	/// One entry per element
	List(Vec<String>),
	/// Untyped input, validated on use
	Value(Value),
}

impl IncludeInput {
	fn into_entries(self, method: &str) -> Result<Vec<String>> {
		match self {
			IncludeInput::Csv(csv) => Ok(split_csv(&csv)),
			IncludeInput::List(list) => Ok(list),
			IncludeInput::Value(Value::String(csv)) => Ok(split_csv(&csv)),
			IncludeInput::Value(Value::Array(values)) => values
				.into_iter()
				.map(|value| match value {
					Value::String(entry) => Ok(entry),
					other => Err(Error::InvalidArgument(format!(
						"The {}() method expects a string or an array of strings. Array element of type {} given",
						method,
						Error::json_type_name(&other)
					))),
				})
				.collect(),
			IncludeInput::Value(other) => Err(Error::InvalidArgument(format!(
				"The {}() method expects a string or an array. {} given",
				method,
				Error::json_type_name(&other)
			))),
		}
	}
}

fn split_csv(csv: &str) -> Vec<String> {
	csv.split(',').map(str::to_string).collect()
}

impl From<&str> for IncludeInput {
	fn from(csv: &str) -> Self {
		IncludeInput::Csv(csv.to_string())
	}
}

impl From<String> for IncludeInput {
	fn from(csv: String) -> Self {
		IncludeInput::Csv(csv)
	}
}

impl From<&String> for IncludeInput {
	fn from(csv: &String) -> Self {
		IncludeInput::Csv(csv.clone())
	}
}

impl From<Vec<String>> for IncludeInput {
	fn from(list: Vec<String>) -> Self {
		IncludeInput::List(list)
	}
}

impl From<Vec<&str>> for IncludeInput {
	fn from(list: Vec<&str>) -> Self {
		IncludeInput::List(list.into_iter().map(str::to_string).collect())
	}
}

impl From<&[&str]> for IncludeInput {
	fn from(list: &[&str]) -> Self {
		IncludeInput::List(list.iter().map(|entry| entry.to_string()).collect())
	}
}

impl<const N: usize> From<[&str; N]> for IncludeInput {
	fn from(list: [&str; N]) -> Self {
		IncludeInput::List(list.iter().map(|entry| entry.to_string()).collect())
	}
}

impl From<Value> for IncludeInput {
	fn from(value: Value) -> Self {
		IncludeInput::Value(value)
	}
}

/// Request-level configuration shared by every scope of one response.
///
/// The manager is configured first and then only read while scopes resolve.
///
/// # Examples
///
/// ```
/// use prism_core::Manager;
///
/// let mut manager = Manager::new();
/// manager.parse_includes("author.profile,comments:limit(5|1)").unwrap();
///
/// assert_eq!(manager.requested_includes(), ["author", "author.profile", "comments"]);
/// assert_eq!(manager.include_params("comments").first("limit"), Some("5"));
/// ```
pub struct Manager {
	requested_includes: Vec<String>,
	requested_excludes: Vec<String>,
	requested_fieldsets: IndexMap<String, Fieldset>,
	include_params: HashMap<String, ParamBag>,
	param_delimiter: String,
	recursion_limit: usize,
	serializer: Box<dyn Serializer>,
}

impl Manager {
	/// Create a manager with default settings and the
	/// [`DataArraySerializer`]
	pub fn new() -> Self {
		Self {
			requested_includes: Vec::new(),
			requested_excludes: Vec::new(),
			requested_fieldsets: IndexMap::new(),
			include_params: HashMap::new(),
			param_delimiter: DEFAULT_PARAM_DELIMITER.to_string(),
			recursion_limit: DEFAULT_RECURSION_LIMIT,
			serializer: Box::new(DataArraySerializer),
		}
	}

	/// Create a manager from validated settings
	pub fn with_settings(settings: &ManagerSettings) -> Result<Self> {
		settings.validate()?;
		let mut manager = Self::new();
		manager.recursion_limit = settings.recursion_limit;
		manager.param_delimiter = settings.param_delimiter.clone();
		Ok(manager)
	}

	/// Parse the requested includes, replacing earlier ones
	///
	/// Each entry is a dotted path optionally followed by modifiers,
	/// `comments:limit(5|1):order(created_at|desc)`. Paths are cut to the
	/// recursion limit, repeated paths are ignored together with their
	/// modifiers, and every ancestor of a requested path is requested too.
	pub fn parse_includes(&mut self, includes: impl Into<IncludeInput>) -> Result<&mut Self> {
		let entries = includes.into().into_entries("parse_includes")?;

		self.requested_includes.clear();
		self.include_params.clear();

		for entry in entries {
			let (path, modifiers) = match entry.split_once(':') {
				Some((path, modifiers)) => (path, Some(modifiers)),
				None => (entry.as_str(), None),
			};
			if path.is_empty() {
				continue;
			}
			let (modifiers, sub_relation) = match modifiers.map(|m| m.split_once('.')) {
				Some(Some((modifiers, sub_relation))) => (Some(modifiers), Some(sub_relation)),
				Some(None) => (modifiers, None),
				None => (None, None),
			};

			let path = self.trim_to_recursion_limit(path);
			if self.requested_includes.contains(&path) {
				continue;
			}
			self.requested_includes.push(path.clone());

			let Some(modifiers) = modifiers else {
				continue;
			};
			let params = self.parse_modifiers(modifiers);
			self.include_params.insert(path, params);

			// `foo:limit(5).bar` requests `bar` at the top level, not `foo.bar`
			if let Some(sub_relation) = sub_relation.filter(|s| !s.is_empty()) {
				let sub_relation = self.trim_to_recursion_limit(sub_relation);
				self.requested_includes.push(sub_relation);
			}
		}

		self.auto_include_parents();
		debug!(
			includes = ?self.requested_includes,
			"parsed requested includes"
		);
		Ok(self)
	}

	/// Parse the excluded includes, replacing earlier ones
	pub fn parse_excludes(&mut self, excludes: impl Into<IncludeInput>) -> Result<&mut Self> {
		let entries = excludes.into().into_entries("parse_excludes")?;

		self.requested_excludes.clear();
		for entry in entries.iter().filter(|entry| !entry.is_empty()) {
			let path = self.trim_to_recursion_limit(entry);
			if !self.requested_excludes.contains(&path) {
				self.requested_excludes.push(path);
			}
		}

		debug!(
			excludes = ?self.requested_excludes,
			"parsed requested excludes"
		);
		Ok(self)
	}

	/// Parse fieldsets keyed by resource type, replacing earlier ones
	///
	/// # Examples
	///
	/// ```
	/// use prism_core::Manager;
	///
	/// let mut manager = Manager::new();
	/// manager.parse_fieldsets([("books", "title,year,title,")]).unwrap();
	///
	/// let fieldset = manager.fieldset("books").unwrap();
	/// assert_eq!(fieldset.iter().collect::<Vec<_>>(), ["title", "year"]);
	/// assert!(manager.fieldset("authors").is_none());
	/// ```
	pub fn parse_fieldsets<I, K, V>(&mut self, fieldsets: I) -> Result<&mut Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<IncludeInput>,
	{
		let mut parsed = IndexMap::new();
		for (resource_type, fields) in fieldsets {
			let fields = fields.into().into_entries("parse_fieldsets")?;
			parsed.insert(resource_type.into(), Fieldset::new(fields));
		}
		self.requested_fieldsets = parsed;

		debug!(
			fieldsets = ?self.requested_fieldsets,
			"parsed requested fieldsets"
		);
		Ok(self)
	}

	/// Parse fieldsets from a JSON object of type to fields
	pub fn parse_fieldsets_value(&mut self, fieldsets: &Value) -> Result<&mut Self> {
		match fieldsets {
			Value::Object(map) => self.parse_fieldsets(
				map.iter()
					.map(|(resource_type, fields)| (resource_type.clone(), fields.clone())),
			),
			other => Err(Error::InvalidArgument(format!(
				"The parse_fieldsets() method expects an object. {} given",
				Error::json_type_name(other)
			))),
		}
	}

	/// Feed parsed query parameters into the include, exclude and fieldset
	/// parsers; absent parameters clear the corresponding state
	pub fn apply_request_params(&mut self, params: &RequestParams) -> Result<&mut Self> {
		self.parse_includes(params.includes().unwrap_or_default())?;
		self.parse_excludes(params.excludes().unwrap_or_default())?;
		self.parse_fieldsets(params.fieldsets())?;
		Ok(self)
	}

	/// Wrap a resource in a root scope
	pub fn create_data(&self, resource: impl Into<Resource>) -> Scope<'_> {
		self.create_scope(resource, None, None)
	}

	/// Wrap a resource in a scope, below `parent` when one is given
	pub fn create_scope(
		&self,
		resource: impl Into<Resource>,
		scope_identifier: Option<&str>,
		parent: Option<&Scope<'_>>,
	) -> Scope<'_> {
		let parent_scopes = match parent {
			Some(parent) => {
				let mut parent_scopes = parent.parent_scopes().to_vec();
				parent_scopes.push(parent.scope_identifier().unwrap_or_default().to_string());
				parent_scopes
			}
			None => Vec::new(),
		};
		Scope::new(
			self,
			resource.into(),
			scope_identifier.map(str::to_string),
			parent_scopes,
		)
	}

	/// Requested include paths, parents included
	pub fn requested_includes(&self) -> &[String] {
		&self.requested_includes
	}

	/// Excluded include paths
	pub fn requested_excludes(&self) -> &[String] {
		&self.requested_excludes
	}

	/// Fieldsets keyed by resource type
	pub fn requested_fieldsets(&self) -> &IndexMap<String, Fieldset> {
		&self.requested_fieldsets
	}

	/// Fieldset of a resource type, `None` when that type is unfiltered
	pub fn fieldset(&self, resource_type: &str) -> Option<&Fieldset> {
		self.requested_fieldsets.get(resource_type)
	}

	/// Modifier parameters of an include path; empty when none were given
	pub fn include_params(&self, include: &str) -> &ParamBag {
		self.include_params.get(include).unwrap_or(&EMPTY_PARAMS)
	}

	/// Maximum number of segments kept in include paths
	pub fn recursion_limit(&self) -> usize {
		self.recursion_limit
	}

	/// Set the recursion limit; a limit of zero is treated as one
	///
	/// Only affects includes parsed afterwards.
	pub fn set_recursion_limit(&mut self, recursion_limit: usize) -> &mut Self {
		self.recursion_limit = recursion_limit.max(1);
		self
	}

	/// Separator of modifier arguments
	pub fn param_delimiter(&self) -> &str {
		&self.param_delimiter
	}

	/// The active serializer
	pub fn serializer(&self) -> &dyn Serializer {
		self.serializer.as_ref()
	}

	/// Replace the active serializer
	pub fn set_serializer(&mut self, serializer: impl Serializer + 'static) -> &mut Self {
		self.serializer = Box::new(serializer);
		self
	}

	/// Builder form of [`Self::set_serializer`]
	pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
		self.serializer = Box::new(serializer);
		self
	}

	fn parse_modifiers(&self, modifiers: &str) -> ParamBag {
		let mut params: IndexMap<String, Vec<String>> = IndexMap::new();
		for captures in MODIFIER_REGEX.captures_iter(modifiers) {
			let name = &captures[1];
			let args = captures.get(3).map_or("", |args| args.as_str());
			params.insert(
				name.to_string(),
				args.split(self.param_delimiter.as_str())
					.map(str::to_string)
					.collect(),
			);
		}
		ParamBag::new(params)
	}

	fn trim_to_recursion_limit(&self, path: &str) -> String {
		path.split('.')
			.take(self.recursion_limit)
			.collect::<Vec<_>>()
			.join(".")
	}

	fn auto_include_parents(&mut self) {
		let mut parsed: IndexSet<String> = IndexSet::new();
		for include in &self.requested_includes {
			let mut prefix = String::with_capacity(include.len());
			for (index, segment) in include.split('.').enumerate() {
				if index > 0 {
					prefix.push('.');
				}
				prefix.push_str(segment);
				parsed.insert(prefix.clone());
			}
		}
		self.requested_includes = parsed.into_iter().collect();
	}
}

impl Default for Manager {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Manager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Manager")
			.field("requested_includes", &self.requested_includes)
			.field("requested_excludes", &self.requested_excludes)
			.field("requested_fieldsets", &self.requested_fieldsets)
			.field("include_params", &self.include_params)
			.field("param_delimiter", &self.param_delimiter)
			.field("recursion_limit", &self.recursion_limit)
			.finish_non_exhaustive()
	}
}
