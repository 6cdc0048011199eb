//! Read-only parameter containers handed to include handlers and scopes.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Modifier parameters parsed from an include string.
///
/// `comments:limit(5|1):order(created_at|desc)` yields a bag with
/// `limit => ["5", "1"]` and `order => ["created_at", "desc"]`. The bag is
/// built once by the [`Manager`](crate::Manager) and never changes afterwards.
///
/// # Examples
///
/// ```
/// use prism_core::ParamBag;
///
/// let params = ParamBag::from_iter([("limit", vec!["5", "1"])]);
/// assert_eq!(params.get("limit"), Some(&["5".to_string(), "1".to_string()][..]));
/// assert_eq!(params.first("limit"), Some("5"));
/// assert!(params.get("order").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamBag {
	params: IndexMap<String, Vec<String>>,
}

impl ParamBag {
	/// Create a bag from an already parsed modifier map
	pub fn new(params: IndexMap<String, Vec<String>>) -> Self {
		Self { params }
	}

	/// Create an empty bag
	pub fn empty() -> Self {
		Self::default()
	}

	/// Arguments of a modifier, if present
	pub fn get(&self, name: &str) -> Option<&[String]> {
		self.params.get(name).map(Vec::as_slice)
	}

	/// First argument of a modifier, if present
	pub fn first(&self, name: &str) -> Option<&str> {
		self.get(name)
			.and_then(|args| args.first())
			.map(String::as_str)
	}

	/// Whether the modifier was supplied
	pub fn contains(&self, name: &str) -> bool {
		self.params.contains_key(name)
	}

	/// Modifier names in the order they were written
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.params.keys().map(String::as_str)
	}

	/// Iterate over modifiers and their arguments
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.params
			.iter()
			.map(|(name, args)| (name.as_str(), args.as_slice()))
	}

	/// Number of modifiers
	pub fn len(&self) -> usize {
		self.params.len()
	}

	/// Whether no modifiers were supplied
	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}
}

impl<K, V> FromIterator<(K, Vec<V>)> for ParamBag
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, Vec<V>)>>(iter: I) -> Self {
		Self {
			params: iter
				.into_iter()
				.map(|(name, args)| (name.into(), args.into_iter().map(Into::into).collect()))
				.collect(),
		}
	}
}

/// Allow-list of output fields for one resource type.
///
/// Returned by [`Manager::fieldset`](crate::Manager::fieldset). An absent
/// fieldset means "no filtering"; a present one keeps only the listed fields
/// plus the serializer's mandatory fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fieldset {
	fields: IndexSet<String>,
}

impl Fieldset {
	/// Create a fieldset from field names, dropping empty and repeated names
	pub fn new<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			fields: fields
				.into_iter()
				.map(Into::into)
				.filter(|field: &String| !field.is_empty())
				.collect(),
		}
	}

	/// Whether the field is allowed
	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains(field)
	}

	/// Field names in request order
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.fields.iter().map(String::as_str)
	}

	/// Number of allowed fields
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Whether the fieldset is empty
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}
