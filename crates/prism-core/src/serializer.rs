//! Serializer contract and the two plain-array serializers.
//!
//! A [`Scope`](crate::Scope) produces transformed maps and asks the active
//! [`Serializer`] to wrap them. Sideloading serializers additionally receive
//! the raw include output of every element so they can hoist related objects
//! into a separate top-level container.

use crate::pagination::{Cursor, Paginator};
use crate::Resource;
use prism_exception::Result;
use serde_json::{json, Map, Value};

/// Shapes transformed data into an output envelope.
///
/// Every method except [`collection`](Self::collection),
/// [`item`](Self::item), [`null`](Self::null), [`meta`](Self::meta),
/// [`paginator`](Self::paginator) and [`cursor`](Self::cursor) has a default
/// implementation for serializers that nest includes in place.
pub trait Serializer: Send + Sync {
	/// Wrap the transformed elements of a collection
	fn collection(
		&self,
		resource_key: Option<&str>,
		data: Vec<Map<String, Value>>,
	) -> Result<Map<String, Value>>;

	/// Wrap the transformed data of an item
	fn item(
		&self,
		resource_key: Option<&str>,
		data: Map<String, Value>,
	) -> Result<Map<String, Value>>;

	/// Envelope of a null resource, `None` to render nothing
	fn null(&self) -> Option<Map<String, Value>>;

	/// Wrap the resource meta
	fn meta(&self, meta: &Map<String, Value>) -> Map<String, Value>;

	/// Meta entry describing a page-number paginator
	fn paginator(&self, paginator: &dyn Paginator) -> (String, Value);

	/// Meta entry describing a cursor
	fn cursor(&self, cursor: &dyn Cursor) -> (String, Value);

	/// Top-level container of sideloaded objects
	///
	/// `included` holds, per element, the map from include name to that
	/// include's serialized output.
	fn included_data(
		&self,
		_resource: &Resource,
		_included: &[Map<String, Value>],
	) -> Result<Map<String, Value>> {
		Ok(Map::new())
	}

	/// Add relationship data to the envelope once includes are known
	fn inject_data(
		&self,
		data: Map<String, Value>,
		_included: &[Map<String, Value>],
	) -> Result<Map<String, Value>> {
		Ok(data)
	}

	/// Annotate the envelope with the includes the transformer offers
	fn inject_available_include_data(
		&self,
		data: Map<String, Value>,
		_available_includes: &[String],
	) -> Map<String, Value> {
		data
	}

	/// Final pass over sideloaded objects at the root scope
	fn filter_includes(
		&self,
		included: Map<String, Value>,
		_data: &Map<String, Value>,
	) -> Map<String, Value> {
		included
	}

	/// Combine one element's transformed data with its include output
	///
	/// Include keys overwrite transformed keys unless the serializer
	/// sideloads.
	fn merge_includes(
		&self,
		mut transformed: Map<String, Value>,
		included: &Map<String, Value>,
	) -> Map<String, Value> {
		if !self.sideload_includes() {
			for (key, value) in included {
				transformed.insert(key.clone(), value.clone());
			}
		}
		transformed
	}

	/// Whether includes are hoisted out of the elements
	fn sideload_includes(&self) -> bool {
		false
	}

	/// Fields kept regardless of the requested fieldset
	fn mandatory_fields(&self) -> &[&str] {
		&[]
	}
}

/// Builds the `pagination` meta value shared by the array serializers.
pub fn pagination_meta(paginator: &dyn Paginator) -> Value {
	let current_page = paginator.current_page();
	let last_page = paginator.last_page();

	let mut links = Map::new();
	if current_page > 1 {
		links.insert(
			"previous".to_string(),
			Value::String(paginator.url(current_page - 1)),
		);
	}
	if current_page < last_page {
		links.insert(
			"next".to_string(),
			Value::String(paginator.url(current_page + 1)),
		);
	}

	json!({
		"total": paginator.total(),
		"count": paginator.count(),
		"per_page": paginator.per_page(),
		"current_page": current_page,
		"total_pages": last_page,
		"links": links,
	})
}

/// Builds the `cursor` meta value shared by the array serializers.
pub fn cursor_meta(cursor: &dyn Cursor) -> Value {
	json!({
		"current": cursor.current(),
		"prev": cursor.prev(),
		"next": cursor.next(),
		"count": cursor.count(),
	})
}

/// Items render bare; collections sit under their resource key.
///
/// # Examples
///
/// ```
/// use prism_core::{ArraySerializer, Collection, Manager, Transformer};
/// use serde_json::json;
///
/// let mut manager = Manager::new();
/// manager.set_serializer(ArraySerializer);
///
/// let books = Collection::new(vec![json!({"title": "Foo"})], Transformer::identity())
///     .with_resource_key("books");
/// let output = manager.create_data(books).to_array().unwrap();
/// assert_eq!(output, json!({"books": [{"title": "Foo"}]}));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ArraySerializer;

impl Serializer for ArraySerializer {
	fn collection(
		&self,
		resource_key: Option<&str>,
		data: Vec<Map<String, Value>>,
	) -> Result<Map<String, Value>> {
		let key = resource_key.filter(|key| !key.is_empty()).unwrap_or("data");
		let mut envelope = Map::new();
		envelope.insert(
			key.to_string(),
			Value::Array(data.into_iter().map(Value::Object).collect()),
		);
		Ok(envelope)
	}

	fn item(
		&self,
		_resource_key: Option<&str>,
		data: Map<String, Value>,
	) -> Result<Map<String, Value>> {
		Ok(data)
	}

	fn null(&self) -> Option<Map<String, Value>> {
		Some(Map::new())
	}

	fn meta(&self, meta: &Map<String, Value>) -> Map<String, Value> {
		wrap_meta(meta)
	}

	fn paginator(&self, paginator: &dyn Paginator) -> (String, Value) {
		("pagination".to_string(), pagination_meta(paginator))
	}

	fn cursor(&self, cursor: &dyn Cursor) -> (String, Value) {
		("cursor".to_string(), cursor_meta(cursor))
	}
}

/// Items and collections both render under a `data` key.
///
/// This is the serializer a [`Manager`](crate::Manager) starts with.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataArraySerializer;

impl Serializer for DataArraySerializer {
	fn collection(
		&self,
		_resource_key: Option<&str>,
		data: Vec<Map<String, Value>>,
	) -> Result<Map<String, Value>> {
		Ok(wrap_data(Value::Array(
			data.into_iter().map(Value::Object).collect(),
		)))
	}

	fn item(
		&self,
		_resource_key: Option<&str>,
		data: Map<String, Value>,
	) -> Result<Map<String, Value>> {
		Ok(wrap_data(Value::Object(data)))
	}

	fn null(&self) -> Option<Map<String, Value>> {
		Some(wrap_data(Value::Array(Vec::new())))
	}

	fn meta(&self, meta: &Map<String, Value>) -> Map<String, Value> {
		wrap_meta(meta)
	}

	fn paginator(&self, paginator: &dyn Paginator) -> (String, Value) {
		("pagination".to_string(), pagination_meta(paginator))
	}

	fn cursor(&self, cursor: &dyn Cursor) -> (String, Value) {
		("cursor".to_string(), cursor_meta(cursor))
	}
}

fn wrap_data(data: Value) -> Map<String, Value> {
	let mut envelope = Map::new();
	envelope.insert("data".to_string(), data);
	envelope
}

fn wrap_meta(meta: &Map<String, Value>) -> Map<String, Value> {
	let mut envelope = Map::new();
	if !meta.is_empty() {
		envelope.insert("meta".to_string(), Value::Object(meta.clone()));
	}
	envelope
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SimpleCursor;
	use rstest::rstest;

	struct FixedPaginator {
		current: u64,
		last: u64,
	}

	impl Paginator for FixedPaginator {
		fn current_page(&self) -> u64 {
			self.current
		}

		fn last_page(&self) -> u64 {
			self.last
		}

		fn total(&self) -> u64 {
			self.last * 10
		}

		fn count(&self) -> u64 {
			10
		}

		fn per_page(&self) -> u64 {
			10
		}

		fn url(&self, page: u64) -> String {
			format!("http://example.com/books?page={}", page)
		}
	}

	#[rstest]
	#[case(1, 1, json!({}))]
	#[case(1, 3, json!({"next": "http://example.com/books?page=2"}))]
	#[case(3, 3, json!({"previous": "http://example.com/books?page=2"}))]
	#[case(2, 3, json!({
		"previous": "http://example.com/books?page=1",
		"next": "http://example.com/books?page=3",
	}))]
	fn test_pagination_links(#[case] current: u64, #[case] last: u64, #[case] expected: Value) {
		// Arrange
		let paginator = FixedPaginator { current, last };

		// Act
		let (key, value) = DataArraySerializer.paginator(&paginator);

		// Assert
		assert_eq!(key, "pagination");
		assert_eq!(value["links"], expected);
		assert_eq!(value["current_page"], json!(current));
		assert_eq!(value["total_pages"], json!(last));
	}

	#[rstest]
	fn test_cursor_meta() {
		let cursor = SimpleCursor::new(10, Some(5), Some(15), 5);

		let (key, value) = ArraySerializer.cursor(&cursor);

		assert_eq!(key, "cursor");
		assert_eq!(value, json!({"current": 10, "prev": 5, "next": 15, "count": 5}));
	}

	#[rstest]
	fn test_array_serializer_collection_key_fallback() {
		// Arrange
		let data = vec![json!({"a": 1}).as_object().cloned().unwrap()];

		// Act
		let keyed = ArraySerializer.collection(Some("books"), data.clone()).unwrap();
		let unkeyed = ArraySerializer.collection(None, data).unwrap();

		// Assert
		assert_eq!(Value::Object(keyed), json!({"books": [{"a": 1}]}));
		assert_eq!(Value::Object(unkeyed), json!({"data": [{"a": 1}]}));
	}

	#[rstest]
	fn test_null_envelopes() {
		assert_eq!(ArraySerializer.null().map(Value::Object), Some(json!({})));
		assert_eq!(
			DataArraySerializer.null().map(Value::Object),
			Some(json!({"data": []}))
		);
	}

	#[rstest]
	fn test_empty_meta_renders_nothing() {
		assert!(DataArraySerializer.meta(&Map::new()).is_empty());
	}

	#[rstest]
	fn test_merge_includes_overwrites_keys() {
		// Arrange
		let transformed = json!({"title": "Foo", "author": "raw"})
			.as_object()
			.cloned()
			.unwrap();
		let included = json!({"author": {"data": {"name": "Dave"}}})
			.as_object()
			.cloned()
			.unwrap();

		// Act
		let merged = DataArraySerializer.merge_includes(transformed, &included);

		// Assert
		assert_eq!(
			Value::Object(merged),
			json!({"title": "Foo", "author": {"data": {"name": "Dave"}}})
		);
	}
}
