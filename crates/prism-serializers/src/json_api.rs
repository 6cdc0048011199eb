//! JSON:API document serializer.

use crate::{id_string, navigation_pagination, resource_url, take_pagination_links};
use indexmap::{IndexMap, IndexSet};
use prism_core::serializer::cursor_meta;
use prism_core::{Cursor, Paginator, Resource, Serializer};
use prism_exception::{Error, Result};
use serde_json::{Map, Value, json};
use tracing::trace;

/// Serializes resources as JSON:API documents.
///
/// Items become resource objects `{type, id, attributes}`; the `id` field is
/// mandatory and always rendered as a string. Includes are sideloaded into a
/// top-level `included` array and referenced from `relationships`. When a
/// base URL is set, resource objects and relationships carry `links`.
///
/// # Examples
///
/// ```
/// use prism_core::{IncludeTransformer, Item, Manager, Transformer};
/// use prism_serializers::JsonApiSerializer;
/// use serde_json::{Value, json};
///
/// let books = IncludeTransformer::new(|book: &Value| Ok(json!({"id": book["id"], "title": book["title"]})))
///     .available("author", |book: &Value, _params, _scope| {
///         let author = Item::new(book["author"].clone(), Transformer::identity())
///             .with_resource_key("people");
///         Ok(Some(author.into()))
///     });
///
/// let mut manager = Manager::new();
/// manager.set_serializer(JsonApiSerializer::new());
/// manager.parse_includes("author").unwrap();
///
/// let book = json!({"id": 1, "title": "Foo", "author": {"id": 9, "name": "Dave"}});
/// let output = manager
///     .create_data(Item::new(book, books).with_resource_key("books"))
///     .to_array()
///     .unwrap();
///
/// assert_eq!(output["data"]["relationships"]["author"], json!({"data": {"type": "people", "id": "9"}}));
/// assert_eq!(output["included"][0]["attributes"], json!({"name": "Dave"}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonApiSerializer {
	base_url: Option<String>,
}

impl JsonApiSerializer {
	/// Create a serializer that renders no links
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a serializer that renders links below `base_url`
	pub fn with_base_url(base_url: impl Into<String>) -> Self {
		Self {
			base_url: Some(base_url.into()),
		}
	}

	/// The base URL of rendered links
	pub fn base_url(&self) -> Option<&str> {
		self.base_url.as_deref()
	}

	fn resource_object(
		&self,
		resource_key: Option<&str>,
		mut attributes: Map<String, Value>,
	) -> Result<Map<String, Value>> {
		let id = id_string(attributes.get("id")).ok_or_else(|| Error::MissingIdentifier {
			resource_key: resource_key.map(str::to_string),
		})?;
		attributes.shift_remove("id");
		let custom_links = attributes.shift_remove("links");
		let meta = attributes.shift_remove("meta");

		let mut object = Map::new();
		object.insert(
			"type".to_string(),
			resource_key.map_or(Value::Null, Value::from),
		);
		object.insert("id".to_string(), Value::String(id.clone()));
		object.insert("attributes".to_string(), Value::Object(attributes));
		if let Some(meta) = meta {
			object.insert("meta".to_string(), meta);
		}

		if let Some(base_url) = &self.base_url {
			let mut links = Map::new();
			links.insert(
				"self".to_string(),
				Value::String(resource_url(
					base_url,
					&[resource_key.unwrap_or_default(), id.as_str()],
				)),
			);
			if let Some(Value::Object(custom_links)) = custom_links {
				links.extend(custom_links);
			}
			object.insert("links".to_string(), Value::Object(links));
		}

		Ok(object)
	}

	fn add_relationship_links(&self, base_url: &str, resource: &mut Map<String, Value>, include: &str) {
		let resource_type = key_part(resource.get("type"));
		let id = key_part(resource.get("id"));
		let links = json!({
			"self": resource_url(base_url, &[resource_type.as_str(), id.as_str(), "relationships", include]),
			"related": resource_url(base_url, &[resource_type.as_str(), id.as_str(), include]),
		});

		let Some(relationships) = relationships_mut(resource) else {
			return;
		};
		let relationship = relationships
			.entry(include)
			.or_insert_with(|| Value::Object(Map::new()));
		if let Value::Object(existing) = relationship {
			let mut merged = Map::new();
			merged.insert("links".to_string(), links);
			merged.extend(std::mem::take(existing));
			*existing = merged;
		}
	}
}

impl Serializer for JsonApiSerializer {
	fn collection(
		&self,
		resource_key: Option<&str>,
		data: Vec<Map<String, Value>>,
	) -> Result<Map<String, Value>> {
		let resources = data
			.into_iter()
			.map(|attributes| self.resource_object(resource_key, attributes).map(Value::Object))
			.collect::<Result<Vec<_>>>()?;

		let mut envelope = Map::new();
		envelope.insert("data".to_string(), Value::Array(resources));
		Ok(envelope)
	}

	fn item(
		&self,
		resource_key: Option<&str>,
		data: Map<String, Value>,
	) -> Result<Map<String, Value>> {
		let mut envelope = Map::new();
		envelope.insert(
			"data".to_string(),
			Value::Object(self.resource_object(resource_key, data)?),
		);
		Ok(envelope)
	}

	fn null(&self) -> Option<Map<String, Value>> {
		let mut envelope = Map::new();
		envelope.insert("data".to_string(), Value::Null);
		Some(envelope)
	}

	fn meta(&self, meta: &Map<String, Value>) -> Map<String, Value> {
		let mut envelope = Map::new();
		if meta.is_empty() {
			return envelope;
		}

		let mut meta = meta.clone();
		let links = take_pagination_links(&mut meta);
		envelope.insert("meta".to_string(), Value::Object(meta));
		if let Some(links) = links {
			envelope.insert("links".to_string(), links);
		}
		envelope
	}

	fn paginator(&self, paginator: &dyn Paginator) -> (String, Value) {
		("pagination".to_string(), navigation_pagination(paginator))
	}

	fn cursor(&self, cursor: &dyn Cursor) -> (String, Value) {
		("cursor".to_string(), cursor_meta(cursor))
	}

	fn included_data(
		&self,
		_resource: &Resource,
		included: &[Map<String, Value>],
	) -> Result<Map<String, Value>> {
		let mut collected = IncludedObjects::default();

		// Objects sideloaded by nested scopes come first.
		for output in included.iter().flat_map(Map::values) {
			if let Some(Value::Array(nested)) = output.get("included") {
				nested.iter().for_each(|object| collected.push(object));
			}
		}

		for output in included.iter().flat_map(Map::values) {
			match output.get("data") {
				Some(Value::Array(objects)) => objects.iter().for_each(|object| collected.push(object)),
				Some(object @ Value::Object(_)) => collected.push(object),
				_ => {}
			}
		}

		let mut envelope = Map::new();
		if !collected.objects.is_empty() {
			envelope.insert("included".to_string(), Value::Array(collected.objects));
		}
		Ok(envelope)
	}

	fn inject_data(
		&self,
		mut data: Map<String, Value>,
		included: &[Map<String, Value>],
	) -> Result<Map<String, Value>> {
		let relationships = parse_relationships(included);
		if relationships.is_empty() {
			return Ok(data);
		}

		match data.get_mut("data") {
			Some(Value::Array(resources)) => {
				for (include, per_element) in &relationships {
					for (index, relationship) in per_element {
						if let Some(Value::Object(resource)) = resources.get_mut(*index)
							&& let Some(target) = relationships_mut(resource)
						{
							target.insert(include.clone(), relationship.clone());
						}
					}
				}
			}
			Some(Value::Object(resource)) => {
				for (include, per_element) in &relationships {
					if let Some(relationship) = per_element.get(&0)
						&& let Some(target) = relationships_mut(resource)
					{
						target.insert(include.clone(), relationship.clone());
					}
				}
			}
			_ => {}
		}

		Ok(data)
	}

	fn inject_available_include_data(
		&self,
		mut data: Map<String, Value>,
		available_includes: &[String],
	) -> Map<String, Value> {
		let Some(base_url) = self.base_url.as_deref() else {
			return data;
		};

		match data.get_mut("data") {
			Some(Value::Array(resources)) => {
				for resource in resources.iter_mut().filter_map(Value::as_object_mut) {
					for include in available_includes {
						self.add_relationship_links(base_url, resource, include);
					}
				}
			}
			Some(Value::Object(resource)) => {
				for include in available_includes {
					self.add_relationship_links(base_url, resource, include);
				}
			}
			_ => {}
		}
		data
	}

	fn filter_includes(
		&self,
		mut included: Map<String, Value>,
		data: &Map<String, Value>,
	) -> Map<String, Value> {
		let Some(Value::Array(objects)) = included.get_mut("included") else {
			return included;
		};

		let roots: IndexSet<String> = match data.get("data") {
			Some(Value::Array(resources)) => resources.iter().map(object_key).collect(),
			Some(resource @ Value::Object(_)) => IndexSet::from([object_key(resource)]),
			_ => IndexSet::new(),
		};

		let before = objects.len();
		objects.retain(|object| !roots.contains(&object_key(object)));
		trace!(
			dropped = before - objects.len(),
			"removed root objects from included"
		);

		included
	}

	fn sideload_includes(&self) -> bool {
		true
	}

	fn mandatory_fields(&self) -> &[&str] {
		&["id"]
	}
}

#[derive(Default)]
struct IncludedObjects {
	objects: Vec<Value>,
	seen: IndexSet<String>,
}

impl IncludedObjects {
	fn push(&mut self, object: &Value) {
		if self.seen.insert(object_key(object)) {
			self.objects.push(object.clone());
		}
	}
}

// Relationship stubs per include name, keyed by element index.
fn parse_relationships(included: &[Map<String, Value>]) -> IndexMap<String, IndexMap<usize, Value>> {
	let mut relationships: IndexMap<String, IndexMap<usize, Value>> = IndexMap::new();

	for (index, element) in included.iter().enumerate() {
		for (include, output) in element {
			if let Some(relationship) = relationship_stub(output) {
				relationships
					.entry(include.clone())
					.or_default()
					.insert(index, relationship);
			}
		}
	}

	if let Some(first) = included.first() {
		for (include, output) in first {
			if let Some(meta) = output.get("meta")
				&& let Some(Value::Object(relationship)) = relationships
					.get_mut(include)
					.and_then(|per_element| per_element.get_mut(&0))
			{
				relationship.insert("meta".to_string(), meta.clone());
			}
		}
	}

	relationships
}

fn relationship_stub(output: &Value) -> Option<Value> {
	match output.as_object()?.get("data")? {
		Value::Null => Some(json!({"data": null})),
		Value::Array(objects) => Some(json!({
			"data": objects.iter().map(resource_identifier).collect::<Vec<_>>(),
		})),
		object @ Value::Object(_) => Some(json!({"data": resource_identifier(object)})),
		_ => None,
	}
}

fn resource_identifier(object: &Value) -> Value {
	json!({
		"type": object.get("type").cloned().unwrap_or(Value::Null),
		"id": object.get("id").cloned().unwrap_or(Value::Null),
	})
}

fn relationships_mut(resource: &mut Map<String, Value>) -> Option<&mut Map<String, Value>> {
	resource
		.entry("relationships")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
}

fn object_key(object: &Value) -> String {
	format!("{}:{}", key_part(object.get("type")), key_part(object.get("id")))
}

fn key_part(value: Option<&Value>) -> String {
	match value {
		Some(Value::String(part)) => part.clone(),
		Some(Value::Null) | None => String::new(),
		Some(other) => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn map(value: Value) -> Map<String, Value> {
		value.as_object().cloned().unwrap()
	}

	#[rstest]
	fn test_item_lifts_id_links_and_meta() {
		// Arrange
		let serializer = JsonApiSerializer::with_base_url("http://example.com");
		let data = map(json!({
			"id": 1,
			"title": "Foo",
			"links": {"custom": "http://example.com/custom"},
			"meta": {"rating": 5},
		}));

		// Act
		let envelope = serializer.item(Some("books"), data).unwrap();

		// Assert
		assert_eq!(
			Value::Object(envelope),
			json!({"data": {
				"type": "books",
				"id": "1",
				"attributes": {"title": "Foo"},
				"meta": {"rating": 5},
				"links": {
					"self": "http://example.com/books/1",
					"custom": "http://example.com/custom",
				},
			}})
		);
	}

	#[rstest]
	fn test_item_without_attributes_renders_empty_object() {
		let envelope = JsonApiSerializer::new()
			.item(Some("books"), map(json!({"id": "abc"})))
			.unwrap();

		assert_eq!(
			Value::Object(envelope),
			json!({"data": {"type": "books", "id": "abc", "attributes": {}}})
		);
	}

	#[rstest]
	#[case(json!({"title": "Foo"}))]
	#[case(json!({"id": null, "title": "Foo"}))]
	fn test_missing_id_is_an_error(#[case] data: Value) {
		// Act
		let result = JsonApiSerializer::new().collection(Some("books"), vec![map(data)]);

		// Assert
		match result {
			Err(Error::MissingIdentifier { resource_key }) => {
				assert_eq!(resource_key.as_deref(), Some("books"));
			}
			other => panic!("Expected MissingIdentifier, got {:?}", other),
		}
	}

	#[rstest]
	fn test_included_data_dedups_and_pulls_nested() {
		// Arrange
		let included = vec![
			map(json!({
				"author": {
					"data": {"type": "people", "id": "9"},
					"included": [{"type": "profiles", "id": "3"}],
				},
				"editor": {"data": null},
			})),
			map(json!({
				"author": {"data": {"type": "people", "id": "9"}},
				"tags": {"data": []},
			})),
			map(json!({
				"author": {"data": {"type": "people", "id": "10"}},
			})),
		];
		let resource = prism_core::NullResource::new().into();

		// Act
		let envelope = JsonApiSerializer::new()
			.included_data(&resource, &included)
			.unwrap();

		// Assert
		assert_eq!(
			Value::Object(envelope),
			json!({"included": [
				{"type": "profiles", "id": "3"},
				{"type": "people", "id": "9"},
				{"type": "people", "id": "10"},
			]})
		);
	}

	#[rstest]
	fn test_included_data_is_empty_without_objects() {
		let resource = prism_core::NullResource::new().into();

		let envelope = JsonApiSerializer::new()
			.included_data(&resource, &[map(json!({"author": {"data": null}}))])
			.unwrap();

		assert!(envelope.is_empty());
	}

	#[rstest]
	fn test_inject_data_builds_relationship_stubs() {
		// Arrange
		let data = map(json!({"data": [
			{"type": "books", "id": "1", "attributes": {}},
			{"type": "books", "id": "2", "attributes": {}},
		]}));
		let included = vec![
			map(json!({
				"author": {"data": {"type": "people", "id": "9"}, "meta": {"primary": true}},
				"tags": {"data": [{"type": "tags", "id": "a"}, {"type": "tags", "id": "b"}]},
			})),
			map(json!({
				"author": {"data": null},
				"tags": {"data": []},
			})),
		];

		// Act
		let envelope = JsonApiSerializer::new().inject_data(data, &included).unwrap();

		// Assert
		assert_eq!(
			envelope["data"][0]["relationships"],
			json!({
				"author": {"data": {"type": "people", "id": "9"}, "meta": {"primary": true}},
				"tags": {"data": [{"type": "tags", "id": "a"}, {"type": "tags", "id": "b"}]},
			})
		);
		assert_eq!(
			envelope["data"][1]["relationships"],
			json!({"author": {"data": null}, "tags": {"data": []}})
		);
	}

	#[rstest]
	fn test_filter_includes_drops_root_objects() {
		// Arrange
		let included = map(json!({"included": [
			{"type": "books", "id": "1"},
			{"type": "people", "id": "1"},
		]}));
		let data = map(json!({"data": [{"type": "books", "id": "1"}]}));

		// Act
		let filtered = JsonApiSerializer::new().filter_includes(included, &data);

		// Assert
		assert_eq!(
			Value::Object(filtered),
			json!({"included": [{"type": "people", "id": "1"}]})
		);
	}

	#[rstest]
	fn test_meta_moves_pagination_links_to_top_level() {
		// Arrange
		let meta = map(json!({
			"pagination": {"total": 10, "links": {"self": "/books?page=1"}},
			"version": 1,
		}));

		// Act
		let envelope = JsonApiSerializer::new().meta(&meta);

		// Assert
		assert_eq!(
			Value::Object(envelope),
			json!({
				"meta": {"pagination": {"total": 10}, "version": 1},
				"links": {"self": "/books?page=1"},
			})
		);
	}

	#[rstest]
	fn test_available_include_links_merge_with_relationship() {
		// Arrange
		let serializer = JsonApiSerializer::with_base_url("http://example.com");
		let data = map(json!({"data": {
			"type": "books",
			"id": "1",
			"relationships": {"author": {"data": {"type": "people", "id": "9"}}},
		}}));

		// Act
		let envelope =
			serializer.inject_available_include_data(data, &["author".to_string(), "tags".to_string()]);

		// Assert
		assert_eq!(
			envelope["data"]["relationships"],
			json!({
				"author": {
					"links": {
						"self": "http://example.com/books/1/relationships/author",
						"related": "http://example.com/books/1/author",
					},
					"data": {"type": "people", "id": "9"},
				},
				"tags": {
					"links": {
						"self": "http://example.com/books/1/relationships/tags",
						"related": "http://example.com/books/1/tags",
					},
				},
			})
		);
	}

	#[rstest]
	fn test_available_include_links_need_base_url() {
		let data = map(json!({"data": {"type": "books", "id": "1"}}));

		let envelope = JsonApiSerializer::new().inject_available_include_data(data.clone(), &["author".to_string()]);

		assert_eq!(envelope, data);
	}

	#[rstest]
	fn test_null_is_data_null() {
		assert_eq!(
			JsonApiSerializer::new().null().map(Value::Object),
			Some(json!({"data": null}))
		);
	}
}
