//! Ember Data style payload serializer.
//!
//! Records are keyed by their resource type. Related records are sideloaded
//! into top-level arrays keyed by their own type, and the parent record
//! refers to them by id.

use indexmap::IndexSet;
use prism_core::serializer::{cursor_meta, pagination_meta};
use prism_core::{Cursor, Paginator, Resource, Serializer};
use prism_exception::Result;
use serde_json::{Map, Value};
use tracing::trace;

const DEFAULT_KEY: &str = "data";
const META: &str = "meta";

/// Serializes resources as Ember Data payloads.
///
/// # Examples
///
/// ```
/// use prism_core::{Collection, IncludeTransformer, Item, Manager, Transformer};
/// use prism_serializers::EmberSerializer;
/// use serde_json::{Value, json};
///
/// let books = IncludeTransformer::new(|book: &Value| Ok(json!({"id": book["id"], "title": book["title"]})))
///     .available("author", |book: &Value, _params, _scope| {
///         let author = Item::new(book["author"].clone(), Transformer::identity())
///             .with_resource_key("authors");
///         Ok(Some(author.into()))
///     });
///
/// let mut manager = Manager::new();
/// manager.set_serializer(EmberSerializer);
/// manager.parse_includes("author").unwrap();
///
/// let data = vec![
///     json!({"id": 1, "title": "Foo", "author": {"id": 9, "name": "Dave"}}),
///     json!({"id": 2, "title": "Bar", "author": {"id": 9, "name": "Dave"}}),
/// ];
/// let output = manager
///     .create_data(Collection::new(data, books).with_resource_key("books"))
///     .to_array()
///     .unwrap();
///
/// assert_eq!(output, json!({
///     "books": [
///         {"id": 1, "title": "Foo", "author": 9},
///         {"id": 2, "title": "Bar", "author": 9},
///     ],
///     "authors": [{"id": 9, "name": "Dave"}],
/// }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EmberSerializer;

impl Serializer for EmberSerializer {
	fn collection(
		&self,
		resource_key: Option<&str>,
		data: Vec<Map<String, Value>>,
	) -> Result<Map<String, Value>> {
		let mut envelope = Map::new();
		envelope.insert(
			envelope_key(resource_key),
			Value::Array(data.into_iter().map(Value::Object).collect()),
		);
		Ok(envelope)
	}

	fn item(
		&self,
		resource_key: Option<&str>,
		data: Map<String, Value>,
	) -> Result<Map<String, Value>> {
		let mut envelope = Map::new();
		envelope.insert(envelope_key(resource_key), Value::Object(data));
		Ok(envelope)
	}

	fn null(&self) -> Option<Map<String, Value>> {
		Some(Map::new())
	}

	fn meta(&self, meta: &Map<String, Value>) -> Map<String, Value> {
		let mut envelope = Map::new();
		if !meta.is_empty() {
			envelope.insert(META.to_string(), Value::Object(meta.clone()));
		}
		envelope
	}

	fn paginator(&self, paginator: &dyn Paginator) -> (String, Value) {
		("pagination".to_string(), pagination_meta(paginator))
	}

	fn cursor(&self, cursor: &dyn Cursor) -> (String, Value) {
		("cursor".to_string(), cursor_meta(cursor))
	}

	fn included_data(
		&self,
		_resource: &Resource,
		included: &[Map<String, Value>],
	) -> Result<Map<String, Value>> {
		let mut sideloaded = Sideloaded::default();

		for output in included.iter().flat_map(Map::values) {
			let Some(output) = output.as_object() else {
				continue;
			};
			for (index, (key, value)) in output.iter().enumerate() {
				if key == META {
					continue;
				}
				match value {
					// The first entry holds the related records themselves.
					Value::Object(_) if index == 0 => sideloaded.push(key, value),
					Value::Array(records) => {
						records.iter().for_each(|record| sideloaded.push(key, record))
					}
					_ => {}
				}
			}
		}

		Ok(sideloaded.into_map())
	}

	fn inject_data(
		&self,
		mut data: Map<String, Value>,
		included: &[Map<String, Value>],
	) -> Result<Map<String, Value>> {
		let Some(records) = data.values_mut().next() else {
			return Ok(data);
		};

		match records {
			Value::Array(records) => {
				for (record, element) in records.iter_mut().zip(included) {
					if let Value::Object(record) = record {
						replace_relations(record, element);
					}
				}
			}
			Value::Object(record) => {
				if let Some(element) = included.first() {
					replace_relations(record, element);
				}
			}
			_ => {}
		}

		Ok(data)
	}

	fn filter_includes(
		&self,
		mut included: Map<String, Value>,
		data: &Map<String, Value>,
	) -> Map<String, Value> {
		let Some((root_key, root)) = data.iter().next() else {
			return included;
		};
		let root_ids: IndexSet<String> = match root {
			Value::Array(records) => records.iter().filter_map(record_id).collect(),
			record => record_id(record).into_iter().collect(),
		};

		if let Some(Value::Array(records)) = included.get_mut(root_key.as_str()) {
			let before = records.len();
			records.retain(|record| record_id(record).is_none_or(|id| !root_ids.contains(&id)));
			trace!(
				dropped = before - records.len(),
				resource_key = root_key.as_str(),
				"removed root records from sideloaded data"
			);
		}

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
struct Sideloaded {
	records: Map<String, Value>,
	seen: IndexSet<(String, String)>,
}

impl Sideloaded {
	fn push(&mut self, key: &str, record: &Value) {
		if let Some(id) = record_id(record)
			&& !self.seen.insert((key.to_string(), id))
		{
			return;
		}
		if let Value::Array(records) = self
			.records
			.entry(key)
			.or_insert_with(|| Value::Array(Vec::new()))
		{
			records.push(record.clone());
		}
	}

	fn into_map(self) -> Map<String, Value> {
		self.records
	}
}

// Replaces each included relation of a record by the id(s) it points to.
fn replace_relations(record: &mut Map<String, Value>, element: &Map<String, Value>) {
	for (include, output) in element {
		let Some(output) = output.as_object() else {
			continue;
		};
		let related = output
			.iter()
			.find(|(key, _)| key.as_str() != META)
			.map(|(_, value)| value);
		let reference = match related {
			Some(Value::Array(records)) => Value::Array(
				records
					.iter()
					.map(|record| record.get("id").cloned().unwrap_or(Value::Null))
					.collect(),
			),
			Some(related @ Value::Object(_)) => related.get("id").cloned().unwrap_or(Value::Null),
			_ => Value::Null,
		};
		record.insert(include.clone(), reference);
	}
}

fn record_id(record: &Value) -> Option<String> {
	crate::id_string(record.get("id"))
}

fn envelope_key(resource_key: Option<&str>) -> String {
	resource_key
		.filter(|key| !key.is_empty())
		.unwrap_or(DEFAULT_KEY)
		.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use prism_core::NullResource;
	use rstest::rstest;
	use serde_json::json;

	fn map(value: Value) -> Map<String, Value> {
		value.as_object().cloned().unwrap()
	}

	#[rstest]
	fn test_envelopes_are_keyed_by_resource_key() {
		// Act
		let item = EmberSerializer.item(Some("book"), map(json!({"id": 1}))).unwrap();
		let collection = EmberSerializer.collection(None, vec![map(json!({"id": 1}))]).unwrap();

		// Assert
		assert_eq!(Value::Object(item), json!({"book": {"id": 1}}));
		assert_eq!(Value::Object(collection), json!({"data": [{"id": 1}]}));
	}

	#[rstest]
	fn test_included_data_groups_by_type_and_dedups_by_id() {
		// Arrange
		let included = vec![
			map(json!({
				"author": {"authors": {"id": 9, "name": "Dave"}, "profiles": [{"id": 3}]},
				"tags": {"tags": [{"id": "a"}, {"name": "untitled"}]},
			})),
			map(json!({
				"author": {"authors": {"id": 9, "name": "Dave"}},
				"tags": {"tags": [{"id": "a"}, {"name": "untitled"}]},
			})),
		];
		let resource = NullResource::new().into();

		// Act
		let sideloaded = EmberSerializer.included_data(&resource, &included).unwrap();

		// Assert
		assert_eq!(
			Value::Object(sideloaded),
			json!({
				"authors": [{"id": 9, "name": "Dave"}],
				"profiles": [{"id": 3}],
				"tags": [{"id": "a"}, {"name": "untitled"}, {"name": "untitled"}],
			})
		);
	}

	#[rstest]
	fn test_inject_data_replaces_relations_with_ids() {
		// Arrange
		let data = map(json!({"books": [{"id": 1}, {"id": 2}]}));
		let included = vec![
			map(json!({"author": {"authors": {"id": 9}}, "tags": {"tags": [{"id": "a"}, {"id": "b"}]}})),
			map(json!({"author": {}})),
		];

		// Act
		let injected = EmberSerializer.inject_data(data, &included).unwrap();

		// Assert
		assert_eq!(
			Value::Object(injected),
			json!({"books": [
				{"id": 1, "author": 9, "tags": ["a", "b"]},
				{"id": 2, "author": null},
			]})
		);
	}

	#[rstest]
	fn test_filter_includes_drops_root_records() {
		// Arrange
		let included = map(json!({
			"books": [{"id": 1}, {"id": 5}],
			"authors": [{"id": 1}],
		}));
		let data = map(json!({"books": [{"id": 1}, {"id": 2}]}));

		// Act
		let filtered = EmberSerializer.filter_includes(included, &data);

		// Assert
		assert_eq!(
			Value::Object(filtered),
			json!({"books": [{"id": 5}], "authors": [{"id": 1}]})
		);
	}
}
