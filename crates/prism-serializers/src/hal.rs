//! HAL (Hypertext Application Language) serializer.

use crate::{id_string, navigation_pagination, resource_url, take_pagination_links};
use prism_core::serializer::cursor_meta;
use prism_core::{Cursor, Paginator, Serializer};
use prism_exception::Result;
use serde_json::{Map, Value, json};

const EMBEDDED: &str = "_embedded";
const LINKS: &str = "_links";

/// Serializes resources as HAL documents.
///
/// Includes are nested under `_embedded`. With a base URL, every record
/// that has an `id` gets a `_links.self.href`, and pagination links are
/// rendered as `_links` relations.
///
/// # Examples
///
/// ```
/// use prism_core::{IncludeTransformer, Item, Manager, Transformer};
/// use prism_serializers::HalSerializer;
/// use serde_json::{Value, json};
///
/// let books = IncludeTransformer::new(|book: &Value| Ok(json!({"id": book["id"]})))
///     .default_include("author", |book: &Value, _params, _scope| {
///         let author = Item::new(book["author"].clone(), Transformer::identity())
///             .with_resource_key("authors");
///         Ok(Some(author.into()))
///     });
///
/// let mut manager = Manager::new();
/// manager.set_serializer(HalSerializer::with_base_url("http://example.com"));
///
/// let book = json!({"id": 1, "author": {"id": 9}});
/// let output = manager
///     .create_data(Item::new(book, books).with_resource_key("books"))
///     .to_array()
///     .unwrap();
///
/// assert_eq!(output, json!({
///     "id": 1,
///     "_embedded": {
///         "author": {"id": 9, "_links": {"self": {"href": "http://example.com/authors/9"}}},
///     },
///     "_links": {"self": {"href": "http://example.com/books/1"}},
/// }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HalSerializer {
	base_url: Option<String>,
}

impl HalSerializer {
	/// Create a serializer that renders no self links
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a serializer that renders self links below `base_url`
	pub fn with_base_url(base_url: impl Into<String>) -> Self {
		Self {
			base_url: Some(base_url.into()),
		}
	}

	/// The base URL of rendered links
	pub fn base_url(&self) -> Option<&str> {
		self.base_url.as_deref()
	}

	fn with_self_link(
		&self,
		resource_key: Option<&str>,
		mut record: Map<String, Value>,
	) -> Map<String, Value> {
		let (Some(base_url), Some(resource_key), Some(id)) =
			(self.base_url.as_deref(), resource_key, id_string(record.get("id")))
		else {
			return record;
		};

		let href = resource_url(base_url, &[resource_key, id.as_str()]);
		let links = record
			.entry(LINKS)
			.or_insert_with(|| Value::Object(Map::new()));
		if let Value::Object(links) = links {
			links.insert("self".to_string(), json!({ "href": href }));
		}
		record
	}
}

impl Serializer for HalSerializer {
	fn collection(
		&self,
		resource_key: Option<&str>,
		data: Vec<Map<String, Value>>,
	) -> Result<Map<String, Value>> {
		let records = data
			.into_iter()
			.map(|record| Value::Object(self.with_self_link(resource_key, record)))
			.collect();

		let mut embedded = Map::new();
		embedded.insert(
			resource_key
				.filter(|key| !key.is_empty())
				.unwrap_or("data")
				.to_string(),
			Value::Array(records),
		);

		let mut envelope = Map::new();
		envelope.insert(EMBEDDED.to_string(), Value::Object(embedded));
		Ok(envelope)
	}

	fn item(
		&self,
		resource_key: Option<&str>,
		data: Map<String, Value>,
	) -> Result<Map<String, Value>> {
		Ok(self.with_self_link(resource_key, data))
	}

	fn null(&self) -> Option<Map<String, Value>> {
		None
	}

	fn meta(&self, meta: &Map<String, Value>) -> Map<String, Value> {
		let mut envelope = Map::new();
		if meta.is_empty() {
			return envelope;
		}

		let mut meta = meta.clone();
		if let Some(Value::Object(links)) = take_pagination_links(&mut meta) {
			let links: Map<String, Value> = links
				.into_iter()
				.map(|(rel, href)| (rel, json!({ "href": href })))
				.collect();
			envelope.insert(LINKS.to_string(), Value::Object(links));
		}
		envelope.insert("meta".to_string(), Value::Object(meta));
		envelope
	}

	fn paginator(&self, paginator: &dyn Paginator) -> (String, Value) {
		("pagination".to_string(), navigation_pagination(paginator))
	}

	fn cursor(&self, cursor: &dyn Cursor) -> (String, Value) {
		("cursor".to_string(), cursor_meta(cursor))
	}

	fn merge_includes(
		&self,
		mut transformed: Map<String, Value>,
		included: &Map<String, Value>,
	) -> Map<String, Value> {
		if included.is_empty() {
			return transformed;
		}

		let embedded = transformed
			.entry(EMBEDDED)
			.or_insert_with(|| Value::Object(Map::new()));
		if let Value::Object(embedded) = embedded {
			for (include, value) in included {
				embedded.insert(include.clone(), embedded_value(value));
			}
		}
		transformed
	}

	fn mandatory_fields(&self) -> &[&str] {
		&["id", LINKS, EMBEDDED]
	}
}

// A nested collection renders as `{"_embedded": {key: [...]}}`; below a
// parent only the records are kept.
fn embedded_value(value: &Value) -> Value {
	if let Some(document) = value.as_object()
		&& document
			.keys()
			.all(|key| key == EMBEDDED || key == LINKS || key == "meta")
		&& let Some(Value::Object(embedded)) = document.get(EMBEDDED)
		&& embedded.len() == 1
		&& let Some(records @ Value::Array(_)) = embedded.values().next()
	{
		return records.clone();
	}
	value.clone()
}
