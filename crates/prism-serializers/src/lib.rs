//! # Prism Serializers
//!
//! Wire formats beyond the plain array serializers of `prism-core`.
//!
//! ## Formats
//!
//! - **JsonApiSerializer**: JSON:API documents with sideloaded `included`
//!   resources and relationship stubs
//! - **EmberSerializer**: Ember Data style payloads keyed by resource type,
//!   with related records sideloaded and referenced by id
//! - **HalSerializer**: HAL documents with `_embedded` resources and
//!   `_links`
//!
//! ## Example
//!
//! ```
//! use prism_core::{Item, Manager, Transformer};
//! use prism_serializers::JsonApiSerializer;
//! use serde_json::json;
//!
//! let mut manager = Manager::new();
//! manager.set_serializer(JsonApiSerializer::new());
//!
//! let book = Item::new(json!({"id": 1, "title": "Foo"}), Transformer::identity())
//!     .with_resource_key("books");
//! let output = manager.create_data(book).to_array().unwrap();
//!
//! assert_eq!(output, json!({
//!     "data": {"type": "books", "id": "1", "attributes": {"title": "Foo"}}
//! }));
//! ```

pub mod ember;
pub mod hal;
pub mod json_api;

pub use ember::EmberSerializer;
pub use hal::HalSerializer;
pub use json_api::JsonApiSerializer;

use prism_core::Paginator;
use serde_json::{Map, Value, json};

/// Renders an `id` value as a string; `None` when the value is missing,
/// null or not a scalar.
pub(crate) fn id_string(value: Option<&Value>) -> Option<String> {
	match value? {
		Value::String(id) => Some(id.clone()),
		Value::Number(id) => Some(id.to_string()),
		Value::Bool(id) => Some(id.to_string()),
		Value::Null | Value::Array(_) | Value::Object(_) => None,
	}
}

/// Joins a base URL, a resource key and further path segments.
pub(crate) fn resource_url(base_url: &str, segments: &[&str]) -> String {
	let mut url = base_url.trim_end_matches('/').to_string();
	for segment in segments {
		url.push('/');
		url.push_str(segment);
	}
	url
}

/// Pagination meta with `self`, `first`, `prev`, `next` and `last` links.
pub(crate) fn navigation_pagination(paginator: &dyn Paginator) -> Value {
	let current_page = paginator.current_page();
	let last_page = paginator.last_page();

	let mut links = Map::new();
	links.insert("self".to_string(), Value::String(paginator.url(current_page)));
	links.insert("first".to_string(), Value::String(paginator.url(1)));
	if current_page > 1 {
		links.insert("prev".to_string(), Value::String(paginator.url(current_page - 1)));
	}
	if current_page < last_page {
		links.insert("next".to_string(), Value::String(paginator.url(current_page + 1)));
	}
	links.insert("last".to_string(), Value::String(paginator.url(last_page)));

	json!({
		"total": paginator.total(),
		"count": paginator.count(),
		"per_page": paginator.per_page(),
		"current_page": current_page,
		"total_pages": last_page,
		"links": links,
	})
}

/// Removes `links` from the `pagination` meta entry and returns them.
pub(crate) fn take_pagination_links(meta: &mut Map<String, Value>) -> Option<Value> {
	meta.get_mut("pagination")
		.and_then(Value::as_object_mut)
		.and_then(|pagination| pagination.shift_remove("links"))
}
