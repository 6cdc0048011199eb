//! Wire format integration tests
//!
//! Resolves the same catalogue through each serializer.

use prism_core::{
	Collection, Error, IncludeTransformer, Item, Manager, NullResource, Paginator, Transformer,
};
use prism_serializers::{EmberSerializer, HalSerializer, JsonApiSerializer};
use rstest::*;
use serde_json::{Value, json};

struct TwoPages {
	current_page: u64,
}

impl Paginator for TwoPages {
	fn current_page(&self) -> u64 {
		self.current_page
	}

	fn last_page(&self) -> u64 {
		2
	}

	fn total(&self) -> u64 {
		3
	}

	fn count(&self) -> u64 {
		if self.current_page == 1 { 2 } else { 1 }
	}

	fn per_page(&self) -> u64 {
		2
	}

	fn url(&self, page: u64) -> String {
		format!("http://example.com/books?page={}", page)
	}
}

fn author_transformer() -> IncludeTransformer<Value> {
	IncludeTransformer::new(|author: &Value| Ok(json!({"id": author["id"], "name": author["name"]})))
		.available("profile", |author: &Value, _params, _scope| {
			let profile = &author["profile"];
			if profile.is_null() {
				return Ok(None);
			}
			Ok(Some(
				Item::new(profile.clone(), Transformer::identity())
					.with_resource_key("profiles")
					.into(),
			))
		})
}

fn book_transformer() -> IncludeTransformer<Value> {
	IncludeTransformer::new(|book: &Value| {
		Ok(json!({"id": book["id"], "title": book["title"], "year": book["year"]}))
	})
	.available("author", |book: &Value, _params, _scope| {
		Ok(Some(
			Item::new(book["author"].clone(), author_transformer())
				.with_resource_key("people")
				.into(),
		))
	})
	.available("sequels", |book: &Value, _params, _scope| {
		let sequels = book["sequels"].as_array().cloned().unwrap_or_default();
		Ok(Some(
			Collection::new(sequels, Transformer::identity())
				.with_resource_key("books")
				.into(),
		))
	})
}

#[fixture]
fn books() -> Vec<Value> {
	let dave = json!({"id": 9, "name": "Dave", "profile": {"id": 3, "bio": "Writes"}});
	vec![
		json!({
			"id": 1,
			"title": "Foo",
			"year": 1991,
			"author": dave,
			"sequels": [{"id": 2, "title": "Bar"}],
		}),
		json!({
			"id": 2,
			"title": "Bar",
			"year": 1997,
			"author": dave,
			"sequels": [],
		}),
	]
}

#[rstest]
fn test_json_api_compound_document(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(JsonApiSerializer::new());
	manager.parse_includes("author.profile,sequels").unwrap();
	let collection = Collection::new(books, book_transformer()).with_resource_key("books");

	// Act
	let output = manager.create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(
		output["data"][0]["relationships"],
		json!({
			"author": {"data": {"type": "people", "id": "9"}},
			"sequels": {"data": [{"type": "books", "id": "2"}]},
		})
	);
	assert_eq!(
		output["data"][1]["relationships"]["sequels"],
		json!({"data": []})
	);
	assert_eq!(
		output["included"],
		json!([
			{"type": "profiles", "id": "3", "attributes": {"bio": "Writes"}},
			{
				"type": "people",
				"id": "9",
				"attributes": {"name": "Dave"},
				"relationships": {"profile": {"data": {"type": "profiles", "id": "3"}}},
			},
		])
	);
}

#[rstest]
fn test_json_api_links_and_pagination(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(JsonApiSerializer::with_base_url("http://example.com"));
	let collection = Collection::new(books, book_transformer())
		.with_resource_key("books")
		.with_paginator(TwoPages { current_page: 1 });

	// Act
	let output = manager.create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(
		output["links"],
		json!({
			"self": "http://example.com/books?page=1",
			"first": "http://example.com/books?page=1",
			"next": "http://example.com/books?page=2",
			"last": "http://example.com/books?page=2",
		})
	);
	assert!(output["meta"]["pagination"].get("links").is_none());
	assert_eq!(output["meta"]["pagination"]["total"], 3);
	assert_eq!(
		output["data"][0]["links"],
		json!({"self": "http://example.com/books/1"})
	);
	assert_eq!(
		output["data"][0]["relationships"]["author"],
		json!({"links": {
			"self": "http://example.com/books/1/relationships/author",
			"related": "http://example.com/books/1/author",
		}})
	);
}

#[rstest]
fn test_json_api_fieldsets_keep_id(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(JsonApiSerializer::new());
	manager.parse_fieldsets([("books", "title")]).unwrap();
	let item = Item::new(books[0].clone(), book_transformer()).with_resource_key("books");

	// Act
	let output = manager.create_data(item).to_array().unwrap();

	// Assert
	assert_eq!(
		output,
		json!({"data": {"type": "books", "id": "1", "attributes": {"title": "Foo"}}})
	);
}

#[rstest]
fn test_json_api_drops_root_objects_from_included() {
	// Arrange
	let transformer = IncludeTransformer::new(|book: &Value| Ok(json!({"id": book["id"]})))
		.default_include("related", |book: &Value, _params, _scope| {
			let related = book["related"].as_array().cloned().unwrap_or_default();
			Ok(Some(
				Collection::new(related, Transformer::identity())
					.with_resource_key("books")
					.into(),
			))
		});
	let mut manager = Manager::new();
	manager.set_serializer(JsonApiSerializer::new());
	let books = vec![
		json!({"id": 1, "related": [{"id": 2}]}),
		json!({"id": 2, "related": [{"id": 1}, {"id": 3}]}),
	];

	// Act
	let output = manager
		.create_data(Collection::new(books, transformer).with_resource_key("books"))
		.to_array()
		.unwrap();

	// Assert
	assert_eq!(
		output["included"],
		json!([{"type": "books", "id": "3", "attributes": {}}])
	);
}

#[rstest]
fn test_json_api_missing_id_propagates() {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(JsonApiSerializer::new());
	let item = Item::new(json!({"title": "Foo"}), Transformer::identity()).with_resource_key("books");

	// Act
	let result = manager.create_data(item).to_array();

	// Assert
	assert!(matches!(
		result,
		Err(Error::MissingIdentifier { resource_key: Some(key) }) if key == "books"
	));
}

#[rstest]
fn test_json_api_null_resource() {
	let mut manager = Manager::new();
	manager.set_serializer(JsonApiSerializer::new());

	let output = manager
		.create_data(prism_core::NullResource::new())
		.to_array()
		.unwrap();

	assert_eq!(output, json!({"data": null}));
}

#[rstest]
fn test_ember_sideloads_nested_records(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(EmberSerializer);
	manager.parse_includes("author.profile").unwrap();
	let collection = Collection::new(books, book_transformer()).with_resource_key("books");

	// Act
	let output = manager.create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(
		output,
		json!({
			"books": [
				{"id": 1, "title": "Foo", "year": 1991, "author": 9},
				{"id": 2, "title": "Bar", "year": 1997, "author": 9},
			],
			"people": [{"id": 9, "name": "Dave", "profile": 3}],
			"profiles": [{"id": 3, "bio": "Writes"}],
		})
	);
}

#[rstest]
fn test_ember_drops_root_records(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(EmberSerializer);
	manager.parse_includes("sequels").unwrap();
	let collection = Collection::new(books, book_transformer()).with_resource_key("books");

	// Act
	let output = manager.create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(output["books"][0]["sequels"], json!([2]));
	assert_eq!(output["books"][1]["sequels"], json!([]));
	assert_eq!(output["books"].as_array().map(Vec::len), Some(2));
}

#[rstest]
fn test_ember_null_include_meta_is_not_sideloaded() {
	// Arrange
	let transformer = IncludeTransformer::new(|book: &Value| Ok(json!({"id": book["id"]})))
		.available("author", |_book: &Value, _params, _scope| {
			let mut meta = serde_json::Map::new();
			meta.insert("reason".to_string(), json!("deleted"));
			Ok(Some(NullResource::new().with_meta(meta).into()))
		});
	let mut manager = Manager::new();
	manager.set_serializer(EmberSerializer);
	manager.parse_includes("author").unwrap();
	let item = Item::new(json!({"id": 1}), transformer).with_resource_key("books");

	// Act
	let output = manager.create_data(item).to_array().unwrap();

	// Assert
	assert_eq!(output, json!({"books": {"id": 1, "author": null}}));
}

#[rstest]
fn test_hal_embeds_includes(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(HalSerializer::with_base_url("http://example.com"));
	manager.parse_includes("author,sequels").unwrap();
	let item = Item::new(books[0].clone(), book_transformer()).with_resource_key("books");

	// Act
	let output = manager.create_data(item).to_array().unwrap();

	// Assert
	assert_eq!(
		output,
		json!({
			"id": 1,
			"title": "Foo",
			"year": 1991,
			"_embedded": {
				"author": {
					"id": 9,
					"name": "Dave",
					"_links": {"self": {"href": "http://example.com/people/9"}},
				},
				"sequels": [
					{"id": 2, "title": "Bar", "_links": {"self": {"href": "http://example.com/books/2"}}},
				],
			},
			"_links": {"self": {"href": "http://example.com/books/1"}},
		})
	);
}

#[rstest]
fn test_hal_collection_pagination_links(books: Vec<Value>) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(HalSerializer::new());
	let collection = Collection::new(books, Transformer::identity())
		.with_resource_key("books")
		.with_paginator(TwoPages { current_page: 2 });

	// Act
	let output = manager.create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(
		output["_links"],
		json!({
			"self": {"href": "http://example.com/books?page=2"},
			"first": {"href": "http://example.com/books?page=1"},
			"prev": {"href": "http://example.com/books?page=1"},
			"last": {"href": "http://example.com/books?page=2"},
		})
	);
	assert_eq!(output["_embedded"]["books"].as_array().map(Vec::len), Some(2));
	assert_eq!(output["meta"]["pagination"]["count"], 1);
}

#[rstest]
#[case::include_left_out("title", json!({"id": 1, "title": "Foo"}))]
#[case::include_kept("title,author", json!({
	"id": 1,
	"title": "Foo",
	"_embedded": {"author": {"id": 9, "name": "Dave"}},
}))]
fn test_hal_fieldsets_cover_embedded_includes(
	books: Vec<Value>,
	#[case] fields: &str,
	#[case] expected: Value,
) {
	// Arrange
	let mut manager = Manager::new();
	manager.set_serializer(HalSerializer::new());
	manager.parse_includes("author").unwrap();
	manager.parse_fieldsets([("books", fields)]).unwrap();
	let item = Item::new(books[0].clone(), book_transformer()).with_resource_key("books");

	// Act
	let output = manager.create_data(item).to_array().unwrap();

	// Assert
	assert_eq!(output, expected);
}
