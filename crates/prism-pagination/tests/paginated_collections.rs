//! Paginated collections resolved through a manager

use prism_core::{Manager, Transformer};
use prism_pagination::{Base64CursorEncoder, EncodedCursor, PageNumberPagination};
use rstest::*;
use serde_json::{Value, json};

#[fixture]
fn numbers() -> Vec<Value> {
	(1..=7).map(|id| json!({"id": id})).collect()
}

#[rstest]
#[case::first(Some("1"), json!({"next": "/numbers?page=2&sort=asc"}))]
#[case::middle(Some("2"), json!({
	"previous": "/numbers?page=1&sort=asc",
	"next": "/numbers?page=3&sort=asc",
}))]
#[case::last(Some("last"), json!({"previous": "/numbers?page=2&sort=asc"}))]
fn test_page_links(numbers: Vec<Value>, #[case] page: Option<&str>, #[case] links: Value) {
	// Arrange
	let pagination = PageNumberPagination::new().page_size(3);
	let collection = pagination.collection(
		&numbers,
		page,
		"/numbers?page=9&sort=asc",
		Transformer::identity(),
	);

	// Act
	let output = Manager::new().create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(output["meta"]["pagination"]["links"], links);
	assert_eq!(output["meta"]["pagination"]["total"], 7);
	assert_eq!(output["meta"]["pagination"]["total_pages"], 3);
}

#[rstest]
fn test_last_page_holds_remainder(numbers: Vec<Value>) {
	// Arrange
	let pagination = PageNumberPagination::new().page_size(3);

	// Act
	let collection = pagination.collection(&numbers, Some("3"), "/numbers", Transformer::identity());
	let output = Manager::new().create_data(collection).to_array().unwrap();

	// Assert
	assert_eq!(output["data"], json!([{"id": 7}]));
	assert_eq!(output["meta"]["pagination"]["count"], 1);
	assert_eq!(output["meta"]["pagination"]["current_page"], 3);
}

#[rstest]
fn test_cursor_walks_the_sequence(numbers: Vec<Value>) {
	// Arrange
	let encoder = Base64CursorEncoder::with_secret_key(b"integration-test-secret-key-0001");
	let manager = Manager::new();
	let mut token: Option<String> = None;
	let mut seen = Vec::new();

	// Act
	loop {
		let cursor = EncodedCursor::from_param(&encoder, token.as_deref(), 3, numbers.len()).unwrap();
		let output = manager
			.create_data(cursor.collection(&numbers, Transformer::identity()))
			.to_array()
			.unwrap();
		seen.extend(output["data"].as_array().cloned().unwrap_or_default());

		match output["meta"]["cursor"]["next"].as_str() {
			Some(next) => token = Some(next.to_string()),
			None => break,
		}
	}

	// Assert
	assert_eq!(seen, numbers);
}

#[rstest]
fn test_cursor_meta(numbers: Vec<Value>) {
	// Arrange
	let encoder = Base64CursorEncoder::with_secret_key(b"integration-test-secret-key-0001");
	let cursor = EncodedCursor::new(&encoder, 3, 3, numbers.len()).unwrap();

	// Act
	let output = Manager::new()
		.create_data(cursor.collection(&numbers, Transformer::identity()))
		.to_array()
		.unwrap();

	// Assert
	let meta = &output["meta"]["cursor"];
	assert_eq!(meta["count"], 3);
	assert_eq!(encoder_position(&encoder, &meta["current"]), 3);
	assert_eq!(encoder_position(&encoder, &meta["prev"]), 0);
	assert_eq!(encoder_position(&encoder, &meta["next"]), 6);
}

fn encoder_position(encoder: &Base64CursorEncoder, token: &Value) -> usize {
	use prism_pagination::CursorEncoder;

	encoder.decode(token.as_str().unwrap()).unwrap()
}
