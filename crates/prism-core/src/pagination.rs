//! Pagination contracts consumed by collection resources.
//!
//! A [`Collection`](crate::Collection) can carry a [`Paginator`] or a
//! [`Cursor`]; the active serializer turns whichever is present into one meta
//! entry. Adapters for concrete paginators live outside the core.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page-number based pagination state of a collection.
///
/// # Examples
///
/// ```
/// use prism_core::Paginator;
///
/// struct Fixed;
///
/// impl Paginator for Fixed {
///     fn current_page(&self) -> u64 { 2 }
///     fn last_page(&self) -> u64 { 20 }
///     fn total(&self) -> u64 { 100 }
///     fn count(&self) -> u64 { 5 }
///     fn per_page(&self) -> u64 { 5 }
///     fn url(&self, page: u64) -> String { format!("/books?page={}", page) }
/// }
///
/// assert_eq!(Fixed.url(3), "/books?page=3");
/// ```
pub trait Paginator {
	/// Current page number (1-indexed)
	fn current_page(&self) -> u64;

	/// Last page number
	fn last_page(&self) -> u64;

	/// Total number of items across all pages
	fn total(&self) -> u64;

	/// Number of items on the current page
	fn count(&self) -> u64;

	/// Items per page
	fn per_page(&self) -> u64;

	/// URL of the given page
	fn url(&self, page: u64) -> String;
}

/// Cursor based pagination state of a collection.
pub trait Cursor {
	/// Cursor of the current page
	fn current(&self) -> Value;

	/// Cursor of the previous page, `Value::Null` when there is none
	fn prev(&self) -> Value;

	/// Cursor of the next page, `Value::Null` when there is none
	fn next(&self) -> Value;

	/// Number of items on the current page
	fn count(&self) -> u64;
}

/// Plain [`Cursor`] data holder.
///
/// # Examples
///
/// ```
/// use prism_core::{Cursor, SimpleCursor};
///
/// let cursor = SimpleCursor::new(10, Some(5), Some(15), 5);
/// assert_eq!(cursor.current(), serde_json::json!(10));
/// assert_eq!(cursor.count(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleCursor {
	/// Current cursor value
	pub current: Value,
	/// Previous cursor value
	pub prev: Value,
	/// Next cursor value
	pub next: Value,
	/// Items on this page
	pub count: u64,
}

impl SimpleCursor {
	/// Create a cursor from its parts
	pub fn new(
		current: impl Into<Value>,
		prev: Option<impl Into<Value>>,
		next: Option<impl Into<Value>>,
		count: u64,
	) -> Self {
		Self {
			current: current.into(),
			prev: prev.map_or(Value::Null, Into::into),
			next: next.map_or(Value::Null, Into::into),
			count,
		}
	}
}

impl Cursor for SimpleCursor {
	fn current(&self) -> Value {
		self.current.clone()
	}

	fn prev(&self) -> Value {
		self.prev.clone()
	}

	fn next(&self) -> Value {
		self.next.clone()
	}

	fn count(&self) -> u64 {
		self.count
	}
}
