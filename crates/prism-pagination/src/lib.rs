//! # Prism Pagination
//!
//! Adapters that turn in-memory slices into paginated collections.
//!
//! ## Page number pagination
//!
//! [`PageNumberPagination`] slices items into a [`Page`] and
//! [`PageAdapter`] exposes that page to serializers through
//! [`prism_core::Paginator`].
//!
//! ```
//! use prism_core::{Manager, Transformer};
//! use prism_pagination::PageNumberPagination;
//! use serde_json::json;
//!
//! let pagination = PageNumberPagination::new().page_size(2);
//! let books: Vec<_> = (1..=5).map(|id| json!({"id": id})).collect();
//!
//! let collection = pagination.collection(
//!     &books,
//!     Some("2"),
//!     "http://example.com/books?sort=id",
//!     Transformer::identity(),
//! );
//! let output = Manager::new().create_data(collection).to_array().unwrap();
//!
//! assert_eq!(output["data"], json!([{"id": 3}, {"id": 4}]));
//! assert_eq!(output["meta"]["pagination"]["total_pages"], 3);
//! assert_eq!(
//!     output["meta"]["pagination"]["links"]["next"],
//!     "http://example.com/books?page=3&sort=id"
//! );
//! ```
//!
//! ## Cursor pagination
//!
//! [`EncodedCursor`] tracks an offset window and renders its position as
//! tokens produced by a [`CursorEncoder`]. [`Base64CursorEncoder`] signs
//! tokens with HMAC-SHA256 and rejects them once expired.

pub mod cursor;
pub mod page;
pub mod page_number;

pub use cursor::{Base64CursorEncoder, CursorEncoder, EncodedCursor};
pub use page::Page;
pub use page_number::{PageAdapter, PageNumberPagination};
