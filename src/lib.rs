//! # Prism
//!
//! Response shaping for Rust APIs.
//!
//! Prism sits between your domain data and the JSON you send over the wire.
//! Transformers turn domain values into plain records, includes pull related
//! resources into the response on request, and a serializer decides the
//! final document layout.
//!
//! ## Core Concepts
//!
//! - **Resources**: [`Item`], [`Collection`], [`NullResource`] and
//!   [`Primitive`] wrap data together with the transformer that renders it
//! - **Transformers**: [`Transformer`] for plain functions and
//!   [`IncludeTransformer`] for transformers with available and default
//!   includes
//! - **Manager**: [`Manager`] holds the requested includes, excludes and
//!   fieldsets of one request plus the active serializer
//! - **Scope**: [`Scope`] resolves one resource at one position of the
//!   include tree
//!
//! ## Feature Flags
//!
//! - `minimal` - Core engine with the array serializers
//! - `serializers` - JSON:API, Ember and HAL serializers
//! - `pagination` - Page number and signed cursor pagination adapters
//! - `full` (default) - Everything
//!
//! ## Quick Example
//!
//! ```
//! use prism::prelude::*;
//! use serde_json::{Value, json};
//!
//! let books = IncludeTransformer::new(|book: &Value| {
//!     Ok(json!({"id": book["id"], "title": book["title"]}))
//! })
//! .available("author", |book: &Value, _params, _scope| {
//!     let author = Item::new(book["author"].clone(), Transformer::identity())
//!         .with_resource_key("people");
//!     Ok(Some(author.into()))
//! });
//!
//! let mut manager = Manager::new();
//! manager.parse_includes("author").unwrap();
//!
//! let book = json!({"id": 1, "title": "Foo", "author": {"name": "Dave"}});
//! let output = manager.create_data(Item::new(book, books)).to_array().unwrap();
//!
//! assert_eq!(output, json!({
//!     "data": {"id": 1, "title": "Foo", "author": {"data": {"name": "Dave"}}}
//! }));
//! ```

// Re-export internal crates
pub use prism_core as core;
pub use prism_exception as exception;
#[cfg(feature = "pagination")]
pub use prism_pagination as pagination;
#[cfg(feature = "serializers")]
pub use prism_serializers as serializers;

pub use prism_core::{
	ArraySerializer, Collection, Cursor, DataArraySerializer, Fieldset, IncludeHandler,
	IncludeInput, IncludeTransformer, Item, Manager, ManagerSettings, NullResource, ParamBag,
	Paginator, Primitive, RequestParams, Resource, Scope, Serializer, SimpleCursor, Transformer,
};
pub use prism_exception::{Error, Result};

#[cfg(feature = "serializers")]
pub use prism_serializers::{EmberSerializer, HalSerializer, JsonApiSerializer};

#[cfg(feature = "pagination")]
pub use prism_pagination::{
	Base64CursorEncoder, CursorEncoder, EncodedCursor, Page, PageAdapter, PageNumberPagination,
};

/// Convenient imports for building responses
pub mod prelude {
	pub use crate::{
		ArraySerializer, Collection, DataArraySerializer, Error, IncludeTransformer, Item, Manager,
		NullResource, ParamBag, Primitive, Resource, Result, Scope, Serializer, Transformer,
	};

	#[cfg(feature = "serializers")]
	pub use crate::{EmberSerializer, HalSerializer, JsonApiSerializer};

	#[cfg(feature = "pagination")]
	pub use crate::{Base64CursorEncoder, EncodedCursor, PageNumberPagination};
}
