//! # Prism Core
//!
//! Resolution engine that turns in-memory data into API responses.
//!
//! ## Overview
//!
//! - **Resources** ([`Item`], [`Collection`], [`NullResource`], [`Primitive`])
//!   pair data with a [`Transformer`].
//! - The [`Manager`] holds per-request configuration: requested includes,
//!   excludes, fieldsets and the active [`Serializer`].
//! - A [`Scope`] resolves one resource at one position of the include tree,
//!   spawning child scopes for nested includes.
//!
//! ## Example
//!
//! ```
//! use prism_core::{Collection, IncludeTransformer, Item, Manager, Transformer};
//! use serde_json::json;
//!
//! struct Book { id: u32, title: String, author: String }
//!
//! let books = IncludeTransformer::new(|book: &Book| Ok(json!({"id": book.id, "title": book.title})))
//!     .available("author", |book: &Book, _params, _scope| {
//!         Ok(Some(Item::new(json!({"name": book.author}), Transformer::identity()).into()))
//!     });
//!
//! let mut manager = Manager::new();
//! manager.parse_includes("author").unwrap();
//!
//! let data = vec![Book { id: 1, title: "Hogfather".into(), author: "Pratchett".into() }];
//! let output = manager.create_data(Collection::new(data, books)).to_array().unwrap();
//!
//! assert_eq!(output["data"][0]["author"]["data"]["name"], "Pratchett");
//! ```

pub mod manager;
pub mod pagination;
pub mod param_bag;
pub mod request;
pub mod resource;
pub mod scope;
pub mod serializer;
pub mod settings;
pub mod transformer;

pub use manager::{IncludeInput, Manager};
pub use pagination::{Cursor, Paginator, SimpleCursor};
pub use param_bag::{Fieldset, ParamBag};
pub use request::RequestParams;
pub use resource::{Collection, Item, NullResource, Primitive, PrimitiveFn, Resource};
pub use scope::Scope;
pub use serializer::{ArraySerializer, DataArraySerializer, Serializer};
pub use settings::ManagerSettings;
pub use transformer::{
	IncludeHandler, IncludeTransformer, TransformFn, Transformer, include_method_name,
};

pub use prism_exception::{Error, Result};
