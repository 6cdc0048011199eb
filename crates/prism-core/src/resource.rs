//! Resources pair raw data with the transformer that shapes it.
//!
//! [`Resource`] is a closed set of four kinds. Items and collections accept
//! any `'static` value type; the value type is erased once it is bound to its
//! transformer so that resources of different types can be nested freely.

use crate::pagination::{Cursor, Paginator};
use crate::transformer::Transformer;
use crate::{ParamBag, Scope};
use prism_exception::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Transform function of a primitive resource
pub type PrimitiveFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Values bound to their transformer, with the value type erased.
pub(crate) trait ErasedSource {
	fn len(&self) -> usize;

	fn transformer_name(&self) -> &str;

	fn has_includes(&self) -> bool;

	fn available_includes(&self) -> &[String];

	fn default_includes(&self) -> &[String];

	fn transform(&self, index: usize) -> Result<Map<String, Value>>;

	fn call_include(
		&self,
		index: usize,
		include: &str,
		params: &ParamBag,
		scope: &Scope<'_>,
	) -> Result<Option<Resource>>;
}

struct Bound<T> {
	data: Vec<T>,
	transformer: Transformer<T>,
}

impl<T: 'static> Bound<T> {
	fn element(&self, index: usize) -> Result<&T> {
		self.data.get(index).ok_or_else(|| {
			Error::InvalidArgument(format!(
				"element {} out of range for {} values",
				index,
				self.data.len()
			))
		})
	}
}

impl<T: 'static> ErasedSource for Bound<T> {
	fn len(&self) -> usize {
		self.data.len()
	}

	fn transformer_name(&self) -> &str {
		self.transformer.name()
	}

	fn has_includes(&self) -> bool {
		self.transformer.has_includes()
	}

	fn available_includes(&self) -> &[String] {
		self.transformer
			.includes()
			.map_or(&[][..], |includes| includes.available_includes())
	}

	fn default_includes(&self) -> &[String] {
		self.transformer
			.includes()
			.map_or(&[][..], |includes| includes.default_includes())
	}

	fn transform(&self, index: usize) -> Result<Map<String, Value>> {
		self.transformer.transform(self.element(index)?)
	}

	fn call_include(
		&self,
		index: usize,
		include: &str,
		params: &ParamBag,
		scope: &Scope<'_>,
	) -> Result<Option<Resource>> {
		match self.transformer.includes() {
			Some(includes) => includes.call_include(include, self.element(index)?, params, scope),
			None => Ok(None),
		}
	}
}

// Resource key and meta accessors shared by every resource kind.
macro_rules! resource_attributes {
	($ty:ty) => {
		impl $ty {
			/// Resource key naming the type of this resource
			pub fn resource_key(&self) -> Option<&str> {
				self.resource_key.as_deref()
			}

			/// Set the resource key
			pub fn set_resource_key(&mut self, resource_key: impl Into<String>) -> &mut Self {
				self.resource_key = Some(resource_key.into());
				self
			}

			/// Builder form of [`Self::set_resource_key`]
			pub fn with_resource_key(mut self, resource_key: impl Into<String>) -> Self {
				self.resource_key = Some(resource_key.into());
				self
			}

			/// Meta data attached to this resource
			pub fn meta(&self) -> &Map<String, Value> {
				&self.meta
			}

			/// A single meta value
			pub fn meta_value(&self, key: &str) -> Option<&Value> {
				self.meta.get(key)
			}

			/// Replace the meta data
			pub fn set_meta(&mut self, meta: Map<String, Value>) -> &mut Self {
				self.meta = meta;
				self
			}

			/// Set a single meta value
			pub fn set_meta_value(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
				self.meta.insert(key.into(), value.into());
				self
			}

			/// Builder form of [`Self::set_meta`]
			pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
				self.meta = meta;
				self
			}
		}
	};
}

/// A single value and its transformer.
pub struct Item {
	source: Box<dyn ErasedSource>,
	resource_key: Option<String>,
	meta: Map<String, Value>,
}

impl Item {
	/// Bind a value to a transformer
	///
	/// # Examples
	///
	/// ```
	/// use prism_core::{Item, Transformer};
	/// use serde_json::json;
	///
	/// let item = Item::new(json!({"foo": "bar"}), Transformer::identity())
	///     .with_resource_key("foo");
	/// assert_eq!(item.resource_key(), Some("foo"));
	/// ```
	pub fn new<T: 'static>(data: T, transformer: impl Into<Transformer<T>>) -> Self {
		Self {
			source: Box::new(Bound {
				data: vec![data],
				transformer: transformer.into(),
			}),
			resource_key: None,
			meta: Map::new(),
		}
	}

	/// Name of the bound transformer
	pub fn transformer_name(&self) -> &str {
		self.source.transformer_name()
	}

	pub(crate) fn source(&self) -> &dyn ErasedSource {
		self.source.as_ref()
	}
}

resource_attributes!(Item);

/// An ordered sequence of values sharing one transformer.
///
/// A collection may carry a [`Paginator`] or a [`Cursor`]. When both are
/// set, the cursor drives the pagination meta.
pub struct Collection {
	source: Box<dyn ErasedSource>,
	resource_key: Option<String>,
	meta: Map<String, Value>,
	paginator: Option<Box<dyn Paginator>>,
	cursor: Option<Box<dyn Cursor>>,
}

impl Collection {
	/// Bind a sequence of values to a transformer
	pub fn new<T, I>(data: I, transformer: impl Into<Transformer<T>>) -> Self
	where
		T: 'static,
		I: IntoIterator<Item = T>,
	{
		Self {
			source: Box::new(Bound {
				data: data.into_iter().collect(),
				transformer: transformer.into(),
			}),
			resource_key: None,
			meta: Map::new(),
			paginator: None,
			cursor: None,
		}
	}

	/// Number of values
	pub fn len(&self) -> usize {
		self.source.len()
	}

	/// Whether the collection holds no values
	pub fn is_empty(&self) -> bool {
		self.source.len() == 0
	}

	/// Name of the bound transformer
	pub fn transformer_name(&self) -> &str {
		self.source.transformer_name()
	}

	/// Attach a paginator
	pub fn set_paginator(&mut self, paginator: impl Paginator + 'static) -> &mut Self {
		self.paginator = Some(Box::new(paginator));
		self
	}

	/// Builder form of [`Self::set_paginator`]
	pub fn with_paginator(mut self, paginator: impl Paginator + 'static) -> Self {
		self.set_paginator(paginator);
		self
	}

	/// Attach a cursor
	pub fn set_cursor(&mut self, cursor: impl Cursor + 'static) -> &mut Self {
		self.cursor = Some(Box::new(cursor));
		self
	}

	/// Builder form of [`Self::set_cursor`]
	pub fn with_cursor(mut self, cursor: impl Cursor + 'static) -> Self {
		self.set_cursor(cursor);
		self
	}

	/// The attached paginator
	pub fn paginator(&self) -> Option<&dyn Paginator> {
		self.paginator.as_deref()
	}

	/// The attached cursor
	pub fn cursor(&self) -> Option<&dyn Cursor> {
		self.cursor.as_deref()
	}

	/// Whether a paginator is attached
	pub fn has_paginator(&self) -> bool {
		self.paginator.is_some()
	}

	/// Whether a cursor is attached
	pub fn has_cursor(&self) -> bool {
		self.cursor.is_some()
	}

	pub(crate) fn source(&self) -> &dyn ErasedSource {
		self.source.as_ref()
	}
}

resource_attributes!(Collection);

/// A relation that explicitly resolves to nothing.
#[derive(Debug, Clone, Default)]
pub struct NullResource {
	resource_key: Option<String>,
	meta: Map<String, Value>,
}

impl NullResource {
	/// Create a null resource
	pub fn new() -> Self {
		Self::default()
	}
}

resource_attributes!(NullResource);

/// A bare scalar, transformed without includes or fieldsets.
#[derive(Clone)]
pub struct Primitive {
	value: Value,
	transformer: Option<PrimitiveFn>,
	resource_key: Option<String>,
	meta: Map<String, Value>,
}

impl Primitive {
	/// Wrap a scalar value
	///
	/// # Examples
	///
	/// ```
	/// use prism_core::Primitive;
	/// use serde_json::json;
	///
	/// let primitive = Primitive::new(3).with_transformer(|v| Ok(json!(v.as_i64().unwrap_or(0) * 2)));
	/// assert_eq!(primitive.transform().unwrap(), json!(6));
	/// ```
	pub fn new(value: impl Into<Value>) -> Self {
		Self {
			value: value.into(),
			transformer: None,
			resource_key: None,
			meta: Map::new(),
		}
	}

	/// Set the transform function applied to the value
	pub fn with_transformer<F>(mut self, transformer: F) -> Self
	where
		F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
	{
		self.transformer = Some(Arc::new(transformer));
		self
	}

	/// The wrapped value
	pub fn value(&self) -> &Value {
		&self.value
	}

	/// Apply the transformer, or return the value unchanged when there is none
	pub fn transform(&self) -> Result<Value> {
		match &self.transformer {
			Some(transformer) => transformer(&self.value),
			None => Ok(self.value.clone()),
		}
	}
}

resource_attributes!(Primitive);

/// Every kind of resource a scope can wrap.
#[derive(Debug)]
pub enum Resource {
	/// A single value
	Item(Item),
	/// An ordered sequence of values
	Collection(Collection),
	/// Explicitly nothing
	Null(NullResource),
	/// A bare scalar
	Primitive(Primitive),
}

impl Resource {
	/// Short name of the resource kind, used in error messages
	pub fn kind(&self) -> &'static str {
		match self {
			Resource::Item(_) => "Item",
			Resource::Collection(_) => "Collection",
			Resource::Null(_) => "NullResource",
			Resource::Primitive(_) => "Primitive",
		}
	}

	/// Resource key of the wrapped resource
	pub fn resource_key(&self) -> Option<&str> {
		match self {
			Resource::Item(item) => item.resource_key(),
			Resource::Collection(collection) => collection.resource_key(),
			Resource::Null(null) => null.resource_key(),
			Resource::Primitive(primitive) => primitive.resource_key(),
		}
	}

	/// Meta data of the wrapped resource
	pub fn meta(&self) -> &Map<String, Value> {
		match self {
			Resource::Item(item) => item.meta(),
			Resource::Collection(collection) => collection.meta(),
			Resource::Null(null) => null.meta(),
			Resource::Primitive(primitive) => primitive.meta(),
		}
	}

	/// Set a single meta value on the wrapped resource
	pub fn set_meta_value(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		match self {
			Resource::Item(item) => {
				item.set_meta_value(key, value);
			}
			Resource::Collection(collection) => {
				collection.set_meta_value(key, value);
			}
			Resource::Null(null) => {
				null.set_meta_value(key, value);
			}
			Resource::Primitive(primitive) => {
				primitive.set_meta_value(key, value);
			}
		}
		self
	}

	/// Whether this is a primitive resource
	pub fn is_primitive(&self) -> bool {
		matches!(self, Resource::Primitive(_))
	}
}

impl From<Item> for Resource {
	fn from(item: Item) -> Self {
		Resource::Item(item)
	}
}

impl From<Collection> for Resource {
	fn from(collection: Collection) -> Self {
		Resource::Collection(collection)
	}
}

impl From<NullResource> for Resource {
	fn from(null: NullResource) -> Self {
		Resource::Null(null)
	}
}

impl From<Primitive> for Resource {
	fn from(primitive: Primitive) -> Self {
		Resource::Primitive(primitive)
	}
}

impl fmt::Debug for Item {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Item")
			.field("transformer", &self.source.transformer_name())
			.field("resource_key", &self.resource_key)
			.field("meta", &self.meta)
			.finish()
	}
}

impl fmt::Debug for Collection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Collection")
			.field("transformer", &self.source.transformer_name())
			.field("len", &self.source.len())
			.field("resource_key", &self.resource_key)
			.field("meta", &self.meta)
			.field("has_paginator", &self.paginator.is_some())
			.field("has_cursor", &self.cursor.is_some())
			.finish()
	}
}

impl fmt::Debug for Primitive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Primitive")
			.field("value", &self.value)
			.field("has_transformer", &self.transformer.is_some())
			.field("resource_key", &self.resource_key)
			.field("meta", &self.meta)
			.finish()
	}
}
