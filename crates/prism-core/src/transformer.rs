//! Transformers turn domain values into JSON objects.
//!
//! A [`Transformer`] is either a plain function or an
//! [`IncludeTransformer`] that additionally declares which relations it can
//! resolve. Include handlers are registered by name up front instead of being
//! looked up by reflection; a handler that was declared but never registered
//! is still only reported when the include is actually resolved, and
//! [`IncludeTransformer::validate`] can check the wiring eagerly.

use crate::{ParamBag, Resource, Scope};
use indexmap::IndexMap;
use prism_exception::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Transform function of a transformer
pub type TransformFn<T> = Arc<dyn Fn(&T) -> Result<Value> + Send + Sync>;

/// Handler resolving one include for one element.
///
/// Receives the element, the [`ParamBag`] registered for the include's dotted
/// path and the scope resolving the element. `Ok(None)` means the relation
/// does not apply to this element and the key is omitted from the output.
pub type IncludeHandler<T> =
	Arc<dyn Fn(&T, &ParamBag, &Scope<'_>) -> Result<Option<Resource>> + Send + Sync>;

/// Returns the handler name for an include.
///
/// Words separated by `-`, `_` or spaces are capitalised and joined behind an
/// `include` prefix, so `author-books` and `author_books` both map to
/// `includeAuthorBooks`.
///
/// # Examples
///
/// ```
/// use prism_core::include_method_name;
///
/// assert_eq!(include_method_name("author"), "includeAuthor");
/// assert_eq!(include_method_name("author_books"), "includeAuthorBooks");
/// assert_eq!(include_method_name("author-books"), "includeAuthorBooks");
/// ```
pub fn include_method_name(include: &str) -> String {
	let mut name = String::with_capacity(include.len() + 7);
	name.push_str("include");
	for word in include
		.split(['-', '_', ' '])
		.filter(|word| !word.is_empty())
	{
		let mut chars = word.chars();
		if let Some(first) = chars.next() {
			name.extend(first.to_uppercase());
			name.push_str(chars.as_str());
		}
	}
	name
}

fn default_name<T>() -> String {
	format!("Transformer<{}>", std::any::type_name::<T>())
}

/// How a resource's values are transformed.
pub enum Transformer<T> {
	/// A pure mapping function without includes
	Function {
		/// Name used in error messages
		name: String,
		/// The mapping function
		transform: TransformFn<T>,
	},
	/// A transformer exposing includes
	Includes(Arc<IncludeTransformer<T>>),
}

impl<T: 'static> Transformer<T> {
	/// Create a function transformer
	///
	/// # Examples
	///
	/// ```
	/// use prism_core::Transformer;
	/// use serde_json::json;
	///
	/// let transformer = Transformer::function(|n: &u32| Ok(json!({"value": n})));
	/// let output = transformer.transform(&3).unwrap();
	/// assert_eq!(output["value"], 3);
	/// ```
	pub fn function<F>(transform: F) -> Self
	where
		F: Fn(&T) -> Result<Value> + Send + Sync + 'static,
	{
		Self::Function {
			name: default_name::<T>(),
			transform: Arc::new(transform),
		}
	}

	/// Create a named function transformer
	pub fn named_function<F>(name: impl Into<String>, transform: F) -> Self
	where
		F: Fn(&T) -> Result<Value> + Send + Sync + 'static,
	{
		Self::Function {
			name: name.into(),
			transform: Arc::new(transform),
		}
	}

	/// Name used in error messages
	pub fn name(&self) -> &str {
		match self {
			Self::Function { name, .. } => name,
			Self::Includes(transformer) => transformer.name(),
		}
	}

	/// Transform one value into a JSON object
	pub fn transform(&self, data: &T) -> Result<Map<String, Value>> {
		let value = match self {
			Self::Function { transform, .. } => transform(data)?,
			Self::Includes(transformer) => (transformer.transform)(data)?,
		};
		match value {
			Value::Object(map) => Ok(map),
			other => Err(Error::InvalidTransformOutput {
				transformer: self.name().to_string(),
				found: Error::json_type_name(&other),
			}),
		}
	}

	/// The include declarations, when this transformer has any
	pub fn includes(&self) -> Option<&IncludeTransformer<T>> {
		match self {
			Self::Function { .. } => None,
			Self::Includes(transformer) => Some(transformer),
		}
	}

	/// Whether at least one available or default include is declared
	pub fn has_includes(&self) -> bool {
		self.includes()
			.is_some_and(IncludeTransformer::has_includes)
	}
}

impl<T: Serialize + 'static> Transformer<T> {
	/// Transformer that serializes the value with serde
	///
	/// # Examples
	///
	/// ```
	/// use prism_core::Transformer;
	/// use serde::Serialize;
	///
	/// #[derive(Serialize)]
	/// struct Book { title: String }
	///
	/// let transformer = Transformer::<Book>::serde();
	/// let output = transformer.transform(&Book { title: "Foo".into() }).unwrap();
	/// assert_eq!(output["title"], "Foo");
	/// ```
	pub fn serde() -> Self {
		Self::function(|data: &T| Ok(serde_json::to_value(data)?))
	}
}

impl Transformer<Value> {
	/// Transformer returning its input unchanged
	pub fn identity() -> Self {
		Self::named_function("IdentityTransformer", |data: &Value| Ok(data.clone()))
	}
}

impl<T> Clone for Transformer<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Function { name, transform } => Self::Function {
				name: name.clone(),
				transform: Arc::clone(transform),
			},
			Self::Includes(transformer) => Self::Includes(Arc::clone(transformer)),
		}
	}
}

impl<T> fmt::Debug for Transformer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Function { name, .. } => f.debug_tuple("Function").field(name).finish(),
			Self::Includes(transformer) => f.debug_tuple("Includes").field(transformer).finish(),
		}
	}
}

impl<T> From<IncludeTransformer<T>> for Transformer<T> {
	fn from(transformer: IncludeTransformer<T>) -> Self {
		Self::Includes(Arc::new(transformer))
	}
}

impl<T> From<Arc<IncludeTransformer<T>>> for Transformer<T> {
	fn from(transformer: Arc<IncludeTransformer<T>>) -> Self {
		Self::Includes(transformer)
	}
}

/// Transformer with declared includes and their handlers.
///
/// # Examples
///
/// ```
/// use prism_core::{IncludeTransformer, Item, Manager, Transformer};
/// use serde_json::json;
///
/// struct Book { title: String, author: String }
///
/// let books = IncludeTransformer::new(|book: &Book| Ok(json!({"title": book.title})))
///     .available("author", |book: &Book, _params, _scope| {
///         let author = Item::new(book.author.clone(), Transformer::function(|name: &String| {
///             Ok(json!({"name": name}))
///         }));
///         Ok(Some(author.into()))
///     });
///
/// let mut manager = Manager::new();
/// manager.parse_includes("author").unwrap();
///
/// let book = Book { title: "Foo".into(), author: "Dave".into() };
/// let output = manager.create_data(Item::new(book, books)).to_array().unwrap();
/// assert_eq!(output, json!({"data": {"title": "Foo", "author": {"data": {"name": "Dave"}}}}));
/// ```
pub struct IncludeTransformer<T> {
	name: String,
	transform: TransformFn<T>,
	available_includes: Vec<String>,
	default_includes: Vec<String>,
	handlers: IndexMap<String, IncludeHandler<T>>,
}

impl<T: 'static> IncludeTransformer<T> {
	/// Create a transformer without includes
	pub fn new<F>(transform: F) -> Self
	where
		F: Fn(&T) -> Result<Value> + Send + Sync + 'static,
	{
		Self {
			name: default_name::<T>(),
			transform: Arc::new(transform),
			available_includes: Vec::new(),
			default_includes: Vec::new(),
			handlers: IndexMap::new(),
		}
	}

	/// Set the name used in error messages
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Declare an include that is resolved when requested, with its handler
	pub fn available<H>(self, include: impl Into<String>, handler: H) -> Self
	where
		H: Fn(&T, &ParamBag, &Scope<'_>) -> Result<Option<Resource>> + Send + Sync + 'static,
	{
		let include = include.into();
		self.declare_available(include.clone()).handler(include, handler)
	}

	/// Declare an include that is always resolved, with its handler
	pub fn default_include<H>(self, include: impl Into<String>, handler: H) -> Self
	where
		H: Fn(&T, &ParamBag, &Scope<'_>) -> Result<Option<Resource>> + Send + Sync + 'static,
	{
		let include = include.into();
		self.declare_default(include.clone()).handler(include, handler)
	}

	/// Declare an available include without registering a handler
	pub fn declare_available(mut self, include: impl Into<String>) -> Self {
		push_unique(&mut self.available_includes, include.into());
		self
	}

	/// Declare a default include without registering a handler
	pub fn declare_default(mut self, include: impl Into<String>) -> Self {
		push_unique(&mut self.default_includes, include.into());
		self
	}

	/// Register the handler for an include
	pub fn handler<H>(mut self, include: impl AsRef<str>, handler: H) -> Self
	where
		H: Fn(&T, &ParamBag, &Scope<'_>) -> Result<Option<Resource>> + Send + Sync + 'static,
	{
		self.handlers
			.insert(include_method_name(include.as_ref()), Arc::new(handler));
		self
	}

	/// Check that every declared include has a handler
	///
	/// Resolution reports a missing handler only when the include fires; this
	/// reports it at construction time instead.
	pub fn validate(&self) -> Result<()> {
		for include in self.default_includes.iter().chain(&self.available_includes) {
			if !self.has_handler(include) {
				return Err(self.missing_handler(include));
			}
		}
		Ok(())
	}

	pub(crate) fn call_include(
		&self,
		include: &str,
		data: &T,
		params: &ParamBag,
		scope: &Scope<'_>,
	) -> Result<Option<Resource>> {
		let handler_name = include_method_name(include);
		let handler = self
			.handlers
			.get(&handler_name)
			.ok_or_else(|| self.missing_handler(include))?;

		handler(data, params, scope).map_err(|source| Error::Include {
			transformer: self.name.clone(),
			handler: handler_name,
			source: Box::new(source),
		})
	}

	fn missing_handler(&self, include: &str) -> Error {
		Error::MissingIncludeHandler {
			transformer: self.name.clone(),
			include: include.to_string(),
			handler: include_method_name(include),
		}
	}
}

impl<T> IncludeTransformer<T> {
	/// Name used in error messages
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Includes resolved when requested, in declaration order
	pub fn available_includes(&self) -> &[String] {
		&self.available_includes
	}

	/// Includes always resolved, in declaration order
	pub fn default_includes(&self) -> &[String] {
		&self.default_includes
	}

	/// Replace the available includes
	pub fn set_available_includes<I, S>(&mut self, includes: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.available_includes.clear();
		for include in includes {
			push_unique(&mut self.available_includes, include.into());
		}
		self
	}

	/// Replace the default includes
	pub fn set_default_includes<I, S>(&mut self, includes: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.default_includes.clear();
		for include in includes {
			push_unique(&mut self.default_includes, include.into());
		}
		self
	}

	/// Whether at least one include is declared
	pub fn has_includes(&self) -> bool {
		!self.available_includes.is_empty() || !self.default_includes.is_empty()
	}

	/// Whether a handler is registered for the include
	pub fn has_handler(&self, include: &str) -> bool {
		self.handlers.contains_key(&include_method_name(include))
	}
}

impl<T> fmt::Debug for IncludeTransformer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IncludeTransformer")
			.field("name", &self.name)
			.field("available_includes", &self.available_includes)
			.field("default_includes", &self.default_includes)
			.field("handlers", &self.handlers.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn push_unique(list: &mut Vec<String>, include: String) {
	if !list.contains(&include) {
		list.push(include);
	}
}
