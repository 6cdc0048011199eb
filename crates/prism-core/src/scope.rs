//! Scopes resolve one resource at one position of the include tree.
//!
//! A scope transforms its resource, resolves the includes requested at its
//! own dotted path by spawning child scopes, applies fieldsets and finally
//! hands everything to the manager's serializer.

use crate::resource::ErasedSource;
use crate::{Manager, Resource};
use prism_exception::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, trace};

/// Position of one resource in a request's include tree.
///
/// # Examples
///
/// ```
/// use prism_core::{Item, Manager, Transformer};
/// use serde_json::json;
///
/// let manager = Manager::new();
/// let scope = manager.create_data(Item::new(json!({"foo": "bar"}), Transformer::identity()));
///
/// assert!(scope.is_root_scope());
/// assert_eq!(scope.to_json().unwrap(), r#"{"data":{"foo":"bar"}}"#);
/// ```
pub struct Scope<'m> {
	manager: &'m Manager,
	resource: Resource,
	scope_identifier: Option<String>,
	parent_scopes: Vec<String>,
}

type Transformed = (Map<String, Value>, Map<String, Value>);

impl<'m> Scope<'m> {
	pub(crate) fn new(
		manager: &'m Manager,
		resource: Resource,
		scope_identifier: Option<String>,
		parent_scopes: Vec<String>,
	) -> Self {
		Self {
			manager,
			resource,
			scope_identifier,
			parent_scopes,
		}
	}

	/// The manager this scope reads its configuration from
	pub fn manager(&self) -> &'m Manager {
		self.manager
	}

	/// The wrapped resource
	pub fn resource(&self) -> &Resource {
		&self.resource
	}

	/// Include name that produced this scope, `None` for a root scope
	pub fn scope_identifier(&self) -> Option<&str> {
		self.scope_identifier.as_deref()
	}

	/// Identifiers of the ancestor scopes, root first
	pub fn parent_scopes(&self) -> &[String] {
		&self.parent_scopes
	}

	/// Dotted path of this scope
	pub fn identifier(&self) -> String {
		self.path_segments(None).join(".")
	}

	/// Dotted path of an include below this scope
	///
	/// This is the key under which the include's modifier parameters are
	/// registered.
	pub fn identifier_with(&self, include: &str) -> String {
		self.path_segments(Some(include)).join(".")
	}

	/// Whether this scope has no parent
	pub fn is_root_scope(&self) -> bool {
		self.parent_scopes.is_empty()
	}

	/// Whether `include` is requested relative to this scope
	pub fn is_requested(&self, include: &str) -> bool {
		let path = self.relative_path(include);
		self.manager
			.requested_includes()
			.iter()
			.any(|requested| *requested == path)
	}

	/// Whether `include` is excluded relative to this scope
	pub fn is_excluded(&self, include: &str) -> bool {
		let path = self.relative_path(include);
		self.manager
			.requested_excludes()
			.iter()
			.any(|excluded| *excluded == path)
	}

	/// Wrap a resource produced by one of this scope's includes
	pub fn embed_child_scope(&self, scope_identifier: &str, resource: Resource) -> Scope<'m> {
		self.manager
			.create_scope(resource, Some(scope_identifier), Some(self))
	}

	/// Resolve the scope into its serialized value
	///
	/// # Errors
	///
	/// Fails with [`Error::InvalidArgument`] for a primitive resource and
	/// propagates any transformer, include handler or serializer error.
	pub fn to_array(&self) -> Result<Value> {
		if self.is_root_scope() {
			debug!(
				resource = self.resource.kind(),
				resource_key = self.resource.resource_key(),
				"serializing root scope"
			);
		}

		let serializer = self.manager.serializer();

		let (mut data, raw_included, available_includes) = match &self.resource {
			Resource::Item(item) => {
				let source = item.source();
				let (transformed, included) = self.fire_transformer(source, 0)?;
				let data = serializer.item(item.resource_key(), transformed)?;
				(Some(data), vec![included], recorded_includes(source))
			}
			Resource::Collection(collection) => {
				let source = collection.source();
				let mut transformed = Vec::with_capacity(source.len());
				let mut included = Vec::with_capacity(source.len());
				for index in 0..source.len() {
					let (element, element_included) = self.fire_transformer(source, index)?;
					transformed.push(element);
					included.push(element_included);
				}
				let data = serializer.collection(collection.resource_key(), transformed)?;
				(Some(data), included, recorded_includes(source))
			}
			Resource::Null(_) => (serializer.null(), Vec::new(), &[][..]),
			Resource::Primitive(_) => {
				return Err(Error::InvalidArgument(
					"a Primitive resource must be resolved with transform_primitive_resource()"
						.to_string(),
				));
			}
		};

		if serializer.sideload_includes() {
			let raw_included: Vec<_> = raw_included
				.into_iter()
				.map(|included| self.filter_fieldsets(included))
				.collect();
			let mut included_data = serializer.included_data(&self.resource, &raw_included)?;

			if let Some(envelope) = data.take() {
				data = Some(serializer.inject_data(envelope, &raw_included)?);
			}

			if self.is_root_scope() {
				let empty = Map::new();
				included_data =
					serializer.filter_includes(included_data, data.as_ref().unwrap_or(&empty));
			}

			if let Some(envelope) = data.as_mut() {
				for (key, value) in included_data {
					envelope.entry(key).or_insert(value);
				}
			}
		}

		if !available_includes.is_empty()
			&& let Some(envelope) = data.take()
		{
			data = Some(serializer.inject_available_include_data(envelope, available_includes));
		}

		let mut meta = self.resource.meta().clone();
		if let Resource::Collection(collection) = &self.resource {
			let pagination = match (collection.cursor(), collection.paginator()) {
				(Some(cursor), _) => Some(serializer.cursor(cursor)),
				(None, Some(paginator)) => Some(serializer.paginator(paginator)),
				(None, None) => None,
			};
			if let Some((key, value)) = pagination {
				meta.insert(key, value);
			}
		}
		let meta = serializer.meta(&meta);

		match data {
			None if meta.is_empty() => Ok(Value::Null),
			None => Ok(Value::Object(meta)),
			Some(mut envelope) => {
				for (key, value) in meta {
					envelope.entry(key).or_insert(value);
				}
				Ok(Value::Object(envelope))
			}
		}
	}

	/// Resolve the scope and encode it as compact JSON
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(&self.to_array()?)?)
	}

	/// Transform the scalar of a primitive resource
	pub fn transform_primitive_resource(&self) -> Result<Value> {
		match &self.resource {
			Resource::Primitive(primitive) => primitive.transform(),
			other => Err(Error::InvalidArgument(format!(
				"transform_primitive_resource() expects a Primitive resource, {} given",
				other.kind()
			))),
		}
	}

	fn fire_transformer(&self, source: &dyn ErasedSource, index: usize) -> Result<Transformed> {
		let mut transformed = source.transform(index)?;
		let mut included = Map::new();

		if source.has_includes() {
			included = self.fire_included_transformers(source, index)?;
			// Serializers may nest includes below a mandatory key.
			let merged = self.filter_fieldsets(included.clone());
			transformed = self
				.manager
				.serializer()
				.merge_includes(transformed, &merged);
		}

		Ok((self.filter_fieldsets(transformed), included))
	}

	fn fire_included_transformers(
		&self,
		source: &dyn ErasedSource,
		index: usize,
	) -> Result<Map<String, Value>> {
		let mut included = Map::new();

		for include in self.effective_includes(source) {
			let params = self.manager.include_params(&self.identifier_with(include));
			trace!(
				scope = %self.identifier(),
				include,
				transformer = source.transformer_name(),
				"resolving include"
			);

			let Some(resource) = source.call_include(index, include, params, self)? else {
				continue;
			};
			let child = self.embed_child_scope(include, resource);
			let value = if child.resource().is_primitive() {
				child.transform_primitive_resource()?
			} else {
				child.to_array()?
			};
			included.insert(include.to_string(), value);
		}

		Ok(included)
	}

	fn effective_includes<'s>(&self, source: &'s dyn ErasedSource) -> Vec<&'s str> {
		let mut includes: Vec<&str> = Vec::new();
		for include in source.default_includes() {
			if !includes.contains(&include.as_str()) {
				includes.push(include);
			}
		}
		for include in source.available_includes() {
			if self.is_requested(include) && !includes.contains(&include.as_str()) {
				includes.push(include);
			}
		}
		includes.retain(|include| !self.is_excluded(include));
		includes
	}

	fn filter_fieldsets(&self, data: Map<String, Value>) -> Map<String, Value> {
		let Some(fieldset) = self
			.resource
			.resource_key()
			.and_then(|key| self.manager.fieldset(key))
		else {
			return data;
		};
		let mandatory = self.manager.serializer().mandatory_fields();

		data.into_iter()
			.filter(|(key, _)| mandatory.contains(&key.as_str()) || fieldset.contains(key))
			.collect()
	}

	// Requested and excluded paths are relative to the root's children, so
	// the root's own identifier is dropped.
	fn relative_path(&self, include: &str) -> String {
		match self.parent_scopes.split_first() {
			Some((_, ancestors)) => {
				let mut segments: Vec<&str> = ancestors.iter().map(String::as_str).collect();
				segments.push(self.scope_identifier.as_deref().unwrap_or_default());
				segments.push(include);
				segments.join(".")
			}
			None => include.to_string(),
		}
	}

	fn path_segments<'a>(&'a self, include: Option<&'a str>) -> Vec<&'a str> {
		self.parent_scopes
			.iter()
			.map(String::as_str)
			.chain(self.scope_identifier.as_deref())
			.chain(include)
			.filter(|segment| !segment.is_empty())
			.collect()
	}
}

fn recorded_includes(source: &dyn ErasedSource) -> &[String] {
	if source.has_includes() && source.len() > 0 {
		source.available_includes()
	} else {
		&[]
	}
}

impl serde::Serialize for Scope<'_> {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		use serde::ser::Error as _;

		self.to_array()
			.map_err(S::Error::custom)?
			.serialize(serializer)
	}
}

impl fmt::Debug for Scope<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scope")
			.field("resource", &self.resource)
			.field("scope_identifier", &self.scope_identifier)
			.field("parent_scopes", &self.parent_scopes)
			.finish_non_exhaustive()
	}
}
