//! Include, exclude and fieldset parameters read from a query string.

use crate::settings::ManagerSettings;
use indexmap::IndexMap;
use serde::Serialize;
use url::Url;

/// Query parameters that configure a [`Manager`](crate::Manager).
///
/// Repeated include or exclude parameters are joined with `,`. Fieldsets
/// use the bracket form `fields[books]=title,year`.
///
/// # Examples
///
/// ```
/// use prism_core::{Manager, ManagerSettings, RequestParams};
///
/// let settings = ManagerSettings::default();
/// let params = RequestParams::from_query("include=author&fields%5Bbooks%5D=title", &settings);
///
/// let mut manager = Manager::new();
/// manager.apply_request_params(&params).unwrap();
///
/// assert_eq!(manager.requested_includes(), ["author"]);
/// assert!(manager.fieldset("books").is_some_and(|f| f.contains("title")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestParams {
	includes: Option<String>,
	excludes: Option<String>,
	fieldsets: IndexMap<String, String>,
}

impl RequestParams {
	/// Read parameters from a raw query string, with or without the leading `?`
	pub fn from_query(query: &str, settings: &ManagerSettings) -> Self {
		let query = query.strip_prefix('?').unwrap_or(query);
		let fieldsets_prefix = format!("{}[", settings.fieldsets_param);
		let mut params = Self::default();

		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			if key == settings.include_param {
				append_csv(&mut params.includes, &value);
			} else if key == settings.exclude_param {
				append_csv(&mut params.excludes, &value);
			} else if let Some(resource_type) = key
				.strip_prefix(fieldsets_prefix.as_str())
				.and_then(|rest| rest.strip_suffix(']'))
				.filter(|resource_type| !resource_type.is_empty())
			{
				params
					.fieldsets
					.insert(resource_type.to_string(), value.into_owned());
			}
		}

		params
	}

	/// Read parameters from the query of an URL
	pub fn from_url(url: &Url, settings: &ManagerSettings) -> Self {
		Self::from_query(url.query().unwrap_or_default(), settings)
	}

	/// Comma separated includes, if the parameter was present
	pub fn includes(&self) -> Option<&str> {
		self.includes.as_deref()
	}

	/// Comma separated excludes, if the parameter was present
	pub fn excludes(&self) -> Option<&str> {
		self.excludes.as_deref()
	}

	/// Comma separated fields keyed by resource type
	pub fn fieldsets(&self) -> &IndexMap<String, String> {
		&self.fieldsets
	}
}

fn append_csv(target: &mut Option<String>, value: &str) {
	match target {
		Some(existing) => {
			existing.push(',');
			existing.push_str(value);
		}
		None => *target = Some(value.to_string()),
	}
}
