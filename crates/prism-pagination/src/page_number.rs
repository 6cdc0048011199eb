//! Page number based pagination.
//!
//! Example URLs:
//! - `http://api.example.org/books/?page=4`
//! - `http://api.example.org/books/?page=last&sort=title`

use crate::Page;
use prism_core::{Collection, Paginator, Transformer};
use prism_exception::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::{Position, Url};

/// Page number based pagination
///
/// # Examples
///
/// ```
/// use prism_pagination::PageNumberPagination;
///
/// let pagination = PageNumberPagination::new().page_size(5);
/// let items: Vec<i32> = (1..=20).collect();
///
/// let page = pagination.get_page(&items, Some("2"));
/// assert_eq!(page.number(), 2);
/// assert_eq!(page.items(), &[6, 7, 8, 9, 10]);
///
/// // Invalid page numbers fall back to the first page
/// assert_eq!(pagination.get_page(&items, Some("invalid")).number(), 1);
///
/// // Out of range page numbers return the last page
/// assert_eq!(pagination.get_page(&items, Some("100")).number(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct PageNumberPagination {
	/// Items per page
	pub page_size: usize,
	/// Query parameter carrying the page number
	pub page_query_param: String,
	/// Strings that select the last page
	pub last_page_strings: Vec<String>,
	/// A trailing page with this many items or fewer is merged into the
	/// previous page
	pub orphans: usize,
}

impl Default for PageNumberPagination {
	fn default() -> Self {
		Self {
			page_size: 10,
			page_query_param: "page".to_string(),
			last_page_strings: vec!["last".to_string()],
			orphans: 0,
		}
	}
}

impl PageNumberPagination {
	/// Creates a pagination with default settings
	///
	/// # Examples
	///
	/// ```
	/// use prism_pagination::PageNumberPagination;
	///
	/// let pagination = PageNumberPagination::new();
	/// assert_eq!(pagination.page_size, 10);
	/// assert_eq!(pagination.page_query_param, "page");
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the number of items per page
	pub fn page_size(mut self, size: usize) -> Self {
		self.page_size = size;
		self
	}

	/// Sets the query parameter carrying the page number
	pub fn page_query_param(mut self, param: impl Into<String>) -> Self {
		self.page_query_param = param.into();
		self
	}

	/// Sets the orphan threshold of the last page
	///
	/// # Examples
	///
	/// ```
	/// use prism_pagination::PageNumberPagination;
	///
	/// let pagination = PageNumberPagination::new().page_size(10).orphans(3);
	/// let items: Vec<i32> = (1..=23).collect();
	///
	/// let last = pagination.get_page(&items, Some("last"));
	/// assert_eq!(last.number(), 2);
	/// assert_eq!(last.len(), 13);
	/// ```
	pub fn orphans(mut self, orphans: usize) -> Self {
		self.orphans = orphans;
		self
	}

	/// Number of pages needed for `total_count` items; never zero
	pub fn num_pages(&self, total_count: usize) -> usize {
		let page_size = self.effective_page_size();
		if total_count <= page_size {
			return 1;
		}

		let pages = total_count / page_size;
		match total_count % page_size {
			0 => pages,
			remainder if remainder <= self.orphans => pages,
			_ => pages + 1,
		}
	}

	/// Get a page, returning a valid page even with invalid arguments
	///
	/// Unparseable page numbers select the first page and page numbers past
	/// the end select the last page.
	pub fn get_page<T: Clone>(&self, items: &[T], page_param: Option<&str>) -> Page<T> {
		let total_count = items.len();
		let total_pages = self.num_pages(total_count);
		let page_size = self.effective_page_size();

		let page_number = match page_param.map(|param| self.parse_page_number(param, total_pages)) {
			Some(Ok(number)) => number.min(total_pages),
			Some(Err(error)) => {
				debug!(%error, "falling back to the first page");
				1
			}
			None => 1,
		};

		let start = ((page_number - 1) * page_size).min(total_count);
		let end = if page_number == total_pages {
			total_count
		} else {
			(start + page_size).min(total_count)
		};

		Page::new(
			items[start..end].to_vec(),
			page_number,
			total_pages,
			total_count,
			page_size,
		)
	}

	/// Slice `items` and wrap the page in a paginated collection
	pub fn collection<T>(
		&self,
		items: &[T],
		page_param: Option<&str>,
		base_url: &str,
		transformer: impl Into<Transformer<T>>,
	) -> Collection
	where
		T: Clone + 'static,
	{
		let page = self.get_page(items, page_param);
		let adapter = self.adapter(&page, base_url);
		Collection::new(page, transformer).with_paginator(adapter)
	}

	/// Expose `page` as a [`Paginator`] whose links are built from
	/// `base_url`
	pub fn adapter<T>(&self, page: &Page<T>, base_url: &str) -> PageAdapter {
		PageAdapter {
			current_page: page.number(),
			last_page: page.num_pages(),
			total: page.total(),
			count: page.len(),
			per_page: page.per_page(),
			base_url: base_url.to_string(),
			page_query_param: self.page_query_param.clone(),
		}
	}

	fn parse_page_number(&self, page: &str, total_pages: usize) -> Result<usize> {
		if self.last_page_strings.iter().any(|last| last == page) {
			return Ok(total_pages);
		}

		match page.parse::<usize>() {
			Ok(0) => Err(Error::InvalidPage(
				"That page number is less than 1".to_string(),
			)),
			Ok(number) => Ok(number),
			Err(_) => Err(Error::InvalidPage(format!(
				"Invalid page number '{}'",
				page
			))),
		}
	}

	fn effective_page_size(&self) -> usize {
		self.page_size.max(1)
	}
}

/// A [`Page`] viewed through [`Paginator`]
///
/// Page URLs are `base_url` with the page query parameter replaced and every
/// other query parameter kept. Relative base URLs produce relative links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAdapter {
	current_page: usize,
	last_page: usize,
	total: usize,
	count: usize,
	per_page: usize,
	base_url: String,
	page_query_param: String,
}

impl PageAdapter {
	/// The URL pages are built from
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// The query parameter carrying the page number
	pub fn page_query_param(&self) -> &str {
		&self.page_query_param
	}
}

impl Paginator for PageAdapter {
	fn current_page(&self) -> u64 {
		self.current_page as u64
	}

	fn last_page(&self) -> u64 {
		self.last_page as u64
	}

	fn total(&self) -> u64 {
		self.total as u64
	}

	fn count(&self) -> u64 {
		self.count as u64
	}

	fn per_page(&self) -> u64 {
		self.per_page as u64
	}

	fn url(&self, page: u64) -> String {
		build_url(&self.base_url, &self.page_query_param, page)
	}
}

fn build_url(base_url: &str, page_query_param: &str, page: u64) -> String {
	let (url, relative) = match Url::parse(base_url) {
		Ok(url) => (url, false),
		Err(url::ParseError::RelativeUrlWithoutBase) => {
			match Url::parse("http://localhost/").and_then(|root| root.join(base_url)) {
				Ok(url) => (url, true),
				Err(_) => return fallback_url(base_url, page_query_param, page),
			}
		}
		Err(_) => return fallback_url(base_url, page_query_param, page),
	};

	let mut new_url = url.clone();
	new_url
		.query_pairs_mut()
		.clear()
		.append_pair(page_query_param, &page.to_string());

	for (key, value) in url.query_pairs() {
		if key != page_query_param {
			new_url.query_pairs_mut().append_pair(&key, &value);
		}
	}

	if relative {
		new_url[Position::BeforePath..].to_string()
	} else {
		new_url.to_string()
	}
}

fn fallback_url(base_url: &str, page_query_param: &str, page: u64) -> String {
	let separator = if base_url.contains('?') { '&' } else { '?' };
	format!("{}{}{}={}", base_url, separator, page_query_param, page)
}
