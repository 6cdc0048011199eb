//! The slice of items selected by [`PageNumberPagination`](crate::PageNumberPagination).

/// Items of one page together with the position of that page
///
/// # Examples
///
/// ```
/// use prism_pagination::Page;
///
/// let page = Page::new(vec!["a", "b", "c"], 2, 4, 11, 3);
/// assert_eq!(page.number(), 2);
/// assert_eq!(page.len(), 3);
/// assert_eq!(page.total(), 11);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
	items: Vec<T>,
	number: usize,
	num_pages: usize,
	total: usize,
	per_page: usize,
}

impl<T> Page<T> {
	/// `number` is 1-based; `total` counts the items of every page.
	pub fn new(items: Vec<T>, number: usize, num_pages: usize, total: usize, per_page: usize) -> Self {
		Self {
			items,
			number,
			num_pages,
			total,
			per_page,
		}
	}

	pub fn items(&self) -> &[T] {
		&self.items
	}

	pub fn number(&self) -> usize {
		self.number
	}

	pub fn num_pages(&self) -> usize {
		self.num_pages
	}

	pub fn total(&self) -> usize {
		self.total
	}

	/// Configured page size; the last page may hold more when orphans are
	/// merged into it, or fewer.
	pub fn per_page(&self) -> usize {
		self.per_page
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl<T> IntoIterator for Page<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}
