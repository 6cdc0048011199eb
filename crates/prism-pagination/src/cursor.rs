//! Cursor pagination over offset windows.

pub mod encoder;

pub use encoder::{Base64CursorEncoder, CursorEncoder};

use prism_core::{Collection, Cursor, Transformer};
use prism_exception::Result;
use serde_json::Value;
use std::ops::Range;

/// A [`Cursor`] whose positions are encoded tokens.
///
/// The cursor covers the window `offset..offset + page_size` of a sequence
/// of `total` items. `prev` and `next` are tokens for the neighbouring
/// windows, or `null` at either end.
///
/// # Examples
///
/// ```
/// use prism_core::Cursor;
/// use prism_pagination::{Base64CursorEncoder, CursorEncoder, EncodedCursor};
///
/// let encoder = Base64CursorEncoder::new();
/// let first = EncodedCursor::from_param(&encoder, None, 10, 25).unwrap();
/// assert_eq!(first.window(), 0..10);
/// assert!(first.prev().is_null());
///
/// // The client sends the `next` token back to get the following window
/// let next = first.next();
/// let second = EncodedCursor::from_param(&encoder, next.as_str(), 10, 25).unwrap();
/// assert_eq!(second.window(), 10..20);
/// assert_eq!(second.count(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCursor {
	current: String,
	prev: Option<String>,
	next: Option<String>,
	window: Range<usize>,
}

impl EncodedCursor {
	/// Build the cursor of the window starting at `offset`
	///
	/// An offset past `total` yields an empty window at the end.
	pub fn new(
		encoder: &dyn CursorEncoder,
		offset: usize,
		page_size: usize,
		total: usize,
	) -> Result<Self> {
		let page_size = page_size.max(1);
		let start = offset.min(total);
		let end = start.saturating_add(page_size).min(total);

		let prev = if start > 0 {
			Some(encoder.encode(start.saturating_sub(page_size))?)
		} else {
			None
		};
		let next = if end < total {
			Some(encoder.encode(end)?)
		} else {
			None
		};

		Ok(Self {
			current: encoder.encode(start)?,
			prev,
			next,
			window: start..end,
		})
	}

	/// Build the cursor of the window selected by a request's cursor
	/// parameter, starting from the beginning when there is none
	///
	/// # Errors
	///
	/// Fails when the token cannot be decoded.
	pub fn from_param(
		encoder: &dyn CursorEncoder,
		cursor: Option<&str>,
		page_size: usize,
		total: usize,
	) -> Result<Self> {
		let offset = match cursor {
			Some(cursor) => encoder.decode(cursor)?,
			None => 0,
		};
		Self::new(encoder, offset, page_size, total)
	}

	/// Item indexes covered by this cursor
	pub fn window(&self) -> Range<usize> {
		self.window.clone()
	}

	/// Select the window of `items` and wrap it in a collection carrying
	/// this cursor
	///
	/// `items` must be the sequence the cursor was built for.
	pub fn collection<T>(self, items: &[T], transformer: impl Into<Transformer<T>>) -> Collection
	where
		T: Clone + 'static,
	{
		let selected = items.get(self.window()).unwrap_or_default().to_vec();
		Collection::new(selected, transformer).with_cursor(self)
	}
}

impl Cursor for EncodedCursor {
	fn current(&self) -> Value {
		Value::String(self.current.clone())
	}

	fn prev(&self) -> Value {
		self.prev.clone().map_or(Value::Null, Value::String)
	}

	fn next(&self) -> Value {
		self.next.clone().map_or(Value::Null, Value::String)
	}

	fn count(&self) -> u64 {
		self.window.len() as u64
	}
}
