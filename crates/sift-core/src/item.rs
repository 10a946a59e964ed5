//! Candidate items and display transforms.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// An immutable candidate line plus its insertion order.
///
/// The text is stored as Unicode scalar values so the matcher can address
/// positions in O(1). Cloning an item only bumps reference counts; items are
/// never mutated after the reader publishes them.
#[derive(Clone, Debug)]
pub struct Item {
	index: usize,
	text: Arc<[char]>,
	original: Option<Arc<str>>,
}

impl Item {
	/// Create an item whose matched text is the raw line.
	#[must_use]
	pub fn new(index: usize, line: &str) -> Self {
		Self {
			index,
			text: line.chars().collect(),
			original: None,
		}
	}

	/// Create an item that matches and displays only the selected
	/// whitespace-delimited fields of `line`, retaining the raw line for
	/// output.
	#[must_use]
	pub fn with_fields(index: usize, line: String, ranges: &[FieldRange]) -> Self {
		let transformed = select_fields(&line, ranges);
		Self {
			index,
			text: transformed.chars().collect(),
			original: Some(line.into()),
		}
	}

	/// Insertion order into the chunk store.
	#[must_use]
	pub fn index(&self) -> usize {
		self.index
	}

	/// The text the pattern is evaluated against.
	#[must_use]
	pub fn text(&self) -> &[char] {
		&self.text
	}

	/// The matched text as an owned string.
	#[must_use]
	pub fn display(&self) -> String {
		self.text.iter().collect()
	}

	/// The line to print when the item is selected: the raw line when a
	/// field transform replaced the matched text, the matched text otherwise.
	#[must_use]
	pub fn output(&self) -> String {
		match &self.original {
			Some(original) => original.to_string(),
			None => self.display(),
		}
	}
}

/// A 1-based, inclusive range of whitespace-delimited fields.
///
/// Bounds may be negative to count from the last field (`-1` is the last
/// field); an open bound covers everything on that side. `2`, `2..`, `..-2`,
/// and `3..5` are all valid spellings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldRange {
	begin: Option<i32>,
	end: Option<i32>,
}

impl FieldRange {
	/// Resolve the range against a token count, yielding 0-based bounds.
	/// Returns `None` when the range selects nothing.
	fn resolve(&self, len: usize) -> Option<(usize, usize)> {
		let last = i64::try_from(len).ok()? - 1;
		let begin = self.begin.map_or(0, |bound| locate(bound, len));
		let end = self.end.map_or(last, |bound| locate(bound, len));
		let begin = begin.max(0);
		let end = end.min(last);
		if begin > end {
			return None;
		}
		Some((usize::try_from(begin).ok()?, usize::try_from(end).ok()?))
	}
}

/// Map a 1-based, possibly negative bound onto a 0-based token index.
fn locate(bound: i32, len: usize) -> i64 {
	if bound > 0 {
		i64::from(bound) - 1
	} else {
		len as i64 + i64::from(bound)
	}
}

/// A field range that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid field range '{0}'")]
pub struct FieldRangeError(pub String);

impl FromStr for FieldRange {
	type Err = FieldRangeError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let parse_bound = |text: &str| -> Result<Option<i32>, FieldRangeError> {
			if text.is_empty() {
				return Ok(None);
			}
			match text.parse::<i32>() {
				Ok(0) | Err(_) => Err(FieldRangeError(raw.to_string())),
				Ok(bound) => Ok(Some(bound)),
			}
		};

		if let Some((begin, end)) = raw.split_once("..") {
			Ok(Self {
				begin: parse_bound(begin)?,
				end: parse_bound(end)?,
			})
		} else {
			let bound = parse_bound(raw)?;
			if bound.is_none() {
				return Err(FieldRangeError(raw.to_string()));
			}
			Ok(Self {
				begin: bound,
				end: bound,
			})
		}
	}
}

/// Join the tokens selected by `ranges`, in range order.
fn select_fields(line: &str, ranges: &[FieldRange]) -> String {
	let tokens: Vec<&str> = line.split_whitespace().collect();
	let mut selected = Vec::new();
	for range in ranges {
		if let Some((begin, end)) = range.resolve(tokens.len()) {
			selected.extend_from_slice(&tokens[begin..=end]);
		}
	}
	selected.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn range(raw: &str) -> FieldRange {
		raw.parse().unwrap()
	}

	#[test]
	fn parses_single_and_open_ranges() {
		assert_eq!(
			range("2"),
			FieldRange {
				begin: Some(2),
				end: Some(2)
			}
		);
		assert_eq!(
			range("2.."),
			FieldRange {
				begin: Some(2),
				end: None
			}
		);
		assert_eq!(
			range("..-2"),
			FieldRange {
				begin: None,
				end: Some(-2)
			}
		);
		assert_eq!(
			range(".."),
			FieldRange {
				begin: None,
				end: None
			}
		);
	}

	#[test]
	fn rejects_zero_and_junk_bounds() {
		assert!("0".parse::<FieldRange>().is_err());
		assert!("a..b".parse::<FieldRange>().is_err());
		assert!("".parse::<FieldRange>().is_err());
	}

	#[test]
	fn transforms_select_and_reorder_fields() {
		let item = Item::with_fields(
			0,
			"alpha beta gamma delta".to_string(),
			&[range("-1"), range("2")],
		);
		assert_eq!(item.display(), "delta beta");
		assert_eq!(item.output(), "alpha beta gamma delta");
	}

	#[test]
	fn out_of_bounds_ranges_select_nothing() {
		let item = Item::with_fields(0, "only".to_string(), &[range("5..9")]);
		assert_eq!(item.display(), "");
		assert_eq!(item.output(), "only");
	}

	#[test]
	fn plain_items_output_their_text() {
		let item = Item::new(3, "plain line");
		assert_eq!(item.index(), 3);
		assert_eq!(item.output(), "plain line");
	}
}
