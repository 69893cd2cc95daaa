//! Dot-delimited field paths.
//!
//! `address.line_one` addresses the `line_one` key inside the `address`
//! mapping. Paths are only expanded at the top level of a definition, patch
//! or request payload.

use std::fmt;

use crate::error::{FixtureError, FixtureResult};

/// A parsed, non-empty dot-path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotPath {
	segments: Vec<String>,
}

impl DotPath {
	/// Parses a dot-delimited path.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::DotPath;
	///
	/// let path = DotPath::parse("address.line_one").unwrap();
	/// assert_eq!(path.segments(), ["address", "line_one"]);
	/// assert!(DotPath::parse("address..line_one").is_err());
	/// ```
	pub fn parse(path: &str) -> FixtureResult<Self> {
		if path.is_empty() {
			return Err(malformed(path, "path is empty"));
		}
		let segments: Vec<String> = path.split('.').map(str::to_string).collect();
		if let Some(position) = segments.iter().position(String::is_empty) {
			let reason = if position == 0 {
				"path starts with a dot"
			} else if position == segments.len() - 1 {
				"path ends with a dot"
			} else {
				"path contains an empty segment"
			};
			return Err(malformed(path, reason));
		}
		Ok(Self { segments })
	}

	/// Builds a path from a single key without splitting it.
	pub(crate) fn single(key: impl Into<String>) -> Self {
		Self {
			segments: vec![key.into()],
		}
	}

	/// Returns the path segments.
	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Returns the last segment.
	pub fn leaf(&self) -> &str {
		// Parsing guarantees at least one segment.
		&self.segments[self.segments.len() - 1]
	}

	/// Returns every segment but the last.
	pub fn parents(&self) -> &[String] {
		&self.segments[..self.segments.len() - 1]
	}
}

impl fmt::Display for DotPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.segments.join("."))
	}
}

/// Joins a scope prefix and a key into a display path.
pub(crate) fn join(scope: &str, key: &str) -> String {
	if scope.is_empty() {
		key.to_string()
	} else {
		format!("{}.{}", scope, key)
	}
}

fn malformed(path: &str, reason: &str) -> FixtureError {
	FixtureError::MalformedPath {
		path: path.to_string(),
		reason: reason.to_string(),
	}
}
