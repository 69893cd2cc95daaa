//! Error types for fixture resolution.
//!
//! Every error is raised synchronously while a fixture is resolved or
//! registered, and no partial payload is ever returned alongside one.

use thiserror::Error;

/// Errors that can occur while building, resolving or locating fixtures.
///
/// Loading [`FixtureSettings`](crate::FixtureSettings) has its own
/// [`SettingsError`](crate::SettingsError).
#[derive(Debug, Clone, Error)]
pub enum FixtureError {
	/// Lazy fields reference each other in a cycle.
	#[error("Circular lazy dependency at `{path}`: {}", .chain.join(" -> "))]
	CircularLazyDependency {
		/// Path of the field whose resolution closed the cycle.
		path: String,
		/// Sibling keys forming the cycle, first key repeated at the end.
		chain: Vec<String>,
	},

	/// A fixture keeps nesting itself, directly or through other fixtures.
	#[error("Circular nested fixture at `{path}`: {}", .chain.join(" -> "))]
	CircularNestedFixture {
		/// Path of the field holding the repeated fixture.
		path: String,
		/// Fixture type names of the innermost round of the cycle, repeated
		/// fixture at both ends.
		chain: Vec<String>,
	},

	/// A dot-path could not be parsed.
	#[error("Malformed path `{path}`: {reason}")]
	MalformedPath {
		/// The offending path as written.
		path: String,
		/// Why the path was rejected.
		reason: String,
	},

	/// A dot-path does not address an existing location (strict mode only).
	#[error("Unresolvable reference: `{path}` does not address an existing field")]
	UnresolvableReference {
		/// The offending path.
		path: String,
	},

	/// A patch or request payload was not a mapping.
	#[error("Invalid patch: expected a mapping, got {0}")]
	InvalidPatch(String),

	/// No fixture could be found for a target request type.
	#[error(
		"Could not locate a fixture for `{target}`: expected `{expected}` in {path}, and no explicit mapping was registered"
	)]
	CouldNotLocateFixture {
		/// Name of the target request type.
		target: String,
		/// Fixture name derived by convention.
		expected: String,
		/// File the convention expected the fixture in.
		path: String,
	},

	/// A lazy resolver or generator failed.
	#[error("Callback error at `{path}`: {message}")]
	Callback {
		/// Path of the field being resolved.
		path: String,
		/// Failure message.
		message: String,
	},
}

/// Coarse classification of [`FixtureError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The fixture itself is misconfigured.
	Configuration,
	/// A fixture lookup failed.
	Lookup,
	/// User code invoked during resolution failed.
	Callback,
}

impl FixtureError {
	/// Creates a callback error for use inside lazy resolvers and generators.
	///
	/// The path is filled in by the resolver when the error surfaces.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::FixtureError;
	///
	/// let error = FixtureError::custom("no such company");
	/// assert_eq!(error.to_string(), "Callback error at ``: no such company");
	/// ```
	pub fn custom(message: impl Into<String>) -> Self {
		FixtureError::Callback {
			path: String::new(),
			message: message.into(),
		}
	}

	/// Returns the taxonomy bucket of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			FixtureError::CircularLazyDependency { .. }
			| FixtureError::CircularNestedFixture { .. }
			| FixtureError::MalformedPath { .. }
			| FixtureError::UnresolvableReference { .. }
			| FixtureError::InvalidPatch(_) => ErrorKind::Configuration,
			FixtureError::CouldNotLocateFixture { .. } => ErrorKind::Lookup,
			FixtureError::Callback { .. } => ErrorKind::Callback,
		}
	}

	// Attaches the field path to callback errors raised without one.
	pub(crate) fn at_path(self, at: &str) -> Self {
		match self {
			FixtureError::Callback { path, message } if path.is_empty() => {
				FixtureError::Callback {
					path: at.to_string(),
					message,
				}
			}
			other => other,
		}
	}

	// Rebases an error raised inside the nested fixture at `at`.
	pub(crate) fn nested_under(self, at: &str) -> Self {
		match self {
			FixtureError::CircularNestedFixture { path, chain } => FixtureError::CircularNestedFixture {
				path: format!("{}.{}", at, path),
				chain,
			},
			other => other.at_path(at),
		}
	}
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_circular_dependency_message() {
		let error = FixtureError::CircularLazyDependency {
			path: "a".to_string(),
			chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
		};
		assert_eq!(
			error.to_string(),
			"Circular lazy dependency at `a`: a -> b -> a"
		);
		assert_eq!(error.kind(), ErrorKind::Configuration);
	}

	#[rstest]
	fn test_lookup_error_names_target() {
		let error = FixtureError::CouldNotLocateFixture {
			target: "app::requests::SignupRequest".to_string(),
			expected: "fixtures::SignupRequestFixture".to_string(),
			path: "tests/fixtures/signup_request_fixture.rs".to_string(),
		};
		assert!(error.to_string().contains("app::requests::SignupRequest"));
		assert_eq!(error.kind(), ErrorKind::Lookup);
	}

	#[rstest]
	#[case("", "email", "email")]
	#[case("address", "email", "address")]
	fn test_at_path_only_fills_empty_paths(
		#[case] initial: &str,
		#[case] at: &str,
		#[case] expected: &str,
	) {
		let error = FixtureError::Callback {
			path: initial.to_string(),
			message: "boom".to_string(),
		}
		.at_path(at);
		assert!(matches!(error, FixtureError::Callback { ref path, .. } if path == expected));
	}

	#[rstest]
	fn test_nested_cycle_path_is_rebased() {
		let error = FixtureError::CircularNestedFixture {
			path: "parent".to_string(),
			chain: vec!["Category".to_string(), "Category".to_string()],
		}
		.nested_under("category");
		assert_eq!(
			error.to_string(),
			"Circular nested fixture at `category.parent`: Category -> Category"
		);
		assert_eq!(error.kind(), ErrorKind::Configuration);
	}
}
