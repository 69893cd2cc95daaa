//! Client errors.

use reinhardt_fixture_builder::FixtureError;
use thiserror::Error;

/// Error type for building simulated requests.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The request could not be assembled.
	#[error("HTTP error: {0}")]
	Http(#[from] http::Error),

	/// Explicit data could not be serialized.
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A header value contains invalid characters.
	#[error("Invalid header value: {0}")]
	InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

	/// The bound fixture or an injected fake failed to resolve.
	#[error("Fixture error: {0}")]
	Fixture(#[from] FixtureError),

	/// The request data has an unsupported shape or format.
	#[error("Request failed: {0}")]
	RequestFailed(String),
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
