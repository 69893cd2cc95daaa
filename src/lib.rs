//! # Reinhardt Request Fixtures
//!
//! Plausible default payloads for the requests a test sends, so the test
//! only spells out the fields under examination.
//!
//! ## Crates
//!
//! - [`builder`] (`reinhardt-fixture-builder`): fixtures, layered
//!   resolution, fake registry and fixture lookup
//! - [`client`] (`reinhardt-fixture-client`, feature `client`): simulated
//!   `http::Request` values carrying resolved payloads
//!
//! ## Feature Flags
//!
//! - `client` (default) - Request factory and multipart encoding
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_request_fixtures::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct StoreUserFixture;
//!
//! impl RequestFixture for StoreUserFixture {
//!     fn definition(&self, _faker: &mut Faker) -> Definition {
//!         Definition::new()
//!             .set("name", "Luke Downing")
//!             .set("email", "foo@bar.com")
//!             .set("address", json!({"line_one": "X", "postcode": "Y"}))
//!     }
//! }
//!
//! let data = StoreUserFixture::factory()
//!     .state(json!({"name": "Oliver Nybroe", "email": "oliver@worksome.com"}))
//!     .without("address.postcode")
//!     .create(json!({"email": "luke@worksome.com"}))
//!     .unwrap();
//!
//! assert_eq!(data["name"], json!("Oliver Nybroe"));
//! assert_eq!(data["email"], json!("luke@worksome.com"));
//! assert_eq!(data["address"], json!({"line_one": "X"}));
//! ```

#![warn(missing_docs)]

pub use reinhardt_fixture_builder as builder;
#[cfg(feature = "client")]
pub use reinhardt_fixture_client as client;

pub use reinhardt_fixture_builder::{
	Definition, DotPath, ErrorKind, FakeRegistry, Faker, FieldValue, FileAttachments, Files,
	FixtureBuilder, FixtureError, FixtureLocator, FixtureResult, FixtureSettings, LocateFixture,
	NestedFixture, RequestFixture, RequestTarget, ResolvedPayload, Siblings, TargetKey,
	UploadedFile, ValueGenerator, generator, lazy, nested, register_fixture,
};

#[cfg(feature = "client")]
pub use reinhardt_fixture_client::{ClientError, FixtureRequestFactory, RequestBuilder};

/// Common imports for writing fixtures and tests.
pub mod prelude {
	pub use reinhardt_fixture_builder::prelude::*;

	#[cfg(feature = "client")]
	pub use reinhardt_fixture_client::{ClientError, FixtureRequestFactory};
}
