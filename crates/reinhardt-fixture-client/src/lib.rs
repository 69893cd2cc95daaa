//! Simulated HTTP requests carrying request fixtures.
//!
//! [`FixtureRequestFactory`] builds `http::Request<Full<Bytes>>` values whose
//! body comes from a bound fixture, a fake registered in a
//! [`FakeRegistry`](reinhardt_fixture_builder::FakeRegistry), explicit data,
//! or all three layered.
//!
//! ```
//! use reinhardt_fixture_builder::{Definition, FakeRegistry, Faker, RequestFixture, RequestTarget};
//! use reinhardt_fixture_client::FixtureRequestFactory;
//! use serde_json::json;
//!
//! struct StoreUserRequest;
//! impl RequestTarget for StoreUserRequest {}
//!
//! #[derive(Default)]
//! struct StoreUserFixture;
//!
//! impl RequestFixture for StoreUserFixture {
//!     fn definition(&self, _faker: &mut Faker) -> Definition {
//!         Definition::new().set("name", "Luke Downing").set("email", "foo@bar.com")
//!     }
//! }
//!
//! let fakes = FakeRegistry::new();
//! StoreUserFixture::factory().fake::<StoreUserRequest>(&fakes).unwrap();
//!
//! let request = FixtureRequestFactory::new()
//!     .with_fakes(fakes)
//!     .post("/users/")
//!     .target::<StoreUserRequest>()
//!     .json(&json!({"email": "luke@worksome.com"}))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! assert_eq!(request.method(), "POST");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod multipart;
pub mod request;

pub use error::{ClientError, ClientResult};
pub use request::{FixtureRequestFactory, RequestBuilder};
