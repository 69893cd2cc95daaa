//! Layered request payload fixtures.
//!
//! A fixture declares plausible defaults for the body of one kind of request,
//! so a test only spells out the fields it exercises. Builders layer `state`
//! patches and `without` omissions over the defaults and resolve lazy fields,
//! nested fixtures and generators into a [`ResolvedPayload`] of request data
//! plus file attachments.
//!
//! ## Quick start
//!
//! ```
//! use reinhardt_fixture_builder::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct StoreUserFixture;
//!
//! impl RequestFixture for StoreUserFixture {
//!     fn definition(&self, faker: &mut Faker) -> Definition {
//!         Definition::new()
//!             .set("name", faker.name())
//!             .set("company", "Worksome")
//!             .set("email", lazy(|fields| {
//!                 let name = fields.str("name")?.to_lowercase().replace(' ', ".");
//!                 let company = fields.str("company")?.to_lowercase();
//!                 Ok(json!(format!("{name}@{company}.com")))
//!             }))
//!     }
//! }
//!
//! let data = StoreUserFixture::factory()
//!     .state(json!({"name": "Luke Downing"}))
//!     .create(json!({}))
//!     .unwrap();
//! assert_eq!(data["email"], json!("luke.downing@worksome.com"));
//! ```
//!
//! ## Modules
//!
//! - [`fixture`]: the [`RequestFixture`] trait and [`FixtureBuilder`]
//! - [`value`] and [`definition`]: what a definition holds
//! - [`registry`]: per-test [`FakeRegistry`]
//! - [`locator`]: binding fixtures to request targets
//! - [`settings`]: naming convention configuration
//! - [`faker`]: fake data

#![warn(missing_docs)]

pub mod definition;
pub mod error;
pub mod faker;
pub mod files;
pub mod fixture;
pub mod locator;
pub mod logging;
pub mod path;
pub mod registry;
mod resolver;
pub mod settings;
mod tree;
pub mod value;

pub use definition::{Definition, IntoPaths};
pub use error::{ErrorKind, FixtureError, FixtureResult};
pub use faker::Faker;
pub use files::{FileAttachments, FileNode, Files, UploadedFile};
pub use fixture::{ErasedFixture, FixtureBuilder, NestedFixture, RequestFixture, ResolvedPayload};
pub use locator::{FixtureLocator, FixtureRegistration, LocateFixture, RequestTarget, TargetKey};
pub use path::DotPath;
pub use registry::FakeRegistry;
pub use resolver::Siblings;
pub use settings::{FixtureSettings, SettingsError};
pub use value::{FieldValue, LazyResolver, ValueGenerator, generator, lazy, nested};

#[doc(hidden)]
pub use inventory;

/// Common imports for fixture definitions and tests.
pub mod prelude {
	pub use crate::definition::Definition;
	pub use crate::error::{FixtureError, FixtureResult};
	pub use crate::faker::Faker;
	pub use crate::files::{FileAttachments, UploadedFile};
	pub use crate::fixture::{FixtureBuilder, RequestFixture, ResolvedPayload};
	pub use crate::locator::{FixtureLocator, RequestTarget};
	pub use crate::register_fixture;
	pub use crate::registry::FakeRegistry;
	pub use crate::value::{generator, lazy, nested};
}
