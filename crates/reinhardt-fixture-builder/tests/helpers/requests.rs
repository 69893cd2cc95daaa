//! Request targets the test fixtures bind to.

use reinhardt_fixture_builder::{NestedFixture, RequestFixture, RequestTarget};

use super::fixtures::ImportContactsPayload;

/// Located by convention through `StoreUserRequestFixture`.
pub struct StoreUserRequest;

impl RequestTarget for StoreUserRequest {}

/// Has no fixture anywhere.
pub struct UpdateProfileRequest;

impl RequestTarget for UpdateProfileRequest {}

/// Declares its fixture, which does not follow the naming convention.
pub struct ImportContactsRequest;

impl RequestTarget for ImportContactsRequest {
	fn declared_fixture() -> Option<NestedFixture> {
		Some(ImportContactsPayload::factory().erase())
	}
}

pub mod admin {
	use reinhardt_fixture_builder::RequestTarget;

	/// Located by convention under `fixtures::admin`.
	pub struct BanUserRequest;

	impl RequestTarget for BanUserRequest {}
}
