//! Fake payload registry.
//!
//! A [`FakeRegistry`] maps target request types to the payload that should
//! be injected the next time a simulated request for that type is built.
//! It is an explicit context object: create one per test case and hand it
//! to the request factory, so fakes never leak between tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::FixtureResult;
use crate::files::Files;
use crate::fixture::ResolvedPayload;
use crate::locator::{LocateFixture, RequestTarget, TargetKey};

/// Per-test registry of fake payloads keyed by target type.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistry {
	fakes: Arc<RwLock<HashMap<TargetKey, ResolvedPayload>>>,
}

impl FakeRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `payload` for target `T`, replacing a previous fake.
	pub fn insert<T: RequestTarget>(&self, payload: ResolvedPayload) {
		let key = TargetKey::of::<T>();
		tracing::debug!(target_type = key.name(), "registering fake payload");
		self.fakes.write().insert(key, payload);
	}

	/// Locates the fixture for `T` through `locator` and fakes it.
	pub fn fake_located<T: RequestTarget>(&self, locator: &impl LocateFixture) -> FixtureResult<()> {
		let fixture = match T::declared_fixture() {
			Some(fixture) => fixture,
			None => locator.locate_fixture(&TargetKey::of::<T>())?,
		};
		fixture.fake::<T>(self)
	}

	/// Returns the fake registered for `T`.
	pub fn get<T: RequestTarget>(&self) -> Option<ResolvedPayload> {
		self.get_by_key(&TargetKey::of::<T>())
	}

	/// Returns the fake registered under `key`.
	pub fn get_by_key(&self, key: &TargetKey) -> Option<ResolvedPayload> {
		self.fakes.read().get(key).cloned()
	}

	/// Returns true if a fake is registered for `T`.
	pub fn contains<T: RequestTarget>(&self) -> bool {
		self.fakes.read().contains_key(&TargetKey::of::<T>())
	}

	/// Removes and returns the fake registered for `T`.
	pub fn remove<T: RequestTarget>(&self) -> Option<ResolvedPayload> {
		self.fakes.write().remove(&TargetKey::of::<T>())
	}

	/// Removes every fake.
	pub fn clear(&self) {
		self.fakes.write().clear();
	}

	/// Returns the number of registered fakes.
	pub fn len(&self) -> usize {
		self.fakes.read().len()
	}

	/// Returns true if no fakes are registered.
	pub fn is_empty(&self) -> bool {
		self.fakes.read().is_empty()
	}

	/// Returns the fake for the target behind `key` with explicit request
	/// data and files laid over it, or `None` when no fake is registered.
	/// Dot-path keys in `data` are expanded.
	///
	/// This is what a simulated request calls to inject fake data.
	pub fn payload_for(
		&self,
		key: &TargetKey,
		data: Map<String, Value>,
		files: Files,
	) -> FixtureResult<Option<ResolvedPayload>> {
		let Some(fake) = self.get_by_key(key) else {
			return Ok(None);
		};
		tracing::trace!(target_type = key.name(), "injecting fake payload");
		fake.merged_with(data, files).map(Some)
	}
}
