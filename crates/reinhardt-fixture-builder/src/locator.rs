//! Binding fixtures to target request types.
//!
//! A target type either declares its fixture, is mapped to one explicitly on
//! a [`FixtureLocator`], or is matched by naming convention against the
//! fixtures registered with [`register_fixture!`](crate::register_fixture).
//!
//! ## Convention
//!
//! With the default [`FixtureSettings`], the target
//! `my_app::http::requests::admin::CreateUser` is stripped up to and
//! including its `requests` segment, prefixed with the `fixtures` namespace
//! and suffixed with `Fixture`, giving `fixtures::admin::CreateUserFixture`.
//! Any registration whose name ends with that path matches.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{FixtureError, FixtureResult};
use crate::fixture::{FixtureBuilder, NestedFixture, RequestFixture};
use crate::settings::FixtureSettings;

/// A request type fixtures can be bound to.
pub trait RequestTarget: 'static {
	/// Fully qualified name used by the naming convention.
	fn target_name() -> &'static str {
		std::any::type_name::<Self>()
	}

	/// Fixture explicitly declared by the target, if any.
	fn declared_fixture() -> Option<NestedFixture> {
		None
	}
}

/// Identifies a target request type.
#[derive(Clone, Copy)]
pub struct TargetKey {
	type_id: TypeId,
	name: &'static str,
}

impl TargetKey {
	/// Returns the key of target `T`.
	pub fn of<T: RequestTarget>() -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			name: T::target_name(),
		}
	}

	/// Returns the target's name.
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TargetKey {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}

impl Eq for TargetKey {}

impl Hash for TargetKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.type_id.hash(state);
	}
}

impl fmt::Debug for TargetKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TargetKey").field(&self.name).finish()
	}
}

/// A fixture discoverable by convention.
///
/// Submitted through [`register_fixture!`](crate::register_fixture) and
/// collected with `inventory`.
pub struct FixtureRegistration {
	/// Fully qualified fixture name, e.g. `my_tests::fixtures::SignupFixture`.
	pub name: &'static str,
	/// Builds a fresh builder for the fixture.
	pub construct: fn() -> NestedFixture,
}

impl FixtureRegistration {
	/// Creates a registration.
	pub const fn new(name: &'static str, construct: fn() -> NestedFixture) -> Self {
		Self { name, construct }
	}
}

inventory::collect!(FixtureRegistration);

/// Registers a `Default` fixture type for convention-based lookup.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// pub struct SignupRequestFixture;
///
/// impl RequestFixture for SignupRequestFixture { /* ... */ }
///
/// register_fixture!(SignupRequestFixture);
/// ```
#[macro_export]
macro_rules! register_fixture {
	($fixture:ident) => {
		$crate::inventory::submit! {
			$crate::FixtureRegistration::new(
				concat!(module_path!(), "::", stringify!($fixture)),
				|| $crate::FixtureBuilder::new(<$fixture as ::core::default::Default>::default()).erase(),
			)
		}
	};
}

/// Adapter a host test harness implements to find the fixture for a target.
pub trait LocateFixture {
	/// Returns a fresh builder for the target behind `target`.
	fn locate_fixture(&self, target: &TargetKey) -> FixtureResult<NestedFixture>;
}

type Constructor = Arc<dyn Fn() -> NestedFixture + Send + Sync>;

/// Finds fixtures for target types.
///
/// Lookup order: explicit mapping, then the target's declared fixture,
/// then the naming convention.
#[derive(Clone, Default)]
pub struct FixtureLocator {
	settings: FixtureSettings,
	overrides: HashMap<TargetKey, Constructor>,
}

impl FixtureLocator {
	/// Creates a locator using `settings` for the convention.
	pub fn new(settings: FixtureSettings) -> Self {
		Self {
			settings,
			overrides: HashMap::new(),
		}
	}

	/// Returns the settings in use.
	pub fn settings(&self) -> &FixtureSettings {
		&self.settings
	}

	/// Maps target `T` to the default value of fixture `F`.
	pub fn map<T: RequestTarget, F: RequestFixture + Default>(self) -> Self {
		self.map_with::<T, _>(|| F::factory())
	}

	/// Maps target `T` to builders produced by `construct`.
	pub fn map_with<T, F>(mut self, construct: impl Fn() -> FixtureBuilder<F> + Send + Sync + 'static) -> Self
	where
		T: RequestTarget,
		F: RequestFixture,
	{
		self.overrides
			.insert(TargetKey::of::<T>(), Arc::new(move || construct().erase()));
		self
	}

	/// Locates the fixture for `T`.
	pub fn locate<T: RequestTarget>(&self) -> FixtureResult<NestedFixture> {
		let key = TargetKey::of::<T>();
		if let Some(construct) = self.overrides.get(&key) {
			return Ok(construct());
		}
		if let Some(fixture) = T::declared_fixture() {
			return Ok(fixture);
		}
		self.by_convention(&key)
	}

	/// Fixture name the convention derives for `target_name`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::{FixtureLocator, FixtureSettings};
	///
	/// let locator = FixtureLocator::new(FixtureSettings::default());
	/// assert_eq!(
	///     locator.expected_fixture_name("my_app::requests::admin::CreateUser"),
	///     "fixtures::admin::CreateUserFixture",
	/// );
	/// assert_eq!(
	///     locator.expected_fixture_name("my_app::forms::Signup"),
	///     "fixtures::SignupFixture",
	/// );
	/// ```
	pub fn expected_fixture_name(&self, target_name: &str) -> String {
		let relative = self.relative_segments(target_name);
		let mut segments: Vec<String> = self
			.settings
			.namespace
			.split("::")
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.collect();
		segments.extend(relative);
		if let Some(last) = segments.last_mut() {
			last.push_str(&self.settings.suffix);
		}
		segments.join("::")
	}

	/// File the convention expects the fixture for `target_name` in.
	pub fn expected_path(&self, target_name: &str) -> String {
		let mut path = self.settings.path.clone();
		let mut relative = self.relative_segments(target_name);
		if let Some(last) = relative.last_mut() {
			last.push_str(&self.settings.suffix);
		}
		for (index, segment) in relative.iter().enumerate() {
			if index + 1 == relative.len() {
				path.push(format!("{}.rs", snake_case(segment)));
			} else {
				path.push(segment);
			}
		}
		path.display().to_string()
	}

	fn relative_segments(&self, target_name: &str) -> Vec<String> {
		// Generic arguments play no part in the convention.
		let bare = target_name.split('<').next().unwrap_or(target_name);
		let segments: Vec<&str> = bare.split("::").filter(|s| !s.is_empty()).collect();
		let start = segments
			.iter()
			.rposition(|s| *s == self.settings.target_namespace)
			.map(|index| index + 1)
			.unwrap_or_else(|| segments.len().saturating_sub(1));
		segments[start..].iter().map(|s| s.to_string()).collect()
	}

	fn by_convention(&self, key: &TargetKey) -> FixtureResult<NestedFixture> {
		let expected = self.expected_fixture_name(key.name());
		let suffix = format!("::{}", expected);
		let found = inventory::iter::<FixtureRegistration>
			.into_iter()
			.find(|registration| registration.name == expected || registration.name.ends_with(&suffix));
		match found {
			Some(registration) => {
				tracing::debug!(
					target_type = key.name(),
					fixture = registration.name,
					"located fixture by convention"
				);
				Ok((registration.construct)())
			}
			None => Err(FixtureError::CouldNotLocateFixture {
				target: key.name().to_string(),
				expected,
				path: self.expected_path(key.name()),
			}),
		}
	}
}

impl LocateFixture for FixtureLocator {
	fn locate_fixture(&self, target: &TargetKey) -> FixtureResult<NestedFixture> {
		if let Some(construct) = self.overrides.get(target) {
			return Ok(construct());
		}
		self.by_convention(target)
	}
}

impl fmt::Debug for FixtureLocator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FixtureLocator")
			.field("settings", &self.settings)
			.field("overrides", &self.overrides.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn snake_case(name: &str) -> String {
	let mut out = String::with_capacity(name.len() + 4);
	for (index, ch) in name.chars().enumerate() {
		if ch.is_uppercase() {
			if index > 0 {
				out.push('_');
			}
			out.extend(ch.to_lowercase());
		} else {
			out.push(ch);
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::definition::Definition;
	use crate::faker::Faker;
	use rstest::rstest;
	use serde_json::json;

	mod requests {
		pub struct ContactRequest;
		pub struct OrphanRequest;
	}

	impl RequestTarget for requests::ContactRequest {}
	impl RequestTarget for requests::OrphanRequest {}

	mod fixtures {
		use super::*;

		#[derive(Default)]
		pub struct ContactRequestFixture;

		impl RequestFixture for ContactRequestFixture {
			fn definition(&self, _faker: &mut Faker) -> Definition {
				Definition::new().set("message", "hello")
			}
		}

		crate::register_fixture!(ContactRequestFixture);
	}

	#[derive(Default)]
	struct ExplicitFixture;

	impl RequestFixture for ExplicitFixture {
		fn definition(&self, _faker: &mut Faker) -> Definition {
			Definition::new().set("explicit", true)
		}
	}

	#[rstest]
	fn test_convention_finds_registered_fixture() {
		let locator = FixtureLocator::default();
		let fixture = locator.locate::<requests::ContactRequest>().unwrap();
		let payload = fixture.resolve(json!({})).unwrap();
		assert_eq!(payload.data()["message"], json!("hello"));
	}

	#[rstest]
	fn test_missing_fixture_reports_expected_name_and_path() {
		let locator = FixtureLocator::default();
		let error = locator.locate::<requests::OrphanRequest>().unwrap_err();
		match error {
			FixtureError::CouldNotLocateFixture {
				target,
				expected,
				path,
			} => {
				assert!(target.ends_with("requests::OrphanRequest"));
				assert_eq!(expected, "fixtures::OrphanRequestFixture");
				assert_eq!(path, "tests/fixtures/orphan_request_fixture.rs");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[rstest]
	fn test_explicit_mapping_wins() {
		let locator = FixtureLocator::default().map::<requests::OrphanRequest, ExplicitFixture>();
		let payload = locator
			.locate::<requests::OrphanRequest>()
			.unwrap()
			.resolve(json!({}))
			.unwrap();
		assert_eq!(payload.data()["explicit"], json!(true));
	}

	#[rstest]
	#[case("app::requests::admin::CreateUser", "fixtures::admin::CreateUserFixture")]
	#[case("app::requests::Signup", "fixtures::SignupFixture")]
	#[case("Signup", "fixtures::SignupFixture")]
	#[case("app::Wrapper<app::Inner>", "fixtures::WrapperFixture")]
	fn test_expected_fixture_name(#[case] target: &str, #[case] expected: &str) {
		let locator = FixtureLocator::default();
		assert_eq!(locator.expected_fixture_name(target), expected);
	}

	#[rstest]
	fn test_custom_settings_change_the_convention() {
		let settings = FixtureSettings {
			namespace: "support::payloads".to_string(),
			suffix: "Payload".to_string(),
			path: "tests/support/payloads".into(),
			target_namespace: "forms".to_string(),
		};
		let locator = FixtureLocator::new(settings);
		assert_eq!(
			locator.expected_fixture_name("app::forms::billing::Invoice"),
			"support::payloads::billing::InvoicePayload"
		);
		assert_eq!(
			locator.expected_path("app::forms::billing::Invoice"),
			"tests/support/payloads/billing/invoice_payload.rs"
		);
	}

	#[rstest]
	#[case("SignupRequestFixture", "signup_request_fixture")]
	#[case("Invoice", "invoice")]
	fn test_snake_case(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(snake_case(input), expected);
	}
}
