//! Request fixtures and the chainable fixture builder.
//!
//! A fixture type implements [`RequestFixture`] to declare the baseline
//! payload. Tests wrap it in a [`FixtureBuilder`], layer `state` patches and
//! `without` omissions on top, and resolve it into a [`ResolvedPayload`].
//!
//! Resolution precedence, highest first:
//!
//! 1. request data passed to [`FixtureBuilder::resolve`] or [`FixtureBuilder::create`]
//! 2. `state` patches, later calls winning
//! 3. the fixture's definition and files
//!
//! Omissions are applied last and remove a path whichever layer set it.
//! A field replaced by a higher layer is never resolved, so a generator it
//! held never runs.
//!
//! # Example
//!
//! ```
//! use reinhardt_fixture_builder::{Definition, Faker, RequestFixture};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct SignupFixture;
//!
//! impl RequestFixture for SignupFixture {
//!     fn definition(&self, _faker: &mut Faker) -> Definition {
//!         Definition::new()
//!             .set("name", "Luke Downing")
//!             .set("email", "foo@bar.com")
//!     }
//! }
//!
//! let data = SignupFixture::factory()
//!     .state(json!({"name": "Oliver Nybroe", "email": "oliver@worksome.com"}))
//!     .create(json!({"email": "luke@worksome.com"}))
//!     .unwrap();
//! assert_eq!(data["name"], json!("Oliver Nybroe"));
//! assert_eq!(data["email"], json!("luke@worksome.com"));
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::definition::{Definition, IntoPaths};
use crate::error::{FixtureError, FixtureResult};
use crate::faker::Faker;
use crate::files::{FileAttachments, Files};
use crate::locator::RequestTarget;
use crate::path::DotPath;
use crate::registry::FakeRegistry;
use crate::resolver::{self, Siblings};
use crate::tree::{self, Branch, Origin};
use crate::value::FieldValue;

/// A fixture type declaring the default payload for one kind of request.
pub trait RequestFixture: Send + Sync + 'static {
	/// Returns the baseline fields.
	///
	/// Called once per resolution; it must not keep state between calls.
	fn definition(&self, faker: &mut Faker) -> Definition;

	/// Returns baseline file attachments.
	fn files(&self) -> FileAttachments {
		FileAttachments::new()
	}

	/// Starts a builder from the default fixture value.
	fn factory() -> FixtureBuilder<Self>
	where
		Self: Default + Sized,
	{
		FixtureBuilder::new(Self::default())
	}

	/// Starts a builder from this fixture value.
	fn builder(self) -> FixtureBuilder<Self>
	where
		Self: Sized,
	{
		FixtureBuilder::new(self)
	}
}

type StateFn = dyn Fn(&Siblings<'_>) -> FixtureResult<Definition> + Send + Sync;

#[derive(Clone)]
enum Layer {
	Patch(Definition),
	Computed(Arc<StateFn>),
}

/// Chainable builder over a [`RequestFixture`].
///
/// Chained calls take `self` by value; cloning a builder gives an
/// independent copy, so a shared base can be specialised per test.
pub struct FixtureBuilder<F> {
	fixture: Arc<F>,
	layers: Vec<Layer>,
	omissions: Vec<String>,
	strict: bool,
	seed: Option<u64>,
}

impl<F> Clone for FixtureBuilder<F> {
	fn clone(&self) -> Self {
		Self {
			fixture: Arc::clone(&self.fixture),
			layers: self.layers.clone(),
			omissions: self.omissions.clone(),
			strict: self.strict,
			seed: self.seed,
		}
	}
}

impl<F> fmt::Debug for FixtureBuilder<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FixtureBuilder")
			.field("fixture", &std::any::type_name::<F>())
			.field("layers", &self.layers.len())
			.field("omissions", &self.omissions)
			.field("strict", &self.strict)
			.field("seed", &self.seed)
			.finish()
	}
}

impl<F: RequestFixture> FixtureBuilder<F> {
	/// Wraps a fixture value.
	pub fn new(fixture: F) -> Self {
		Self {
			fixture: Arc::new(fixture),
			layers: Vec::new(),
			omissions: Vec::new(),
			strict: false,
			seed: None,
		}
	}

	/// Returns the wrapped fixture.
	pub fn fixture(&self) -> &F {
		&self.fixture
	}

	/// Records an override. Keys may use dot notation.
	pub fn state(mut self, patch: impl Into<Definition>) -> Self {
		self.layers.push(Layer::Patch(patch.into()));
		self
	}

	/// Records an override computed from the data resolved so far.
	///
	/// The closure reads the definition, earlier states and request data
	/// through a [`Siblings`] view. Only the fields it reads are resolved,
	/// and they resolve to the values the final payload carries. Request data
	/// still wins over the returned patch.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::{Definition, Faker, RequestFixture};
	/// use serde_json::json;
	///
	/// #[derive(Default)]
	/// struct PasswordFixture;
	///
	/// impl RequestFixture for PasswordFixture {
	///     fn definition(&self, _faker: &mut Faker) -> Definition {
	///         Definition::new().set("password", "secret")
	///     }
	/// }
	///
	/// let data = PasswordFixture::factory()
	///     .state_with(|current| Ok(Definition::new().set("password_confirmation", current.value("password")?)))
	///     .create(json!({}))
	///     .unwrap();
	/// assert_eq!(data["password_confirmation"], json!("secret"));
	/// ```
	pub fn state_with<S>(mut self, state: S) -> Self
	where
		S: Fn(&Siblings<'_>) -> FixtureResult<Definition> + Send + Sync + 'static,
	{
		self.layers.push(Layer::Computed(Arc::new(state)));
		self
	}

	/// Records paths to delete from the final payload.
	pub fn without(mut self, paths: impl IntoPaths) -> Self {
		self.omissions.extend(paths.into_paths());
		self
	}

	/// Rejects `state` and `without` paths that do not address an existing field.
	pub fn strict(mut self) -> Self {
		self.strict = true;
		self
	}

	/// Makes fake data reproducible.
	pub fn seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Resolves data and files. `request_data` has the highest precedence.
	pub fn resolve(&self, request_data: impl Into<Definition>) -> FixtureResult<ResolvedPayload> {
		let overlay = Overlay::from_request(request_data.into())?;
		self.resolve_layered(overlay, self.seed)
	}

	/// Resolves and returns the request data only.
	pub fn create(&self, request_data: impl Into<Definition>) -> FixtureResult<Map<String, Value>> {
		Ok(self.resolve(request_data)?.data)
	}

	/// Resolves with no request data and registers the payload as the fake
	/// for target `T`, replacing any previous fake.
	pub fn fake<T: RequestTarget>(&self, registry: &FakeRegistry) -> FixtureResult<()> {
		let payload = self.resolve(Definition::new())?;
		registry.insert::<T>(payload);
		Ok(())
	}

	/// Type-erases this builder so it can be nested or registered.
	pub fn erase(self) -> NestedFixture {
		NestedFixture(Arc::new(self))
	}

	fn resolve_layered(&self, overlay: Overlay, seed: Option<u64>) -> FixtureResult<ResolvedPayload> {
		let name = std::any::type_name::<F>();
		let Overlay {
			branch: overlay,
			mut ancestors,
		} = overlay;
		ancestors.push(name);
		let mut faker = match seed {
			Some(seed) => Faker::seeded(seed),
			None => Faker::new(),
		};

		let mut pending = Branch::new();
		tree::apply(&mut pending, self.fixture.definition(&mut faker), false)?;
		let mut files = Definition::new();
		for (path, file) in self.fixture.files().into_entries() {
			files.insert(path, FieldValue::File(file));
		}
		tree::apply(&mut pending, files, false)?;

		let mut seeded = seed.map(|_| faker);
		for (index, layer) in self.layers.iter().enumerate() {
			let patch = match layer {
				Layer::Patch(patch) => patch.clone(),
				Layer::Computed(state) => {
					// Request data is merged in so nothing it replaces resolves.
					let mut snapshot = pending.clone();
					tree::merge_branch(&mut snapshot, overlay.clone(), Origin::Request);
					let child_faker = seeded.as_mut().map(|f| Faker::seeded(f.next_seed()));
					resolver::inspect_tree(snapshot, child_faker, ancestors.clone(), |current| {
						state(current)
					})?
				}
			};
			tree::apply_as(&mut pending, patch, self.strict, Origin::State(index))?;
		}

		tree::merge_branch(&mut pending, overlay, Origin::Request);

		let (mut data, mut files) = resolver::resolve_tree(pending, seeded, ancestors)?;
		for omission in &self.omissions {
			let path = DotPath::parse(omission)?;
			let removed_data = remove_path(&mut data, &path);
			let removed_file = files.remove(&path);
			if self.strict && !removed_data && !removed_file {
				return Err(FixtureError::UnresolvableReference {
					path: path.to_string(),
				});
			}
		}

		tracing::debug!(
			fixture = name,
			fields = data.len(),
			files = files.len(),
			"resolved fixture"
		);
		Ok(ResolvedPayload { data, files })
	}
}

fn remove_path(data: &mut Map<String, Value>, path: &DotPath) -> bool {
	let mut current = data;
	for segment in path.parents() {
		match current.get_mut(segment) {
			Some(Value::Object(inner)) => current = inner,
			_ => return false,
		}
	}
	current.remove(path.leaf()).is_some()
}

/// Opaque overlay handed to a nested fixture: the parent's patches that
/// reach into the nested field, and the fixtures it is nested in.
#[doc(hidden)]
pub struct Overlay {
	branch: Branch,
	ancestors: Vec<&'static str>,
}

impl Overlay {
	pub(crate) fn new(branch: Branch, ancestors: Vec<&'static str>) -> Self {
		Self { branch, ancestors }
	}

	fn from_request(request_data: Definition) -> FixtureResult<Self> {
		let mut branch = Branch::new();
		tree::apply(&mut branch, request_data, false)?;
		Ok(Self::new(branch, Vec::new()))
	}
}

/// Object-safe view of a [`FixtureBuilder`], used for nesting and lookup.
pub trait ErasedFixture: Send + Sync {
	/// Type name of the underlying fixture.
	fn fixture_name(&self) -> &'static str;

	/// Resolves with `overlay` as the highest layer.
	#[doc(hidden)]
	fn resolve_overlay(&self, overlay: Overlay, seed: Option<u64>) -> FixtureResult<ResolvedPayload>;
}

impl<F: RequestFixture> ErasedFixture for FixtureBuilder<F> {
	fn fixture_name(&self) -> &'static str {
		std::any::type_name::<F>()
	}

	fn resolve_overlay(&self, overlay: Overlay, seed: Option<u64>) -> FixtureResult<ResolvedPayload> {
		self.resolve_layered(overlay, self.seed.or(seed))
	}
}

/// A type-erased fixture builder.
#[derive(Clone)]
pub struct NestedFixture(Arc<dyn ErasedFixture>);

impl NestedFixture {
	/// Type name of the underlying fixture.
	pub fn name(&self) -> &'static str {
		self.0.fixture_name()
	}

	/// Resolves with `request_data` as the highest layer.
	pub fn resolve(&self, request_data: impl Into<Definition>) -> FixtureResult<ResolvedPayload> {
		self.0.resolve_overlay(Overlay::from_request(request_data.into())?, None)
	}

	/// Resolves with no request data and registers the payload as the fake
	/// for target `T`.
	pub fn fake<T: RequestTarget>(&self, registry: &FakeRegistry) -> FixtureResult<()> {
		let payload = self.resolve(Definition::new())?;
		registry.insert::<T>(payload);
		Ok(())
	}

	pub(crate) fn resolve_overlay(&self, overlay: Overlay, seed: Option<u64>) -> FixtureResult<ResolvedPayload> {
		self.0.resolve_overlay(overlay, seed)
	}
}

impl<F: RequestFixture> From<FixtureBuilder<F>> for NestedFixture {
	fn from(builder: FixtureBuilder<F>) -> Self {
		builder.erase()
	}
}

impl fmt::Debug for NestedFixture {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("NestedFixture").field(&self.name()).finish()
	}
}

/// The fully resolved payload: request data plus files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPayload {
	data: Map<String, Value>,
	files: Files,
}

impl ResolvedPayload {
	/// Builds a payload from parts.
	pub fn new(data: Map<String, Value>, files: Files) -> Self {
		Self { data, files }
	}

	/// Returns the request data.
	pub fn data(&self) -> &Map<String, Value> {
		&self.data
	}

	/// Returns the files.
	pub fn files(&self) -> &Files {
		&self.files
	}

	/// Splits the payload into data and files.
	pub fn into_parts(self) -> (Map<String, Value>, Files) {
		(self.data, self.files)
	}

	/// Overlays explicit request data and files; the explicit values win and
	/// nested mappings merge key by key.
	///
	/// Dot-path keys in `data` are expanded the same way request data passed
	/// to [`FixtureBuilder::resolve`] is.
	pub fn merged_with(mut self, data: Map<String, Value>, files: Files) -> FixtureResult<Self> {
		deep_merge(&mut self.data, expand_paths(data)?);
		self.files.merge(files);
		Ok(self)
	}
}

fn expand_paths(data: Map<String, Value>) -> FixtureResult<Map<String, Value>> {
	if !data.keys().any(|key| key.contains('.')) {
		return Ok(data);
	}
	let mut branch = Branch::new();
	tree::apply(&mut branch, Definition::from(data), false)?;
	let (data, _) = resolver::resolve_tree(branch, None, Vec::new())?;
	Ok(data)
}

fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
	for (key, value) in overlay {
		match (base.get_mut(&key), value) {
			(Some(Value::Object(mine)), Value::Object(theirs)) => deep_merge(mine, theirs),
			(_, value) => {
				base.insert(key, value);
			}
		}
	}
}
