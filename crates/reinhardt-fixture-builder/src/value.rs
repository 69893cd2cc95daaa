//! Field values of a fixture definition.
//!
//! A [`FieldValue`] is what a definition, a `state` patch or a request
//! payload holds for one key before resolution. Only literals survive
//! resolution; every other variant is replaced by the value it produces.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::FixtureResult;
use crate::files::UploadedFile;
use crate::fixture::{FixtureBuilder, NestedFixture, RequestFixture};
use crate::resolver::Siblings;

/// Deferred computation over the already resolved sibling fields.
pub type LazyFn = dyn Fn(&Siblings<'_>) -> FixtureResult<Value> + Send + Sync;

/// A lazily resolved field.
#[derive(Clone)]
pub struct LazyResolver(Arc<LazyFn>);

impl LazyResolver {
	/// Wraps a closure receiving the sibling fields.
	pub fn new<F>(resolver: F) -> Self
	where
		F: Fn(&Siblings<'_>) -> FixtureResult<Value> + Send + Sync + 'static,
	{
		Self(Arc::new(resolver))
	}

	pub(crate) fn call(&self, siblings: &Siblings<'_>) -> FixtureResult<Value> {
		(self.0)(siblings)
	}
}

impl fmt::Debug for LazyResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("LazyResolver(..)")
	}
}

/// A side-effecting value source, such as a persisted model factory.
///
/// Generators run while the fixture resolves, at most once per resolution,
/// and never when a higher layer replaced the field they occupy.
pub trait ValueGenerator: Send + Sync {
	/// Produces the field value, e.g. the primary key of a created record.
	fn generate(&self) -> FixtureResult<Value>;

	/// Short description used in logs.
	fn describe(&self) -> &str {
		"generator"
	}
}

struct FnGenerator<F> {
	generate: F,
}

impl<F> ValueGenerator for FnGenerator<F>
where
	F: Fn() -> FixtureResult<Value> + Send + Sync,
{
	fn generate(&self) -> FixtureResult<Value> {
		(self.generate)()
	}
}

/// One entry of a definition before resolution.
#[derive(Clone)]
pub enum FieldValue {
	/// A plain JSON value. Objects take part in deep merging.
	Literal(Value),
	/// A value computed from sibling fields at resolution time.
	Lazy(LazyResolver),
	/// Another fixture resolved recursively into this field.
	Nested(NestedFixture),
	/// A side-effecting value source.
	Generator(Arc<dyn ValueGenerator>),
	/// A file attachment, routed to the files mapping.
	File(UploadedFile),
}

impl fmt::Debug for FieldValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
			FieldValue::Lazy(_) => f.write_str("Lazy(..)"),
			FieldValue::Nested(nested) => f.debug_tuple("Nested").field(&nested.name()).finish(),
			FieldValue::Generator(generator) => {
				f.debug_tuple("Generator").field(&generator.describe()).finish()
			}
			FieldValue::File(file) => f.debug_tuple("File").field(&file.file_name()).finish(),
		}
	}
}

/// Creates a lazy field from a closure over its siblings.
///
/// # Examples
///
/// ```
/// use reinhardt_fixture_builder::{lazy, Definition};
/// use serde_json::json;
///
/// let definition = Definition::new()
///     .set("first_name", "Luke")
///     .set("greeting", lazy(|s| Ok(json!(format!("Hello {}", s.str("first_name")?)))));
/// assert_eq!(definition.len(), 2);
/// ```
pub fn lazy<F>(resolver: F) -> FieldValue
where
	F: Fn(&Siblings<'_>) -> FixtureResult<Value> + Send + Sync + 'static,
{
	FieldValue::Lazy(LazyResolver::new(resolver))
}

/// Creates a generator field from a closure.
pub fn generator<F>(generate: F) -> FieldValue
where
	F: Fn() -> FixtureResult<Value> + Send + Sync + 'static,
{
	FieldValue::Generator(Arc::new(FnGenerator { generate }))
}

/// Embeds another fixture builder as a field.
pub fn nested<F: RequestFixture>(builder: FixtureBuilder<F>) -> FieldValue {
	FieldValue::Nested(builder.erase())
}

impl From<Value> for FieldValue {
	fn from(value: Value) -> Self {
		FieldValue::Literal(value)
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::Literal(Value::String(value.to_string()))
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::Literal(Value::String(value))
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Literal(Value::Bool(value))
	}
}

impl From<i32> for FieldValue {
	fn from(value: i32) -> Self {
		FieldValue::Literal(Value::from(value))
	}
}

impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		FieldValue::Literal(Value::from(value))
	}
}

impl From<u64> for FieldValue {
	fn from(value: u64) -> Self {
		FieldValue::Literal(Value::from(value))
	}
}

impl From<f64> for FieldValue {
	fn from(value: f64) -> Self {
		FieldValue::Literal(Value::from(value))
	}
}

impl From<UploadedFile> for FieldValue {
	fn from(file: UploadedFile) -> Self {
		FieldValue::File(file)
	}
}

impl From<NestedFixture> for FieldValue {
	fn from(nested: NestedFixture) -> Self {
		FieldValue::Nested(nested)
	}
}

impl<F: RequestFixture> From<FixtureBuilder<F>> for FieldValue {
	fn from(builder: FixtureBuilder<F>) -> Self {
		nested(builder)
	}
}
