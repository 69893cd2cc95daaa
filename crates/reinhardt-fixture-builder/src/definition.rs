//! Definitions and partial mappings.
//!
//! The same [`Definition`] type carries a fixture's baseline, each `state`
//! patch and the request data handed to a terminal operation. Top-level keys
//! may use dot notation.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::value::FieldValue;

/// An ordered mapping from (dot-path) keys to field values.
#[derive(Debug, Clone, Default)]
pub struct Definition {
	entries: IndexMap<String, FieldValue>,
	rejected: Option<String>,
}

impl Definition {
	/// Creates an empty definition.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key` to `value`, replacing a previous entry with the same key.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::Definition;
	///
	/// let definition = Definition::new()
	///     .set("name", "Luke Downing")
	///     .set("address.postcode", "NR1 1AA");
	/// assert_eq!(definition.len(), 2);
	/// ```
	pub fn set(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.insert(key, value);
		self
	}

	/// In-place variant of [`Definition::set`].
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
		self.entries.insert(key.into(), value.into());
	}

	/// Appends every entry of `other`; entries of `other` win.
	pub fn extend(&mut self, other: Definition) {
		if self.rejected.is_none() {
			self.rejected = other.rejected;
		}
		self.entries.extend(other.entries);
	}

	/// Returns the value stored under `key` exactly as written.
	pub fn get(&self, key: &str) -> Option<&FieldValue> {
		self.entries.get(key)
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if there are no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates over keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.entries.keys()
	}

	// Description of a non-mapping value this definition was built from.
	pub(crate) fn rejected(&self) -> Option<&str> {
		self.rejected.as_deref()
	}

	pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, FieldValue)> {
		self.entries.into_iter()
	}
}

impl From<Map<String, Value>> for Definition {
	fn from(map: Map<String, Value>) -> Self {
		Self {
			entries: map
				.into_iter()
				.map(|(key, value)| (key, FieldValue::Literal(value)))
				.collect(),
			rejected: None,
		}
	}
}

/// Objects become entries and `null` an empty definition. Any other value
/// yields a definition that fails with `InvalidPatch` once it is applied.
impl From<Value> for Definition {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => map.into(),
			Value::Null => Definition::new(),
			other => Definition {
				entries: IndexMap::new(),
				rejected: Some(describe(&other)),
			},
		}
	}
}

impl<K, V> FromIterator<(K, V)> for Definition
where
	K: Into<String>,
	V: Into<FieldValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut definition = Definition::new();
		for (key, value) in iter {
			definition.insert(key, value);
		}
		definition
	}
}

fn describe(value: &Value) -> String {
	match value {
		Value::Null => "null".to_string(),
		Value::Bool(_) => "a boolean".to_string(),
		Value::Number(_) => "a number".to_string(),
		Value::String(_) => "a string".to_string(),
		Value::Array(_) => "an array".to_string(),
		Value::Object(_) => "an object".to_string(),
	}
}

/// Conversion into a list of dot-paths for `without`.
pub trait IntoPaths {
	/// Returns the paths.
	fn into_paths(self) -> Vec<String>;
}

impl IntoPaths for &str {
	fn into_paths(self) -> Vec<String> {
		vec![self.to_string()]
	}
}

impl IntoPaths for String {
	fn into_paths(self) -> Vec<String> {
		vec![self]
	}
}

impl IntoPaths for Vec<String> {
	fn into_paths(self) -> Vec<String> {
		self
	}
}

impl IntoPaths for Vec<&str> {
	fn into_paths(self) -> Vec<String> {
		self.into_iter().map(str::to_string).collect()
	}
}

impl IntoPaths for &[&str] {
	fn into_paths(self) -> Vec<String> {
		self.iter().map(|p| p.to_string()).collect()
	}
}

impl<const N: usize> IntoPaths for [&str; N] {
	fn into_paths(self) -> Vec<String> {
		self.iter().map(|p| p.to_string()).collect()
	}
}
