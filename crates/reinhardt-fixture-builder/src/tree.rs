//! Pending tree built from layered definitions.
//!
//! Layers are applied lowest precedence first. Mappings merge key by key,
//! mappings applied onto a nested fixture accumulate in that fixture's
//! overlay, and everything else replaces what was there.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use once_cell::unsync::OnceCell;
use serde_json::Value;

use crate::definition::Definition;
use crate::error::{FixtureError, FixtureResult};
use crate::files::UploadedFile;
use crate::fixture::{NestedFixture, ResolvedPayload};
use crate::path::DotPath;
use crate::value::{FieldValue, LazyResolver, ValueGenerator};

pub(crate) type Branch = IndexMap<String, Node>;

/// A generator shared between snapshots of the same resolution.
#[derive(Clone)]
pub(crate) struct Generated {
	generator: Arc<dyn ValueGenerator>,
	cache: Rc<OnceCell<Value>>,
}

impl Generated {
	fn new(generator: Arc<dyn ValueGenerator>) -> Self {
		Self {
			generator,
			cache: Rc::new(OnceCell::new()),
		}
	}

	pub(crate) fn value(&self) -> FixtureResult<Value> {
		self.cache
			.get_or_try_init(|| {
				tracing::debug!(generator = self.generator.describe(), "running generator");
				self.generator.generate()
			})
			.cloned()
	}
}

/// Layer a patch was applied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Origin {
	Base,
	State(usize),
	Request,
}

/// Resolutions of one nested fixture, shared between snapshots of the same
/// resolution and keyed by the layers that reached into its overlay.
#[derive(Default)]
struct NestedMemo {
	seed: Cell<Option<u64>>,
	resolved: RefCell<HashMap<Vec<Origin>, ResolvedPayload>>,
}

#[derive(Clone)]
pub(crate) struct NestedNode {
	pub(crate) fixture: NestedFixture,
	pub(crate) overlay: Branch,
	revision: Vec<Origin>,
	memo: Rc<NestedMemo>,
}

impl NestedNode {
	fn new(fixture: NestedFixture) -> Self {
		Self {
			fixture,
			overlay: Branch::new(),
			revision: Vec::new(),
			memo: Rc::new(NestedMemo::default()),
		}
	}

	fn overlay_mut(&mut self, origin: Origin) -> &mut Branch {
		if self.revision.last() != Some(&origin) {
			self.revision.push(origin);
		}
		&mut self.overlay
	}

	/// Seed of this fixture, drawn once and reused by every snapshot.
	pub(crate) fn seed(&self, draw: impl FnOnce() -> u64) -> u64 {
		if let Some(seed) = self.memo.seed.get() {
			return seed;
		}
		let seed = draw();
		self.memo.seed.set(Some(seed));
		seed
	}

	/// Payload resolved earlier for the same overlay, if any.
	pub(crate) fn cached(&self) -> Option<ResolvedPayload> {
		self.memo.resolved.borrow().get(&self.revision).cloned()
	}

	pub(crate) fn remember(&self, payload: &ResolvedPayload) {
		self.memo
			.resolved
			.borrow_mut()
			.insert(self.revision.clone(), payload.clone());
	}
}

#[derive(Clone)]
pub(crate) enum Node {
	// Never an object; objects become `Map`.
	Literal(Value),
	Map(Branch),
	Lazy(LazyResolver),
	Nested(NestedNode),
	Generator(Generated),
	File(UploadedFile),
}

impl Node {
	pub(crate) fn from_field(value: FieldValue) -> Self {
		match value {
			FieldValue::Literal(value) => Node::from_literal(value),
			FieldValue::Lazy(lazy) => Node::Lazy(lazy),
			FieldValue::Nested(fixture) => Node::Nested(NestedNode::new(fixture)),
			FieldValue::Generator(generator) => Node::Generator(Generated::new(generator)),
			FieldValue::File(file) => Node::File(file),
		}
	}

	fn from_literal(value: Value) -> Self {
		match value {
			Value::Object(map) => Node::Map(
				map.into_iter()
					.map(|(key, value)| (key, Node::from_literal(value)))
					.collect(),
			),
			other => Node::Literal(other),
		}
	}

	fn is_container(&self) -> bool {
		matches!(self, Node::Map(_) | Node::Nested(_))
	}

	fn container_mut(&mut self, origin: Origin) -> Option<&mut Branch> {
		match self {
			Node::Map(branch) => Some(branch),
			Node::Nested(nested) => Some(nested.overlay_mut(origin)),
			_ => None,
		}
	}
}

/// Applies a definition onto `branch`, expanding dot-path keys.
pub(crate) fn apply(branch: &mut Branch, definition: Definition, strict: bool) -> FixtureResult<()> {
	apply_as(branch, definition, strict, Origin::Base)
}

/// Like [`apply`], recording `origin` on every nested fixture it patches.
pub(crate) fn apply_as(
	branch: &mut Branch,
	definition: Definition,
	strict: bool,
	origin: Origin,
) -> FixtureResult<()> {
	if let Some(kind) = definition.rejected() {
		return Err(FixtureError::InvalidPatch(kind.to_string()));
	}
	for (key, value) in definition.into_entries() {
		let path = DotPath::parse(&key)?;
		set_path(branch, &path, Node::from_field(value), strict, origin)?;
	}
	Ok(())
}

/// Merges every entry of `other` onto `branch`.
pub(crate) fn merge_branch(branch: &mut Branch, other: Branch, origin: Origin) {
	for (key, node) in other {
		merge_into(branch, key, node, origin);
	}
}

fn set_path(
	branch: &mut Branch,
	path: &DotPath,
	node: Node,
	strict: bool,
	origin: Origin,
) -> FixtureResult<()> {
	let unresolvable = || FixtureError::UnresolvableReference {
		path: path.to_string(),
	};
	let mut current = branch;
	for segment in path.parents() {
		let slot = match current.entry(segment.clone()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(_) if strict => return Err(unresolvable()),
			Entry::Vacant(entry) => entry.insert(Node::Map(Branch::new())),
		};
		if !slot.is_container() {
			if strict {
				return Err(unresolvable());
			}
			*slot = Node::Map(Branch::new());
		}
		current = slot.container_mut(origin).ok_or_else(unresolvable)?;
	}
	merge_into(current, path.leaf().to_string(), node, origin);
	Ok(())
}

fn merge_into(branch: &mut Branch, key: String, node: Node, origin: Origin) {
	match branch.get_mut(&key) {
		Some(existing) => merge_node(existing, node, origin),
		None => {
			branch.insert(key, node);
		}
	}
}

fn merge_node(existing: &mut Node, incoming: Node, origin: Origin) {
	match (existing, incoming) {
		(Node::Map(mine), Node::Map(theirs)) => merge_branch(mine, theirs, origin),
		(Node::Nested(nested), Node::Map(theirs)) => {
			merge_branch(nested.overlay_mut(origin), theirs, origin)
		}
		(slot, incoming) => *slot = incoming,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn literal(branch: &Branch, path: &[&str]) -> Option<Value> {
		let (leaf, parents) = path.split_last()?;
		let mut current = branch;
		for segment in parents {
			match current.get(*segment)? {
				Node::Map(inner) => current = inner,
				_ => return None,
			}
		}
		match current.get(*leaf)? {
			Node::Literal(value) => Some(value.clone()),
			_ => None,
		}
	}

	fn base() -> Branch {
		let mut branch = Branch::new();
		apply(
			&mut branch,
			Definition::from(json!({
				"name": "Luke",
				"address": {"line_one": "1 Road", "postcode": "AB1"},
				"tags": ["a", "b"],
			})),
			false,
		)
		.unwrap();
		branch
	}

	#[rstest]
	fn test_dot_path_preserves_siblings() {
		let mut branch = base();
		apply(
			&mut branch,
			Definition::new().set("address.line_one", "X"),
			false,
		)
		.unwrap();
		assert_eq!(literal(&branch, &["address", "line_one"]), Some(json!("X")));
		assert_eq!(literal(&branch, &["address", "postcode"]), Some(json!("AB1")));
	}

	#[rstest]
	fn test_objects_deep_merge_and_arrays_replace() {
		let mut branch = base();
		apply(
			&mut branch,
			Definition::from(json!({"address": {"postcode": "ZZ9"}, "tags": ["c"]})),
			false,
		)
		.unwrap();
		assert_eq!(literal(&branch, &["address", "line_one"]), Some(json!("1 Road")));
		assert_eq!(literal(&branch, &["address", "postcode"]), Some(json!("ZZ9")));
		assert_eq!(literal(&branch, &["tags"]), Some(json!(["c"])));
	}

	#[rstest]
	fn test_permissive_mode_replaces_scalars_with_mappings() {
		let mut branch = base();
		apply(&mut branch, Definition::new().set("name.first", "Luke"), false).unwrap();
		assert_eq!(literal(&branch, &["name", "first"]), Some(json!("Luke")));
	}

	#[rstest]
	#[case("missing.key")]
	#[case("name.first")]
	fn test_strict_mode_rejects_unaddressable_parents(#[case] path: &str) {
		let mut branch = base();
		let error = apply(&mut branch, Definition::new().set(path, 1), true).unwrap_err();
		assert!(matches!(error, FixtureError::UnresolvableReference { path: p } if p == path));
	}

	#[rstest]
	fn test_strict_mode_allows_new_leaves() {
		let mut branch = base();
		apply(&mut branch, Definition::new().set("address.city", "Norwich"), true).unwrap();
		assert_eq!(literal(&branch, &["address", "city"]), Some(json!("Norwich")));
	}

	#[rstest]
	fn test_rejected_definition_is_invalid_patch() {
		let mut branch = Branch::new();
		let error = apply(&mut branch, Definition::from(json!("nope")), false).unwrap_err();
		assert!(matches!(error, FixtureError::InvalidPatch(_)));
	}

	#[rstest]
	fn test_malformed_key_is_rejected() {
		let mut branch = Branch::new();
		let error = apply(&mut branch, Definition::new().set("a..b", 1), false).unwrap_err();
		assert!(matches!(error, FixtureError::MalformedPath { .. }));
	}
}
