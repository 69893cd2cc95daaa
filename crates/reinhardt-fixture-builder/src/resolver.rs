//! Dependency-ordered resolution of a pending tree.
//!
//! Every level of the tree resolves left to right in insertion order. A lazy
//! field that reads a sibling resolves that sibling first, on demand. Each
//! field is resolved at most once; a field found in progress while it is
//! being resolved means the lazy fields form a cycle. A field that failed
//! keeps its error, so every later read reports the same failure.

use std::cell::RefCell;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{FixtureError, FixtureResult};
use crate::faker::Faker;
use crate::files::{FileNode, Files, UploadedFile};
use crate::fixture::Overlay;
use crate::path::{self, DotPath};
use crate::tree::{Branch, NestedNode, Node};

/// How often one fixture type may appear among the fixtures a nested
/// fixture sits in before the nesting counts as endless.
const MAX_NESTED_REPEATS: usize = 8;

#[derive(Clone)]
enum Resolved {
	Data(Value),
	File(UploadedFile),
	Branch { data: Map<String, Value>, files: Files },
}

impl Resolved {
	fn data(self) -> Option<Value> {
		match self {
			Resolved::Data(value) => Some(value),
			Resolved::Branch { data, .. } => Some(Value::Object(data)),
			Resolved::File(_) => None,
		}
	}
}

enum Slot {
	Pending(Node),
	InProgress,
	Done(Resolved),
	Failed(FixtureError),
}

/// Resolves a whole tree into request data and files.
///
/// `ancestors` names the fixtures being resolved, outermost first; the
/// fixture owning `tree` comes last.
pub(crate) fn resolve_tree(
	tree: Branch,
	faker: Option<Faker>,
	ancestors: Vec<&'static str>,
) -> FixtureResult<(Map<String, Value>, Files)> {
	let resolver = Resolver::new(faker, ancestors);
	resolver.resolve_branch(tree, "")
}

/// Hands `read` a view over the root of `tree` that resolves only the fields
/// it reads.
pub(crate) fn inspect_tree<R>(
	tree: Branch,
	faker: Option<Faker>,
	ancestors: Vec<&'static str>,
	read: impl FnOnce(&Siblings<'_>) -> FixtureResult<R>,
) -> FixtureResult<R> {
	let resolver = Resolver::new(faker, ancestors);
	let level = resolver.level(tree, "");
	let out = read(&Siblings {
		level: &level,
		current: "",
	})?;
	if let Some(error) = level.cycle.borrow_mut().take() {
		return Err(error);
	}
	Ok(out)
}

struct Resolver {
	// Seeded parent faker, used to derive seeds for nested fixtures.
	faker: RefCell<Option<Faker>>,
	ancestors: Vec<&'static str>,
}

impl Resolver {
	fn new(faker: Option<Faker>, ancestors: Vec<&'static str>) -> Self {
		Self {
			faker: RefCell::new(faker),
			ancestors,
		}
	}

	fn level(&self, branch: Branch, scope: &str) -> Level<'_> {
		Level {
			scope: scope.to_string(),
			slots: RefCell::new(
				branch
					.into_iter()
					.map(|(key, node)| (key, Slot::Pending(node)))
					.collect(),
			),
			stack: RefCell::new(Vec::new()),
			cycle: RefCell::new(None),
			resolver: self,
		}
	}

	fn resolve_branch(&self, branch: Branch, scope: &str) -> FixtureResult<(Map<String, Value>, Files)> {
		let keys: Vec<String> = branch.keys().cloned().collect();
		let level = self.level(branch, scope);
		for key in &keys {
			level.resolve_key(key)?;
		}
		// A resolver may have swallowed the cycle error; it still fails.
		if let Some(error) = level.cycle.borrow_mut().take() {
			return Err(error);
		}

		let mut data = Map::new();
		let mut files = Files::new();
		for (key, slot) in level.slots.into_inner() {
			match slot {
				Slot::Done(Resolved::Data(value)) => {
					data.insert(key, value);
				}
				Slot::Done(Resolved::File(file)) => files.insert_node(key, FileNode::File(file)),
				Slot::Done(Resolved::Branch {
					data: inner_data,
					files: inner_files,
				}) => {
					// A mapping holding only files does not show up in the data.
					if !inner_data.is_empty() || inner_files.is_empty() {
						data.insert(key.clone(), Value::Object(inner_data));
					}
					if !inner_files.is_empty() {
						files.insert_node(key, FileNode::Map(inner_files));
					}
				}
				// Every key was resolved above.
				Slot::Pending(_) | Slot::InProgress | Slot::Failed(_) => {}
			}
		}
		Ok((data, files))
	}

	fn resolve_nested(&self, path: &str, nested: NestedNode) -> FixtureResult<Value> {
		let name = nested.fixture.name();
		let repeats = self.ancestors.iter().filter(|ancestor| **ancestor == name).count();
		if repeats >= MAX_NESTED_REPEATS {
			let start = self
				.ancestors
				.iter()
				.rposition(|ancestor| *ancestor == name)
				.unwrap_or(0);
			let mut chain: Vec<String> = self.ancestors[start..].iter().map(|n| n.to_string()).collect();
			chain.push(name.to_string());
			return Err(FixtureError::CircularNestedFixture {
				path: path.to_string(),
				chain,
			});
		}

		let payload = match nested.cached() {
			Some(payload) => payload,
			None => {
				tracing::trace!(%path, fixture = name, "resolving nested fixture");
				let seed = nested.seed(|| self.child_seed().unwrap_or_else(rand::random));
				let overlay = Overlay::new(nested.overlay.clone(), self.ancestors.clone());
				let payload = nested
					.fixture
					.resolve_overlay(overlay, Some(seed))
					.map_err(|e| e.nested_under(path))?;
				nested.remember(&payload);
				payload
			}
		};
		let (data, files) = payload.into_parts();
		if !files.is_empty() {
			tracing::debug!(%path, count = files.len(), "dropping files of nested fixture");
		}
		Ok(Value::Object(data))
	}

	fn child_seed(&self) -> Option<u64> {
		self.faker.borrow_mut().as_mut().map(Faker::next_seed)
	}
}

struct Level<'r> {
	scope: String,
	slots: RefCell<IndexMap<String, Slot>>,
	stack: RefCell<Vec<String>>,
	cycle: RefCell<Option<FixtureError>>,
	resolver: &'r Resolver,
}

impl Level<'_> {
	fn resolve_key(&self, key: &str) -> FixtureResult<Option<Resolved>> {
		let node = {
			let mut slots = self.slots.borrow_mut();
			let Some(slot) = slots.get_mut(key) else {
				return Ok(None);
			};
			match slot {
				Slot::Done(resolved) => return Ok(Some(resolved.clone())),
				Slot::Failed(error) => return Err(error.clone()),
				Slot::InProgress => return Err(self.cycle_error(key)),
				Slot::Pending(_) => {}
			}
			match std::mem::replace(slot, Slot::InProgress) {
				Slot::Pending(node) => node,
				_ => return Ok(None),
			}
		};

		self.stack.borrow_mut().push(key.to_string());
		let result = self.resolve_node(key, node);
		self.stack.borrow_mut().pop();

		let slot = match &result {
			Ok(resolved) => Slot::Done(resolved.clone()),
			Err(error) => Slot::Failed(error.clone()),
		};
		self.slots.borrow_mut().insert(key.to_string(), slot);
		result.map(Some)
	}

	fn resolve_node(&self, key: &str, node: Node) -> FixtureResult<Resolved> {
		let path = path::join(&self.scope, key);
		match node {
			Node::Literal(value) => Ok(Resolved::Data(value)),
			Node::File(file) => Ok(Resolved::File(file)),
			Node::Map(branch) => {
				let (data, files) = self.resolver.resolve_branch(branch, &path)?;
				Ok(Resolved::Branch { data, files })
			}
			Node::Lazy(resolver) => {
				tracing::trace!(%path, "resolving lazy field");
				let siblings = Siblings {
					level: self,
					current: key,
				};
				let value = resolver.call(&siblings).map_err(|e| e.at_path(&path))?;
				Ok(Resolved::Data(value))
			}
			Node::Nested(nested) => Ok(Resolved::Data(self.resolver.resolve_nested(&path, nested)?)),
			Node::Generator(generated) => {
				let value = generated.value().map_err(|e| e.at_path(&path))?;
				Ok(Resolved::Data(value))
			}
		}
	}

	fn cycle_error(&self, key: &str) -> FixtureError {
		let stack = self.stack.borrow();
		let start = stack.iter().position(|k| k == key).unwrap_or(0);
		let mut chain: Vec<String> = stack[start..].to_vec();
		chain.push(key.to_string());
		let path = path::join(&self.scope, key);
		let mut recorded = self.cycle.borrow_mut();
		if recorded.is_none() {
			*recorded = Some(FixtureError::CircularLazyDependency {
				path: path.clone(),
				chain: chain.clone(),
			});
		}
		FixtureError::CircularLazyDependency { path, chain }
	}
}

/// Read view over one level of a payload being resolved: the siblings of a
/// lazy field, or the top level handed to a `state_with` closure.
///
/// Reading a field that has not been resolved yet resolves it first.
pub struct Siblings<'a> {
	level: &'a Level<'a>,
	current: &'a str,
}

impl Siblings<'_> {
	/// Returns the resolved value at `key`, which may be a dot-path into a
	/// sibling mapping. Files and missing keys yield `None`.
	pub fn get(&self, key: &str) -> FixtureResult<Option<Value>> {
		let path = DotPath::parse(key)?;
		let (first, rest) = path
			.segments()
			.split_first()
			.ok_or_else(|| FixtureError::custom(format!("empty sibling path `{}`", key)))?;
		let Some(mut value) = self.level.resolve_key(first)?.and_then(Resolved::data) else {
			return Ok(None);
		};
		for segment in rest {
			let next = match &mut value {
				Value::Object(map) => map.remove(segment),
				Value::Array(items) => segment
					.parse::<usize>()
					.ok()
					.filter(|index| *index < items.len())
					.map(|index| items.swap_remove(index)),
				_ => None,
			};
			match next {
				Some(next) => value = next,
				None => return Ok(None),
			}
		}
		Ok(Some(value))
	}

	/// Like [`Siblings::get`] but yields `null` for missing keys.
	pub fn value(&self, key: &str) -> FixtureResult<Value> {
		Ok(self.get(key)?.unwrap_or(Value::Null))
	}

	/// Returns the string at `key`.
	pub fn str(&self, key: &str) -> FixtureResult<String> {
		match self.get(key)? {
			Some(Value::String(value)) => Ok(value),
			Some(other) => Err(FixtureError::custom(format!(
				"sibling `{}` is not a string: {}",
				key, other
			))),
			None => Err(FixtureError::custom(format!("sibling `{}` is not set", key))),
		}
	}

	/// Returns the integer at `key`.
	pub fn i64(&self, key: &str) -> FixtureResult<i64> {
		match self.get(key)? {
			Some(value) => value.as_i64().ok_or_else(|| {
				FixtureError::custom(format!("sibling `{}` is not an integer: {}", key, value))
			}),
			None => Err(FixtureError::custom(format!("sibling `{}` is not set", key))),
		}
	}

	/// Returns true if a data field named `key` exists at this level.
	pub fn contains(&self, key: &str) -> bool {
		self.level.slots.borrow().get(key).is_some_and(|slot| {
			!matches!(
				slot,
				Slot::Pending(Node::File(_)) | Slot::Done(Resolved::File(_))
			)
		})
	}

	/// Resolves and returns every other data field at this level.
	pub fn all(&self) -> FixtureResult<Map<String, Value>> {
		let keys: Vec<String> = self
			.level
			.slots
			.borrow()
			.keys()
			.filter(|key| key.as_str() != self.current)
			.cloned()
			.collect();
		let mut out = Map::new();
		for key in keys {
			if let Some(value) = self.level.resolve_key(&key)?.and_then(Resolved::data) {
				out.insert(key, value);
			}
		}
		Ok(out)
	}
}
