//! File-like attachments.
//!
//! Files travel beside the request data and are never merged into it. A
//! fixture declares baseline files through [`RequestFixture::files`], and
//! resolution returns them as a nested [`Files`] mapping.
//!
//! [`RequestFixture::files`]: crate::RequestFixture::files

use bytes::Bytes;
use indexmap::IndexMap;

use crate::path::DotPath;

/// An opaque uploaded file handed to the simulated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
	file_name: String,
	content_type: String,
	content: Bytes,
}

impl UploadedFile {
	/// Creates a file with the `application/octet-stream` content type.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::UploadedFile;
	///
	/// let file = UploadedFile::new("avatar.png", vec![0u8; 16]).with_content_type("image/png");
	/// assert_eq!(file.size(), 16);
	/// assert_eq!(file.content_type(), "image/png");
	/// ```
	pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
		Self {
			file_name: file_name.into(),
			content_type: "application/octet-stream".to_string(),
			content: content.into(),
		}
	}

	/// Sets the content type.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = content_type.into();
		self
	}

	/// Returns the client-side file name.
	pub fn file_name(&self) -> &str {
		&self.file_name
	}

	/// Returns the content type.
	pub fn content_type(&self) -> &str {
		&self.content_type
	}

	/// Returns the file contents.
	pub fn content(&self) -> &Bytes {
		&self.content
	}

	/// Returns the size in bytes.
	pub fn size(&self) -> usize {
		self.content.len()
	}
}

/// Baseline file attachments declared by a fixture, keyed by dot-path.
#[derive(Debug, Clone, Default)]
pub struct FileAttachments {
	entries: IndexMap<String, UploadedFile>,
}

impl FileAttachments {
	/// Creates an empty set of attachments.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches a file at `path`. Later attachments on the same path win.
	pub fn attach(mut self, path: impl Into<String>, file: UploadedFile) -> Self {
		self.entries.insert(path.into(), file);
		self
	}

	/// Returns true if nothing is attached.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the number of attachments.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, UploadedFile)> {
		self.entries.into_iter()
	}
}

/// A node in the resolved [`Files`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
	/// A single file.
	File(UploadedFile),
	/// A nested mapping of files.
	Map(Files),
}

/// Resolved files, nested the same way as the request data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Files {
	entries: IndexMap<String, FileNode>,
}

impl Files {
	/// Creates an empty mapping.
	pub fn new() -> Self {
		Self::default()
	}

	/// Looks up a file by dot-path.
	pub fn get(&self, path: &str) -> Option<&UploadedFile> {
		let path = DotPath::parse(path).ok()?;
		let mut current = self;
		for segment in path.parents() {
			match current.entries.get(segment)? {
				FileNode::Map(inner) => current = inner,
				FileNode::File(_) => return None,
			}
		}
		match current.entries.get(path.leaf())? {
			FileNode::File(file) => Some(file),
			FileNode::Map(_) => None,
		}
	}

	/// Inserts a file at a dot-path, creating intermediate mappings.
	///
	/// Malformed paths are stored verbatim as a single key.
	pub fn insert(&mut self, path: &str, file: UploadedFile) {
		let path = DotPath::parse(path).unwrap_or_else(|_| DotPath::single(path));
		let mut current = self;
		for segment in path.parents() {
			let node = current
				.entries
				.entry(segment.clone())
				.or_insert_with(|| FileNode::Map(Files::new()));
			if let FileNode::File(_) = node {
				*node = FileNode::Map(Files::new());
			}
			let FileNode::Map(inner) = node else {
				return;
			};
			current = inner;
		}
		current
			.entries
			.insert(path.leaf().to_string(), FileNode::File(file));
	}

	/// Removes whatever lives at `path`, returning true if something was removed.
	pub fn remove(&mut self, path: &DotPath) -> bool {
		let mut current = self;
		for segment in path.parents() {
			match current.entries.get_mut(segment) {
				Some(FileNode::Map(inner)) => current = inner,
				_ => return false,
			}
		}
		current.entries.shift_remove(path.leaf()).is_some()
	}

	/// Returns every file with its dot-path, depth first in insertion order.
	pub fn flatten(&self) -> Vec<(String, &UploadedFile)> {
		let mut out = Vec::new();
		self.collect_into("", &mut out);
		out
	}

	fn collect_into<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a UploadedFile)>) {
		for (key, node) in &self.entries {
			let path = crate::path::join(prefix, key);
			match node {
				FileNode::File(file) => out.push((path, file)),
				FileNode::Map(inner) => inner.collect_into(&path, out),
			}
		}
	}

	/// Returns the number of files, counting nested ones.
	pub fn len(&self) -> usize {
		self.entries
			.values()
			.map(|node| match node {
				FileNode::File(_) => 1,
				FileNode::Map(inner) => inner.len(),
			})
			.sum()
	}

	/// Returns true if there are no files.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Iterates over the top-level entries.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &FileNode)> {
		self.entries.iter()
	}

	pub(crate) fn insert_node(&mut self, key: String, node: FileNode) {
		self.entries.insert(key, node);
	}

	/// Overlays `other` onto `self`; files in `other` win on conflicting paths.
	pub fn merge(&mut self, other: Files) {
		for (key, node) in other.entries {
			match (self.entries.get_mut(&key), node) {
				(Some(FileNode::Map(mine)), FileNode::Map(theirs)) => mine.merge(theirs),
				(_, node) => {
					self.entries.insert(key, node);
				}
			}
		}
	}
}
