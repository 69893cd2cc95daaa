//! Fixture settings.
//!
//! Settings only drive the naming convention used to locate fixtures. They
//! are layered: defaults, then a TOML file, then `REINHARDT_FIXTURES_*`
//! environment variables.
//!
//! ```toml
//! [fixtures]
//! path = "tests/fixtures"
//! namespace = "fixtures"
//! suffix = "Fixture"
//! target_namespace = "requests"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Prefix of the environment variables overriding settings.
pub const ENV_PREFIX: &str = "REINHARDT_FIXTURES_";

/// Error type for loading settings.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// The settings file could not be read.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The settings file is not valid TOML.
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Where fixtures live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
	/// Directory holding fixture sources, used in lookup diagnostics.
	pub path: PathBuf,
	/// Module path fixtures are declared under.
	pub namespace: String,
	/// Suffix appended to the target's name.
	pub suffix: String,
	/// Segment of the target's module path after which the relative name starts.
	pub target_namespace: String,
}

impl Default for FixtureSettings {
	fn default() -> Self {
		Self {
			path: PathBuf::from("tests/fixtures"),
			namespace: "fixtures".to_string(),
			suffix: "Fixture".to_string(),
			target_namespace: "requests".to_string(),
		}
	}
}

#[derive(Deserialize)]
struct SettingsFile {
	#[serde(default)]
	fixtures: FixtureSettings,
}

impl FixtureSettings {
	/// Parses settings from the `[fixtures]` table of a TOML document.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::FixtureSettings;
	///
	/// let settings = FixtureSettings::from_toml_str("[fixtures]\nsuffix = \"Payload\"\n").unwrap();
	/// assert_eq!(settings.suffix, "Payload");
	/// assert_eq!(settings.namespace, "fixtures");
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let file: SettingsFile = toml::from_str(source)?;
		Ok(file.fixtures)
	}

	/// Reads settings from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let source = fs::read_to_string(path.as_ref())?;
		Self::from_toml_str(&source)
	}

	/// Applies `REINHARDT_FIXTURES_*` overrides from the process environment.
	pub fn from_env(self) -> Self {
		self.apply_env(std::env::vars())
	}

	/// Applies `REINHARDT_FIXTURES_*` overrides from `vars`.
	pub fn apply_env<I, K, V>(mut self, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		for (key, value) in vars {
			let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
				continue;
			};
			match name.to_lowercase().as_str() {
				"path" => self.path = PathBuf::from(value.into()),
				"namespace" => self.namespace = value.into(),
				"suffix" => self.suffix = value.into(),
				"target_namespace" => self.target_namespace = value.into(),
				other => tracing::warn!(variable = other, "ignoring unknown fixture setting"),
			}
		}
		self
	}
}
