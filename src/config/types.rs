use crate::error::{PortError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conventional entry filenames, checked in this order at the bundle root.
pub const DEFAULT_ENTRY_FILES: [&str; 4] = ["app.py", "main.py", "demo.py", "gradio_app.py"];

/// Top-level configuration from a `.space-porter.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
	/// Platform markers to strip from every source file.
	pub markers: MarkerConfig,

	/// Values forced onto the UI server's launch call.
	pub launch: LaunchConfig,

	/// Bundle enumeration and entry selection.
	pub scan: ScanConfig,
}

/// Names of the hosting platform's module and its GPU decorator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MarkerConfig {
	/// Module imported by bundles written for the managed-GPU platform.
	pub module: String,

	/// Decorator exported by that module.
	pub decorator: String,
}

impl Default for MarkerConfig {
	fn default() -> Self {
		MarkerConfig {
			module: "spaces".to_string(),
			decorator: "GPU".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LaunchConfig {
	/// Bind address written as `server_name="..."`.
	pub server_name: String,

	/// Port exported to the launched app as `GRADIO_SERVER_PORT`.
	pub server_port: u16,
}

impl Default for LaunchConfig {
	fn default() -> Self {
		LaunchConfig {
			server_name: "0.0.0.0".to_string(),
			server_port: 7860,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanConfig {
	/// Entry filenames in priority order. First existing file wins.
	pub entry_files: Vec<String>,

	/// Extensions (without the dot) of files treated as source.
	pub extensions: Vec<String>,

	/// Directory names never descended into.
	pub skip_dirs: Vec<String>,

	/// Substring identifying the entry file when no conventional name exists.
	pub launch_marker: String,
}

impl Default for ScanConfig {
	fn default() -> Self {
		ScanConfig {
			entry_files: DEFAULT_ENTRY_FILES.iter().map(|s| s.to_string()).collect(),
			extensions: vec!["py".to_string()],
			skip_dirs: ["venv", ".venv", "__pycache__", "node_modules"]
				.iter()
				.map(|s| s.to_string())
				.collect(),
			launch_marker: ".launch(".to_string(),
		}
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from, `None` for built-in defaults.
	pub path: Option<PathBuf>,
}

fn invalid(field: &str, reason: &str) -> PortError {
	PortError::InvalidConfig {
		field: field.to_string(),
		reason: reason.to_string(),
	}
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl MarkerConfig {
	pub fn validate(&self) -> Result<()> {
		if !is_identifier(&self.module) {
			return Err(invalid("markers.module", "must be a Python identifier"));
		}
		if !is_identifier(&self.decorator) {
			return Err(invalid("markers.decorator", "must be a Python identifier"));
		}
		Ok(())
	}
}

impl LaunchConfig {
	pub fn validate(&self) -> Result<()> {
		if self.server_name.is_empty() {
			return Err(invalid("launch.server-name", "must not be empty"));
		}
		if self
			.server_name
			.chars()
			.any(|c| c == '"' || c == '\\' || c.is_whitespace())
		{
			return Err(invalid(
				"launch.server-name",
				"must not contain quotes, backslashes or whitespace",
			));
		}
		Ok(())
	}
}

impl ScanConfig {
	pub fn validate(&self) -> Result<()> {
		if self.entry_files.is_empty() {
			return Err(invalid("scan.entry-files", "must list at least one file"));
		}
		if let Some(bad) = self
			.entry_files
			.iter()
			.find(|name| name.is_empty() || name.contains('/') || name.contains('\\'))
		{
			return Err(invalid(
				"scan.entry-files",
				&format!("'{bad}' must be a bare file name"),
			));
		}
		if self.extensions.is_empty() {
			return Err(invalid("scan.extensions", "must list at least one extension"));
		}
		if self.launch_marker.is_empty() {
			return Err(invalid("scan.launch-marker", "must not be empty"));
		}
		Ok(())
	}
}

impl Config {
	/// Validate every section of this config.
	pub fn validate(&self) -> Result<()> {
		self.markers.validate()?;
		self.launch.validate()?;
		self.scan.validate()
	}
}
