use crate::config::parser::parse_config_file;
use crate::config::types::{Config, LoadedConfig};
use crate::error::{PortError, Result};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the home directory.
pub const CONFIG_FILE_NAME: &str = ".space-porter.toml";

/// Load the effective configuration.
///
/// The lookup order is:
/// 1. `explicit`, which must exist when given
/// 2. `.space-porter.toml` in `cwd`
/// 3. `~/.space-porter.toml`
/// 4. Built-in defaults
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<LoadedConfig> {
	if let Some(path) = explicit {
		if !path.exists() {
			return Err(PortError::ConfigNotFound {
				path: path.to_path_buf(),
			});
		}
		return load_from(path.to_path_buf());
	}

	let local = cwd.join(CONFIG_FILE_NAME);
	if local.exists() {
		return load_from(local);
	}

	// A missing home directory only means there is no user config to read
	if let Ok(user_path) = user_config_path()
		&& user_path.exists()
	{
		return load_from(user_path);
	}

	Ok(LoadedConfig {
		config: Config::default(),
		path: None,
	})
}

fn load_from(path: PathBuf) -> Result<LoadedConfig> {
	let config = parse_config_file(&path)?;
	Ok(LoadedConfig {
		config,
		path: Some(path),
	})
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(PortError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

/// Template written by `config init`.
pub fn generate_init_template() -> String {
	format!(
		r#"# space-porter configuration
# Every key is optional; the values below are the built-in defaults.

[markers]
# Module and decorator of the managed-GPU platform to strip
module = "spaces"
decorator = "GPU"

[launch]
# Forced onto the UI server's .launch(...) call as server_name="..."
server-name = "0.0.0.0"
# Exported to the app as GRADIO_SERVER_PORT by `space-porter run`
server-port = 7860

[scan]
# Checked in order at the bundle root before falling back to content sniffing
entry-files = [{entries}]
extensions = ["py"]
skip-dirs = ["venv", ".venv", "__pycache__", "node_modules"]
launch-marker = ".launch("
"#,
		entries = crate::config::types::DEFAULT_ENTRY_FILES
			.iter()
			.map(|name| format!("\"{name}\""))
			.collect::<Vec<_>>()
			.join(", ")
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::parse_config_str;

	#[test]
	fn test_explicit_config_must_exist() {
		let temp_dir = tempfile::tempdir().unwrap();
		let missing = temp_dir.path().join("nope.toml");

		match load_config(Some(&missing), temp_dir.path()).unwrap_err() {
			PortError::ConfigNotFound { path } => assert_eq!(path, missing),
			other => panic!("Expected ConfigNotFound, got {other:?}"),
		}
	}

	#[test]
	fn test_explicit_config_is_loaded() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("custom.toml");
		std::fs::write(&path, "[launch]\nserver-port = 9000\n").unwrap();

		let loaded = load_config(Some(&path), temp_dir.path()).unwrap();
		assert_eq!(loaded.path, Some(path));
		assert_eq!(loaded.config.launch.server_port, 9000);
	}

	#[test]
	fn test_local_config_wins_over_defaults() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join(CONFIG_FILE_NAME);
		std::fs::write(&path, "[markers]\ndecorator = \"ZeroGPU\"\n").unwrap();

		let loaded = load_config(None, temp_dir.path()).unwrap();
		assert_eq!(loaded.path, Some(path));
		assert_eq!(loaded.config.markers.decorator, "ZeroGPU");
	}

	#[test]
	fn test_init_template_parses_to_defaults() {
		let template = generate_init_template();
		let config = parse_config_str(&template, Path::new("template.toml")).unwrap();
		assert_eq!(config, Config::default());
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		assert!(path.unwrap().ends_with(CONFIG_FILE_NAME));
	}
}
