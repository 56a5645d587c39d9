//! Launching a prepared bundle.
//!
//! This module handles:
//! - Resolving the interpreter on PATH
//! - Running the entry file from the bundle root with inherited stdio
//! - Exporting the bind address and port the UI toolkit reads at startup

use crate::config::types::LaunchConfig;
use crate::error::{PortError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Build the environment the launched app receives on top of the inherited one.
pub fn launch_env(launch: &LaunchConfig) -> HashMap<String, String> {
	let mut env = HashMap::new();
	env.insert(
		"GRADIO_SERVER_NAME".to_string(),
		launch.server_name.clone(),
	);
	env.insert(
		"GRADIO_SERVER_PORT".to_string(),
		launch.server_port.to_string(),
	);
	env
}

/// Path of the entry file relative to the bundle root, as passed to the interpreter.
pub fn entry_argument(bundle_root: &Path, entry: &Path) -> PathBuf {
	entry
		.strip_prefix(bundle_root)
		.map(Path::to_path_buf)
		.unwrap_or_else(|_| entry.to_path_buf())
}

/// Run `interpreter <entry>` from the bundle root.
///
/// This function:
/// - Passes stdin, stdout, stderr through to the child process
/// - Returns the exit status of the child process
pub fn execute_entry(
	interpreter: &Path,
	bundle_root: &Path,
	entry: &Path,
	launch: &LaunchConfig,
) -> Result<ExitStatus> {
	let mut cmd = Command::new(interpreter);
	cmd.arg(entry_argument(bundle_root, entry))
		.current_dir(bundle_root)
		.envs(launch_env(launch))
		.stdin(Stdio::inherit())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit());

	tracing::info!(
		interpreter = %interpreter.display(),
		entry = %entry.display(),
		"launching entry file"
	);

	let status = cmd.status().map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			PortError::CommandNotFound {
				command: interpreter.to_string_lossy().to_string(),
			}
		} else {
			PortError::CommandFailed {
				command: interpreter.to_string_lossy().to_string(),
				source,
			}
		}
	})?;

	Ok(status)
}

/// Resolve a command name to its full path.
///
/// A path with more than one component is returned as-is when it exists.
/// Otherwise, searches PATH for the command.
pub fn resolve_command(command: &str) -> Option<PathBuf> {
	let path = Path::new(command);

	if path.components().count() > 1 {
		return path.exists().then(|| path.to_path_buf());
	}

	let path_var = std::env::var_os("PATH")?;
	std::env::split_paths(&path_var)
		.map(|dir| dir.join(command))
		.find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_launch_env() {
		let launch = LaunchConfig {
			server_name: "0.0.0.0".to_string(),
			server_port: 7861,
		};
		let env = launch_env(&launch);

		assert_eq!(env.get("GRADIO_SERVER_NAME").unwrap(), "0.0.0.0");
		assert_eq!(env.get("GRADIO_SERVER_PORT").unwrap(), "7861");
		assert_eq!(env.len(), 2);
	}

	#[test]
	fn test_entry_argument_is_relative_to_root() {
		let arg = entry_argument(Path::new("/tmp/bundle"), Path::new("/tmp/bundle/ui/demo.py"));
		assert_eq!(arg, PathBuf::from("ui/demo.py"));
	}

	#[test]
	fn test_entry_argument_outside_root_is_kept() {
		let arg = entry_argument(Path::new("/tmp/bundle"), Path::new("/srv/app.py"));
		assert_eq!(arg, PathBuf::from("/srv/app.py"));
	}

	#[test]
	fn test_resolve_command_absolute_path() {
		#[cfg(unix)]
		{
			let result = resolve_command("/bin/sh");
			assert_eq!(result, Some(PathBuf::from("/bin/sh")));
		}
	}

	#[test]
	fn test_resolve_command_not_found() {
		assert!(resolve_command("/nonexistent/path/to/python").is_none());
		assert!(resolve_command("definitely-not-an-interpreter-12345").is_none());
	}

	#[test]
	fn test_resolve_command_from_path() {
		#[cfg(unix)]
		{
			assert!(resolve_command("sh").is_some());
		}
	}

	#[cfg(unix)]
	#[test]
	fn test_execute_entry_runs_from_bundle_root() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		let entry = root.join("app.py");
		std::fs::write(
			&entry,
			"test \"$GRADIO_SERVER_PORT\" = 7860 && test -f app.py\n",
		)
		.unwrap();

		let status =
			execute_entry(Path::new("/bin/sh"), root, &entry, &LaunchConfig::default()).unwrap();
		assert!(status.success());
	}

	#[test]
	fn test_execute_missing_interpreter() {
		let temp_dir = tempfile::tempdir().unwrap();
		let result = execute_entry(
			Path::new("/nonexistent/python3"),
			temp_dir.path(),
			&temp_dir.path().join("app.py"),
			&LaunchConfig::default(),
		);
		assert!(matches!(result, Err(PortError::CommandNotFound { .. })));
	}
}
