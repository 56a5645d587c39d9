use crate::error::{PortError, Result};
use crate::rules::{PatternSet, patch_launch_calls, strip_platform_markers};
use std::path::Path;

/// Read `path`, apply `transform`, and write the result back only if it differs.
///
/// Returns whether the file was rewritten. The file is replaced in full.
pub fn rewrite_file<F>(path: &Path, transform: F) -> Result<bool>
where
	F: FnOnce(&str) -> String,
{
	let original = std::fs::read_to_string(path).map_err(|source| PortError::FileRead {
		path: path.to_path_buf(),
		source,
	})?;

	let rewritten = transform(&original);
	if rewritten == original {
		tracing::debug!(path = %path.display(), "unchanged");
		return Ok(false);
	}

	std::fs::write(path, rewritten).map_err(|source| PortError::FileWrite {
		path: path.to_path_buf(),
		source,
	})?;

	tracing::debug!(path = %path.display(), "rewritten");
	Ok(true)
}

/// Strip platform imports and decorators from one file.
pub fn strip_file(path: &Path, patterns: &PatternSet) -> Result<bool> {
	rewrite_file(path, |text| strip_platform_markers(text, patterns))
}

/// Patch every launch call in one file.
pub fn patch_launch_file(path: &Path, patterns: &PatternSet) -> Result<bool> {
	rewrite_file(path, |text| patch_launch_calls(text, patterns))
}
