use crate::bundle::file::{patch_launch_file, strip_file};
use crate::config::types::{Config, ScanConfig};
use crate::error::{PortError, Result};
use crate::rules::PatternSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// How the entry file was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
	/// A conventional filename at the bundle root.
	ConventionalName,

	/// The first source file containing the launch marker.
	LaunchMarker,
}

impl Selection {
	pub fn as_str(&self) -> &'static str {
		match self {
			Selection::ConventionalName => "conventional name",
			Selection::LaunchMarker => "launch marker",
		}
	}
}

/// The file that starts the bundle's UI server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFile {
	pub path: PathBuf,
	pub selection: Selection,

	/// Whether patching the launch call changed the file.
	pub launch_patched: bool,
}

/// Outcome of processing a bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleReport {
	/// Number of source files enumerated.
	pub source_files: usize,

	/// Files rewritten by the strip rules.
	pub stripped: Vec<PathBuf>,

	/// The entry file, `None` when neither selection strategy found one.
	pub entry: Option<EntryFile>,
}

impl BundleReport {
	pub fn entry_path(&self) -> Option<&Path> {
		self.entry.as_ref().map(|entry| entry.path.as_path())
	}
}

/// Walks a bundle, strips platform markers, and patches the entry file.
#[derive(Debug)]
pub struct BundleScanner {
	patterns: PatternSet,
	scan: ScanConfig,
}

impl BundleScanner {
	pub fn new(patterns: PatternSet, scan: ScanConfig) -> Self {
		BundleScanner { patterns, scan }
	}

	pub fn from_config(config: &Config) -> Result<Self> {
		Ok(Self::new(
			PatternSet::from_config(config)?,
			config.scan.clone(),
		))
	}

	pub fn patterns(&self) -> &PatternSet {
		&self.patterns
	}

	/// Strip platform markers from one file.
	pub fn strip_file(&self, path: &Path) -> Result<bool> {
		strip_file(path, &self.patterns)
	}

	/// Patch the launch calls in one file.
	pub fn patch_launch_file(&self, path: &Path) -> Result<bool> {
		patch_launch_file(path, &self.patterns)
	}

	/// Process a whole bundle.
	///
	/// Every source file is stripped first. The entry file is then selected
	/// and its launch call patched. A missing root is reported as a bundle
	/// without an entry file. The first I/O error aborts the scan.
	pub fn process(&self, root: &Path) -> Result<BundleReport> {
		if !root.is_dir() {
			tracing::warn!(root = %root.display(), "bundle root is not a directory");
			return Ok(BundleReport::default());
		}

		let files = self.source_files(root)?;
		let mut report = BundleReport {
			source_files: files.len(),
			..Default::default()
		};

		for file in &files {
			if self.strip_file(file)? {
				tracing::info!(path = %file.display(), "stripped platform markers");
				report.stripped.push(file.clone());
			}
		}

		let Some((path, selection)) = self.select_entry(root, &files)? else {
			tracing::warn!(root = %root.display(), "no entry file found");
			return Ok(report);
		};

		let launch_patched = self.patch_launch_file(&path)?;
		tracing::info!(
			path = %path.display(),
			selection = selection.as_str(),
			launch_patched,
			"selected entry file"
		);

		report.entry = Some(EntryFile {
			path,
			selection,
			launch_patched,
		});
		Ok(report)
	}

	/// Enumerate source files below `root`, sorted by name at every level.
	pub fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
		let mut files = Vec::new();
		let walker = WalkDir::new(root)
			.sort_by_file_name()
			.into_iter()
			.filter_entry(|entry| entry.depth() == 0 || !self.is_skipped(entry));

		for entry in walker {
			let entry = entry.map_err(|source| PortError::Walk {
				path: source
					.path()
					.map(Path::to_path_buf)
					.unwrap_or_else(|| root.to_path_buf()),
				source,
			})?;

			if entry.file_type().is_file() && self.has_source_extension(entry.path()) {
				files.push(entry.into_path());
			}
		}

		Ok(files)
	}

	/// Select the entry file: conventional names first, then content sniffing.
	///
	/// A conventional file wins even if it never launches anything.
	pub fn select_entry(
		&self,
		root: &Path,
		files: &[PathBuf],
	) -> Result<Option<(PathBuf, Selection)>> {
		for name in &self.scan.entry_files {
			let candidate = root.join(name);
			if candidate.is_file() {
				return Ok(Some((candidate, Selection::ConventionalName)));
			}
		}

		for file in files {
			let content = std::fs::read_to_string(file).map_err(|source| PortError::FileRead {
				path: file.clone(),
				source,
			})?;
			if content.contains(&self.scan.launch_marker) {
				return Ok(Some((file.clone(), Selection::LaunchMarker)));
			}
		}

		Ok(None)
	}

	/// Hidden directories and `skip-dirs` are pruned; files are never skipped here.
	fn is_skipped(&self, entry: &DirEntry) -> bool {
		if !entry.file_type().is_dir() {
			return false;
		}
		let name = entry.file_name().to_string_lossy();
		name.starts_with('.') || self.scan.skip_dirs.iter().any(|dir| *dir == name)
	}

	fn has_source_extension(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| self.scan.extensions.iter().any(|allowed| allowed == ext))
	}
}

/// Process a bundle with the given configuration.
pub fn process_bundle(root: &Path, config: &Config) -> Result<BundleReport> {
	BundleScanner::from_config(config)?.process(root)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	fn scanner() -> BundleScanner {
		BundleScanner::from_config(&Config::default()).unwrap()
	}

	fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
		let path = root.join(relative);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).unwrap();
		}
		fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn test_fallback_selects_file_with_launch_call() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		write(root, "model.py", "def load():\n    pass\n");
		let demo = write(root, "ui/demo.py", "import gradio as gr\ndemo.launch()\n");

		let report = scanner().process(root).unwrap();
		let entry = report.entry.unwrap();

		assert_eq!(entry.path, demo);
		assert_eq!(entry.selection, Selection::LaunchMarker);
		assert!(entry.launch_patched);
		assert!(
			fs::read_to_string(&demo)
				.unwrap()
				.contains("demo.launch(share=True, server_name=\"0.0.0.0\")")
		);
	}

	#[test]
	fn test_root_demo_py_is_a_conventional_name() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		let demo = write(root, "demo.py", "demo.launch()\n");

		let entry = scanner().process(root).unwrap().entry.unwrap();
		assert_eq!(entry.path, demo);
		assert_eq!(entry.selection, Selection::ConventionalName);
	}

	#[test]
	fn test_priority_list_wins_over_content() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		let app = write(root, "app.py", "print('hello')\n");
		let gradio_app = write(root, "gradio_app.py", "demo.launch()\n");

		let entry = scanner().process(root).unwrap().entry.unwrap();

		assert_eq!(entry.path, app);
		assert_eq!(entry.selection, Selection::ConventionalName);
		assert!(!entry.launch_patched);
		// Only the entry file gets its launch call patched
		assert_eq!(fs::read_to_string(&gradio_app).unwrap(), "demo.launch()\n");
	}

	#[test]
	fn test_priority_order() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		write(root, "gradio_app.py", "demo.launch()\n");
		let main = write(root, "main.py", "demo.launch()\n");

		let entry = scanner().process(root).unwrap().entry.unwrap();
		assert_eq!(entry.path, main);
	}

	#[test]
	fn test_every_source_file_is_stripped() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		let app = write(
			root,
			"app.py",
			"import spaces\nfrom models import run\n\n@spaces.GPU\ndef predict(x):\n    return run(x)\n\ndemo.launch()\n",
		);
		let model = write(
			root,
			"models/__init__.py",
			"from spaces import GPU\n\n@GPU(duration=30)\ndef run(x):\n    return x\n",
		);
		let readme = write(root, "notes.txt", "import spaces\n");

		let report = scanner().process(root).unwrap();

		assert_eq!(report.source_files, 2);
		assert_eq!(report.stripped, vec![app.clone(), model.clone()]);
		assert_eq!(
			fs::read_to_string(&app).unwrap(),
			"from models import run\n\ndef predict(x):\n    return run(x)\n\ndemo.launch(share=True, server_name=\"0.0.0.0\")\n"
		);
		assert_eq!(
			fs::read_to_string(&model).unwrap(),
			"\ndef run(x):\n    return x\n"
		);
		assert_eq!(fs::read_to_string(&readme).unwrap(), "import spaces\n");
	}

	#[test]
	fn test_no_entry_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		write(temp_dir.path(), "utils.py", "def helper():\n    pass\n");

		let report = scanner().process(temp_dir.path()).unwrap();
		assert_eq!(report.source_files, 1);
		assert!(report.entry.is_none());
		assert!(report.entry_path().is_none());
	}

	#[test]
	fn test_missing_root_is_not_found() {
		let temp_dir = tempfile::tempdir().unwrap();
		let report = scanner().process(&temp_dir.path().join("nope")).unwrap();

		assert_eq!(report.source_files, 0);
		assert!(report.entry.is_none());
	}

	#[test]
	fn test_hidden_and_skipped_dirs_are_not_enumerated() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		write(root, ".git/hooks/pre_commit.py", "demo.launch()\n");
		write(root, "venv/lib/site.py", "demo.launch()\n");
		write(root, "__pycache__/app.py", "demo.launch()\n");
		let kept = write(root, "src/run.py", "demo.launch()\n");

		let files = scanner().source_files(root).unwrap();
		assert_eq!(files, vec![kept]);
	}

	#[test]
	fn test_hidden_source_files_are_enumerated() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		write(root, ".cache/model.py", "import spaces\n");
		let hidden = write(root, ".helpers.py", "import spaces\nimport os\n");
		let nested = write(root, "src/.local.py", "\n");

		let scanner = scanner();
		let files = scanner.source_files(root).unwrap();
		assert_eq!(files, vec![hidden.clone(), nested]);

		let report = scanner.process(root).unwrap();
		assert_eq!(report.stripped, vec![hidden.clone()]);
		assert_eq!(fs::read_to_string(&hidden).unwrap(), "import os\n");
	}

	#[test]
	fn test_enumeration_is_sorted() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		let b = write(root, "b.py", "b.launch()\n");
		let a = write(root, "a.py", "a.launch()\n");
		let nested = write(root, "a_dir/z.py", "\n");

		let scanner = scanner();
		let files = scanner.source_files(root).unwrap();
		assert_eq!(files, vec![a.clone(), nested, b]);

		let (selected, _) = scanner.select_entry(root, &files).unwrap().unwrap();
		assert_eq!(selected, a);
	}

	#[test]
	fn test_non_utf8_file_aborts_scan() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path();
		let bad = write(root, "broken.py", "x");
		fs::write(&bad, [0xff, 0xfe]).unwrap();

		match scanner().process(root).unwrap_err() {
			PortError::FileRead { path, .. } => assert_eq!(path, bad),
			other => panic!("Expected FileRead error, got {other:?}"),
		}
	}
}
