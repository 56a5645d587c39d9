//! Space URL handling.
//!
//! Retrieval itself happens elsewhere; this only names what to fetch and
//! where the bundle is expected to land.

use crate::error::{PortError, Result};
use regex::Regex;
use std::sync::LazyLock;

static SPACE_URL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^https://huggingface\.co/spaces/([^/?#\s]+)/([^/?#\s]+)")
		.expect("Space URL pattern is a valid regex")
});

/// A Space identified by its owner and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceRef {
	pub owner: String,
	pub name: String,
}

impl SpaceRef {
	/// Parse `https://huggingface.co/spaces/<owner>/<name>`, ignoring any
	/// trailing path such as `/tree/main`.
	pub fn parse(url: &str) -> Result<Self> {
		let caps = SPACE_URL
			.captures(url.trim())
			.ok_or_else(|| PortError::InvalidSpaceUrl {
				url: url.to_string(),
			})?;

		Ok(SpaceRef {
			owner: caps[1].to_string(),
			name: caps[2].to_string(),
		})
	}

	/// Repository id in `<owner>/<name>` form.
	pub fn repo_id(&self) -> String {
		format!("{}/{}", self.owner, self.name)
	}

	/// Directory name the bundle is downloaded into.
	pub fn local_dir_name(&self) -> String {
		format!("hf_space_{}", self.name)
	}
}
