use crate::config::types::{Config, LaunchConfig, MarkerConfig};
use crate::error::{PortError, Result};
use regex::Regex;

/// End of a removable statement line: trailing blanks, an optional comment,
/// and the newline itself (or end of text).
const LINE_END: &str = r"[ \t]*(?:#[^\n]*)?\r?(?:\n|\z)";

/// Network-exposure flag forced onto every launch call.
pub const SHARE_ENABLED: &str = "share=True";

/// A compiled strip rule: every match of `pattern` is replaced by `replacement`.
#[derive(Debug)]
pub struct StripRule {
	/// Short name used in logs.
	pub name: &'static str,

	/// Compiled pattern.
	pub pattern: Regex,

	/// Replacement string, may reference capture groups.
	pub replacement: &'static str,
}

impl StripRule {
	fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Result<Self> {
		Ok(StripRule {
			name,
			pattern: compile_regex(pattern)?,
			replacement,
		})
	}

	/// Apply this rule until it no longer matches.
	///
	/// Matches cannot overlap, so a decorator directly above another one is
	/// only reached on a later pass. Every pass removes text, so this ends.
	pub fn apply(&self, input: &str) -> String {
		let mut text = input.to_string();
		loop {
			let next = self
				.pattern
				.replace_all(&text, self.replacement)
				.into_owned();
			if next == text {
				return text;
			}
			text = next;
		}
	}
}

/// All patterns recognised in a bundle's source text.
#[derive(Debug)]
pub struct PatternSet {
	/// Strip rules, applied in order.
	pub strip_rules: Vec<StripRule>,

	/// A `.launch(...)` call with a non-nested argument list.
	pub launch_call: Regex,

	/// Presence of an explicit `share=` keyword argument.
	pub share_flag: Regex,

	/// A full `share=<value>` assignment, value ending before the next comma,
	/// comment or line break.
	pub share_assignment: Regex,

	/// Presence of an explicit `server_name=` keyword argument.
	pub server_name_flag: Regex,

	/// The `server_name="..."` argument appended when none is present.
	pub server_name_argument: String,
}

impl PatternSet {
	/// Compile the pattern set for the given markers and launch settings.
	pub fn new(markers: &MarkerConfig, launch: &LaunchConfig) -> Result<Self> {
		let module = regex::escape(&markers.module);
		let decorator = regex::escape(&markers.decorator);
		let decorator_line = format!(r"@(?:{module}\.)?{decorator}\b");

		let strip_rules = vec![
			StripRule::new(
				"named-import",
				&format!(r"(?m)^[ \t]*from[ \t]+{module}[ \t]+import[ \t]+{decorator}{LINE_END}"),
				"",
			)?,
			StripRule::new(
				"module-import",
				&format!(r"(?m)^[ \t]*import[ \t]+{module}{LINE_END}"),
				"",
			)?,
			StripRule::new(
				"wildcard-import",
				&format!(r"(?m)^[ \t]*from[ \t]+{module}[ \t]+import[ \t]+\*{LINE_END}"),
				"",
			)?,
			// Runs before the line rule below so a def sharing the decorator's
			// line is never removed with it.
			StripRule::new(
				"fused-decorator",
				&format!(r"(?m)^([ \t]*){decorator_line}[^\n]*?[ \t]((?:async[ \t]+)?def[ \t])"),
				"${1}${2}",
			)?,
			// A decorator line, removed only when a def or another decorator
			// follows, possibly after blank or comment-only lines. Everything
			// after the decorator line is captured and restored.
			StripRule::new(
				"decorator",
				&format!(
					r"(?m)^[ \t]*{decorator_line}[^\n]*\n((?:[ \t]*(?:#[^\n]*)?\r?\n)*[ \t]*(?:@|(?:async[ \t]+)?def\b))"
				),
				"${1}",
			)?,
		];

		Ok(PatternSet {
			strip_rules,
			launch_call: compile_regex(r"\.launch\s*\([^)]*\)")?,
			share_flag: compile_regex(r"\bshare\s*=")?,
			share_assignment: compile_regex(r"\bshare\s*=\s*[^,)\s#](?:[^,)#\n]*[^,)\s#])?")?,
			server_name_flag: compile_regex(r"\bserver_name\s*=")?,
			server_name_argument: format!("server_name=\"{}\"", launch.server_name),
		})
	}

	/// Compile the pattern set described by a full config.
	pub fn from_config(config: &Config) -> Result<Self> {
		Self::new(&config.markers, &config.launch)
	}
}

/// Compile a regex pattern string.
fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| PortError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}
