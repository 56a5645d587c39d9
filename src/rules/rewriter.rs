use crate::rules::matcher::{PatternSet, SHARE_ENABLED};
use regex::Captures;

/// Remove the platform's imports and decorators from a source text.
///
/// Rules run in the order of `PatternSet::strip_rules`. Text without any
/// marker comes back byte-identical.
pub fn strip_platform_markers(input: &str, patterns: &PatternSet) -> String {
	let mut text = input.to_string();
	for rule in &patterns.strip_rules {
		let next = rule.apply(&text);
		if next != text {
			tracing::trace!(rule = rule.name, "strip rule matched");
			text = next;
		}
	}
	text
}

/// Force `share=True` and a bind address onto every `.launch(...)` call.
///
/// Calls whose arguments contain a nested `(...)` or a literal `)` end at the
/// first closing parenthesis, so the rewrite can break them.
pub fn patch_launch_calls(input: &str, patterns: &PatternSet) -> String {
	patterns
		.launch_call
		.replace_all(input, |caps: &Captures| patch_call(&caps[0], patterns))
		.into_owned()
}

/// Rewrite one `.launch(...)` span.
fn patch_call(call: &str, patterns: &PatternSet) -> String {
	// The launch pattern guarantees an opening and a final closing paren
	let Some(open) = call.find('(') else {
		return call.to_string();
	};
	let head = &call[..=open];
	let args = &call[open + 1..call.len() - 1];

	let mut args = if patterns.share_flag.is_match(args) {
		patterns
			.share_assignment
			.replace_all(args, SHARE_ENABLED)
			.into_owned()
	} else {
		append_argument(args, SHARE_ENABLED)
	};

	if !patterns.server_name_flag.is_match(&args) {
		args = append_argument(&args, &patterns.server_name_argument);
	}

	format!("{head}{args})")
}

/// Append `argument` after the last existing argument.
///
/// Trailing whitespace (such as the newline before a closing paren) and a
/// trailing `#` comment on the last line stay after the new argument.
fn append_argument(args: &str, argument: &str) -> String {
	let body = args.trim_end();
	let line_start = body.rfind('\n').map_or(0, |i| i + 1);
	let cut = comment_start(&body[line_start..]).map_or(body.len(), |offset| line_start + offset);
	let code = args[..cut].trim_end();
	let rest = &args[code.len()..];

	if code.trim_start().is_empty() {
		return format!("{argument}{}", rest.trim_start_matches([' ', '\t']));
	}

	let separator = if code.ends_with(',') { " " } else { ", " };
	format!("{code}{separator}{argument}{rest}")
}

/// Byte offset of a `#` comment in one line, ignoring `#` inside quotes.
fn comment_start(line: &str) -> Option<usize> {
	let mut quote = None;
	let mut escaped = false;
	for (i, c) in line.char_indices() {
		match quote {
			Some(_) if escaped => escaped = false,
			Some(_) if c == '\\' => escaped = true,
			Some(q) if c == q => quote = None,
			Some(_) => {}
			None if c == '"' || c == '\'' => quote = Some(c),
			None if c == '#' => return Some(i),
			None => {}
		}
	}
	None
}
