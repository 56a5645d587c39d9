//! Source rewriting rules for space-porter.
//!
//! This module handles:
//! - The compiled patterns for platform imports, decorators and launch calls
//! - Pure text transforms that strip markers and patch launch calls

pub mod matcher;
pub mod rewriter;

pub use matcher::{PatternSet, SHARE_ENABLED, StripRule};
pub use rewriter::{patch_launch_calls, strip_platform_markers};
