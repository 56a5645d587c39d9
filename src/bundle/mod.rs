//! Bundle processing for space-porter.
//!
//! This module handles:
//! - Rewriting single files in place, only when their text changes
//! - Enumerating a bundle's source files
//! - Selecting and patching the entry file

pub mod file;
pub mod scanner;

pub use file::{patch_launch_file, rewrite_file, strip_file};
pub use scanner::{BundleReport, BundleScanner, EntryFile, Selection, process_bundle};
