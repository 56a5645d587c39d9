//! space-porter - adapt downloaded Gradio Space bundles to run on self-hosted machines.
//!
//! This library provides the core functionality for space-porter, including:
//! - Stripping the managed-GPU platform's imports and decorators from source files
//! - Forcing network exposure and a bind address onto the UI server's launch call
//! - Locating the entry file of a bundle
//! - Launching the prepared entry file
//!
//! # Example
//!
//! ```no_run
//! use space_porter::bundle::BundleScanner;
//! use space_porter::config::Config;
//! use std::path::Path;
//!
//! let scanner = BundleScanner::from_config(&Config::default()).unwrap();
//! let report = scanner.process(Path::new("./hf_space_demo")).unwrap();
//!
//! match report.entry_path() {
//!     Some(entry) => println!("Entry file: {}", entry.display()),
//!     None => println!("No entry file found"),
//! }
//! ```

pub mod bundle;
pub mod config;
pub mod error;
pub mod exec;
pub mod rules;
pub mod space;

pub use error::{PortError, Result};
