//! Configuration loading and parsing for space-porter.
//!
//! This module handles:
//! - TOML config file parsing and validation
//! - Config file lookup (explicit path, working directory, home directory)
//! - The `config init` template

pub mod loader;
pub mod parser;
pub mod types;

pub use loader::{CONFIG_FILE_NAME, generate_init_template, load_config, user_config_path};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{Config, LaunchConfig, LoadedConfig, MarkerConfig, ScanConfig};
