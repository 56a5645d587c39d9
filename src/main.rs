use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use space_porter::bundle::BundleScanner;
use space_porter::config::{CONFIG_FILE_NAME, LoadedConfig, generate_init_template, load_config};
use space_porter::exec::{execute_entry, resolve_command};
use space_porter::space::SpaceRef;

#[derive(Parser)]
#[command(name = "space-porter")]
#[command(
	author,
	version,
	about = "CLI tool for adapting downloaded Gradio Space bundles to run on self-hosted machines"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Use this config file instead of looking up .space-porter.toml
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Log filter (trace, debug, info, warn, error)
	#[arg(long, global = true, default_value = "warn")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Strip platform markers from a bundle and patch its entry file
	Prepare {
		/// Root directory of the downloaded bundle
		bundle: PathBuf,
	},
	/// Strip platform imports and decorators from individual files
	Strip {
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
	/// Force share=True and the bind address onto a file's launch calls
	PatchLaunch { file: PathBuf },
	/// Prepare a bundle and run its entry file
	Run {
		/// Root directory of the downloaded bundle
		bundle: PathBuf,

		/// Interpreter used to run the entry file
		#[arg(long, default_value = "python3")]
		python: String,

		/// Locate the entry file without rewriting anything
		#[arg(long)]
		skip_prepare: bool,
	},
	/// Show the repository id and local directory for a Space URL
	Resolve { url: String },
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration and where it came from
	Show,
	/// Check the configuration for errors without touching any bundle
	Validate,
	/// Create a template .space-porter.toml in the current directory
	Init {
		/// Overwrite an existing file
		#[arg(long)]
		force: bool,
	},
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	let env_filter = EnvFilter::try_new(&cli.log_level)
		.with_context(|| format!("Invalid log level: {}", cli.log_level))?;
	let _ = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.try_init();

	let config_path = cli.config.as_deref();

	match cli.command {
		Commands::Prepare { bundle } => handle_prepare(&bundle, config_path),
		Commands::Strip { files } => handle_strip(&files, config_path),
		Commands::PatchLaunch { file } => handle_patch_launch(&file, config_path),
		Commands::Run {
			bundle,
			python,
			skip_prepare,
		} => handle_run(&bundle, &python, skip_prepare, config_path),
		Commands::Resolve { url } => handle_resolve(&url),
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(config_path),
			ConfigAction::Validate => handle_config_validate(config_path),
			ConfigAction::Init { force } => handle_config_init(force),
		},
	}
}

fn load(config_path: Option<&Path>) -> Result<LoadedConfig> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	load_config(config_path, &cwd).context("Failed to load configuration")
}

fn scanner(config_path: Option<&Path>) -> Result<(LoadedConfig, BundleScanner)> {
	let loaded = load(config_path)?;
	let scanner =
		BundleScanner::from_config(&loaded.config).context("Failed to compile rewrite rules")?;
	Ok((loaded, scanner))
}

fn handle_prepare(bundle: &Path, config_path: Option<&Path>) -> Result<ExitCode> {
	let (_, scanner) = scanner(config_path)?;
	let report = scanner
		.process(bundle)
		.with_context(|| format!("Failed to prepare bundle: {}", bundle.display()))?;

	for path in &report.stripped {
		println!("stripped: {}", path.display());
	}

	match report.entry {
		Some(entry) => {
			println!(
				"entry: {} ({}{})",
				entry.path.display(),
				entry.selection.as_str(),
				if entry.launch_patched {
					", launch patched"
				} else {
					""
				}
			);
			Ok(ExitCode::SUCCESS)
		}
		None => {
			eprintln!("Could not find an entry file in {}", bundle.display());
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_strip(files: &[PathBuf], config_path: Option<&Path>) -> Result<ExitCode> {
	let (_, scanner) = scanner(config_path)?;

	for file in files {
		let changed = scanner
			.strip_file(file)
			.with_context(|| format!("Failed to strip: {}", file.display()))?;
		let status = if changed { "stripped" } else { "unchanged" };
		println!("{status}: {}", file.display());
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_patch_launch(file: &Path, config_path: Option<&Path>) -> Result<ExitCode> {
	let (_, scanner) = scanner(config_path)?;
	let changed = scanner
		.patch_launch_file(file)
		.with_context(|| format!("Failed to patch launch call: {}", file.display()))?;

	let status = if changed { "patched" } else { "unchanged" };
	println!("{status}: {}", file.display());
	Ok(ExitCode::SUCCESS)
}

fn handle_run(
	bundle: &Path,
	python: &str,
	skip_prepare: bool,
	config_path: Option<&Path>,
) -> Result<ExitCode> {
	let (loaded, scanner) = scanner(config_path)?;

	let interpreter = resolve_command(python)
		.ok_or_else(|| anyhow::anyhow!("Interpreter not found: {}", python))?;

	let entry = if skip_prepare && !bundle.is_dir() {
		None
	} else if skip_prepare {
		let files = scanner
			.source_files(bundle)
			.with_context(|| format!("Failed to scan bundle: {}", bundle.display()))?;
		scanner
			.select_entry(bundle, &files)
			.with_context(|| format!("Failed to scan bundle: {}", bundle.display()))?
			.map(|(path, _)| path)
	} else {
		scanner
			.process(bundle)
			.with_context(|| format!("Failed to prepare bundle: {}", bundle.display()))?
			.entry
			.map(|entry| entry.path)
	};

	let entry =
		entry.ok_or_else(|| anyhow::anyhow!("Could not find an entry file in {}", bundle.display()))?;

	let status = execute_entry(&interpreter, bundle, &entry, &loaded.config.launch)
		.with_context(|| format!("Failed to execute: {}", entry.display()))?;

	Ok(ExitCode::from(status.code().unwrap_or(1) as u8))
}

fn handle_resolve(url: &str) -> Result<ExitCode> {
	let space = SpaceRef::parse(url)?;
	println!("repo: {}", space.repo_id());
	println!("directory: {}", space.local_dir_name());
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
	let loaded = load(config_path)?;

	match loaded.path {
		Some(ref path) => println!("# Source: {}", path.display()),
		None => println!("# Source: built-in defaults"),
	}
	let rendered =
		toml::to_string_pretty(&loaded.config).context("Failed to render configuration")?;
	println!("{rendered}");

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(config_path: Option<&Path>) -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	match load_config(config_path, &cwd) {
		Ok(loaded) => {
			match loaded.path {
				Some(path) => println!("Configuration is valid: {}", path.display()),
				None => println!("No configuration file found; using built-in defaults."),
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_config_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}
