//! Main entry point for the logistics data generator.
//!
//! Each invocation runs one generation cycle: new orders are created, tracked
//! orders are advanced through their delivery statuses, and both are written
//! to the configured sink. Tracking state persists between invocations.

use clap::Parser;
use logistics_config::Config;
use std::path::{Path, PathBuf};

mod factory_registry;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Command-line arguments for the generator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Seed for reproducible output
	#[arg(long, env = "LOGISTICS_SEED")]
	seed: Option<u64>,

	/// Number of new orders to create
	#[arg(long)]
	orders: Option<usize>,

	/// Number of status updates to attempt in exhaustive mode
	#[arg(long)]
	updates: Option<usize>,
}

/// Main entry point for the generator.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration and applies command-line overrides
/// 4. Builds the engine with the configured backends
/// 5. Runs a single generation cycle and reports its summary
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt().with_env_filter(env_filter).with_target(true).init();

	let config = load_config(&args).await?;
	tracing::info!(
		mode = %config.generator.mode,
		storage = %config.storage.primary,
		sink = %config.sink.primary,
		"Loaded configuration"
	);

	let engine = factory_registry::build_engine_from_config(config)?;
	let summary = engine.run().await?;

	tracing::info!(run_id = %summary.run_id, "Run finished: {}", summary);
	Ok(())
}

/// Reads the configuration file, falling back to built-in defaults when the
/// default file is absent, then applies command-line overrides.
async fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
	let mut config = if args.config.exists() {
		Config::from_file(&args.config).await?
	} else if args.config == Path::new(DEFAULT_CONFIG_PATH) {
		tracing::info!(
			path = %args.config.display(),
			"No configuration file found, using built-in defaults"
		);
		Config::default()
	} else {
		return Err(format!("Configuration file not found: {}", args.config.display()).into());
	};

	apply_overrides(&mut config, args);
	config.validate()?;
	Ok(config)
}

fn apply_overrides(config: &mut Config, args: &Args) {
	if let Some(seed) = args.seed {
		config.generator.seed = Some(seed);
	}
	if let Some(orders) = args.orders {
		config.generator.order_count = orders;
	}
	if let Some(updates) = args.updates {
		config.generator.update_count = updates;
	}
}
