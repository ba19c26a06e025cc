mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use tracing::info;
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use crate::cli::Cli;
use crate::config::{
    CONFIG_TEMPLATE,
    Config,
};
use crate::errors::CliError;

// mimalloc seems to work better for windows
#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE));

    set_global_default(subscriber).expect("Setting default subscriber failed");
    let args = Cli::parse();

    if let Some(path) = &args.write_template {
        std::fs::write(path, CONFIG_TEMPLATE).map_err(CliError::io(path))?;
        println!("Wrote configuration template to: {}", path.display());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    }
    .with_cli_args(&args);
    config.validate()?;
    info!("Parsed configuration: {:#?}", config);

    let output = config
        .output
        .clone()
        .ok_or_else(|| CliError::Config("No output directory provided".to_string()))?;
    std::fs::create_dir_all(&output.directory).map_err(CliError::io(&output.directory))?;

    processing::run(&config, &output)
}
