//! layercfg demo
//!
//! Resolves a sample service configuration from built-in defaults,
//! `config.{yaml,json,bin}` in the current directory or the user config
//! directory, `LAYERCFG_*` environment variables and command-line flags, then
//! prints the result.

use anyhow::Result;
use layercfg::{ConfigError, Loader};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const APP_NAME: &str = "layercfg";
const ENV_PREFIX: &str = "LAYERCFG";
const LOG_ENV: &str = "LAYERCFG_LOG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Database {
    hostname: String,
    port: u16,
    max_conns: u32,
    url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Output {
    /// Print JSON instead of YAML.
    json: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ServiceConfig {
    name: String,
    http_bind_address: String,
    debug: bool,
    request_timeout_ms: u64,
    tags: Vec<String>,
    max_temperatures: Vec<f64>,
    database: Database,
    output: Output,
}

layercfg::record!(Database { hostname, port, max_conns, url => "DATABASE_URL" });
layercfg::record!(Output { json });
layercfg::record!(ServiceConfig {
    name,
    http_bind_address,
    debug,
    request_timeout_ms,
    tags,
    max_temperatures,
    database,
    output,
});

fn defaults() -> ServiceConfig {
    ServiceConfig {
        name: "demo".to_string(),
        http_bind_address: "127.0.0.1:8080".to_string(),
        request_timeout_ms: 30_000,
        database: Database {
            hostname: "localhost".to_string(),
            port: 5432,
            max_conns: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let loader = Loader::new()
        .env_prefix(ENV_PREFIX)
        .add_user_config_dir(APP_NAME)
        .bin_name("layercfg-demo");

    let report = match loader.load_report(&[defaults()]) {
        Ok(report) => report,
        // --help, unknown options: let clap print and pick the exit code
        Err(ConfigError::Flags(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };

    for contribution in report.contributions() {
        match &contribution.path {
            Some(path) => info!(tier = %contribution.tier, path = %path.display(), "Contributed"),
            None => info!(tier = %contribution.tier, "Contributed"),
        }
    }

    let config = report.into_config();
    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
    }

    Ok(())
}
