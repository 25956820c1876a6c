use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use weather_core::provider::provider_from_config;
use weather_core::{
    Config, ResolveError, SqliteStore, SystemClock, WeatherRequest, WeatherService,
};

use crate::{query, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Cached weather lookup service")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind, overriding the configured one.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create the cache database schema.
    InitDb,

    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Resolve weather once and print it as JSON.
    Show {
        #[arg(long)]
        city: String,

        /// Two-letter country code.
        #[arg(long)]
        country: String,

        /// Date/time as DD.MM.YYYYTHH:MM (UTC); if absent, means "now".
        #[arg(long)]
        date: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let store = open_store(&config).await?;
                let service = build_service(&config, &store)?;

                server::run(Arc::new(service), &bind).await?;
                store.close().await;
            }
            Command::InitDb => {
                let store = open_store(&config).await?;
                store.close().await;
                println!("Database ready at {}", config.database.path.display());
            }
            Command::Configure => {
                let api_key = inquire::Password::new("OpenWeather API key:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.set_api_key(api_key.trim().to_string());
                config.save_to(&config_path)?;
                println!("Saved configuration to {}", config_path.display());
            }
            Command::Show { city, country, date } => {
                let request = query::WeatherQuery {
                    country_code: Some(country),
                    city: Some(city),
                    date,
                }
                .validate_or_now(chrono::Utc::now())
                .map_err(ResolveError::Validation)
                .map_err(|err| anyhow::anyhow!("{err}: {}", err.body()))?;

                let store = open_store(&config).await?;
                let service = build_service(&config, &store)?;
                let result = show(&service, &request).await;
                store.close().await;
                result?;
            }
        }

        Ok(())
    }
}

async fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
    store.migrate().await.context("Failed to create database schema")?;
    info!(path = %config.database.path.display(), "cache database ready");
    Ok(store)
}

fn build_service(config: &Config, store: &SqliteStore) -> anyhow::Result<WeatherService> {
    let provider = provider_from_config(config)?;
    Ok(WeatherService::new(
        Arc::new(store.clone()),
        Arc::new(provider),
        Arc::new(SystemClock),
    ))
}

async fn show(service: &WeatherService, request: &WeatherRequest) -> anyhow::Result<()> {
    let reply = service.respond(request).await;
    let body = serde_json::to_string_pretty(&reply.body)?;

    if reply.status != 200 {
        bail!("Lookup failed with status {}:\n{body}", reply.status);
    }

    println!("{body}");
    Ok(())
}
