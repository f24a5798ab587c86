// keyproxy - keeps generative API keys on the server

pub mod api;
pub mod config;
pub mod error;
pub mod proxy;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::{AppConfig, Cli};
use crate::proxy::{ApiKeys, HttpUpstream};

pub async fn run() -> Result<()> {
    // .env is optional; real environment variables take precedence
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyproxy_lib=info,tower_http=info".into()),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::info!("Loaded environment from {:?}", path);
    }

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.apply_cli(&cli);

    let keys = ApiKeys::from_env();
    tracing::info!(keys = ?keys, "API keys resolved");

    let state = AppState::new(config, keys, Arc::new(HttpUpstream::new()));
    api::start_server(state).await
}
