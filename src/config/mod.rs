// Configuration module for keyproxy

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command line arguments. Values given here win over the config file.
#[derive(Debug, Clone, Parser)]
#[command(name = "keyproxy", version, about = "API key proxy for image generation")]
pub struct Cli {
    /// YAML config file
    #[arg(long, env = "KEYPROXY_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "KEYPROXY_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "KEYPROXY_PORT")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path the proxy handlers are mounted under.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Largest accepted request body, in MiB.
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route_prefix: default_route_prefix(),
            gemini_base_url: default_gemini_base_url(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_route_prefix() -> String {
    "/.netlify/functions".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_body_limit_mb() -> usize {
    6
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::info!("Config loaded from {:?}", path);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The prefix is spliced into route paths, so it must be literal.
    pub fn validate(&self) -> Result<()> {
        if let Some(c) = self
            .route_prefix
            .chars()
            .find(|c| matches!(c, ':' | '*' | '{' | '}' | '?' | '#'))
        {
            bail!(
                "route-prefix {:?} contains {:?}; only literal path segments are allowed",
                self.route_prefix,
                c
            );
        }
        Ok(())
    }

    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            &self.host
        };
        format!("{}:{}", host, self.port)
    }

    /// Route prefix normalized to `/segment` form, or empty for the root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.route_prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}
