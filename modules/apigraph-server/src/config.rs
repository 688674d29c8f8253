use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use apigraph_client::BackendConfig;
use apigraph_core::CompileConfig;

const DEFAULT_SERVICES: &str = "ec2,s3,textract,iam";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Descriptions
    pub descriptions_dir: PathBuf,
    pub services: Vec<String>,
    pub strict_conflicts: bool,

    // Backend
    pub backend_base_url: String,
    pub backend_region: Option<String>,
    pub backend_timeout: Option<Duration>,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            descriptions_dir: env::var("APIGRAPH_DESCRIPTIONS_DIR")
                .unwrap_or_else(|_| "apis".to_string())
                .into(),
            services: parse_list(
                &env::var("APIGRAPH_SERVICES").unwrap_or_else(|_| DEFAULT_SERVICES.to_string()),
            ),
            strict_conflicts: env::var("APIGRAPH_STRICT_CONFLICTS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            backend_base_url: env::var("BACKEND_BASE_URL")
                .context("BACKEND_BASE_URL environment variable is required")?,
            backend_region: env::var("BACKEND_REGION").ok(),
            backend_timeout: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .map(|s| s.parse::<u64>())
                .transpose()
                .context("BACKEND_TIMEOUT_SECS must be a number")?
                .map(Duration::from_secs),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("WEB_PORT must be a number")?,
        };

        tracing::info!("Config loaded:");
        tracing::info!("  APIGRAPH_DESCRIPTIONS_DIR: {}", config.descriptions_dir.display());
        tracing::info!("  APIGRAPH_SERVICES: {}", config.services.join(","));
        tracing::info!("  BACKEND_BASE_URL: {}", config.backend_base_url);
        Ok(config)
    }

    pub fn compile_config(&self) -> CompileConfig {
        CompileConfig {
            services: self.services.clone(),
            strict_conflicts: self.strict_conflicts,
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        let mut backend = BackendConfig::new(&self.backend_base_url);
        if let Some(region) = &self.backend_region {
            backend = backend.with_region(region.clone());
        }
        if let Some(timeout) = self.backend_timeout {
            backend = backend.with_timeout(timeout);
        }
        backend
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
