use anyhow::{Context, Result};
use std::env;

use crate::errors::codes::EMPTY_ENVIRONMENT_VAR;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub identity: ServiceIdentity,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Who this process is, for log-line prefixes. Injected wherever incidents
/// are rendered instead of living in ambient global state.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub service_id: String,
    pub env_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("API_PORT must be a valid port number")?,
            },
            identity: ServiceIdentity {
                service_id: env::var("SERVICE_ID")
                    .unwrap_or_else(|_| "sdip-incidents".to_string()),
                env_name: env::var("ENVIRONMENT_NAME")
                    .unwrap_or_else(|_| EMPTY_ENVIRONMENT_VAR.to_string()),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
