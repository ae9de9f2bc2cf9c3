//! Connection settings for the ITA REST endpoint.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;

use crate::error::{TransportError, TransportResult};

pub const PROTOCOL: &str = "EXASTRO_PROTOCOL";
pub const HOST: &str = "EXASTRO_HOST";
pub const PORT: &str = "EXASTRO_PORT";
pub const USERNAME: &str = "EXASTRO_USERNAME";
pub const PASSWORD: &str = "EXASTRO_PASSWORD";
pub const EDIT_WAIT_MS: &str = "EXASTRO_EDIT_WAIT_MS";

const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;

/// Path of the menu REST entry point.
const MENU_PATH: &str = "/default/menu/07_rest_api_ver1.php";

/// Endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Delay after each successful EDIT round trip.
    pub edit_wait: Option<Duration>,
}

impl ApiConfig {
    /// Read the configuration from the environment, loading `.env` first.
    pub fn from_env() -> TransportResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration from `overrides`, then the environment.
    pub fn from_env_with(overrides: &HashMap<String, String>) -> TransportResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| overrides.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> TransportResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| TransportError::MissingConfig(key.to_string()));

        let port = match lookup(PORT) {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| TransportError::MissingConfig(format!("{} (not a port number: {})", PORT, port)))?,
            None => DEFAULT_PORT,
        };

        let edit_wait = match lookup(EDIT_WAIT_MS) {
            Some(ms) => Some(Duration::from_millis(ms.trim().parse().map_err(|_| {
                TransportError::MissingConfig(format!("{} (not a number of milliseconds: {})", EDIT_WAIT_MS, ms))
            })?)),
            None => None,
        };

        Ok(Self {
            protocol: lookup(PROTOCOL).unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            host: lookup(HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            username: required(USERNAME)?,
            password: required(PASSWORD)?,
            edit_wait,
        })
    }

    /// Value of the `Authorization` header: base64 of `username:password`.
    pub fn credential(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }

    /// REST URL of one menu.
    pub fn menu_url(&self, menu_id: &str) -> TransportResult<Url> {
        let base = format!("{}://{}:{}{}", self.protocol, self.host, self.port, MENU_PATH);
        Url::parse_with_params(&base, &[("no", menu_id)]).map_err(|e| TransportError::Http(e.to_string()))
    }
}
