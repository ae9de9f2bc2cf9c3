//! reqwest implementation of [`Transport`].

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::{TransportError, TransportResult};

use super::context::ApiConfig;
use super::transport::{Transport, XCommand};

const X_COMMAND: &str = "X-Command";

/// HTTP POST transport for the menu REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Build from the environment. See [`ApiConfig::from_env`].
    pub fn from_env() -> TransportResult<Self> {
        Ok(Self::new(ApiConfig::from_env()?))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn call(&self, menu_id: &str, command: XCommand, body: Option<&Value>) -> TransportResult<Value> {
        let url = self.config.menu_url(menu_id)?;
        log::debug!("POST {} ({})", url, command);

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(reqwest::header::AUTHORIZATION, self.config.credential())
            .header(X_COMMAND, command.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::InvalidJson(e.to_string()))
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, menu_id: &str, command: XCommand, params: Option<&Value>) -> TransportResult<Value> {
        self.call(menu_id, command, params).await
    }

    async fn submit(&self, menu_id: &str, command: XCommand, payload: &Value) -> TransportResult<Value> {
        let response = self.call(menu_id, command, Some(payload)).await?;

        if command == XCommand::Edit {
            if let Some(wait) = self.config.edit_wait {
                log::debug!("Waiting {:?} after EDIT", wait);
                tokio::time::sleep(wait).await;
            }
        }
        Ok(response)
    }
}
