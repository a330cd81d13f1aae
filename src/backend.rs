use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ExchangeRequest {
    tools: Vec<String>,
    message: String,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    response: String,
}

/// Client for the PowerUp backend. One POST per exchange; no streaming.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one utterance plus the active capability list, returning the
    /// assistant's reply. Non-2xx status and unparseable bodies are errors.
    pub async fn exchange(&self, tools: Vec<String>, message: &str) -> Result<String> {
        let url = format!("{}/powerup-demo", self.base_url);

        let request = ExchangeRequest {
            tools,
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "PowerUp request failed with status: {}",
                response.status()
            ));
        }

        let exchange: ExchangeResponse = response.json().await?;
        Ok(exchange.response)
    }
}
