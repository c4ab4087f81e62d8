//! HTTP client for the unlock API of a running host

use anyhow::{bail, Context, Result};
use pd_core::{LockReceipt, SESSION_HEADER};
use pd_server::http::auth::{StatusResponse, UnlockResponse};
use serde_json::{json, Value};

/// Default address of a local host
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:7420";

/// Client for `/api/auth`
pub struct DeskClient {
    base: String,
    http: reqwest::Client,
}

impl DeskClient {
    pub fn new(server: &str) -> Self {
        Self {
            base: format!("{}/api/auth", server.trim_end_matches('/')),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub async fn unlock(&self, password: &str, client_id: Option<&str>) -> Result<UnlockResponse> {
        let response = self
            .http
            .post(format!("{}/unlock", self.base))
            .json(&json!({ "password": password, "clientId": client_id }))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base))?;
        decode(response).await
    }

    pub async fn status(&self, token: &str) -> Result<StatusResponse> {
        let response = self
            .http
            .get(format!("{}/status", self.base))
            .header(SESSION_HEADER, token)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base))?;
        decode(response).await
    }

    pub async fn lock(&self, token: &str) -> Result<LockReceipt> {
        let response = self
            .http
            .post(format!("{}/lock", self.base))
            .header(SESSION_HEADER, token)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base))?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("Malformed response from server");
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body["error"].as_str().unwrap_or("request failed");
    match body["reason"].as_str() {
        Some(reason) => bail!("{} ({}, HTTP {})", message, reason, status.as_u16()),
        None => bail!("{} (HTTP {})", message, status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(
            DeskClient::new("http://localhost:7420/").base_url(),
            "http://localhost:7420/api/auth"
        );
        assert_eq!(
            DeskClient::new(DEFAULT_SERVER).base_url(),
            "http://127.0.0.1:7420/api/auth"
        );
    }
}
