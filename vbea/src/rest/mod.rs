pub mod endpoints;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, VbeaError};

/// Header carrying the client-generated idempotency key on mutating calls.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// HTTP client wrapper for the VirtuBeauty REST API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(query).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VbeaError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(VbeaError::Request)
    }

    /// GET with a bearer token, caring only about the status class.
    pub async fn get_status(&self, path: &str, token: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).bearer_auth(token).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VbeaError::Http {
                status,
                message: body,
            });
        }
        Ok(())
    }

    /// POST a JSON body, optionally authenticated, decoding a JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VbeaError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(VbeaError::Request)
    }

    /// POST a JSON body, caring only about the status class.
    pub async fn post_json_status<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VbeaError::Http {
                status,
                message: body,
            });
        }
        Ok(())
    }

    /// POST without a body, authenticated, caring only about the status class.
    pub async fn post_empty(&self, path: &str, token: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).bearer_auth(token).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VbeaError::Http {
                status,
                message: body,
            });
        }
        Ok(())
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
