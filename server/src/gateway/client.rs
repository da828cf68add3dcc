use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{GatewayError, Result};

/// Connection settings for the backend REST API.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Upper bound for a single request
    pub timeout: Duration,
}

/// HTTP client for the pod/customer REST API
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.filter(|t| !t.is_empty()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a collection, e.g. `/pods`
    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    /// URL of a single item, with the id percent-encoded
    pub fn item_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(id)
        )
    }

    /// GET with optional query parameters
    pub async fn get<Q: Serialize + ?Sized>(&self, url: &str, query: Option<&Q>) -> Result<Value> {
        let mut request = self.request(Method::GET, url);
        if let Some(query) = query {
            request = request.query(query);
        }
        self.send(request).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Value> {
        self.send(self.request(Method::POST, url).json(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Value> {
        self.send(self.request(Method::PATCH, url).json(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.send(self.request(Method::DELETE, url)).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("Backend: {} {}", method, url);
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        // 204 and other empty bodies
        if body.is_empty() {
            return Ok(json!({ "success": true }));
        }

        Ok(serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        }))
    }
}
