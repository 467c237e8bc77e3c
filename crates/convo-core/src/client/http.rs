//! HTTPS implementation of [`ConversationApi`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;
use tracing::debug;

use super::ConversationApi;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{
    Conversation, ConversationList, CreateConversationRequest, CreateConversationResponse,
    CreateOutcome,
};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the Conversation API
#[derive(Clone)]
pub struct ConversationClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ConversationClient {
    /// Create a client from config. Fails without an API key.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?.to_string();
        Self::with_base_url(
            &config.api.base_url,
            api_key,
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build request with auth headers.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("API request: {} {}", method, url);

        self.client
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key)
    }

    /// Map a non-success response to `Error::Api`.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let error_text = resp.text().await.unwrap_or_default();
            Err(Error::api(status.as_u16(), error_text))
        }
    }
}

#[async_trait]
impl ConversationApi for ConversationClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let resp = self.request(Method::GET, "/conversations").send().await?;
        let resp = Self::check(resp).await?;

        let list: ConversationList = resp.json().await?;
        Ok(list.into_vec())
    }

    async fn end_conversation(&self, conversation_id: &str) -> Result<()> {
        let path = format!("/conversations/{}/end", conversation_id);
        let resp = self.request(Method::POST, &path).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn create_conversation(&self, req: &CreateConversationRequest) -> Result<CreateOutcome> {
        let resp = self
            .request(Method::POST, "/conversations")
            .json(req)
            .send()
            .await?;

        let http_status = resp.status().as_u16();
        let text = resp.text().await?;
        debug!("Create conversation answered {} ({} bytes)", http_status, text.len());

        let body = if text.trim().is_empty() {
            CreateConversationResponse::default()
        } else {
            serde_json::from_str(&text)?
        };

        Ok(CreateOutcome { http_status, body })
    }
}
