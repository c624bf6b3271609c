use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use std::time::Duration;
use url::Url;
use super::ChatTransport;
use crate::error::ChatError;
use crate::models::chat::{ ChatRequest, ChatResponse };

const CHAT_ROUTE: &str = "api/chat";

#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: HttpClient,
    endpoint: Url,
}

impl HttpChatClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let endpoint = chat_endpoint(base_url)?;

        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, endpoint })
    }
}

/// Resolves `/api/chat` below `base_url`, keeping any path prefix it has.
pub fn chat_endpoint(base_url: &str) -> Result<Url, ChatError> {
    let base = format!("{}/", base_url.trim().trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join(CHAT_ROUTE))
        .map_err(|source| ChatError::InvalidEndpoint {
            url: base_url.to_string(),
            source,
        })
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        debug!("POST {} (chat_id: {:?})", self.endpoint, request.chat_id);

        let resp = self.http.post(self.endpoint.clone()).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let bytes = resp.bytes().await?;
        let data = serde_json::from_slice::<ChatResponse>(&bytes)?;
        Ok(data)
    }

    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }
}
