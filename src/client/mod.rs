pub mod http;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use crate::cli::Args;
use crate::error::ChatError;
use crate::models::chat::{ ChatRequest, ChatResponse };
use self::http::HttpChatClient;

/// One request/response exchange with the chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;

    fn endpoint(&self) -> String;
}

pub fn new_client(args: &Args) -> Result<Arc<dyn ChatTransport>, ChatError> {
    let timeout = match args.timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let client = HttpChatClient::new(&args.api_url, timeout)?;
    Ok(Arc::new(client))
}
