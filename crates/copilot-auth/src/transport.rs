//! The transport seam: anything that can execute an HTTP request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};
use tokio_util::sync::CancellationToken;

use crate::error::SendError;

/// Executes HTTP requests.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Execute `request`, giving up with [`SendError::Cancelled`] once `cancel` fires.
    async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Response, SendError>;
}

/// Shared transport reference.
pub type SharedTransport = Arc<dyn Transport>;

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Response, SendError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SendError::Cancelled),
            result = reqwest::Client::execute(self, request) => result.map_err(SendError::Transport),
        }
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Response, SendError> {
        (**self).execute(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reqwest_transport_honours_cancellation() {
        let client = reqwest::Client::new();
        let request = client.get("http://127.0.0.1:9/never").build().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = Transport::execute(&client, request, &cancel).await;
        assert!(matches!(result, Err(SendError::Cancelled)));
    }
}
