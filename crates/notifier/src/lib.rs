//! Outbound email delivery over the notification HTTP service.
//!
//! The transport is a plain HTTP API: POST `/send-email` with the recipient
//! address and the message text. The core never sees more than a boolean —
//! the sender contract collapses timeouts, transport errors and non-success
//! statuses to `false`, and the retry machinery takes it from there.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use herald_common::sender::NotificationSender;

/// Email sender backed by the notification HTTP service.
pub struct EmailSender {
    client: reqwest::Client,
    api_url: String,
}

impl EmailSender {
    /// Build a sender against `api_url` with a per-request timeout.
    pub fn new(api_url: String, timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { client, api_url })
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(&self, recipient: &str, _display_name: &str, message: &str) -> bool {
        let url = format!("{}/send-email", self.api_url);
        let body = json!({
            "email": recipient,
            "message": message,
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    recipient = %recipient,
                    status = %response.status(),
                    "Email service rejected send"
                );
                false
            }
            Err(e) => {
                tracing::warn!(recipient = %recipient, error = %e, "Email send failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;

    /// Spin up a local HTTP server answering `/send-email` with `status`.
    async fn serve_status(status: StatusCode) -> String {
        let app = Router::new().route("/send-email", post(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_send_returns_true_on_success_status() {
        let base = serve_status(StatusCode::OK).await;
        let sender = EmailSender::new(base, 5000).unwrap();
        assert!(sender.send("john@example.com", "John Doe", "hello").await);
    }

    #[tokio::test]
    async fn test_send_returns_false_on_server_error() {
        let base = serve_status(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sender = EmailSender::new(base, 5000).unwrap();
        assert!(!sender.send("john@example.com", "John Doe", "hello").await);
    }

    #[tokio::test]
    async fn test_send_returns_false_when_unreachable() {
        // Nothing listens here; the transport error must collapse to false.
        let sender = EmailSender::new("http://127.0.0.1:1".to_string(), 500).unwrap();
        assert!(!sender.send("john@example.com", "John Doe", "hello").await);
    }
}
