use async_trait::async_trait;

/// Outbound notification transport.
///
/// Implementations must not fail: any internal fault (timeout, transport
/// error, non-success status) collapses to `false`. The core only decides
/// whether and when a send is attempted, never how it travels.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send one notification. Returns `true` on confirmed delivery.
    async fn send(&self, recipient: &str, display_name: &str, message: &str) -> bool;
}
