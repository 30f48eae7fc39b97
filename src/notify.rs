//! Outbound notifications (OTP delivery).
//!
//! Delivery is best effort. [`dispatch`] never fails: if the configured
//! channel errors, the code is written to the log instead so a developer can
//! still complete verification.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("relay request failed: {0}")]
    Transport(String),
    #[error("relay rejected message with status {0}")]
    Rejected(u16),
}

/// What gets sent to a recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Otp { code: u32 },
}

impl Notification {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Otp { .. } => "Your OTP Code",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Otp { code } => format!("Your verification code is {}", code),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, message: &Notification) -> Result<(), NotifyError>;

    /// Short label for logs
    fn channel(&self) -> &'static str;
}

/// Development channel: writes the message to the log
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, recipient: &str, message: &Notification) -> Result<(), NotifyError> {
        log_to_console(recipient, message);
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "console"
    }
}

/// Sends mail by POSTing JSON to an HTTP mail relay
pub struct MailRelayNotifier {
    client: reqwest::Client,
    relay_url: String,
    from: String,
    service: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    service: &'a str,
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

impl MailRelayNotifier {
    pub fn new(
        relay_url: &str,
        from: &str,
        service: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(Self {
            client,
            relay_url: relay_url.to_string(),
            from: from.to_string(),
            service: service.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, recipient: &str, message: &Notification) -> Result<(), NotifyError> {
        let body = RelayMessage {
            service: &self.service,
            from: &self.from,
            to: recipient,
            subject: message.subject(),
            text: message.body(),
        };

        let resp = self
            .client
            .post(&self.relay_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status().as_u16()));
        }
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "mail-relay"
    }
}

fn log_to_console(recipient: &str, message: &Notification) {
    match message {
        Notification::Otp { code } => info!("OTP for {}: {}", recipient, code),
    }
}

/// Deliver through `notifier`, falling back to the log on failure.
pub async fn dispatch(notifier: &dyn Notifier, recipient: &str, message: &Notification) {
    match notifier.send(recipient, message).await {
        Ok(()) => debug!("Notification sent to {} via {}", recipient, notifier.channel()),
        Err(e) => {
            warn!("{} send failed, falling back to console log: {}", notifier.channel(), e);
            log_to_console(recipient, message);
        }
    }
}

/// Same as [`dispatch`] but does not wait for delivery
pub fn dispatch_detached(notifier: Arc<dyn Notifier>, recipient: String, message: Notification) {
    tokio::spawn(async move {
        dispatch(notifier.as_ref(), &recipient, &message).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_message_text() {
        let msg = Notification::Otp { code: 123456 };
        assert_eq!(msg.subject(), "Your OTP Code");
        assert_eq!(msg.body(), "Your verification code is 123456");
    }

    #[tokio::test]
    async fn test_console_always_succeeds() {
        let msg = Notification::Otp { code: 111111 };
        assert!(ConsoleNotifier.send("a@x.com", &msg).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_relay_errors_but_dispatch_swallows() {
        // Port 9 (discard) is closed on loopback, so the connect is refused
        let relay = MailRelayNotifier::new(
            "http://127.0.0.1:9/send",
            "noreply@x.com",
            "gmail",
            Duration::from_secs(2),
        )
        .unwrap();
        let msg = Notification::Otp { code: 222222 };

        assert!(relay.send("a@x.com", &msg).await.is_err());
        // Must return normally
        dispatch(&relay, "a@x.com", &msg).await;
    }
}
