//! Outbound email, used for password reset links.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{EngineError, ResultEngine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery seam for [`MailMessage`]s.
///
/// Unlike [`Notifier`](crate::Notifier) a send can fail and the caller sees
/// the failure as [`EngineError::Mail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> ResultEngine<()>;
}

/// Logs and drops every message. Used when no SMTP relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: MailMessage) -> ResultEngine<()> {
        tracing::warn!(to = %message.to, subject = %message.subject, "no mailer configured, email dropped");
        Ok(())
    }
}

/// Keeps sent messages in memory. `failing()` builds one that rejects every send.
#[derive(Debug, Default, Clone)]
pub struct RecordingMailer {
    messages: Arc<Mutex<Vec<MailMessage>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<MailMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> ResultEngine<()> {
        if self.fail {
            return Err(EngineError::Mail("relay refused message".to_string()));
        }
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
        Ok(())
    }
}
