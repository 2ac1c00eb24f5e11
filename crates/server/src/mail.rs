//! SMTP delivery for engine mail (password reset links).

use async_trait::async_trait;
use engine::{EngineError, MailMessage, Mailer, ResultEngine};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// Port that speaks TLS from the first byte; every other port upgrades with STARTTLS.
const SUBMISSIONS_PORT: u16 = 465;

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender, e.g. `Kharcha <no-reply@kharcha.app>`.
    pub from: String,
    /// Plain SMTP when false, for local relays such as mailpit.
    pub tls: bool,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

fn mail_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::Mail(err.to_string())
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> ResultEngine<Self> {
        let from = config.from.parse::<Mailbox>().map_err(mail_error)?;
        let builder = match (config.tls, config.port) {
            (false, port) => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(port)
            }
            (true, SUBMISSIONS_PORT) => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(mail_error)?
            }
            (true, port) => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(mail_error)?
                .port(port),
        };
        let builder = match (&config.username, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, message: MailMessage) -> ResultEngine<Message> {
        let to = message.to.parse::<Mailbox>().map_err(mail_error)?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)
            .map_err(mail_error)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> ResultEngine<()> {
        let email = self.build_message(message)?;
        self.transport.send(email).await.map_err(|err| {
            tracing::error!("smtp send failed: {err}");
            mail_error(err)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            from: "Kharcha <no-reply@kharcha.test>".to_string(),
            tls: false,
        }
    }

    #[tokio::test]
    async fn builds_html_message_from_configured_sender() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let email = mailer
            .build_message(MailMessage {
                to: "alice@example.com".to_string(),
                subject: "Password reset".to_string(),
                html: "<p>hi</p>".to_string(),
            })
            .unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("From: Kharcha <no-reply@kharcha.test>"));
        assert!(raw.contains("To: alice@example.com"));
        assert!(raw.contains("Subject: Password reset"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[tokio::test]
    async fn bad_addresses_are_mail_errors() {
        let mut bad = config();
        bad.from = "not an address".to_string();
        assert!(matches!(SmtpMailer::new(&bad), Err(EngineError::Mail(_))));

        let mailer = SmtpMailer::new(&config()).unwrap();
        let err = mailer
            .build_message(MailMessage {
                to: "nobody".to_string(),
                subject: "x".to_string(),
                html: String::new(),
            })
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Mail(_)));
    }
}
