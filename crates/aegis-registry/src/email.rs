//! Outbound email capability.
//!
//! The transport is pluggable and chosen by configuration: an SMTP relay
//! handoff, a provider HTTP API, or a log-only sender for environments
//! with no outbound mail. Senders are trait objects behind the [`Email`]
//! handle registered at startup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Well-known section key for [`EmailConfiguration`].
pub const EMAIL_SECTION: &str = "email";

/// A boxed future returned by sender implementations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Email capability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfiguration {
    /// Transport selection: `smtp`, `api`, or `log`.
    pub provider: String,
    /// Sender address for outbound mail.
    pub from: String,
    /// SMTP relay settings, used when `provider = "smtp"`.
    pub smtp: SmtpSettings,
    /// Provider-API settings, used when `provider = "api"`.
    pub api: ApiSettings,
}

impl Default for EmailConfiguration {
    fn default() -> Self {
        Self {
            provider: "log".to_string(),
            from: "no-reply@localhost".to_string(),
            smtp: SmtpSettings::default(),
            api: ApiSettings::default(),
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
        }
    }
}

/// Provider HTTP API settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Endpoint the message document is posted to.
    pub endpoint: String,
    /// Bearer credential for the endpoint.
    pub api_key: String,
}

/// An outbound message.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Errors raised by email transports at send time.
#[derive(Error, Debug)]
pub enum EmailError {
    /// The transport could not be reached.
    #[error("email transport error: {0}")]
    Transport(String),

    /// The transport rejected the message.
    #[error("email rejected by transport: {0}")]
    Rejected(String),
}

/// A pluggable outbound email transport.
pub trait EmailSender: Send + Sync {
    /// Transport name for logs.
    fn name(&self) -> &'static str;

    /// Sends one message.
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), EmailError>>;
}

/// The registered email capability handle.
pub struct Email {
    sender: Arc<dyn EmailSender>,
}

impl Email {
    /// Wraps a transport.
    #[must_use]
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// The selected transport.
    #[must_use]
    pub fn sender(&self) -> &dyn EmailSender {
        self.sender.as_ref()
    }
}

impl std::fmt::Debug for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Email")
            .field("sender", &self.sender.name())
            .finish()
    }
}

/// Log-only transport for environments with no outbound mail.
#[derive(Debug, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            tracing::info!(to = %message.to, subject = %message.subject, "email (log transport)");
            Ok(())
        })
    }
}

/// Provider-API transport: posts the message document over HTTPS.
#[derive(Debug)]
pub struct ApiEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ApiEmailSender {
    /// Creates the transport from its settings.
    #[must_use]
    pub fn new(settings: &ApiSettings, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            from: from.into(),
        }
    }
}

impl EmailSender for ApiEmailSender {
    fn name(&self) -> &'static str {
        "api"
    }

    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            let payload = serde_json::json!({
                "from": self.from,
                "to": message.to,
                "subject": message.subject,
                "body": message.body,
            });

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await
                .map_err(|e| EmailError::Transport(e.to_string()))?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(EmailError::Rejected(format!(
                    "provider returned {}",
                    response.status()
                )))
            }
        })
    }
}

/// SMTP relay transport.
///
/// Hands the message to the configured relay over a plain-text dialogue;
/// onward delivery, authentication, and TLS are the relay's concern.
#[derive(Debug)]
pub struct SmtpEmailSender {
    host: String,
    port: u16,
    from: String,
}

impl SmtpEmailSender {
    /// Creates the transport from its settings.
    #[must_use]
    pub fn new(settings: &SmtpSettings, from: impl Into<String>) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            from: from.into(),
        }
    }

    async fn expect_code(
        reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
        expected: u16,
    ) -> Result<(), EmailError> {
        // Multi-line replies use `ddd-`; the final line is `ddd `.
        loop {
            let mut line = String::new();
            reader
                .read_line(&mut line)
                .await
                .map_err(|e| EmailError::Transport(e.to_string()))?;

            if line.len() < 4 {
                return Err(EmailError::Transport(format!("short reply: {line:?}")));
            }
            let code: u16 = line[..3]
                .parse()
                .map_err(|_| EmailError::Transport(format!("bad reply: {line:?}")))?;

            if line.as_bytes()[3] == b'-' {
                continue;
            }
            if code == expected {
                return Ok(());
            }
            return Err(EmailError::Rejected(line.trim_end().to_string()));
        }
    }
}

impl EmailSender for SmtpEmailSender {
    fn name(&self) -> &'static str {
        "smtp"
    }

    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            let stream = TcpStream::connect((self.host.as_str(), self.port))
                .await
                .map_err(|e| EmailError::Transport(e.to_string()))?;
            let (read_half, mut writer) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            Self::expect_code(&mut reader, 220).await?;

            let exchange = [
                ("EHLO aegis\r\n".to_string(), 250),
                (format!("MAIL FROM:<{}>\r\n", self.from), 250),
                (format!("RCPT TO:<{}>\r\n", message.to), 250),
                ("DATA\r\n".to_string(), 354),
                (
                    format!(
                        "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}\r\n.\r\n",
                        self.from, message.to, message.subject, message.body
                    ),
                    250,
                ),
            ];

            for (command, expected) in exchange {
                writer
                    .write_all(command.as_bytes())
                    .await
                    .map_err(|e| EmailError::Transport(e.to_string()))?;
                Self::expect_code(&mut reader, expected).await?;
            }

            let _ = writer.write_all(b"QUIT\r\n").await;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_default_configuration_is_log_transport() {
        let config = EmailConfiguration::default();
        assert_eq!(config.provider, "log");
        assert_eq!(config.smtp.port, 587);
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let sender = LogEmailSender;
        let message = EmailMessage {
            to: "alice@example.com".to_string(),
            subject: "Reset your password".to_string(),
            body: "token".to_string(),
        };
        sender.send(&message).await.unwrap();
    }

    #[tokio::test]
    async fn test_smtp_sender_speaks_to_relay() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let relay = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 relay ready\r\n").await.unwrap();

            let mut collected = Vec::new();
            let mut buf = [0u8; 1024];
            // EHLO, MAIL FROM, RCPT TO, DATA, payload, QUIT
            for reply in [
                "250 ok\r\n",
                "250 ok\r\n",
                "250 ok\r\n",
                "354 go ahead\r\n",
                "250 queued\r\n",
            ] {
                let n = socket.read(&mut buf).await.unwrap();
                collected.extend_from_slice(&buf[..n]);
                socket.write_all(reply.as_bytes()).await.unwrap();
            }
            String::from_utf8(collected).unwrap()
        });

        let sender = SmtpEmailSender::new(
            &SmtpSettings {
                host: addr.ip().to_string(),
                port: addr.port(),
            },
            "no-reply@auth.example.com",
        );

        let message = EmailMessage {
            to: "alice@example.com".to_string(),
            subject: "hello".to_string(),
            body: "body".to_string(),
        };
        sender.send(&message).await.unwrap();

        let transcript = relay.await.unwrap();
        assert!(transcript.contains("MAIL FROM:<no-reply@auth.example.com>"));
        assert!(transcript.contains("RCPT TO:<alice@example.com>"));
        assert!(transcript.contains("Subject: hello"));
    }

    #[tokio::test]
    async fn test_smtp_sender_surfaces_rejection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 relay ready\r\n").await.unwrap();
            let mut buf = [0u8; 256];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(b"550 denied\r\n").await.unwrap();
        });

        let sender = SmtpEmailSender::new(
            &SmtpSettings {
                host: addr.ip().to_string(),
                port: addr.port(),
            },
            "no-reply@auth.example.com",
        );

        let message = EmailMessage {
            to: "alice@example.com".to_string(),
            subject: "hello".to_string(),
            body: "body".to_string(),
        };
        let err = sender.send(&message).await.unwrap_err();
        assert!(matches!(err, EmailError::Rejected(_)));
    }
}
