use crate::error::{MailerError, TransportError};
use crate::message::{DeliveryReceipt, Message};
use crate::transport::MailTransport;
use async_trait::async_trait;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sends messages through an SMTP relay.
///
/// The per-call deadline is not applied here: lettre fixes its socket timeout
/// when the transport is built (see [`SmtpTransportBuilder::timeout`]). The
/// overall deadline is enforced by the caller dropping the send future.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    hostname: String,
}

impl SmtpTransport {
    pub fn builder(hostname: &str) -> SmtpTransportBuilder {
        SmtpTransportBuilder::new(hostname)
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(
        &self,
        message: &Message,
        _deadline: Duration,
    ) -> Result<DeliveryReceipt, TransportError> {
        let message_id = format!("<{}@{}>", uuid::Uuid::new_v4(), self.hostname);
        let email = build_message(message, &message_id)?;

        let response = self.transport.send(email).await?;
        let reply = response.message().collect::<Vec<_>>().join(" ");

        Ok(DeliveryReceipt::new(
            message_id,
            format!("{} {}", response.code(), reply),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsConfig {
    None,
    StartTls,
    Tls,
}

pub struct SmtpTransportBuilder {
    hostname: String,
    port: Option<u16>,
    credentials: Option<Credentials>,
    tls: TlsConfig,
    timeout: Option<Duration>,
}

impl SmtpTransportBuilder {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            port: None,
            credentials: None,
            tls: TlsConfig::StartTls,
            timeout: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(username.to_string(), password.to_string()));
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Socket timeout for each SMTP command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SmtpTransport, MailerError> {
        let relay_error = |e: lettre::transport::smtp::Error| {
            MailerError::Config(format!("Invalid SMTP relay '{}': {e}", self.hostname))
        };

        let mut builder = match self.tls {
            TlsConfig::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.hostname)
            }
            TlsConfig::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.hostname)
                    .map_err(relay_error)?
            }
            TlsConfig::Tls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.hostname).map_err(relay_error)?
            }
        };

        if let Some(port) = self.port {
            builder = builder.port(port);
        }

        if let Some(credentials) = self.credentials {
            builder = builder.credentials(credentials);
        }

        if self.timeout.is_some() {
            builder = builder.timeout(self.timeout);
        }

        Ok(SmtpTransport {
            transport: builder.build(),
            hostname: self.hostname,
        })
    }
}

fn build_message(message: &Message, message_id: &str) -> Result<lettre::Message, TransportError> {
    let email = lettre::Message::builder()
        .from(message.sender.parse()?)
        .to(message.recipient.parse()?)
        .subject(message.subject.clone())
        .message_id(Some(message_id.to_string()))
        .multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(message.plain_body.clone()))
                .singlepart(SinglePart::html(message.html_body.clone())),
        )?;

    Ok(email)
}
