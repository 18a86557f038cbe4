use crate::error::{MailerError, TransportError};
use crate::message::{DeliveryReceipt, Message};
use crate::transport::MailTransport;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const MAILGUN_API_BASE: &str = "https://api.mailgun.net";
pub const MAILGUN_EU_API_BASE: &str = "https://api.eu.mailgun.net";

/// Sends messages through the Mailgun HTTP API.
#[derive(Clone)]
pub struct MailgunTransport {
    client: reqwest::Client,
    domain: String,
    api_key: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: String,
    #[serde(default)]
    message: String,
}

impl MailgunTransport {
    pub fn new<D, K>(domain: D, api_key: K) -> Result<Self, MailerError>
    where
        D: Into<String>,
        K: Into<String>,
    {
        let client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| MailerError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            domain: domain.into(),
            api_key: api_key.into(),
            api_base: MAILGUN_API_BASE.to_string(),
        })
    }

    /// Point the transport at another API host, e.g. [`MAILGUN_EU_API_BASE`].
    pub fn with_api_base<B: Into<String>>(mut self, api_base: B) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.domain
        )
    }

    fn request(&self, message: &Message, deadline: Duration) -> reqwest::RequestBuilder {
        let form = [
            ("from", message.sender.as_str()),
            ("to", message.recipient.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.plain_body.as_str()),
            ("html", message.html_body.as_str()),
        ];

        self.client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.api_key))
            .timeout(deadline)
            .form(&form)
    }
}

impl fmt::Debug for MailgunTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailgunTransport")
            .field("domain", &self.domain)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[async_trait]
impl MailTransport for MailgunTransport {
    async fn deliver(
        &self,
        message: &Message,
        deadline: Duration,
    ) -> Result<DeliveryReceipt, TransportError> {
        let response = self.request(message, deadline).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read Mailgun rejection body");
                    format!("<unreadable response body: {e}>")
                }
            };
            tracing::error!(status = status.as_u16(), body = %body, "Mailgun rejected message");
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.json::<MailgunResponse>().await?;
        Ok(DeliveryReceipt::new(body.id, body.message))
    }
}
