use crate::templates::RenderedTemplate;
use serde::{Deserialize, Serialize};

/// A fully rendered message, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

impl Message {
    pub fn new<F, T>(sender: F, recipient: T, rendered: RenderedTemplate) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        let RenderedTemplate {
            subject,
            plain_body,
            html_body,
        } = rendered;

        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            subject,
            plain_body,
            html_body,
        }
    }
}

/// What a transport returns once the provider has accepted a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider-issued identifier for the accepted message.
    pub id: String,
    /// Free-form provider response, kept for audit logging.
    pub response: String,
}

impl DeliveryReceipt {
    pub fn new<I: Into<String>, R: Into<String>>(id: I, response: R) -> Self {
        Self {
            id: id.into(),
            response: response.into(),
        }
    }
}
