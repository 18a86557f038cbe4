//! Templated transactional email.
//!
//! A [`Dispatcher`] loads a named template document from a [`TemplateStore`],
//! renders its `subject`, `plainBody` and `htmlBody` sections against caller
//! data, and hands the result to a [`MailTransport`] under a bounded deadline.
//!
//! ```no_run
//! use postbox::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), MailerError> {
//! let store = DirectoryTemplateStore::new("templates");
//! let dispatcher = Dispatcher::from_config(MailerConfig::from_env()?, store)?;
//!
//! let id = dispatcher
//!     .send("ana@example.com", "welcome.hbs", &json!({"Name": "Ana"}))
//!     .await?;
//! println!("queued as {id}");
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod templates;
pub mod transport;
pub mod transports;

pub use config::{MailerConfig, TransportConfig};
pub use dispatcher::{DEFAULT_DISPATCH_TIMEOUT, Dispatcher};
pub use error::{DeliveryError, MailerError, ParseCause, Stage, TemplateError, TransportError};
pub use message::{DeliveryReceipt, Message};
pub use templates::{
    DirectoryTemplateStore, EmbeddedTemplateStore, MemoryTemplateStore, RenderedTemplate, Section,
    TemplateDocument, TemplateRenderer, TemplateStore,
};
pub use transport::MailTransport;
pub use transports::{MailgunTransport, SmtpTransport};

pub mod prelude {
    pub use crate::{
        DEFAULT_DISPATCH_TIMEOUT, DeliveryError, DeliveryReceipt, DirectoryTemplateStore,
        Dispatcher, EmbeddedTemplateStore, MailTransport, MailerConfig, MailerError,
        MailgunTransport, MemoryTemplateStore, Message, Section, SmtpTransport, Stage,
        TemplateError, TemplateRenderer, TemplateStore, TransportError,
    };
}
