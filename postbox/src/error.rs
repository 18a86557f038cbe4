use crate::templates::Section;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// The stage of a send that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Render,
    Delivery,
}

impl MailerError {
    pub fn stage(&self) -> Stage {
        match self {
            MailerError::Config(_) => Stage::Configuration,
            MailerError::Template(_) => Stage::Render,
            MailerError::Delivery(_) => Stage::Delivery,
        }
    }
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to load template '{template}': {source}")]
    Store {
        template: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template '{template}': {cause}")]
    Parse {
        template: String,
        #[source]
        cause: ParseCause,
    },

    #[error("Template '{template}' has no '{section}' section")]
    SectionMissing { template: String, section: Section },

    #[error("Failed to render '{section}' section of template '{template}': {source}")]
    Render {
        template: String,
        section: Section,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("Template data could not be serialized: {0}")]
    Data(#[from] serde_json::Error),
}

impl TemplateError {
    /// The section that failed, for errors raised while rendering a section.
    pub fn section(&self) -> Option<Section> {
        match self {
            TemplateError::SectionMissing { section, .. } | TemplateError::Render { section, .. } => {
                Some(*section)
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseCause {
    #[error("section '{0}' is never closed")]
    UnterminatedSection(String),

    #[error("section '{0}' is defined more than once")]
    DuplicateSection(String),

    #[error("closing tag without a matching section at byte {0}")]
    UnexpectedClose(usize),

    #[error("syntax error in section '{section}': {source}")]
    Syntax {
        section: String,
        #[source]
        source: handlebars::TemplateError,
    },
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport did not complete within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DeliveryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeliveryError::Timeout(_))
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Email address error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email message error: {0}")]
    Message(#[from] lettre::error::Error),
}

pub type Result<T> = std::result::Result<T, MailerError>;
