mod document;
mod helpers;
mod renderer;
mod store;

pub use document::TemplateDocument;
pub use renderer::TemplateRenderer;
pub use store::{DirectoryTemplateStore, EmbeddedTemplateStore, MemoryTemplateStore, TemplateStore};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three independently rendered parts of a template document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "subject")]
    Subject,
    #[serde(rename = "plainBody")]
    PlainBody,
    #[serde(rename = "htmlBody")]
    HtmlBody,
}

impl Section {
    /// Sections in the order they are rendered.
    pub const ORDER: [Section; 3] = [Section::Subject, Section::PlainBody, Section::HtmlBody];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Subject => "subject",
            Section::PlainBody => "plainBody",
            Section::HtmlBody => "htmlBody",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The output of rendering all three sections of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedTemplate {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}
