mod mailgun;
pub mod smtp;

pub use mailgun::{MAILGUN_API_BASE, MAILGUN_EU_API_BASE, MailgunTransport};
pub use smtp::{SmtpTransport, TlsConfig};
