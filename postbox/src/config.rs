use crate::dispatcher::DEFAULT_DISPATCH_TIMEOUT;
use crate::transport::MailTransport;
use crate::transports::{MAILGUN_API_BASE, MailgunTransport, SmtpTransport, TlsConfig};
use crate::MailerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub sender: String,
    pub transport: TransportConfig,
    #[serde(with = "duration_secs", default = "default_dispatch_timeout")]
    pub dispatch_timeout: Duration,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Mailgun {
        domain: String,
        api_key: String,
        api_base: Option<String>,
    },
    Smtp {
        host: String,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
        tls: Option<TlsConfig>,
    },
}

fn default_dispatch_timeout() -> Duration {
    DEFAULT_DISPATCH_TIMEOUT
}

impl MailerConfig {
    pub fn mailgun<S, D, K>(sender: S, domain: D, api_key: K) -> Self
    where
        S: Into<String>,
        D: Into<String>,
        K: Into<String>,
    {
        Self {
            sender: sender.into(),
            transport: TransportConfig::Mailgun {
                domain: domain.into(),
                api_key: api_key.into(),
                api_base: None,
            },
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, MailerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, using the same variable
    /// names as [`MailerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MailerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| MailerError::Config(format!("{key} environment variable is required")))
        };

        let transport = if let Some(host) = lookup("MAILER_SMTP_HOST") {
            let port = match lookup("MAILER_SMTP_PORT") {
                Some(port) => Some(port.trim().parse::<u16>().map_err(|_| {
                    MailerError::Config(format!("MAILER_SMTP_PORT is not a valid port: {port}"))
                })?),
                None => None,
            };
            let tls = lookup("MAILER_SMTP_TLS").map(|tls| parse_tls(&tls)).transpose()?;

            TransportConfig::Smtp {
                host,
                port,
                username: lookup("MAILER_SMTP_USERNAME"),
                password: lookup("MAILER_SMTP_PASSWORD"),
                tls,
            }
        } else {
            TransportConfig::Mailgun {
                api_key: require("MAILGUN_API_KEY")?,
                domain: require("MAILGUN_DOMAIN")?,
                api_base: lookup("MAILGUN_API_BASE"),
            }
        };

        let dispatch_timeout = match lookup("MAILER_DISPATCH_TIMEOUT_SECS") {
            Some(secs) => secs.parse().map(Duration::from_secs).map_err(|_| {
                MailerError::Config(format!("MAILER_DISPATCH_TIMEOUT_SECS is not a number: {secs}"))
            })?,
            None => DEFAULT_DISPATCH_TIMEOUT,
        };

        let config = Self {
            sender: require("MAILER_SENDER")?,
            transport,
            dispatch_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MailerError> {
        if self.sender.trim().is_empty() {
            return Err(MailerError::Config("Sender address is required".to_string()));
        }

        if self.dispatch_timeout.is_zero() {
            return Err(MailerError::Config(
                "Dispatch timeout must be greater than zero".to_string(),
            ));
        }

        match &self.transport {
            TransportConfig::Mailgun {
                domain, api_key, ..
            } => {
                if api_key.trim().is_empty() {
                    return Err(MailerError::Config("Mailgun API key is required".to_string()));
                }
                if domain.trim().is_empty() {
                    return Err(MailerError::Config("Mailgun domain is required".to_string()));
                }
            }
            TransportConfig::Smtp {
                host,
                username,
                password,
                ..
            } => {
                if host.trim().is_empty() {
                    return Err(MailerError::Config("SMTP host is required".to_string()));
                }
                match (username, password) {
                    (Some(_), None) => {
                        return Err(MailerError::Config(
                            "SMTP username is set without a password".to_string(),
                        ));
                    }
                    (None, Some(_)) => {
                        return Err(MailerError::Config(
                            "SMTP password is set without a username".to_string(),
                        ));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    pub fn build_transport(&self) -> Result<Box<dyn MailTransport>, MailerError> {
        self.validate()?;

        match &self.transport {
            TransportConfig::Mailgun {
                domain,
                api_key,
                api_base,
            } => {
                let transport = MailgunTransport::new(domain, api_key)?
                    .with_api_base(api_base.as_deref().unwrap_or(MAILGUN_API_BASE));
                Ok(Box::new(transport))
            }
            TransportConfig::Smtp {
                host,
                port,
                username,
                password,
                tls,
            } => {
                let mut builder = SmtpTransport::builder(host).timeout(self.dispatch_timeout);

                if let Some(port) = port {
                    builder = builder.port(*port);
                }

                if let (Some(username), Some(password)) = (username, password) {
                    builder = builder.credentials(username, password);
                }

                if let Some(tls) = tls {
                    builder = builder.tls(*tls);
                }

                Ok(Box::new(builder.build()?))
            }
        }
    }
}

fn parse_tls(value: &str) -> Result<TlsConfig, MailerError> {
    match value.trim().to_lowercase().as_str() {
        "none" => Ok(TlsConfig::None),
        "starttls" => Ok(TlsConfig::StartTls),
        "tls" => Ok(TlsConfig::Tls),
        _ => Err(MailerError::Config(format!(
            "MAILER_SMTP_TLS must be one of none, starttls or tls: {value}"
        ))),
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportConfig::Mailgun {
                domain, api_base, ..
            } => f
                .debug_struct("Mailgun")
                .field("domain", domain)
                .field("api_key", &"<redacted>")
                .field("api_base", api_base)
                .finish(),
            TransportConfig::Smtp {
                host,
                port,
                username,
                password,
                tls,
            } => f
                .debug_struct("Smtp")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .field("tls", tls)
                .finish(),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
