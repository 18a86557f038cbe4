use crate::config::MailerConfig;
use crate::error::{DeliveryError, Result};
use crate::message::Message;
use crate::templates::{TemplateRenderer, TemplateStore};
use crate::transport::MailTransport;
use serde::Serialize;
use std::time::Duration;

/// How long a transport call may take before the send is abandoned.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders a named template and delivers the result through a transport.
///
/// Every [`send`](Dispatcher::send) is independent: the template is loaded
/// and parsed again, the message is built, and the transport is called
/// exactly once. Failed deliveries are not retried.
pub struct Dispatcher<S> {
    renderer: TemplateRenderer<S>,
    transport: Box<dyn MailTransport>,
    sender: String,
    dispatch_timeout: Duration,
}

impl<S: TemplateStore> Dispatcher<S> {
    pub fn new<F, T>(sender: F, store: S, transport: T) -> Self
    where
        F: Into<String>,
        T: MailTransport + 'static,
    {
        Self {
            renderer: TemplateRenderer::new(store),
            transport: Box::new(transport),
            sender: sender.into(),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Build a dispatcher and its transport from configuration.
    ///
    /// Fails with [`MailerError::Config`](crate::MailerError::Config) when
    /// the sender or the transport credentials are missing.
    pub fn from_config(config: MailerConfig, store: S) -> Result<Self> {
        let transport = config.build_transport()?;

        Ok(Self {
            renderer: TemplateRenderer::new(store),
            transport,
            sender: config.sender,
            dispatch_timeout: config.dispatch_timeout,
        })
    }

    /// Replace the delivery deadline.
    ///
    /// The deadline always bounds the whole transport call. Transports that
    /// fix their own timeouts at construction, such as the SMTP socket timeout
    /// taken from [`MailerConfig`], keep the value they were built with.
    pub fn with_dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    /// Render `template` for `recipient` without sending it.
    pub async fn compose<D>(&self, recipient: &str, template: &str, data: &D) -> Result<Message>
    where
        D: Serialize + ?Sized,
    {
        let rendered = self.renderer.render(template, data).await.map_err(|e| {
            tracing::error!(template, error = %e, "Failed to render email template");
            e
        })?;

        Ok(Message::new(self.sender.as_str(), recipient, rendered))
    }

    /// Render `template` and deliver it to `recipient`, returning the
    /// provider's delivery id.
    ///
    /// Template errors are returned before the transport is contacted. The
    /// dispatch timeout covers only the transport call.
    pub async fn send<D>(&self, recipient: &str, template: &str, data: &D) -> Result<String>
    where
        D: Serialize + ?Sized,
    {
        let message = self.compose(recipient, template, data).await?;
        self.deliver(&message).await
    }

    /// Hand an already composed message to the transport under the dispatch
    /// timeout.
    pub async fn deliver(&self, message: &Message) -> Result<String> {
        let deadline = self.dispatch_timeout;

        match tokio::time::timeout(deadline, self.transport.deliver(message, deadline)).await {
            Ok(Ok(receipt)) => {
                tracing::info!(
                    delivery_id = %receipt.id,
                    response = %receipt.response,
                    "Email sent successfully"
                );
                Ok(receipt.id)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to send email");
                Err(DeliveryError::Transport(e).into())
            }
            Err(_) => {
                tracing::warn!(timeout = ?deadline, "Email transport timed out");
                Err(DeliveryError::Timeout(deadline).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MailerError;
    use crate::error::TransportError;
    use crate::message::DeliveryReceipt;
    use crate::templates::MemoryTemplateStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct AcceptAll;

    #[async_trait]
    impl MailTransport for AcceptAll {
        async fn deliver(
            &self,
            message: &Message,
            _deadline: Duration,
        ) -> std::result::Result<DeliveryReceipt, TransportError> {
            Ok(DeliveryReceipt::new(
                format!("<{}>", message.recipient),
                "Queued",
            ))
        }
    }

    fn store() -> MemoryTemplateStore {
        MemoryTemplateStore::new().with_template(
            "welcome",
            r#"{{#*inline "subject"}}Welcome, {{Name}}{{/inline}}
{{#*inline "plainBody"}}Hi {{Name}}{{/inline}}
{{#*inline "htmlBody"}}<p>Hi {{Name}}</p>{{/inline}}"#,
        )
    }

    #[tokio::test]
    async fn test_compose() {
        let dispatcher = Dispatcher::new("noreply@example.com", store(), AcceptAll);
        let message = dispatcher
            .compose("ana@example.com", "welcome", &json!({"Name": "Ana"}))
            .await
            .unwrap();

        assert_eq!(message.sender, "noreply@example.com");
        assert_eq!(message.recipient, "ana@example.com");
        assert_eq!(message.subject, "Welcome, Ana");
    }

    #[tokio::test]
    async fn test_send_returns_delivery_id() {
        let dispatcher = Dispatcher::new("noreply@example.com", store(), AcceptAll);
        let id = dispatcher
            .send("ana@example.com", "welcome", &json!({"Name": "Ana"}))
            .await
            .unwrap();

        assert_eq!(id, "<ana@example.com>");
    }

    #[test]
    fn test_default_timeout() {
        let dispatcher = Dispatcher::new("noreply@example.com", store(), AcceptAll);
        assert_eq!(dispatcher.dispatch_timeout(), Duration::from_secs(30));

        let dispatcher = dispatcher.with_dispatch_timeout(Duration::from_secs(2));
        assert_eq!(dispatcher.dispatch_timeout(), Duration::from_secs(2));
    }

    struct Hang;

    #[async_trait]
    impl MailTransport for Hang {
        async fn deliver(
            &self,
            _message: &Message,
            _deadline: Duration,
        ) -> std::result::Result<DeliveryReceipt, TransportError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overridden_timeout_bounds_transport_ignoring_deadline() {
        let dispatcher = Dispatcher::new("noreply@example.com", store(), Hang)
            .with_dispatch_timeout(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let err = dispatcher
            .send("ana@example.com", "welcome", &json!({"Name": "Ana"}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MailerError::Delivery(DeliveryError::Timeout(d)) if d == Duration::from_secs(5)
        ));
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[test]
    fn test_from_config() {
        let mut config = MailerConfig::mailgun("noreply@example.com", "mg.example.com", "key-123");
        config.dispatch_timeout = Duration::from_secs(10);

        let dispatcher = Dispatcher::from_config(config, store()).unwrap();
        assert_eq!(dispatcher.sender(), "noreply@example.com");
        assert_eq!(dispatcher.dispatch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_config_without_credentials() {
        let config = MailerConfig::mailgun("noreply@example.com", "mg.example.com", "");
        let result = Dispatcher::from_config(config, store());

        assert!(matches!(result, Err(MailerError::Config(_))));
    }
}
