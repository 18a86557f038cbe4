use crate::error::TransportError;
use crate::message::{DeliveryReceipt, Message};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Delivers a rendered message to the outside world.
///
/// `deadline` is the time the caller will wait for this call. Implementations
/// may use it for their own request timeouts, but the dispatcher cancels the
/// call when it elapses either way.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(
        &self,
        message: &Message,
        deadline: Duration,
    ) -> Result<DeliveryReceipt, TransportError>;
}

#[async_trait]
impl<T: MailTransport + ?Sized> MailTransport for Box<T> {
    async fn deliver(
        &self,
        message: &Message,
        deadline: Duration,
    ) -> Result<DeliveryReceipt, TransportError> {
        (**self).deliver(message, deadline).await
    }
}

#[async_trait]
impl<T: MailTransport + ?Sized> MailTransport for Arc<T> {
    async fn deliver(
        &self,
        message: &Message,
        deadline: Duration,
    ) -> Result<DeliveryReceipt, TransportError> {
        (**self).deliver(message, deadline).await
    }
}
