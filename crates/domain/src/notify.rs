//! Customer notifications about orders.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use store::{Order, User};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors raised by a notification channel.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The message could not be handed to the transport.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Trait for sending order notifications to customers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirms a newly placed order. `item_names` lists every item, comma separated.
    async fn send_order_confirmation(
        &self,
        order: &Order,
        user: &User,
        item_names: &str,
    ) -> Result<(), NotificationError>;

    /// Tells the customer that one item of the order has shipped.
    async fn send_order_shipped(
        &self,
        order: &Order,
        user: &User,
        item_name: &str,
    ) -> Result<(), NotificationError>;
}

/// Notifier that writes each notification as a structured log event.
///
/// Stands in for an email transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_order_confirmation(
        &self,
        order: &Order,
        user: &User,
        item_names: &str,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            order_id = %order.id,
            to = %user.email,
            items = item_names,
            total = %order.total,
            "order confirmation sent"
        );
        Ok(())
    }

    async fn send_order_shipped(
        &self,
        order: &Order,
        user: &User,
        item_name: &str,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            order_id = %order.id,
            to = %user.email,
            item = item_name,
            "shipment notification sent"
        );
        Ok(())
    }
}

/// Which notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Confirmation,
    Shipped,
}

/// A notification captured by [`InMemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub kind: NotificationKind,
    pub order_id: OrderId,
    pub to: String,
    /// Item names for confirmations, the shipped item for shipments.
    pub detail: String,
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<SentNotification>,
    fail: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<Mutex<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every subsequent send to fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.lock().await.fail = fail;
    }

    /// Returns everything sent so far.
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.state.lock().await.sent.clone()
    }

    async fn record(
        &self,
        kind: NotificationKind,
        order: &Order,
        user: &User,
        detail: &str,
    ) -> Result<(), NotificationError> {
        let mut state = self.state.lock().await;
        if state.fail {
            return Err(NotificationError::Delivery("mail server unavailable".to_string()));
        }
        state.sent.push(SentNotification {
            kind,
            order_id: order.id,
            to: user.email.clone(),
            detail: detail.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_order_confirmation(
        &self,
        order: &Order,
        user: &User,
        item_names: &str,
    ) -> Result<(), NotificationError> {
        self.record(NotificationKind::Confirmation, order, user, item_names)
            .await
    }

    async fn send_order_shipped(
        &self,
        order: &Order,
        user: &User,
        item_name: &str,
    ) -> Result<(), NotificationError> {
        self.record(NotificationKind::Shipped, order, user, item_name)
            .await
    }
}
