//! Committed-transition notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::interfaces::event_sink::{DispatchEventSink, SinkError};

use super::machine::Action;
use super::model::{DeliveryStatus, Lineage};

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 1024;

/// A transition that has been committed. Carries no verification codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchEvent {
    pub lineage: Lineage,
    pub business_id: Option<String>,
    pub order_id: String,
    pub transporter_id: String,
    pub action: Action,
    pub status: DeliveryStatus,
    /// Set when an operator acted on a delivery assigned to someone else.
    pub overridden: bool,
    pub at: DateTime<Utc>,
}

/// Sink that logs every transition.
#[derive(Debug, Default)]
pub struct LoggingEventSink;

#[async_trait]
impl DispatchEventSink for LoggingEventSink {
    async fn publish(&self, event: &DispatchEvent) -> Result<(), SinkError> {
        info!(
            lineage = %event.lineage,
            business_id = event.business_id.as_deref().unwrap_or(""),
            order_id = %event.order_id,
            transporter_id = %event.transporter_id,
            action = %event.action,
            status = %event.status,
            overridden = event.overridden,
            "delivery transition committed"
        );
        Ok(())
    }
}

/// In-process fan-out using a tokio broadcast channel.
pub struct BroadcastEventSink {
    sender: broadcast::Sender<DispatchEvent>,
}

impl BroadcastEventSink {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DispatchEventSink for BroadcastEventSink {
    async fn publish(&self, event: &DispatchEvent) -> Result<(), SinkError> {
        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                debug!(order_id = %event.order_id, receivers, "dispatch event broadcast");
            }
            Err(_) => {
                debug!(order_id = %event.order_id, "dispatch event broadcast (no receivers)");
            }
        }
        Ok(())
    }
}

/// Publishes to every inner sink; the first failure is reported after all
/// sinks have been tried.
pub struct FanoutEventSink {
    sinks: Vec<std::sync::Arc<dyn DispatchEventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn DispatchEventSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl DispatchEventSink for FanoutEventSink {
    async fn publish(&self, event: &DispatchEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn event() -> DispatchEvent {
        DispatchEvent {
            lineage: Lineage::Merchant,
            business_id: Some("b1".to_string()),
            order_id: "o1".to_string(),
            transporter_id: "t1".to_string(),
            action: Action::Accept,
            status: DeliveryStatus::DriverEnRoutePickup,
            overridden: false,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscribers() {
        let sink = BroadcastEventSink::new();
        let mut rx = sink.subscribe();

        sink.publish(&event()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.order_id, "o1");
        assert_eq!(received.action, Action::Accept);
    }

    struct FailingSink;

    #[async_trait]
    impl DispatchEventSink for FailingSink {
        async fn publish(&self, _event: &DispatchEvent) -> Result<(), SinkError> {
            Err(SinkError::Failed("payout queue offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let sink = BroadcastEventSink::new();
        assert!(sink.publish(&event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fanout_tries_every_sink() {
        let heard = Arc::new(BroadcastEventSink::new());
        let mut rx = heard.subscribe();

        let fanout = FanoutEventSink::new(vec![
            Arc::new(FailingSink),
            Arc::new(LoggingEventSink),
            heard.clone() as Arc<dyn DispatchEventSink>,
        ]);

        assert!(matches!(
            fanout.publish(&event()).await,
            Err(SinkError::Failed(_))
        ));
        assert_eq!(rx.recv().await.unwrap().order_id, "o1");
    }

    #[test]
    fn test_event_serializes_without_codes() {
        let json = serde_json::to_value(event()).unwrap();
        assert_eq!(json["action"], "accept");
        assert_eq!(json["status"], "driver_en_route_pickup");
        assert_eq!(json["orderId"], "o1");
        assert!(json.get("pickupCode").is_none());
    }
}
