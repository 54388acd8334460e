//! Realtime dashboard events.
//!
//! Workflows publish through the [`EventBus`] handle carried in `AppState`;
//! every subscriber (a connected dashboard transport) receives every event.
//! Delivery is fire-and-forget: the persisted notification row is the durable
//! record, the broadcast is at-most-once.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// Enough to absorb a burst while a subscriber catches up.
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum RealtimeEvent {
    #[serde(rename_all = "camelCase")]
    NewProduct {
        title: String,
        quantity: i32,
        category: String,
        added_by: String,
        status: String,
    },
    #[serde(rename_all = "camelCase")]
    NewOrder {
        order_id: Uuid,
        customer_name: String,
        total_amount: i64,
        item_count: usize,
        order_status: String,
    },
    #[serde(rename_all = "camelCase")]
    OrderStatusUpdate {
        order_id: Uuid,
        status: String,
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Broadcast to all subscribers. Send fails only when nobody is
    /// listening, which is fine.
    pub fn publish(&self, event: RealtimeEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::debug!(event = ?err.0, "no realtime subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
