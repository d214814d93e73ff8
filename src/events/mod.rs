use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Best-effort domain event stream. Events describe facts that already
/// committed; consumers must tolerate loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Asset events
    AssetRegistered {
        asset_id: Uuid,
        code: String,
    },
    AssetArchived(Uuid),
    AssetRestored(Uuid),
    AssetPurged(Uuid),

    // Stock events
    StockTransactionApplied {
        stock_item_id: Uuid,
        transaction_id: Uuid,
        kind: String,
        quantity: i32,
        new_quantity: i32,
    },
    StockItemCreated(Uuid),
    StockItemPurged(Uuid),

    // Procurement events
    ProcurementCreated(Uuid),
    ProcurementStatusChanged {
        procurement_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ProcurementArchived(Uuid),
    ProcurementRestored(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is
    /// gone. Service code uses this so a missing consumer never turns a
    /// committed write into an error.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "dropping domain event");
        }
    }
}

/// Drains the event channel, logging each event. Callers that want real
/// consumers spawn their own task over the receiver instead.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        debug!(?event, "domain event");
    }
}
