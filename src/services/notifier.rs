// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin change notifications.
//!
//! Every successful pin write publishes one event. Subscribers (the SSE
//! endpoint) treat an event purely as a signal to re-run their visibility
//! query; events carry no pin content.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Kind of write that happened on the pin collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinChangeEvent {
    pub kind: ChangeKind,
    /// Affected pin; `None` for batched writes touching several pins.
    pub pin_id: Option<Uuid>,
}

/// Broadcast hub for pin change events.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<PinChangeEvent>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PinChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, kind: ChangeKind, pin_id: Option<Uuid>) {
        let delivered = self.sender.send(PinChangeEvent { kind, pin_id }).unwrap_or(0);
        tracing::debug!(kind = kind.as_str(), pin_id = ?pin_id, delivered, "Pin change published");
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
