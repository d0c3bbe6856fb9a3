//! Outbound queue to the narrative layer
//!
//! The core pushes world-state snapshots and dialogue requests onto an
//! unbounded channel and moves on. Sending never blocks and never awaits, so
//! a tick cannot stall on the narrative side. A queue with no receiver
//! (never connected, or the receiver was dropped) silently discards.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::problems::DialogueRequest;
use crate::tracking::WorldStateSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrativeMessage {
    Snapshot(WorldStateSnapshot),
    Dialogue(DialogueRequest),
}

#[derive(Debug, Default)]
pub struct NarrativeQueue {
    sender: Option<UnboundedSender<NarrativeMessage>>,
    sent: u64,
    discarded: u64,
}

impl NarrativeQueue {
    /// A queue with nothing listening
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn new(sender: UnboundedSender<NarrativeMessage>) -> Self {
        Self {
            sender: Some(sender),
            sent: 0,
            discarded: 0,
        }
    }

    /// Build a connected queue and hand back the receiving end
    ///
    /// # Example
    /// ```
    /// use settlement_sim_core::narrative::{NarrativeMessage, NarrativeQueue};
    /// use settlement_sim_core::problems::DialogueRequest;
    /// use settlement_sim_core::models::AgentId;
    ///
    /// let (mut queue, mut rx) = NarrativeQueue::channel();
    /// let request = DialogueRequest { tick: 1, agent: AgentId(4), severity: 0.4, counsel: None };
    /// assert!(queue.publish(NarrativeMessage::Dialogue(request)));
    /// assert!(matches!(rx.try_recv(), Ok(NarrativeMessage::Dialogue(_))));
    /// ```
    pub fn channel() -> (Self, UnboundedReceiver<NarrativeMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Fire and forget; returns whether the message was handed off
    pub fn publish(&mut self, message: NarrativeMessage) -> bool {
        let Some(sender) = &self.sender else {
            self.discarded += 1;
            return false;
        };
        match sender.send(message) {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(_) => {
                debug!("narrative receiver dropped; discarding message");
                self.discarded += 1;
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| !s.is_closed())
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}
