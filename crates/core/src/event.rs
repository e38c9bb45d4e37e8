//! Engine notifications.
//!
//! The engine emits one [`Event`] per successful mutation, synchronously and
//! after the mutation is applied. Failed operations emit nothing. Durable
//! delivery is the subscriber's business.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Phase, Principal, ProposalId};

/// A structured notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    PhaseChanged { previous: Phase, new: Phase },
    VoterRegistered { voter: Principal },
    ProposalRegistered { proposal_id: ProposalId },
    Voted { voter: Principal, proposal_id: ProposalId },
}

/// Receives engine notifications.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn notify(&self, event: &Event) {
        self(event)
    }
}

/// A cloneable sink that keeps every event it receives, in order.
///
/// Clones share the same buffer, so one clone can be handed to the engine
/// while another is drained by the host.
#[derive(Clone, Debug, Default)]
pub struct EventBuffer {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Take everything received so far, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for EventBuffer {
    fn notify(&self, event: &Event) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn buffer_clones_share_storage() {
        let buffer = EventBuffer::new();
        let sink = buffer.clone();

        sink.notify(&Event::ProposalRegistered { proposal_id: 1 });
        sink.notify(&Event::ProposalRegistered { proposal_id: 2 });

        assert_eq!(buffer.len(), 2);
        assert_eq!(
            buffer.drain(),
            vec![
                Event::ProposalRegistered { proposal_id: 1 },
                Event::ProposalRegistered { proposal_id: 2 },
            ]
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sink: Box<dyn EventSink> = Box::new(move |_: &Event| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sink.notify(&Event::VoterRegistered {
            voter: Principal::from("alice"),
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = Event::Voted {
            voter: Principal::from("alice"),
            proposal_id: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "voted");
        assert_eq!(json["voter"], "alice");
        assert_eq!(json["proposal_id"], 1);
    }
}
