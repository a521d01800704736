//! Broadcast fan-out of semantic events to in-process listeners.

use std::future::Future;

use tokio::sync::broadcast;

use lumenhub_domain::error::HubError;
use lumenhub_domain::event::Event;

use crate::ports::EventPublisher;

/// [`EventPublisher`] over a tokio [`broadcast`] channel.
///
/// The hub task is the only publisher, so every listener sees one device's
/// events in the order they happened. With nobody listening the event is
/// dropped and publishing still succeeds. A listener that falls more than
/// `capacity` events behind gets `RecvError::Lagged` and loses the oldest.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Bus retaining at most `capacity` unread events per listener.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Start listening; only events published from now on are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of listeners currently attached.
    #[must_use]
    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        if self.sender.send(event).is_err() {
            tracing::trace!("event dropped, no listeners");
        }
        async { Ok(()) }
    }
}
