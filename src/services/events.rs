//! In-process change feed.
//!
//! Services publish a [`CatalogEvent`] after each committed change; the SSE
//! endpoint forwards them to connected clients.

use tokio::sync::broadcast;

use crate::models::event::CatalogEvent;

/// Buffered events per subscriber before it starts lagging
const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventsService {
    sender: broadcast::Sender<CatalogEvent>,
}

impl EventsService {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event; a feed without listeners drops it
    pub fn publish(&self, event: CatalogEvent) {
        tracing::debug!(
            kind = event.kind.as_str(),
            book_id = event.book_id,
            "Publishing catalog event"
        );
        if self.sender.send(event).is_err() {
            tracing::trace!("No event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventsService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let events = EventsService::new();
        let mut first = events.subscribe();
        let mut second = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        events.publish(CatalogEvent::new(EventKind::BookUpdated, 42));

        assert_eq!(first.recv().await.unwrap().book_id, 42);
        assert_eq!(second.recv().await.unwrap().kind, EventKind::BookUpdated);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = EventsService::new();
        events.publish(CatalogEvent::new(EventKind::BookDeleted, 1));
        assert_eq!(events.subscriber_count(), 0);
    }
}
