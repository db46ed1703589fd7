use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for per-listing change notifications. Calendar readers
/// hold a snapshot of booked days; events tell them when to refresh it.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to notifications for a listing. Creates the channel if needed.
    pub fn subscribe(&self, listing_id: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(listing_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, listing_id: Ulid, event: &Event) {
        if let Some(sender) = self.channels.get(&listing_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Remove a channel (e.g. when a listing is deleted).
    #[allow(dead_code)]
    pub fn remove(&self, listing_id: &Ulid) {
        self.channels.remove(listing_id);
    }
}
