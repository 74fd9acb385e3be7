use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics::EventMetrics;

use super::{NotificationEvent, NotificationListener};

/// Handle identifying a registration, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Fans lifecycle events out to registered listeners.
///
/// Listeners are held weakly: the registrant keeps ownership, and a listener
/// whose last strong reference is gone is pruned on the next emit. Explicit
/// `unsubscribe` removes a registration immediately.
pub struct EventBus {
    /// listener_id -> listener
    listeners: DashMap<ListenerId, Weak<dyn NotificationListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }

    /// Register a listener without taking ownership of it
    pub fn subscribe(&self, listener: &Arc<dyn NotificationListener>) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        self.listeners.insert(id, Arc::downgrade(listener));
        EventMetrics::set_listeners(self.listeners.len());

        tracing::debug!(listener_id = %id, "Listener subscribed");
        id
    }

    /// Remove a registration. Returns whether it existed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        EventMetrics::set_listeners(self.listeners.len());

        if removed {
            tracing::debug!(listener_id = %id, "Listener unsubscribed");
        }
        removed
    }

    /// Register a channel-backed listener and return the receiving end.
    ///
    /// The registration lives as long as the returned stream.
    pub fn subscribe_stream(&self) -> EventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let listener: Arc<dyn NotificationListener> = Arc::new(ChannelListener { sender });
        let id = self.subscribe(&listener);

        EventStream {
            id,
            _listener: listener,
            receiver,
        }
    }

    /// Deliver `event` to every live listener. Returns the number reached.
    pub fn emit(&self, event: &NotificationEvent) -> usize {
        // Upgrade outside the iteration so listeners may (un)subscribe from
        // inside their callback without deadlocking on the map shard.
        let mut live = Vec::new();
        let mut dead = Vec::new();
        for entry in self.listeners.iter() {
            match entry.value().upgrade() {
                Some(listener) => live.push(listener),
                None => dead.push(*entry.key()),
            }
        }

        if !dead.is_empty() {
            for id in &dead {
                self.listeners.remove(id);
            }
            EventMetrics::set_listeners(self.listeners.len());
            tracing::debug!(pruned = dead.len(), "Pruned dropped listeners");
        }

        for listener in &live {
            listener.on_notification_event(event);
        }

        EventMetrics::record_emitted(event.kind());
        tracing::debug!(
            event_type = event.kind(),
            identifier = %event.identifier(),
            listeners = live.len(),
            "Event emitted"
        );

        live.len()
    }

    /// Number of registrations, including ones not yet pruned
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

struct ChannelListener {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl NotificationListener for ChannelListener {
    fn on_notification_event(&self, event: &NotificationEvent) {
        // Receiver gone means the stream is being dropped
        let _ = self.sender.send(event.clone());
    }
}

/// Stream of lifecycle events backed by a bus registration
pub struct EventStream {
    id: ListenerId,
    _listener: Arc<dyn NotificationListener>,
    receiver: mpsc::UnboundedReceiver<NotificationEvent>,
}

impl EventStream {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next event
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        self.receiver.recv().await
    }

    /// Next already-delivered event, if any
    pub fn try_recv(&mut self) -> Option<NotificationEvent> {
        self.receiver.try_recv().ok()
    }

    /// Every already-delivered event, in emission order
    pub fn drain(&mut self) -> Vec<NotificationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Stream for EventStream {
    type Item = NotificationEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
