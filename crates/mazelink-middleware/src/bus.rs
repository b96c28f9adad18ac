//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message in publish order without any single
//! subscriber blocking the others.
//!
//! # Topics
//!
//! | Topic | Direction | Traffic |
//! |---|---|---|
//! | [`Topic::Intents`] | operator → relay | `Forward` / `Rotate` requests |
//! | [`Topic::StateUpdates`] | relay → all | `ForwardApplied` / `RotateApplied` |
//! | [`Topic::Debug`] | any → all | free-form echo messages |
//!
//! The relay subscribes to [`Topic::StateUpdates`] like everyone else, so it
//! observes its own broadcasts in the same order as every other participant.

use mazelink_types::{
    AgentId, DebugMessage, Event, EventPayload, Intent, MazeError, Role, StateUpdate,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Operator-originated intents, consumed only by the relay.
    Intents,
    /// Canonical updates broadcast by the relay to every participant.
    StateUpdates,
    /// Echo traffic, not part of the ordering contract.
    Debug,
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    intents: broadcast::Sender<Event>,
    state_updates: broadcast::Sender<Event>,
    debug: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (intents, _) = broadcast::channel(capacity);
        let (state_updates, _) = broadcast::channel(capacity);
        let (debug, _) = broadcast::channel(capacity);
        Self {
            intents,
            state_updates,
            debug,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event, or
    /// [`MazeError::Channel`] when nobody is subscribed to the topic.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, MazeError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| MazeError::Channel(format!("No subscribers for topic {topic:?}")))
    }

    /// Subscribe to a specific [`Topic`] channel.
    ///
    /// The receiver only sees events published after this call.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Number of live receivers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topic_sender(topic).receiver_count()
    }

    // -----------------------------------------------------------------------
    // Protocol helpers
    // -----------------------------------------------------------------------

    /// Send an operator intent to the relay.
    pub fn send_intent(
        &self,
        source: &str,
        agent_id: AgentId,
        intent: Intent,
    ) -> Result<usize, MazeError> {
        debug!(source, %agent_id, ?intent, "intent sent");
        self.publish_to(
            Topic::Intents,
            Event::new(source, EventPayload::Intent { agent_id, intent }),
        )
    }

    /// Broadcast a canonical update to every participant, the sender included.
    pub fn broadcast_update(
        &self,
        source: &str,
        agent_id: AgentId,
        update: StateUpdate,
    ) -> Result<usize, MazeError> {
        debug!(source, %agent_id, ?update, "state update broadcast");
        self.publish_to(
            Topic::StateUpdates,
            Event::new(source, EventPayload::StateUpdate { agent_id, update }),
        )
    }

    /// Publish an echo message on the debug lane.
    pub fn send_debug(
        &self,
        source: &str,
        from: Role,
        message: DebugMessage,
    ) -> Result<usize, MazeError> {
        self.publish_to(
            Topic::Debug,
            Event::new(source, EventPayload::Debug { from, message }),
        )
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Intents => &self.intents,
            Topic::StateUpdates => &self.state_updates,
            Topic::Debug => &self.debug,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// A receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].  Async hosts await
/// [`recv`](Self::recv); frame-driven hosts drain with
/// [`try_next`](Self::try_next) once per tick.
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take the next queued event without blocking.
    ///
    /// Returns `None` when the queue is empty or the bus is closed.  A lagged
    /// subscriber is logged and resumes from the oldest retained event.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged; messages lost");
                    continue;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every queued event.
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}
