//! `mazelink-middleware` – The Wire
//!
//! Carries typed protocol messages between the operator, the relay and any
//! passive observers without caring about what they mean.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.  Stands in for the networked transport:
//!   delivery is reliable and FIFO per sender.

pub mod bus;

pub use bus::{EventBus, Topic, TopicReceiver};
