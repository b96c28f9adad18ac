//! `mazelink-runtime` – The Protocol Engine
//!
//! Runs the command → acknowledgement round trip on every participant and
//! wires the pieces from the lower crates into a playable session.
//!
//! # Modules
//!
//! - [`participant`] – [`Participant`][participant::Participant]: the mirrored
//!   agent state every role keeps (grid position, facing, movement gate,
//!   motion) and the operator-side request entry points.
//! - [`relay`] – [`RelayNode`][relay::RelayNode]: the authoritative side.
//!   Validates intents with [`RelayAuthority`][mazelink_kernel::RelayAuthority],
//!   broadcasts accepted updates, and plays rotation cues.
//! - [`session`] – [`Session`][session::Session]: one operator, one relay and
//!   any number of observers on a shared [`EventBus`][mazelink_middleware::EventBus],
//!   driven by the host's frame loop via `pump` and `tick`.
//! - [`input`] – [`TiltInput`][input::TiltInput]: accelerometer thresholding
//!   that turns device tilts into intents.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod input;
pub mod participant;
pub mod relay;
pub mod session;
pub mod telemetry;

pub use input::{Acceleration, TiltInput};
pub use participant::Participant;
pub use relay::RelayNode;
pub use session::{Session, SessionBuilder, SessionConfig};
