//! `mazelink-kernel` – Authority & Rules
//!
//! Everything the relay needs to decide whether an intent becomes canonical
//! state.  Nothing in here renders, plays audio or touches the wire.
//!
//! # Modules
//!
//! - [`grid`] – [`MazeGrid`][grid::MazeGrid]: the immutable cell lattice plus
//!   the affine mapping from grid coordinates to world space.
//! - [`direction`] – [`DirectionState`][direction::DirectionState]: cyclic
//!   facing index with wraparound rotation.
//! - [`validator`] – [`ValidatorPolicy`][validator::ValidatorPolicy] and the
//!   built-in [`GridBoundsPolicy`][validator::GridBoundsPolicy] deciding
//!   whether a forward step is legal.
//! - [`authority`] – [`RelayAuthority`][authority::RelayAuthority]: the single
//!   mutator of canonical position and facing.  Turns intents into the
//!   [`StateUpdate`][mazelink_types::StateUpdate]s the relay broadcasts.

pub mod authority;
pub mod direction;
pub mod grid;
pub mod validator;

pub use authority::{IntentOutcome, RelayAuthority};
pub use direction::DirectionState;
pub use grid::{CellProbe, MazeGrid};
pub use validator::{GridBoundsPolicy, ValidatorPolicy, can_step_forward};
