//! `mazelink-hal` – Presentation Surfaces
//!
//! The boundary between protocol state and whatever renders it.  The rest of
//! the workspace only talks to the traits in here, so a game engine, a
//! terminal or a test double can sit behind them.
//!
//! # Modules
//!
//! - [`actor`] – [`Actor`][actor::Actor]: the animated body of the agent
//!   (world position, "moving" flag, yaw).
//! - [`audio`] – [`AudioSink`][audio::AudioSink]: stereo playback device.
//! - [`motion`] – [`MotionInterpolator`][motion::MotionInterpolator]: time-
//!   sliced linear motion towards a target, advanced once per frame.
//! - [`cue`] – [`CueMapper`][cue::CueMapper] and
//!   [`StereoCueMapper`][cue::StereoCueMapper]: turn a rotation into a
//!   panned audio cue.
//! - [`sim`] – in-process recording drivers for headless runs and tests.

pub mod actor;
pub mod audio;
pub mod cue;
pub mod motion;
pub mod sim;

pub use actor::Actor;
pub use audio::{AudioClip, AudioSink};
pub use cue::{Cue, CueMapper, StereoCueMapper};
pub use motion::{ARRIVAL_EPSILON, MotionInterpolator};
