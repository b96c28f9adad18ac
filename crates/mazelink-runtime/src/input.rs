//! [`TiltInput`] – turns accelerometer samples from a handheld device into
//! operator intents.
//!
//! The device is held upright (gravity along `-y`).  Tipping it away from the
//! user (`z` negative) steps forward; tipping it sideways turns.  After a
//! tilt fires, nothing else fires until the device has been brought back to
//! upright, so one tilt is one intent.
//!
//! ```rust
//! use mazelink_runtime::input::{Acceleration, TiltInput};
//! use mazelink_types::{Intent, MovementState};
//!
//! let mut tilt = TiltInput::default();
//! let tipped = Acceleration::new(0.0, -0.4, -0.8);
//! assert_eq!(tilt.sample(tipped, MovementState::Idle), Some(Intent::Forward));
//! assert_eq!(tilt.sample(tipped, MovementState::Idle), None);
//! ```

use mazelink_types::{Intent, MovementState, Rotation};
use tracing::debug;

/// One accelerometer reading, in g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone)]
pub struct TiltInput {
    centered_sensitivity: f32,
    movement_threshold: f32,
    centered: bool,
}

impl Default for TiltInput {
    fn default() -> Self {
        Self::new(0.2, 0.5)
    }
}

impl TiltInput {
    pub fn new(centered_sensitivity: f32, movement_threshold: f32) -> Self {
        Self {
            centered_sensitivity,
            movement_threshold,
            centered: true,
        }
    }

    /// Whether the last tilt has been released.
    pub fn is_centered(&self) -> bool {
        self.centered
    }

    /// Whether `accel` counts as the device held upright and still.
    pub fn is_upright(&self, accel: Acceleration) -> bool {
        let s = self.centered_sensitivity;
        accel.x.abs() < s && accel.y.abs() - 1.0 < s && accel.z.abs() < s
    }

    /// Feed one sample.  Returns the intent to request, if this sample is a
    /// fresh tilt and the agent is idle.
    pub fn sample(&mut self, accel: Acceleration, movement: MovementState) -> Option<Intent> {
        if !self.centered {
            if self.is_upright(accel) {
                self.centered = true;
                debug!("tilt released");
            }
            return None;
        }
        if movement == MovementState::Moving {
            return None;
        }

        let t = self.movement_threshold;
        let intent = if accel.z < -t {
            Intent::Forward
        } else if accel.x < -t {
            Intent::Rotate {
                delta: Rotation::Right,
            }
        } else if accel.x > t {
            Intent::Rotate {
                delta: Rotation::Left,
            }
        } else {
            return None;
        };

        self.centered = false;
        debug!(?intent, x = accel.x, z = accel.z, "tilt fired");
        Some(intent)
    }
}
