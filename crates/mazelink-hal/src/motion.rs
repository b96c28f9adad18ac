//! Time-sliced linear motion.
//!
//! A [`MotionInterpolator`] is an explicit state object
//! `{start, target, duration, elapsed}`.  The host advances it once per
//! frame with the frame's `dt`; nothing in here sleeps or spawns.  Motion is
//! complete once the sampled position is within [`ARRIVAL_EPSILON`] of the
//! target, at which point callers snap to the exact target.
//!
//! # Example
//!
//! ```rust
//! use mazelink_hal::motion::MotionInterpolator;
//! use mazelink_types::WorldPos;
//!
//! let mut motion = MotionInterpolator::start(
//!     WorldPos::new(0.0, 0.0, 0.0),
//!     WorldPos::new(2.0, 0.0, 0.0),
//!     1.0,
//! );
//! let halfway = motion.advance(0.5);
//! assert!((halfway.x - 1.0).abs() < 1e-6);
//! assert!(!motion.is_complete());
//! motion.advance(0.5);
//! assert!(motion.is_complete());
//! ```

use mazelink_types::WorldPos;

/// Distance (world units) under which the actor counts as arrived.
pub const ARRIVAL_EPSILON: f32 = 0.01;

/// Linear interpolation from `start` to `target` over `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionInterpolator {
    start: WorldPos,
    target: WorldPos,
    duration: f32,
    elapsed: f32,
}

impl MotionInterpolator {
    /// Begin a fresh interpolation.  Never resumes a previous one.
    ///
    /// A non-positive `duration` produces a motion that is already complete.
    pub fn start(from: WorldPos, to: WorldPos, duration: f32) -> Self {
        Self {
            start: from,
            target: to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn target(&self) -> WorldPos {
        self.target
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalised progress in `[0, 1]` after `elapsed` seconds.
    fn progress_at(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Pure sample: position `elapsed` seconds after the start.
    pub fn sample(&self, elapsed: f32) -> WorldPos {
        self.start.lerp(self.target, self.progress_at(elapsed))
    }

    /// Whether the motion has arrived `elapsed` seconds after the start.
    pub fn is_complete_at(&self, elapsed: f32) -> bool {
        self.sample(elapsed).distance(self.target) < ARRIVAL_EPSILON
    }

    /// Position at the current elapsed time.
    pub fn position(&self) -> WorldPos {
        self.sample(self.elapsed)
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete_at(self.elapsed)
    }

    /// Advance the clock by `dt` seconds and return the new position.
    /// Negative `dt` is treated as zero.
    pub fn advance(&mut self, dt: f32) -> WorldPos {
        self.elapsed += dt.max(0.0);
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_cell() -> MotionInterpolator {
        MotionInterpolator::start(WorldPos::new(0.0, 0.0, 0.0), WorldPos::new(0.0, 0.0, 2.0), 0.5)
    }

    /// Verify that a fresh interpolator sits at its start and is incomplete.
    #[test]
    fn starts_at_origin_and_incomplete() {
        let motion = one_cell();
        assert_eq!(motion.position(), WorldPos::new(0.0, 0.0, 0.0));
        assert!(!motion.is_complete());
    }

    /// Verify that sampling is linear in time and clamps at the target.
    #[test]
    fn samples_linearly_and_clamps_past_duration() {
        let motion = one_cell();
        assert!((motion.sample(0.25).z - 1.0).abs() < 1e-6);
        assert_eq!(motion.sample(10.0), WorldPos::new(0.0, 0.0, 2.0));
    }

    /// Verify that motion completes only within epsilon of the target.
    #[test]
    fn not_complete_until_within_epsilon() {
        let motion = one_cell();
        // 0.499 s → 0.004 short of the target: inside epsilon.
        assert!(motion.is_complete_at(0.499));
        // 0.49 s → 0.04 short: outside epsilon.
        assert!(!motion.is_complete_at(0.49));
    }

    /// Verify that successive frames accumulate elapsed time.
    #[test]
    fn advance_accumulates_frames() {
        let mut motion = one_cell();
        for _ in 0..29 {
            motion.advance(1.0 / 60.0);
        }
        assert!(!motion.is_complete());
        motion.advance(1.0 / 60.0);
        assert!(motion.is_complete());
    }

    /// Verify that a negative frame step does not move the sample backwards.
    #[test]
    fn negative_dt_does_not_rewind() {
        let mut motion = one_cell();
        motion.advance(0.1);
        let before = motion.position();
        motion.advance(-1.0);
        assert_eq!(motion.position(), before);
    }

    /// Verify that a zero duration motion is complete at once.
    #[test]
    fn zero_duration_is_immediately_complete() {
        let motion =
            MotionInterpolator::start(WorldPos::default(), WorldPos::new(5.0, 0.0, 0.0), 0.0);
        assert!(motion.is_complete());
        assert_eq!(motion.position(), WorldPos::new(5.0, 0.0, 0.0));
    }
}
