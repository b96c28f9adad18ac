//! Rotation → stereo audio cue.
//!
//! The relay's sighted user hears a short clip whenever a rotation is
//! committed.  The pan is the negated rotation delta: a right turn (`-1`)
//! pans the cue right (`+pan`), a left turn (`+1`) pans it left.  The clip is
//! drawn uniformly from a fixed pool.
//!
//! ```
//! use mazelink_hal::cue::{CueMapper, StereoCueMapper};
//! use mazelink_hal::AudioClip;
//! use mazelink_types::Rotation;
//!
//! let mut mapper = StereoCueMapper::new(vec![AudioClip::new("rustle")], 1.0)
//!     .unwrap()
//!     .with_seed(7);
//! let cue = mapper.map(Rotation::Right);
//! assert_eq!(cue.pan, 1.0);
//! assert_eq!(cue.clip.name(), "rustle");
//! ```

use mazelink_types::{MazeError, Rotation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::AudioClip;

/// A clip plus the stereo pan to play it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub pan: f32,
    pub clip: AudioClip,
}

/// Chooses the cue for a committed rotation.  Pluggable per maze variant.
pub trait CueMapper: Send {
    fn map(&mut self, rotation: Rotation) -> Cue;
}

/// Pan proportional to `-delta`, clip chosen pseudo-randomly.
pub struct StereoCueMapper {
    clips: Vec<AudioClip>,
    pan_strength: f32,
    rng: StdRng,
}

impl StereoCueMapper {
    /// # Errors
    ///
    /// - [`MazeError::EmptyClipPool`] when `clips` is empty.
    /// - [`MazeError::Surface`] when `pan_strength` is outside `(0, 1]`.
    pub fn new(clips: Vec<AudioClip>, pan_strength: f32) -> Result<Self, MazeError> {
        if clips.is_empty() {
            return Err(MazeError::EmptyClipPool);
        }
        if !(pan_strength > 0.0 && pan_strength <= 1.0) {
            return Err(MazeError::Surface {
                component: "cue_mapper".to_string(),
                details: format!("pan strength {pan_strength} outside (0, 1]"),
            });
        }
        Ok(Self {
            clips,
            pan_strength,
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseed the clip picker for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn clips(&self) -> &[AudioClip] {
        &self.clips
    }
}

impl CueMapper for StereoCueMapper {
    fn map(&mut self, rotation: Rotation) -> Cue {
        let pan = (-f32::from(rotation.delta()) * self.pan_strength).clamp(-1.0, 1.0);
        let clip = self.clips[self.rng.gen_range(0..self.clips.len())].clone();
        Cue { pan, clip }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<AudioClip> {
        vec![
            AudioClip::new("rustle_1"),
            AudioClip::new("rustle_2"),
            AudioClip::new("rustle_3"),
        ]
    }

    /// Verify that the cue pan is the negated rotation delta.
    #[test]
    fn pan_sign_is_negated_delta() {
        let mut mapper = StereoCueMapper::new(pool(), 0.8).unwrap().with_seed(1);
        for rotation in [Rotation::Left, Rotation::Right] {
            let cue = mapper.map(rotation);
            assert_eq!(cue.pan.signum(), -f32::from(rotation.delta()));
            assert!((-1.0..=1.0).contains(&cue.pan));
            assert!((cue.pan.abs() - 0.8).abs() < f32::EPSILON);
        }
    }

    /// Verify that chosen clips always come from the configured pool.
    #[test]
    fn clips_come_from_the_pool() {
        let mut mapper = StereoCueMapper::new(pool(), 1.0).unwrap().with_seed(42);
        for _ in 0..50 {
            let cue = mapper.map(Rotation::Left);
            assert!(mapper.clips().contains(&cue.clip));
        }
    }

    /// Verify that equal seeds choose the same clip sequence.
    #[test]
    fn same_seed_same_sequence() {
        let mut a = StereoCueMapper::new(pool(), 1.0).unwrap().with_seed(9);
        let mut b = StereoCueMapper::new(pool(), 1.0).unwrap().with_seed(9);
        for _ in 0..10 {
            assert_eq!(a.map(Rotation::Right), b.map(Rotation::Right));
        }
    }

    /// Verify that an empty clip pool is refused.
    #[test]
    fn empty_pool_is_a_configuration_error() {
        assert!(matches!(
            StereoCueMapper::new(Vec::new(), 1.0),
            Err(MazeError::EmptyClipPool)
        ));
    }

    /// Verify that pan strength outside `(0, 1]` is refused.
    #[test]
    fn pan_strength_must_be_in_unit_range() {
        assert!(StereoCueMapper::new(pool(), 0.0).is_err());
        assert!(StereoCueMapper::new(pool(), 1.5).is_err());
        assert!(StereoCueMapper::new(pool(), f32::NAN).is_err());
    }
}
