//! Audio playback surface.
//!
//! Which clip to play and where to pan it is decided by a
//! [`CueMapper`][crate::cue::CueMapper]; the sink only plays what it is given.

use mazelink_types::MazeError;

/// Handle to a loaded sound asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioClip {
    name: String,
}

impl AudioClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A stereo output device.
pub trait AudioSink: Send {
    /// Play `clip` with stereo `pan` in `[-1, 1]` (`-1` = left ear only).
    ///
    /// # Errors
    ///
    /// Returns [`MazeError::Surface`] if the device cannot play the clip.
    fn play(&mut self, clip: &AudioClip, pan: f32) -> Result<(), MazeError>;
}
