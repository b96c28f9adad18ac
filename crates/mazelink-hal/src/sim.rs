//! In-process simulated surfaces for headless runs and tests.
//!
//! [`SimActor`] records where it was told to be; [`SimAudio`] records every
//! cue it was asked to play into a shared [`CueLog`] so the log can still be
//! read after the sink has been boxed and handed to a relay.
//!
//! # Example
//!
//! ```rust
//! use mazelink_hal::sim::{SimActor, SimAudio};
//! use mazelink_hal::{Actor, AudioClip, AudioSink};
//! use mazelink_types::WorldPos;
//!
//! let mut actor = SimActor::new("dummy", WorldPos::default());
//! actor.set_position(WorldPos::new(1.0, 0.0, 0.0)).expect("sim move must succeed");
//!
//! let mut audio = SimAudio::new();
//! let log = audio.log();
//! audio.play(&AudioClip::new("rustle"), -1.0).expect("sim play must succeed");
//! assert_eq!(log.played().len(), 1);
//! ```

use std::sync::{Arc, Mutex};

use mazelink_types::{MazeError, WorldPos};

use crate::actor::Actor;
use crate::audio::{AudioClip, AudioSink};

// ────────────────────────────────────────────────────────────────────────────
// Stub actor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated actor that stores its pose.  Always succeeds.
pub struct SimActor {
    id: String,
    position: WorldPos,
    moving: bool,
    yaw: f32,
    frames: usize,
}

impl SimActor {
    pub fn new(id: impl Into<String>, position: WorldPos) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            position,
            moving: false,
            yaw: 0.0,
            frames: 0,
        })
    }

    /// Number of `set_position` calls received so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Actor for SimActor {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> WorldPos {
        self.position
    }

    fn set_position(&mut self, position: WorldPos) -> Result<(), MazeError> {
        self.position = position;
        self.frames += 1;
        Ok(())
    }

    fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn rotate_yaw(&mut self, degrees: f32) {
        self.yaw = (self.yaw + degrees).rem_euclid(360.0);
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub audio
// ────────────────────────────────────────────────────────────────────────────

/// One recorded playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedCue {
    pub clip: AudioClip,
    pub pan: f32,
}

/// Shared, cloneable record of everything a [`SimAudio`] played.
#[derive(Debug, Clone, Default)]
pub struct CueLog(Arc<Mutex<Vec<PlayedCue>>>);

impl CueLog {
    /// Snapshot of the playbacks so far, oldest first.
    pub fn played(&self) -> Vec<PlayedCue> {
        self.0.lock().map(|cues| cues.clone()).unwrap_or_default()
    }

    fn push(&self, cue: PlayedCue) -> Result<(), MazeError> {
        self.0
            .lock()
            .map_err(|e| MazeError::Surface {
                component: "sim_audio".to_string(),
                details: format!("cue log poisoned: {e}"),
            })?
            .push(cue);
        Ok(())
    }
}

/// A simulated audio device.  Always succeeds.
#[derive(Debug, Default)]
pub struct SimAudio {
    log: CueLog,
}

impl SimAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the playback record.
    pub fn log(&self) -> CueLog {
        self.log.clone()
    }
}

impl AudioSink for SimAudio {
    fn play(&mut self, clip: &AudioClip, pan: f32) -> Result<(), MazeError> {
        self.log.push(PlayedCue {
            clip: clip.clone(),
            pan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify that `SimActor` records its position, moving flag and wrapped yaw.
    #[test]
    fn sim_actor_records_pose() {
        let mut actor = SimActor::new("dummy", WorldPos::new(0.0, 1.0, 0.0));
        assert_eq!(actor.frames(), 0);
        actor.set_position(WorldPos::new(2.0, 1.0, 0.0)).unwrap();
        actor.set_moving(true);
        actor.rotate_yaw(90.0);
        actor.rotate_yaw(90.0);
        actor.rotate_yaw(-270.0);
        assert_eq!(actor.position(), WorldPos::new(2.0, 1.0, 0.0));
        assert!(actor.is_moving());
        assert!((actor.yaw() - 270.0).abs() < 1e-4);
        assert_eq!(actor.frames(), 1);
    }

    /// Verify that the cue log stays readable after the sink is boxed.
    #[test]
    fn sim_audio_log_survives_boxing() {
        let audio = SimAudio::new();
        let log = audio.log();
        let mut sink: Box<dyn AudioSink> = Box::new(audio);
        sink.play(&AudioClip::new("a"), 1.0).unwrap();
        sink.play(&AudioClip::new("b"), -1.0).unwrap();
        let played = log.played();
        assert_eq!(played.len(), 2);
        assert_eq!(played[1].clip.name(), "b");
        assert_eq!(played[1].pan, -1.0);
    }
}
