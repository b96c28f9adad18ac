//! Generic `Actor` trait for the rendered body of the navigated agent.
//!
//! The protocol never creates or spawns actors; the host hands one over and
//! the participant drives it through this trait only.

use mazelink_types::{MazeError, WorldPos};

/// The animated representation of the agent on one participant.
pub trait Actor: Send {
    /// Stable identifier, e.g. `"maze_dummy"`.
    fn id(&self) -> &str;

    /// Current world-space position.
    fn position(&self) -> WorldPos;

    /// Teleport the actor to `position`.  Called once per interpolation step.
    ///
    /// # Errors
    ///
    /// Returns [`MazeError::Surface`] if the render surface rejects the move.
    fn set_position(&mut self, position: WorldPos) -> Result<(), MazeError>;

    /// Toggle the "walking" animation.
    fn set_moving(&mut self, moving: bool);

    fn is_moving(&self) -> bool;

    /// Turn the visual facing by `degrees` around the vertical axis.
    fn rotate_yaw(&mut self, degrees: f32);

    /// Accumulated yaw in degrees, normalised to `[0, 360)`.
    fn yaw(&self) -> f32;
}
