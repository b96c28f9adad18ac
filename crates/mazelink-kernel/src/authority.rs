//! [`RelayAuthority`] – the single mutator of canonical agent state.
//!
//! The relay feeds every operator intent through [`RelayAuthority::handle`].
//! Two outcomes are possible:
//!
//! 1. **Accepted**: canonical position or facing is committed and the
//!    [`StateUpdate`] to broadcast is returned.  The caller must publish it to
//!    every participant, itself included; nobody applies it any other way.
//! 2. **Rejected**: nothing changes and nothing is broadcast.  This is a
//!    normal outcome, not an error.
//!
//! Rotations are always accepted.  Forward steps go through the configured
//! [`ValidatorPolicy`] (by default [`GridBoundsPolicy`]).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mazelink_kernel::{IntentOutcome, MazeGrid, RelayAuthority};
//! use mazelink_types::{AgentId, Direction, GridPosition, Intent, StateUpdate, WorldPos};
//!
//! let grid = Arc::new(MazeGrid::open(3, 3, 1.0, WorldPos::default()).unwrap());
//! let agent = AgentId::new();
//! let mut authority =
//!     RelayAuthority::new(agent, grid, GridPosition::new(1, 1), Direction::North).unwrap();
//!
//! match authority.handle(agent, Intent::Forward) {
//!     IntentOutcome::Accepted(StateUpdate::ForwardApplied { new_grid_position, .. }) => {
//!         assert_eq!(new_grid_position, GridPosition::new(1, 2));
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

use std::sync::Arc;

use mazelink_types::{
    AgentId, Direction, GridPosition, Intent, MazeError, RejectReason, Rotation, StateUpdate,
};
use tracing::{debug, info};

use crate::direction::DirectionState;
use crate::grid::{CellProbe, MazeGrid};
use crate::validator::{GridBoundsPolicy, ValidatorPolicy};

/// What the relay decided about one intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntentOutcome {
    /// Canonical state changed; broadcast this update.
    Accepted(StateUpdate),
    /// Silently dropped.
    Rejected(RejectReason),
}

/// Canonical state for the single navigated agent.
pub struct RelayAuthority {
    agent_id: AgentId,
    grid: Arc<MazeGrid>,
    position: GridPosition,
    facing: DirectionState,
    policy: Box<dyn ValidatorPolicy>,
}

impl RelayAuthority {
    /// Create an authority with the agent at `spawn` facing `direction`.
    ///
    /// # Errors
    ///
    /// [`MazeError::InvalidMaze`] when `spawn` is outside the grid or on an
    /// obstacle.
    pub fn new(
        agent_id: AgentId,
        grid: Arc<MazeGrid>,
        spawn: GridPosition,
        direction: Direction,
    ) -> Result<Self, MazeError> {
        if grid.probe(spawn) != CellProbe::Open {
            return Err(MazeError::InvalidMaze(format!(
                "spawn {spawn} is not an open cell"
            )));
        }
        Ok(Self {
            agent_id,
            grid,
            position: spawn,
            facing: DirectionState::new(direction),
            policy: Box::new(GridBoundsPolicy),
        })
    }

    /// Replace the forward-step policy.
    pub fn with_policy(mut self, policy: Box<dyn ValidatorPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.facing.current()
    }

    pub fn grid(&self) -> &Arc<MazeGrid> {
        &self.grid
    }

    /// Validate and, if legal, commit `intent` for `agent_id`.
    pub fn handle(&mut self, agent_id: AgentId, intent: Intent) -> IntentOutcome {
        if agent_id != self.agent_id {
            debug!(%agent_id, "intent for unknown agent dropped");
            return IntentOutcome::Rejected(RejectReason::UnknownAgent);
        }
        match intent {
            Intent::Forward => self.handle_forward(),
            Intent::Rotate { delta } => self.handle_rotate(delta),
        }
    }

    fn handle_forward(&mut self) -> IntentOutcome {
        let direction = self.facing.current();
        let candidate = self.position.step(direction);
        if !self
            .policy
            .can_step_forward(self.position, direction, &self.grid)
        {
            debug!(
                from = %self.position,
                %candidate,
                policy = self.policy.name(),
                probe = ?self.grid.probe(candidate),
                "forward step rejected"
            );
            return IntentOutcome::Rejected(RejectReason::Blocked { candidate });
        }

        self.position = candidate;
        let target = self.grid.to_world(candidate);
        info!(to = %candidate, %direction, "forward step committed");
        IntentOutcome::Accepted(StateUpdate::ForwardApplied {
            target_world_position: target,
            new_grid_position: candidate,
        })
    }

    fn handle_rotate(&mut self, delta: Rotation) -> IntentOutcome {
        let facing = self.facing.rotate(delta);
        info!(?delta, %facing, "rotation committed");
        IntentOutcome::Accepted(StateUpdate::RotateApplied { delta })
    }
}
