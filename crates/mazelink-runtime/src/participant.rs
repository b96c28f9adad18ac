//! [`Participant`] – one role's mirrored copy of the navigated agent.
//!
//! Every participant (operator, relay, observers) runs the same state
//! machine so their copies stay identical:
//!
//! | Event | Effect |
//! |---|---|
//! | `ForwardApplied(target, cell)` | `MovementState = Moving`, grid position = `cell` immediately, motion towards `target` starts |
//! | `RotateApplied(delta)` | facing index rotates with wraparound, actor yaw turns ±90° |
//! | motion within epsilon of target | actor snaps to target, `MovementState = Idle` |
//!
//! Local state only ever changes through [`Participant::apply`].  The
//! operator's [`request_forward`](Participant::request_forward) and
//! [`request_rotate`](Participant::request_rotate) just put an intent on the
//! wire and wait for the relay's echo.

use mazelink_hal::{Actor, MotionInterpolator};
use mazelink_kernel::DirectionState;
use mazelink_middleware::{EventBus, Topic, TopicReceiver};
use mazelink_types::{
    AgentId, DebugMessage, Direction, EventPayload, GridPosition, Intent, MazeError,
    MovementState, Role, Rotation, StateUpdate, WorldPos,
};
use tracing::{debug, info, warn};

pub struct Participant {
    role: Role,
    agent_id: AgentId,
    source: String,
    bus: EventBus,
    updates: TopicReceiver,
    echoes: TopicReceiver,
    position: GridPosition,
    facing: DirectionState,
    movement: MovementState,
    motion: Option<MotionInterpolator>,
    travel_time: f32,
    actor: Box<dyn Actor>,
}

impl Participant {
    /// Join `bus` as `role`, mirroring `agent_id` spawned at `spawn`.
    ///
    /// The participant subscribes immediately, so it sees every update the
    /// relay broadcasts from now on.  `travel_time` is the duration of one
    /// forward step in seconds.
    pub fn new(
        role: Role,
        agent_id: AgentId,
        bus: &EventBus,
        spawn: GridPosition,
        direction: Direction,
        travel_time: f32,
        actor: Box<dyn Actor>,
    ) -> Self {
        Self {
            role,
            agent_id,
            source: format!("mazelink-runtime::{role}"),
            bus: bus.clone(),
            updates: bus.subscribe_to(Topic::StateUpdates),
            echoes: bus.subscribe_to(Topic::Debug),
            position: spawn,
            facing: DirectionState::new(direction),
            movement: MovementState::Idle,
            motion: None,
            travel_time,
            actor,
        }
    }

    pub fn role(&self) -> Role {
        self.role
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

    pub fn movement_state(&self) -> MovementState {
        self.movement
    }

    pub fn is_idle(&self) -> bool {
        self.movement == MovementState::Idle
    }

    /// Duration of one forward step, in seconds.
    pub fn travel_time(&self) -> f32 {
        self.travel_time
    }

    pub fn actor(&self) -> &dyn Actor {
        self.actor.as_ref()
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    // ── Operator entry points ─────────────────────────────────────────────

    /// Ask the relay to move one cell forward.
    ///
    /// # Errors
    ///
    /// - [`MazeError::RoleViolation`] unless called on the operator.
    /// - [`MazeError::AgentBusy`] while the previous step is still animating.
    /// - [`MazeError::Channel`] if the relay is not listening.
    pub fn request_forward(&self) -> Result<(), MazeError> {
        self.ensure_can_request("request forward")?;
        self.bus
            .send_intent(&self.source, self.agent_id, Intent::Forward)?;
        Ok(())
    }

    /// Ask the relay to turn a quarter turn.  Same errors as
    /// [`request_forward`](Self::request_forward).
    pub fn request_rotate(&self, delta: Rotation) -> Result<(), MazeError> {
        self.ensure_can_request("request rotate")?;
        self.bus
            .send_intent(&self.source, self.agent_id, Intent::Rotate { delta })?;
        Ok(())
    }

    fn ensure_can_request(&self, action: &str) -> Result<(), MazeError> {
        if self.role != Role::Operator {
            warn!(role = %self.role, action, "non-operator tried to issue an intent");
            return Err(MazeError::RoleViolation {
                role: self.role,
                action: action.to_string(),
            });
        }
        if self.movement == MovementState::Moving {
            return Err(MazeError::AgentBusy);
        }
        Ok(())
    }

    /// Put an echo message on the debug lane.
    pub fn send_debug(&self, message: DebugMessage) -> Result<(), MazeError> {
        self.bus.send_debug(&self.source, self.role, message)?;
        Ok(())
    }

    // ── Broadcast handlers ────────────────────────────────────────────────

    /// Apply one canonical update from the relay.
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), MazeError> {
        match update {
            StateUpdate::ForwardApplied {
                target_world_position,
                new_grid_position,
            } => self.apply_forward(target_world_position, new_grid_position),
            StateUpdate::RotateApplied { delta } => {
                self.apply_rotate(delta);
                Ok(())
            }
        }
    }

    /// Start moving towards `target` and book the new cell immediately.
    pub fn apply_forward(
        &mut self,
        target: WorldPos,
        new_grid_position: GridPosition,
    ) -> Result<(), MazeError> {
        let from = self.actor.position();
        self.movement = MovementState::Moving;
        self.actor.set_moving(true);
        self.motion = Some(MotionInterpolator::start(from, target, self.travel_time));
        debug!(
            role = %self.role,
            from = %self.position,
            to = %new_grid_position,
            "forward applied"
        );
        self.position = new_grid_position;
        Ok(())
    }

    /// Rotate the facing and turn the actor.
    pub fn apply_rotate(&mut self, delta: Rotation) -> Direction {
        let facing = self.facing.rotate(delta);
        self.actor.rotate_yaw(delta.visual_yaw_degrees());
        debug!(role = %self.role, %facing, "rotate applied");
        facing
    }

    // ── Frame loop ────────────────────────────────────────────────────────

    /// Drain queued updates and echoes.  Returns the number of updates
    /// applied to this agent.
    pub fn pump(&mut self) -> Result<usize, MazeError> {
        let mut applied = 0;
        while let Some(event) = self.updates.try_next() {
            match event.payload {
                EventPayload::StateUpdate { agent_id, update } if agent_id == self.agent_id => {
                    self.apply(update)?;
                    applied += 1;
                }
                EventPayload::StateUpdate { agent_id, .. } => {
                    debug!(role = %self.role, %agent_id, "update for another agent ignored");
                }
                other => warn!(role = %self.role, ?other, "unexpected payload on update lane"),
            }
        }
        while let Some(event) = self.echoes.try_next() {
            if let EventPayload::Debug { from, message } = event.payload
                && from != self.role
            {
                info!(role = %self.role, %from, %message, "echo received");
            }
        }
        Ok(applied)
    }

    /// Advance the in-flight motion by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> Result<(), MazeError> {
        let Some(motion) = self.motion.as_mut() else {
            return Ok(());
        };
        let sampled = motion.advance(dt);
        if motion.is_complete() {
            let target = motion.target();
            let elapsed = motion.elapsed();
            self.motion = None;
            self.actor.set_position(target)?;
            self.actor.set_moving(false);
            self.movement = MovementState::Idle;
            debug!(role = %self.role, cell = %self.position, elapsed, "arrived");
        } else {
            self.actor.set_position(sampled)?;
        }
        Ok(())
    }
}
