//! [`Session`] – one operator, one relay and N observers on one bus.
//!
//! The host drives a session from its frame loop:
//!
//! ```text
//! loop {
//!     feed input into session.operator()   // request_forward / request_rotate
//!     session.pump()?;                     // relay validates, everyone applies
//!     session.tick(dt)?;                   // interpolators advance one frame
//! }
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mazelink_kernel::MazeGrid;
//! use mazelink_runtime::session::{Session, SessionConfig};
//! use mazelink_types::{GridPosition, WorldPos};
//!
//! let grid = Arc::new(MazeGrid::open(3, 3, 1.0, WorldPos::default()).unwrap());
//! let config = SessionConfig { spawn: GridPosition::new(1, 1), ..SessionConfig::default() };
//! let mut session = Session::builder(grid).config(config).observers(1).build().unwrap();
//!
//! session.operator().request_forward().unwrap();
//! session.pump().unwrap();
//! session.run_until_idle(1.0 / 60.0, 600).unwrap();
//! assert_eq!(session.operator().position(), GridPosition::new(1, 2));
//! ```

use std::sync::Arc;

use mazelink_hal::sim::{SimActor, SimAudio};
use mazelink_hal::{Actor, AudioClip, AudioSink, CueMapper, StereoCueMapper};
use mazelink_kernel::{MazeGrid, RelayAuthority, ValidatorPolicy};
use mazelink_middleware::{EventBus, Topic};
use mazelink_types::{
    AgentId, DebugMessage, Direction, GridPosition, MazeError, PendingIntent, Role,
};
use tracing::{debug, info};

use crate::participant::Participant;
use crate::relay::RelayNode;

/// Default number of buffered events per bus lane.
const BUS_CAPACITY: usize = 256;

/// Tunables shared by every participant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Duration of one forward step, in seconds.
    pub travel_time: f32,
    pub spawn: GridPosition,
    pub spawn_direction: Direction,
    /// Clip pool for the default rotation cue mapper.
    pub clips: Vec<String>,
    /// Stereo pan magnitude for the default cue mapper, in `(0, 1]`.
    pub pan_strength: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            travel_time: 0.5,
            spawn: GridPosition::new(0, 0),
            spawn_direction: Direction::North,
            clips: vec!["rustle".to_string()],
            pan_strength: 1.0,
        }
    }
}

type ActorFactory = Box<dyn Fn(Role, usize) -> Box<dyn Actor>>;

/// Builder for [`Session`].  Everything but the grid has a default.
pub struct SessionBuilder {
    grid: Arc<MazeGrid>,
    config: SessionConfig,
    observers: usize,
    policy: Option<Box<dyn ValidatorPolicy>>,
    cues: Option<Box<dyn CueMapper>>,
    audio: Option<Box<dyn AudioSink>>,
    actors: Option<ActorFactory>,
}

impl SessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of passive observers to attach.
    pub fn observers(mut self, count: usize) -> Self {
        self.observers = count;
        self
    }

    /// Forward-step policy for this maze variant.
    pub fn validator(mut self, policy: Box<dyn ValidatorPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Rotation cue mapper for this maze variant.  Overrides the clip pool in
    /// [`SessionConfig`].
    pub fn cue_mapper(mut self, cues: Box<dyn CueMapper>) -> Self {
        self.cues = Some(cues);
        self
    }

    /// The relay's audio device.  Defaults to a silent [`SimAudio`].
    pub fn audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Create each participant's actor.  Receives the role and, for
    /// observers, their index.  Defaults to [`SimActor`] at the spawn cell.
    pub fn actors(mut self, factory: impl Fn(Role, usize) -> Box<dyn Actor> + 'static) -> Self {
        self.actors = Some(Box::new(factory));
        self
    }

    /// Wire everything onto a fresh bus.
    ///
    /// # Errors
    ///
    /// - [`MazeError::InvalidMaze`] if the spawn cell is not open.
    /// - [`MazeError::EmptyClipPool`] if no cue mapper was given and the
    ///   configured clip pool is empty.
    pub fn build(self) -> Result<Session, MazeError> {
        let SessionConfig {
            travel_time,
            spawn,
            spawn_direction,
            clips,
            pan_strength,
        } = self.config;

        let cues = match self.cues {
            Some(cues) => cues,
            None => Box::new(StereoCueMapper::new(
                clips.into_iter().map(AudioClip::new).collect(),
                pan_strength,
            )?),
        };
        let audio = self.audio.unwrap_or_else(|| Box::new(SimAudio::new()));

        let agent_id = AgentId::new();
        let mut authority = RelayAuthority::new(agent_id, Arc::clone(&self.grid), spawn, spawn_direction)?;
        if let Some(policy) = self.policy {
            authority = authority.with_policy(policy);
        }

        let spawn_world = self.grid.to_world(spawn);
        let actors = self.actors.unwrap_or_else(|| {
            Box::new(move |role: Role, index: usize| {
                SimActor::new(format!("{role}_dummy_{index}"), spawn_world) as Box<dyn Actor>
            })
        });

        let bus = EventBus::new(BUS_CAPACITY);
        let join = |role: Role, index: usize| {
            Participant::new(
                role,
                agent_id,
                &bus,
                spawn,
                spawn_direction,
                travel_time,
                actors(role, index),
            )
        };

        let relay = RelayNode::new(join(Role::Relay, 0), authority, &bus, cues, audio)?;
        let operator = join(Role::Operator, 0);
        let observers = (0..self.observers)
            .map(|i| join(Role::Observer, i))
            .collect();

        info!(
            %agent_id,
            %spawn,
            direction = %spawn_direction,
            width = self.grid.width(),
            height = self.grid.height(),
            cell_size = self.grid.cell_size(),
            origin = ?self.grid.origin(),
            observers = self.observers,
            "session started"
        );
        debug!(
            listeners = bus.subscriber_count(Topic::StateUpdates),
            "update lane wired"
        );

        Ok(Session {
            grid: self.grid,
            operator,
            relay,
            observers,
        })
    }
}

/// A running navigation session.
pub struct Session {
    grid: Arc<MazeGrid>,
    operator: Participant,
    relay: RelayNode,
    observers: Vec<Participant>,
}

impl Session {
    pub fn builder(grid: Arc<MazeGrid>) -> SessionBuilder {
        SessionBuilder {
            grid,
            config: SessionConfig::default(),
            observers: 0,
            policy: None,
            cues: None,
            audio: None,
            actors: None,
        }
    }

    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn operator(&self) -> &Participant {
        &self.operator
    }

    pub fn relay(&self) -> &RelayNode {
        &self.relay
    }

    pub fn observers(&self) -> &[Participant] {
        &self.observers
    }

    fn mirrors(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.operator)
            .chain(std::iter::once(self.relay.participant()))
            .chain(self.observers.iter())
    }

    /// Whether every participant is idle.
    pub fn is_settled(&self) -> bool {
        self.mirrors().all(Participant::is_idle)
    }

    /// Send an echo from the operator.
    pub fn echo(&self, message: DebugMessage) -> Result<(), MazeError> {
        self.operator.send_debug(message)
    }

    /// Deliver everything queued on the bus.  The relay goes first so the
    /// updates it broadcasts are visible to the others in the same call.
    pub fn pump(&mut self) -> Result<Vec<PendingIntent>, MazeError> {
        let handled = self.relay.pump()?;
        self.operator.pump()?;
        for observer in &mut self.observers {
            observer.pump()?;
        }
        Ok(handled)
    }

    /// Advance every participant's motion by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> Result<(), MazeError> {
        self.relay.advance(dt)?;
        self.operator.advance(dt)?;
        for observer in &mut self.observers {
            observer.advance(dt)?;
        }
        Ok(())
    }

    /// Tick at `dt` until everyone is idle or `max_frames` have run.
    /// Returns the number of frames ticked.
    pub fn run_until_idle(&mut self, dt: f32, max_frames: usize) -> Result<usize, MazeError> {
        let mut frames = 0;
        while !self.is_settled() && frames < max_frames {
            self.tick(dt)?;
            frames += 1;
        }
        debug!(frames, settled = self.is_settled(), "frame loop drained");
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazelink_hal::sim::CueLog;
    use mazelink_types::{IntentPhase, MovementState, RejectReason, Rotation, WorldPos};

    const FRAME: f32 = 1.0 / 60.0;

    fn session(layout: &str, spawn: (i32, i32), direction: Direction) -> (Session, CueLog) {
        let grid = Arc::new(MazeGrid::from_ascii(layout, 2.0, WorldPos::default()).unwrap());
        let audio = SimAudio::new();
        let log = audio.log();
        let config = SessionConfig {
            spawn: GridPosition::new(spawn.0, spawn.1),
            spawn_direction: direction,
            ..SessionConfig::default()
        };
        let session = Session::builder(grid)
            .config(config)
            .observers(2)
            .audio(Box::new(audio))
            .build()
            .unwrap();
        (session, log)
    }

    fn assert_all<F: Fn(&Participant) -> bool>(session: &Session, check: F) {
        for p in session.mirrors() {
            assert!(check(p), "{} failed the check", p.role());
        }
    }

    /// Verify that a left turn from North leaves every mirror facing West.
    #[test]
    fn rotate_left_from_north_faces_west_everywhere() {
        let (mut session, log) = session("...\n...\n...", (1, 1), Direction::North);

        session.operator().request_rotate(Rotation::Left).unwrap();
        let handled = session.pump().unwrap();

        assert_eq!(handled.len(), 1);
        assert_eq!(handled[0].phase, IntentPhase::Applied);
        assert_all(&session, |p| p.direction() == Direction::West);
        assert_all(&session, |p| (p.actor().yaw() - 270.0).abs() < 1e-4);
        assert_eq!(log.played().len(), 1);
        assert_eq!(log.played()[0].pan, -1.0);
    }

    /// Verify that a step off the grid changes no mirror.
    #[test]
    fn forward_out_of_bounds_changes_nothing() {
        let (mut session, log) = session("...\n...\n...", (0, 0), Direction::West);

        session.operator().request_forward().unwrap();
        let handled = session.pump().unwrap();

        assert_eq!(
            handled[0].phase,
            IntentPhase::Rejected(RejectReason::Blocked {
                candidate: GridPosition::new(-1, 0)
            })
        );
        assert_all(&session, |p| p.position() == GridPosition::new(0, 0));
        assert_all(&session, |p| p.movement_state() == MovementState::Idle);
        assert!(log.played().is_empty());
    }

    /// Verify that a step into an obstacle is rejected for everyone.
    #[test]
    fn forward_into_obstacle_is_rejected() {
        let (mut session, _) = session("...\n..#\n...", (1, 1), Direction::East);

        session.operator().request_forward().unwrap();
        let handled = session.pump().unwrap();

        assert!(matches!(
            handled[0].phase,
            IntentPhase::Rejected(RejectReason::Blocked { .. })
        ));
        assert_all(&session, |p| p.position() == GridPosition::new(1, 1));
        assert!(session.is_settled());
    }

    /// Verify that an accepted step moves every mirror and then settles.
    #[test]
    fn accepted_forward_moves_everyone_then_settles() {
        let (mut session, _) = session("...\n...\n...", (1, 1), Direction::North);
        let target = session.grid().to_world(GridPosition::new(1, 2));

        assert_all(&session, Participant::is_idle);
        session.operator().request_forward().unwrap();
        session.pump().unwrap();

        assert_all(&session, |p| p.position() == GridPosition::new(1, 2));
        assert_all(&session, |p| p.movement_state() == MovementState::Moving);

        let frames = session.run_until_idle(FRAME, 600).unwrap();

        assert!(frames >= 29, "settled too early after {frames} frames");
        assert_all(&session, Participant::is_idle);
        assert_all(&session, |p| p.actor().position() == target);
    }

    /// Verify that mirrors are still moving one frame short of arrival.
    #[test]
    fn still_moving_just_short_of_target() {
        let (mut session, _) = session("...\n...\n...", (1, 1), Direction::North);
        session.operator().request_forward().unwrap();
        session.pump().unwrap();

        // 0.49 s of a 0.5 s step over 2 world units leaves 0.04 to go.
        session.tick(0.49).unwrap();
        assert_all(&session, |p| p.movement_state() == MovementState::Moving);
        session.tick(0.01).unwrap();
        assert_all(&session, Participant::is_idle);
    }

    /// Verify that the operator cannot request while its mirror is moving.
    #[test]
    fn operator_cannot_request_while_moving() {
        let (mut session, _) = session("...\n...\n...", (1, 0), Direction::North);
        session.operator().request_forward().unwrap();
        session.pump().unwrap();

        assert_eq!(session.operator().request_forward(), Err(MazeError::AgentBusy));

        session.run_until_idle(FRAME, 600).unwrap();
        session.operator().request_forward().unwrap();
        session.pump().unwrap();
        assert_all(&session, |p| p.position() == GridPosition::new(1, 2));
    }

    /// Verify that every mirror tracks the relay along a whole route.
    #[test]
    fn all_mirrors_track_the_relay_through_a_route() {
        let (mut session, log) = session("....\n.##.\n....", (0, 0), Direction::North);
        let route = [
            (None, GridPosition::new(0, 1)),
            (None, GridPosition::new(0, 2)),
            (Some(Rotation::Right), GridPosition::new(0, 2)),
            (None, GridPosition::new(1, 2)),
            (None, GridPosition::new(2, 2)),
            (Some(Rotation::Right), GridPosition::new(2, 2)),
            // (2, 1) is an obstacle.
            (None, GridPosition::new(2, 2)),
        ];
        for (turn, expected) in route {
            match turn {
                Some(delta) => session.operator().request_rotate(delta).unwrap(),
                None => session.operator().request_forward().unwrap(),
            }
            session.pump().unwrap();
            session.run_until_idle(FRAME, 600).unwrap();

            let canonical = session.relay().authority().position();
            assert_eq!(canonical, expected);
            assert_all(&session, |p| p.position() == canonical);
            assert_all(&session, |p| p.direction() == session.relay().authority().direction());
        }
        assert_eq!(log.played().len(), 2);
    }

    /// Verify that an empty clip pool fails session start.
    #[test]
    fn empty_clip_pool_fails_at_startup() {
        let grid = Arc::new(MazeGrid::open(2, 2, 1.0, WorldPos::default()).unwrap());
        let config = SessionConfig {
            clips: Vec::new(),
            ..SessionConfig::default()
        };
        let result = Session::builder(grid).config(config).build();
        assert!(matches!(result, Err(MazeError::EmptyClipPool)));
    }

    struct UnpluggedAudio;

    impl AudioSink for UnpluggedAudio {
        fn play(&mut self, _clip: &AudioClip, _pan: f32) -> Result<(), MazeError> {
            Err(MazeError::Surface {
                component: "audio".to_string(),
                details: "unplugged".to_string(),
            })
        }
    }

    /// Verify that a failing audio device still lets a turn reach every mirror.
    #[test]
    fn audio_fault_still_turns_everyone() {
        let grid = Arc::new(MazeGrid::open(3, 3, 1.0, WorldPos::default()).unwrap());
        let config = SessionConfig {
            spawn: GridPosition::new(1, 1),
            ..SessionConfig::default()
        };
        let mut session = Session::builder(grid)
            .config(config)
            .observers(1)
            .audio(Box::new(UnpluggedAudio))
            .build()
            .unwrap();

        session.operator().request_rotate(Rotation::Left).unwrap();
        let handled = session.pump().unwrap();

        assert_eq!(handled[0].phase, IntentPhase::Applied);
        assert_eq!(session.relay().authority().direction(), Direction::West);
        assert_all(&session, |p| p.direction() == Direction::West);
    }

    /// Verify that a debug echo travels the bus without producing intents.
    #[test]
    fn echo_reaches_the_bus() {
        let (mut session, _) = session("..", (0, 0), Direction::North);
        session.echo(DebugMessage::Text("hello".to_string())).unwrap();
        assert!(session.pump().unwrap().is_empty());
    }
}
