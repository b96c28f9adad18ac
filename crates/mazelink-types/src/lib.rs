use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Grid and world coordinates
// ────────────────────────────────────────────────────────────────────────────

/// Integer coordinate on the maze lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step along `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.unit_vector();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Linear interpolation towards `target`.  `t` is clamped to `[0, 1]`.
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
            self.z + (target.z - self.z) * t,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Facing and rotation
// ────────────────────────────────────────────────────────────────────────────

/// One of the four orthogonal facings.
///
/// The discriminant is the index into the cyclic direction list; increasing
/// the index turns the agent left (counter-clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    North = 0,
    West = 1,
    South = 2,
    East = 3,
}

impl Direction {
    /// All facings in index order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::South,
        Direction::East,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Facing for `index`, wrapping modulo 4.
    pub fn from_index(index: u8) -> Self {
        Self::ALL[usize::from(index % 4)]
    }

    /// Unit grid offset `(dx, dy)` for one step in this facing.
    pub fn unit_vector(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::West => (-1, 0),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::West => write!(f, "west"),
            Direction::South => write!(f, "south"),
            Direction::East => write!(f, "east"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "west" | "w" => Ok(Direction::West),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            other => Err(MazeError::InvalidDirection(other.to_string())),
        }
    }
}

/// A quarter turn.  On the wire this is the signed delta `+1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Rotation {
    /// `+1`: direction index goes up, agent turns counter-clockwise.
    Left,
    /// `-1`: direction index goes down, agent turns clockwise.
    Right,
}

impl Rotation {
    pub fn delta(self) -> i8 {
        match self {
            Rotation::Left => 1,
            Rotation::Right => -1,
        }
    }

    /// Yaw applied to the visual facing, in degrees.  A negative delta turns
    /// the model by +90°, a positive delta by -90°.
    pub fn visual_yaw_degrees(self) -> f32 {
        match self {
            Rotation::Left => -90.0,
            Rotation::Right => 90.0,
        }
    }
}

impl TryFrom<i8> for Rotation {
    type Error = MazeError;

    fn try_from(delta: i8) -> Result<Self, Self::Error> {
        match delta {
            1 => Ok(Rotation::Left),
            -1 => Ok(Rotation::Right),
            other => Err(MazeError::InvalidRotationDelta(other)),
        }
    }
}

impl From<Rotation> for i8 {
    fn from(rotation: Rotation) -> Self {
        rotation.delta()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Maze and agent state
// ────────────────────────────────────────────────────────────────────────────

/// Kind of a single maze cell.  Immutable once the maze is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MazeCell {
    #[default]
    Empty,
    Obstacle,
}

/// Per-agent animation gate.  New intents are only issued while `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementState {
    #[default]
    Idle,
    Moving,
}

/// Session role of a participant.  Fixed for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Issues intents; never authoritative.
    Operator,
    /// Validates intents, owns canonical state and plays audio cues.
    Relay,
    /// Passive mirror that only applies broadcast updates.
    Observer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Relay => write!(f, "relay"),
            Role::Observer => write!(f, "observer"),
        }
    }
}

/// Identifies the navigated agent across participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Protocol messages
// ────────────────────────────────────────────────────────────────────────────

/// Operator → relay request.  Not applied anywhere until the relay echoes a
/// [`StateUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "payload")]
pub enum Intent {
    Forward,
    Rotate { delta: Rotation },
}

/// Relay → all canonical update.  The only trigger for mutating mirrored
/// state on any participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "update", content = "payload")]
pub enum StateUpdate {
    ForwardApplied {
        target_world_position: WorldPos,
        new_grid_position: GridPosition,
    },
    RotateApplied {
        delta: Rotation,
    },
}

/// Free-form echo traffic.  Not part of the ordering contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DebugMessage {
    Text(String),
    Byte(u8),
    Int(i32),
    Float(f32),
    Vector3(WorldPos),
}

impl std::fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebugMessage::Text(s) => write!(f, "{s}"),
            DebugMessage::Byte(b) => write!(f, "byte {b}"),
            DebugMessage::Int(i) => write!(f, "int {i}"),
            DebugMessage::Float(v) => write!(f, "float {v}"),
            DebugMessage::Vector3(p) => write!(f, "vector3 ({}, {}, {})", p.x, p.y, p.z),
        }
    }
}

/// Unified envelope for everything carried by the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "mazelink-runtime::operator"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` in a fresh envelope stamped with the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Intent { agent_id: AgentId, intent: Intent },
    StateUpdate { agent_id: AgentId, update: StateUpdate },
    Debug { from: Role, message: DebugMessage },
}

// ────────────────────────────────────────────────────────────────────────────
// Intent lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// Why the relay dropped an intent.  Rejections are silent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The forward step would leave the grid or enter an obstacle.
    Blocked { candidate: GridPosition },
    /// The agent was still animating a previous step.
    Busy,
    /// The intent named an agent the relay does not own.
    UnknownAgent,
}

/// Phase of a single intent as seen by the relay.
///
/// `Requested` → `Validated` → `Applied`, or `Requested` → `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentPhase {
    Requested,
    Validated,
    Applied,
    Rejected(RejectReason),
}

impl IntentPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, IntentPhase::Applied | IntentPhase::Rejected(_))
    }
}

/// An intent together with the phase it has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIntent {
    pub intent: Intent,
    pub phase: IntentPhase,
}

impl PendingIntent {
    pub fn requested(intent: Intent) -> Self {
        Self {
            intent,
            phase: IntentPhase::Requested,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Global error type spanning protocol misuse, misconfiguration and
/// transport failures.  Rejected intents are not errors.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MazeError {
    #[error("Invalid rotation delta {0}: expected +1 or -1")]
    InvalidRotationDelta(i8),

    #[error("Invalid maze: {0}")]
    InvalidMaze(String),

    #[error("Audio clip pool is empty")]
    EmptyClipPool,

    #[error("Agent is still moving; intent not sent")]
    AgentBusy,

    #[error("Role {role} may not {action}")]
    RoleViolation { role: Role, action: String },

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Surface fault on {component}: {details}")]
    Surface { component: String, details: String },

    #[error("Unknown direction '{0}': expected north, west, south or east")]
    InvalidDirection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify that direction unit vectors follow the index order.
    #[test]
    fn direction_unit_vectors_follow_index_order() {
        assert_eq!(Direction::from_index(0).unit_vector(), (0, 1));
        assert_eq!(Direction::from_index(1).unit_vector(), (-1, 0));
        assert_eq!(Direction::from_index(2).unit_vector(), (0, -1));
        assert_eq!(Direction::from_index(3).unit_vector(), (1, 0));
        assert_eq!(Direction::from_index(7), Direction::East);
    }

    /// Verify that stepping a grid position adds the unit vector.
    #[test]
    fn grid_step_moves_by_unit_vector() {
        let p = GridPosition::new(1, 1);
        assert_eq!(p.step(Direction::North), GridPosition::new(1, 2));
        assert_eq!(p.step(Direction::West), GridPosition::new(0, 1));
        assert_eq!(p.step(Direction::South), GridPosition::new(1, 0));
        assert_eq!(p.step(Direction::East), GridPosition::new(2, 1));
    }

    /// Verify that only `+1` and `-1` are rotation deltas.
    #[test]
    fn rotation_accepts_only_unit_deltas() {
        assert_eq!(Rotation::try_from(1i8), Ok(Rotation::Left));
        assert_eq!(Rotation::try_from(-1i8), Ok(Rotation::Right));
        assert_eq!(Rotation::try_from(0i8), Err(MazeError::InvalidRotationDelta(0)));
        assert_eq!(Rotation::try_from(2i8), Err(MazeError::InvalidRotationDelta(2)));
    }

    /// Verify that rotations serialise as their signed delta.
    #[test]
    fn rotation_wire_form_is_signed_delta() {
        let intent = Intent::Rotate { delta: Rotation::Right };
        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("-1"), "unexpected wire form: {json}");
        let back: Intent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }

    /// Verify that a rotation delta other than ±1 fails to decode.
    #[test]
    fn malformed_rotation_delta_fails_to_decode() {
        let json = r#"{"intent":"Rotate","payload":{"delta":3}}"#;
        assert!(serde_json::from_str::<Intent>(json).is_err());
    }

    /// Verify that visual yaw turns opposite to the delta sign.
    #[test]
    fn visual_yaw_is_opposite_to_delta_sign() {
        assert_eq!(Rotation::Right.visual_yaw_degrees(), 90.0);
        assert_eq!(Rotation::Left.visual_yaw_degrees(), -90.0);
    }

    /// Verify that world interpolation clamps its parameter to `[0, 1]`.
    #[test]
    fn world_lerp_clamps_parameter() {
        let a = WorldPos::new(0.0, 0.0, 0.0);
        let b = WorldPos::new(2.0, 0.0, 4.0);
        assert_eq!(a.lerp(b, 0.5), WorldPos::new(1.0, 0.0, 2.0));
        assert_eq!(a.lerp(b, 3.0), b);
        assert_eq!(a.lerp(b, -1.0), a);
        assert!((a.distance(b) - 20f32.sqrt()).abs() < 1e-6);
    }

    /// Verify that events survive a JSON round trip.
    #[test]
    fn event_roundtrip() {
        let agent_id = AgentId::new();
        let event = Event::new(
            "mazelink-runtime::relay",
            EventPayload::StateUpdate {
                agent_id,
                update: StateUpdate::ForwardApplied {
                    target_world_position: WorldPos::new(2.0, 0.0, 4.0),
                    new_grid_position: GridPosition::new(1, 2),
                },
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        match back.payload {
            EventPayload::StateUpdate { agent_id: id, update } => {
                assert_eq!(id, agent_id);
                assert!(matches!(
                    update,
                    StateUpdate::ForwardApplied { new_grid_position, .. }
                        if new_grid_position == GridPosition::new(1, 2)
                ));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    /// Verify that direction names parse and unknown names fail.
    #[test]
    fn direction_parses_from_config_strings() {
        assert_eq!("North".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("e".parse::<Direction>().unwrap(), Direction::East);
        assert_eq!(
            "up".parse::<Direction>(),
            Err(MazeError::InvalidDirection("up".to_string()))
        );
    }

    /// Verify that only applied and rejected phases are terminal.
    #[test]
    fn intent_phase_terminality() {
        assert!(!IntentPhase::Requested.is_terminal());
        assert!(!IntentPhase::Validated.is_terminal());
        assert!(IntentPhase::Applied.is_terminal());
        assert!(IntentPhase::Rejected(RejectReason::Busy).is_terminal());
    }

    /// Verify that `MazeError` messages name the failing value.
    #[test]
    fn maze_error_display() {
        let err = MazeError::RoleViolation {
            role: Role::Relay,
            action: "request forward".to_string(),
        };
        assert!(err.to_string().contains("relay"));
        assert!(MazeError::InvalidRotationDelta(5).to_string().contains('5'));
    }
}
