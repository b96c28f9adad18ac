//! [`DirectionState`] – an agent's facing as an index into the cyclic list
//! `[North, West, South, East]`.
//!
//! A positive rotation moves the index up (turning left); a negative one
//! moves it down.  The index always wraps into `0..4`.
//!
//! ```
//! use mazelink_kernel::direction::DirectionState;
//! use mazelink_types::{Direction, Rotation};
//!
//! let mut facing = DirectionState::new(Direction::North);
//! assert_eq!(facing.rotate(Rotation::Right), Direction::East);
//! assert_eq!(facing.rotate(Rotation::Left), Direction::North);
//! ```

use mazelink_types::{Direction, Rotation};

/// Number of orthogonal facings.
const FACINGS: i8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionState {
    index: u8,
}

impl DirectionState {
    pub fn new(direction: Direction) -> Self {
        Self {
            index: direction.index(),
        }
    }

    pub fn current(&self) -> Direction {
        Direction::from_index(self.index)
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Apply a quarter turn and return the new facing.
    pub fn rotate(&mut self, rotation: Rotation) -> Direction {
        // rem_euclid never goes negative, unlike `%`.
        let next = (self.index as i8 + rotation.delta()).rem_euclid(FACINGS);
        self.index = next as u8;
        self.current()
    }
}
