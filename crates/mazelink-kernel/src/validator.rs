//! Forward-step validation.
//!
//! [`can_step_forward`] is the canonical rule: the cell one step ahead must
//! lie inside the grid and must not be an obstacle.  Maze variants that need
//! different rules plug in their own [`ValidatorPolicy`] instead of
//! subclassing the relay.

use mazelink_types::{Direction, GridPosition};

use crate::grid::{CellProbe, MazeGrid};

// ────────────────────────────────────────────────────────────────────────────
// Policy trait
// ────────────────────────────────────────────────────────────────────────────

/// Decides whether the agent may advance one cell.
///
/// Implementations must be pure: same inputs, same answer, no side effects.
pub trait ValidatorPolicy: Send + Sync {
    /// Human-readable name used in log output.
    fn name(&self) -> &str;

    fn can_step_forward(&self, position: GridPosition, direction: Direction, grid: &MazeGrid)
    -> bool;
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in policy
// ────────────────────────────────────────────────────────────────────────────

/// `candidate = position + unit(direction)` must be in bounds and not an
/// obstacle.  Bounds come from the grid itself, so validator and grid can
/// never disagree about dimensions.
pub fn can_step_forward(position: GridPosition, direction: Direction, grid: &MazeGrid) -> bool {
    grid.probe(position.step(direction)) == CellProbe::Open
}

/// The default rule set: grid bounds plus obstacles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridBoundsPolicy;

impl ValidatorPolicy for GridBoundsPolicy {
    fn name(&self) -> &str {
        "grid_bounds"
    }

    fn can_step_forward(
        &self,
        position: GridPosition,
        direction: Direction,
        grid: &MazeGrid,
    ) -> bool {
        can_step_forward(position, direction, grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazelink_types::WorldPos;

    fn open_3x3() -> MazeGrid {
        MazeGrid::open(3, 3, 1.0, WorldPos::default()).unwrap()
    }

    /// Verify that an interior cell of an open grid can step in every direction.
    #[test]
    fn interior_cell_can_step_every_way() {
        let grid = open_3x3();
        for direction in Direction::ALL {
            assert!(can_step_forward(GridPosition::new(1, 1), direction, &grid));
        }
    }

    /// Verify that boundary cells cannot step outward.
    #[test]
    fn boundary_blocks_outward_steps() {
        let grid = open_3x3();
        assert!(!can_step_forward(GridPosition::new(0, 0), Direction::West, &grid));
        assert!(!can_step_forward(GridPosition::new(0, 0), Direction::South, &grid));
        assert!(!can_step_forward(GridPosition::new(2, 2), Direction::East, &grid));
        assert!(!can_step_forward(GridPosition::new(2, 2), Direction::North, &grid));
        assert!(can_step_forward(GridPosition::new(0, 0), Direction::North, &grid));
    }

    /// Verify that an obstacle in the next cell blocks the step.
    #[test]
    fn obstacle_ahead_blocks_step() {
        // Row y = 1 is the middle line; (2, 1) is the obstacle.
        let grid = MazeGrid::from_ascii("...\n..#\n...", 1.0, WorldPos::default()).unwrap();
        assert!(!can_step_forward(GridPosition::new(1, 1), Direction::East, &grid));
        assert!(can_step_forward(GridPosition::new(1, 1), Direction::North, &grid));
    }

    /// Verify that each axis is bounded by its own extent.
    #[test]
    fn width_and_height_are_checked_independently() {
        let grid = MazeGrid::open(4, 2, 1.0, WorldPos::default()).unwrap();
        assert!(can_step_forward(GridPosition::new(2, 0), Direction::East, &grid));
        assert!(!can_step_forward(GridPosition::new(2, 1), Direction::North, &grid));
    }

    /// Verify that the default policy answers exactly like the grid rule.
    #[test]
    fn policy_delegates_to_rule() {
        let grid = open_3x3();
        let policy = GridBoundsPolicy;
        assert_eq!(policy.name(), "grid_bounds");
        assert!(policy.can_step_forward(GridPosition::new(1, 1), Direction::South, &grid));
        assert!(!policy.can_step_forward(GridPosition::new(1, 0), Direction::South, &grid));
    }
}
