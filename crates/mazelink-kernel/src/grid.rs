//! [`MazeGrid`] – static cell lattice and grid ↔ world mapping.
//!
//! A grid is `width × height` cells addressed by [`GridPosition`] with
//! `(0, 0)` in the south-west corner, `x` growing east and `y` growing north.
//! World coordinates are derived with a uniform `cell_size` and an `origin`:
//!
//! ```text
//! world.x = origin.x + x * cell_size
//! world.y = origin.y
//! world.z = origin.z + y * cell_size
//! ```
//!
//! # Example
//!
//! ```
//! use mazelink_kernel::grid::MazeGrid;
//! use mazelink_types::{GridPosition, MazeCell, WorldPos};
//!
//! let grid = MazeGrid::from_ascii("..#\n...", 2.0, WorldPos::new(1.0, 0.0, 1.0)).unwrap();
//! assert_eq!(grid.width(), 3);
//! assert_eq!(grid.height(), 2);
//! assert_eq!(grid.cell_at(GridPosition::new(2, 1)), Some(MazeCell::Obstacle));
//! assert_eq!(grid.to_world(GridPosition::new(1, 1)), WorldPos::new(3.0, 0.0, 3.0));
//! ```

use mazelink_types::{GridPosition, MazeCell, MazeError, WorldPos};

/// Result of looking up a candidate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellProbe {
    OutOfBounds,
    Obstacle,
    Open,
}

/// Immutable maze layout.  Loaded once before the session starts and shared
/// by reference with everything that needs coordinate lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct MazeGrid {
    // Column-major: index = x * height + y.
    cells: Vec<MazeCell>,
    width: i32,
    height: i32,
    cell_size: f32,
    origin: WorldPos,
}

impl MazeGrid {
    /// Build a grid from column-major cells (`columns[x][y]`).
    ///
    /// # Errors
    ///
    /// [`MazeError::InvalidMaze`] when the grid is empty, the columns are
    /// ragged, or `cell_size` is not a positive finite number.
    pub fn new(
        columns: Vec<Vec<MazeCell>>,
        cell_size: f32,
        origin: WorldPos,
    ) -> Result<Self, MazeError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(MazeError::InvalidMaze(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }
        let width = columns.len();
        let height = columns.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidMaze("maze has no cells".to_string()));
        }
        if let Some(x) = columns.iter().position(|c| c.len() != height) {
            return Err(MazeError::InvalidMaze(format!(
                "column {x} has {} cells, expected {height}",
                columns[x].len()
            )));
        }
        let to_i32 = |n: usize| {
            i32::try_from(n).map_err(|_| MazeError::InvalidMaze(format!("dimension {n} too large")))
        };
        Ok(Self {
            width: to_i32(width)?,
            height: to_i32(height)?,
            cells: columns.into_iter().flatten().collect(),
            cell_size,
            origin,
        })
    }

    /// An all-empty `width × height` grid.
    pub fn open(width: usize, height: usize, cell_size: f32, origin: WorldPos) -> Result<Self, MazeError> {
        Self::new(vec![vec![MazeCell::Empty; height]; width], cell_size, origin)
    }

    /// Parse a text layout: `#` is an obstacle, `.` is empty.
    ///
    /// The first line is the northernmost row; the last line is `y = 0`.
    /// Blank leading/trailing lines and trailing whitespace are ignored.
    pub fn from_ascii(text: &str, cell_size: f32, origin: WorldPos) -> Result<Self, MazeError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .skip_while(|l| l.is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|l| !l.is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => return Err(MazeError::InvalidMaze("maze text is empty".to_string())),
        };

        let width = rows[0].chars().count();
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (line_no, row) in rows.iter().rev().enumerate() {
            if row.chars().count() != width {
                return Err(MazeError::InvalidMaze(format!(
                    "row {} has {} cells, expected {width}",
                    rows.len() - line_no,
                    row.chars().count()
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '.' => MazeCell::Empty,
                    '#' => MazeCell::Obstacle,
                    other => {
                        return Err(MazeError::InvalidMaze(format!(
                            "unexpected character '{other}' in row {}",
                            rows.len() - line_no
                        )));
                    }
                };
                columns[x].push(cell);
            }
        }
        Self::new(columns, cell_size, origin)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> WorldPos {
        self.origin
    }

    /// Whether `pos` lies inside the grid (exclusive upper bounds).
    pub fn contains(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Cell kind at `pos`, or `None` outside the grid.
    pub fn cell_at(&self, pos: GridPosition) -> Option<MazeCell> {
        if !self.contains(pos) {
            return None;
        }
        // Both coordinates are non-negative and in range here.
        let index = (pos.x * self.height + pos.y) as usize;
        self.cells.get(index).copied()
    }

    /// Classify `pos` for logging and validation.
    pub fn probe(&self, pos: GridPosition) -> CellProbe {
        match self.cell_at(pos) {
            None => CellProbe::OutOfBounds,
            Some(MazeCell::Obstacle) => CellProbe::Obstacle,
            Some(MazeCell::Empty) => CellProbe::Open,
        }
    }

    /// World-space position of the centre of `pos`.
    pub fn to_world(&self, pos: GridPosition) -> WorldPos {
        WorldPos::new(
            self.origin.x + pos.x as f32 * self.cell_size,
            self.origin.y,
            self.origin.z + pos.y as f32 * self.cell_size,
        )
    }
}
