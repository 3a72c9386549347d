use std::fmt;

use strum::{EnumIter, FromRepr, VariantArray};
use thiserror::Error;

/// Position in the grid as `(row, col)`, zero-indexed from the top-left
pub type Coord = (usize, usize);

/// Errors raised while building a [`Grid`] or placing holes in it
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid size must be greater than 1, got {0}")]
    SizeTooSmall(usize),
    #[error("position ({0}, {1}) is outside a {2}x{2} grid")]
    OutOfBounds(usize, usize, usize),
    #[error("position ({0}, {1}) is not an open field")]
    TileOccupied(usize, usize),
}

/// The four moves available in every state
///
/// Discriminant order is load-bearing: ties in action-value comparisons are
/// always broken in favor of the variant that appears first here.
#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Action {
    /// Translate a raw keyboard scan code from the interactive frontend
    ///
    /// The mapping is a fixed external surface: `72 → Up`, `80 → Down`,
    /// `75 → Left`, `77 → Right`.
    pub fn from_scan_code(code: u8) -> Option<Self> {
        match code {
            72 => Some(Self::Up),
            80 => Some(Self::Down),
            75 => Some(Self::Left),
            77 => Some(Self::Right),
            _ => None,
        }
    }

    /// Apply the move to `pos`, returning `None` when it would leave an
    /// `n`x`n` grid
    fn apply(self, pos: Coord, n: usize) -> Option<Coord> {
        let (row, col) = pos;
        match self {
            Self::Up => (row > 0).then(|| (row - 1, col)),
            Self::Down => (row + 1 < n).then(|| (row + 1, col)),
            Self::Left => (col > 0).then(|| (row, col - 1)),
            Self::Right => (col + 1 < n).then(|| (row, col + 1)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Left => "←",
            Self::Right => "→",
        };
        f.write_str(arrow)
    }
}

/// What a single cell of the grid holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Field,
    Hole,
    Goal,
}

/// A square tile map with one goal and any number of holes
///
/// The grid doubles as the deterministic transition model of the MDP: given a
/// state and an action, [`Grid::step`] produces the unique next state, reward,
/// and terminal flag. It holds no agent state of its own; see
/// [`GridWorld`](crate::env::GridWorld) for the stateful wrapper.
#[derive(Debug)]
pub struct Grid {
    n: usize,
    tiles: Vec<Tile>,
    goal: Coord,
}

impl Grid {
    /// Create an `n`x`n` grid of open fields with a goal at `goal`
    pub fn new(n: usize, goal: Coord) -> Result<Self, GridError> {
        if n <= 1 {
            return Err(GridError::SizeTooSmall(n));
        }
        if goal.0 >= n || goal.1 >= n {
            return Err(GridError::OutOfBounds(goal.0, goal.1, n));
        }
        let mut tiles = vec![Tile::Field; n * n];
        tiles[goal.0 * n + goal.1] = Tile::Goal;
        Ok(Self { n, tiles, goal })
    }

    /// Turn the field at `pos` into a hole
    ///
    /// Fails when `pos` is out of range or already holds the goal or another
    /// hole. Holes must be placed before any solver or learner runs, since
    /// those assume a fixed grid.
    pub fn create_hole(&mut self, pos: Coord) -> Result<(), GridError> {
        if !self.in_bounds(pos) {
            return Err(GridError::OutOfBounds(pos.0, pos.1, self.n));
        }
        if self.tile(pos) != Tile::Field {
            return Err(GridError::TileOccupied(pos.0, pos.1));
        }
        self.tiles[pos.0 * self.n + pos.1] = Tile::Hole;
        Ok(())
    }

    /// Side length of the grid
    pub fn size(&self) -> usize {
        self.n
    }

    /// The goal coordinate fixed at construction
    pub fn goal(&self) -> Coord {
        self.goal
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        pos.0 < self.n && pos.1 < self.n
    }

    /// Tile at `pos`
    ///
    /// **Panics** if `pos` is out of range.
    pub fn tile(&self, pos: Coord) -> Tile {
        assert!(
            self.in_bounds(pos),
            "position ({}, {}) is outside the {}x{} grid",
            pos.0,
            pos.1,
            self.n,
            self.n,
        );
        self.tiles[pos.0 * self.n + pos.1]
    }

    /// Whether `pos` is an absorbing cell (goal or hole)
    pub fn is_terminal(&self, pos: Coord) -> bool {
        matches!(self.tile(pos), Tile::Goal | Tile::Hole)
    }

    /// Iterate over every coordinate in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let n = self.n;
        (0..n).flat_map(move |row| (0..n).map(move |col| (row, col)))
    }

    /// The deterministic transition model
    ///
    /// **Returns** `(next_state, reward, terminal)`:
    /// - a goal or hole state absorbs every action as `(state, 0.0, true)`
    /// - a move off the edge of the grid leaves the agent in place with
    ///   reward `-1.0`
    /// - a move into a hole yields `-1.0` and terminates, into the goal
    ///   `1.0` and terminates, onto an open field `0.0`
    ///
    /// Identical inputs always produce identical outputs.
    ///
    /// **Panics** if `state` is out of range; passing such a state is a
    /// programmer error, not a runtime condition.
    pub fn step(&self, state: Coord, action: Action) -> (Coord, f32, bool) {
        if self.is_terminal(state) {
            return (state, 0.0, true);
        }

        let Some(next) = action.apply(state, self.n) else {
            return (state, -1.0, false);
        };

        match self.tile(next) {
            Tile::Hole => (next, -1.0, true),
            Tile::Goal => (next, 1.0, true),
            Tile::Field => (next, 0.0, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::VariantArray;

    use super::*;

    fn fixture() -> Grid {
        let mut grid = Grid::new(3, (2, 2)).unwrap();
        grid.create_hole((1, 1)).unwrap();
        grid
    }

    #[test]
    fn construction_validates_inputs() {
        assert_eq!(Grid::new(1, (0, 0)).unwrap_err(), GridError::SizeTooSmall(1));
        assert_eq!(
            Grid::new(3, (3, 0)).unwrap_err(),
            GridError::OutOfBounds(3, 0, 3)
        );
    }

    #[test]
    fn holes_only_replace_fields() {
        let mut grid = fixture();
        assert_eq!(
            grid.create_hole((4, 4)).unwrap_err(),
            GridError::OutOfBounds(4, 4, 3)
        );
        assert_eq!(
            grid.create_hole((2, 2)).unwrap_err(),
            GridError::TileOccupied(2, 2)
        );
        assert_eq!(
            grid.create_hole((1, 1)).unwrap_err(),
            GridError::TileOccupied(1, 1)
        );
        assert!(grid.create_hole((0, 1)).is_ok());
        assert_eq!(grid.tile((0, 1)), Tile::Hole);
    }

    #[test]
    fn terminal_states_absorb_every_action() {
        let grid = fixture();
        for &terminal in &[(2, 2), (1, 1)] {
            for &action in Action::VARIANTS {
                assert_eq!(grid.step(terminal, action), (terminal, 0.0, true));
            }
        }
    }

    #[test]
    fn boundary_bump_penalizes_without_moving() {
        let grid = fixture();
        assert_eq!(grid.step((0, 0), Action::Up), ((0, 0), -1.0, false));
        assert_eq!(grid.step((0, 0), Action::Left), ((0, 0), -1.0, false));
        assert_eq!(grid.step((2, 0), Action::Down), ((2, 0), -1.0, false));
        assert_eq!(grid.step((0, 2), Action::Right), ((0, 2), -1.0, false));
    }

    #[test]
    fn rewards_follow_the_target_tile() {
        let grid = fixture();
        assert_eq!(grid.step((0, 1), Action::Down), ((1, 1), -1.0, true));
        assert_eq!(grid.step((2, 1), Action::Right), ((2, 2), 1.0, true));
        assert_eq!(grid.step((0, 0), Action::Right), ((0, 1), 0.0, false));
    }

    #[test]
    #[should_panic(expected = "outside the 3x3 grid")]
    fn out_of_range_state_is_a_contract_violation() {
        fixture().step((3, 3), Action::Up);
    }

    #[test]
    fn scan_codes_map_to_actions() {
        assert_eq!(Action::from_scan_code(72), Some(Action::Up));
        assert_eq!(Action::from_scan_code(80), Some(Action::Down));
        assert_eq!(Action::from_scan_code(75), Some(Action::Left));
        assert_eq!(Action::from_scan_code(77), Some(Action::Right));
        assert_eq!(Action::from_scan_code(0), None);
    }
}
