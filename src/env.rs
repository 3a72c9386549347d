use rand::seq::IteratorRandom;
use strum::VariantArray;

use crate::grid::{Action, Coord, Grid, GridError, Tile};

/// Represents a discrete-time Markov decision process with a finite state
/// space and action space, in which a single agent can operate.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Copy;

    /// Get the available actions for the current state
    ///
    /// The returned vec should never be empty; specify an action that
    /// represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** `(next_state, reward, terminal)`
    fn step(&mut self, action: Self::Action) -> (Self::State, f32, bool);

    /// Reset the environment to its initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Sample an action uniformly at random from the available actions
    fn random_action(&self) -> Self::Action {
        *self
            .actions()
            .iter()
            .choose(&mut rand::thread_rng())
            .expect("There is always at least one action available")
    }
}

/// A stateful episode wrapper around a [`Grid`]
///
/// Owns the agent's position, the cumulative return since the last reset,
/// and the terminal flag; every transition is delegated to the grid's pure
/// [`step`](Grid::step). Once an episode terminates, further steps are
/// absorbed as `(position, 0.0, true)` until [`reset`](GridWorld::reset)
/// re-enters the running state.
#[derive(Debug)]
pub struct GridWorld {
    grid: Grid,
    start: Coord,
    pos: Coord,
    ret: f32,
    done: bool,
}

impl GridWorld {
    /// Wrap a fully built grid, placing the agent at `start`
    ///
    /// `start` must be an open field; starting on the goal or in a hole
    /// would terminate the episode before it begins.
    pub fn new(grid: Grid, start: Coord) -> Result<Self, GridError> {
        if !grid.in_bounds(start) {
            return Err(GridError::OutOfBounds(start.0, start.1, grid.size()));
        }
        if grid.tile(start) != Tile::Field {
            return Err(GridError::TileOccupied(start.0, start.1));
        }
        Ok(Self {
            grid,
            start,
            pos: start,
            ret: 0.0,
            done: false,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The agent's current position
    pub fn position(&self) -> Coord {
        self.pos
    }

    /// Sum of rewards collected since the last reset
    pub fn cumulative_return(&self) -> f32 {
        self.ret
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Environment for GridWorld {
    type State = Coord;
    type Action = Action;

    fn actions(&self) -> Vec<Self::Action> {
        Action::VARIANTS.to_vec()
    }

    fn is_active(&self) -> bool {
        !self.done
    }

    fn step(&mut self, action: Self::Action) -> (Self::State, f32, bool) {
        if self.done {
            return (self.pos, 0.0, true);
        }

        let (next, reward, done) = self.grid.step(self.pos, action);
        self.pos = next;
        self.ret += reward;
        self.done = done;

        (next, reward, done)
    }

    fn reset(&mut self) -> Self::State {
        self.pos = self.start;
        self.ret = 0.0;
        self.done = false;
        self.start
    }
}
