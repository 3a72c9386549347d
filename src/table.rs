use std::ops::{Index, IndexMut};

use rand::seq::IteratorRandom;
use strum::VariantArray;

use crate::grid::{Action, Coord};

/// A state-value table over an `n`x`n` grid, indexed by coordinate
///
/// Backed by a dense row-major buffer; initialized to zero, which also
/// satisfies the value-iteration precondition that terminal cells start at 0.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueFn {
    n: usize,
    values: Vec<f32>,
}

impl ValueFn {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
        }
    }

    /// Side length of the grid this table covers
    pub fn size(&self) -> usize {
        self.n
    }
}

impl Index<Coord> for ValueFn {
    type Output = f32;

    fn index(&self, index: Coord) -> &Self::Output {
        // a row overflow trips the slice bounds check, a column overflow
        // would silently alias the next row
        debug_assert!(index.1 < self.n, "column {} is out of range", index.1);
        &self.values[index.0 * self.n + index.1]
    }
}

impl IndexMut<Coord> for ValueFn {
    fn index_mut(&mut self, index: Coord) -> &mut Self::Output {
        debug_assert!(index.1 < self.n, "column {} is out of range", index.1);
        &mut self.values[index.0 * self.n + index.1]
    }
}

/// An action-value table over an `n`x`n` grid, indexed by `(Coord, Action)`
///
/// One `f32` per state-action pair, initialized to zero. The action's
/// discriminant is used as the innermost index; that conversion happens only
/// here, at the table boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct QTable {
    n: usize,
    values: Vec<f32>,
}

impl QTable {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n * Action::VARIANTS.len()],
        }
    }

    /// Side length of the grid this table covers
    pub fn size(&self) -> usize {
        self.n
    }

    /// The greedy action at `state`
    ///
    /// Explicit ordered scan: on equal values the action that enumerates
    /// first wins, so the result is reproducible.
    pub fn greedy(&self, state: Coord) -> Action {
        let mut best = Action::VARIANTS[0];
        let mut best_value = self[(state, best)];
        for &action in &Action::VARIANTS[1..] {
            let value = self[(state, action)];
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    /// The maximum action value at `state`
    pub fn max(&self, state: Coord) -> f32 {
        self[(state, self.greedy(state))]
    }

    /// Extract the greedy policy, one argmax per state
    pub fn greedy_policy(&self) -> PolicyTable {
        let mut policy = PolicyTable::uniform(self.n, Action::VARIANTS[0]);
        for row in 0..self.n {
            for col in 0..self.n {
                policy[(row, col)] = self.greedy((row, col));
            }
        }
        policy
    }
}

impl Index<(Coord, Action)> for QTable {
    type Output = f32;

    fn index(&self, (state, action): (Coord, Action)) -> &Self::Output {
        debug_assert!(state.1 < self.n, "column {} is out of range", state.1);
        let actions = Action::VARIANTS.len();
        &self.values[(state.0 * self.n + state.1) * actions + action as usize]
    }
}

impl IndexMut<(Coord, Action)> for QTable {
    fn index_mut(&mut self, (state, action): (Coord, Action)) -> &mut Self::Output {
        debug_assert!(state.1 < self.n, "column {} is out of range", state.1);
        let actions = Action::VARIANTS.len();
        &mut self.values[(state.0 * self.n + state.1) * actions + action as usize]
    }
}

/// A deterministic policy table over an `n`x`n` grid, one action per state
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyTable {
    n: usize,
    actions: Vec<Action>,
}

impl PolicyTable {
    /// A policy that takes `action` in every state
    pub fn uniform(n: usize, action: Action) -> Self {
        Self {
            n,
            actions: vec![action; n * n],
        }
    }

    /// A policy with an action drawn uniformly at random for every state,
    /// the usual starting point for policy iteration
    pub fn random(n: usize) -> Self {
        let mut rng = rand::thread_rng();
        let actions = (0..n * n)
            .map(|_| {
                *Action::VARIANTS
                    .iter()
                    .choose(&mut rng)
                    .expect("Action enumeration is not empty")
            })
            .collect();
        Self { n, actions }
    }

    /// Side length of the grid this table covers
    pub fn size(&self) -> usize {
        self.n
    }
}

impl Index<Coord> for PolicyTable {
    type Output = Action;

    fn index(&self, index: Coord) -> &Self::Output {
        debug_assert!(index.1 < self.n, "column {} is out of range", index.1);
        &self.actions[index.0 * self.n + index.1]
    }
}

impl IndexMut<Coord> for PolicyTable {
    fn index_mut(&mut self, index: Coord) -> &mut Self::Output {
        debug_assert!(index.1 < self.n, "column {} is out of range", index.1);
        &mut self.actions[index.0 * self.n + index.1]
    }
}
