use log::{debug, trace};
use strum::VariantArray;

use crate::assert_interval;
use crate::grid::{Action, Coord, Grid};
use crate::table::{PolicyTable, ValueFn};

/// A dynamic programming solver for the grid MDP
///
/// This solver applies policy iteration or value iteration with respect to
/// the state values. As a tabular method it sweeps every state of the grid,
/// querying the deterministic transition model directly; no episodes are run.
///
/// Sweeps update the value function in place (Gauss-Seidel style), which is
/// sound here because the model is deterministic and the Bellman backup is a
/// contraction for `gamma < 1`. Termination for `gamma = 1` is the caller's
/// obligation: a cyclic non-terminating policy never converges.
pub struct DpSolver {
    gamma: f32,
    threshold: f32,
}

impl DpSolver {
    /// Initialize a solver with a discount factor and convergence threshold
    ///
    /// **Panics** if `gamma` is not in the interval `[0,1]` or if
    /// `threshold` is not positive
    pub fn new(gamma: f32, threshold: f32) -> Self {
        assert_interval!(gamma, 0.0, 1.0);
        assert!(threshold > 0.0, "Convergence threshold must be positive.");
        Self { gamma, threshold }
    }

    /// One-step lookahead under the deterministic model
    fn backup(&self, grid: &Grid, values: &ValueFn, state: Coord, action: Action) -> f32 {
        let (next, reward, _) = grid.step(state, action);
        reward + self.gamma * values[next]
    }

    /// The action maximizing the one-step lookahead at `state`
    ///
    /// Ordered scan over the action enumeration; the first maximum wins, so
    /// ties resolve reproducibly (Up before Down before Left before Right).
    fn greedy_action(&self, grid: &Grid, values: &ValueFn, state: Coord) -> (Action, f32) {
        let mut best = Action::VARIANTS[0];
        let mut best_value = self.backup(grid, values, state, best);
        for &action in &Action::VARIANTS[1..] {
            let value = self.backup(grid, values, state, action);
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        (best, best_value)
    }

    fn assert_shapes(&self, grid: &Grid, values: &ValueFn) {
        assert_eq!(
            values.size(),
            grid.size(),
            "Value function shape does not match the grid."
        );
    }

    /// Iterative policy evaluation
    ///
    /// Sweeps every state, backing up `reward + gamma * values[next]` under
    /// the policy's assigned action, until the largest absolute change in a
    /// sweep falls below the threshold.
    pub fn evaluate(&self, grid: &Grid, values: &mut ValueFn, policy: &PolicyTable) {
        self.assert_shapes(grid, values);
        assert_eq!(
            policy.size(),
            grid.size(),
            "Policy table shape does not match the grid."
        );

        let mut sweeps = 0u32;
        loop {
            let mut delta = 0.0f32;
            for state in grid.coords() {
                let old = values[state];
                let new = self.backup(grid, values, state, policy[state]);
                values[state] = new;
                delta = delta.max((old - new).abs());
            }
            sweeps += 1;
            trace!("evaluation sweep {sweeps}: delta = {delta}");
            if delta < self.threshold {
                break;
            }
        }
        debug!("policy evaluation converged after {sweeps} sweeps");
    }

    /// Greedy policy improvement
    ///
    /// Reassigns every state the action maximizing the one-step lookahead.
    ///
    /// **Returns** `true` when the policy was already stable (no action
    /// changed)
    pub fn improve(&self, grid: &Grid, values: &ValueFn, policy: &mut PolicyTable) -> bool {
        self.assert_shapes(grid, values);

        let mut stable = true;
        for state in grid.coords() {
            let old = policy[state];
            let (best, _) = self.greedy_action(grid, values, state);
            policy[state] = best;
            if old != best {
                stable = false;
            }
        }
        stable
    }

    /// Policy iteration: alternate evaluation and improvement until the
    /// policy stops changing
    pub fn policy_iteration(&self, grid: &Grid, values: &mut ValueFn, policy: &mut PolicyTable) {
        let mut rounds = 0u32;
        loop {
            self.evaluate(grid, values, policy);
            rounds += 1;
            if self.improve(grid, values, policy) {
                break;
            }
        }
        debug!("policy iteration stable after {rounds} improvement rounds");
    }

    /// Value iteration: sweep the Bellman optimality backup until
    /// convergence, then extract the greedy policy
    ///
    /// **Panics** if `values` is nonzero at a terminal (goal or hole) cell;
    /// those cells are absorbing, so any other value would corrupt the
    /// backup of their neighbors.
    pub fn value_iteration(&self, grid: &Grid, values: &mut ValueFn) -> PolicyTable {
        self.assert_shapes(grid, values);
        for state in grid.coords() {
            if grid.is_terminal(state) {
                assert_eq!(
                    values[state], 0.0,
                    "Value function must be zero at terminal state ({}, {}).",
                    state.0, state.1,
                );
            }
        }

        let mut sweeps = 0u32;
        loop {
            let mut delta = 0.0f32;
            for state in grid.coords() {
                let old = values[state];
                let (_, new) = self.greedy_action(grid, values, state);
                values[state] = new;
                delta = delta.max((old - new).abs());
            }
            sweeps += 1;
            trace!("value iteration sweep {sweeps}: delta = {delta}");
            if delta < self.threshold {
                break;
            }
        }
        debug!("value iteration converged after {sweeps} sweeps");

        let mut policy = PolicyTable::uniform(grid.size(), Action::VARIANTS[0]);
        for state in grid.coords() {
            let (best, _) = self.greedy_action(grid, values, state);
            policy[state] = best;
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Grid {
        let mut grid = Grid::new(3, (2, 2)).unwrap();
        grid.create_hole((1, 1)).unwrap();
        grid
    }

    fn solver() -> DpSolver {
        DpSolver::new(0.9, 0.01)
    }

    #[test]
    #[should_panic(expected = "Invalid value for `gamma`")]
    fn discount_outside_unit_interval_is_rejected() {
        DpSolver::new(1.5, 0.01);
    }

    #[test]
    #[should_panic(expected = "threshold must be positive")]
    fn zero_threshold_is_rejected() {
        DpSolver::new(0.9, 0.0);
    }

    #[test]
    #[should_panic(expected = "shape does not match")]
    fn mismatched_value_shape_is_rejected() {
        let grid = fixture();
        let mut values = ValueFn::zeros(4);
        solver().value_iteration(&grid, &mut values);
    }

    #[test]
    #[should_panic(expected = "must be zero at terminal state")]
    fn nonzero_terminal_values_are_rejected() {
        let grid = fixture();
        let mut values = ValueFn::zeros(3);
        values[(1, 1)] = 1.0;
        solver().value_iteration(&grid, &mut values);
    }

    #[test]
    fn value_iteration_orders_states_by_distance_to_goal() {
        let grid = fixture();
        let mut values = ValueFn::zeros(3);
        let policy = solver().value_iteration(&grid, &mut values);

        // adjacent to the goal
        assert!((values[(2, 1)] - 1.0).abs() < 1e-3);
        assert!((values[(1, 2)] - 1.0).abs() < 1e-3);
        // closer to the goal means higher value
        assert!(values[(0, 0)] < values[(1, 2)]);
        // the goal-distant corner next to the hole is the lowest non-terminal cell
        for state in grid.coords() {
            if state != (0, 0) && !grid.is_terminal(state) {
                assert!(values[(0, 0)] <= values[state]);
            }
        }
        // terminal cells stay absorbing at zero
        assert_eq!(values[(2, 2)], 0.0);
        assert_eq!(values[(1, 1)], 0.0);

        // the greedy policy routes around the hole into the goal
        assert_eq!(policy[(2, 1)], Action::Right);
        assert_eq!(policy[(1, 2)], Action::Down);
        assert_eq!(policy[(2, 0)], Action::Right);
        assert_eq!(policy[(0, 2)], Action::Down);
        // tie between Down and Right at the corner resolves to Down
        assert_eq!(policy[(0, 0)], Action::Down);
    }

    #[test]
    fn policy_iteration_matches_value_iteration() {
        let grid = fixture();
        let solver = solver();

        let mut vi_values = ValueFn::zeros(3);
        solver.value_iteration(&grid, &mut vi_values);

        let mut pi_values = ValueFn::zeros(3);
        let mut policy = PolicyTable::random(3);
        solver.policy_iteration(&grid, &mut pi_values, &mut policy);

        for state in grid.coords() {
            assert!(
                (vi_values[state] - pi_values[state]).abs() < 0.05,
                "values diverge at ({}, {}): {} vs {}",
                state.0,
                state.1,
                vi_values[state],
                pi_values[state],
            );
        }
        assert_eq!(policy[(2, 1)], Action::Right);
        assert_eq!(policy[(1, 2)], Action::Down);
    }
}
