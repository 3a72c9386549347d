use log::debug;

use crate::assert_interval;
use crate::env::{Environment, GridWorld};
use crate::exploration::{Choice, EpsilonGreedy};
use crate::grid::{Action, Coord};
use crate::table::{PolicyTable, QTable};

/// On-policy temporal-difference control (SARSA)
///
/// Learns an action-value table by running episodes against a [`GridWorld`]
/// and bootstrapping each update from the action actually taken next:
/// `Q[s,a] += alpha * (r + gamma * Q[s',a'] - Q[s,a])`.
pub struct SarsaAgent {
    q_table: QTable,
    exploration: EpsilonGreedy,
    alpha: f32,
    gamma: f32,
    episode: u32,
}

impl SarsaAgent {
    /// Initialize a new `SarsaAgent` for an `n`x`n` grid
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(n: usize, alpha: f32, gamma: f32, exploration: EpsilonGreedy) -> Self {
        assert_interval!(alpha, 0.0, 1.0);
        assert_interval!(gamma, 0.0, 1.0);
        Self {
            q_table: QTable::zeros(n),
            exploration,
            alpha,
            gamma,
            episode: 0,
        }
    }

    /// Choose an action based on the current state and exploration policy
    fn act(&self, env: &GridWorld, state: Coord) -> Action {
        match self.exploration.choose(self.episode) {
            Choice::Explore => env.random_action(),
            Choice::Exploit => self.q_table.greedy(state),
        }
    }

    fn learn(&mut self, state: Coord, action: Action, reward: f32, next: (Coord, Action)) {
        let q_value = self.q_table[(state, action)];
        let next_q_value = self.q_table[next];
        self.q_table[(state, action)] =
            q_value + self.alpha * (reward + self.gamma * next_q_value - q_value);
    }

    /// Run a single training episode to completion
    pub fn go(&mut self, env: &mut GridWorld) {
        let mut state = env.reset();
        let mut action = self.act(env, state);

        loop {
            let (next_state, reward, done) = env.step(action);
            let next_action = self.act(env, next_state);

            self.learn(state, action, reward, (next_state, next_action));

            if done {
                break;
            }
            state = next_state;
            action = next_action;
        }

        self.episode += 1;
    }

    /// Run `episodes` training episodes
    pub fn train(&mut self, env: &mut GridWorld, episodes: u32) {
        for _ in 0..episodes {
            self.go(env);
            debug!(
                "sarsa episode {}: return = {}",
                self.episode,
                env.cumulative_return()
            );
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Extract the greedy policy from the learned Q-table
    pub fn policy(&self) -> PolicyTable {
        self.q_table.greedy_policy()
    }
}

/// Off-policy temporal-difference control (Q-learning)
///
/// Same episode loop as [`SarsaAgent`], but the update target bootstraps
/// from the best available next action rather than the one the behavior
/// policy happens to take:
/// `Q[s,a] += alpha * (r + gamma * max_a' Q[s',a'] - Q[s,a])`.
pub struct QLearningAgent {
    q_table: QTable,
    exploration: EpsilonGreedy,
    alpha: f32,
    gamma: f32,
    episode: u32,
}

impl QLearningAgent {
    /// Initialize a new `QLearningAgent` for an `n`x`n` grid
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(n: usize, alpha: f32, gamma: f32, exploration: EpsilonGreedy) -> Self {
        assert_interval!(alpha, 0.0, 1.0);
        assert_interval!(gamma, 0.0, 1.0);
        Self {
            q_table: QTable::zeros(n),
            exploration,
            alpha,
            gamma,
            episode: 0,
        }
    }

    fn act(&self, env: &GridWorld, state: Coord) -> Action {
        match self.exploration.choose(self.episode) {
            Choice::Explore => env.random_action(),
            Choice::Exploit => self.q_table.greedy(state),
        }
    }

    fn learn(&mut self, state: Coord, action: Action, reward: f32, next_state: Coord) {
        let q_value = self.q_table[(state, action)];
        let max_next = self.q_table.max(next_state);
        self.q_table[(state, action)] =
            q_value + self.alpha * (reward + self.gamma * max_next - q_value);
    }

    /// Run a single training episode to completion
    ///
    /// The executed action is re-selected by epsilon-greedy every step,
    /// independent of the maximizing action used in the update target.
    pub fn go(&mut self, env: &mut GridWorld) {
        let mut state = env.reset();

        loop {
            let action = self.act(env, state);
            let (next_state, reward, done) = env.step(action);

            self.learn(state, action, reward, next_state);

            if done {
                break;
            }
            state = next_state;
        }

        self.episode += 1;
    }

    /// Run `episodes` training episodes
    pub fn train(&mut self, env: &mut GridWorld, episodes: u32) {
        for _ in 0..episodes {
            self.go(env);
            debug!(
                "q-learning episode {}: return = {}",
                self.episode,
                env.cumulative_return()
            );
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Extract the greedy policy from the learned Q-table
    pub fn policy(&self) -> PolicyTable {
        self.q_table.greedy_policy()
    }
}

#[cfg(test)]
mod tests {
    use crate::algo::DpSolver;
    use crate::grid::Grid;
    use crate::table::ValueFn;

    use super::*;

    fn fixture() -> GridWorld {
        let mut grid = Grid::new(3, (2, 2)).unwrap();
        grid.create_hole((1, 1)).unwrap();
        GridWorld::new(grid, (0, 0)).unwrap()
    }

    #[test]
    fn zero_epsilon_selection_is_the_greedy_argmax() {
        let env = fixture();
        let mut agent = QLearningAgent::new(3, 0.5, 0.9, EpsilonGreedy::constant(0.0));
        agent.q_table[((0, 0), Action::Right)] = 1.0;

        for _ in 0..50 {
            assert_eq!(agent.act(&env, (0, 0)), Action::Right);
            // untouched rows fall back to the first variant
            assert_eq!(agent.act(&env, (2, 0)), Action::Up);
        }
    }

    #[test]
    fn q_learning_recovers_the_value_iteration_policy() {
        let mut env = fixture();
        // decay epsilon from pure exploration so off-path corridors like
        // (1,0) -> (2,0) keep getting visited after the agent locks onto
        // its first path to the goal
        let mut agent = QLearningAgent::new(3, 0.5, 0.9, EpsilonGreedy::new(1.0, 0.1, 0.002));
        agent.train(&mut env, 10_000);

        let mut values = ValueFn::zeros(3);
        let reference = DpSolver::new(0.9, 0.01).value_iteration(env.grid(), &mut values);

        let learned = agent.policy();
        // states with a unique optimal action; (0,0) is tie-broken, not learned
        let states = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)];
        let disagreements = states
            .iter()
            .filter(|&&state| learned[state] != reference[state])
            .count();
        // residual exploration noise may leave a stray state unconverged
        assert!(
            disagreements <= 1,
            "greedy policy disagrees with value iteration at {disagreements} of {} states",
            states.len(),
        );
    }

    #[test]
    fn sarsa_greedy_rollout_reaches_the_goal() {
        let mut env = fixture();
        let mut agent = SarsaAgent::new(3, 0.5, 0.9, EpsilonGreedy::constant(0.2));
        agent.train(&mut env, 5000);

        let policy = agent.policy();
        let mut state = env.reset();
        let mut reward = 0.0;
        for _ in 0..20 {
            let (next, r, done) = env.step(policy[state]);
            state = next;
            reward = r;
            if done {
                break;
            }
        }
        assert!(env.is_done(), "greedy rollout did not terminate");
        assert_eq!(reward, 1.0, "greedy rollout ended somewhere other than the goal");
        assert_eq!(env.position(), env.grid().goal());
    }
}
