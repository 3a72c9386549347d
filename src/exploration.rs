use rand::{thread_rng, Rng};

use crate::assert_interval;

/// Exploration policy result
pub enum Choice {
    Explore,
    Exploit,
}

/// Epsilon greedy exploration policy with an optionally time-decaying
/// epsilon threshold
///
/// With probability epsilon the agent should explore (sample an action
/// uniformly); otherwise it should exploit its current greedy action. The
/// threshold decays exponentially from `start` to `end` over episodes;
/// [`EpsilonGreedy::constant`] keeps it fixed.
pub struct EpsilonGreedy {
    start: f32,
    end: f32,
    rate: f32,
}

impl EpsilonGreedy {
    /// Initialize epsilon greedy policy from start, end, and decay rate
    ///
    /// **Panics** if `start` or `end` is not in the interval `[0,1]`, or if
    /// `start` is less than `end`
    pub fn new(start: f32, end: f32, rate: f32) -> Self {
        assert_interval!(start, 0.0, 1.0);
        assert_interval!(end, 0.0, 1.0);
        assert!(
            start >= end,
            "Epsilon start value must not be less than end value."
        );
        Self { start, end, rate }
    }

    /// A fixed epsilon threshold for every episode
    ///
    /// **Panics** if `epsilon` is not in the interval `[0,1]`
    pub fn constant(epsilon: f32) -> Self {
        Self::new(epsilon, epsilon, 0.0)
    }

    /// The epsilon threshold for the given episode
    pub fn epsilon(&self, episode: u32) -> f32 {
        self.end + (self.start - self.end) * f32::exp(-(episode as f32) * self.rate)
    }

    /// Invoke epsilon greedy policy for the current episode
    pub fn choose(&self, episode: u32) -> Choice {
        if thread_rng().gen::<f32>() > self.epsilon(episode) {
            Choice::Exploit
        } else {
            Choice::Explore
        }
    }
}
