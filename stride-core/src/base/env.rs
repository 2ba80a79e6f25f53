//! Environment.
use super::{BoxSpace, Step};
use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Represents a vectorized environment with continuous observations and actions.
///
/// The `n_envs` sub-environments are stepped in lock step. When an episode of a
/// sub-environment ends, it is reset automatically and the returned observation is the
/// first one of the next episode.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    ///
    /// Seeds of sub-environments are derived from `seed` with a [`SeedPolicy`].
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Number of sub-environments.
    fn n_envs(&self) -> usize;

    /// Observation space of a single sub-environment.
    fn observation_space(&self) -> BoxSpace;

    /// Action space of a single sub-environment.
    fn action_space(&self) -> BoxSpace;

    /// Resets all sub-environments and returns observations with shape `(n_envs, obs_dim)`.
    fn reset(&mut self) -> Result<Array2<f32>>;

    /// Resets all sub-environments, reseeding them with the given index.
    ///
    /// This is used in evaluation, where the `ix`-th episode should be reproducible.
    fn reset_with_index(&mut self, ix: usize) -> Result<Array2<f32>>;

    /// Performes an environment step with actions of shape `(n_envs, act_dim)`.
    fn step(&mut self, act: &Array2<f32>) -> Result<Step>;
}

/// How seeds of sub-environments are derived from the seed of a run.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub enum SeedPolicy {
    /// Sub-environment `i` gets `seed + i`.
    Offset,

    /// Sub-environment `i` gets `seed + i % size`.
    ///
    /// With `size` smaller than the number of sub-environments, several
    /// sub-environments share the same seed.
    Pool {
        /// Number of distinct seeds.
        size: usize,
    },
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self::Offset
    }
}

impl SeedPolicy {
    /// Returns the seed of sub-environment `ix`.
    pub fn seed(&self, seed: i64, ix: usize) -> i64 {
        match self {
            Self::Offset => seed + ix as i64,
            Self::Pool { size } => seed + (ix % (*size).max(1)) as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_policy() {
        let seeds: Vec<_> = (0..5).map(|i| SeedPolicy::Offset.seed(10, i)).collect();
        assert_eq!(seeds, vec![10, 11, 12, 13, 14]);

        let pool = SeedPolicy::Pool { size: 3 };
        let seeds: Vec<_> = (0..5).map(|i| pool.seed(10, i)).collect();
        assert_eq!(seeds, vec![10, 11, 12, 10, 11]);
    }
}
