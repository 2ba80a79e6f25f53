//! Environment step.
use ndarray::Array2;

/// Summary of a finished episode of one of the environments in a vectorized environment.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeInfo {
    /// Index of the environment in the vectorized environment.
    pub env_ix: usize,

    /// Undiscounted return of the episode, before reward normalization.
    pub ret: f32,

    /// Number of steps of the episode.
    pub length: usize,
}

/// Result of an environment step over all `n_envs` environments.
///
/// Environments reset automatically: if `is_terminated[i] == 1` or `is_truncated[i] == 1`,
/// row `i` of `obs` is the first observation of the next episode.
#[derive(Debug)]
pub struct Step {
    /// Observations, shape `(n_envs, obs_dim)`.
    pub obs: Array2<f32>,

    /// Reward.
    pub reward: Vec<f32>,

    /// Flag denoting if episode is terminated.
    pub is_terminated: Vec<i8>,

    /// Flag denoting if episode is truncated.
    pub is_truncated: Vec<i8>,

    /// Episodes finished at this step.
    pub episodes: Vec<EpisodeInfo>,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: Array2<f32>,
        reward: Vec<f32>,
        is_terminated: Vec<i8>,
        is_truncated: Vec<i8>,
        episodes: Vec<EpisodeInfo>,
    ) -> Self {
        Step {
            obs,
            reward,
            is_terminated,
            is_truncated,
            episodes,
        }
    }

    #[inline]
    /// Terminated or truncated, for environment `ix`.
    pub fn is_done(&self, ix: usize) -> bool {
        self.is_terminated[ix] == 1 || self.is_truncated[ix] == 1
    }

    /// Done flags of all the environments as `0.0`/`1.0`.
    pub fn dones(&self) -> Vec<f32> {
        (0..self.reward.len())
            .map(|ix| if self.is_done(ix) { 1.0 } else { 0.0 })
            .collect()
    }
}
