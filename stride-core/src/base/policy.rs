//! Policy.
use anyhow::Result;
use ndarray::Array2;

/// A policy on a vectorized environment.
///
/// Policy is a mapping from observations to actions.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy {
    /// Sample actions given observations of shape `(n_envs, obs_dim)`.
    fn sample(&mut self, obs: &Array2<f32>) -> Result<Array2<f32>>;
}
