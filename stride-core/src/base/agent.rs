//! Agent.
use super::Policy;
use crate::{record::Record, RolloutBatch};
use anyhow::Result;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Output of [`Agent::act`] for a batch of observations.
#[derive(Clone, Debug)]
pub struct ActOutput {
    /// Actions, shape `(n_envs, act_dim)`.
    pub act: Array2<f32>,

    /// Log probabilities of the actions under the current policy.
    pub log_prob: Vec<f32>,

    /// Value estimates of the observations.
    pub value: Vec<f32>,
}

/// Represents a trainable on-policy agent.
pub trait Agent: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Samples actions and returns them with their log probabilities and the value estimates.
    ///
    /// No gradient is tracked.
    fn act(&mut self, obs: &Array2<f32>) -> Result<ActOutput>;

    /// Returns value estimates of the given observations.
    fn value(&mut self, obs: &Array2<f32>) -> Result<Vec<f32>>;

    /// Checks if batches of the given size can be used for optimization.
    ///
    /// This is called once before training starts.
    fn check_batch_size(&self, _batch_size: usize) -> Result<()> {
        Ok(())
    }

    /// Returns the current learning rate.
    fn learning_rate(&self) -> f64;

    /// Sets the learning rate of the optimizer.
    fn set_learning_rate(&mut self, lr: f64);

    /// Performs an optimization step on a flattened on-policy batch and returns some information.
    fn opt_with_record(&mut self, batch: &RolloutBatch) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// Returns the paths of the created files.
    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
