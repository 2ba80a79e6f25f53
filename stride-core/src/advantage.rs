//! Advantage estimation.
//!
//! Arrays are segments of `n_steps` steps of `n_envs` environments, indexed by
//! `t * n_envs + n`. `dones[t * n_envs + n]` is 1 if the episode ended after the
//! action at step `t`, so the value of the next state is bootstrapped only if
//! `dones` is 0. The value following the last step of the segment is given as
//! `next_value`.
use crate::{error::StrideError, RolloutBuffer};
use anyhow::Result;
use itertools::izip;
use serde::{Deserialize, Serialize};

/// Advantages and returns of a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Advantages {
    /// Advantages.
    pub advantages: Vec<f32>,

    /// Returns, i.e. targets of the value function.
    pub returns: Vec<f32>,
}

/// Configuration of advantage estimation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AdvantageConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Lambda of generalized advantage estimation.
    pub gae_lambda: f32,

    /// If `false`, advantages are discounted returns minus values.
    pub use_gae: bool,
}

impl Default for AdvantageConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            gae_lambda: 0.95,
            use_gae: true,
        }
    }
}

impl AdvantageConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets lambda of generalized advantage estimation.
    pub fn gae_lambda(mut self, v: f32) -> Self {
        self.gae_lambda = v;
        self
    }

    /// Enables or disables generalized advantage estimation.
    pub fn use_gae(mut self, v: bool) -> Self {
        self.use_gae = v;
        self
    }

    /// Computes advantages and returns of the segment in the buffer.
    ///
    /// `next_value` is the value of the observations following the segment.
    pub fn estimate(&self, buffer: &RolloutBuffer, next_value: &[f32]) -> Result<Advantages> {
        if next_value.len() != buffer.n_envs() {
            return Err(StrideError::ShapeMismatch {
                expected: vec![buffer.n_envs()],
                actual: vec![next_value.len()],
            }
            .into());
        }

        let (rewards, values, dones) = (buffer.rewards(), buffer.values(), buffer.dones());
        let n_envs = buffer.n_envs();

        Ok(match self.use_gae {
            true => gae(
                rewards,
                values,
                dones,
                next_value,
                n_envs,
                self.gamma,
                self.gae_lambda,
            ),
            false => discounted_returns(rewards, values, dones, next_value, n_envs, self.gamma),
        })
    }
}

/// Generalized advantage estimation.
pub fn gae(
    rewards: &[f32],
    values: &[f32],
    dones: &[f32],
    next_value: &[f32],
    n_envs: usize,
    gamma: f32,
    lambda: f32,
) -> Advantages {
    let n_steps = rewards.len() / n_envs;
    let mut advantages = vec![0f32; rewards.len()];

    for n in 0..n_envs {
        let mut last_gae = 0f32;
        for t in (0..n_steps).rev() {
            let ix = t * n_envs + n;
            let next_non_terminal = 1.0 - dones[ix];
            let next_values = match t == n_steps - 1 {
                true => next_value[n],
                false => values[ix + n_envs],
            };
            let delta = rewards[ix] + gamma * next_values * next_non_terminal - values[ix];
            last_gae = delta + gamma * lambda * next_non_terminal * last_gae;
            advantages[ix] = last_gae;
        }
    }

    let returns = izip!(advantages.iter(), values.iter())
        .map(|(a, v)| a + v)
        .collect();

    Advantages {
        advantages,
        returns,
    }
}

/// Discounted returns bootstrapped with `next_value`; advantages are returns minus values.
pub fn discounted_returns(
    rewards: &[f32],
    values: &[f32],
    dones: &[f32],
    next_value: &[f32],
    n_envs: usize,
    gamma: f32,
) -> Advantages {
    let n_steps = rewards.len() / n_envs;
    let mut returns = vec![0f32; rewards.len()];

    for n in 0..n_envs {
        let mut next_return = next_value[n];
        for t in (0..n_steps).rev() {
            let ix = t * n_envs + n;
            next_return = rewards[ix] + gamma * (1.0 - dones[ix]) * next_return;
            returns[ix] = next_return;
        }
    }

    let advantages = izip!(returns.iter(), values.iter())
        .map(|(r, v)| r - v)
        .collect();

    Advantages {
        advantages,
        returns,
    }
}
