//! Normalization wrapper.
use crate::RunningMeanStd;
use anyhow::Result;
use log::trace;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use stride_core::{BoxSpace, Env, Step};

/// Configuration of [`Normalized`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NormalizedConfig<C> {
    /// Configuration of the wrapped environment.
    pub env_config: C,

    /// Clips actions into the action space before stepping.
    pub clip_action: bool,

    /// Normalizes observations with running statistics.
    pub norm_obs: bool,

    /// Normalized observations are clipped into `[-clip_obs, clip_obs]`.
    pub clip_obs: f32,

    /// Scales rewards by the running standard deviation of discounted returns.
    pub norm_reward: bool,

    /// Normalized rewards are clipped into `[-clip_reward, clip_reward]`.
    pub clip_reward: f32,

    /// Discount factor of the returns used for reward normalization.
    pub gamma: f64,

    /// Added to variances before taking the square root.
    pub epsilon: f64,
}

impl<C: Default> Default for NormalizedConfig<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C> NormalizedConfig<C> {
    /// Wraps an environment configuration with all the normalizations enabled.
    pub fn new(env_config: C) -> Self {
        Self {
            env_config,
            clip_action: true,
            norm_obs: true,
            clip_obs: 10.0,
            norm_reward: true,
            clip_reward: 10.0,
            gamma: 0.99,
            epsilon: 1e-8,
        }
    }

    /// Enables or disables action clipping.
    pub fn clip_action(mut self, v: bool) -> Self {
        self.clip_action = v;
        self
    }

    /// Enables or disables observation normalization.
    pub fn norm_obs(mut self, v: bool) -> Self {
        self.norm_obs = v;
        self
    }

    /// Enables or disables reward normalization.
    pub fn norm_reward(mut self, v: bool) -> Self {
        self.norm_reward = v;
        self
    }

    /// Sets the discount factor for reward normalization.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }
}

/// Clips actions and normalizes observations and rewards of an environment.
///
/// Wrappers are applied in this order:
/// 1. actions are clipped into the action space,
/// 2. observations are normalized with their running statistics and clipped,
/// 3. rewards are divided by the running standard deviation of the discounted
///    return and clipped.
///
/// [`EpisodeInfo`](stride_core::EpisodeInfo) of the wrapped environment is passed
/// through, so episode returns are the raw ones.
pub struct Normalized<E: Env> {
    env: E,
    config: NormalizedConfig<E::Config>,
    act_space: BoxSpace,
    obs_rms: RunningMeanStd,
    ret_rms: RunningMeanStd,
    returns: Vec<f64>,
}

impl<E: Env> Normalized<E> {
    /// Returns the wrapped environment.
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Running statistics of observations.
    pub fn obs_rms(&self) -> &RunningMeanStd {
        &self.obs_rms
    }

    fn filt_obs(&mut self, mut obs: Array2<f32>) -> Array2<f32> {
        if self.config.norm_obs {
            if let Some(xs) = obs.as_slice_mut() {
                self.obs_rms.update(xs);
                self.obs_rms.normalize(xs, self.config.epsilon);
            }
            let c = self.config.clip_obs;
            obs.mapv_inplace(|x| x.clamp(-c, c));
        }
        obs
    }

    fn filt_reward(&mut self, reward: &mut [f32], is_terminated: &[i8]) {
        if !self.config.norm_reward {
            return;
        }
        for (ret, (r, t)) in self.returns.iter_mut().zip(reward.iter().zip(is_terminated)) {
            *ret = *ret * self.config.gamma * (1 - t) as f64 + *r as f64;
        }
        let returns = self.returns.iter().map(|x| *x as f32).collect::<Vec<_>>();
        self.ret_rms.update(&returns);
        self.ret_rms.scale(reward, self.config.epsilon);

        let c = self.config.clip_reward;
        reward.iter_mut().for_each(|r| *r = r.clamp(-c, c));
    }
}

impl<E: Env> Env for Normalized<E> {
    type Config = NormalizedConfig<E::Config>;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let env = E::build(&config.env_config, seed)?;
        let n_envs = env.n_envs();
        let obs_dim = env.observation_space().dim();
        let act_space = env.action_space();

        Ok(Self {
            env,
            config: config.clone(),
            act_space,
            obs_rms: RunningMeanStd::new(obs_dim),
            ret_rms: RunningMeanStd::new(1),
            returns: vec![0.0; n_envs],
        })
    }

    fn n_envs(&self) -> usize {
        self.env.n_envs()
    }

    fn observation_space(&self) -> BoxSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        self.act_space.clone()
    }

    fn reset(&mut self) -> Result<Array2<f32>> {
        self.returns.iter_mut().for_each(|r| *r = 0.0);
        let obs = self.env.reset()?;
        Ok(self.filt_obs(obs))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Array2<f32>> {
        self.returns.iter_mut().for_each(|r| *r = 0.0);
        let obs = self.env.reset_with_index(ix)?;
        Ok(self.filt_obs(obs))
    }

    fn step(&mut self, act: &Array2<f32>) -> Result<Step> {
        let step = if self.config.clip_action {
            let mut act = act.as_standard_layout().into_owned();
            if let Some(xs) = act.as_slice_mut() {
                self.act_space.clip(xs);
            }
            trace!("clipped action: {:?}", act);
            self.env.step(&act)?
        } else {
            self.env.step(act)?
        };

        let Step {
            obs,
            mut reward,
            is_terminated,
            is_truncated,
            episodes,
        } = step;
        let obs = self.filt_obs(obs);
        self.filt_reward(&mut reward, &is_terminated);

        Ok(Step::new(obs, reward, is_terminated, is_truncated, episodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::dummy::{DummyEnv, DummyEnvConfig};

    fn env() -> Result<Normalized<DummyEnv>> {
        let config = NormalizedConfig::new(DummyEnvConfig::default().n_envs(2).episode_length(5));
        Normalized::build(&config, 0)
    }

    #[test]
    fn test_normalized_obs() -> Result<()> {
        let mut env = env()?;
        env.reset()?;
        let act = Array2::zeros((2, 2));
        for _ in 0..20 {
            let step = env.step(&act)?;
            assert!(step.obs.iter().all(|x| x.abs() <= 10.0));
        }

        // The elapsed time runs over 0..5 in every dimension, shifted by the dimension
        let mean = env.obs_rms().mean();
        assert!((mean[0] - 2.0).abs() < 0.3);
        assert!((mean[2] - 4.0).abs() < 0.3);
        Ok(())
    }

    #[test]
    fn test_normalized_reward() -> Result<()> {
        let mut env = env()?;
        env.reset()?;
        let act = Array2::zeros((2, 2));
        let step = env.step(&act)?;

        // The variance of the first returns is almost zero, so the scaled rewards are clipped
        assert_eq!(step.reward, vec![10.0, 10.0]);

        // Episode statistics are raw
        let mut episodes = vec![];
        for _ in 0..4 {
            episodes.extend(env.step(&act)?.episodes);
        }
        assert_eq!(episodes.len(), 2);
        assert!(episodes.iter().all(|ep| ep.ret == 5.0));
        Ok(())
    }

    #[test]
    fn test_disabled() -> Result<()> {
        let config = NormalizedConfig::new(DummyEnvConfig::default())
            .norm_obs(false)
            .norm_reward(false);
        let mut env = Normalized::<DummyEnv>::build(&config, 0)?;
        let obs = env.reset()?;
        assert_eq!(obs.row(0).to_vec(), vec![0.0, 1.0, 2.0]);
        let step = env.step(&Array2::from_elem((1, 2), 3.0))?;
        assert_eq!(step.reward, vec![1.0]);
        assert_eq!(step.obs.row(0).to_vec(), vec![1.0, 2.0, 3.0]);
        Ok(())
    }
}
