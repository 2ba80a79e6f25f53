//! Configuration of PPO agent.
use crate::{actor_critic::ActorCriticConfig, opt::OptimizerConfig, Device};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use stride_core::BoxSpace;

/// Configuration of [`Ppo`](super::Ppo).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig<C> {
    /// Configuration of the policy-value network.
    pub model_config: C,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Number of minibatches a batch is split into.
    pub num_minibatches: usize,

    /// Number of passes over a batch.
    pub update_epochs: usize,

    /// If `true`, advantages are standardized in each minibatch.
    pub norm_adv: bool,

    /// Clipping coefficient of the surrogate objective and of the value function.
    pub clip_coef: f64,

    /// If `true`, the value loss is clipped around the values at collection time.
    pub clip_vloss: bool,

    /// Coefficient of the entropy bonus.
    pub ent_coef: f64,

    /// Coefficient of the value loss.
    pub vf_coef: f64,

    /// Maximum global norm of gradients.
    pub max_grad_norm: f64,

    /// The remaining epochs of an update are skipped when the approximate KL divergence
    /// exceeds this value.
    pub target_kl: Option<f64>,

    /// If `true`, the mean of the policy is taken in evaluation mode.
    pub deterministic_eval: bool,

    /// Seed of parameter initialization, action sampling and minibatch shuffling.
    pub seed: u64,

    /// Device.
    pub device: Device,
}

impl<C: Default> Default for PpoConfig<C> {
    fn default() -> Self {
        Self {
            model_config: C::default(),
            opt_config: OptimizerConfig::default(),
            num_minibatches: 32,
            update_epochs: 10,
            norm_adv: true,
            clip_coef: 0.2,
            clip_vloss: true,
            ent_coef: 0.0,
            vf_coef: 0.5,
            max_grad_norm: 0.3,
            target_kl: None,
            deterministic_eval: false,
            seed: 2023,
            device: Device::Cpu,
        }
    }
}

impl<C: ActorCriticConfig> PpoConfig<C> {
    /// Sets the configuration of the policy-value network.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = v;
        self
    }

    /// Sets the spaces of the environment in the model configuration.
    pub fn spaces(mut self, obs_space: &BoxSpace, act_space: &BoxSpace) -> Self {
        self.model_config = self.model_config.spaces(obs_space, act_space);
        self
    }

    /// Sets the configuration of the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.opt_config = self.opt_config.learning_rate(v);
        self
    }

    /// Sets the number of minibatches.
    pub fn num_minibatches(mut self, v: usize) -> Self {
        self.num_minibatches = v;
        self
    }

    /// Sets the number of epochs.
    pub fn update_epochs(mut self, v: usize) -> Self {
        self.update_epochs = v;
        self
    }

    /// Enables or disables advantage normalization.
    pub fn norm_adv(mut self, v: bool) -> Self {
        self.norm_adv = v;
        self
    }

    /// Sets the clipping coefficient.
    pub fn clip_coef(mut self, v: f64) -> Self {
        self.clip_coef = v;
        self
    }

    /// Enables or disables value loss clipping.
    pub fn clip_vloss(mut self, v: bool) -> Self {
        self.clip_vloss = v;
        self
    }

    /// Sets the coefficient of the entropy bonus.
    pub fn ent_coef(mut self, v: f64) -> Self {
        self.ent_coef = v;
        self
    }

    /// Sets the coefficient of the value loss.
    pub fn vf_coef(mut self, v: f64) -> Self {
        self.vf_coef = v;
        self
    }

    /// Sets the maximum norm of gradients.
    pub fn max_grad_norm(mut self, v: f64) -> Self {
        self.max_grad_norm = v;
        self
    }

    /// Sets the target KL divergence.
    pub fn target_kl(mut self, v: Option<f64>) -> Self {
        self.target_kl = v;
        self
    }

    /// Enables or disables deterministic actions in evaluation mode.
    pub fn deterministic_eval(mut self, v: bool) -> Self {
        self.deterministic_eval = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of PPO agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`PpoConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of PPO agent into {:?}", path_);
        Ok(())
    }
}
