//! Configuration of [`Trainer`](super::Trainer).
use crate::advantage::AdvantageConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Total number of environment steps, summed over sub-environments.
    pub total_timesteps: usize,

    /// Number of steps of each sub-environment in a rollout.
    pub n_steps: usize,

    /// If `true`, the learning rate decays linearly to zero over the updates.
    pub anneal_lr: bool,

    /// Advantage estimation.
    pub advantage: AdvantageConfig,

    /// Seed of the training environment.
    pub seed: i64,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 1_000_000,
            n_steps: 2048,
            anneal_lr: true,
            advantage: AdvantageConfig::default(),
            seed: 2023,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the total number of environment steps.
    pub fn total_timesteps(mut self, v: usize) -> Self {
        self.total_timesteps = v;
        self
    }

    /// Sets the number of steps of each sub-environment in a rollout.
    pub fn n_steps(mut self, v: usize) -> Self {
        self.n_steps = v;
        self
    }

    /// Enables or disables learning rate annealing.
    pub fn anneal_lr(mut self, v: bool) -> Self {
        self.anneal_lr = v;
        self
    }

    /// Sets the configuration of advantage estimation.
    pub fn advantage(mut self, v: AdvantageConfig) -> Self {
        self.advantage = v;
        self
    }

    /// Sets the seed of the training environment.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory the trained model is saved in.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .total_timesteps(10_000)
            .n_steps(64)
            .anneal_lr(false)
            .advantage(AdvantageConfig::default().use_gae(false))
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
