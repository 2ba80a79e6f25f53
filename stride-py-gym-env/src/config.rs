//! Configuration of [`GymVecEnv`](super::GymVecEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use stride_core::SeedPolicy;

/// Configuration of [`GymVecEnv`](super::GymVecEnv).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GymEnvConfig {
    /// Environment id, e.g. `Humanoid-v4`.
    pub name: String,

    /// Number of environments.
    pub n_envs: usize,

    /// Seeds of the environments.
    pub seed_policy: SeedPolicy,
}

impl Default for GymEnvConfig {
    fn default() -> Self {
        Self {
            name: "Humanoid-v4".to_string(),
            n_envs: 1,
            seed_policy: SeedPolicy::Offset,
        }
    }
}

impl GymEnvConfig {
    /// Sets the environment id.
    pub fn name(mut self, v: impl Into<String>) -> Self {
        self.name = v.into();
        self
    }

    /// Sets the number of environments.
    pub fn n_envs(mut self, v: usize) -> Self {
        self.n_envs = v;
        self
    }

    /// Sets the seed policy.
    pub fn seed_policy(mut self, v: SeedPolicy) -> Self {
        self.seed_policy = v;
        self
    }

    /// Seeds of the environments for a given base seed.
    pub fn seeds(&self, seed: i64) -> Vec<i64> {
        (0..self.n_envs)
            .map(|i| self.seed_policy.seed(seed, i))
            .collect()
    }

    /// Constructs [`GymEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GymEnvConfig`].
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
    fn test_seeds() {
        let config = GymEnvConfig::default().n_envs(4);
        assert_eq!(config.seeds(2023), vec![2023, 2024, 2025, 2026]);
        let config = config.seed_policy(SeedPolicy::Pool { size: 3 });
        assert_eq!(config.seeds(2023), vec![2023, 2024, 2025, 2023]);
    }

    #[test]
    fn test_serde_gym_env_config() -> Result<()> {
        let dir = TempDir::new("gym_env_config")?;
        let path = dir.path().join("env.yaml");
        let config = GymEnvConfig::default().name("Pendulum-v1").n_envs(2);
        config.save(&path)?;
        assert_eq!(GymEnvConfig::load(&path)?, config);
        Ok(())
    }
}
