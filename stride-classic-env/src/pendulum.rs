//! Inverted pendulum swing-up.
use anyhow::Result;
use log::trace;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{f32::consts::PI, fs::File, io::BufReader, io::Write, path::Path};
use stride_core::{error::StrideError, BoxSpace, Env, EpisodeInfo, SeedPolicy, Step};

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const G: f32 = 10.0;
const M: f32 = 1.0;
const L: f32 = 1.0;

/// Configuration of [`Pendulum`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PendulumConfig {
    /// Number of environments.
    pub n_envs: usize,

    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: usize,

    /// Seeds of the environments.
    pub seed_policy: SeedPolicy,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            n_envs: 1,
            max_episode_steps: 200,
            seed_policy: SeedPolicy::Offset,
        }
    }
}

impl PendulumConfig {
    /// Sets the number of environments.
    pub fn n_envs(mut self, v: usize) -> Self {
        self.n_envs = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the seed policy.
    pub fn seed_policy(mut self, v: SeedPolicy) -> Self {
        self.seed_policy = v;
        self
    }

    /// Constructs [`PendulumConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PendulumConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[inline]
fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// Vectorized inverted pendulum, compatible with `Pendulum-v1` of gymnasium.
///
/// The observation is `[cos(theta), sin(theta), theta_dot]` and the action is the torque
/// in `[-2, 2]`. The reward is `-(theta^2 + 0.1 theta_dot^2 + 0.001 u^2)` with `theta`
/// normalized into `[-pi, pi)`. Episodes are never terminated, only truncated after
/// `max_episode_steps` steps.
///
/// Each environment has its own random number generator, seeded according to the
/// [`SeedPolicy`] of the configuration.
pub struct Pendulum {
    config: PendulumConfig,
    seed: i64,
    theta: Vec<f32>,
    theta_dot: Vec<f32>,
    ticks: Vec<usize>,
    returns: Vec<f32>,
    rngs: Vec<StdRng>,
}

impl Pendulum {
    fn seed_rngs(&mut self, seed: i64) {
        let policy = self.config.seed_policy;
        self.rngs = (0..self.config.n_envs)
            .map(|i| StdRng::seed_from_u64(policy.seed(seed, i) as u64))
            .collect();
    }

    fn reset_env(&mut self, i: usize) {
        let rng = &mut self.rngs[i];
        self.theta[i] = rng.gen_range(-PI..PI);
        self.theta_dot[i] = rng.gen_range(-1.0..1.0);
        self.ticks[i] = 0;
        self.returns[i] = 0.0;
    }

    fn reset_all(&mut self) -> Array2<f32> {
        for i in 0..self.config.n_envs {
            self.reset_env(i);
        }
        self.obs()
    }

    fn obs(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.config.n_envs, 3), |(i, j)| match j {
            0 => self.theta[i].cos(),
            1 => self.theta[i].sin(),
            _ => self.theta_dot[i],
        })
    }
}

impl Env for Pendulum {
    type Config = PendulumConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.n_envs == 0 {
            return Err(StrideError::InvalidConfig("n_envs must be at least 1".to_string()).into());
        }
        let n = config.n_envs;
        let mut env = Self {
            config: config.clone(),
            seed,
            theta: vec![0.0; n],
            theta_dot: vec![0.0; n],
            ticks: vec![0; n],
            returns: vec![0.0; n],
            rngs: vec![],
        };
        env.seed_rngs(seed);
        Ok(env)
    }

    fn n_envs(&self) -> usize {
        self.config.n_envs
    }

    fn observation_space(&self) -> BoxSpace {
        BoxSpace::new(vec![-1.0, -1.0, -MAX_SPEED], vec![1.0, 1.0, MAX_SPEED])
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::new(vec![-MAX_TORQUE], vec![MAX_TORQUE])
    }

    fn reset(&mut self) -> Result<Array2<f32>> {
        Ok(self.reset_all())
    }

    /// Reseeds the environments with `seed + ix * n_envs` before resetting them.
    fn reset_with_index(&mut self, ix: usize) -> Result<Array2<f32>> {
        let seed = self.seed + (ix * self.config.n_envs) as i64;
        self.seed_rngs(seed);
        Ok(self.reset_all())
    }

    fn step(&mut self, act: &Array2<f32>) -> Result<Step> {
        let n = self.config.n_envs;
        if act.shape() != [n, 1] {
            return Err(StrideError::ShapeMismatch {
                expected: vec![n, 1],
                actual: act.shape().to_vec(),
            }
            .into());
        }

        let mut reward = vec![0f32; n];
        let mut is_truncated = vec![0i8; n];
        let mut episodes = vec![];

        for i in 0..n {
            let u = act[[i, 0]].clamp(-MAX_TORQUE, MAX_TORQUE);
            let (th, thdot) = (self.theta[i], self.theta_dot[i]);
            let cost = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);

            let thdot = thdot + (3.0 * G / (2.0 * L) * th.sin() + 3.0 / (M * L * L) * u) * DT;
            let thdot = thdot.clamp(-MAX_SPEED, MAX_SPEED);
            self.theta[i] = th + thdot * DT;
            self.theta_dot[i] = thdot;

            reward[i] = -cost;
            self.returns[i] += -cost;
            self.ticks[i] += 1;

            if self.ticks[i] >= self.config.max_episode_steps {
                trace!("env {} truncated with return {}", i, self.returns[i]);
                is_truncated[i] = 1;
                episodes.push(EpisodeInfo {
                    env_ix: i,
                    ret: self.returns[i],
                    length: self.ticks[i],
                });
                self.reset_env(i);
            }
        }

        Ok(Step::new(self.obs(), reward, vec![0; n], is_truncated, episodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reset() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default().n_envs(4), 42)?;
        let obs = env.reset()?;
        assert_eq!(obs.shape(), &[4, 3]);
        for row in obs.rows() {
            assert!((row[0].powi(2) + row[1].powi(2) - 1.0).abs() < 1e-5);
            assert!(row[2].abs() <= 1.0);
        }

        // Different seeds for different environments
        assert_ne!(obs.row(0), obs.row(1));
        Ok(())
    }

    #[test]
    fn test_dynamics() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        env.theta[0] = 0.0;
        env.theta_dot[0] = 0.0;

        let step = env.step(&array![[5.0]])?;

        // The torque is clipped to 2
        assert!((step.reward[0] + 0.004).abs() < 1e-7);
        assert!((env.theta_dot[0] - 0.3).abs() < 1e-6);
        assert!((env.theta[0] - 0.015).abs() < 1e-6);
        assert!((step.obs[[0, 2]] - 0.3).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_angle_normalize() {
        assert!((angle_normalize(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!((angle_normalize(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_truncation() -> Result<()> {
        let config = PendulumConfig::default().n_envs(2).max_episode_steps(10);
        let mut env = Pendulum::build(&config, 0)?;
        env.reset()?;
        let act = Array2::zeros((2, 1));
        let mut ret = 0.0;

        for t in 1..=10 {
            let step = env.step(&act)?;
            ret += step.reward[0];
            if t < 10 {
                assert!(step.episodes.is_empty());
                assert_eq!(step.dones(), vec![0.0, 0.0]);
            } else {
                assert_eq!(step.is_truncated, vec![1, 1]);
                assert_eq!(step.is_terminated, vec![0, 0]);
                assert_eq!(step.episodes.len(), 2);
                assert_eq!(step.episodes[0].length, 10);
                assert!((step.episodes[0].ret - ret).abs() < 1e-4);
            }
        }
        assert_eq!(env.ticks, vec![0, 0]);
        Ok(())
    }

    #[test]
    fn test_seeding() -> Result<()> {
        let pool = PendulumConfig::default()
            .n_envs(4)
            .seed_policy(SeedPolicy::Pool { size: 2 });
        let mut env = Pendulum::build(&pool, 7)?;
        let obs = env.reset()?;
        assert_eq!(obs.row(0), obs.row(2));
        assert_eq!(obs.row(1), obs.row(3));

        // Reproducible with the same seed
        let mut env2 = Pendulum::build(&pool, 7)?;
        assert_eq!(obs, env2.reset()?);

        // Evaluation episodes are reproducible
        let obs1 = env.reset_with_index(3)?;
        env.reset()?;
        let obs2 = env.reset_with_index(3)?;
        assert_eq!(obs1, obs2);
        assert_ne!(obs1, env.reset_with_index(4)?);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default().n_envs(2), 0)?;
        env.reset()?;
        let err = env.step(&Array2::zeros((1, 1))).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StrideError>(),
            Some(&StrideError::ShapeMismatch {
                expected: vec![2, 1],
                actual: vec![1, 1]
            })
        );
        Ok(())
    }
}
