//! Deterministic environment and agent used in tests.
use crate::{
    record::{Record, RecordValue},
    util, ActOutput, Agent, BoxSpace, Env, EpisodeInfo, MinibatchSampler, Policy, RolloutBatch,
    Step,
};
use anyhow::Result;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Number of environments.
    pub n_envs: usize,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Every episode is terminated after this number of steps.
    pub episode_length: usize,

    /// Reward of every step.
    pub reward: f32,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            n_envs: 1,
            obs_dim: 3,
            act_dim: 2,
            episode_length: 5,
            reward: 1.0,
        }
    }
}

impl DummyEnvConfig {
    /// Sets the number of environments.
    pub fn n_envs(mut self, v: usize) -> Self {
        self.n_envs = v;
        self
    }

    /// Sets the episode length.
    pub fn episode_length(mut self, v: usize) -> Self {
        self.episode_length = v;
        self
    }

    /// Sets the reward.
    pub fn reward(mut self, v: f32) -> Self {
        self.reward = v;
        self
    }
}

/// An environment whose observation is the elapsed time in the episode.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: Vec<usize>,
}

impl DummyEnv {
    fn obs(&self) -> Array2<f32> {
        let (n, d) = (self.config.n_envs, self.config.obs_dim);
        Array2::from_shape_fn((n, d), |(i, j)| (self.t[i] + j) as f32)
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: vec![0; config.n_envs],
        })
    }

    fn n_envs(&self) -> usize {
        self.config.n_envs
    }

    fn observation_space(&self) -> BoxSpace {
        BoxSpace::unbounded(vec![self.config.obs_dim])
    }

    fn action_space(&self) -> BoxSpace {
        let d = self.config.act_dim;
        BoxSpace::new(vec![-1.0; d], vec![1.0; d])
    }

    fn reset(&mut self) -> Result<Array2<f32>> {
        self.t.iter_mut().for_each(|t| *t = 0);
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Array2<f32>> {
        self.reset()
    }

    fn step(&mut self, _act: &Array2<f32>) -> Result<Step> {
        let n = self.config.n_envs;
        let mut is_terminated = vec![0; n];
        let mut episodes = vec![];

        for i in 0..n {
            self.t[i] += 1;
            if self.t[i] == self.config.episode_length {
                is_terminated[i] = 1;
                episodes.push(EpisodeInfo {
                    env_ix: i,
                    ret: self.config.reward * self.t[i] as f32,
                    length: self.t[i],
                });
                self.t[i] = 0;
            }
        }

        Ok(Step::new(
            self.obs(),
            vec![self.config.reward; n],
            is_terminated,
            vec![0; n],
            episodes,
        ))
    }
}

/// An agent taking zero actions and counting optimization steps.
pub struct DummyAgent {
    act_dim: usize,
    train: bool,
    lr: f64,
    num_minibatches: usize,

    /// Batch sizes given to [`Agent::opt_with_record`].
    pub batch_sizes: Vec<usize>,

    /// Learning rates at each call of [`Agent::opt_with_record`].
    pub learning_rates: Vec<f64>,
}

impl DummyAgent {
    /// Constructs an agent.
    pub fn new(_obs_dim: usize, act_dim: usize) -> Self {
        Self {
            act_dim,
            train: true,
            lr: 1e-3,
            num_minibatches: 1,
            batch_sizes: vec![],
            learning_rates: vec![],
        }
    }

    /// Sets the number of minibatches checked in [`Agent::check_batch_size`].
    pub fn num_minibatches(mut self, v: usize) -> Self {
        self.num_minibatches = v;
        self
    }
}

impl Policy for DummyAgent {
    fn sample(&mut self, obs: &Array2<f32>) -> Result<Array2<f32>> {
        Ok(Array2::zeros((obs.nrows(), self.act_dim)))
    }
}

impl Agent for DummyAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn act(&mut self, obs: &Array2<f32>) -> Result<ActOutput> {
        let n = obs.nrows();
        Ok(ActOutput {
            act: self.sample(obs)?,
            log_prob: vec![0.0; n],
            value: vec![0.0; n],
        })
    }

    fn value(&mut self, obs: &Array2<f32>) -> Result<Vec<f32>> {
        Ok(vec![0.0; obs.nrows()])
    }

    fn check_batch_size(&self, batch_size: usize) -> Result<()> {
        MinibatchSampler::new(batch_size, self.num_minibatches)?;
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }

    fn opt_with_record(&mut self, batch: &RolloutBatch) -> Result<Record> {
        self.batch_sizes.push(batch.len());
        self.learning_rates.push(self.lr);
        Ok(Record::from_slice(&[(
            "losses/value_loss",
            RecordValue::Scalar(util::mean(&batch.returns)),
        )]))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(path)?;
        let file = path.join("dummy.txt");
        std::fs::write(&file, format!("{}", self.batch_sizes.len()))?;
        Ok(vec![file])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let n: usize = std::fs::read_to_string(path.join("dummy.txt"))?.trim().parse()?;
        self.batch_sizes = vec![0; n];
        Ok(())
    }
}
