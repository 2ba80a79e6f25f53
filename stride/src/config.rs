//! Configuration of a run.
use crate::args::{Args, PolicyKind};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};
use stride_candle_agent::{actor_critic::ActorCriticConfig, ppo::PpoConfig, Device};
use stride_core::{advantage::AdvantageConfig, SeedPolicy, TrainerConfig};

/// Hyperparameters of a run, resolved from [`Args`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RunConfig {
    pub run_name: String,
    pub exp_name: String,
    pub env_id: String,
    pub policy: PolicyKind,
    pub learning_rate: f64,
    pub seed: i64,
    pub total_timesteps: usize,
    pub num_envs: usize,
    pub seed_pool: Option<usize>,
    pub num_steps: usize,
    pub anneal_lr: bool,
    pub gae: bool,
    pub gamma: f32,
    pub gae_lambda: f32,
    pub num_minibatches: usize,
    pub update_epochs: usize,
    pub norm_adv: bool,
    pub clip_coef: f64,
    pub clip_vloss: bool,
    pub ent_coef: f64,
    pub vf_coef: f64,
    pub max_grad_norm: f64,
    pub target_kl: Option<f64>,
    pub n_eval_episodes: usize,
    pub deterministic_eval: bool,
    pub model_dir: Option<String>,
    pub cuda: Option<usize>,
}

/// Returns `{env_id}__{exp_name}__{seed}__{unix_time}`.
pub fn run_name(env_id: &str, exp_name: &str, seed: i64, unix_time: i64) -> String {
    format!("{}__{}__{}__{}", env_id, exp_name, seed, unix_time)
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        let (total_timesteps, num_envs, ent_coef) = match args.policy {
            PolicyKind::Gaussian => (20_000_000, 1, 0.0),
            PolicyKind::Beta => (10_000_000, 2, 0.1),
        };
        let unix_time = chrono::Utc::now().timestamp();

        Self {
            run_name: run_name(&args.env_id, &args.exp_name, args.seed, unix_time),
            exp_name: args.exp_name,
            env_id: args.env_id,
            policy: args.policy,
            learning_rate: args.learning_rate,
            seed: args.seed,
            total_timesteps: args.total_timesteps.unwrap_or(total_timesteps),
            num_envs: args.num_envs.unwrap_or(num_envs),
            seed_pool: args.seed_pool,
            num_steps: args.num_steps,
            anneal_lr: args.anneal_lr,
            gae: args.gae,
            gamma: args.gamma,
            gae_lambda: args.gae_lambda,
            num_minibatches: args.num_minibatches,
            update_epochs: args.update_epochs,
            norm_adv: args.norm_adv,
            clip_coef: args.clip_coef,
            clip_vloss: args.clip_vloss,
            ent_coef: args.ent_coef.unwrap_or(ent_coef),
            vf_coef: args.vf_coef,
            max_grad_norm: args.max_grad_norm,
            target_kl: args.target_kl,
            n_eval_episodes: args.n_eval_episodes,
            deterministic_eval: args.deterministic_eval,
            model_dir: args.model_dir,
            cuda: args.cuda,
        }
    }
}

impl RunConfig {
    /// Directory of the outputs of the run.
    pub fn model_dir(&self) -> PathBuf {
        match self.model_dir.as_ref() {
            Some(dir) => PathBuf::from(dir),
            None => Path::new("runs").join(&self.run_name),
        }
    }

    pub fn seed_policy(&self) -> SeedPolicy {
        match self.seed_pool {
            Some(size) => SeedPolicy::Pool { size },
            None => SeedPolicy::Offset,
        }
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        let advantage = AdvantageConfig::default()
            .gamma(self.gamma)
            .gae_lambda(self.gae_lambda)
            .use_gae(self.gae);
        TrainerConfig::default()
            .total_timesteps(self.total_timesteps)
            .n_steps(self.num_steps)
            .anneal_lr(self.anneal_lr)
            .advantage(advantage)
            .seed(self.seed)
            .model_dir(self.model_dir().to_string_lossy())
    }

    pub fn ppo_config<C: ActorCriticConfig>(&self, model_config: C) -> PpoConfig<C> {
        let device = match self.cuda {
            Some(n) => Device::Cuda(n),
            None => Device::Cpu,
        };
        PpoConfig {
            model_config,
            opt_config: Default::default(),
            num_minibatches: self.num_minibatches,
            update_epochs: self.update_epochs,
            norm_adv: self.norm_adv,
            clip_coef: self.clip_coef,
            clip_vloss: self.clip_vloss,
            ent_coef: self.ent_coef,
            vf_coef: self.vf_coef,
            max_grad_norm: self.max_grad_norm,
            target_kl: self.target_kl,
            deterministic_eval: self.deterministic_eval,
            seed: self.seed as u64,
            device,
        }
        .learning_rate(self.learning_rate)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save run config into {:?}", path_);
        Ok(())
    }
}
