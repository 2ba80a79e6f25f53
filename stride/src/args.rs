//! Command line arguments.
use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// What the binary does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Train an agent, then evaluate it.
    Train,

    /// Evaluate an agent loaded from `--model-dir`.
    Eval,

    /// Print the configuration of the run and exit.
    ShowConfig,
}

/// Distribution of the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
pub enum PolicyKind {
    /// Diagonal Gaussian with a state-independent standard deviation.
    Gaussian,

    /// Beta distribution rescaled to the bounds of the action space.
    Beta,
}

/// Train/eval PPO agent in continuous-control environments
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// What to do
    #[arg(long, value_enum, default_value_t = Mode::Train)]
    pub mode: Mode,

    /// Distribution of the policy
    #[arg(long, value_enum, default_value_t = PolicyKind::Gaussian)]
    pub policy: PolicyKind,

    /// Name of the experiment
    #[arg(long, default_value = "ppo_continuous")]
    pub exp_name: String,

    /// Environment id, `Pendulum-v1` runs without Python
    #[arg(long, default_value = "Humanoid-v4")]
    pub env_id: String,

    /// Learning rate of the optimizer
    #[arg(long, default_value_t = 3e-4)]
    pub learning_rate: f64,

    /// Seed of the experiment
    #[arg(long, default_value_t = 2023)]
    pub seed: i64,

    /// Total timesteps of the experiment [default: 2e7 for gaussian, 1e7 for beta]
    #[arg(long)]
    pub total_timesteps: Option<usize>,

    /// Number of parallel environments [default: 1 for gaussian, 2 for beta]
    #[arg(long)]
    pub num_envs: Option<usize>,

    /// Environments share `seed-pool` distinct seeds, cycling over the environments
    #[arg(long)]
    pub seed_pool: Option<usize>,

    /// Number of steps in each environment per policy rollout
    #[arg(long, default_value_t = 2048)]
    pub num_steps: usize,

    /// Anneal the learning rate linearly to zero
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub anneal_lr: bool,

    /// Use GAE for advantage estimation
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub gae: bool,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    pub gamma: f32,

    /// Lambda of GAE
    #[arg(long, default_value_t = 0.95)]
    pub gae_lambda: f32,

    /// Number of minibatches
    #[arg(long, default_value_t = 32)]
    pub num_minibatches: usize,

    /// Number of epochs to update the policy
    #[arg(long, default_value_t = 10)]
    pub update_epochs: usize,

    /// Normalize advantages in each minibatch
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub norm_adv: bool,

    /// Surrogate clipping coefficient
    #[arg(long, default_value_t = 0.2)]
    pub clip_coef: f64,

    /// Clip the value loss
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub clip_vloss: bool,

    /// Coefficient of the entropy bonus [default: 0.0 for gaussian, 0.1 for beta]
    #[arg(long)]
    pub ent_coef: Option<f64>,

    /// Coefficient of the value loss
    #[arg(long, default_value_t = 0.5)]
    pub vf_coef: f64,

    /// Maximum norm for gradient clipping
    #[arg(long, default_value_t = 0.3)]
    pub max_grad_norm: f64,

    /// Target KL divergence threshold for early stopping
    #[arg(long)]
    pub target_kl: Option<f64>,

    /// Number of episodes of the evaluation
    #[arg(long, default_value_t = 10)]
    pub n_eval_episodes: usize,

    /// Take the mean of the policy in evaluation
    #[arg(long, default_value_t = false)]
    pub deterministic_eval: bool,

    /// Directory of parameters, metrics and the run configuration
    /// [default: runs/{env_id}__{exp_name}__{seed}__{unix_time}]
    #[arg(long)]
    pub model_dir: Option<String>,

    /// Run on the CUDA device with this ordinal
    #[arg(long)]
    pub cuda: Option<usize>,
}
