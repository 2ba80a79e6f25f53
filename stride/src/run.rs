//! Entry points of the binary.
use crate::{args::PolicyKind, config::RunConfig};
use anyhow::Result;
use log::info;
use std::fs;
use stride_candle_agent::{
    actor_critic::{
        ActorCritic, BetaActorCritic, BetaActorCriticConfig, GaussianActorCritic,
        GaussianActorCriticConfig,
    },
    ppo::Ppo,
};
use stride_classic_env::{Normalized, NormalizedConfig, Pendulum, PendulumConfig};
use stride_core::{
    error::StrideError,
    record::{CsvRecorder, Record},
    Agent, DefaultEvaluator, Env, Evaluator, Trainer,
};

/// Trains an agent and evaluates it after training.
///
/// Parameters, metrics and the run configuration are written into
/// [`RunConfig::model_dir`].
pub fn train(config: &RunConfig) -> Result<Record> {
    run(config, false)
}

/// Evaluates an agent with the parameters saved by [`train`] in `model_dir/final`.
pub fn evaluate(config: &RunConfig) -> Result<Record> {
    run(config, true)
}

fn run(config: &RunConfig, eval: bool) -> Result<Record> {
    if config.env_id == "Pendulum-v1" {
        let env_config = PendulumConfig::default()
            .n_envs(config.num_envs)
            .seed_policy(config.seed_policy());
        run_policy::<Pendulum>(config, env_config, eval)
    } else {
        run_gym(config, eval)
    }
}

#[cfg(feature = "py-gym")]
fn run_gym(config: &RunConfig, eval: bool) -> Result<Record> {
    use stride_py_gym_env::{GymEnvConfig, GymVecEnv};

    let env_config = GymEnvConfig::default()
        .name(config.env_id.as_str())
        .n_envs(config.num_envs)
        .seed_policy(config.seed_policy());
    run_policy::<GymVecEnv>(config, env_config, eval)
}

#[cfg(not(feature = "py-gym"))]
fn run_gym(config: &RunConfig, _eval: bool) -> Result<Record> {
    Err(StrideError::InvalidConfig(format!(
        "{} requires the py-gym feature, only Pendulum-v1 is built in",
        config.env_id
    ))
    .into())
}

fn run_policy<E: Env>(config: &RunConfig, env_config: E::Config, eval: bool) -> Result<Record> {
    let env_config = NormalizedConfig::new(env_config).gamma(config.gamma as f64);
    match config.policy {
        PolicyKind::Gaussian => run_with::<E, GaussianActorCritic>(
            config,
            env_config,
            GaussianActorCriticConfig::default(),
            eval,
        ),
        PolicyKind::Beta => run_with::<E, BetaActorCritic>(
            config,
            env_config,
            BetaActorCriticConfig::default(),
            eval,
        ),
    }
}

fn run_with<E: Env, M: ActorCritic>(
    config: &RunConfig,
    env_config: NormalizedConfig<E::Config>,
    model_config: M::Config,
    eval: bool,
) -> Result<Record> {
    let (obs_space, act_space) = {
        let env = Normalized::<E>::build(&env_config, config.seed)?;
        (env.observation_space(), env.action_space())
    };
    let agent_config = config
        .ppo_config(model_config)
        .spaces(&obs_space, &act_space);
    let mut agent = Ppo::<M>::build(agent_config)?;
    let mut evaluator =
        DefaultEvaluator::<Normalized<E>>::new(&env_config, config.seed, config.n_eval_episodes)?;

    if eval {
        let model_dir = config.model_dir.as_ref().ok_or_else(|| {
            StrideError::InvalidConfig("--model-dir is required for evaluation".to_string())
        })?;
        agent.load_params(&std::path::Path::new(model_dir).join("final"))?;
        agent.eval();
        let record = evaluator.evaluate(&mut agent)?;
        info!(
            "eval/episodic_return={}",
            record.get_scalar("eval/episodic_return")?
        );
        Ok(record)
    } else {
        let model_dir = config.model_dir();
        fs::create_dir_all(&model_dir)?;
        config.save(model_dir.join("run_config.yaml"))?;
        info!("Outputs are written into {:?}", model_dir);

        let mut trainer = Trainer::<Normalized<E>>::build(config.trainer_config(), env_config);
        let mut recorder = CsvRecorder::new(model_dir.join("metrics.csv"))?;
        trainer.train(&mut agent, &mut recorder, &mut evaluator)
    }
}
