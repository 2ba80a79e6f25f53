//! Train [`Agent`].
mod config;
use crate::{
    advantage::AdvantageConfig,
    error::StrideError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    util, Agent, Env, EpisodeInfo, Evaluator, RolloutBuffer,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{debug, error, info};
use std::{path::Path, time::Instant};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the on-policy training loop.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`], a recorder implementing
///    [`AggregateRecorder`] and an evaluator implementing [`Evaluator`].
/// 1. Build [`Env`] with the seed of the configuration. The batch size is
///    `batch_size = n_steps * n_envs` and the number of updates is
///    `num_updates = total_timesteps / batch_size`. A configuration giving no update or
///    a batch size the agent rejects with [`Agent::check_batch_size`] is an error.
/// 2. Reset [`Env`]. The learning rate of the agent at this point is `lr0`.
/// 3. For `update` in `1..=num_updates`:
///     1. If `anneal_lr`, set the learning rate to
///        `(1 - (update - 1) / num_updates) * lr0`.
///     2. Collect `n_steps` steps into the [`RolloutBuffer`],
///        `global_step += batch_size`.
///     3. Estimate advantages and returns with the value of the observation
///        following the rollout.
///     4. Flatten the rollout and do an optimization step with
///        [`Agent::opt_with_record`].
///     5. Store the record of the agent, the learning rate, explained variance, SPS and
///        the mean return and length of episodes finished in the rollout. Then flush the
///        recorder at `global_step`.
/// 4. Save the model parameters in `(model_dir)/final`. A failure to save is an error.
/// 5. Evaluate the agent in evaluation mode and return the record of the evaluator.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|act|B[Env]
///     B -->|Step|C[RolloutBuffer]
///     C -->|rewards, values, dones|D[AdvantageConfig]
///     D -->|Advantages|E[RolloutBatch]
///     C -->|obs, act, log_prob|E
///     E -->|opt_with_record|A
/// ```
pub struct Trainer<E: Env> {
    env_config: E::Config,
    total_timesteps: usize,
    n_steps: usize,
    anneal_lr: bool,
    advantage: AdvantageConfig,
    seed: i64,
    model_dir: Option<String>,
}

impl<E: Env> Trainer<E> {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig, env_config: E::Config) -> Self {
        Self {
            env_config,
            total_timesteps: config.total_timesteps,
            n_steps: config.n_steps,
            anneal_lr: config.anneal_lr,
            advantage: config.advantage,
            seed: config.seed,
            model_dir: config.model_dir,
        }
    }

    fn save_model<A: Agent>(agent: &A, model_dir: &Path) -> Result<()> {
        match agent.save_params(model_dir) {
            Ok(_) => {
                info!("Saved the model in {:?}.", model_dir);
                Ok(())
            }
            Err(e) => {
                error!("Failed to save model in {:?}: {}", model_dir, e);
                Err(e)
            }
        }
    }

    fn episode_record(episodes: &[EpisodeInfo]) -> Record {
        let returns: Vec<f32> = episodes.iter().map(|ep| ep.ret).collect();
        let lengths: Vec<f32> = episodes.iter().map(|ep| ep.length as f32).collect();
        Record::from_slice(&[
            ("charts/episodic_return", Scalar(util::mean(&returns))),
            ("charts/episodic_length", Scalar(util::mean(&lengths))),
        ])
    }

    /// Returns the number of updates for a given number of sub-environments.
    pub fn num_updates(&self, n_envs: usize) -> Result<usize> {
        let batch_size = self.n_steps * n_envs;
        if batch_size == 0 {
            return Err(StrideError::InvalidConfig(format!(
                "empty batch: n_steps = {}, n_envs = {}",
                self.n_steps, n_envs
            ))
            .into());
        }
        let num_updates = self.total_timesteps / batch_size;
        if num_updates == 0 {
            return Err(StrideError::InvalidConfig(format!(
                "total_timesteps = {} is smaller than the batch size {}",
                self.total_timesteps, batch_size
            ))
            .into());
        }
        Ok(num_updates)
    }

    /// Train the agent.
    ///
    /// Returns the record of the evaluation after training.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<Record>
    where
        A: Agent,
        D: Evaluator<E>,
    {
        let mut env = E::build(&self.env_config, self.seed)?;
        let n_envs = env.n_envs();
        let num_updates = self.num_updates(n_envs)?;
        let batch_size = self.n_steps * n_envs;
        agent.check_batch_size(batch_size)?;

        let obs_dim = env.observation_space().dim();
        let act_dim = env.action_space().dim();
        let mut buffer = RolloutBuffer::new(self.n_steps, n_envs, obs_dim, act_dim);
        let lr0 = agent.learning_rate();
        info!(
            "Starts training: {} updates of {} steps x {} envs",
            num_updates, self.n_steps, n_envs
        );

        agent.train();
        let mut obs = env.reset()?;
        let mut done = vec![0f32; n_envs];
        let mut global_step = 0;
        let timer = Instant::now();

        for update in 1..=num_updates {
            if self.anneal_lr {
                let frac = 1.0 - (update - 1) as f64 / num_updates as f64;
                agent.set_learning_rate(frac * lr0);
            }

            let rollout = buffer.collect(&mut env, agent, obs, done)?;
            global_step += batch_size;
            obs = rollout.next_obs;
            done = rollout.next_done;

            for ep in rollout.episodes.iter() {
                debug!("global_step={}, episodic_return={}", global_step, ep.ret);
            }
            if !rollout.episodes.is_empty() {
                recorder.store(Self::episode_record(&rollout.episodes));
            }

            let next_value = agent.value(&obs)?;
            let advantages = self.advantage.estimate(&buffer, &next_value)?;
            let batch = buffer.flatten(&advantages)?;
            let mut record = agent.opt_with_record(&batch)?;

            let sps = global_step as f32 / timer.elapsed().as_secs_f32();
            let ev = util::explained_variance(&batch.values, &batch.returns);
            record.insert("charts/learning_rate", Scalar(agent.learning_rate() as f32));
            record.insert("losses/explained_variance", Scalar(ev));
            record.insert("charts/SPS", Scalar(sps));

            info!(
                "update {}/{}, global_step={}, SPS={:.0}",
                update, num_updates, global_step, sps
            );
            recorder.store(record);
            recorder.flush(global_step as i64);
        }

        if let Some(model_dir) = self.model_dir.as_ref() {
            let model_dir = Path::new(model_dir).join("final");
            Self::save_model(agent, &model_dir)?;
        }

        info!("Starts evaluation of the trained model");
        agent.eval();
        let record = evaluator.evaluate(agent)?;
        info!(
            "eval/episodic_return={}",
            record.get_scalar("eval/episodic_return").unwrap_or(f32::NAN)
        );
        recorder.store(record.clone());
        recorder.flush(global_step as i64);

        Ok(record)
    }
}
