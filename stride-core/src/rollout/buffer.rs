use super::RolloutBatch;
use crate::{advantage::Advantages, error::StrideError, Agent, Env, EpisodeInfo};
use anyhow::Result;
use log::trace;
use ndarray::Array2;

/// State of the environments at the end of a segment, and the episodes finished in it.
#[derive(Clone, Debug)]
pub struct Rollout {
    /// Observations following the last step, seeding the next segment.
    pub next_obs: Array2<f32>,

    /// Done flags of the last step.
    pub next_done: Vec<f32>,

    /// Episodes finished during the segment.
    pub episodes: Vec<EpisodeInfo>,
}

/// Fixed-capacity storage of a trajectory segment.
pub struct RolloutBuffer {
    n_steps: usize,
    n_envs: usize,
    obs_dim: usize,
    act_dim: usize,
    obs: Vec<f32>,
    act: Vec<f32>,
    log_prob: Vec<f32>,
    rewards: Vec<f32>,
    dones: Vec<f32>,
    values: Vec<f32>,
}

fn check_shape(expected: &[usize], actual: &[usize]) -> Result<(), StrideError> {
    if expected != actual {
        return Err(StrideError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

impl RolloutBuffer {
    /// Allocates a buffer for `n_steps` steps of `n_envs` environments.
    pub fn new(n_steps: usize, n_envs: usize, obs_dim: usize, act_dim: usize) -> Self {
        let n = n_steps * n_envs;
        Self {
            n_steps,
            n_envs,
            obs_dim,
            act_dim,
            obs: vec![0.0; n * obs_dim],
            act: vec![0.0; n * act_dim],
            log_prob: vec![0.0; n],
            rewards: vec![0.0; n],
            dones: vec![0.0; n],
            values: vec![0.0; n],
        }
    }

    /// Number of steps in a segment.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Number of environments.
    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    /// Rewards, indexed by `t * n_envs + n`.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Value estimates, indexed by `t * n_envs + n`.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Done flags after the actions, indexed by `t * n_envs + n`.
    pub fn dones(&self) -> &[f32] {
        &self.dones
    }

    /// Collects a segment, overwriting the buffer.
    ///
    /// `obs` and `done` are the state the previous segment ended with, or the
    /// observation after a reset and zeros for the first segment. The agent is
    /// queried without gradient tracking.
    pub fn collect<E: Env, A: Agent>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        obs: Array2<f32>,
        done: Vec<f32>,
    ) -> Result<Rollout> {
        let (n, obs_dim, act_dim) = (self.n_envs, self.obs_dim, self.act_dim);
        check_shape(&[n, obs_dim], obs.shape())?;
        check_shape(&[n], &[done.len()])?;

        let mut obs = obs;
        let mut done = done;
        let mut episodes = vec![];

        for t in 0..self.n_steps {
            let ix = t * n;
            self.obs[ix * obs_dim..(ix + n) * obs_dim]
                .iter_mut()
                .zip(obs.iter())
                .for_each(|(d, s)| *d = *s);

            let out = agent.act(&obs)?;
            check_shape(&[n, act_dim], out.act.shape())?;
            check_shape(&[n, n], &[out.log_prob.len(), out.value.len()])?;
            self.act[ix * act_dim..(ix + n) * act_dim]
                .iter_mut()
                .zip(out.act.iter())
                .for_each(|(d, s)| *d = *s);
            self.log_prob[ix..ix + n].copy_from_slice(&out.log_prob);
            self.values[ix..ix + n].copy_from_slice(&out.value);

            let step = env.step(&out.act)?;
            check_shape(&[n], &[step.reward.len()])?;
            done = step.dones();
            self.rewards[ix..ix + n].copy_from_slice(&step.reward);
            self.dones[ix..ix + n].copy_from_slice(&done);
            obs = step.obs;

            for ep in step.episodes.into_iter() {
                trace!("episode finished: env {}, return {}", ep.env_ix, ep.ret);
                episodes.push(ep);
            }
        }

        Ok(Rollout {
            next_obs: obs,
            next_done: done,
            episodes,
        })
    }

    /// Copies the segment and its advantages into a flat batch.
    pub fn flatten(&self, advantages: &Advantages) -> Result<RolloutBatch> {
        let n = self.n_steps * self.n_envs;
        check_shape(&[n], &[advantages.advantages.len()])?;
        check_shape(&[n], &[advantages.returns.len()])?;

        Ok(RolloutBatch {
            obs: self.obs.clone(),
            act: self.act.clone(),
            log_prob: self.log_prob.clone(),
            advantages: advantages.advantages.clone(),
            returns: advantages.returns.clone(),
            values: self.values.clone(),
            obs_dim: self.obs_dim,
            act_dim: self.act_dim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        advantage::AdvantageConfig,
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
    };

    #[test]
    fn test_collect() -> Result<()> {
        let config = DummyEnvConfig::default().n_envs(2).episode_length(3);
        let mut env = DummyEnv::build(&config, 0)?;
        let mut agent = DummyAgent::new(config.obs_dim, config.act_dim);
        let mut buffer = RolloutBuffer::new(4, 2, config.obs_dim, config.act_dim);

        let obs = env.reset()?;
        let rollout = buffer.collect(&mut env, &mut agent, obs, vec![0.0; 2])?;

        // Episodes end after the third step of each environment
        assert_eq!(buffer.dones(), &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(rollout.next_done, vec![0.0, 0.0]);
        assert_eq!(rollout.episodes.len(), 2);
        assert_eq!(rollout.episodes[0].length, 3);
        assert_eq!(buffer.rewards().len(), 8);

        let adv = AdvantageConfig::default().estimate(&buffer, &[0.0, 0.0])?;
        let batch = buffer.flatten(&adv)?;
        assert_eq!(batch.len(), 8);
        assert_eq!(batch.obs.len(), 8 * config.obs_dim);
        Ok(())
    }

    #[test]
    fn test_collect_shape_mismatch() -> Result<()> {
        let config = DummyEnvConfig::default();
        let mut env = DummyEnv::build(&config, 0)?;
        let mut agent = DummyAgent::new(config.obs_dim, config.act_dim);
        let mut buffer = RolloutBuffer::new(4, 1, config.obs_dim + 1, config.act_dim);

        let obs = env.reset()?;
        let err = buffer.collect(&mut env, &mut agent, obs, vec![0.0]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StrideError>(),
            Some(StrideError::ShapeMismatch { .. })
        ));
        Ok(())
    }
}
