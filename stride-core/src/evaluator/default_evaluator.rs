//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    util, Env, Policy,
};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes and reports their returns.
///
/// Episodes are played on the first sub-environment of `E`. The `ix`-th episode
/// starts from [`Env::reset_with_index`]`(ix)`, so evaluation is reproducible.
/// The return of an episode is the one reported by the environment in
/// [`EpisodeInfo`](crate::EpisodeInfo), i.e. before reward normalization.
///
/// The returned record has the keys
/// * `eval/episodic_return` - mean return over the episodes
/// * `eval/episodic_returns` - returns of the episodes
/// * `eval/episodic_length` - mean episode length
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy>(&mut self, policy: &mut P) -> Result<Record> {
        let mut returns = Vec::with_capacity(self.n_episodes);
        let mut lengths = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;
            let mut len = 0;

            loop {
                let act = policy.sample(&prev_obs)?;
                let step = self.env.step(&act)?;
                r_total += step.reward[0];
                len += 1;
                if step.is_done(0) {
                    if let Some(ep) = step.episodes.iter().find(|ep| ep.env_ix == 0) {
                        r_total = ep.ret;
                        len = ep.length;
                    }
                    break;
                }
                prev_obs = step.obs;
            }

            info!("eval episode {}: return {:.3}, length {}", ix, r_total, len);
            returns.push(r_total);
            lengths.push(len as f32);
        }

        Ok(Record::from_slice(&[
            ("eval/episodic_return", RecordValue::Scalar(util::mean(&returns))),
            ("eval/episodic_returns", RecordValue::Array1(returns)),
            ("eval/episodic_length", RecordValue::Scalar(util::mean(&lengths))),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    /// * `n_episodes` - Number of episodes to run during evaluation
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyAgent, DummyEnv, DummyEnvConfig};

    #[test]
    fn test_default_evaluator() -> Result<()> {
        let config = DummyEnvConfig::default().episode_length(4).reward(0.5);
        let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&config, 0, 3)?;
        let mut agent = DummyAgent::new(config.obs_dim, config.act_dim);
        let record = evaluator.evaluate(&mut agent)?;

        assert_eq!(record.get_scalar("eval/episodic_return")?, 2.0);
        assert_eq!(record.get_scalar("eval/episodic_length")?, 4.0);
        assert_eq!(record.get_array1("eval/episodic_returns")?, vec![2.0; 3]);
        Ok(())
    }
}
