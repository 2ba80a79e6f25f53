//! Vector environment in Python.
use super::GymEnvConfig;
use anyhow::Result;
use log::{info, trace, warn};
use ndarray::Array2;
use pyo3::{
    types::{IntoPyDict, PyModule},
    PyObject, Python,
};
use stride_core::{error::StrideError, BoxSpace, Env, EpisodeInfo, Step};

const MODULE: &str = include_str!("stride_gym.py");

type PyStep = (Vec<f32>, Vec<f32>, Vec<i8>, Vec<i8>, Vec<(usize, f32, usize)>);

/// A `gymnasium.vector.SyncVectorEnv` with flattened observations.
///
/// Sub-environments reset automatically at the end of episodes. The returns and
/// lengths of finished episodes are taken from `RecordEpisodeStatistics`.
pub struct GymVecEnv {
    env: PyObject,
    config: GymEnvConfig,
    seed: i64,
    obs_space: BoxSpace,
    act_space: BoxSpace,
}

impl GymVecEnv {
    /// Closes the sub-environments.
    pub fn close(&self) {
        Python::with_gil(|py| {
            if let Err(e) = self.env.call_method0(py, "close") {
                warn!("Failed to close {}: {}", self.config.name, e);
            }
        })
    }

    fn reset_with_seed(&mut self, seed: i64) -> Result<Array2<f32>> {
        trace!("GymVecEnv::reset_with_seed({})", seed);
        let seeds = self.config.seeds(seed);
        let obs: Vec<f32> = Python::with_gil(|py| -> Result<Vec<f32>> {
            Ok(self.env.call_method1(py, "reset", (seeds,))?.extract(py)?)
        })?;
        self.to_array2(obs)
    }

    fn to_array2(&self, obs: Vec<f32>) -> Result<Array2<f32>> {
        let shape = (self.config.n_envs, self.obs_space.dim());
        Ok(Array2::from_shape_vec(shape, obs)?)
    }
}

impl Env for GymVecEnv {
    type Config = GymEnvConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let (env, spaces) = Python::with_gil(|py| -> Result<_> {
            // sys.argv can be empty depending on the interpreter
            let locals = [("sys", py.import("sys")?)].into_py_dict(py);
            py.eval("sys.argv.insert(0, 'GymVecEnv')", None, Some(locals))?;
            let ver = py.eval("sys.version", None, Some(locals))?;
            info!("Python version = {}", ver);

            let module = PyModule::from_code(py, MODULE, "stride_gym.py", "stride_gym")?;
            let env = module
                .getattr("VecEnv")?
                .call1((config.name.as_str(), config.n_envs))?;
            let spaces: (Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>) =
                env.call_method0("spaces")?.extract()?;
            let env: PyObject = env.into();
            Ok((env, spaces))
        })?;
        let (obs_low, obs_high, act_low, act_high) = spaces;
        info!(
            "Build {} x {}: obs_dim = {}, act_dim = {}",
            config.n_envs,
            config.name,
            obs_low.len(),
            act_low.len()
        );

        Ok(Self {
            env,
            config: config.clone(),
            seed,
            obs_space: BoxSpace::new(obs_low, obs_high),
            act_space: BoxSpace::new(act_low, act_high),
        })
    }

    fn n_envs(&self) -> usize {
        self.config.n_envs
    }

    fn observation_space(&self) -> BoxSpace {
        self.obs_space.clone()
    }

    fn action_space(&self) -> BoxSpace {
        self.act_space.clone()
    }

    fn reset(&mut self) -> Result<Array2<f32>> {
        self.reset_with_seed(self.seed)
    }

    /// Reseeds the environments with `seed + ix * n_envs` before resetting them.
    fn reset_with_index(&mut self, ix: usize) -> Result<Array2<f32>> {
        self.reset_with_seed(self.seed + (ix * self.config.n_envs) as i64)
    }

    fn step(&mut self, act: &Array2<f32>) -> Result<Step> {
        let expected = [self.config.n_envs, self.act_space.dim()];
        if act.shape() != expected {
            return Err(StrideError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: act.shape().to_vec(),
            }
            .into());
        }
        let act: Vec<f32> = act.iter().copied().collect();

        let (obs, reward, is_terminated, is_truncated, episodes) =
            Python::with_gil(|py| -> Result<PyStep> {
                Ok(self.env.call_method1(py, "step", (act,))?.extract(py)?)
            })?;
        let episodes = episodes
            .into_iter()
            .map(|(env_ix, ret, length)| EpisodeInfo { env_ix, ret, length })
            .collect();

        Ok(Step::new(
            self.to_array2(obs)?,
            reward,
            is_terminated,
            is_truncated,
            episodes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires gymnasium"]
    fn test_pendulum() -> Result<()> {
        let config = GymEnvConfig::default().name("Pendulum-v1").n_envs(2);
        let mut env = GymVecEnv::build(&config, 0)?;
        assert_eq!(env.observation_space().dim(), 3);
        assert_eq!(env.action_space().high, vec![2.0]);

        let obs = env.reset()?;
        assert_eq!(obs.shape(), &[2, 3]);
        assert_eq!(obs, env.reset_with_index(0)?);

        let act = Array2::zeros((2, 1));
        let mut episodes = vec![];
        for t in 0..201 {
            let step = env.step(&act)?;
            assert_eq!(step.is_done(0), t == 199);
            // Pendulum rewards are negative unless the pole is upright at rest
            assert!(step.reward.iter().all(|r| *r < 0.0));
            episodes.extend(step.episodes);
        }
        assert_eq!(episodes.len(), 2);
        assert!(episodes.iter().all(|ep| ep.length == 200));
        env.close();
        Ok(())
    }

    #[test]
    #[ignore = "requires numpy"]
    fn test_episodes_of_both_info_layouts() -> Result<()> {
        Python::with_gil(|py| -> Result<()> {
            let module = PyModule::from_code(py, MODULE, "stride_gym.py", "stride_gym")?;
            let locals = [("m", module)].into_py_dict(py);

            // Per-env dicts, gymnasium <1.0
            let eps: Vec<(usize, f32, usize)> = py
                .eval(
                    "m.episodes({'final_info': m.np.array([None, {'episode': \
                     {'r': m.np.array([-3.0]), 'l': m.np.array([7])}}], dtype=object)}, 2)",
                    None,
                    Some(locals),
                )?
                .extract()?;
            assert_eq!(eps, vec![(1, -3.0, 7)]);

            // Batched arrays with masks, gymnasium >=1.1
            let eps: Vec<(usize, f32, usize)> = py
                .eval(
                    "m.episodes({'final_info': {'episode': {'r': m.np.array([0.0, -12.5]), \
                     'l': m.np.array([0, 200])}, '_episode': m.np.array([False, True])}}, 2)",
                    None,
                    Some(locals),
                )?
                .extract()?;
            assert_eq!(eps, vec![(1, -12.5, 200)]);

            let eps: Vec<(usize, f32, usize)> =
                py.eval("m.episodes({}, 2)", None, Some(locals))?.extract()?;
            assert!(eps.is_empty());
            Ok(())
        })
    }
}
