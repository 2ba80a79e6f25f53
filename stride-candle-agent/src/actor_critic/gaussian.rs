use super::{ActorCritic, ActorCriticConfig};
use crate::{
    dist::DiagGaussian,
    init::LayerInit,
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Init, VarBuilder, VarMap};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use stride_core::BoxSpace;

/// Configuration of [`GaussianActorCritic`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GaussianActorCriticConfig {
    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Hidden units of the actor and the critic.
    pub units: Vec<usize>,
}

impl Default for GaussianActorCriticConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            act_dim: 0,
            units: vec![64, 64],
        }
    }
}

impl GaussianActorCriticConfig {
    /// Sets hidden units.
    pub fn units(mut self, v: Vec<usize>) -> Self {
        self.units = v;
        self
    }
}

impl ActorCriticConfig for GaussianActorCriticConfig {
    fn spaces(mut self, obs_space: &BoxSpace, act_space: &BoxSpace) -> Self {
        self.obs_dim = obs_space.dim();
        self.act_dim = act_space.dim();
        self
    }
}

fn critic_config(obs_dim: usize, units: &[usize]) -> MlpConfig {
    MlpConfig::new(obs_dim, units.to_vec(), 1, false).out_init(LayerInit::Orthogonal { gain: 1.0 })
}

/// Actor-critic with a Gaussian policy.
///
/// The mean of the policy is given by an MLP and the log standard deviation is a
/// state-independent parameter, initialized to zero. Actions are not bounded.
pub struct GaussianActorCritic {
    critic: Mlp,
    actor_mean: Mlp,
    actor_logstd: Tensor,
}

impl ActorCritic for GaussianActorCritic {
    type Config = GaussianActorCriticConfig;
    type Dist = DiagGaussian;

    fn build(
        varmap: &VarMap,
        config: Self::Config,
        device: &Device,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let critic_config = critic_config(config.obs_dim, &config.units);
        let actor_config = MlpConfig::new(config.obs_dim, config.units.clone(), config.act_dim, false)
            .out_init(LayerInit::Orthogonal { gain: 0.01 });
        Mlp::init_params(varmap, "critic", &critic_config, device, rng)?;
        Mlp::init_params(varmap, "actor_mean", &actor_config, device, rng)?;

        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        let critic = Mlp::build(vb.pp("critic"), critic_config)?;
        let actor_mean = Mlp::build(vb.pp("actor_mean"), actor_config)?;
        let actor_logstd = vb.get_with_hints((1, config.act_dim), "actor_logstd", Init::Const(0.0))?;

        Ok(Self {
            critic,
            actor_mean,
            actor_logstd,
        })
    }

    fn dist(&self, obs: &Tensor) -> Result<Self::Dist> {
        let mean = self.actor_mean.forward(obs)?;
        DiagGaussian::new(mean, &self.actor_logstd)
    }

    fn value(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.critic.forward(obs)?.squeeze(D::Minus1)?)
    }
}
