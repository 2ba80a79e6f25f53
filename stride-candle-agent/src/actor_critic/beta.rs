use super::{ActorCritic, ActorCriticConfig};
use crate::{
    dist::{BoundScaler, ScaledBeta},
    init::LayerInit,
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    util::softplus,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use stride_core::BoxSpace;

/// Configuration of [`BetaActorCritic`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BetaActorCriticConfig {
    /// Dimension of observations.
    pub obs_dim: usize,

    /// Lower bounds of actions.
    pub low: Vec<f32>,

    /// Upper bounds of actions.
    pub high: Vec<f32>,

    /// Hidden units of the actor and the critic.
    pub units: Vec<usize>,
}

impl Default for BetaActorCriticConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            low: vec![],
            high: vec![],
            units: vec![64, 64],
        }
    }
}

impl BetaActorCriticConfig {
    /// Sets hidden units.
    pub fn units(mut self, v: Vec<usize>) -> Self {
        self.units = v;
        self
    }
}

impl ActorCriticConfig for BetaActorCriticConfig {
    fn spaces(mut self, obs_space: &BoxSpace, act_space: &BoxSpace) -> Self {
        self.obs_dim = obs_space.dim();
        self.low = act_space.low.clone();
        self.high = act_space.high.clone();
        self
    }
}

/// Actor-critic with a Beta policy on a bounded action space.
///
/// Two MLPs give `alpha = softplus(x) + 1` and `beta = softplus(y) + 1`, so that the
/// density is unimodal. Samples of `Beta(alpha, beta)` are mapped affinely to
/// `[low, high]`.
pub struct BetaActorCritic {
    critic: Mlp,
    actor_alpha: Mlp,
    actor_beta: Mlp,
    scaler: BoundScaler,
}

impl BetaActorCritic {
    fn concentration(mlp: &Mlp, obs: &Tensor) -> Result<Tensor> {
        Ok((softplus(&mlp.forward(obs)?)? + 1.0)?)
    }
}

impl ActorCritic for BetaActorCritic {
    type Config = BetaActorCriticConfig;
    type Dist = ScaledBeta;

    fn build(
        varmap: &VarMap,
        config: Self::Config,
        device: &Device,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if config.low.len() != config.high.len() {
            anyhow::bail!("bounds of actions have different lengths");
        }
        let act_dim = config.low.len();
        let critic_config = MlpConfig::new(config.obs_dim, config.units.clone(), 1, false)
            .out_init(LayerInit::Orthogonal { gain: 1.0 });
        let actor_config = MlpConfig::new(config.obs_dim, config.units.clone(), act_dim, false)
            .init(LayerInit::XavierUniform)
            .out_init(LayerInit::XavierUniform);
        Mlp::init_params(varmap, "critic", &critic_config, device, rng)?;
        Mlp::init_params(varmap, "actor_alpha", &actor_config, device, rng)?;
        Mlp::init_params(varmap, "actor_beta", &actor_config, device, rng)?;

        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        Ok(Self {
            critic: Mlp::build(vb.pp("critic"), critic_config)?,
            actor_alpha: Mlp::build(vb.pp("actor_alpha"), actor_config.clone())?,
            actor_beta: Mlp::build(vb.pp("actor_beta"), actor_config)?,
            scaler: BoundScaler::new(&config.low, &config.high, device)?,
        })
    }

    fn dist(&self, obs: &Tensor) -> Result<Self::Dist> {
        let alpha = Self::concentration(&self.actor_alpha, obs)?;
        let beta = Self::concentration(&self.actor_beta, obs)?;
        ScaledBeta::new(alpha, beta, self.scaler.clone())
    }

    fn value(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.critic.forward(obs)?.squeeze(D::Minus1)?)
    }
}
