//! Policy-value networks.
mod beta;
mod gaussian;
use crate::dist::ActionDist;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use rand::rngs::StdRng;
use serde::{de::DeserializeOwned, Serialize};
use stride_core::BoxSpace;

pub use beta::{BetaActorCritic, BetaActorCriticConfig};
pub use gaussian::{GaussianActorCritic, GaussianActorCriticConfig};

/// Configuration of an [`ActorCritic`] that depends on the spaces of an environment.
pub trait ActorCriticConfig:
    Clone + Serialize + DeserializeOwned + std::fmt::Debug + PartialEq
{
    /// Sets the dimensions, and the bounds if used, of observations and actions.
    fn spaces(self, obs_space: &BoxSpace, act_space: &BoxSpace) -> Self;
}

/// A network giving an action distribution and a state value for observations.
pub trait ActorCritic {
    /// Configuration.
    type Config: ActorCriticConfig;

    /// Action distribution.
    type Dist: ActionDist;

    /// Builds the model, inserting its parameters into `varmap`.
    ///
    /// Parameters are initialized with `rng`.
    fn build(varmap: &VarMap, config: Self::Config, device: &Device, rng: &mut StdRng)
        -> Result<Self>
    where
        Self: Sized;

    /// Action distribution given observations of shape `(batch_size, obs_dim)`.
    fn dist(&self, obs: &Tensor) -> Result<Self::Dist>;

    /// State values with shape `(batch_size,)`.
    fn value(&self, obs: &Tensor) -> Result<Tensor>;

    /// Returns `(action, log_prob, entropy, value)`.
    ///
    /// If `act` is `None`, actions are sampled; otherwise the log probabilities of
    /// the given actions are evaluated under the current parameters.
    fn act(
        &self,
        obs: &Tensor,
        act: Option<&Tensor>,
        rng: &mut StdRng,
    ) -> Result<(Tensor, Tensor, Tensor, Tensor)> {
        let dist = self.dist(obs)?;
        let act = match act {
            Some(act) => act.clone(),
            None => dist.sample(rng)?,
        };
        let log_prob = dist.log_prob(&act)?;
        let entropy = dist.entropy()?;
        let value = self.value(obs)?;
        Ok((act, log_prob, entropy, value))
    }
}
