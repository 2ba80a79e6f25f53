//! Action distributions.
//!
//! Distributions are batched: parameters have shape `(batch_size, act_dim)` and
//! log probabilities and entropies are summed over the action dimensions, giving
//! tensors of shape `(batch_size,)`.
mod beta;
mod gaussian;
pub mod special;
use anyhow::Result;
use candle_core::Tensor;
use rand::Rng;

pub use beta::{BoundScaler, ScaledBeta};
pub use gaussian::DiagGaussian;

/// Interface of action distributions.
pub trait ActionDist {
    /// Samples actions. The returned tensor does not track gradients.
    fn sample<R: Rng>(&self, rng: &mut R) -> Result<Tensor>;

    /// Log probabilities of the given actions.
    fn log_prob(&self, act: &Tensor) -> Result<Tensor>;

    /// Entropy.
    fn entropy(&self) -> Result<Tensor>;

    /// Mean of the distribution, used as the deterministic action.
    fn mean(&self) -> Result<Tensor>;
}
