//! Proximal policy optimization (PPO) agent.
//!
//! [`Ppo`] optimizes the clipped surrogate objective on flattened on-policy batches
//! given by [`Trainer`](stride_core::Trainer). The policy-value network is any
//! [`ActorCritic`](crate::actor_critic::ActorCritic), e.g. with a Gaussian or a Beta
//! policy.
mod base;
mod config;
pub use base::{Ppo, PpoLosses};
pub use config::PpoConfig;
