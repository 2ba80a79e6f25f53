#![warn(missing_docs)]
//! Core components for on-policy reinforcement learning with vectorized environments.
//!
//! This crate defines the interfaces between environments and agents ([`Env`], [`Policy`],
//! [`Agent`]), the storage of on-policy trajectory segments ([`RolloutBuffer`]),
//! advantage estimation ([`advantage`]), minibatch scheduling ([`MinibatchSampler`]),
//! and the training loop ([`Trainer`]) together with evaluation ([`Evaluator`]).
pub mod advantage;
pub mod dummy;
pub mod error;
pub mod record;
pub mod util;

mod base;
pub use base::{ActOutput, Agent, BoxSpace, Env, EpisodeInfo, Policy, SeedPolicy, Step};

mod minibatch;
pub use minibatch::MinibatchSampler;

mod rollout;
pub use rollout::{Rollout, RolloutBatch, RolloutBuffer};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};
