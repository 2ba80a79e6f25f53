#![warn(missing_docs)]
//! Vector environments of [gymnasium](https://gymnasium.farama.org) for stride.
//!
//! [`GymVecEnv`] runs a `gymnasium.vector.SyncVectorEnv` in the embedded Python
//! interpreter. Observations are flattened and episode statistics are recorded on the
//! Python side; normalization is left to
//! [`Normalized`](https://docs.rs/stride-classic-env) wrappers on the Rust side.
mod base;
mod config;
pub use base::GymVecEnv;
pub use config::GymEnvConfig;
