#![warn(missing_docs)]
//! Vectorized classic control environments implemented in Rust.
//!
//! * [`Pendulum`] - the inverted pendulum swing-up task, compatible with `Pendulum-v1`
//! * [`Normalized`] - a wrapper clipping actions and normalizing observations and rewards
//!   of any [`Env`](stride_core::Env)
mod pendulum;
mod running_stats;
mod wrapper;
pub use pendulum::{Pendulum, PendulumConfig};
pub use running_stats::RunningMeanStd;
pub use wrapper::{Normalized, NormalizedConfig};
