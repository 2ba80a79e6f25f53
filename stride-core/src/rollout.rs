//! On-policy trajectory segments.
//!
//! A [`RolloutBuffer`] holds one segment of `n_steps` steps of `n_envs` environments
//! stepped in lock step. Row `(t, n)` is the state of environment `n` before the
//! action at step `t`, and `dones[(t, n)]` tells if the episode ended after that
//! action. [`RolloutBuffer::flatten`] copies the segment together with its
//! advantages into a [`RolloutBatch`] of `n_steps * n_envs` samples.
mod batch;
mod buffer;
pub use batch::RolloutBatch;
pub use buffer::{Rollout, RolloutBuffer};
