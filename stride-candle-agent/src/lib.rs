//! PPO agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`ppo::Ppo`] - the PPO agent, generic over the policy-value network
//! * [`actor_critic`] - policy-value networks with a Gaussian or a Beta policy
//! * [`dist`] - action distributions and the special functions they rely on
pub mod actor_critic;
pub mod dist;
pub mod init;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod ppo;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
