//! Optimizers.
use anyhow::Result;
use candle_core::{backprop::GradStore, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer, i.e. AdamW without weight decay.
    Adam {
        /// Learning rate.
        lr: f64,

        /// Term added to the denominator.
        #[serde(default = "default_eps")]
        eps: f64,
    },
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

impl OptimizerConfig {
    /// Constructs an optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let params = match &self {
            OptimizerConfig::Adam { lr, eps } => ParamsAdamW {
                lr: *lr,
                eps: *eps,
                weight_decay: 0.0,
                ..ParamsAdamW::default()
            },
        };
        Ok(Optimizer(AdamW::new(vars, params)?))
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam { lr: _, eps } => Self::Adam { lr, eps },
        }
    }

    /// Returns the learning rate.
    pub fn get_learning_rate(&self) -> f64 {
        match self {
            Self::Adam { lr, .. } => *lr,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: 3e-4,
            eps: 1e-5,
        }
    }
}

/// Optimizer.
///
/// This is a thin wrapper of [`candle_nn::AdamW`].
pub struct Optimizer(AdamW);

impl Optimizer {
    /// Updates the variables with the given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        Ok(self.0.step(grads)?)
    }

    /// Returns the current learning rate.
    pub fn learning_rate(&self) -> f64 {
        self.0.learning_rate()
    }

    /// Sets the learning rate.
    pub fn set_learning_rate(&mut self, lr: f64) {
        self.0.set_learning_rate(lr)
    }
}
