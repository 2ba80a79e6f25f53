use crate::init::LayerInit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
    pub(super) activation_out: bool,
    pub(super) init: LayerInit,
    pub(super) out_init: LayerInit,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `activation_out` - If `true`, activation function is added in the final layer.
    ///
    /// Weights are initialized orthogonally with gain `sqrt(2)`.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize, activation_out: bool) -> Self {
        let init = LayerInit::Orthogonal {
            gain: 2f64.sqrt(),
        };
        Self {
            in_dim,
            units,
            out_dim,
            activation_out,
            init,
            out_init: init,
        }
    }

    /// Sets the initializer of the hidden layers.
    pub fn init(mut self, v: LayerInit) -> Self {
        self.init = v;
        self
    }

    /// Sets the initializer of the output layer.
    pub fn out_init(mut self, v: LayerInit) -> Self {
        self.out_init = v;
        self
    }

    /// Returns the output dimension.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Pairs of input and output dimensions of the layers.
    pub(super) fn in_out_pairs(&self) -> Vec<(usize, usize)> {
        let mut dims = vec![self.in_dim];
        dims.extend(self.units.iter().copied());
        dims.push(self.out_dim);
        dims.windows(2).map(|w| (w[0], w[1])).collect()
    }
}
