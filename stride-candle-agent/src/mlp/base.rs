use super::MlpConfig;
use crate::{init::init_linear, model::SubModel1};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder, VarMap};
use rand::Rng;

/// Multilayer perceptron with tanh activation function.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Inserts initial parameters of an MLP into `varmap`.
    ///
    /// `prefix` must be the prefix of the [`VarBuilder`] the MLP is built with later.
    pub fn init_params<R: Rng>(
        varmap: &VarMap,
        prefix: &str,
        config: &MlpConfig,
        device: &Device,
        rng: &mut R,
    ) -> Result<()> {
        let pairs = config.in_out_pairs();
        let n_layers = pairs.len();
        for (i, &(in_dim, out_dim)) in pairs.iter().enumerate() {
            let init = match i == n_layers - 1 {
                true => &config.out_init,
                false => &config.init,
            };
            let name = format!("{}.ln{}", prefix, i);
            init_linear(varmap, &name, in_dim, out_dim, init, device, rng)?;
        }
        Ok(())
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let layers = config
            .in_out_pairs()
            .iter()
            .enumerate()
            .map(|(i, &(in_dim, out_dim))| linear(in_dim, out_dim, vb.pp(format!("ln{}", i))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let n_layers = self.layers.len();
        let mut xs = xs.to_device(&self.device)?;

        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if i < n_layers - 1 || self.config.activation_out {
                xs = xs.tanh()?;
            }
        }

        Ok(xs)
    }
}
