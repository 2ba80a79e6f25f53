//! Initialization of the parameters of linear layers.
//!
//! candle has no orthogonal initializer, so weights are generated here with a seeded
//! random number generator and inserted into a [`VarMap`] before the layers are built.
//! [`candle_nn::linear`] then picks the existing variables up by name.
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor, Var};
use candle_nn::VarMap;
use rand::{distributions::Uniform, Rng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Initializer of the weight matrix of a linear layer. Biases are set to zero.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum LayerInit {
    /// (Semi-)orthogonal matrix scaled by `gain`.
    Orthogonal {
        /// Scale of the matrix.
        gain: f64,
    },

    /// Uniform distribution on `[-a, a]` with `a = sqrt(6 / (fan_in + fan_out))`.
    XavierUniform,
}

/// Returns a `rows x cols` matrix, in row-major order, whose rows (if `rows <= cols`)
/// or columns are orthonormal, scaled by `gain`.
pub fn orthogonal<R: Rng>(rows: usize, cols: usize, gain: f64, rng: &mut R) -> Vec<f32> {
    let (n, dim) = if rows <= cols { (rows, cols) } else { (cols, rows) };
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(n);

    while basis.len() < n {
        let mut v: Vec<f64> = (0..dim).map(|_| rng.sample(StandardNormal)).collect();
        // Gram-Schmidt
        for u in basis.iter() {
            let dot: f64 = v.iter().zip(u.iter()).map(|(a, b)| a * b).sum();
            v.iter_mut().zip(u.iter()).for_each(|(a, b)| *a -= dot * b);
        }
        let norm = v.iter().map(|a| a * a).sum::<f64>().sqrt();
        if norm < 1e-6 {
            continue;
        }
        v.iter_mut().for_each(|a| *a /= norm);
        basis.push(v);
    }

    let mut w = vec![0f32; rows * cols];
    for i in 0..rows {
        for j in 0..cols {
            let x = match rows <= cols {
                true => basis[i][j],
                false => basis[j][i],
            };
            w[i * cols + j] = (gain * x) as f32;
        }
    }
    w
}

/// Returns a `fan_out x fan_in` matrix sampled with Xavier uniform initialization.
pub fn xavier_uniform<R: Rng>(fan_out: usize, fan_in: usize, rng: &mut R) -> Vec<f32> {
    let a = (6.0 / (fan_in + fan_out) as f64).sqrt() as f32;
    let dist = Uniform::new_inclusive(-a, a);
    (0..fan_out * fan_in).map(|_| rng.sample(dist)).collect()
}

/// Inserts the weight and the bias of a linear layer named `prefix` into `varmap`.
///
/// The variables are `{prefix}.weight` with shape `(out_dim, in_dim)` and `{prefix}.bias`
/// with shape `(out_dim,)`, as expected by [`candle_nn::linear`].
pub fn init_linear<R: Rng>(
    varmap: &VarMap,
    prefix: &str,
    in_dim: usize,
    out_dim: usize,
    init: &LayerInit,
    device: &Device,
    rng: &mut R,
) -> Result<()> {
    let w = match init {
        LayerInit::Orthogonal { gain } => orthogonal(out_dim, in_dim, *gain, rng),
        LayerInit::XavierUniform => xavier_uniform(out_dim, in_dim, rng),
    };
    let w = Tensor::from_vec(w, (out_dim, in_dim), device)?;
    let b = Tensor::zeros(out_dim, candle_core::DType::F32, device)?;

    let mut data = varmap.data().lock().map_err(|e| anyhow!("{}", e))?;
    data.insert(format!("{}.weight", prefix), Var::from_tensor(&w)?);
    data.insert(format!("{}.bias", prefix), Var::from_tensor(&b)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn gram(w: &[f32], rows: usize, cols: usize, by_rows: bool) -> Vec<f32> {
        let n = if by_rows { rows } else { cols };
        let at = |i: usize, k: usize| match by_rows {
            true => w[i * cols + k],
            false => w[k * cols + i],
        };
        let len = if by_rows { cols } else { rows };
        let mut g = vec![0f32; n * n];
        for i in 0..n {
            for j in 0..n {
                g[i * n + j] = (0..len).map(|k| at(i, k) * at(j, k)).sum();
            }
        }
        g
    }

    #[test]
    fn test_orthogonal() {
        let mut rng = StdRng::seed_from_u64(0);
        let gain = 2f64.sqrt();

        // Wide matrix: orthogonal rows
        let w = orthogonal(3, 5, gain, &mut rng);
        let g = gram(&w, 3, 5, true);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 2.0 } else { 0.0 };
                assert!((g[i * 3 + j] - expected).abs() < 1e-5);
            }
        }

        // Tall matrix: orthogonal columns
        let w = orthogonal(6, 2, 1.0, &mut rng);
        let g = gram(&w, 6, 2, false);
        assert!((g[0] - 1.0).abs() < 1e-5 && (g[3] - 1.0).abs() < 1e-5);
        assert!(g[1].abs() < 1e-5);
    }

    #[test]
    fn test_xavier_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let w = xavier_uniform(64, 17, &mut rng);
        let a = (6.0f32 / 81.0).sqrt();
        assert!(w.iter().all(|x| x.abs() <= a));
    }

    #[test]
    fn test_init_linear() -> Result<()> {
        let varmap = VarMap::new();
        let mut rng = StdRng::seed_from_u64(0);
        let init = LayerInit::Orthogonal { gain: 1.0 };
        init_linear(&varmap, "critic.ln0", 4, 8, &init, &Device::Cpu, &mut rng)?;

        let data = varmap.data().lock().unwrap();
        assert_eq!(data["critic.ln0.weight"].as_tensor().dims(), &[8, 4]);
        assert_eq!(
            data["critic.ln0.bias"].as_tensor().to_vec1::<f32>()?,
            vec![0.0; 8]
        );
        Ok(())
    }
}
