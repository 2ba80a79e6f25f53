use super::{
    special::{digamma_t, lgamma_t},
    ActionDist,
};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use log::error;
use rand::Rng;
use rand_distr::{Beta, Distribution};
use stride_core::error::StrideError;

/// Arguments of the log density are clamped into `[EPS, 1 - EPS]`.
const EPS: f64 = 1e-6;

/// Affine map between `[0, 1]^D` and the box `[low, high]`.
#[derive(Clone, Debug)]
pub struct BoundScaler {
    low: Tensor,
    range: Tensor,
}

impl BoundScaler {
    /// Constructs a scaler for the given bounds.
    pub fn new(low: &[f32], high: &[f32], device: &Device) -> Result<Self> {
        let range: Vec<f32> = high.iter().zip(low.iter()).map(|(h, l)| h - l).collect();
        Ok(Self {
            low: Tensor::from_slice(low, (1, low.len()), device)?,
            range: Tensor::from_vec(range, (1, high.len()), device)?,
        })
    }

    /// `x * (high - low) + low`.
    pub fn scale(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(xs.broadcast_mul(&self.range)?.broadcast_add(&self.low)?)
    }

    /// `(a - low) / (high - low)`.
    pub fn inverse_scale(&self, act: &Tensor) -> Result<Tensor> {
        Ok(act.broadcast_sub(&self.low)?.broadcast_div(&self.range)?)
    }
}

fn check_finite(name: &str, xs: &Tensor) -> Result<()> {
    let values: Vec<(usize, f32)> = xs
        .flatten_all()?
        .to_vec1::<f32>()?
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_finite())
        .collect();

    if values.is_empty() {
        Ok(())
    } else {
        error!("Non-finite {} of the Beta distribution: {:?}", name, values);
        Err(StrideError::NonFiniteParameter {
            name: name.to_string(),
            values,
        }
        .into())
    }
}

/// Beta distribution rescaled to the box `[low, high]`.
pub struct ScaledBeta {
    alpha: Tensor,
    beta: Tensor,
    scaler: BoundScaler,
}

impl ScaledBeta {
    /// Constructs a distribution.
    ///
    /// Fails with [`StrideError::NonFiniteParameter`] if `alpha` or `beta` contains
    /// NaN or infinity.
    pub fn new(alpha: Tensor, beta: Tensor, scaler: BoundScaler) -> Result<Self> {
        check_finite("alpha", &alpha)?;
        check_finite("beta", &beta)?;
        Ok(Self {
            alpha,
            beta,
            scaler,
        })
    }

    fn ln_beta_fn(&self) -> Result<Tensor> {
        let ab = (&self.alpha + &self.beta)?;
        Ok(((lgamma_t(&self.alpha)? + lgamma_t(&self.beta)?)? - lgamma_t(&ab)?)?)
    }
}

impl ActionDist for ScaledBeta {
    fn sample<R: Rng>(&self, rng: &mut R) -> Result<Tensor> {
        let alpha: Vec<f32> = self.alpha.flatten_all()?.to_vec1()?;
        let beta: Vec<f32> = self.beta.flatten_all()?.to_vec1()?;
        let xs = alpha
            .iter()
            .zip(beta.iter())
            .map(|(a, b)| Ok(Beta::new(*a, *b)?.sample(rng)))
            .collect::<Result<Vec<f32>>>()?;
        let xs = Tensor::from_vec(xs, self.alpha.shape(), self.alpha.device())?;
        Ok(self.scaler.scale(&xs)?.detach())
    }

    fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        let xs = self.scaler.inverse_scale(act)?.clamp(EPS, 1.0 - EPS)?;
        let lp = ((&self.alpha - 1.0)? * xs.log()?)?;
        let lp = (lp + ((&self.beta - 1.0)? * xs.affine(-1.0, 1.0)?.log()?)?)?;
        Ok((lp - self.ln_beta_fn()?)?.sum(D::Minus1)?)
    }

    fn entropy(&self) -> Result<Tensor> {
        let ab = (&self.alpha + &self.beta)?;
        let ent = (self.ln_beta_fn()? - ((&self.alpha - 1.0)? * digamma_t(&self.alpha)?)?)?;
        let ent = (ent - ((&self.beta - 1.0)? * digamma_t(&self.beta)?)?)?;
        let ent = (ent + ((&ab - 2.0)? * digamma_t(&ab)?)?)?;
        Ok(ent.sum(D::Minus1)?)
    }

    fn mean(&self) -> Result<Tensor> {
        let xs = (&self.alpha / (&self.alpha + &self.beta)?)?;
        self.scaler.scale(&xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn beta_dist(alpha: &[f32], beta: &[f32], low: &[f32], high: &[f32]) -> Result<ScaledBeta> {
        let device = Device::Cpu;
        let n = alpha.len();
        ScaledBeta::new(
            Tensor::from_slice(alpha, (1, n), &device)?,
            Tensor::from_slice(beta, (1, n), &device)?,
            BoundScaler::new(low, high, &device)?,
        )
    }

    #[test]
    fn test_entropy_and_log_prob() -> Result<()> {
        let dist = beta_dist(&[2.0], &[2.0], &[0.0], &[1.0])?;
        let ent = dist.entropy()?.to_vec1::<f32>()?;
        assert!((ent[0] + 0.125_093).abs() < 1e-5);

        let act = Tensor::new(&[[0.5f32]], &Device::Cpu)?;
        let lp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        assert!((lp[0] - 1.5f32.ln()).abs() < 1e-5);

        // The density on the box omits the constant Jacobian of the affine map
        let dist = beta_dist(&[2.0, 2.0], &[2.0, 2.0], &[-0.4, -0.4], &[0.4, 0.4])?;
        let act = Tensor::new(&[[0f32, 0.0]], &Device::Cpu)?;
        let lp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        assert!((lp[0] - 2.0 * 1.5f32.ln()).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_log_prob_at_bounds_is_finite() -> Result<()> {
        let dist = beta_dist(&[3.0, 1.5], &[1.2, 4.0], &[-1.0, 0.0], &[1.0, 2.0])?;
        let act = Tensor::new(&[[-1f32, 2.0]], &Device::Cpu)?;
        let lp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        assert!(lp[0].is_finite());
        Ok(())
    }

    #[test]
    fn test_scale_inverse() -> Result<()> {
        let device = Device::Cpu;
        let scaler = BoundScaler::new(&[-0.4, 0.0, -2.0], &[0.4, 1.0, 3.0], &device)?;
        let xs = Tensor::new(
            &[[0f32, 0.25, 1.0], [0.5, 0.75, 0.1], [1.0, 0.0, 0.9]],
            &device,
        )?;
        let ys = scaler.inverse_scale(&scaler.scale(&xs)?)?;
        let diff = (ys - &xs)?.abs()?.flatten_all()?.max(0)?.to_scalar::<f32>()?;
        assert!(diff < 1e-6);

        let a = scaler.scale(&xs)?.to_vec2::<f32>()?;
        assert_eq!(a[0], vec![-0.4, 0.25, 3.0]);
        Ok(())
    }

    #[test]
    fn test_samples_in_bounds() -> Result<()> {
        let low = [-0.4f32, 0.0];
        let high = [0.4f32, 5.0];
        let device = Device::Cpu;
        let alpha = Tensor::new(&[1.01f32, 30.0], &device)?.broadcast_as((500, 2))?;
        let beta = Tensor::new(&[50.0f32, 1.01], &device)?.broadcast_as((500, 2))?;
        let dist = ScaledBeta::new(
            alpha.contiguous()?,
            beta.contiguous()?,
            BoundScaler::new(&low, &high, &device)?,
        )?;
        let mut rng = StdRng::seed_from_u64(3);

        let act = dist.sample(&mut rng)?.to_vec2::<f32>()?;
        for row in act.iter() {
            for (j, a) in row.iter().enumerate() {
                assert!(*a >= low[j] && *a <= high[j]);
            }
        }
        assert!(dist.log_prob(&dist.sample(&mut rng)?)?.to_vec1::<f32>()?.iter().all(|lp| lp.is_finite()));
        Ok(())
    }

    #[test]
    fn test_non_finite_parameters() -> Result<()> {
        let err = beta_dist(&[2.0, f32::NAN], &[2.0, 2.0], &[0.0, 0.0], &[1.0, 1.0])
            .err()
            .unwrap();
        match err.downcast_ref::<StrideError>() {
            Some(StrideError::NonFiniteParameter { name, values }) => {
                assert_eq!(name, "alpha");
                assert_eq!(values.len(), 1);
                assert_eq!(values[0].0, 1);
                assert!(values[0].1.is_nan());
            }
            _ => panic!("unexpected error: {}", err),
        }

        assert!(beta_dist(&[2.0], &[f32::INFINITY], &[0.0], &[1.0]).is_err());
        Ok(())
    }
}
