use super::ActionDist;
use anyhow::Result;
use candle_core::{Tensor, D};
use rand::Rng;
use rand_distr::StandardNormal;

const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;

/// Gaussian distribution with diagonal covariance.
pub struct DiagGaussian {
    mean: Tensor,
    log_std: Tensor,
}

impl DiagGaussian {
    /// Constructs a distribution. `log_std` is broadcast to the shape of `mean`.
    pub fn new(mean: Tensor, log_std: &Tensor) -> Result<Self> {
        let log_std = log_std.broadcast_as(mean.shape())?;
        Ok(Self { mean, log_std })
    }

    /// Standard deviation.
    pub fn std(&self) -> Result<Tensor> {
        Ok(self.log_std.exp()?)
    }
}

impl ActionDist for DiagGaussian {
    fn sample<R: Rng>(&self, rng: &mut R) -> Result<Tensor> {
        let n = self.mean.elem_count();
        let noise: Vec<f32> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let noise = Tensor::from_vec(noise, self.mean.shape(), self.mean.device())?;
        let act = (&self.mean + (self.std()? * noise)?)?;
        Ok(act.detach())
    }

    fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        let z = ((act - &self.mean)? / self.std()?)?;
        let lp = ((z.sqr()? * -0.5)? - &self.log_std)?;
        Ok((lp - HALF_LN_2PI)?.sum(D::Minus1)?)
    }

    fn entropy(&self) -> Result<Tensor> {
        Ok((&self.log_std + (0.5 + HALF_LN_2PI))?.sum(D::Minus1)?)
    }

    fn mean(&self) -> Result<Tensor> {
        Ok(self.mean.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_log_prob_and_entropy() -> Result<()> {
        let device = Device::Cpu;
        let mean = Tensor::new(&[[0f32, 0.5]], &device)?;
        let log_std = Tensor::new(&[[0f32, 2f32.ln()]], &device)?;
        let dist = DiagGaussian::new(mean, &log_std)?;

        let act = Tensor::new(&[[0f32, 1.0]], &device)?;
        let lp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        let expected = -HALF_LN_2PI + (-0.25 / 8.0 - 2f64.ln() - HALF_LN_2PI);
        assert!((lp[0] as f64 - expected).abs() < 1e-5);

        let ent = dist.entropy()?.to_vec1::<f32>()?;
        let expected = 2.0 * (0.5 + HALF_LN_2PI) + 2f64.ln();
        assert!((ent[0] as f64 - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_sample_statistics() -> Result<()> {
        let device = Device::Cpu;
        let mean = Tensor::new(&[3f32], &device)?.broadcast_as((4000, 1))?.contiguous()?;
        let log_std = Tensor::new(&[[0.5f32.ln()]], &device)?;
        let dist = DiagGaussian::new(mean, &log_std)?;
        let mut rng = StdRng::seed_from_u64(7);

        let xs: Vec<f32> = dist.sample(&mut rng)?.flatten_all()?.to_vec1()?;
        let m = xs.iter().sum::<f32>() / xs.len() as f32;
        let s = (xs.iter().map(|x| (x - m).powi(2)).sum::<f32>() / xs.len() as f32).sqrt();
        assert!((m - 3.0).abs() < 0.05);
        assert!((s - 0.5).abs() < 0.05);
        Ok(())
    }
}
