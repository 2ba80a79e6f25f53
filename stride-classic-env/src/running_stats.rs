//! Running mean and variance.
use serde::{Deserialize, Serialize};

/// Per-dimension running mean and variance over batches of samples.
///
/// Batches are merged with the parallel variance algorithm. The count starts at
/// `1e-4` so that the statistics are defined before the first update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunningMeanStd {
    mean: Vec<f64>,
    var: Vec<f64>,
    count: f64,
}

impl RunningMeanStd {
    /// Creates statistics of samples with `dim` elements.
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            var: vec![1.0; dim],
            count: 1e-4,
        }
    }

    /// Dimension of samples.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Running mean.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Running (population) variance.
    pub fn var(&self) -> &[f64] {
        &self.var
    }

    /// Updates the statistics with a batch of samples stored back to back.
    pub fn update(&mut self, batch: &[f32]) {
        let dim = self.dim();
        assert_eq!(batch.len() % dim, 0, "batch size must be a multiple of {}", dim);
        let n = (batch.len() / dim) as f64;
        if n == 0.0 {
            return;
        }

        for j in 0..dim {
            let xs = batch.iter().skip(j).step_by(dim).map(|x| *x as f64);
            let batch_mean = xs.clone().sum::<f64>() / n;
            let batch_var = xs.map(|x| (x - batch_mean).powi(2)).sum::<f64>() / n;

            let delta = batch_mean - self.mean[j];
            let total = self.count + n;
            let m2 = self.var[j] * self.count + batch_var * n + delta * delta * self.count * n / total;
            self.mean[j] += delta * n / total;
            self.var[j] = m2 / total;
        }
        self.count += n;
    }

    /// Normalizes samples stored back to back in place.
    pub fn normalize(&self, xs: &mut [f32], epsilon: f64) {
        let dim = self.dim();
        for (i, x) in xs.iter_mut().enumerate() {
            let j = i % dim;
            *x = ((*x as f64 - self.mean[j]) / (self.var[j] + epsilon).sqrt()) as f32;
        }
    }

    /// Scales samples by the inverse of the running standard deviation, without centering.
    pub fn scale(&self, xs: &mut [f32], epsilon: f64) {
        let dim = self.dim();
        for (i, x) in xs.iter_mut().enumerate() {
            *x = (*x as f64 / (self.var[i % dim] + epsilon).sqrt()) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update() {
        let mut rms = RunningMeanStd::new(2);
        rms.update(&[1.0, 10.0, 2.0, 20.0]);
        rms.update(&[3.0, 30.0, 4.0, 40.0, 5.0, 50.0]);

        // Statistics of the concatenated samples, up to the initial count
        assert!((rms.mean()[0] - 3.0).abs() < 1e-3);
        assert!((rms.mean()[1] - 30.0).abs() < 1e-2);
        assert!((rms.var()[0] - 2.0).abs() < 1e-3);
        assert!((rms.var()[1] - 200.0).abs() < 1e-1);
    }

    #[test]
    fn test_normalize() {
        let mut rms = RunningMeanStd::new(1);
        rms.update(&[-1.0, 1.0, -1.0, 1.0]);
        let mut xs = vec![1.0, 3.0];
        rms.normalize(&mut xs, 1e-8);
        assert!((xs[0] - 1.0).abs() < 1e-3);
        assert!((xs[1] - 3.0).abs() < 1e-3);

        let mut xs = vec![2.0];
        rms.scale(&mut xs, 1e-8);
        assert!((xs[0] - 2.0).abs() < 1e-3);
    }
}
