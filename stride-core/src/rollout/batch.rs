/// A flattened on-policy batch with advantages and returns.
///
/// Sample `t * n_envs + n` comes from row `(t, n)` of the segment.
#[derive(Clone, Debug, PartialEq)]
pub struct RolloutBatch {
    /// Observations, `len() * obs_dim` values in row-major order.
    pub obs: Vec<f32>,

    /// Actions, `len() * act_dim` values in row-major order.
    pub act: Vec<f32>,

    /// Log probabilities of the actions at collection time.
    pub log_prob: Vec<f32>,

    /// Advantages.
    pub advantages: Vec<f32>,

    /// Returns, i.e. targets of the value function.
    pub returns: Vec<f32>,

    /// Value estimates at collection time.
    pub values: Vec<f32>,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,
}

impl RolloutBatch {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.log_prob.len()
    }

    /// Returns `true` if the batch has no sample.
    pub fn is_empty(&self) -> bool {
        self.log_prob.is_empty()
    }

    /// Copies the samples at the given indices into a new batch.
    pub fn gather(&self, ixs: &[usize]) -> Self {
        let rows = |xs: &[f32], dim: usize| -> Vec<f32> {
            ixs.iter()
                .flat_map(|&i| xs[i * dim..(i + 1) * dim].iter().copied())
                .collect()
        };
        let elems = |xs: &[f32]| -> Vec<f32> { ixs.iter().map(|&i| xs[i]).collect() };

        Self {
            obs: rows(&self.obs, self.obs_dim),
            act: rows(&self.act, self.act_dim),
            log_prob: elems(&self.log_prob),
            advantages: elems(&self.advantages),
            returns: elems(&self.returns),
            values: elems(&self.values),
            obs_dim: self.obs_dim,
            act_dim: self.act_dim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather() {
        let batch = RolloutBatch {
            obs: vec![0.0, 0.1, 1.0, 1.1, 2.0, 2.1],
            act: vec![0.0, 1.0, 2.0],
            log_prob: vec![-0.0, -1.0, -2.0],
            advantages: vec![0.5, 1.5, 2.5],
            returns: vec![10.0, 11.0, 12.0],
            values: vec![9.5, 9.5, 9.5],
            obs_dim: 2,
            act_dim: 1,
        };
        let mb = batch.gather(&[2, 0]);
        assert_eq!(mb.len(), 2);
        assert_eq!(mb.obs, vec![2.0, 2.1, 0.0, 0.1]);
        assert_eq!(mb.act, vec![2.0, 0.0]);
        assert_eq!(mb.advantages, vec![2.5, 0.5]);
        assert_eq!(mb.returns, vec![12.0, 10.0]);
    }
}
