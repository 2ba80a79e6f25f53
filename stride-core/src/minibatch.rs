//! Minibatch scheduling.
use crate::error::StrideError;
use rand::{seq::SliceRandom, Rng};

/// Splits a batch into equally sized minibatches of shuffled indices.
#[derive(Clone, Debug)]
pub struct MinibatchSampler {
    batch_size: usize,
    num_minibatches: usize,
}

impl MinibatchSampler {
    /// Constructs a sampler.
    ///
    /// Fails if `batch_size` is not divisible by `num_minibatches` or either is zero.
    pub fn new(batch_size: usize, num_minibatches: usize) -> Result<Self, StrideError> {
        if num_minibatches == 0 || batch_size == 0 || batch_size % num_minibatches != 0 {
            return Err(StrideError::IndivisibleBatch {
                batch_size,
                num_minibatches,
            });
        }
        Ok(Self {
            batch_size,
            num_minibatches,
        })
    }

    /// Number of samples in a minibatch.
    pub fn minibatch_size(&self) -> usize {
        self.batch_size / self.num_minibatches
    }

    /// Returns the indices of the minibatches of an epoch.
    ///
    /// A fresh permutation of `0..batch_size` is cut into contiguous slices.
    pub fn shuffle<R: Rng>(&self, rng: &mut R) -> Vec<Vec<usize>> {
        let mut ixs: Vec<usize> = (0..self.batch_size).collect();
        ixs.shuffle(rng);
        ixs.chunks(self.minibatch_size())
            .map(|c| c.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_covers_every_index_once() {
        let sampler = MinibatchSampler::new(64, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let first = sampler.shuffle(&mut rng);
        for _ in 0..3 {
            let mbs = sampler.shuffle(&mut rng);
            assert_eq!(mbs.len(), 4);
            assert!(mbs.iter().all(|mb| mb.len() == 16));

            let mut ixs: Vec<usize> = mbs.into_iter().flatten().collect();
            ixs.sort();
            assert_eq!(ixs, (0..64).collect::<Vec<_>>());
        }
        assert_ne!(first, sampler.shuffle(&mut rng));
    }

    #[test]
    fn test_indivisible() {
        assert_eq!(
            MinibatchSampler::new(10, 3).unwrap_err(),
            StrideError::IndivisibleBatch {
                batch_size: 10,
                num_minibatches: 3
            }
        );
        assert!(MinibatchSampler::new(10, 0).is_err());
        assert_eq!(MinibatchSampler::new(10, 10).unwrap().minibatch_size(), 1);
    }
}
