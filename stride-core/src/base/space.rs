//! Continuous spaces.
use serde::{Deserialize, Serialize};

/// A box in `R^n`, i.e. a space with per-dimension lower and upper bounds.
///
/// Observation spaces usually have infinite bounds, while action spaces of
/// locomotion tasks are bounded, e.g. `[-0.4, 0.4]` for each joint of Humanoid.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BoxSpace {
    /// Shape of an element of the space.
    pub shape: Vec<usize>,

    /// Lower bounds, flattened.
    pub low: Vec<f32>,

    /// Upper bounds, flattened.
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// Constructs a one-dimensional box from its bounds.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        assert_eq!(low.len(), high.len());
        Self {
            shape: vec![low.len()],
            low,
            high,
        }
    }

    /// Constructs an unbounded box with the given shape.
    pub fn unbounded(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self {
            shape,
            low: vec![f32::NEG_INFINITY; n],
            high: vec![f32::INFINITY; n],
        }
    }

    /// Number of scalar elements.
    pub fn dim(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns `true` if every dimension has finite bounds.
    pub fn is_bounded(&self) -> bool {
        self.low
            .iter()
            .zip(self.high.iter())
            .all(|(l, h)| l.is_finite() && h.is_finite())
    }

    /// Clips a flattened element into the box in place.
    ///
    /// `xs` may hold several elements back to back.
    pub fn clip(&self, xs: &mut [f32]) {
        let dim = self.dim();
        for (i, x) in xs.iter_mut().enumerate() {
            let j = i % dim;
            *x = x.max(self.low[j]).min(self.high[j]);
        }
    }

    /// Returns `true` if all the elements lie in the box, bounds included.
    pub fn contains(&self, xs: &[f32]) -> bool {
        let dim = self.dim();
        xs.iter()
            .enumerate()
            .all(|(i, x)| *x >= self.low[i % dim] && *x <= self.high[i % dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        let space = BoxSpace::new(vec![-1.0, 0.0], vec![1.0, 2.0]);
        let mut xs = vec![-3.0, 1.0, 0.5, 5.0];
        space.clip(&mut xs);
        assert_eq!(xs, vec![-1.0, 1.0, 0.5, 2.0]);
        assert!(space.contains(&xs));
        assert!(space.is_bounded());
        assert!(!BoxSpace::unbounded(vec![3]).is_bounded());
    }
}
