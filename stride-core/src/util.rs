//! Statistics used in training diagnostics.

/// Mean of the values, NaN for an empty slice.
pub fn mean(xs: &[f32]) -> f32 {
    xs.iter().sum::<f32>() / xs.len() as f32
}

/// Population variance of the values.
pub fn var(xs: &[f32]) -> f32 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f32>() / xs.len() as f32
}

/// Standard deviation with the unbiased estimator, 0 for less than two values.
pub fn std_unbiased(xs: &[f32]) -> f32 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f32>() / (xs.len() - 1) as f32).sqrt()
}

/// Explained variance `1 - var(y_true - y_pred) / var(y_true)`.
///
/// Returns NaN if `var(y_true)` is zero.
pub fn explained_variance(y_pred: &[f32], y_true: &[f32]) -> f32 {
    let var_y = var(y_true);
    if var_y == 0.0 {
        return f32::NAN;
    }
    let diff: Vec<f32> = y_true.iter().zip(y_pred.iter()).map(|(t, p)| t - p).collect();
    1.0 - var(&diff) / var_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explained_variance() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert!((explained_variance(&y, &y) - 1.0).abs() < 1e-6);
        assert!(explained_variance(&[2.5; 4], &y).abs() < 1e-6);
        assert!(explained_variance(&y, &[3.0; 4]).is_nan());
    }

    #[test]
    fn test_std_unbiased() {
        assert_eq!(std_unbiased(&[1.0]), 0.0);
        assert!((std_unbiased(&[1.0, 3.0]) - 2f32.sqrt()).abs() < 1e-6);
    }
}
