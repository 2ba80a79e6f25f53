//! Utilities.
use anyhow::Result;
use candle_core::{backprop::GradStore, Device, Tensor, Var};
use log::trace;
use ndarray::Array2;

/// Numerically stable `ln(1 + exp(x))`.
pub fn softplus(xs: &Tensor) -> Result<Tensor> {
    let tail = ((xs.abs()?.neg()?.exp()? + 1.0)?).log()?;
    Ok((xs.relu()? + tail)?)
}

/// Clips the global L2 norm of the gradients of `vars` to `max_norm` in place.
///
/// Gradients are scaled by `max_norm / (norm + 1e-6)` if the factor is smaller than 1.
/// Returns the norm before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f32> {
    let mut sq_sum = 0f32;
    for var in vars.iter() {
        if let Some(g) = grads.get(var.as_tensor()) {
            sq_sum += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    let norm = sq_sum.sqrt();

    let coef = max_norm / (norm as f64 + 1e-6);
    if coef < 1.0 {
        trace!("clip gradients: norm {} -> {}", norm, max_norm);
        for var in vars.iter() {
            if let Some(g) = grads.get(var.as_tensor()) {
                let g = (g * coef)?;
                grads.insert(var.as_tensor(), g);
            }
        }
    }

    Ok(norm)
}

/// Converts a 2-dimensional array into a tensor of the same shape.
pub fn array2_to_tensor(a: &Array2<f32>, device: &Device) -> Result<Tensor> {
    let shape = (a.nrows(), a.ncols());
    let v = a.iter().copied().collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, shape, device)?)
}

/// Converts a tensor of shape `(n, m)` into an array.
pub fn tensor_to_array2(t: &Tensor) -> Result<Array2<f32>> {
    let (n, m) = t.dims2()?;
    let v: Vec<f32> = t.flatten_all()?.to_vec1()?;
    Ok(Array2::from_shape_vec((n, m), v)?)
}

/// Converts a row-major slice into a tensor of shape `(len / dim, dim)`.
pub fn slice_to_tensor(v: &[f32], dim: usize, device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(v, (v.len() / dim, dim), device)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn test_softplus() -> Result<()> {
        let xs = Tensor::new(&[-100f32, -1.0, 0.0, 1.0, 100.0], &Device::Cpu)?;
        let ys = softplus(&xs)?.to_vec1::<f32>()?;
        let expected = [0.0, 0.3132617, 0.6931472, 1.3132617, 100.0];
        for (y, e) in ys.iter().zip(expected.iter()) {
            assert!((y - e).abs() < 1e-5, "{} != {}", y, e);
        }
        Ok(())
    }

    #[test]
    fn test_clip_grad_norm() -> Result<()> {
        let device = Device::Cpu;
        let v1 = Var::ones((3,), DType::F32, &device)?;
        let v2 = Var::ones((2, 2), DType::F32, &device)?;

        // A pathological loss with a huge gradient
        let loss = ((v1.as_tensor().sum_all()? * 1e6)? + (v2.as_tensor().sqr()?.sum_all()? * 1e4)?)?;
        let mut grads = loss.backward()?;
        let vars = [v1.clone(), v2.clone()];
        let norm = clip_grad_norm(&mut grads, &vars, 0.5)?;
        assert!(norm > 1e6);

        let mut sq_sum = 0f32;
        for v in vars.iter() {
            let g = grads.get(v.as_tensor()).unwrap();
            sq_sum += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
        assert!(sq_sum.sqrt() <= 0.5 + 1e-4);

        // Small gradients are left untouched
        let loss = v1.as_tensor().sum_all()?;
        let mut grads = loss.backward()?;
        let norm = clip_grad_norm(&mut grads, &[v1.clone()], 10.0)?;
        assert!((norm - 3f32.sqrt()).abs() < 1e-6);
        assert_eq!(
            grads.get(v1.as_tensor()).unwrap().to_vec1::<f32>()?,
            vec![1.0; 3]
        );
        Ok(())
    }

    #[test]
    fn test_array_conversion() -> Result<()> {
        let a = Array2::from_shape_vec((2, 3), vec![1f32, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let t = array2_to_tensor(&a, &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(tensor_to_array2(&t)?, a);
        Ok(())
    }
}
