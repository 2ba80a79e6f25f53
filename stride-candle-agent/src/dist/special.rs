//! Log-gamma and polygamma functions as differentiable candle operations.
//!
//! The operations run on CPU tensors of `f32` or `f64`.
use candle_core::{bail, CpuStorage, CustomOp1, Layout, Result, Shape, Tensor};
use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEF: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// `ln |Γ(x)|` with the Lanczos approximation.
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection
        (PI / (PI * x).sin().abs()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let t = x + LANCZOS_G + 0.5;
        let a = LANCZOS_COEF
            .iter()
            .enumerate()
            .skip(1)
            .fold(LANCZOS_COEF[0], |a, (i, c)| a + c / (x + i as f64));
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
    }
}

/// Digamma function `ψ(x) = d ln Γ(x) / dx`.
pub fn digamma(x: f64) -> f64 {
    if x <= 0.0 && x == x.floor() {
        return f64::NAN;
    }
    if x < 0.0 {
        return digamma(1.0 - x) - PI / (PI * x).tan();
    }

    let mut x = x;
    let mut acc = 0.0;
    while x < 10.0 {
        acc -= 1.0 / x;
        x += 1.0;
    }
    let x2 = 1.0 / (x * x);
    let series = x2
        * (1.0 / 12.0
            - x2 * (1.0 / 120.0 - x2 * (1.0 / 252.0 - x2 * (1.0 / 240.0 - x2 / 132.0))));
    acc + x.ln() - 0.5 / x - series
}

/// Trigamma function `ψ'(x)`.
pub fn trigamma(x: f64) -> f64 {
    if x <= 0.0 && x == x.floor() {
        return f64::NAN;
    }
    if x < 0.0 {
        let s = (PI * x).sin();
        return PI * PI / (s * s) - trigamma(1.0 - x);
    }

    let mut x = x;
    let mut acc = 0.0;
    while x < 10.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let x2 = 1.0 / (x * x);
    let series = 1.0 / x
        + x2 / 2.0
        + x2 / x * (1.0 / 6.0 - x2 * (1.0 / 30.0 - x2 * (1.0 / 42.0 - x2 / 30.0)));
    acc + series
}

fn map_storage(
    name: &str,
    f: fn(f64) -> f64,
    storage: &CpuStorage,
    layout: &Layout,
) -> Result<(CpuStorage, Shape)> {
    let (start, end) = match layout.contiguous_offsets() {
        Some(offsets) => offsets,
        None => bail!("{} requires a contiguous input", name),
    };
    let out = match storage {
        CpuStorage::F32(vs) => {
            CpuStorage::F32(vs[start..end].iter().map(|&v| f(v as f64) as f32).collect())
        }
        CpuStorage::F64(vs) => CpuStorage::F64(vs[start..end].iter().map(|&v| f(v)).collect()),
        _ => bail!("{} supports f32 and f64 only", name),
    };
    Ok((out, layout.shape().clone()))
}

struct Lgamma;

impl CustomOp1 for Lgamma {
    fn name(&self) -> &'static str {
        "lgamma"
    }

    fn cpu_fwd(&self, storage: &CpuStorage, layout: &Layout) -> Result<(CpuStorage, Shape)> {
        map_storage(self.name(), ln_gamma, storage, layout)
    }

    fn bwd(&self, arg: &Tensor, _res: &Tensor, grad_res: &Tensor) -> Result<Option<Tensor>> {
        Ok(Some(grad_res.mul(&digamma_t(arg)?)?))
    }
}

struct Digamma;

impl CustomOp1 for Digamma {
    fn name(&self) -> &'static str {
        "digamma"
    }

    fn cpu_fwd(&self, storage: &CpuStorage, layout: &Layout) -> Result<(CpuStorage, Shape)> {
        map_storage(self.name(), digamma, storage, layout)
    }

    fn bwd(&self, arg: &Tensor, _res: &Tensor, grad_res: &Tensor) -> Result<Option<Tensor>> {
        Ok(Some(grad_res.mul(&trigamma_t(arg)?)?))
    }
}

struct Trigamma;

impl CustomOp1 for Trigamma {
    fn name(&self) -> &'static str {
        "trigamma"
    }

    fn cpu_fwd(&self, storage: &CpuStorage, layout: &Layout) -> Result<(CpuStorage, Shape)> {
        map_storage(self.name(), trigamma, storage, layout)
    }

    fn bwd(&self, _arg: &Tensor, _res: &Tensor, _grad_res: &Tensor) -> Result<Option<Tensor>> {
        Ok(None)
    }
}

/// Elementwise `ln Γ(x)`, differentiable.
pub fn lgamma_t(xs: &Tensor) -> Result<Tensor> {
    xs.contiguous()?.apply_op1(Lgamma)
}

/// Elementwise `ψ(x)`, differentiable.
pub fn digamma_t(xs: &Tensor) -> Result<Tensor> {
    xs.contiguous()?.apply_op1(Digamma)
}

/// Elementwise `ψ'(x)`. No gradient flows through it.
pub fn trigamma_t(xs: &Tensor) -> Result<Tensor> {
    xs.contiguous()?.apply_op1(Trigamma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{Device, Var};

    #[test]
    fn test_scalar_values() {
        assert!((ln_gamma(0.5) - 0.572_364_942_924_700_1).abs() < 1e-10);
        assert!(ln_gamma(1.0).abs() < 1e-12);
        assert!(ln_gamma(2.0).abs() < 1e-12);
        assert!((ln_gamma(10.0) - 362_880f64.ln()).abs() < 1e-9);
        assert!((ln_gamma(-0.5) - 1.265_512_123_484_645_4).abs() < 1e-9);

        let euler = 0.577_215_664_901_532_9;
        assert!((digamma(1.0) + euler).abs() < 1e-10);
        assert!((digamma(0.5) + euler + 2.0 * 2f64.ln()).abs() < 1e-10);
        for x in [1.5, 6.5, 9.5, 10.5, 30.0] {
            assert!((digamma(x + 1.0) - (digamma(x) + 1.0 / x)).abs() < 1e-10);
            assert!((trigamma(x + 1.0) - (trigamma(x) - 1.0 / (x * x))).abs() < 1e-10);
        }
        assert!((digamma(1.5) - (2.0 - euler - 2.0 * 2f64.ln())).abs() < 1e-10);
        assert!(digamma(0.0).is_nan());

        assert!((trigamma(1.0) - PI * PI / 6.0).abs() < 1e-8);
        assert!((trigamma(0.5) - PI * PI / 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_lgamma_gradient() -> candle_core::Result<()> {
        let x = Var::new(&[1.0f32, 2.5, 4.0], &Device::Cpu)?;
        let y = lgamma_t(x.as_tensor())?.sum_all()?;
        let grads = y.backward()?;
        let g = grads.get(x.as_tensor()).unwrap().to_vec1::<f32>()?;
        for (gi, xi) in g.iter().zip([1.0, 2.5, 4.0].iter()) {
            assert!((*gi as f64 - digamma(*xi)).abs() < 1e-5);
        }

        let y = digamma_t(x.as_tensor())?.sum_all()?;
        let grads = y.backward()?;
        let g = grads.get(x.as_tensor()).unwrap().to_vec1::<f32>()?;
        assert!((g[0] as f64 - PI * PI / 6.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_non_contiguous_input() -> candle_core::Result<()> {
        let x = Tensor::new(&[[1f32, 2.0], [3.0, 4.0]], &Device::Cpu)?.t()?;
        let y = lgamma_t(&x)?.to_vec2::<f32>()?;
        assert!((y[0][1] as f64 - 2f64.ln()).abs() < 1e-6);
        assert!((y[1][1] as f64 - 6f64.ln()).abs() < 1e-6);
        Ok(())
    }
}
