/// Error function, Abramowitz & Stegun 7.1.26 (absolute error below 1.5e-7).
fn erf(x: f64) -> f64 {
    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();

    let (a1, a2, a3, a4, a5) = (0.254829592, -0.284496736, 1.421413741, -1.453152027, 1.061405429);
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal cumulative distribution function.
pub(crate) fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Two-sided p-value of a standard normal z-score; NaN stays NaN.
pub(crate) fn two_sided_p_value(z: f64) -> f64 {
    if z.is_nan() { return f64::NAN }
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}
