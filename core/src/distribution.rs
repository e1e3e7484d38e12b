//! Closed-form probability helpers.
//!
//! Pure math, no side effects. Nothing here samples: the core only
//! evaluates probability masses and survival functions, so results
//! depend on configuration alone.

/// Divide, resolving a zero (or non-finite) denominator to 0.
///
/// Every ratio in the core goes through this: farm areas, farm counts,
/// demand totals and day counters are all legitimately zero somewhere.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let q = numerator / denominator;
    if q.is_finite() { q } else { 0.0 }
}

/// Poisson masses P(k; λ) for k = 0..=k_max, renormalized to sum to 1.
///
/// The renormalization folds the truncated tail (k > k_max) back into
/// the retained brackets proportionally. λ ≤ 0 puts all mass on k = 0.
pub fn truncated_poisson(lambda: f64, k_max: u32) -> Vec<f64> {
    let len = k_max as usize + 1;
    let mut masses = vec![0.0; len];
    if !(lambda > 0.0) || !lambda.is_finite() {
        masses[0] = 1.0;
        return masses;
    }

    // Log space keeps large λ from underflowing exp(-λ).
    let ln_lambda = lambda.ln();
    let mut ln_factorial = 0.0;
    let mut ln_masses = Vec::with_capacity(len);
    for k in 0..len {
        if k > 0 {
            ln_factorial += (k as f64).ln();
        }
        ln_masses.push(-lambda + k as f64 * ln_lambda - ln_factorial);
    }

    // Shift by the max before exponentiating, then normalize.
    let peak = ln_masses.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for (m, ln_m) in masses.iter_mut().zip(&ln_masses) {
        *m = (ln_m - peak).exp();
    }
    let total: f64 = masses.iter().sum();
    for m in &mut masses {
        *m = safe_div(*m, total);
    }
    masses
}

/// Complementary error function.
///
/// Chebyshev fit from Numerical Recipes (`erfcc`), fractional error
/// below 1.2e-7 everywhere.
///
/// For `lognormal_survival` this bounds the absolute error by 6e-8 at
/// any cost: relative to `p` in the upper tail, so `p` near 0 never
/// goes negative or loses its order of magnitude, and relative to
/// `1 - p` near 1, so `p` never exceeds 1. Installations are
/// `floor(farms × p)`, so the count can differ by one farm only when
/// `farms × p` sits within `6e-8 × farms` of an integer.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

/// P(X > x) for X ~ LogNormal(μ, σ).
pub fn lognormal_survival(x: f64, mu: f64, sigma: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if !(sigma > 0.0) {
        // Degenerate: all mass at exp(μ).
        return if x < mu.exp() { 1.0 } else { 0.0 };
    }
    let z = (x.ln() - mu) / (sigma * std::f64::consts::SQRT_2);
    (0.5 * erfc(z)).clamp(0.0, 1.0)
}
