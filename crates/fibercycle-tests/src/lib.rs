//! Goodness-of-fit battery for normalized spacings.
//!
//! If survivor phases were scattered uniformly and independently, their
//! sorted spacings divided by the mean would follow Exp(1). Each test here
//! measures one way the observed spacings can depart from that law and
//! returns a [`TestResult`] with a p-value, a pass/fail determination, and a
//! letter grade (A through F). Clustering shows up as an excess of near-zero
//! spacings and a variance above 1.

use statrs::distribution::{ChiSquared, ContinuousCDF, Exp, Normal};

/// Threshold matching the analyzer's near-zero clustering indicator.
pub const NEAR_ZERO_THRESHOLD: f64 = 0.05;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single spacing test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Assign a letter grade based on p-value.
    ///
    /// - A: p >= 0.1
    /// - B: p >= 0.01
    /// - C: p >= 0.001
    /// - D: p >= 0.0001
    /// - F: otherwise or None
    pub fn grade_from_p(p: Option<f64>) -> char {
        match p {
            Some(p) if p >= 0.1 => 'A',
            Some(p) if p >= 0.01 => 'B',
            Some(p) if p >= 0.001 => 'C',
            Some(p) if p >= 0.0001 => 'D',
            _ => 'F',
        }
    }

    /// Determine pass/fail from p-value against a threshold (default 0.01).
    pub fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
        match p {
            Some(p) => p >= threshold,
            None => false,
        }
    }

    fn from_p(name: &str, p: f64, statistic: f64, details: String) -> Self {
        TestResult {
            name: name.to_string(),
            passed: Self::pass_from_p(Some(p), 0.01),
            p_value: Some(p),
            statistic,
            details,
            grade: Self::grade_from_p(Some(p)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Return a failing `TestResult` when the sample is too small.
fn insufficient(name: &str, needed: usize, got: usize) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details: format!("Insufficient data: need {needed}, got {got}"),
        grade: 'F',
    }
}

fn unit_exponential() -> Exp {
    Exp::new(1.0).unwrap()
}

/// Two-sided normal p-value for a z-score.
fn two_sided_p(z: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    (2.0 * normal.sf(z.abs())).clamp(0.0, 1.0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

/// Kolmogorov-Smirnov distance from the Exp(1) CDF.
pub fn exponential_ks(spacings: &[f64]) -> TestResult {
    let name = "Exponential KS";
    let n = spacings.len();
    if n < 50 {
        return insufficient(name, 50, n);
    }
    let exp = unit_exponential();
    let mut sorted = spacings.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let nf = n as f64;
    let mut d_max = 0.0f64;
    for (i, &x) in sorted.iter().enumerate() {
        let f_x = exp.cdf(x.max(0.0));
        let d1 = ((i + 1) as f64 / nf - f_x).abs();
        let d2 = (i as f64 / nf - f_x).abs();
        d_max = d_max.max(d1).max(d2);
    }

    // Asymptotic KS p-value (Kolmogorov distribution)
    let sqrt_n = nf.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d_max;
    let mut p = 0.0;
    for k in 1..=100i32 {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        p += sign * (-2.0 * (k as f64 * lambda).powi(2)).exp();
    }
    let p = (2.0 * p).clamp(0.0, 1.0);

    TestResult::from_p(name, p, d_max, format!("D={d_max:.6}, n={n}"))
}

/// Chi-squared over ten bins that are equiprobable under Exp(1).
pub fn spacing_chi_squared(spacings: &[f64]) -> TestResult {
    let name = "Spacing Chi-Squared";
    const BINS: usize = 10;
    let n = spacings.len();
    if n < BINS * 10 {
        return insufficient(name, BINS * 10, n);
    }
    let exp = unit_exponential();

    let mut observed = [0u64; BINS];
    for &x in spacings {
        let idx = ((exp.cdf(x.max(0.0)) * BINS as f64) as usize).min(BINS - 1);
        observed[idx] += 1;
    }

    let expected = n as f64 / BINS as f64;
    let chi2: f64 = observed
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let dist = ChiSquared::new((BINS - 1) as f64).unwrap();
    let p = dist.sf(chi2);

    TestResult::from_p(
        name,
        p,
        chi2,
        format!("bins={BINS}, expected_per_bin={expected:.1}"),
    )
}

/// Near-zero spacing share against `1 - e^-0.05`, as a binomial z-test.
pub fn near_zero_proportion(spacings: &[f64]) -> TestResult {
    let name = "Near-Zero Proportion";
    let n = spacings.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let p0 = unit_exponential().cdf(NEAR_ZERO_THRESHOLD);
    let hits = spacings.iter().filter(|&&s| s < NEAR_ZERO_THRESHOLD).count();

    let nf = n as f64;
    let z = (hits as f64 - nf * p0) / (nf * p0 * (1.0 - p0)).sqrt();
    let p = two_sided_p(z);

    TestResult::from_p(
        name,
        p,
        z,
        format!(
            "observed={:.2}%, expected={:.2}%",
            100.0 * hits as f64 / nf,
            100.0 * p0
        ),
    )
}

/// Sample variance against 1, using `Var(s^2) ~ 8/n` for Exp(1).
pub fn spacing_variance(spacings: &[f64]) -> TestResult {
    let name = "Spacing Variance";
    let n = spacings.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let nf = n as f64;
    let mean = spacings.iter().sum::<f64>() / nf;
    let var = spacings.iter().map(|&s| (s - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let z = (var - 1.0) / (8.0 / nf).sqrt();
    let p = two_sided_p(z);

    TestResult::from_p(name, p, var, format!("var={var:.4}, z={z:.3}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Run every spacing test.
pub fn run_all_tests(spacings: &[f64]) -> Vec<TestResult> {
    let tests: Vec<fn(&[f64]) -> TestResult> = vec![
        exponential_ks,
        spacing_chi_squared,
        near_zero_proportion,
        spacing_variance,
    ];

    tests
        .iter()
        .map(|test_fn| {
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| test_fn(spacings))) {
                Ok(result) => result,
                Err(_) => TestResult {
                    name: "Unknown".to_string(),
                    passed: false,
                    p_value: None,
                    statistic: 0.0,
                    details: "Test panicked".to_string(),
                    grade: 'F',
                },
            }
        })
        .collect()
}

/// Average of per-test grade weights, 0 to 100.
pub fn calculate_quality_score(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f64 = results
        .iter()
        .map(|r| match r.grade {
            'A' => 100.0,
            'B' => 75.0,
            'C' => 50.0,
            'D' => 25.0,
            _ => 0.0,
        })
        .sum();
    total / results.len() as f64
}
