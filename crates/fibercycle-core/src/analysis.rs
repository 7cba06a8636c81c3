//! Post-hoc analysis of the test-phase survivors.
//!
//! This module turns a [`StabilityOutcome`] into report-ready numbers:
//! survivor/rejected partition, order-statistics spacing of survivor phases
//! with a clustering indicator and density histogram, and the fiber drift
//! check over the test window.

use serde::Serialize;

use crate::filter::StabilityOutcome;

/// Spacing statistics need strictly more survivors than this.
pub const MIN_SPACING_SAMPLE: usize = 100;
/// Normalized spacings below this count as near-zero (clustered).
pub const NEAR_ZERO_THRESHOLD: f64 = 0.05;
/// Default histogram resolution.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Survivor vs rejected counts against the full batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartitionCounts {
    pub total: usize,
    pub survivors: usize,
    pub rejected: usize,
    pub survivor_pct: f64,
    pub rejected_pct: f64,
}

/// One histogram bin over `[lo, hi)` (the last bin also includes `hi`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    /// `count / (total * width)`; densities times widths sum to 1.
    pub density: f64,
}

impl HistogramBin {
    pub fn midpoint(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// A bin scaled for text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBar {
    pub midpoint: f64,
    pub density: f64,
    pub bar_len: usize,
}

/// Equal-width density histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn max_density(&self) -> f64 {
        self.bins.iter().map(|b| b.density).fold(0.0, f64::max)
    }

    /// Sum of `density * width`; 1.0 for any non-empty histogram.
    pub fn integral(&self) -> f64 {
        self.bins.iter().map(|b| b.density * b.width()).sum()
    }

    /// Bars scaled so the densest bin spans `width` characters.
    pub fn bars(&self, width: usize) -> Vec<HistogramBar> {
        let max = self.max_density();
        self.bins
            .iter()
            .map(|b| HistogramBar {
                midpoint: b.midpoint(),
                density: b.density,
                bar_len: if max > 0.0 {
                    (b.density / max * width as f64) as usize
                } else {
                    0
                },
            })
            .collect()
    }
}

/// Spacing statistics of survivor phases.
#[derive(Debug, Clone, Serialize)]
pub struct SpacingStats {
    /// Number of survivor phases the spacings were taken from.
    pub sample_size: usize,
    /// Mean raw spacing between consecutive sorted phases.
    pub mean_spacing: f64,
    /// Percentage of normalized spacings below [`NEAR_ZERO_THRESHOLD`].
    pub near_zero_pct: f64,
    /// Spacings divided by their mean (mean 1). Omitted from JSON output.
    #[serde(skip)]
    pub normalized: Vec<f64>,
    pub histogram: Histogram,
}

/// Zero-drift verdict over the test window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Verdict {
    ZeroDrift,
    Deviations(usize),
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDrift => write!(f, "zero drifts"),
            Self::Deviations(n) => write!(f, "{n} deviations"),
        }
    }
}

/// Start-vs-end fiber comparison over the survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriftCheck {
    pub checked: usize,
    pub drifts: usize,
    pub verdict: Verdict,
}

/// Everything the renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct SurvivorAnalysis {
    pub partition: PartitionCounts,
    /// `None` when there are too few survivors for meaningful spacings.
    pub spacing: Option<SpacingStats>,
    pub drift: DriftCheck,
}

// ---------------------------------------------------------------------------
// Analysis functions
// ---------------------------------------------------------------------------

/// Count survivors and rejected elements against the batch size.
pub fn partition_counts(mask: &[bool]) -> PartitionCounts {
    let total = mask.len();
    let survivors = mask.iter().filter(|&&m| m).count();
    let rejected = total - survivors;
    let pct = |c: usize| {
        if total == 0 {
            0.0
        } else {
            100.0 * c as f64 / total as f64
        }
    };
    PartitionCounts {
        total,
        survivors,
        rejected,
        survivor_pct: pct(survivors),
        rejected_pct: pct(rejected),
    }
}

/// Sorted consecutive differences of `phases`, divided by their mean.
///
/// Returns `(normalized, mean)`. If every phase is identical the mean is 0
/// and every normalized spacing is reported as 0.
pub fn normalized_spacings(phases: &[f64]) -> (Vec<f64>, f64) {
    if phases.len() < 2 {
        return (Vec::new(), 0.0);
    }
    let mut sorted = phases.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let spacings: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = spacings.iter().sum::<f64>() / spacings.len() as f64;
    let normalized = if mean > 0.0 {
        spacings.iter().map(|&s| s / mean).collect()
    } else {
        vec![0.0; spacings.len()]
    };
    (normalized, mean)
}

/// Equal-width density histogram over `[min, max]` of `data`.
///
/// A degenerate range is widened to `[v - 0.5, v + 0.5]`.
pub fn density_histogram(data: &[f64], bins: usize) -> Histogram {
    if data.is_empty() || bins == 0 {
        return Histogram { bins: Vec::new() };
    }
    let mut lo = data.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &x in data {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = data.len() as f64;
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lo: lo + i as f64 * width,
            hi: lo + (i + 1) as f64 * width,
            count,
            density: count as f64 / (total * width),
        })
        .collect();
    Histogram { bins }
}

/// Spacing statistics of fiber values, or `None` at or below
/// [`MIN_SPACING_SAMPLE`] survivors.
pub fn spacing_stats(fibers: &[i64], prime_mod: i64, bins: usize) -> Option<SpacingStats> {
    if fibers.len() <= MIN_SPACING_SAMPLE {
        return None;
    }
    let phases: Vec<f64> = fibers
        .iter()
        .map(|&n| n as f64 / prime_mod as f64)
        .collect();
    let (normalized, mean_spacing) = normalized_spacings(&phases);

    let near_zero = normalized.iter().filter(|&&s| s < NEAR_ZERO_THRESHOLD).count();
    let near_zero_pct = 100.0 * near_zero as f64 / normalized.len() as f64;
    let histogram = density_histogram(&normalized, bins);

    Some(SpacingStats {
        sample_size: fibers.len(),
        mean_spacing,
        near_zero_pct,
        normalized,
        histogram,
    })
}

/// Count survivors whose fiber value moved over the test window.
pub fn drift_check(outcome: &StabilityOutcome) -> DriftCheck {
    let mut checked = 0;
    let mut drifts = 0;
    for (start, end) in outcome.survivor_snapshots() {
        checked += 1;
        if start != end {
            drifts += 1;
        }
    }
    DriftCheck {
        checked,
        drifts,
        verdict: if drifts == 0 {
            Verdict::ZeroDrift
        } else {
            Verdict::Deviations(drifts)
        },
    }
}

/// Run every survivor analysis over a test-phase outcome.
pub fn analyze(outcome: &StabilityOutcome, prime_mod: i64, bins: usize) -> SurvivorAnalysis {
    SurvivorAnalysis {
        partition: partition_counts(&outcome.mask),
        spacing: spacing_stats(&outcome.survivor_fibers(), prime_mod, bins),
        drift: drift_check(outcome),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(mask: Vec<bool>, n_start: Vec<i64>, n_end: Vec<i64>) -> StabilityOutcome {
        let survivors = mask.iter().filter(|&&m| m).count();
        StabilityOutcome {
            mask,
            n_start,
            n_end,
            survival_curve: vec![survivors],
        }
    }

    fn lcg_fibers(count: usize, prime_mod: i64) -> Vec<i64> {
        let mut state: u64 = 0xdeadbeef;
        (0..count)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) % prime_mod as u64) as i64
            })
            .collect()
    }

    #[test]
    fn test_partition_counts() {
        let p = partition_counts(&[true, false, false, true, false]);
        assert_eq!(p.total, 5);
        assert_eq!(p.survivors, 2);
        assert_eq!(p.rejected, 3);
        assert!((p.survivor_pct - 40.0).abs() < 1e-12);
        assert!((p.survivor_pct + p.rejected_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partition_counts_empty() {
        let p = partition_counts(&[]);
        assert_eq!(p.survivors, 0);
        assert_eq!(p.survivor_pct, 0.0);
    }

    #[test]
    fn test_normalized_spacings_mean_one() {
        let (norm, mean) = normalized_spacings(&[0.7, 0.1, 0.4, 0.2]);
        assert_eq!(norm.len(), 3);
        assert!((mean - 0.2).abs() < 1e-12);
        let avg = norm.iter().sum::<f64>() / norm.len() as f64;
        assert!((avg - 1.0).abs() < 1e-12);
        assert!((norm[0] - 0.5).abs() < 1e-12);
        assert!((norm[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_spacings_identical_phases() {
        let (norm, mean) = normalized_spacings(&[0.3; 5]);
        assert_eq!(mean, 0.0);
        assert_eq!(norm, vec![0.0; 4]);
    }

    #[test]
    fn test_histogram_integrates_to_one() {
        let data: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.37).sin().abs() * 3.0).collect();
        let h = density_histogram(&data, 20);
        assert_eq!(h.bins.len(), 20);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 1000);
        assert!((h.integral() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let h = density_histogram(&[0.0, 1.0, 2.0], 2);
        assert_eq!(h.bins[0].count, 1);
        assert_eq!(h.bins[1].count, 2);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let h = density_histogram(&[0.0; 10], 4);
        assert!((h.bins[0].lo + 0.5).abs() < 1e-12);
        assert!((h.bins[3].hi - 0.5).abs() < 1e-12);
        assert!((h.integral() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bars_scale_to_width() {
        let h = density_histogram(&[0.0, 0.0, 0.0, 0.0, 1.0, 1.0], 2);
        let bars = h.bars(60);
        assert_eq!(bars[0].bar_len, 60);
        assert_eq!(bars[1].bar_len, 30);
    }

    #[test]
    fn test_spacing_skipped_for_small_samples() {
        let fibers = lcg_fibers(MIN_SPACING_SAMPLE, 1_000_000_007);
        assert!(spacing_stats(&fibers, 1_000_000_007, 20).is_none());
        let fibers = lcg_fibers(MIN_SPACING_SAMPLE + 1, 1_000_000_007);
        assert!(spacing_stats(&fibers, 1_000_000_007, 20).is_some());
    }

    #[test]
    fn test_spacing_of_uniform_fibers() {
        let fibers = lcg_fibers(20_000, 1_000_000_007);
        let stats = spacing_stats(&fibers, 1_000_000_007, 20).unwrap();
        assert_eq!(stats.normalized.len(), 19_999);
        // Exp(1) spacings: P(s < 0.05) = 1 - e^-0.05 ~ 4.9%.
        assert!(stats.near_zero_pct > 3.0 && stats.near_zero_pct < 7.0);
        assert!((stats.histogram.integral() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_drift_check() {
        let o = outcome(
            vec![true, true, false, true],
            vec![1, 2, 3, 4],
            vec![1, 9, 7, 4],
        );
        let d = drift_check(&o);
        assert_eq!(d.checked, 3);
        assert_eq!(d.drifts, 1);
        assert_eq!(d.verdict, Verdict::Deviations(1));
        assert_eq!(d.verdict.to_string(), "1 deviations");
    }

    #[test]
    fn test_drift_check_zero() {
        let o = outcome(vec![true, false], vec![5, 6], vec![5, 0]);
        assert_eq!(drift_check(&o).verdict, Verdict::ZeroDrift);
    }

    #[test]
    fn test_analyze_small_outcome() {
        let o = outcome(vec![true, false, true], vec![1, 2, 3], vec![1, 5, 3]);
        let a = analyze(&o, 11, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(a.partition.survivors, 2);
        assert!(a.spacing.is_none());
        assert_eq!(a.drift.verdict, Verdict::ZeroDrift);
    }
}
