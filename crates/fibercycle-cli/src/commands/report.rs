//! Text rendering of a finished run.

use std::fmt::Write;

use fibercycle_core::analysis::NEAR_ZERO_THRESHOLD;
use fibercycle_core::{
    DriftCheck, Histogram, PartitionCounts, SimulationRun, SpacingStats, Verdict,
};
use fibercycle_tests::TestResult;

pub fn render_partition(p: &PartitionCounts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[RESULTS]");
    let _ = writeln!(
        out,
        "Stable survivors ({{1,2,4}} cycle): {:>8} ({:.2}%)",
        p.survivors, p.survivor_pct
    );
    let _ = writeln!(
        out,
        "Rejected transients:              {:>8} ({:.2}%)",
        p.rejected, p.rejected_pct
    );
    out
}

/// Histogram rows: `midpoint | bar (density)`.
pub fn render_histogram(title: &str, hist: &Histogram, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{title}]");
    let _ = writeln!(out, "   Spacing (s) | Density P(s)");
    let _ = writeln!(out, "{}", "-".repeat(width + 20));
    for bar in hist.bars(width) {
        let _ = writeln!(
            out,
            "   {:5.2}       | {:<width$} ({:5.2})",
            bar.midpoint,
            "#".repeat(bar.bar_len),
            bar.density,
        );
    }
    out
}

pub fn render_spacing(spacing: Option<&SpacingStats>, survivors: usize, width: usize) -> String {
    let Some(s) = spacing else {
        return format!(
            "[SPECTRAL STATISTICS]\nSkipped: {survivors} survivors is too few for spacing statistics.\n"
        );
    };
    let mut out = String::new();
    let _ = writeln!(out, "[SPECTRAL STATISTICS]");
    let _ = writeln!(out, "Sample size:      {}", s.sample_size);
    let _ = writeln!(out, "Mean raw spacing: {:.3e}", s.mean_spacing);
    let _ = writeln!(
        out,
        "Near-zero spacings (<{NEAR_ZERO_THRESHOLD}): {:.2}%",
        s.near_zero_pct
    );
    let _ = writeln!(out, "High clustering indicates resonance zones.");
    out.push('\n');
    out.push_str(&render_histogram(
        "SURVIVOR SPACING SPECTRUM",
        &s.histogram,
        width,
    ));
    out
}

pub fn render_drift(drift: &DriftCheck) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[ZERO ATTRACTOR CHECK]");
    let _ = writeln!(
        out,
        "Fiber drifts across {} survivors: {}",
        drift.checked, drift.drifts
    );
    match drift.verdict {
        Verdict::ZeroDrift => {
            let _ = writeln!(out, ">> VERDICT: zero drift. Every survivor's fiber closed.");
        }
        Verdict::Deviations(n) => {
            let _ = writeln!(out, ">> VERDICT: {n} deviations detected.");
        }
    }
    out
}

/// Stable count at the start, middle, and end of the test window.
pub fn render_survival_curve(curve: &[usize]) -> String {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return String::new();
    };
    let mid = curve[curve.len() / 2];
    format!(
        "Survival curve over {} steps: {first} -> {mid} -> {last}\n",
        curve.len() - 1
    )
}

pub fn render_battery(results: &[TestResult]) -> String {
    let mut out = String::new();
    let score = fibercycle_tests::calculate_quality_score(results);
    let passed = results.iter().filter(|r| r.passed).count();
    let _ = writeln!(
        out,
        "[SPACING BATTERY vs Exp(1)] {score:.0}/100 ({passed}/{} passed)",
        results.len()
    );
    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(
        out,
        "{:<24} {:>10} {:>6} {:>6}",
        "Test", "p-value", "Grade", "Pass"
    );
    for r in results {
        let p = r
            .p_value
            .map(|p| format!("{p:.4}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<24} {:>10} {:>6} {:>6}",
            r.name,
            p,
            r.grade,
            if r.passed { "yes" } else { "no" }
        );
    }
    out
}

/// Full human-readable report for a run.
pub fn render(run: &SimulationRun, width: usize) -> String {
    let a = &run.analysis;
    let mut out = String::new();
    out.push_str(&render_partition(&a.partition));
    out.push_str(&render_survival_curve(&run.outcome.survival_curve));
    out.push('\n');
    out.push_str(&render_spacing(
        a.spacing.as_ref(),
        a.partition.survivors,
        width,
    ));
    out.push('\n');
    out.push_str(&render_drift(&a.drift));
    out
}
