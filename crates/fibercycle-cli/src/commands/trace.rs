use std::fmt::Write;

use fibercycle_core::{
    Branch, SimError, SimulationConfig, StepEngine, Trajectory, trajectory_in_target_cycle,
};

/// One row of a single-trajectory trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    pub step: usize,
    pub w: Trajectory,
    pub n: i64,
    pub branch: Branch,
}

/// Follow `(w, n)` for `steps` steps.
pub fn trace(engine: &StepEngine, w: i64, n: i64, steps: usize) -> Vec<TraceRow> {
    let mut rows = Vec::with_capacity(steps + 1);
    let (mut w, mut n) = (Trajectory::from(w), n);
    for step in 0..=steps {
        rows.push(TraceRow {
            step,
            w: w.clone(),
            n,
            branch: engine.branch(&w, n),
        });
        if step < steps {
            engine.step_element(&mut w, &mut n);
        }
    }
    rows
}

pub fn render_rows(rows: &[TraceRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6} {:>22} {:>12} {:>6} {:>6} {:>6}",
        "step", "w", "n", "branch", "carry", "cycle"
    );
    let _ = writeln!(out, "{}", "-".repeat(63));
    for r in rows {
        let (branch, carry) = match r.branch {
            Branch::Even => ("even", "-".to_string()),
            Branch::Odd { carry } => ("odd", carry.to_string()),
        };
        let _ = writeln!(
            out,
            "{:>6} {:>22} {:>12} {:>6} {:>6} {:>6}",
            r.step,
            r.w,
            r.n,
            branch,
            carry,
            if trajectory_in_target_cycle(&r.w) { "*" } else { "" }
        );
    }
    out
}

pub fn run(w: i64, n: i64, steps: usize, prime_mod: i64, k_factor: i64) -> Result<(), SimError> {
    let config = SimulationConfig {
        prime_mod,
        k_factor,
        ..Default::default()
    };
    let engine = StepEngine::new(&config)?;
    if !(0..prime_mod).contains(&n) {
        return Err(SimError::InvalidConfig(format!(
            "fiber value n={n} is outside [0, {prime_mod})"
        )));
    }

    println!("Tracing (w={w}, n={n}) for {steps} steps, P={prime_mod}, K={k_factor}\n");
    let rows = trace(&engine, w, n, steps);
    print!("{}", render_rows(&rows));
    if let Some(last) = rows.last() {
        log::info!("final w has {} bits", last.w.bits());
    }
    Ok(())
}
