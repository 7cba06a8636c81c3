//! # fibercycle-core
//!
//! **Which trajectories does the carry-coupled Collatz map capture?**
//!
//! Every batch element carries a trajectory value `w` and a fiber value
//! `n ∈ [0, P)`. Each step branches on the parity of `w`: even elements halve
//! `w` and multiply `n` by `2⁻¹ mod P`; odd elements send `w` to
//! `3w + 1 + ⌊K·n / P⌋` and `n` to `K·n mod P`. The carry `⌊K·n / P⌋` is the
//! only way the fiber reaches back into the trajectory.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fibercycle_core::{SimulationConfig, run_simulation};
//!
//! let config = SimulationConfig { seed: Some(42), ..Default::default() };
//! let run = run_simulation(&config, 20).unwrap();
//!
//! println!(
//!     "{} survivors ({:.2}%), drift: {}",
//!     run.analysis.partition.survivors,
//!     run.analysis.partition.survivor_pct,
//!     run.analysis.drift.verdict,
//! );
//! ```
//!
//! ## Architecture
//!
//! Generator → Burn-in (discarded) → Test window + filter → Survivor analysis
//!
//! - [`Batch`]: paired `w`/`n` arrays, seeded generation.
//! - [`Trajectory`]: exact `w`, an `i64` that widens to a big integer on
//!   overflow.
//! - [`StepEngine`]: one step of the coupled map, sequential or threaded.
//! - [`StabilityFilter`]: burn-in, then a one-way stable mask over
//!   `TEST_CYCLES · 3` steps with fiber snapshots at both ends.
//! - [`analysis`]: partition counts, spacing statistics, drift check.
//! - [`RunReport`]: JSON output of a run.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod modular;
pub mod report;
pub mod trajectory;

use std::time::{Duration, Instant};

pub use analysis::{
    DriftCheck, Histogram, HistogramBar, HistogramBin, PartitionCounts, SpacingStats,
    SurvivorAnalysis, Verdict, analyze,
};
pub use batch::{Batch, resolve_seed};
pub use config::{CYCLE_PERIOD, SimulationConfig};
pub use engine::{Branch, StepEngine};
pub use error::SimError;
pub use filter::{
    StabilityFilter, StabilityOutcome, TARGET_CYCLE, in_target_cycle, trajectory_in_target_cycle,
};
pub use modular::inverse_of_two;
pub use report::{BatteryEntry, RunReport};
pub use trajectory::Trajectory;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A finished run: the config it used, the seed, and what came out.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub config: SimulationConfig,
    pub seed: u64,
    pub outcome: StabilityOutcome,
    pub analysis: SurvivorAnalysis,
    pub elapsed: Duration,
}

/// Generate, burn in, test, and analyze one batch.
pub fn run_simulation(
    config: &SimulationConfig,
    histogram_bins: usize,
) -> Result<SimulationRun, SimError> {
    let t0 = Instant::now();
    let engine = StepEngine::new(config)?;
    let seed = resolve_seed(config)?;

    let mut batch = Batch::generate(config, seed)?;
    let filter = StabilityFilter::new(engine, config);
    let outcome = filter.run(&mut batch);
    let analysis = analyze(&outcome, config.prime_mod, histogram_bins);

    Ok(SimulationRun {
        config: config.clone(),
        seed,
        outcome,
        analysis,
        elapsed: t0.elapsed(),
    })
}
