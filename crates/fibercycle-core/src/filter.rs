//! Burn-in plus a narrowing "still in the cycle" filter.
//!
//! Protocol:
//! 1. Run `burn_in_steps` steps and discard them.
//! 2. Seed the mask with `w ∈ {1, 2, 4}` and snapshot `n`.
//! 3. Run `test_cycles * 3` steps, AND-ing the mask with membership after each.
//! 4. Snapshot `n` again.
//!
//! A cleared mask bit never comes back, so survivors are elements that sat in
//! the `1 -> 4 -> 2 -> 1` cycle for the whole window.

use std::time::Instant;

use serde::Serialize;

use crate::batch::Batch;
use crate::config::SimulationConfig;
use crate::engine::StepEngine;
use crate::trajectory::Trajectory;

/// Trajectory values of the target cycle.
pub const TARGET_CYCLE: [i64; 3] = [1, 2, 4];

/// Membership in the target cycle.
#[inline]
pub fn in_target_cycle(w: i64) -> bool {
    TARGET_CYCLE.contains(&w)
}

/// [`in_target_cycle`] for a possibly wide trajectory value.
#[inline]
pub fn trajectory_in_target_cycle(w: &Trajectory) -> bool {
    w.as_i64().is_some_and(in_target_cycle)
}

/// Result of the test phase.
#[derive(Debug, Clone, Serialize)]
pub struct StabilityOutcome {
    /// `true` for elements that stayed in the target cycle for the whole window.
    pub mask: Vec<bool>,
    /// Fiber values when the test window opened.
    pub n_start: Vec<i64>,
    /// Fiber values when the test window closed.
    pub n_end: Vec<i64>,
    /// Stable count after the seed check, then after every test step.
    pub survival_curve: Vec<usize>,
}

impl StabilityOutcome {
    pub fn survivor_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// `(start, end)` fiber pairs of the survivors, in batch order.
    pub fn survivor_snapshots(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.mask
            .iter()
            .zip(self.n_start.iter().zip(&self.n_end))
            .filter(|(m, _)| **m)
            .map(|(_, (&s, &e))| (s, e))
    }

    /// End-of-window fiber values of the survivors, in batch order.
    pub fn survivor_fibers(&self) -> Vec<i64> {
        self.survivor_snapshots().map(|(_, end)| end).collect()
    }
}

/// Drives the engine through burn-in and the test window.
#[derive(Debug, Clone, Copy)]
pub struct StabilityFilter {
    engine: StepEngine,
    burn_in_steps: usize,
    test_steps: usize,
    threads: usize,
}

impl StabilityFilter {
    pub fn new(engine: StepEngine, config: &SimulationConfig) -> Self {
        Self {
            engine,
            burn_in_steps: config.burn_in_steps,
            test_steps: config.test_window(),
            threads: config.threads,
        }
    }

    pub fn test_steps(&self) -> usize {
        self.test_steps
    }

    /// Mix the batch away from its initial distribution.
    pub fn burn_in(&self, batch: &mut Batch) {
        let t0 = Instant::now();
        self.engine.advance(batch, self.burn_in_steps, self.threads);
        log::info!(
            "burn-in: {} steps over {} elements in {:.2}s, {} beyond i64",
            self.burn_in_steps,
            batch.len(),
            t0.elapsed().as_secs_f64(),
            batch.big_count()
        );
    }

    /// Run the test window and classify every element.
    pub fn run_test(&self, batch: &mut Batch) -> StabilityOutcome {
        self.run_test_observed(batch, |_, _| {})
    }

    /// [`run_test`](Self::run_test), calling `observe(step, mask)` after every step.
    pub fn run_test_observed<F>(
        &self,
        batch: &mut Batch,
        mut observe: F,
    ) -> StabilityOutcome
    where
        F: FnMut(usize, &[bool]),
    {
        let t0 = Instant::now();
        let mut mask: Vec<bool> = batch.w.iter().map(trajectory_in_target_cycle).collect();
        let n_start = batch.n.clone();

        let mut survival_curve = Vec::with_capacity(self.test_steps + 1);
        survival_curve.push(mask.iter().filter(|&&m| m).count());
        log::debug!("test seed: {} candidates", survival_curve[0]);

        for step in 0..self.test_steps {
            self.engine.step_parallel(batch, self.threads);

            let mut stable = 0usize;
            for (m, w) in mask.iter_mut().zip(&batch.w) {
                *m &= trajectory_in_target_cycle(w);
                stable += *m as usize;
            }
            survival_curve.push(stable);
            log::debug!("test step {step}: {stable} stable");
            observe(step, &mask);
        }

        log::info!(
            "test window: {} steps, {} survivors in {:.2}s",
            self.test_steps,
            survival_curve.last().copied().unwrap_or(0),
            t0.elapsed().as_secs_f64()
        );

        StabilityOutcome {
            mask,
            n_start,
            n_end: batch.n.clone(),
            survival_curve,
        }
    }

    /// Burn-in followed by the test window.
    pub fn run(&self, batch: &mut Batch) -> StabilityOutcome {
        self.burn_in(batch);
        self.run_test(batch)
    }
}
