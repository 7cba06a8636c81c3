//! One time step of the coupled `(w, n)` recurrence.
//!
//! For each element, branching only on the parity of `w`:
//!
//! ```text
//! even:  w' = w / 2                 n' = n * inv2 mod P
//! odd:   w' = 3w + 1 + floor(K*n/P) n' = K * n mod P
//! ```
//!
//! The fiber map never looks at `w`'s magnitude; the carry `floor(K*n/P)` is
//! the only path from `n` into `w`. It is exact integer division. `w` itself
//! is unbounded (see [`Trajectory`]), so a step never fails.

use crate::batch::Batch;
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::modular::{inverse_of_two, mul_mod};
use crate::trajectory::Trajectory;

/// Which side of the map an element took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Even,
    Odd { carry: i64 },
}

/// Precomputed constants for stepping a batch. Built once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEngine {
    prime_mod: i64,
    k_factor: i64,
    inv2: i64,
}

impl StepEngine {
    /// Validate the config and precompute the inverse of two.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            prime_mod: config.prime_mod,
            k_factor: config.k_factor,
            inv2: inverse_of_two(config.prime_mod),
        })
    }

    pub fn prime_mod(&self) -> i64 {
        self.prime_mod
    }

    pub fn k_factor(&self) -> i64 {
        self.k_factor
    }

    pub fn inv2(&self) -> i64 {
        self.inv2
    }

    /// `floor(K*n / P)`, in `[0, K)` for `n` in `[0, P)`.
    #[inline]
    pub fn carry(&self, n: i64) -> i64 {
        // k * n < k * P, which validation keeps inside i64.
        self.k_factor * n / self.prime_mod
    }

    /// Branch an element would take, without stepping it.
    pub fn branch(&self, w: &Trajectory, n: i64) -> Branch {
        if w.is_even() {
            Branch::Even
        } else {
            Branch::Odd {
                carry: self.carry(n),
            }
        }
    }

    /// Step a single element in place.
    #[inline]
    pub fn step_element(&self, w: &mut Trajectory, n: &mut i64) {
        if w.is_even() {
            w.halve();
            *n = mul_mod(*n as u64, self.inv2 as u64, self.prime_mod as u64) as i64;
        } else {
            let kn = self.k_factor * *n;
            w.triple_plus_one(kn / self.prime_mod);
            *n = kn % self.prime_mod;
        }
    }

    /// Step every element of the batch in place.
    pub fn step(&self, batch: &mut Batch) {
        self.step_slices(&mut batch.w, &mut batch.n);
    }

    /// Same result as [`step`](Self::step), fanned out over scoped threads.
    pub fn step_parallel(&self, batch: &mut Batch, threads: usize) {
        let len = batch.len();
        if threads <= 1 || len < 2 {
            self.step(batch);
            return;
        }
        let chunk = len.div_ceil(threads);

        std::thread::scope(|s| {
            for (w, n) in batch.w.chunks_mut(chunk).zip(batch.n.chunks_mut(chunk)) {
                s.spawn(move || self.step_slices(w, n));
            }
        });
    }

    /// Run `steps` steps.
    pub fn advance(&self, batch: &mut Batch, steps: usize, threads: usize) {
        for _ in 0..steps {
            self.step_parallel(batch, threads);
        }
    }

    fn step_slices(&self, w: &mut [Trajectory], n: &mut [i64]) {
        for (wi, ni) in w.iter_mut().zip(n.iter_mut()) {
            self.step_element(wi, ni);
        }
    }
}
