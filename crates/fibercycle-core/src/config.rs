//! Immutable run configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::modular::is_prime;

pub const DEFAULT_PRIME_MOD: i64 = 1_000_000_007;
pub const DEFAULT_K_FACTOR: i64 = 4;
pub const DEFAULT_BATCH_SIZE: usize = 100_000;
pub const DEFAULT_BURN_IN_STEPS: usize = 2_000;
pub const DEFAULT_TEST_CYCLES: usize = 10;

/// Period of the `1 -> 4 -> 2 -> 1` target cycle.
pub const CYCLE_PERIOD: usize = 3;

/// Constants for a single batch run.
///
/// Missing fields in a JSON file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Prime modulus for the fiber recurrence.
    pub prime_mod: i64,
    /// Multiplier in the odd branch; also sets the carry range `[0, k_factor)`.
    pub k_factor: i64,
    /// Number of independent trajectories.
    pub batch_size: usize,
    /// Steps run and discarded before observation starts.
    pub burn_in_steps: usize,
    /// Number of full target-cycle periods in the test window.
    pub test_cycles: usize,
    /// Generator seed. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Worker threads per step. 1 keeps the run sequential.
    pub threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            prime_mod: DEFAULT_PRIME_MOD,
            k_factor: DEFAULT_K_FACTOR,
            batch_size: DEFAULT_BATCH_SIZE,
            burn_in_steps: DEFAULT_BURN_IN_STEPS,
            test_cycles: DEFAULT_TEST_CYCLES,
            seed: None,
            threads: 1,
        }
    }
}

impl SimulationConfig {
    /// Load a config from a JSON file.
    pub fn from_json_path(path: &Path) -> Result<Self, SimError> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&raw)?;
        log::info!("loaded simulation config from {}", path.display());
        Ok(config)
    }

    /// Length of the test window in steps.
    pub fn test_window(&self) -> usize {
        self.test_cycles * CYCLE_PERIOD
    }

    /// Total steps of a run: burn-in plus test window.
    pub fn total_steps(&self) -> usize {
        self.burn_in_steps + self.test_window()
    }

    /// Check every constraint the engine relies on.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.prime_mod < 3 {
            return Err(SimError::InvalidConfig(format!(
                "prime_mod must be an odd prime >= 3, got {}",
                self.prime_mod
            )));
        }
        if !is_prime(self.prime_mod as u64) {
            return Err(SimError::NonPrimeModulus(self.prime_mod));
        }
        if self.k_factor < 1 {
            return Err(SimError::InvalidConfig(format!(
                "k_factor must be >= 1, got {}",
                self.k_factor
            )));
        }
        if self.k_factor.checked_mul(self.prime_mod).is_none() {
            return Err(SimError::InvalidConfig(format!(
                "k_factor * prime_mod overflows i64 ({} * {})",
                self.k_factor, self.prime_mod
            )));
        }
        if self.batch_size == 0 {
            return Err(SimError::InvalidConfig("batch_size must be >= 1".into()));
        }
        if self.test_cycles == 0 {
            return Err(SimError::InvalidConfig("test_cycles must be >= 1".into()));
        }
        if self.threads == 0 {
            return Err(SimError::InvalidConfig("threads must be >= 1".into()));
        }
        Ok(())
    }
}
