//! Batch state and the seeded initial-state generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::trajectory::Trajectory;

/// Initial trajectories are `2r + 1` with `r` uniform in `[0, 2^30)`.
const INITIAL_R_BOUND: i64 = 1 << 30;

/// Paired trajectory and fiber state for every element of a run.
///
/// Index identity is stable: elements are never reordered, added, or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub(crate) w: Vec<Trajectory>,
    pub(crate) n: Vec<i64>,
}

impl Batch {
    /// Draw a fresh batch from a seeded generator.
    pub fn generate(config: &SimulationConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let size = config.batch_size;
        let mut w = Vec::with_capacity(size);
        let mut n = Vec::with_capacity(size);
        for _ in 0..size {
            w.push(Trajectory::Small(2 * rng.random_range(0..INITIAL_R_BOUND) + 1));
        }
        for _ in 0..size {
            n.push(rng.random_range(1..config.prime_mod));
        }
        log::debug!("generated batch of {size} elements from seed {seed}");
        Ok(Self { w, n })
    }

    /// Build a batch from explicit arrays, checking both lengths against
    /// `batch_size` and every fiber against `[0, prime_mod)`.
    pub fn from_parts(
        w: Vec<i64>,
        n: Vec<i64>,
        config: &SimulationConfig,
    ) -> Result<Self, SimError> {
        let prime_mod = config.prime_mod;
        if w.len() != config.batch_size || n.len() != config.batch_size {
            return Err(SimError::InvalidBatch(format!(
                "expected {} elements, got {} trajectories and {} fibers",
                config.batch_size,
                w.len(),
                n.len()
            )));
        }
        if let Some((i, &v)) = n
            .iter()
            .enumerate()
            .find(|(_, v)| !(0..prime_mod).contains(*v))
        {
            return Err(SimError::InvalidBatch(format!(
                "fiber value {v} at index {i} outside [0, {prime_mod})"
            )));
        }
        Ok(Self {
            w: w.into_iter().map(Trajectory::Small).collect(),
            n,
        })
    }

    pub fn len(&self) -> usize {
        self.w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    /// Trajectory values.
    pub fn trajectories(&self) -> &[Trajectory] {
        &self.w
    }

    /// Fiber values.
    pub fn fibers(&self) -> &[i64] {
        &self.n
    }

    /// Elements whose trajectory has left the `i64` range.
    pub fn big_count(&self) -> usize {
        self.w.iter().filter(|w| w.is_big()).count()
    }

    /// Consume the batch into its `(w, n)` arrays.
    pub fn into_parts(self) -> (Vec<Trajectory>, Vec<i64>) {
        (self.w, self.n)
    }
}

/// Use the configured seed, or draw one from the OS and log it so the run
/// can be reproduced.
pub fn resolve_seed(config: &SimulationConfig) -> Result<u64, SimError> {
    if let Some(seed) = config.seed {
        return Ok(seed);
    }
    let mut buf = [0u8; 8];
    getrandom::fill(&mut buf).map_err(|e| std::io::Error::other(e.to_string()))?;
    let seed = u64::from_le_bytes(buf);
    log::info!("no seed configured, drew {seed} from the OS");
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            batch_size: 2_000,
            ..Default::default()
        }
    }

    fn tiny_config(batch_size: usize) -> SimulationConfig {
        SimulationConfig {
            prime_mod: 11,
            batch_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_shapes_and_ranges() {
        let config = small_config();
        let batch = Batch::generate(&config, 7).unwrap();
        assert_eq!(batch.len(), 2_000);
        assert_eq!(batch.big_count(), 0);
        for w in batch.trajectories() {
            let w = w.as_i64().unwrap();
            assert!(w > 0 && w % 2 == 1, "w={w}");
            assert!(w < 2 * INITIAL_R_BOUND);
        }
        for &n in batch.fibers() {
            assert!((1..config.prime_mod).contains(&n), "n={n}");
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        let config = small_config();
        let a = Batch::generate(&config, 99).unwrap();
        assert_eq!(a, Batch::generate(&config, 99).unwrap());
        assert_ne!(a, Batch::generate(&config, 100).unwrap());
    }

    #[test]
    fn test_generate_rejects_unvalidated_config() {
        for prime_mod in [0, 1, 9] {
            let config = SimulationConfig {
                prime_mod,
                ..small_config()
            };
            assert!(Batch::generate(&config, 1).is_err(), "prime_mod={prime_mod}");
        }
    }

    #[test]
    fn test_from_parts_checks_lengths() {
        let err = Batch::from_parts(vec![1, 2], vec![3], &tiny_config(2)).unwrap_err();
        assert!(matches!(err, SimError::InvalidBatch(_)));
    }

    #[test]
    fn test_from_parts_checks_batch_size() {
        let err = Batch::from_parts(vec![1, 3, 5], vec![1, 2, 3], &tiny_config(2)).unwrap_err();
        assert!(matches!(err, SimError::InvalidBatch(ref msg) if msg.contains("expected 2")));
        assert!(Batch::from_parts(vec![1, 3, 5], vec![1, 2, 3], &tiny_config(3)).is_ok());
    }

    #[test]
    fn test_from_parts_checks_fiber_range() {
        let config = tiny_config(1);
        assert!(Batch::from_parts(vec![1], vec![11], &config).is_err());
        assert!(Batch::from_parts(vec![1], vec![-1], &config).is_err());
        let ok = Batch::from_parts(vec![1, 3], vec![0, 10], &tiny_config(2)).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.trajectories()[1], Trajectory::Small(3));
    }

    #[test]
    fn test_resolve_seed_prefers_config() {
        let config = SimulationConfig {
            seed: Some(1234),
            ..Default::default()
        };
        assert_eq!(resolve_seed(&config).unwrap(), 1234);
        assert!(resolve_seed(&SimulationConfig::default()).is_ok());
    }
}
