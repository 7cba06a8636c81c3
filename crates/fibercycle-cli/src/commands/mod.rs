pub mod inverse;
pub mod report;
pub mod run;
pub mod trace;

use std::path::Path;

use fibercycle_core::{SimError, SimulationConfig};

/// Flag values that replace fields of the loaded (or default) config.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigOverrides {
    pub prime_mod: Option<i64>,
    pub k_factor: Option<i64>,
    pub batch_size: Option<usize>,
    pub burn_in_steps: Option<usize>,
    pub test_cycles: Option<usize>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(v) = self.prime_mod {
            config.prime_mod = v;
        }
        if let Some(v) = self.k_factor {
            config.k_factor = v;
        }
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.burn_in_steps {
            config.burn_in_steps = v;
        }
        if let Some(v) = self.test_cycles {
            config.test_cycles = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(v) = self.threads {
            config.threads = v;
        }
        config
    }
}

/// Load the JSON config (or defaults), apply flag overrides, then validate.
pub fn build_config(
    config_path: Option<&str>,
    overrides: ConfigOverrides,
) -> Result<SimulationConfig, SimError> {
    let base = match config_path {
        Some(path) => SimulationConfig::from_json_path(Path::new(path))?,
        None => SimulationConfig::default(),
    };
    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}

/// Install `env_logger`. `RUST_LOG` wins; otherwise `-v` raises the default.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Print the error and exit with status 1.
pub fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // ConfigOverrides tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let config = ConfigOverrides::default().apply(SimulationConfig::default());
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_overrides_replace_fields() {
        let config = ConfigOverrides {
            batch_size: Some(500),
            seed: Some(9),
            threads: Some(2),
            ..Default::default()
        }
        .apply(SimulationConfig::default());
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.threads, 2);
        assert_eq!(config.prime_mod, 1_000_000_007);
    }

    // -----------------------------------------------------------------------
    // build_config tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        std::fs::write(&path, r#"{"batch_size": 1234, "burn_in_steps": 10}"#).unwrap();

        let config = build_config(
            path.to_str(),
            ConfigOverrides {
                burn_in_steps: Some(77),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.batch_size, 1234);
        assert_eq!(config.burn_in_steps, 77);
        assert_eq!(config.test_cycles, 10);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = build_config(
            None,
            ConfigOverrides {
                prime_mod: Some(1_000_000_008),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, SimError::NonPrimeModulus(1_000_000_008)));
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = build_config(path.to_str(), ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
