use std::path::Path;

use fibercycle_core::{BatteryEntry, RunReport, SimError, run_simulation};
use fibercycle_tests::TestResult;

use super::ConfigOverrides;
use super::report;

pub struct RunCommandConfig<'a> {
    pub config_path: Option<&'a str>,
    pub overrides: ConfigOverrides,
    pub battery: bool,
    pub bins: usize,
    pub width: usize,
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: RunCommandConfig<'_>) -> Result<(), SimError> {
    let config = super::build_config(cfg.config_path, cfg.overrides)?;
    log::info!("effective config: {config:?}");

    println!(
        "--- fibercycle v{} | N={} P={} K={} ---",
        fibercycle_core::VERSION,
        config.batch_size,
        config.prime_mod,
        config.k_factor
    );
    println!(
        ">> Burn-in {} steps, then {} test steps ({} cycles of 3)...",
        config.burn_in_steps,
        config.test_window(),
        config.test_cycles
    );

    let run = run_simulation(&config, cfg.bins)?;
    println!(
        ">> seed {} ({:.2}s)\n",
        run.seed,
        run.elapsed.as_secs_f64()
    );
    print!("{}", report::render(&run, cfg.width));

    let battery = if cfg.battery {
        match run.analysis.spacing.as_ref() {
            Some(spacing) => {
                let results = fibercycle_tests::run_all_tests(&spacing.normalized);
                println!();
                print!("{}", report::render_battery(&results));
                Some(results.iter().map(battery_entry).collect::<Vec<_>>())
            }
            None => {
                println!("\nBattery skipped: no spacing statistics for this run.");
                None
            }
        }
    } else {
        None
    };

    if let Some(path) = cfg.output_path {
        let mut out = RunReport::from_run(&run);
        if let Some(entries) = battery {
            out = out.with_battery(entries);
        }
        out.write_json(Path::new(path))?;
        println!("\nReport saved to: {path}");
    }
    Ok(())
}

fn battery_entry(r: &TestResult) -> BatteryEntry {
    BatteryEntry {
        name: r.name.clone(),
        passed: r.passed,
        p_value: r.p_value,
        statistic: r.statistic,
        grade: r.grade,
        details: r.details.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_entry_copies_fields() {
        let r = TestResult {
            name: "Spacing Variance".into(),
            passed: false,
            p_value: Some(0.002),
            statistic: 1.7,
            details: "var=1.7".into(),
            grade: 'C',
        };
        let e = battery_entry(&r);
        assert_eq!(e.name, "Spacing Variance");
        assert!(!e.passed);
        assert_eq!(e.p_value, Some(0.002));
        assert_eq!(e.grade, 'C');
        assert_eq!(e.details, "var=1.7");
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        run(RunCommandConfig {
            config_path: None,
            overrides: ConfigOverrides {
                batch_size: Some(3_000),
                burn_in_steps: Some(300),
                seed: Some(11),
                ..Default::default()
            },
            battery: true,
            bins: 20,
            width: 40,
            output_path: path.to_str(),
        })
        .unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"seed\": 11"));
        assert!(raw.contains("\"survival_curve\""));
    }

    #[test]
    fn test_run_returns_config_errors() {
        let err = run(RunCommandConfig {
            config_path: None,
            overrides: ConfigOverrides {
                test_cycles: Some(0),
                ..Default::default()
            },
            battery: false,
            bins: 20,
            width: 40,
            output_path: None,
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_run_reports_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = run(RunCommandConfig {
            config_path: None,
            overrides: ConfigOverrides {
                batch_size: Some(200),
                burn_in_steps: Some(50),
                seed: Some(3),
                ..Default::default()
            },
            battery: false,
            bins: 20,
            width: 40,
            output_path: path.to_str(),
        })
        .unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
