//! Machine-readable run report.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{DriftCheck, PartitionCounts, SpacingStats};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::SimulationRun;

/// Report schema version.
pub const REPORT_VERSION: u32 = 1;

/// One row from an external statistical battery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatteryEntry {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub grade: char,
    pub details: String,
}

/// Everything a single run produced, written once as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: u32,
    pub id: String,
    pub fibercycle_version: String,
    pub config: SimulationConfig,
    pub seed: u64,
    pub elapsed_ms: u64,
    pub partition: PartitionCounts,
    pub spacing: Option<SpacingStats>,
    pub drift: DriftCheck,
    pub survival_curve: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<Vec<BatteryEntry>>,
}

impl RunReport {
    pub fn from_run(run: &SimulationRun) -> Self {
        Self {
            version: REPORT_VERSION,
            id: Uuid::new_v4().to_string(),
            fibercycle_version: crate::VERSION.to_string(),
            config: SimulationConfig {
                seed: Some(run.seed),
                ..run.config.clone()
            },
            seed: run.seed,
            elapsed_ms: run.elapsed.as_millis() as u64,
            partition: run.analysis.partition,
            spacing: run.analysis.spacing.clone(),
            drift: run.analysis.drift,
            survival_curve: run.outcome.survival_curve.clone(),
            battery: None,
        }
    }

    pub fn with_battery(mut self, battery: Vec<BatteryEntry>) -> Self {
        self.battery = Some(battery);
        self
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), SimError> {
        fs::write(path, self.to_json()?)?;
        log::info!("wrote run report {} to {}", self.id, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_simulation;

    fn small_run() -> SimulationRun {
        let config = SimulationConfig {
            batch_size: 2_000,
            burn_in_steps: 200,
            seed: Some(17),
            ..Default::default()
        };
        run_simulation(&config, 20).unwrap()
    }

    #[test]
    fn test_report_pins_seed() {
        let run = small_run();
        let report = RunReport::from_run(&run);
        assert_eq!(report.seed, 17);
        assert_eq!(report.config.seed, Some(17));
        assert_eq!(report.version, REPORT_VERSION);
        assert_eq!(report.survival_curve.len(), 31);
    }

    #[test]
    fn test_report_json_shape() {
        let report = RunReport::from_run(&small_run()).with_battery(vec![BatteryEntry {
            name: "KS".into(),
            passed: true,
            p_value: Some(0.4),
            statistic: 0.01,
            grade: 'A',
            details: String::new(),
        }]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["config"]["prime_mod"], 1_000_000_007);
        assert!(json["drift"]["verdict"]["kind"].is_string());
        assert_eq!(json["battery"][0]["grade"], "A");
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let report = RunReport::from_run(&small_run());
        report.write_json(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(&report.id));
        assert!(!raw.contains("\"battery\""));
    }
}
