//! Campaigns: run many seeds, collect failures, replay one seed in full.

use std::ops::Range;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{SimStats, SimulationConfig, SimulationResult, Simulator};

/// Seed range plus the per-seed simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub seed_range: Range<u64>,
    pub steps: usize,
    pub initial_items: usize,
    pub create_percent: u8,
    pub remove_percent: u8,
    pub miss_percent: u8,
    pub invalid_percent: u8,
    pub overshoot: usize,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let sim = SimulationConfig::default();
        Self {
            seed_range: 0..100,
            steps: sim.steps,
            initial_items: sim.initial_items,
            create_percent: sim.create_percent,
            remove_percent: sim.remove_percent,
            miss_percent: sim.miss_percent,
            invalid_percent: sim.invalid_percent,
            overshoot: sim.overshoot,
        }
    }
}

impl CampaignConfig {
    #[must_use]
    pub const fn sim_config_for_seed(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            steps: self.steps,
            initial_items: self.initial_items,
            create_percent: self.create_percent,
            remove_percent: self.remove_percent,
            miss_percent: self.miss_percent,
            invalid_percent: self.invalid_percent,
            overshoot: self.overshoot,
        }
    }

    /// # Errors
    ///
    /// Returns an error for an empty seed range, zero steps, or a percentage
    /// above 100.
    pub fn validate(&self) -> Result<()> {
        if self.seed_range.is_empty() {
            bail!("seed_range must not be empty");
        }
        if self.steps == 0 {
            bail!("steps must be > 0");
        }
        for (name, value) in [
            ("create_percent", self.create_percent),
            ("remove_percent", self.remove_percent),
            ("miss_percent", self.miss_percent),
            ("invalid_percent", self.invalid_percent),
        ] {
            if value > 100 {
                bail!("{name} must be at most 100, got {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    pub seed: u64,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub seeds_run: usize,
    pub seeds_passed: usize,
    /// First failing seed, the one to replay.
    pub first_failure: Option<u64>,
    pub failures: Vec<SeedFailure>,
    /// Outcome totals across every seed.
    pub totals: SimStats,
}

impl CampaignReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every seed in `config.seed_range`.
///
/// # Errors
///
/// Returns an error if the config is invalid or a seed cannot be set up.
pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    config.validate()?;

    let mut report = CampaignReport {
        seeds_run: 0,
        seeds_passed: 0,
        first_failure: None,
        failures: Vec::new(),
        totals: SimStats::default(),
    };

    for seed in config.seed_range.clone() {
        let result = Simulator::new(config.sim_config_for_seed(seed))?.run()?;
        report.seeds_run += 1;
        report.totals.applied += result.stats.applied;
        report.totals.noops += result.stats.noops;
        report.totals.discarded += result.stats.discarded;
        report.totals.rejected += result.stats.rejected;

        if result.oracle.passed {
            report.seeds_passed += 1;
            continue;
        }

        warn!(seed, violations = result.oracle.violations.len(), "seed failed");
        report.first_failure.get_or_insert(seed);
        report.failures.push(SeedFailure {
            seed,
            violations: result
                .oracle
                .violations
                .iter()
                .map(ToString::to_string)
                .collect(),
        });
    }

    Ok(report)
}

/// Replay `seed` and return its full trace.
///
/// # Errors
///
/// Returns an error if the config is invalid or the seed cannot be set up.
pub fn replay_seed(seed: u64, config: &CampaignConfig) -> Result<SimulationResult> {
    config.validate()?;
    Simulator::new(config.sim_config_for_seed(seed))?.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CampaignConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_configs_are_rejected() {
        let empty = CampaignConfig {
            seed_range: 3..3,
            ..CampaignConfig::default()
        };
        assert!(empty.validate().is_err());

        let no_steps = CampaignConfig {
            steps: 0,
            ..CampaignConfig::default()
        };
        assert!(no_steps.validate().is_err());

        let over = CampaignConfig {
            miss_percent: 101,
            ..CampaignConfig::default()
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn sim_config_for_seed_copies_parameters() {
        let config = CampaignConfig {
            steps: 17,
            overshoot: 9,
            ..CampaignConfig::default()
        };
        let sim = config.sim_config_for_seed(42);
        assert_eq!(sim.seed, 42);
        assert_eq!(sim.steps, 17);
        assert_eq!(sim.overshoot, 9);
    }

    #[test]
    fn campaign_of_100_seeds_passes() {
        let config = CampaignConfig {
            seed_range: 0..100,
            steps: 120,
            ..CampaignConfig::default()
        };
        let report = run_campaign(&config).unwrap();
        assert_eq!(report.seeds_run, 100);
        assert!(
            report.all_passed(),
            "first failure at seed {:?}: {:?}",
            report.first_failure,
            report.failures.first()
        );
        assert!(report.totals.applied > 0);
        assert!(report.totals.discarded > 0);
        assert!(report.totals.rejected > 0);
    }

    #[test]
    fn replay_matches_campaign_run() {
        let config = CampaignConfig {
            seed_range: 5..6,
            steps: 60,
            ..CampaignConfig::default()
        };
        let first = replay_seed(5, &config).unwrap();
        let second = replay_seed(5, &config).unwrap();
        assert_eq!(first.trace, second.trace);
        assert_eq!(first.trace_fingerprint().unwrap(), second.trace_fingerprint().unwrap());
        assert_eq!(first.trace.len(), 60);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = CampaignReport {
            seeds_run: 4,
            seeds_passed: 3,
            first_failure: Some(2),
            failures: vec![SeedFailure {
                seed: 2,
                violations: vec!["step 9: duplicate id s-1".into()],
            }],
            totals: SimStats::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"seeds_run\":4"));
        assert!(json.contains("\"first_failure\":2"));
    }
}
