//! `lanes sim`: seeded gesture campaigns against an in-memory board.
//!
//! `lanes sim run` checks many seeds; `lanes sim replay` re-runs one seed
//! and prints its trace.

use std::process;

use anyhow::Result;
use clap::{Args, Subcommand};
use lanes_sim::campaign::{self, CampaignConfig};
use lanes_sim::{SimStats, TraceEvent};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section};

#[derive(Args, Debug)]
pub struct SimArgs {
    #[command(subcommand)]
    pub command: SimCommand,
}

#[derive(Subcommand, Debug)]
pub enum SimCommand {
    #[command(
        about = "Run a simulation campaign across multiple seeds",
        long_about = "Drive random drags, drops, misses, creates and removals against a\n\
                      fresh board per seed and check board invariants after every step.\n\
                      Exits 1 if any seed fails.",
        after_help = "EXAMPLES:\n    # Run 100 seeds with defaults\n    lanes sim run --seeds 100\n\n\
                      # Longer runs on a busier board\n    lanes sim run --seeds 50 --steps 1000 --items 40\n\n\
                      # Machine-readable output\n    lanes sim run --seeds 100 --format json"
    )]
    Run(SimRunArgs),

    #[command(
        about = "Replay a single seed with its full trace",
        long_about = "Re-run one seed and print every gesture, its outcome and any\n\
                      invariant violations. Use after a campaign failure.",
        after_help = "EXAMPLES:\n    # Replay seed 42\n    lanes sim replay --seed 42\n\n\
                      # Machine-readable trace\n    lanes sim replay --seed 42 --format json"
    )]
    Replay(SimReplayArgs),
}

/// Knobs shared by `run` and `replay`.
#[derive(Args, Debug, Clone)]
pub struct SimKnobs {
    /// Gestures per seed.
    #[arg(long, default_value = "200")]
    pub steps: usize,

    /// Cards on the board before the first gesture.
    #[arg(long, default_value = "12")]
    pub items: usize,

    /// Percent of gestures that create a card.
    #[arg(long, default_value = "10")]
    pub create: u8,

    /// Percent of gestures that remove a card.
    #[arg(long, default_value = "8")]
    pub remove: u8,

    /// Percent of drops that miss every target.
    #[arg(long, default_value = "10")]
    pub miss: u8,

    /// Percent of gestures aimed at unknown ids or statuses.
    #[arg(long, default_value = "5")]
    pub invalid: u8,

    /// How far past a column's end explicit moves may aim.
    #[arg(long, default_value = "3")]
    pub overshoot: usize,
}

#[derive(Args, Debug)]
pub struct SimRunArgs {
    /// Number of seeds to run.
    #[arg(long, default_value = "100")]
    pub seeds: u64,

    /// First seed.
    #[arg(long, default_value = "0")]
    pub seed_start: u64,

    #[command(flatten)]
    pub knobs: SimKnobs,
}

#[derive(Args, Debug)]
pub struct SimReplayArgs {
    /// Seed to replay.
    #[arg(long)]
    pub seed: u64,

    #[command(flatten)]
    pub knobs: SimKnobs,
}

#[derive(Debug, Serialize)]
struct RunOutput {
    seeds_run: usize,
    seeds_passed: usize,
    seeds_failed: usize,
    first_failure: Option<u64>,
    totals: SimStats,
    all_passed: bool,
    failures: Vec<FailureOutput>,
}

#[derive(Debug, Serialize)]
struct FailureOutput {
    seed: u64,
    violations: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    seed: u64,
    steps: usize,
    stats: SimStats,
    final_items: usize,
    oracle_passed: bool,
    violations: Vec<String>,
    trace_fingerprint: String,
    trace: Vec<TraceEvent>,
}

fn campaign_config(seed_start: u64, seeds: u64, knobs: &SimKnobs) -> CampaignConfig {
    CampaignConfig {
        seed_range: seed_start..seed_start.saturating_add(seeds),
        steps: knobs.steps,
        initial_items: knobs.items,
        create_percent: knobs.create,
        remove_percent: knobs.remove,
        miss_percent: knobs.miss,
        invalid_percent: knobs.invalid,
        overshoot: knobs.overshoot,
    }
}

/// Execute `lanes sim run`.
///
/// # Errors
///
/// Invalid knobs, or a simulator setup failure.
pub fn run_sim_run(args: &SimRunArgs, output: OutputMode) -> Result<()> {
    let config = campaign_config(args.seed_start, args.seeds, &args.knobs);
    let report = campaign::run_campaign(&config)?;

    let out = RunOutput {
        seeds_run: report.seeds_run,
        seeds_passed: report.seeds_passed,
        seeds_failed: report.failures.len(),
        first_failure: report.first_failure,
        totals: report.totals,
        all_passed: report.all_passed(),
        failures: report
            .failures
            .iter()
            .map(|f| FailureOutput {
                seed: f.seed,
                violations: f.violations.clone(),
            })
            .collect(),
    };

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => {
            println!(
                "campaign seeds_run={} steps={} items={}",
                out.seeds_run, args.knobs.steps, args.knobs.items
            );
            println!(
                "results passed={} failed={} applied={} noops={} discarded={} rejected={} all_passed={}",
                out.seeds_passed,
                out.seeds_failed,
                out.totals.applied,
                out.totals.noops,
                out.totals.discarded,
                out.totals.rejected,
                out.all_passed
            );
            for failure in out.failures.iter().take(5) {
                println!(
                    "failure seed={} violations={}",
                    failure.seed,
                    failure.violations.len()
                );
            }
            if let Some(seed) = out.first_failure {
                println!("hint replay_seed={seed} steps={}", args.knobs.steps);
            }
        }
        OutputMode::Pretty => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            pretty_section(&mut w, "Simulation Campaign")?;
            pretty_kv(&mut w, "Seeds", out.seeds_run.to_string())?;
            pretty_kv(&mut w, "Steps", args.knobs.steps.to_string())?;
            pretty_kv(&mut w, "Cards", args.knobs.items.to_string())?;
            pretty_kv(
                &mut w,
                "Gestures",
                format!(
                    "{} applied ({} no-ops), {} discarded, {} rejected",
                    out.totals.applied, out.totals.noops, out.totals.discarded, out.totals.rejected
                ),
            )?;
            pretty_kv(
                &mut w,
                "Results",
                format!("{} passed / {} failed", out.seeds_passed, out.seeds_failed),
            )?;

            if let Some(seed) = out.first_failure {
                println!();
                pretty_section(&mut w, "Failure Samples")?;
                for failure in out.failures.iter().take(5) {
                    println!("seed {:<8} violations={}", failure.seed, failure.violations.len());
                    for violation in failure.violations.iter().take(3) {
                        println!("  - {violation}");
                    }
                }
                if out.failures.len() > 5 {
                    println!("... and {} more failures", out.failures.len() - 5);
                }
                println!();
                pretty_kv(
                    &mut w,
                    "Replay",
                    format!("lanes sim replay --seed {seed} --steps {}", args.knobs.steps),
                )?;
            } else {
                pretty_kv(&mut w, "Status", "all seeds passed")?;
            }
        }
    }

    if !report.all_passed() {
        process::exit(1);
    }
    Ok(())
}

/// Execute `lanes sim replay`.
///
/// # Errors
///
/// Invalid knobs, or a simulator setup failure.
pub fn run_sim_replay(args: &SimReplayArgs, output: OutputMode) -> Result<()> {
    let config = campaign_config(args.seed, 1, &args.knobs);
    let result = campaign::replay_seed(args.seed, &config)?;

    let out = ReplayOutput {
        seed: result.seed,
        steps: result.trace.len(),
        stats: result.stats,
        final_items: result.final_items.len(),
        oracle_passed: result.oracle.passed,
        violations: result.oracle.violations.iter().map(ToString::to_string).collect(),
        trace_fingerprint: format!("{:016x}", result.trace_fingerprint()?),
        trace: result.trace,
    };

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => {
            println!("replay seed={} steps={}", out.seed, out.steps);
            for event in &out.trace {
                println!("step={} gesture={} outcome={:?}", event.step, event.gesture, event.result);
            }
            println!(
                "result oracle_passed={} final_items={} trace_fingerprint={}",
                out.oracle_passed, out.final_items, out.trace_fingerprint
            );
            for violation in &out.violations {
                println!("violation={violation}");
            }
        }
        OutputMode::Pretty => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            pretty_section(&mut w, &format!("Replay Seed {}", out.seed))?;
            pretty_kv(&mut w, "Steps", out.steps.to_string())?;
            pretty_kv(&mut w, "Applied", out.stats.applied.to_string())?;
            pretty_kv(&mut w, "No-ops", out.stats.noops.to_string())?;
            pretty_kv(&mut w, "Discarded", out.stats.discarded.to_string())?;
            pretty_kv(&mut w, "Rejected", out.stats.rejected.to_string())?;
            pretty_kv(&mut w, "Final cards", out.final_items.to_string())?;
            pretty_kv(&mut w, "Fingerprint", &out.trace_fingerprint)?;
            pretty_kv(&mut w, "Oracle", out.oracle_passed.to_string())?;

            if !out.oracle_passed {
                println!();
                pretty_section(&mut w, "Invariant Violations")?;
                for violation in &out.violations {
                    println!("- {violation}");
                }
            }

            println!();
            pretty_section(&mut w, "Trace")?;
            for event in &out.trace {
                println!("{:>5}  {:<40} {:?}", event.step, event.gesture.to_string(), event.result);
            }
        }
    }

    if !out.oracle_passed {
        process::exit(1);
    }
    Ok(())
}

/// Dispatch `lanes sim` subcommands.
///
/// # Errors
///
/// See [`run_sim_run`] and [`run_sim_replay`].
pub fn run_sim(args: &SimArgs, output: OutputMode) -> Result<()> {
    match &args.command {
        SimCommand::Run(run_args) => run_sim_run(run_args, output),
        SimCommand::Replay(replay_args) => run_sim_replay(replay_args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knobs() -> SimKnobs {
        SimKnobs {
            steps: 50,
            items: 6,
            create: 10,
            remove: 8,
            miss: 10,
            invalid: 5,
            overshoot: 3,
        }
    }

    #[test]
    fn knobs_map_onto_campaign_config() {
        let config = campaign_config(7, 3, &knobs());
        assert_eq!(config.seed_range, 7..10);
        assert_eq!(config.steps, 50);
        assert_eq!(config.initial_items, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn seed_range_saturates() {
        let config = campaign_config(u64::MAX, 5, &knobs());
        assert!(config.seed_range.is_empty());
        assert!(config.validate().is_err());
    }
}
