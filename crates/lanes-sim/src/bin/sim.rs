#![forbid(unsafe_code)]

use anyhow::Result;
use lanes_sim::{SimulationConfig, Simulator};

fn main() -> Result<()> {
    let mut simulator = Simulator::new(SimulationConfig::default())?;
    let result = simulator.run()?;
    let fingerprint = result.trace_fingerprint()?;

    println!(
        "simulation complete: steps={} applied={} rejected={} passed={} fingerprint={:016x}",
        result.trace.len(),
        result.stats.applied,
        result.stats.rejected,
        result.oracle.passed,
        fingerprint
    );

    if !result.oracle.passed {
        for violation in &result.oracle.violations {
            eprintln!("{violation}");
        }
        std::process::exit(1);
    }
    Ok(())
}
