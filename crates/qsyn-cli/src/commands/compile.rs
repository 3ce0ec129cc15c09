//! Compile command implementation.

use anyhow::{Context, Result};
use console::style;
use std::fs;

use qsyn_compile::{CompileOutcome, Synthesizer};
use qsyn_ir::NativeGateSet;

use super::common::{get_device, load_config, load_job};

/// Execute the compile command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    device: &str,
    config: Option<&str>,
    tolerance: Option<f64>,
    gate_set: Option<&str>,
    first_valid: bool,
) -> Result<()> {
    let device = get_device(device)?;
    let mut config = load_config(config)?;
    if let Some(tolerance) = tolerance {
        config = config.with_tolerance(tolerance);
    }
    if let Some(name) = gate_set {
        let gates = NativeGateSet::by_name(name).with_context(|| format!("Unknown gate set: {name}"))?;
        config = config.with_gate_set(gates);
    }
    if first_valid {
        config = config.first_valid();
    }

    let job = load_job(input)?;
    let targets = job.targets();
    let unitary = job.unitary()?;

    eprintln!(
        "{} Compiling {} ({} qubits) for {}",
        style("→").cyan().bold(),
        style(input).green(),
        targets.len(),
        style(device.name()).yellow()
    );

    let synthesizer = Synthesizer::new(device, config);
    let outcome = synthesizer.compile(&targets, &unitary)?;

    match &outcome {
        CompileOutcome::Compiled(result) => {
            let stats = &result.stats;
            eprintln!("{} Compilation complete", style("✓").green().bold());
            eprintln!(
                "  Result: {} ops, {} two-qubit, {} ancillas",
                result.operations.len(),
                stats.two_qubit_gates,
                result.ancillas.len()
            );
            eprintln!(
                "  Strategy {} after {} attempt(s), distance {:.2e}",
                stats.strategy, stats.attempts, stats.validation.distance
            );
        }
        CompileOutcome::Unsupported { reason } => {
            eprintln!("{} Unsupported: {}", style("✗").red().bold(), reason);
        }
    }

    let json = serde_json::to_string_pretty(&outcome)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
            eprintln!("  Output: {}", style(path).green());
        }
        None => println!("{json}"),
    }

    Ok(())
}
