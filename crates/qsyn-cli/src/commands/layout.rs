//! Layout command implementation.

use anyhow::Result;
use console::style;

use qsyn_ir::GridQubit;

use super::common::{get_device, render_device};

/// Execute the layout command.
pub fn execute(device: &str, qubits: usize, top: i32, left: i32) -> Result<()> {
    let device = get_device(device)?;
    let targets = GridQubit::placement(qubits, top, left);

    println!(
        "{} {} ({} qubits, {} couplers)",
        style("Device").cyan().bold(),
        style(device.name()).yellow(),
        device.num_qubits(),
        device.num_edges()
    );
    println!();
    print!("{}", render_device(&device, &targets));
    println!();

    match device.validate_qubits(&targets) {
        Ok(()) => println!(
            "{} {} targets at ({top}, {left})",
            style("✓").green().bold(),
            targets.len()
        ),
        Err(e) => println!("{} {}", style("✗").red().bold(), e),
    }
    Ok(())
}
