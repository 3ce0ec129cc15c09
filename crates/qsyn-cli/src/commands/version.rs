//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - unitary synthesis for grid-coupled devices",
        style("qsyn").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qsyn-ir       Matrices, gates, operations and devices");
    println!("  qsyn-compile  Decomposition, routing, assembly and validation");
    println!("  qsyn-cli      Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
