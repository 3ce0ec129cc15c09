//! qsyn Command-Line Interface
//!
//! Compiles a unitary given as a JSON or YAML job file into native
//! operations for a grid device.
//!
//! ```text
//!   . . o o . .        o  device qubit
//!   . o 0 1 o .        0  target slot
//!   o o 2 3 o o
//!   . o o o o .
//!
//!              Q S Y N
//!     Unitary synthesis for grid devices
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{compile, layout, version};

/// qsyn - unitary synthesis for grid-coupled quantum devices
#[derive(Parser)]
#[command(name = "qsyn")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a unitary onto target qubits
    Compile {
        /// Job file (JSON or YAML) with `targets` and `matrix`
        #[arg(short, long)]
        input: String,

        /// Output file for the JSON outcome (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Device (sycamore, grid:RxC, or a diagram file)
        #[arg(short, long, default_value = "sycamore")]
        device: String,

        /// Synthesis configuration file (JSON or YAML)
        #[arg(short, long, env = "QSYN_CONFIG")]
        config: Option<String>,

        /// Override the validation tolerance
        #[arg(long)]
        tolerance: Option<f64>,

        /// Two-qubit gate set (sycamore, sqrt-iswap, cz)
        #[arg(short, long)]
        gate_set: Option<String>,

        /// Stop at the first valid strategy instead of keeping the cheapest
        #[arg(long)]
        first_valid: bool,
    },

    /// Show the device grid and a standard target placement
    Layout {
        /// Device (sycamore, grid:RxC, or a diagram file)
        #[arg(short, long, default_value = "sycamore")]
        device: String,

        /// Number of target qubits to place
        #[arg(short, long, default_value = "4")]
        qubits: usize,

        /// Top row of the placement
        #[arg(long, default_value = "3")]
        top: i32,

        /// Left column of the placement
        #[arg(long, default_value = "3")]
        left: i32,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            device,
            config,
            tolerance,
            gate_set,
            first_valid,
        } => compile::execute(
            &input,
            output.as_deref(),
            &device,
            config.as_deref(),
            tolerance,
            gate_set.as_deref(),
            first_valid,
        ),

        Commands::Layout {
            device,
            qubits,
            top,
            left,
        } => layout::execute(&device, qubits, top, left),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
