//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use num_complex::Complex64;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use qsyn_compile::SynthesisConfig;
use qsyn_ir::matrix::{self, Matrix};
use qsyn_ir::{Device, GridQubit};

/// A compile job as stored on disk.
///
/// Matrix entries are `[re, im]` pairs, rows in big-endian basis order
/// with `targets[0]` the most significant qubit.
#[derive(Debug, Deserialize)]
pub struct Job {
    pub targets: Vec<[i32; 2]>,
    pub matrix: Vec<Vec<Complex64>>,
}

impl Job {
    pub fn targets(&self) -> Vec<GridQubit> {
        self.targets.iter().map(|&[r, c]| GridQubit::new(r, c)).collect()
    }

    pub fn unitary(&self) -> Result<Matrix> {
        Ok(matrix::from_rows(&self.matrix)?)
    }
}

/// Read a JSON or YAML document, chosen by file extension.
fn load_document<T: DeserializeOwned>(path: &str) -> Result<T> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .map_err(|e| anyhow::anyhow!("Parse error in {path}: {e}")),
        _ => serde_json::from_str(&source)
            .map_err(|e| anyhow::anyhow!("Parse error in {path}: {e}")),
    }
}

/// Load a compile job.
pub fn load_job(path: &str) -> Result<Job> {
    load_document(path)
}

/// Load a synthesis configuration; missing fields take their defaults.
pub fn load_config(path: Option<&str>) -> Result<SynthesisConfig> {
    match path {
        Some(path) => load_document(path),
        None => Ok(SynthesisConfig::default()),
    }
}

/// Resolve a device name: `sycamore`, `grid:RxC`, or a diagram file.
pub fn get_device(name: &str) -> Result<Device> {
    let lower = name.to_lowercase();
    if lower == "sycamore" {
        return Ok(Device::sycamore());
    }
    if let Some(dims) = lower.strip_prefix("grid:") {
        let (rows, cols) = dims
            .split_once('x')
            .with_context(|| format!("Expected grid:RxC, got '{name}'"))?;
        let rows: i32 = rows.trim().parse().with_context(|| format!("Bad row count in '{name}'"))?;
        let cols: i32 = cols.trim().parse().with_context(|| format!("Bad column count in '{name}'"))?;
        if rows <= 0 || cols <= 0 {
            anyhow::bail!("Grid dimensions must be positive: '{name}'");
        }
        return Ok(Device::rect(rows, cols));
    }
    if Path::new(name).is_file() {
        let diagram =
            fs::read_to_string(name).with_context(|| format!("Failed to read file: {name}"))?;
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        return Ok(Device::from_diagram(stem, &diagram)?);
    }
    anyhow::bail!("Unknown device: '{name}'. Available: sycamore, grid:RxC, or a diagram file")
}

/// Render the device grid; qubits in `marked` show their slot index.
pub fn render_device(device: &Device, marked: &[GridQubit]) -> String {
    let qubits = device.qubits();
    let (Some(min_row), Some(max_row)) = (
        qubits.iter().map(|q| q.row).min(),
        qubits.iter().map(|q| q.row).max(),
    ) else {
        return String::new();
    };
    let min_col = qubits.iter().map(|q| q.col).min().unwrap_or(0);
    let max_col = qubits.iter().map(|q| q.col).max().unwrap_or(0);

    let mut out = String::new();
    for row in min_row..=max_row {
        let mut line = String::new();
        for col in min_col..=max_col {
            let q = GridQubit::new(row, col);
            let cell = match marked.iter().position(|m| *m == q) {
                Some(slot) if slot < 36 => char::from_digit(slot as u32, 36).unwrap_or('*'),
                Some(_) => '*',
                None if device.contains(&q) => 'o',
                None => '.',
            };
            line.push(cell);
            line.push(' ');
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
