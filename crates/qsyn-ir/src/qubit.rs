//! Physical qubit identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A qubit addressed by its position on a two-dimensional grid.
///
/// Ordering is row-major, which makes sorted qubit lists read top-left to
/// bottom-right on the device diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridQubit {
    /// Row index.
    pub row: i32,
    /// Column index.
    pub col: i32,
}

impl GridQubit {
    /// Create a new grid qubit.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Whether the two qubits are nearest neighbours on the grid.
    pub fn is_adjacent(&self, other: &GridQubit) -> bool {
        (self.row - other.row).abs() + (self.col - other.col).abs() == 1
    }

    /// The four grid neighbours (not all of them need exist on a device).
    pub fn neighbors(&self) -> [GridQubit; 4] {
        [
            GridQubit::new(self.row - 1, self.col),
            GridQubit::new(self.row, self.col + 1),
            GridQubit::new(self.row + 1, self.col),
            GridQubit::new(self.row, self.col - 1),
        ]
    }

    /// Qubits of a `rows x cols` rectangle whose top-left corner is
    /// `(top, left)`, in row-major order.
    pub fn rect(rows: i32, cols: i32, top: i32, left: i32) -> Vec<GridQubit> {
        let mut qubits = Vec::with_capacity((rows.max(0) * cols.max(0)) as usize);
        for r in 0..rows {
            for c in 0..cols {
                qubits.push(GridQubit::new(top + r, left + c));
            }
        }
        qubits
    }

    /// Qubits of a `side x side` square.
    pub fn square(side: i32, top: i32, left: i32) -> Vec<GridQubit> {
        Self::rect(side, side, top, left)
    }

    /// Standard placement of `n` target qubits used by the benchmark
    /// harness: a single row for fewer than four qubits, a square for perfect
    /// squares, otherwise two rows (the last slot dropped for odd counts).
    pub fn placement(n: usize, top: i32, left: i32) -> Vec<GridQubit> {
        let n_i = n as i32;
        let side = (n as f64).sqrt() as i32;
        if n < 4 {
            Self::rect(1, n_i, top, left)
        } else if side * side == n_i {
            Self::square(side, top, left)
        } else if n % 2 == 0 {
            Self::rect(2, n_i / 2, top, left)
        } else {
            let mut qubits = Self::rect(2, (n_i + 1) / 2, top, left);
            qubits.pop();
            qubits
        }
    }
}

impl fmt::Display for GridQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q({}, {})", self.row, self.col)
    }
}

impl From<(i32, i32)> for GridQubit {
    fn from((row, col): (i32, i32)) -> Self {
        GridQubit::new(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency() {
        let q = GridQubit::new(3, 3);
        assert!(q.is_adjacent(&GridQubit::new(3, 4)));
        assert!(q.is_adjacent(&GridQubit::new(2, 3)));
        assert!(!q.is_adjacent(&GridQubit::new(4, 4)));
        assert!(!q.is_adjacent(&q));
    }

    #[test]
    fn test_placement_shapes() {
        assert_eq!(GridQubit::placement(3, 3, 3).len(), 3);
        assert!(GridQubit::placement(3, 3, 3).iter().all(|q| q.row == 3));

        let four = GridQubit::placement(4, 3, 3);
        assert_eq!(four, GridQubit::square(2, 3, 3));

        let seven = GridQubit::placement(7, 3, 3);
        assert_eq!(seven.len(), 7);
        assert_eq!(seven.last(), Some(&GridQubit::new(4, 5)));

        let eight = GridQubit::placement(8, 3, 3);
        assert_eq!(eight, GridQubit::rect(2, 4, 3, 3));
    }

    #[test]
    fn test_display() {
        assert_eq!(GridQubit::new(4, 7).to_string(), "q(4, 7)");
    }
}
