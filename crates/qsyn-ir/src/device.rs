//! Device connectivity.
//!
//! A [`Device`] is a set of grid qubits where nearest neighbours on the grid
//! are coupled. It is built once per target description and then only read.
//!
//! ## Performance
//!
//! On construction, a distance matrix is precomputed using BFS from each
//! node. This enables O(1) `distance()` lookups and O(distance) path
//! reconstruction during routing.

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::error::{IrError, IrResult};
use crate::qubit::GridQubit;

/// Layout of the 54-qubit Sycamore processor. `-` marks an empty site.
pub const SYCAMORE_DIAGRAM: &str = "\
-----AB---
----ABCD--
---ABCDEF-
--ABCDEFGH
-ABCDEFGHI
ABCDEFGHI-
-CDEFGHI--
--EFGHI---
---GHI----
----I-----
";

/// Physical device: qubits on a grid with nearest-neighbour coupling.
#[derive(Debug, Clone)]
pub struct Device {
    /// Human-readable name.
    name: String,
    /// Qubits in row-major order; position is the node index in `graph`.
    qubits: Vec<GridQubit>,
    /// Reverse lookup from qubit to node index.
    index: FxHashMap<GridQubit, usize>,
    /// Coupling graph.
    graph: UnGraph<GridQubit, ()>,
    /// `dist_matrix[from][to]` is the hop count, `u32::MAX` if unreachable.
    dist_matrix: Vec<Vec<u32>>,
    /// `pred_matrix[from][to]` is the node preceding `to` on a shortest path
    /// from `from`.
    pred_matrix: Vec<Vec<u32>>,
}

impl Device {
    /// Create a device from a set of qubits; grid neighbours are coupled.
    pub fn from_qubits(name: impl Into<String>, qubits: impl IntoIterator<Item = GridQubit>) -> Self {
        let mut qubits: Vec<GridQubit> = qubits.into_iter().collect();
        qubits.sort();
        qubits.dedup();

        let mut graph = UnGraph::with_capacity(qubits.len(), qubits.len() * 2);
        let mut index = FxHashMap::default();
        for (i, &q) in qubits.iter().enumerate() {
            graph.add_node(q);
            index.insert(q, i);
        }
        for (i, q) in qubits.iter().enumerate() {
            // Only look right and down so every edge is added once.
            for other in [GridQubit::new(q.row, q.col + 1), GridQubit::new(q.row + 1, q.col)] {
                if let Some(&j) = index.get(&other) {
                    graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                }
            }
        }

        let mut device = Self {
            name: name.into(),
            qubits,
            index,
            graph,
            dist_matrix: vec![],
            pred_matrix: vec![],
        };
        device.precompute_distances();
        device
    }

    /// Parse a character diagram: row `r`, column `c` holds a qubit unless the
    /// character is `-` or whitespace.
    pub fn from_diagram(name: impl Into<String>, diagram: &str) -> IrResult<Self> {
        let mut qubits = Vec::new();
        for (row, line) in diagram.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            for (col, ch) in line.trim_end().chars().enumerate() {
                match ch {
                    '-' | ' ' => {}
                    c if c.is_ascii_alphanumeric() => {
                        qubits.push(GridQubit::new(row as i32, col as i32));
                    }
                    other => {
                        return Err(IrError::InvalidDiagram(format!(
                            "unexpected character '{other}' at row {row}, column {col}"
                        )));
                    }
                }
            }
        }
        if qubits.is_empty() {
            return Err(IrError::InvalidDiagram("diagram contains no qubits".into()));
        }
        Ok(Self::from_qubits(name, qubits))
    }

    /// The 54-qubit Sycamore grid.
    pub fn sycamore() -> Self {
        Self::from_diagram("sycamore", SYCAMORE_DIAGRAM)
            .unwrap_or_else(|_| unreachable!("built-in diagram is well formed"))
    }

    /// A full `rows x cols` rectangle starting at the origin.
    pub fn rect(rows: i32, cols: i32) -> Self {
        Self::from_qubits(format!("grid-{rows}x{cols}"), GridQubit::rect(rows, cols, 0, 0))
    }

    /// Precompute all-pairs shortest paths using BFS from each node.
    fn precompute_distances(&mut self) {
        let n = self.qubits.len();
        self.dist_matrix = vec![vec![u32::MAX; n]; n];
        self.pred_matrix = vec![vec![u32::MAX; n]; n];

        for src in 0..n {
            self.dist_matrix[src][src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(src);

            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors(NodeIndex::new(current)) {
                    let nb = neighbor.index();
                    if self.dist_matrix[src][nb] == u32::MAX {
                        self.dist_matrix[src][nb] = self.dist_matrix[src][current] + 1;
                        self.pred_matrix[src][nb] = current as u32;
                        queue.push_back(nb);
                    }
                }
            }
        }
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits on the device.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// All qubits in row-major order.
    pub fn qubits(&self) -> &[GridQubit] {
        &self.qubits
    }

    /// Whether the qubit exists on the device.
    #[inline]
    pub fn contains(&self, qubit: &GridQubit) -> bool {
        self.index.contains_key(qubit)
    }

    /// Number of couplers.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if two qubits are directly coupled.
    #[inline]
    pub fn is_adjacent(&self, a: &GridQubit, b: &GridQubit) -> bool {
        self.contains(a) && self.contains(b) && a.is_adjacent(b)
    }

    /// Coupled neighbours of a qubit.
    pub fn neighbors(&self, qubit: &GridQubit) -> impl Iterator<Item = GridQubit> + '_ {
        self.index
            .get(qubit)
            .map(|&i| self.graph.neighbors(NodeIndex::new(i)))
            .into_iter()
            .flatten()
            .map(|n| self.graph[n])
    }

    /// Hop distance between two qubits, `None` if either is missing or they
    /// are disconnected.
    pub fn distance(&self, a: &GridQubit, b: &GridQubit) -> Option<u32> {
        let (&i, &j) = (self.index.get(a)?, self.index.get(b)?);
        let d = self.dist_matrix[i][j];
        (d != u32::MAX).then_some(d)
    }

    /// Shortest path from `a` to `b`, both endpoints included.
    pub fn shortest_path(&self, a: &GridQubit, b: &GridQubit) -> Option<Vec<GridQubit>> {
        let (&from, &to) = (self.index.get(a)?, self.index.get(b)?);
        if self.dist_matrix[from][to] == u32::MAX {
            return None;
        }
        let mut path = vec![self.qubits[to]];
        let mut current = to;
        while current != from {
            current = self.pred_matrix[from][current] as usize;
            path.push(self.qubits[current]);
        }
        path.reverse();
        Some(path)
    }

    /// Shortest path from `a` to `b` whose interior only visits qubits
    /// accepted by `allowed`. Endpoints are always accepted.
    pub fn shortest_path_within(
        &self,
        a: &GridQubit,
        b: &GridQubit,
        allowed: impl Fn(&GridQubit) -> bool,
    ) -> Option<Vec<GridQubit>> {
        let (&from, &to) = (self.index.get(a)?, self.index.get(b)?);
        let n = self.qubits.len();
        let mut pred = vec![usize::MAX; n];
        let mut seen = vec![false; n];
        seen[from] = true;
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            // Sorted neighbours keep the chosen path independent of edge order.
            let mut next: Vec<usize> = self
                .graph
                .neighbors(NodeIndex::new(current))
                .map(|n| n.index())
                .collect();
            next.sort_unstable();
            for nb in next {
                if seen[nb] || (nb != to && !allowed(&self.qubits[nb])) {
                    continue;
                }
                seen[nb] = true;
                pred[nb] = current;
                queue.push_back(nb);
            }
        }

        if !seen[to] {
            return None;
        }
        let mut path = vec![self.qubits[to]];
        let mut current = to;
        while current != from {
            current = pred[current];
            path.push(self.qubits[current]);
        }
        path.reverse();
        Some(path)
    }

    /// Check that every qubit is on the device and none repeats.
    pub fn validate_qubits(&self, qubits: &[GridQubit]) -> IrResult<()> {
        let mut seen = FxHashSet::default();
        for q in qubits {
            if !self.contains(q) {
                return Err(IrError::QubitNotOnDevice(*q));
            }
            if !seen.insert(*q) {
                return Err(IrError::DuplicateQubit(*q));
            }
        }
        Ok(())
    }
}
