//! Placement of logical qubits and relay routing on the device.
//!
//! Logical qubit `i` starts and ends on `targets[perm[i]]`. A two-qubit
//! operation on non-adjacent positions is routed through a relay path: one
//! operand is exchanged step by step towards the other and the gate is
//! applied. The operand is left where it arrived, and after the last
//! operation an exchange network puts every state, ancillas included, back
//! on its starting qubit. Exchanges are exact for any state, so relays may be
//! targets or ancillas.

use std::collections::VecDeque;

use qsyn_ir::{Device, GridQubit, Unitary2x2};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::SynthesisConfig;
use crate::error::{CompileError, CompileResult};
use crate::logical::LogicalOp;

/// Operation on device qubits, before lowering to native gates.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalOp {
    Single { qubit: GridQubit, matrix: Unitary2x2 },
    Cz { a: GridQubit, b: GridQubit },
    /// State exchange, lowered by the assembler.
    Bridge { a: GridQubit, b: GridQubit },
}

impl PhysicalOp {
    pub fn pair(&self) -> Option<(GridQubit, GridQubit)> {
        match self {
            PhysicalOp::Single { .. } => None,
            PhysicalOp::Cz { a, b } | PhysicalOp::Bridge { a, b } => Some((*a, *b)),
        }
    }
}

/// Output of routing.
#[derive(Debug, Clone, Default)]
pub struct RoutedCircuit {
    pub ops: Vec<PhysicalOp>,
    /// Device qubits used besides the targets, in allocation order.
    pub ancillas: Vec<GridQubit>,
    /// Exchanges inserted for relaying.
    pub relay_bridges: usize,
}

/// Place logical qubits on target slots so that strongly interacting pairs
/// land on adjacent targets.
///
/// Returns `perm` with logical `i` on `targets[perm[i]]`.
pub fn greedy_assignment(weights: &[Vec<usize>], targets: &[GridQubit], device: &Device) -> Vec<usize> {
    let n = weights.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|l| (std::cmp::Reverse(weights[*l].iter().sum::<usize>()), *l));

    let mut perm = vec![usize::MAX; n];
    let mut free: Vec<bool> = vec![true; targets.len()];
    for logical in order {
        let score = |slot: usize| -> (usize, std::cmp::Reverse<u64>) {
            let mut adjacent = 0;
            let mut spread = 0u64;
            for (other, &placed) in perm.iter().enumerate() {
                if placed == usize::MAX {
                    continue;
                }
                let w = weights[logical][other];
                let d = device.distance(&targets[slot], &targets[placed]).unwrap_or(u32::MAX);
                if d == 1 {
                    adjacent += w;
                }
                spread += w as u64 * u64::from(d);
            }
            (adjacent, std::cmp::Reverse(spread))
        };
        // `max_by_key` keeps the last maximum; iterate backwards to prefer low slots.
        let best = (0..targets.len())
            .rev()
            .filter(|s| free[*s])
            .max_by_key(|s| score(*s));
        if let Some(slot) = best {
            perm[logical] = slot;
            free[slot] = false;
        }
    }
    perm
}

/// Relay router for one compile attempt.
///
/// States are tracked by their home qubit: `place[home]` is where the state
/// that must end on `home` currently sits.
pub struct Router<'a> {
    device: &'a Device,
    config: &'a SynthesisConfig,
    /// Home of each logical wire.
    homes: Vec<GridQubit>,
    place: FxHashMap<GridQubit, GridQubit>,
    /// Inverse of `place`.
    occupant: FxHashMap<GridQubit, GridQubit>,
    /// Targets first, then ancillas in allocation order.
    used: Vec<GridQubit>,
    ancillas: Vec<GridQubit>,
    bridges: usize,
}

impl<'a> Router<'a> {
    /// `perm[i]` is the target slot of logical qubit `i`.
    pub fn new(
        device: &'a Device,
        config: &'a SynthesisConfig,
        targets: &[GridQubit],
        perm: &[usize],
    ) -> CompileResult<Self> {
        if targets.len() > config.qubit_budget {
            return Err(CompileError::BudgetExceeded {
                required: targets.len(),
                budget: config.qubit_budget,
            });
        }
        let homes = perm
            .iter()
            .map(|slot| {
                targets.get(*slot).copied().ok_or_else(|| {
                    CompileError::InputShape(format!("no target slot {slot} for logical qubit"))
                })
            })
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(Self {
            device,
            config,
            homes,
            place: targets.iter().map(|q| (*q, *q)).collect(),
            occupant: targets.iter().map(|q| (*q, *q)).collect(),
            used: targets.to_vec(),
            ancillas: Vec::new(),
            bridges: 0,
        })
    }

    /// Route a logical operation list.
    ///
    /// A relayed operand stays where the relay left it and logical exchanges
    /// only relabel positions; one exchange network at the end returns every
    /// state to its home.
    pub fn route(mut self, ops: &[LogicalOp]) -> CompileResult<RoutedCircuit> {
        let mut out = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                LogicalOp::Single { qubit, matrix } => out.push(PhysicalOp::Single {
                    qubit: self.position(self.homes[*qubit]),
                    matrix: *matrix,
                }),
                LogicalOp::Swap { a, b } => {
                    let (ha, hb) = (self.homes[*a], self.homes[*b]);
                    let (pa, pb) = (self.position(ha), self.position(hb));
                    self.settle(ha, pb);
                    self.settle(hb, pa);
                }
                LogicalOp::Cz { a, b } => {
                    let (pa, pb) = (self.position(self.homes[*a]), self.position(self.homes[*b]));
                    let path = self.relay_path(pa, pb)?;
                    let hops = path.len() - 1;
                    for w in path[..hops].windows(2) {
                        self.exchange(w[0], w[1], &mut out);
                    }
                    out.push(PhysicalOp::Cz {
                        a: path[hops - 1],
                        b: path[hops],
                    });
                }
            }
        }
        self.restore(&mut out)?;
        debug!(
            ops = out.len(),
            relay_bridges = self.bridges,
            ancillas = self.ancillas.len(),
            "routing finished"
        );
        Ok(RoutedCircuit {
            ops: out,
            ancillas: self.ancillas,
            relay_bridges: self.bridges,
        })
    }

    fn position(&self, home: GridQubit) -> GridQubit {
        self.place.get(&home).copied().unwrap_or(home)
    }

    fn settle(&mut self, home: GridQubit, at: GridQubit) {
        self.place.insert(home, at);
        self.occupant.insert(at, home);
    }

    fn exchange(&mut self, p: GridQubit, q: GridQubit, out: &mut Vec<PhysicalOp>) {
        let hp = self.occupant.get(&p).copied().unwrap_or(p);
        let hq = self.occupant.get(&q).copied().unwrap_or(q);
        self.settle(hp, q);
        self.settle(hq, p);
        self.bridges += 1;
        out.push(PhysicalOp::Bridge { a: p, b: q });
    }

    /// Send every state home. Positions are finalized farthest-first in a
    /// breadth-first order from the first target, so the positions still in
    /// play stay connected.
    fn restore(&mut self, out: &mut Vec<PhysicalOp>) -> CompileResult<()> {
        let in_use: FxHashSet<GridQubit> = self.used.iter().copied().collect();
        let mut order: Vec<GridQubit> = Vec::with_capacity(self.used.len());
        let mut seen: FxHashSet<GridQubit> = FxHashSet::default();
        for &root in &self.used {
            if !seen.insert(root) {
                continue;
            }
            let mut queue = VecDeque::from([root]);
            while let Some(q) = queue.pop_front() {
                order.push(q);
                let mut next: Vec<GridQubit> = self
                    .device
                    .neighbors(&q)
                    .filter(|n| in_use.contains(n) && !seen.contains(n))
                    .collect();
                next.sort_unstable();
                for n in next {
                    seen.insert(n);
                    queue.push_back(n);
                }
            }
        }

        let mut remaining = in_use;
        for home in order.into_iter().rev() {
            let from = self.position(home);
            if from != home {
                let path = self
                    .device
                    .shortest_path_within(&from, &home, |q| remaining.contains(q))
                    .ok_or(CompileError::AdjacencyViolation { a: from, b: home })?;
                for w in path.windows(2) {
                    self.exchange(w[0], w[1], out);
                }
            }
            remaining.remove(&home);
        }
        Ok(())
    }

    /// Path from `a` to `b`, allocating ancillas when that saves enough
    /// hops and the budget allows.
    fn relay_path(&mut self, a: GridQubit, b: GridQubit) -> CompileResult<Vec<GridQubit>> {
        if self.device.is_adjacent(&a, &b) {
            return Ok(vec![a, b]);
        }
        let in_use: FxHashSet<GridQubit> = self.used.iter().copied().collect();
        let within = self.device.shortest_path_within(&a, &b, |q| in_use.contains(q));
        let global = self.device.shortest_path(&a, &b);

        let Some(global) = global else {
            return Err(CompileError::AdjacencyViolation { a, b });
        };
        let fresh: Vec<GridQubit> = global.iter().filter(|q| !in_use.contains(*q)).copied().collect();
        let saving = within
            .as_ref()
            .map_or(usize::MAX, |w| w.len().saturating_sub(global.len()));
        let required = self.used.len() + fresh.len();

        if fresh.is_empty() {
            return Ok(global);
        }
        if saving >= self.config.ancilla_min_saving.max(1) && required <= self.config.qubit_budget {
            debug!(count = fresh.len(), %a, %b, "allocating ancillas");
            for q in &fresh {
                self.settle(*q, *q);
            }
            self.used.extend(fresh.iter().copied());
            self.ancillas.extend(fresh);
            return Ok(global);
        }
        within.ok_or(CompileError::BudgetExceeded {
            required,
            budget: self.config.qubit_budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::compose;
    use qsyn_ir::matrix::{Matrix, phase_distance};

    fn line(n: i32) -> Vec<GridQubit> {
        (0..n).map(|c| GridQubit::new(0, c)).collect()
    }

    /// Compose physical ops over `register` (all qubits involved).
    fn physical_matrix(ops: &[PhysicalOp], register: &[GridQubit]) -> Matrix {
        let at = |q: &GridQubit| register.iter().position(|r| r == q).unwrap();
        let logical: Vec<LogicalOp> = ops
            .iter()
            .map(|op| match op {
                PhysicalOp::Single { qubit, matrix } => LogicalOp::single(at(qubit), *matrix),
                PhysicalOp::Cz { a, b } => LogicalOp::cz(at(a), at(b)),
                PhysicalOp::Bridge { a, b } => LogicalOp::swap(at(a), at(b)),
            })
            .collect();
        compose(&logical, register.len())
    }

    #[test]
    fn test_adjacent_ops_pass_through() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default();
        let targets = line(2);
        let routed = Router::new(&device, &config, &targets, &[0, 1])
            .unwrap()
            .route(&[LogicalOp::cz(0, 1)])
            .unwrap();
        assert_eq!(routed.ops, vec![PhysicalOp::Cz { a: targets[0], b: targets[1] }]);
        assert!(routed.ancillas.is_empty());
    }

    #[test]
    fn test_relay_through_target_restores_it() {
        let device = Device::rect(1, 4);
        let config = SynthesisConfig::default();
        let targets = line(3);
        let ops = [LogicalOp::cz(0, 2), LogicalOp::swap(0, 2)];
        let routed = Router::new(&device, &config, &targets, &[0, 1, 2])
            .unwrap()
            .route(&ops)
            .unwrap();
        assert!(routed.ancillas.is_empty());
        assert!(routed.ops.iter().all(|op| op.pair().is_none_or(|(a, b)| a.is_adjacent(&b))));
        // One relay exchange, the CZ, and two exchanges to restore; the
        // logical SWAP itself is a relabeling.
        assert_eq!(routed.ops.len(), 4);
        assert_eq!(routed.relay_bridges, 3);
        let expected = compose(&ops, 3);
        assert!(phase_distance(&physical_matrix(&routed.ops, &targets), &expected) < 1e-12);
    }

    #[test]
    fn test_repeated_relays_are_amortized() {
        let device = Device::rect(1, 3);
        let config = SynthesisConfig::default();
        let targets = line(3);
        let ops = [
            LogicalOp::cz(0, 2),
            LogicalOp::single(0, Unitary2x2::h()),
            LogicalOp::cz(0, 2),
            LogicalOp::cz(2, 0),
        ];
        let routed = Router::new(&device, &config, &targets, &[0, 1, 2])
            .unwrap()
            .route(&ops)
            .unwrap();
        assert_eq!(routed.relay_bridges, 2);
        let czs = routed.ops.iter().filter(|op| matches!(op, PhysicalOp::Cz { .. })).count();
        assert_eq!(czs, 3);
        let expected = compose(&ops, 3);
        assert!(phase_distance(&physical_matrix(&routed.ops, &targets), &expected) < 1e-12);
    }

    #[test]
    fn test_logical_swaps_cost_nothing_until_restore() {
        let device = Device::rect(1, 3);
        let config = SynthesisConfig::default();
        let targets = line(3);
        // A 3-cycle of the wires followed by its inverse.
        let ops = [
            LogicalOp::swap(0, 1),
            LogicalOp::swap(1, 2),
            LogicalOp::single(1, Unitary2x2::x()),
            LogicalOp::swap(1, 2),
            LogicalOp::swap(0, 1),
        ];
        let routed = Router::new(&device, &config, &targets, &[0, 1, 2])
            .unwrap()
            .route(&ops)
            .unwrap();
        assert_eq!(routed.ops.len(), 1);
        assert_eq!(routed.relay_bridges, 0);
        let expected = compose(&ops, 3);
        assert!(phase_distance(&physical_matrix(&routed.ops, &targets), &expected) < 1e-12);
    }

    #[test]
    fn test_ancilla_allocation() {
        // Targets at the two ends of a 2x3 grid's top row, with the middle
        // top qubit free: the ancilla path is shorter than any path through
        // the targets (there is none).
        let device = Device::rect(2, 3);
        let config = SynthesisConfig::default();
        let targets = vec![GridQubit::new(0, 0), GridQubit::new(0, 2)];
        let routed = Router::new(&device, &config, &targets, &[0, 1])
            .unwrap()
            .route(&[LogicalOp::cz(0, 1)])
            .unwrap();
        assert_eq!(routed.ancillas, vec![GridQubit::new(0, 1)]);
        let mut register = targets.clone();
        register.extend(routed.ancillas.iter().copied());
        let expected = compose(&[LogicalOp::cz(0, 1)], 2).kronecker(&qsyn_ir::matrix::identity(1));
        assert!(phase_distance(&physical_matrix(&routed.ops, &register), &expected) < 1e-12);
    }

    #[test]
    fn test_budget_exceeded() {
        let device = Device::rect(1, 5);
        let config = SynthesisConfig::default().with_qubit_budget(2);
        let targets = vec![GridQubit::new(0, 0), GridQubit::new(0, 4)];
        let result = Router::new(&device, &config, &targets, &[0, 1])
            .unwrap()
            .route(&[LogicalOp::cz(0, 1)]);
        assert!(matches!(result, Err(CompileError::BudgetExceeded { required: 5, budget: 2 })));
    }

    #[test]
    fn test_greedy_assignment_puts_partners_side_by_side() {
        let device = Device::rect(1, 3);
        let targets = line(3);
        // Logical 0 and 2 interact heavily, 1 barely.
        let weights = vec![vec![0, 0, 9], vec![0, 0, 1], vec![9, 1, 0]];
        let perm = greedy_assignment(&weights, &targets, &device);
        let d = device.distance(&targets[perm[0]], &targets[perm[2]]);
        assert_eq!(d, Some(1));
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }
}
