//! Routing: SWAP insertion to satisfy connectivity.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use tracing::{debug, instrument};

use alsvid_ir::{Circuit, Gate, Instruction, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::{CouplingMap, Layout, PropertySet};

/// Check that a circuit is directly executable on the given connectivity:
/// nothing acts on more than two qubits (measurements aside) and every
/// two-qubit gate sits on an edge.
pub fn respect_connectivity(circuit: &Circuit, connectivity: &CouplingMap) -> bool {
    for instruction in circuit.instructions() {
        if instruction.gate == Gate::M {
            continue;
        }
        match instruction.qubits.len() {
            0 | 1 => {}
            2 => {
                if !connectivity.is_connected(instruction.qubits[0].0, instruction.qubits[1].0) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

/// Greedy shortest-paths router.
///
/// Consumes an initial layout, emits the longest connectivity-satisfying
/// prefix of the circuit, and when blocked enumerates every shortest path
/// between the blocked pair together with every way the two qubits can walk
/// along it, picking the walk that leaves the fewest unsatisfied two-qubit
/// gates. `sampling_split` trades walk coverage for speed on large devices.
pub struct ShortestPathsRouter {
    sampling_split: f64,
    seed: u64,
}

impl ShortestPathsRouter {
    /// Create a router testing every candidate walk.
    pub fn new() -> Self {
        Self {
            sampling_split: 1.0,
            seed: 0,
        }
    }

    /// Create a router testing only a `sampling_split` fraction of the walks,
    /// sampled with the given seed. `sampling_split` must be in (0, 1].
    pub fn with_sampling(sampling_split: f64, seed: u64) -> CompileResult<Self> {
        if !(sampling_split > 0.0 && sampling_split <= 1.0) {
            return Err(CompileError::InvalidSamplingSplit(sampling_split));
        }
        Ok(Self {
            sampling_split,
            seed,
        })
    }
}

impl Default for ShortestPathsRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable routing state threaded through one `run`.
struct RouterState<'a> {
    connectivity: &'a CouplingMap,
    /// logical qubit -> physical qubit, updated as SWAPs are inserted.
    l2p: Vec<u32>,
    /// two-qubit gates (logical pairs) not yet emitted, in program order.
    pending: VecDeque<(u32, u32)>,
    /// next instruction of the input circuit to emit.
    position: usize,
    /// output circuit, in physical qubit space.
    routed: Circuit,
    added_swaps: usize,
}

impl<'a> RouterState<'a> {
    /// Number of pending two-qubit gates executable as a prefix under `l2p`.
    fn executable_prefix(&self, l2p: &[u32]) -> usize {
        self.pending
            .iter()
            .take_while(|(a, b)| {
                self.connectivity
                    .is_connected(l2p[*a as usize], l2p[*b as usize])
            })
            .count()
    }

    /// Emit instructions until `budget` two-qubit gates have been placed,
    /// remapping everything through the current layout. Single-qubit and
    /// measurement gates flow freely.
    fn emit(&mut self, circuit: &Circuit, mut budget: usize) -> CompileResult<()> {
        let instructions = circuit.instructions();
        while self.position < instructions.len() {
            let instruction = &instructions[self.position];
            if instruction.is_two_qubit() {
                if budget == 0 {
                    break;
                }
                budget -= 1;
                self.pending.pop_front();
            }
            let qubits = instruction
                .qubits
                .iter()
                .map(|q| QubitId(self.l2p[q.0 as usize]))
                .collect();
            self.routed.add(Instruction {
                gate: instruction.gate.clone(),
                qubits,
            })?;
            self.position += 1;
        }
        Ok(())
    }

    /// Apply the swap walk for `path` with the blocked pair meeting on edge
    /// (path[i], path[i+1]): SWAP chains moving the endpoints inwards.
    fn apply_walk(&mut self, path: &[u32], meeting_point: usize) -> CompileResult<()> {
        let mut swaps: Vec<(u32, u32)> = vec![];
        for k in 0..meeting_point {
            swaps.push((path[k], path[k + 1]));
        }
        for k in ((meeting_point + 1)..(path.len() - 1)).rev() {
            swaps.push((path[k + 1], path[k]));
        }
        for (p1, p2) in swaps {
            self.routed
                .add(Instruction::two(Gate::Swap, QubitId(p1), QubitId(p2)))?;
            walk_l2p(&mut self.l2p, p1, p2);
        }
        Ok(())
    }
}

fn walk_l2p(l2p: &mut [u32], p1: u32, p2: u32) {
    for entry in l2p.iter_mut() {
        if *entry == p1 {
            *entry = p2;
        } else if *entry == p2 {
            *entry = p1;
        }
    }
}

impl Pass for ShortestPathsRouter {
    fn name(&self) -> &'static str {
        "ShortestPathsRouter"
    }

    fn kind(&self) -> PassKind {
        PassKind::Routing
    }

    #[instrument(skip(self, circuit, properties))]
    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        // owned copy: the state below borrows it while `properties` is updated
        let connectivity = properties
            .connectivity
            .clone()
            .ok_or(CompileError::MissingConnectivity)?;
        let layout = properties
            .layout
            .as_ref()
            .ok_or(CompileError::MissingPlacer(self.name()))?;

        if circuit.num_qubits() > connectivity.num_qubits() {
            return Err(CompileError::CircuitTooLarge {
                required: circuit.num_qubits(),
                available: connectivity.num_qubits(),
            });
        }

        let l2p: Vec<u32> = (0..circuit.num_qubits())
            .map(|l| {
                layout
                    .get_physical(QubitId(l))
                    .ok_or_else(|| {
                        CompileError::InvalidPlacement(format!("logical qubit q{l} is unmapped"))
                    })
            })
            .collect::<CompileResult<_>>()?;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut state = RouterState {
            connectivity: &connectivity,
            l2p,
            pending: circuit
                .two_qubit_interactions()
                .iter()
                .map(|(a, b)| (a.0, b.0))
                .collect(),
            position: 0,
            routed: Circuit::new(connectivity.num_qubits()),
            added_swaps: 0,
        };

        // emit whatever the initial placement already satisfies
        let prefix = state.executable_prefix(&state.l2p);
        state.emit(circuit, prefix)?;

        while let Some(&(a, b)) = state.pending.front() {
            let pa = state.l2p[a as usize];
            let pb = state.l2p[b as usize];
            let paths = connectivity.all_shortest_paths(pa, pb);
            if paths.is_empty() {
                return Err(CompileError::RoutingFailed { q0: pa, q1: pb });
            }
            state.added_swaps += paths[0].len() - 2;

            // score every (path, meeting point) candidate by the prefix it unlocks
            let mut best: Option<(usize, Vec<u32>, usize)> = None;
            for path in &paths {
                let mut meeting_points: Vec<usize> = (0..path.len() - 1).collect();
                if self.sampling_split < 1.0 {
                    let keep =
                        ((meeting_points.len() as f64) * self.sampling_split).ceil() as usize;
                    meeting_points.shuffle(&mut rng);
                    meeting_points.truncate(keep.max(1));
                    meeting_points.sort_unstable();
                }
                for &meeting_point in &meeting_points {
                    let mut candidate = state.l2p.clone();
                    for k in 0..meeting_point {
                        walk_l2p(&mut candidate, path[k], path[k + 1]);
                    }
                    for k in ((meeting_point + 1)..(path.len() - 1)).rev() {
                        walk_l2p(&mut candidate, path[k + 1], path[k]);
                    }
                    let prefix = state.executable_prefix(&candidate);
                    let remaining = state.pending.len() - prefix;
                    let better = match &best {
                        Some((best_remaining, _, _)) => remaining < *best_remaining,
                        None => true,
                    };
                    if better {
                        best = Some((remaining, path.clone(), meeting_point));
                    }
                }
            }

            let (_, path, meeting_point) =
                best.expect("at least one shortest path candidate exists");
            debug!(
                "blocked pair (q{a}, q{b}) on ({pa}, {pb}): walking path {:?} meeting at {}",
                path, meeting_point
            );
            state.apply_walk(&path, meeting_point)?;
            let prefix = state.executable_prefix(&state.l2p);
            state.emit(circuit, prefix)?;
        }

        // trailing single-qubit and measurement gates
        state.emit(circuit, 0)?;

        debug!("routing done, {} swaps added", state.added_swaps);
        properties.added_swaps = state.added_swaps;
        let final_layout = Layout::from_physical(&state.l2p);
        properties.layout = Some(final_layout);
        *circuit = state.routed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::TrivialLayout;
    use crate::property::NativeGateSet;

    fn props(map: CouplingMap) -> PropertySet {
        PropertySet::new().with_target(map, NativeGateSet::standard())
    }

    #[test]
    fn test_connected_circuit_untouched() {
        let mut circuit = Circuit::new(5);
        circuit.h(QubitId(0)).unwrap();
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        let mut properties = props(CouplingMap::linear(5));

        TrivialLayout.run(&mut circuit, &mut properties).unwrap();
        ShortestPathsRouter::new()
            .run(&mut circuit, &mut properties)
            .unwrap();

        assert_eq!(circuit.num_ops(), 2);
        assert_eq!(properties.added_swaps, 0);
    }

    #[test]
    fn test_blocked_gate_gets_swapped() {
        let mut circuit = Circuit::new(3);
        circuit.cz(QubitId(0), QubitId(2)).unwrap();
        let map = CouplingMap::linear(3);
        let mut properties = props(map.clone());

        TrivialLayout.run(&mut circuit, &mut properties).unwrap();
        ShortestPathsRouter::new()
            .run(&mut circuit, &mut properties)
            .unwrap();

        assert_eq!(properties.added_swaps, 1);
        assert!(respect_connectivity(&circuit, &map));
        // one swap plus the cz
        assert_eq!(circuit.num_ops(), 2);
    }

    #[test]
    fn test_output_respects_connectivity() {
        let mut circuit = Circuit::new(5);
        circuit.h(QubitId(0)).unwrap();
        circuit.cz(QubitId(0), QubitId(4)).unwrap();
        circuit.cz(QubitId(1), QubitId(3)).unwrap();
        circuit.cz(QubitId(0), QubitId(2)).unwrap();
        circuit.m(&[QubitId(0), QubitId(1)]).unwrap();
        let map = CouplingMap::linear(5);
        let mut properties = props(map.clone());

        TrivialLayout.run(&mut circuit, &mut properties).unwrap();
        ShortestPathsRouter::new()
            .run(&mut circuit, &mut properties)
            .unwrap();

        assert!(respect_connectivity(&circuit, &map));
        assert!(properties.added_swaps > 0);
        // every original gate survived, plus the swaps
        let two_qubit = circuit
            .instructions()
            .iter()
            .filter(|i| i.gate == Gate::CZ)
            .count();
        assert_eq!(two_qubit, 3);
    }

    #[test]
    fn test_star_topology_routing() {
        let mut circuit = Circuit::new(5);
        circuit.cz(QubitId(1), QubitId(2)).unwrap();
        circuit.cz(QubitId(3), QubitId(4)).unwrap();
        let map = CouplingMap::star(5);
        let mut properties = props(map.clone());

        TrivialLayout.run(&mut circuit, &mut properties).unwrap();
        ShortestPathsRouter::new()
            .run(&mut circuit, &mut properties)
            .unwrap();

        assert!(respect_connectivity(&circuit, &map));
    }

    #[test]
    fn test_router_requires_layout() {
        let mut circuit = Circuit::new(3);
        circuit.cz(QubitId(0), QubitId(2)).unwrap();
        let mut properties = props(CouplingMap::linear(3));
        let result = ShortestPathsRouter::new().run(&mut circuit, &mut properties);
        assert!(matches!(result, Err(CompileError::MissingPlacer(_))));
    }

    #[test]
    fn test_sampling_split_validated() {
        assert!(ShortestPathsRouter::with_sampling(0.5, 1).is_ok());
        assert!(matches!(
            ShortestPathsRouter::with_sampling(0.0, 1),
            Err(CompileError::InvalidSamplingSplit(_))
        ));
        assert!(matches!(
            ShortestPathsRouter::with_sampling(1.5, 1),
            Err(CompileError::InvalidSamplingSplit(_))
        ));
    }
}
