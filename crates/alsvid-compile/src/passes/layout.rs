//! Placement passes: initial logical→physical qubit mapping.

use petgraph::graph::{NodeIndex, UnGraph};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use alsvid_ir::{Circuit, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::{CouplingMap, Layout, PropertySet, assert_placement};

fn fits(circuit: &Circuit, connectivity: &CouplingMap) -> CompileResult<()> {
    if circuit.num_qubits() > connectivity.num_qubits() {
        return Err(CompileError::CircuitTooLarge {
            required: circuit.num_qubits(),
            available: connectivity.num_qubits(),
        });
    }
    Ok(())
}

/// Trivial placement: logical qubit i sits on physical qubit i.
pub struct TrivialLayout;

impl Pass for TrivialLayout {
    fn name(&self) -> &'static str {
        "TrivialLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Layout
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let connectivity = properties
            .connectivity
            .as_ref()
            .ok_or(CompileError::MissingConnectivity)?;
        fits(circuit, connectivity)?;
        properties.layout = Some(Layout::trivial(circuit.num_qubits()));
        Ok(())
    }
}

/// User-supplied placement, validated against the circuit.
pub struct CustomLayout {
    /// Physical qubit for each logical qubit (index = logical).
    assignment: Vec<u32>,
}

impl CustomLayout {
    /// Create from an assignment vector (index = logical, entry = physical).
    pub fn new(assignment: Vec<u32>) -> Self {
        Self { assignment }
    }
}

impl Pass for CustomLayout {
    fn name(&self) -> &'static str {
        "CustomLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Layout
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let connectivity = properties
            .connectivity
            .as_ref()
            .ok_or(CompileError::MissingConnectivity)?;
        fits(circuit, connectivity)?;

        let layout = Layout::from_physical(&self.assignment);
        if !assert_placement(&layout, circuit.num_qubits()) {
            return Err(CompileError::InvalidPlacement(format!(
                "assignment {:?} is not a permutation covering the {}-qubit circuit",
                self.assignment,
                circuit.num_qubits()
            )));
        }
        properties.layout = Some(layout);
        Ok(())
    }
}

/// Subgraph-isomorphism placement.
///
/// Grows the circuit's two-qubit interaction graph edge by edge and keeps the
/// last embedding of it into the connectivity graph. NP-complete in general;
/// fails for circuits with fewer than two two-qubit gates, where there is
/// nothing to grow from.
pub struct SubgraphLayout;

fn as_graph(edges: &[(u32, u32)], nodes: u32) -> UnGraph<(), ()> {
    let mut graph = UnGraph::new_undirected();
    for _ in 0..nodes {
        graph.add_node(());
    }
    for &(a, b) in edges {
        graph.update_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), ());
    }
    graph
}

impl Pass for SubgraphLayout {
    fn name(&self) -> &'static str {
        "SubgraphLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Layout
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let connectivity = properties
            .connectivity
            .as_ref()
            .ok_or(CompileError::MissingConnectivity)?;
        fits(circuit, connectivity)?;

        let interactions = circuit.two_qubit_interactions();
        if interactions.len() < 2 {
            return Err(CompileError::TooFewInteractions(interactions.len()));
        }

        // pattern nodes: only the qubits that interact, in first-appearance
        // order; everything else is appended to spare physical qubits later
        let mut involved: Vec<u32> = vec![];
        for (a, b) in &interactions {
            for q in [a.0, b.0] {
                if !involved.contains(&q) {
                    involved.push(q);
                }
            }
        }
        let node_of = |q: u32| {
            NodeIndex::new(
                involved
                    .iter()
                    .position(|&x| x == q)
                    .expect("interaction qubits are collected above"),
            )
        };

        let device = as_graph(connectivity.edges(), connectivity.num_qubits());
        let mut pattern = as_graph(&[], involved.len() as u32);

        let mut best: Option<Vec<usize>> = None;
        for (k, (a, b)) in interactions.iter().enumerate() {
            pattern.update_edge(node_of(a.0), node_of(b.0), ());
            let mut node_match = |_: &(), _: &()| true;
            let mut edge_match = |_: &(), _: &()| true;
            let embedding = petgraph::algo::subgraph_isomorphisms_iter(
                &&pattern,
                &&device,
                &mut node_match,
                &mut edge_match,
            )
            .and_then(|mut iter| iter.next());

            match embedding {
                Some(mapping) => {
                    debug!("embedded {} interaction edges", k + 1);
                    best = Some(mapping);
                }
                None => break,
            }
            if pattern.edge_count() == device.edge_count() {
                break;
            }
        }

        let mapping = best.ok_or_else(|| {
            CompileError::InvalidPlacement(
                "interaction graph does not embed into the connectivity".into(),
            )
        })?;

        // interacting qubits take their embedded positions, the rest fill
        // the spare physical qubits in order
        let mut layout = Layout::new();
        let mut taken: Vec<u32> = vec![];
        for (node, physical) in mapping.iter().enumerate() {
            layout.add(QubitId(involved[node]), *physical as u32);
            taken.push(*physical as u32);
        }
        let mut spare = (0..connectivity.num_qubits()).filter(|p| !taken.contains(p));
        for logical in 0..circuit.num_qubits() {
            if !involved.contains(&logical) {
                if let Some(physical) = spare.next() {
                    layout.add(QubitId(logical), physical);
                }
            }
        }
        properties.layout = Some(layout);
        Ok(())
    }
}

/// Random placement with a greedy score.
///
/// Samples permutations and keeps the one allowing the longest prefix of
/// two-qubit gates to run without any SWAP; stops early on a perfect score.
pub struct RandomLayout {
    samples: usize,
    seed: u64,
}

impl RandomLayout {
    /// Create with a number of sampled permutations and an RNG seed.
    pub fn new(samples: usize, seed: u64) -> Self {
        Self { samples, seed }
    }
}

impl Default for RandomLayout {
    fn default() -> Self {
        Self::new(100, 0)
    }
}

impl RandomLayout {
    /// Number of interaction-list gates NOT executable as a prefix under
    /// `assignment`.
    fn cost(interactions: &[(QubitId, QubitId)], assignment: &[u32], map: &CouplingMap) -> usize {
        let executable = interactions
            .iter()
            .take_while(|(a, b)| {
                map.is_connected(assignment[a.0 as usize], assignment[b.0 as usize])
            })
            .count();
        interactions.len() - executable
    }
}

impl Pass for RandomLayout {
    fn name(&self) -> &'static str {
        "RandomLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Layout
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let connectivity = properties
            .connectivity
            .as_ref()
            .ok_or(CompileError::MissingConnectivity)?;
        fits(circuit, connectivity)?;

        let interactions = circuit.two_qubit_interactions();
        let n = connectivity.num_qubits();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut best: Vec<u32> = (0..n).collect();
        let mut best_cost = Self::cost(&interactions, &best, connectivity);

        for sample in 0..self.samples {
            if best_cost == 0 {
                break;
            }
            let mut candidate: Vec<u32> = (0..n).collect();
            candidate.shuffle(&mut rng);
            let cost = Self::cost(&interactions, &candidate, connectivity);
            if cost < best_cost {
                debug!("sample {} improved cost to {}", sample, cost);
                best = candidate;
                best_cost = cost;
            }
        }

        properties.layout = Some(Layout::from_physical(&best));
        Ok(())
    }
}

/// Forward/backward placement refinement.
///
/// The refinement steps need block-circuit decomposition, which this stack
/// does not have yet; both are identity, so the pass yields the trivial
/// placement after any number of iterations.
pub struct BackpropagationLayout {
    iterations: usize,
}

impl BackpropagationLayout {
    /// Create with a refinement iteration count.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    fn forward_step(&self, placement: Layout) -> Layout {
        placement
    }

    fn backward_step(&self, placement: Layout) -> Layout {
        placement
    }
}

impl Pass for BackpropagationLayout {
    fn name(&self) -> &'static str {
        "BackpropagationLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Layout
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let connectivity = properties
            .connectivity
            .as_ref()
            .ok_or(CompileError::MissingConnectivity)?;
        fits(circuit, connectivity)?;

        let mut placement = Layout::trivial(circuit.num_qubits());
        for _ in 0..self.iterations {
            placement = self.backward_step(self.forward_step(placement));
        }
        properties.layout = Some(placement);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::NativeGateSet;

    fn props(map: CouplingMap) -> PropertySet {
        PropertySet::new().with_target(map, NativeGateSet::standard())
    }

    #[test]
    fn test_trivial_layout() {
        let mut circuit = Circuit::new(3);
        circuit.h(QubitId(0)).unwrap();
        let mut properties = props(CouplingMap::linear(3));

        TrivialLayout.run(&mut circuit, &mut properties).unwrap();
        let layout = properties.layout.unwrap();
        assert_eq!(layout.get_physical(QubitId(2)), Some(2));
    }

    #[test]
    fn test_custom_layout_validated() {
        let mut circuit = Circuit::new(3);
        let mut properties = props(CouplingMap::linear(3));
        let result = CustomLayout::new(vec![0, 0, 1]).run(&mut circuit, &mut properties);
        assert!(matches!(result, Err(CompileError::InvalidPlacement(_))));

        let mut properties = props(CouplingMap::linear(3));
        CustomLayout::new(vec![2, 0, 1])
            .run(&mut circuit, &mut properties)
            .unwrap();
        assert_eq!(
            properties.layout.unwrap().get_physical(QubitId(0)),
            Some(2)
        );
    }

    #[test]
    fn test_subgraph_needs_two_interactions() {
        let mut circuit = Circuit::new(3);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        let mut properties = props(CouplingMap::linear(3));
        let result = SubgraphLayout.run(&mut circuit, &mut properties);
        assert!(matches!(result, Err(CompileError::TooFewInteractions(1))));
    }

    #[test]
    fn test_subgraph_embeds_line_into_star() {
        // q0-q1 and q1-q2 interactions: q1 must land on the star center
        let mut circuit = Circuit::new(5);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        circuit.cz(QubitId(1), QubitId(2)).unwrap();
        let star = CouplingMap::star(5);
        let mut properties = props(star.clone());

        SubgraphLayout.run(&mut circuit, &mut properties).unwrap();
        let layout = properties.layout.unwrap();
        let p0 = layout.get_physical(QubitId(0)).unwrap();
        let p1 = layout.get_physical(QubitId(1)).unwrap();
        let p2 = layout.get_physical(QubitId(2)).unwrap();
        assert!(star.is_connected(p0, p1));
        assert!(star.is_connected(p1, p2));
    }

    #[test]
    fn test_random_layout_finds_zero_cost_on_star() {
        // Two interactions both incident to q3: placing q3 on the hub makes
        // the whole circuit executable without swaps.
        let mut circuit = Circuit::new(5);
        circuit.cz(QubitId(3), QubitId(0)).unwrap();
        circuit.cz(QubitId(3), QubitId(4)).unwrap();
        let star = CouplingMap::star(5);

        for seed in 0..5 {
            let mut properties = props(star.clone());
            RandomLayout::new(100, seed)
                .run(&mut circuit, &mut properties)
                .unwrap();
            let layout = properties.layout.unwrap();
            let assignment: Vec<u32> = (0..5)
                .map(|l| layout.get_physical(QubitId(l)).unwrap())
                .collect();
            assert_eq!(
                RandomLayout::cost(&circuit.two_qubit_interactions(), &assignment, &star),
                0,
                "seed {seed} failed to find a swap-free placement"
            );
        }
    }

    #[test]
    fn test_backpropagation_is_trivial_for_now() {
        let mut circuit = Circuit::new(3);
        let mut properties = props(CouplingMap::linear(3));
        BackpropagationLayout::new(3)
            .run(&mut circuit, &mut properties)
            .unwrap();
        assert_eq!(
            properties.layout.unwrap().get_physical(QubitId(1)),
            Some(1)
        );
    }
}
