//! Shared state passed between compilation passes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use alsvid_ir::QubitId;

/// A mapping from logical qubits to physical qubits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    logical_to_physical: FxHashMap<QubitId, u32>,
    physical_to_logical: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trivial layout (logical qubit i -> physical qubit i).
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(QubitId(i), i);
        }
        layout
    }

    /// Build a layout from a vector where index is the logical qubit and the
    /// entry is its physical qubit.
    pub fn from_physical(assignment: &[u32]) -> Self {
        let mut layout = Self::new();
        for (logical, &physical) in assignment.iter().enumerate() {
            layout.add(QubitId(logical as u32), physical);
        }
        layout
    }

    /// Add a mapping from logical to physical qubit, displacing conflicts.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Physical qubit assigned to a logical qubit.
    pub fn get_physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Logical qubit sitting on a physical qubit.
    pub fn get_logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Exchange the logical qubits on two physical positions.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical.get(&p1).copied();
        let l2 = self.physical_to_logical.get(&p2).copied();
        if let Some(l) = l2 {
            self.add(l, p1);
        } else if let Some(&l) = self.physical_to_logical.get(&p1) {
            self.logical_to_physical.remove(&l);
            self.physical_to_logical.remove(&p1);
        }
        if let Some(l) = l1 {
            self.add(l, p2);
        }
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.logical_to_physical.iter().map(|(l, p)| (*l, *p))
    }
}

/// Check that `layout` is a valid placement for a circuit of `nqubits` qubits:
/// the mapped logical qubits are exactly q0..q(n-1) and their physical
/// assignments are a permutation of 0..n-1.
pub fn assert_placement(layout: &Layout, nqubits: u32) -> bool {
    if layout.len() != nqubits as usize {
        return false;
    }
    let mut physical: Vec<u32> = Vec::with_capacity(nqubits as usize);
    for logical in 0..nqubits {
        match layout.get_physical(QubitId(logical)) {
            Some(p) => physical.push(p),
            None => return false,
        }
    }
    physical.sort_unstable();
    physical.iter().enumerate().all(|(i, &p)| p == i as u32)
}

/// Physical qubit adjacency of the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingMap {
    num_qubits: u32,
    edges: Vec<(u32, u32)>,
    #[serde(skip)]
    adjacency: FxHashMap<u32, Vec<u32>>,
}

impl CouplingMap {
    /// Create a coupling map over `num_qubits` with no edges.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            edges: vec![],
            adjacency: FxHashMap::default(),
        }
    }

    /// Build a coupling map from an undirected edge list.
    pub fn from_edges(num_qubits: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut map = Self::new(num_qubits);
        for (a, b) in edges {
            map.add_edge(a, b);
        }
        map
    }

    /// Add an undirected edge.
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        self.edges.push((q1, q2));
        self.adjacency.entry(q1).or_default().push(q2);
        self.adjacency.entry(q2).or_default().push(q1);
    }

    /// Rebuild the adjacency cache, needed after deserialization.
    pub fn rebuild_cache(&mut self) {
        self.adjacency.clear();
        for &(a, b) in &self.edges {
            self.adjacency.entry(a).or_default().push(b);
            self.adjacency.entry(b).or_default().push(a);
        }
    }

    /// Whether two physical qubits share an edge.
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|n| n.contains(&q2))
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Undirected edge list.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Neighbors of a physical qubit.
    pub fn neighbors(&self, qubit: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&qubit)
            .into_iter()
            .flat_map(|n| n.iter().copied())
    }

    /// Linear chain 0-1-2-...-(n-1).
    pub fn linear(n: u32) -> Self {
        Self::from_edges(n, (0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// Star with qubit 0 at the center.
    pub fn star(n: u32) -> Self {
        Self::from_edges(n, (1..n).map(|i| (0, i)))
    }

    /// Fully connected graph.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for a in 0..n {
            for b in (a + 1)..n {
                map.add_edge(a, b);
            }
        }
        map
    }

    /// BFS distances from `source` over the whole graph.
    fn bfs_distances(&self, source: u32) -> FxHashMap<u32, u32> {
        let mut dist = FxHashMap::default();
        dist.insert(source, 0);
        let mut queue = std::collections::VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for next in self.neighbors(node) {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Length of the shortest path between two qubits, if connected.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        self.bfs_distances(from).get(&to).copied()
    }

    /// All shortest paths between two physical qubits.
    ///
    /// Enumerated over the BFS predecessor DAG, so every returned path has
    /// the same (minimal) length. Empty when the qubits are disconnected.
    pub fn all_shortest_paths(&self, from: u32, to: u32) -> Vec<Vec<u32>> {
        if from == to {
            return vec![vec![from]];
        }
        let dist = self.bfs_distances(from);
        if !dist.contains_key(&to) {
            return vec![];
        }
        let mut paths = vec![];
        let mut stack = vec![vec![to]];
        while let Some(partial) = stack.pop() {
            let head = *partial.last().unwrap();
            if head == from {
                let mut path = partial.clone();
                path.reverse();
                paths.push(path);
                continue;
            }
            let d = dist[&head];
            for prev in self.neighbors(head) {
                if dist.get(&prev) == Some(&(d - 1)) {
                    let mut longer = partial.clone();
                    longer.push(prev);
                    stack.push(longer);
                }
            }
        }
        paths
    }
}

/// The gate vocabulary a device executes natively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeGateSet {
    gates: Vec<String>,
}

impl NativeGateSet {
    /// Build from gate names.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// The native set the pulse compiler understands:
    /// identity, virtual Z rotations, U3 and CZ plus measurement.
    pub fn standard() -> Self {
        Self::new(["id", "z", "rz", "u3", "cz", "measure"])
    }

    /// Whether a gate name is native.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Gate names.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }
}

/// Shared context passed through all compilation passes.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    /// Device connectivity.
    pub connectivity: Option<CouplingMap>,
    /// Current logical→physical mapping.
    pub layout: Option<Layout>,
    /// Native gate vocabulary.
    pub native_gates: Option<NativeGateSet>,
    /// SWAP gates inserted by routing.
    pub added_swaps: usize,
}

impl PropertySet {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connectivity and native gates.
    #[must_use]
    pub fn with_target(mut self, connectivity: CouplingMap, native_gates: NativeGateSet) -> Self {
        self.connectivity = Some(connectivity);
        self.native_gates = Some(native_gates);
        self
    }

    /// Set an initial layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_layout() {
        let layout = Layout::trivial(3);
        assert_eq!(layout.get_physical(QubitId(1)), Some(1));
        assert_eq!(layout.get_logical(2), Some(QubitId(2)));
    }

    #[test]
    fn test_layout_swap() {
        let mut layout = Layout::trivial(3);
        layout.swap(0, 2);
        assert_eq!(layout.get_physical(QubitId(0)), Some(2));
        assert_eq!(layout.get_physical(QubitId(2)), Some(0));
        assert_eq!(layout.get_physical(QubitId(1)), Some(1));
    }

    #[test]
    fn test_assert_placement_accepts_permutations() {
        assert!(assert_placement(&Layout::trivial(4), 4));
        assert!(assert_placement(&Layout::from_physical(&[2, 0, 1]), 3));
    }

    #[test]
    fn test_assert_placement_rejects_bad_mappings() {
        // wrong size
        assert!(!assert_placement(&Layout::trivial(3), 4));
        // not a permutation of 0..n-1
        assert!(!assert_placement(&Layout::from_physical(&[0, 2]), 2));
        // duplicate physical assignment collapses the map
        assert!(!assert_placement(&Layout::from_physical(&[1, 1, 0]), 3));
    }

    #[test]
    fn test_coupling_linear() {
        let map = CouplingMap::linear(4);
        assert!(map.is_connected(0, 1));
        assert!(map.is_connected(1, 0));
        assert!(!map.is_connected(0, 2));
        assert_eq!(map.distance(0, 3), Some(3));
    }

    #[test]
    fn test_all_shortest_paths_ring() {
        // 0-1-2-3-0 square: two shortest paths between opposite corners
        let map = CouplingMap::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]);
        let mut paths = map.all_shortest_paths(0, 2);
        paths.sort();
        assert_eq!(paths, vec![vec![0, 1, 2], vec![0, 3, 2]]);
    }

    #[test]
    fn test_all_shortest_paths_disconnected() {
        let map = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
        assert!(map.all_shortest_paths(0, 3).is_empty());
    }

    #[test]
    fn test_native_gate_set() {
        let natives = NativeGateSet::standard();
        assert!(natives.contains("cz"));
        assert!(!natives.contains("cx"));
    }
}
