//! Pass composition.

use tracing::{debug, info, instrument};

use alsvid_ir::Circuit;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::{NativeUnroller, Preprocessing, ShortestPathsRouter, TrivialLayout};
use crate::property::{Layout, PropertySet};

/// An ordered list of compilation passes.
///
/// Runs passes in insertion order and enforces the structural rules: routing
/// needs connectivity, and some placement pass must have produced a layout
/// before any routing pass runs.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Append a pass.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// The default composition: preprocessing, trivial placement,
    /// shortest-paths routing, native unrolling.
    pub fn standard(properties: PropertySet) -> (Self, PropertySet) {
        let mut pipeline = Self::new();
        pipeline
            .add_pass(Preprocessing)
            .add_pass(TrivialLayout)
            .add_pass(ShortestPathsRouter::new())
            .add_pass(NativeUnroller);
        (pipeline, properties)
    }

    /// Number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether the pipeline has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass in order on the circuit.
    #[instrument(skip(self, circuit, properties))]
    pub fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "running {} passes on a {}-qubit circuit",
            self.passes.len(),
            circuit.num_qubits()
        );
        for pass in &self.passes {
            match pass.kind() {
                PassKind::Layout | PassKind::Routing if properties.connectivity.is_none() => {
                    return Err(CompileError::MissingConnectivity);
                }
                PassKind::Routing if properties.layout.is_none() => {
                    return Err(CompileError::MissingPlacer(pass.name()));
                }
                _ => {}
            }
            debug!("running pass: {}", pass.name());
            pass.run(circuit, properties)?;
            debug!("pass {} completed, ops: {}", pass.name(), circuit.num_ops());
        }
        Ok(())
    }

    /// Transpile a circuit, returning the hardware circuit and the final
    /// logical→physical mapping.
    pub fn transpile(
        &self,
        circuit: &Circuit,
        mut properties: PropertySet,
    ) -> CompileResult<(Circuit, Layout)> {
        let mut hardware = circuit.clone();
        self.run(&mut hardware, &mut properties)?;
        let layout = properties.layout.ok_or(CompileError::MissingPlacer("Pipeline"))?;
        Ok((hardware, layout))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::respect_connectivity;
    use crate::property::{CouplingMap, NativeGateSet};
    use alsvid_ir::QubitId;

    #[test]
    fn test_standard_pipeline_end_to_end() {
        let mut circuit = Circuit::new(3);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.m(&[QubitId(0), QubitId(2)]).unwrap();

        let map = CouplingMap::linear(5);
        let props = PropertySet::new().with_target(map.clone(), NativeGateSet::standard());
        let (pipeline, props) = Pipeline::standard(props);

        let (hardware, layout) = pipeline.transpile(&circuit, props).unwrap();
        assert!(hardware.is_native());
        assert!(respect_connectivity(&hardware, &map));
        assert_eq!(layout.len(), 5);
    }

    #[test]
    fn test_router_without_placer_fails() {
        let mut pipeline = Pipeline::new();
        pipeline.add_pass(ShortestPathsRouter::new());
        let props =
            PropertySet::new().with_target(CouplingMap::linear(3), NativeGateSet::standard());

        let mut circuit = Circuit::new(2);
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        let result = pipeline.run(&mut circuit, &mut props.clone());
        assert!(matches!(result, Err(CompileError::MissingPlacer(_))));
    }

    #[test]
    fn test_routing_without_connectivity_fails() {
        let mut pipeline = Pipeline::new();
        pipeline.add_pass(TrivialLayout);
        let mut props = PropertySet::new();

        let mut circuit = Circuit::new(2);
        let result = pipeline.run(&mut circuit, &mut props);
        assert!(matches!(result, Err(CompileError::MissingConnectivity)));
    }
}
