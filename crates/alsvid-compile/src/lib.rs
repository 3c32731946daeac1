//! Alsvid transpilation pipeline
//!
//! Turns an arbitrary circuit into one that respects the device connectivity
//! and uses only hardware-native gates, through an ordered list of passes:
//!
//! 1. **Preprocessing** — pads the circuit to the physical qubit count and
//!    rejects circuits that do not fit.
//! 2. **Placement** — picks an initial logical→physical qubit mapping
//!    ([`TrivialLayout`], [`CustomLayout`], [`SubgraphLayout`],
//!    [`RandomLayout`], [`BackpropagationLayout`]).
//! 3. **Routing** — inserts SWAP gates so every two-qubit gate lands on a
//!    connectivity edge ([`ShortestPathsRouter`]).
//! 4. **Unrolling** — decomposes what remains into the native gate set
//!    ([`NativeUnroller`]).
//!
//! ```rust
//! use alsvid_ir::{Circuit, QubitId};
//! use alsvid_compile::{CouplingMap, NativeGateSet, Pipeline, PropertySet};
//!
//! let mut circuit = Circuit::new(3);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(2)).unwrap();
//!
//! let props = PropertySet::new().with_target(CouplingMap::linear(5), NativeGateSet::standard());
//! let (pipeline, props) = Pipeline::standard(props);
//! let (routed, layout) = pipeline.transpile(&circuit, props).unwrap();
//! assert!(routed.is_native());
//! assert_eq!(layout.len(), 5);
//! ```

pub mod error;
pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod property;

pub use error::{CompileError, CompileResult};
pub use pass::{Pass, PassKind};
pub use passes::{
    BackpropagationLayout, CustomLayout, NativeUnroller, Preprocessing, RandomLayout,
    ShortestPathsRouter, SubgraphLayout, TrivialLayout, respect_connectivity,
};
pub use pipeline::Pipeline;
pub use property::{CouplingMap, Layout, NativeGateSet, PropertySet, assert_placement};
