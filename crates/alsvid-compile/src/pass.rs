//! Pass trait and types for compilation passes.

use alsvid_ir::Circuit;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// The stage a compilation pass belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Structural checks and circuit padding before placement.
    Preprocessing,
    /// Produces an initial logical→physical qubit mapping.
    Layout,
    /// Inserts SWAP gates to satisfy connectivity.
    Routing,
    /// Decomposes gates into the native set.
    Unrolling,
}

/// A compilation pass operating on a circuit and shared properties.
///
/// Passes are the unit of composition in the transpiler: each performs one
/// transformation or analysis and communicates through the [`PropertySet`].
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &'static str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass.
    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPass;

    impl Pass for NoopPass {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn kind(&self) -> PassKind {
            PassKind::Preprocessing
        }

        fn run(&self, _circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pass_kind() {
        let pass = NoopPass;
        assert_eq!(pass.kind(), PassKind::Preprocessing);
        assert_eq!(pass.name(), "noop");
    }
}
