//! Native-gate decomposition.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use alsvid_ir::{Circuit, Gate, Instruction, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Decomposes arbitrary gates into the native set {I, Z, RZ, U3, CZ, M}.
///
/// Single-qubit gates lower to U3/RZ; CX lowers to H·CZ·H on the target and
/// SWAP to three CXs. RZ-family gates stay symbolic so the pulse compiler can
/// absorb them into virtual-Z phases.
pub struct NativeUnroller;

fn u3(theta: f64, phi: f64, lambda: f64, q: QubitId) -> Instruction {
    Instruction::single(Gate::U3(theta, phi, lambda), q)
}

fn h(q: QubitId) -> Instruction {
    u3(FRAC_PI_2, 0.0, PI, q)
}

fn lower_cx(control: QubitId, target: QubitId, out: &mut Vec<Instruction>) {
    out.push(h(target));
    out.push(Instruction::two(Gate::CZ, control, target));
    out.push(h(target));
}

fn lower(instruction: &Instruction, out: &mut Vec<Instruction>) {
    let q = instruction.qubits[0];
    match &instruction.gate {
        // already native
        Gate::I | Gate::Z | Gate::RZ(_) | Gate::U3(_, _, _) | Gate::CZ | Gate::M => {
            out.push(instruction.clone());
        }
        Gate::X => out.push(u3(PI, 0.0, PI, q)),
        Gate::Y => out.push(u3(PI, FRAC_PI_2, FRAC_PI_2, q)),
        Gate::H => out.push(h(q)),
        Gate::S => out.push(Instruction::single(Gate::RZ(FRAC_PI_2), q)),
        Gate::Sdg => out.push(Instruction::single(Gate::RZ(-FRAC_PI_2), q)),
        Gate::T => out.push(Instruction::single(Gate::RZ(FRAC_PI_4), q)),
        Gate::Tdg => out.push(Instruction::single(Gate::RZ(-FRAC_PI_4), q)),
        Gate::RX(theta) => out.push(u3(*theta, -FRAC_PI_2, FRAC_PI_2, q)),
        Gate::RY(theta) => out.push(u3(*theta, 0.0, 0.0, q)),
        Gate::CX => lower_cx(instruction.qubits[0], instruction.qubits[1], out),
        Gate::Swap => {
            let (a, b) = (instruction.qubits[0], instruction.qubits[1]);
            lower_cx(a, b, out);
            lower_cx(b, a, out);
            lower_cx(a, b, out);
        }
    }
}

impl Pass for NativeUnroller {
    fn name(&self) -> &'static str {
        "NativeUnroller"
    }

    fn kind(&self) -> PassKind {
        PassKind::Unrolling
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        let mut lowered = Vec::with_capacity(circuit.num_ops());
        for instruction in circuit.instructions() {
            lower(instruction, &mut lowered);
        }
        let mut unrolled = Circuit::new(circuit.num_qubits());
        for instruction in lowered {
            unrolled.add(instruction).map_err(CompileError::Ir)?;
        }
        *circuit = unrolled;
        Ok(())
    }
}
