use crate::cnf::{CnfBuilder, Lit};
use crate::gate::GateType;
use crate::val3::Val3;

/// Emits the Tseitin clauses for a gate's *good-circuit* relation between
/// its input literals and output literal. One clause family per gate type,
/// over an arbitrary-width input slice rather than arity-specialized
/// overloads.
pub struct GateEncoder;

impl GateEncoder {
    pub fn encode(cnf: &mut CnfBuilder, gate: GateType, inputs: &[Lit], output: Lit) {
        match gate {
            GateType::Const0 => cnf.add_clause(&[!output]),
            GateType::Const1 => cnf.add_clause(&[output]),
            GateType::Input => {}
            GateType::Buff => add_eq(cnf, inputs[0], output),
            GateType::Not => add_eq(cnf, inputs[0], !output),
            GateType::And => add_and_rel(cnf, inputs, output, false),
            GateType::Nand => add_and_rel(cnf, inputs, output, true),
            GateType::Or => add_or_rel(cnf, inputs, output, false),
            GateType::Nor => add_or_rel(cnf, inputs, output, true),
            GateType::Xor => add_xor_rel(cnf, inputs[0], inputs[1], output, false),
            GateType::Xnor => add_xor_rel(cnf, inputs[0], inputs[1], output, true),
        }
    }
}

fn add_eq(cnf: &mut CnfBuilder, a: Lit, b: Lit) {
    cnf.add_clause(&[!a, b]);
    cnf.add_clause(&[a, !b]);
}

/// `out <-> AND(inputs)`, or `out <-> NAND(inputs)` when `invert`.
fn add_and_rel(cnf: &mut CnfBuilder, inputs: &[Lit], output: Lit, invert: bool) {
    let o = if invert { !output } else { output };
    // out -> each input
    for &i in inputs {
        cnf.add_clause(&[!o, i]);
    }
    // (AND inputs) -> out
    let mut clause: Vec<Lit> = inputs.iter().map(|&i| !i).collect();
    clause.push(o);
    cnf.add_clause(&clause);
}

/// `out <-> OR(inputs)`, or `out <-> NOR(inputs)` when `invert`.
fn add_or_rel(cnf: &mut CnfBuilder, inputs: &[Lit], output: Lit, invert: bool) {
    let o = if invert { !output } else { output };
    for &i in inputs {
        cnf.add_clause(&[o, !i]);
    }
    let mut clause: Vec<Lit> = inputs.to_vec();
    clause.push(!o);
    cnf.add_clause(&clause);
}

/// `out <-> (a XOR b)`, or `out <-> (a XNOR b)` when `invert`.
fn add_xor_rel(cnf: &mut CnfBuilder, a: Lit, b: Lit, output: Lit, invert: bool) {
    let o = if invert { !output } else { output };
    cnf.add_clause(&[!a, !b, !o]);
    cnf.add_clause(&[a, b, !o]);
    cnf.add_clause(&[a, !b, o]);
    cnf.add_clause(&[!a, b, o]);
}

/// Emits the Tseitin clauses for a gate's *faulty-circuit* relation, i.e.
/// the output's behavior under a stuck-at or branch fault.
pub struct FaultyGateEncoder;

impl FaultyGateEncoder {
    /// Stem faults force the output directly regardless of gate type.
    pub fn encode_stem_fault(cnf: &mut CnfBuilder, output: Lit, stuck_at: Val3) {
        match stuck_at {
            Val3::V0 => cnf.add_clause(&[!output]),
            Val3::V1 => cnf.add_clause(&[output]),
            Val3::X => unreachable!("stuck-at fault value must be 0 or 1"),
        }
    }

    /// Branch faults fix one input pin's faulty-circuit value and relate the
    /// remaining, unaffected input literals to the output as usual.
    pub fn encode_branch_fault(
        cnf: &mut CnfBuilder,
        gate: GateType,
        inputs: &[Lit],
        faulted_pin: usize,
        stuck_at: Val3,
        output: Lit,
    ) {
        let faulted_val = match stuck_at {
            Val3::V0 => false,
            Val3::V1 => true,
            Val3::X => unreachable!("stuck-at fault value must be 0 or 1"),
        };
        let others: Vec<Lit> = inputs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != faulted_pin)
            .map(|(_, &l)| l)
            .collect();

        match gate {
            GateType::Buff => {
                if faulted_val {
                    cnf.add_clause(&[output]);
                } else {
                    cnf.add_clause(&[!output]);
                }
            }
            GateType::Not => {
                if faulted_val {
                    cnf.add_clause(&[!output]);
                } else {
                    cnf.add_clause(&[output]);
                }
            }
            GateType::And | GateType::Nand => {
                if !faulted_val {
                    // stuck-at-0 on any AND input forces the AND output to 0.
                    let o = if gate == GateType::Nand { !output } else { output };
                    cnf.add_clause(&[!o]);
                } else if others.len() == 1 {
                    let o = if gate == GateType::Nand { !output } else { output };
                    add_eq(cnf, others[0], o);
                } else {
                    add_and_rel(cnf, &others, output, gate == GateType::Nand);
                }
            }
            GateType::Or | GateType::Nor => {
                if faulted_val {
                    let o = if gate == GateType::Nor { !output } else { output };
                    cnf.add_clause(&[o]);
                } else if others.len() == 1 {
                    let o = if gate == GateType::Nor { !output } else { output };
                    add_eq(cnf, others[0], o);
                } else {
                    add_or_rel(cnf, &others, output, gate == GateType::Nor);
                }
            }
            GateType::Xor | GateType::Xnor => {
                // binary only: the faulted pin's value is now a fixed
                // constant, collapsing the gate to a buffer/inverter on the
                // surviving input.
                let surviving = others[0];
                let invert_for_const =
                    faulted_val ^ (gate == GateType::Xnor);
                if invert_for_const {
                    add_eq(cnf, surviving, !output);
                } else {
                    add_eq(cnf, surviving, output);
                }
            }
            GateType::Const0 | GateType::Const1 | GateType::Input => {
                unreachable!("branch faults only apply to gates with fanins")
            }
        }
    }
}
