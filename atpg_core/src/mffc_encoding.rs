use std::collections::HashMap;

use crate::cnf::{CnfBuilder, Lit, Var};
use crate::cone_builder::Cone;
use crate::gate_encoder::GateEncoder;
use crate::network::{NetworkModel, NodeId};

/// Multi-fault control structure for an MFFC-scoped engine: one control
/// variable per member FFR root other than the fault's own site. Each such
/// root gets an intermediate `g'` variable carrying the *real* per-fault
/// gate relation — the same faulty-circuit fanin literals `encode_faulty_node`
/// would use, so divergence reconverging into this root from elsewhere in
/// the MFFC still propagates — and `f(root) = g'(root) XOR control(root)`.
///
/// This engine rebuilds a fresh CNF per fault rather than sharing one base
/// CNF across a multi-fault MFFC sweep, so there is never more than one
/// "live" root to select: every control is assumed false, collapsing the
/// XOR to a plain equality and leaving `g'` as the sole source of truth.
/// The control/XOR scaffold is kept to match the shared-CNF architecture a
/// batched sweep would need, per the k-control-variable MFFC encoding.
pub struct MffcControls {
    control: HashMap<NodeId, Var>,
}

impl MffcControls {
    /// `fault_site` is excluded: its faulty relation is injected directly by
    /// the caller (stem/branch fault encoding), not through the control XOR.
    pub fn build(cnf: &mut CnfBuilder, net: &NetworkModel, cone: &Cone, ffr_roots: &[NodeId], fault_site: NodeId) -> Self {
        let mut control = HashMap::new();
        for &root in ffr_roots {
            if root == fault_site {
                continue;
            }
            let c = cnf.new_var();
            control.insert(root, c);

            let node = net.node(root);
            let f = cone.vars.fvar(root).pos();
            if node.is_primary_input() || node.is_storage_output() {
                // No gate relation to recompute at a source node; nothing
                // can inject a fault here except a stem fault directly at
                // this root, which `fault_site` already excludes above.
                inject_xor(cnf, cone.vars.gvar(root).pos(), c.pos(), f);
                continue;
            }
            let g_prime = cnf.new_var();
            let inputs: Vec<Lit> = node.fanins.iter().map(|&fi| cone.vars.fvar(fi).pos()).collect();
            GateEncoder::encode(cnf, node.gate_type(), &inputs, g_prime.pos());
            inject_xor(cnf, g_prime.pos(), c.pos(), f);
        }
        MffcControls { control }
    }

    /// Every control literal held false. See the struct docs for why this
    /// engine never needs to select a different "live" root.
    pub fn assumptions(&self) -> Vec<Lit> {
        self.control.values().map(|&c| c.lit(false)).collect()
    }
}

fn inject_xor(cnf: &mut CnfBuilder, a: Lit, b: Lit, output: Lit) {
    cnf.add_clause(&[!a, !b, !output]);
    cnf.add_clause(&[a, b, !output]);
    cnf.add_clause(&[a, !b, output]);
    cnf.add_clause(&[!a, b, output]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::SatOutcome;

    #[test]
    fn control_held_false_makes_faulty_value_track_g_prime() {
        let mut cnf = CnfBuilder::new();
        let g1 = cnf.new_var();
        let f1 = cnf.new_var();
        let c1 = cnf.new_var();
        let g_prime = cnf.new_var();
        inject_xor(&mut cnf, g_prime.pos(), c1.pos(), f1.pos());
        cnf.add_clause(&[!g_prime.pos(), g1.pos()]);
        cnf.add_clause(&[g_prime.pos(), !g1.pos()]);
        cnf.add_clause(&[g1.pos()]);
        match cnf.solve_with_assumptions(&[c1.neg()], None) {
            SatOutcome::Sat(m) => assert_eq!(m.value(f1), m.value(g1)),
            _ => panic!("expected SAT"),
        }
    }
}
