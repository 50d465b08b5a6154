use std::collections::HashSet;

use crate::cnf::CnfBuilder;
use crate::cone_builder::Cone;
use crate::network::{NetworkModel, NodeId};
use crate::structural_index::StructuralIndex;

/// Emits the propagation ("D-chain") clauses that let a divergence variable
/// `d(n)` mean "the good and faulty circuits disagree at n", and chains that
/// divergence toward an observable point. One node at a time.
pub struct DChain;

impl DChain {
    pub fn encode(cnf: &mut CnfBuilder, net: &NetworkModel, structural: &StructuralIndex, cone: &Cone) {
        let tfo_set: HashSet<NodeId> = cone.tfo.iter().copied().collect();

        for &n in &cone.tfo {
            let d = cone.vars.dvar(n).expect("TFO node always has a d-variable");
            let g = cone.vars.gvar(n).pos();
            let f = cone.vars.fvar(n).pos();

            // d(n) -> g(n) != f(n)
            cnf.add_clause(&[!d.pos(), g, f]);
            cnf.add_clause(&[!d.pos(), !g, !f]);

            let node = net.node(n);
            if node.is_observation_point() {
                // full iff at observation points: g(n) != f(n) -> d(n)
                cnf.add_clause(&[d.pos(), !g, f]);
                cnf.add_clause(&[d.pos(), g, !f]);
            } else {
                let mut clause = vec![!d.pos()];
                for &fo in &node.fanouts {
                    if tfo_set.contains(&fo) {
                        if let Some(dfo) = cone.vars.dvar(fo) {
                            clause.push(dfo.pos());
                        }
                    }
                }
                cnf.add_clause(&clause);

                if let Some(dom) = structural.immediate_dominator(n) {
                    if let Some(ddom) = cone.vars.dvar(dom) {
                        cnf.add_clause(&[!d.pos(), ddom.pos()]);
                    }
                }
            }
        }
    }

    /// The detection axiom: at least one observable point in the cone must
    /// diverge. When the fault site's own root is already an observable
    /// point, a unit clause suffices (propagation is already complete).
    pub fn encode_detection_axiom(cnf: &mut CnfBuilder, net: &NetworkModel, cone: &Cone, root: NodeId) {
        if net.node(root).is_observation_point() {
            let d = cone.vars.dvar(root).expect("root is in TFO");
            cnf.add_clause(&[d.pos()]);
            return;
        }
        let clause: Vec<_> = cone
            .tfo
            .iter()
            .filter(|&&n| net.node(n).is_observation_point())
            .map(|&n| cone.vars.dvar(n).unwrap().pos())
            .collect();
        cnf.add_clause(&clause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultModel;
    use crate::gate::GateType;
    use crate::network::NetworkBuilder;

    #[test]
    fn single_fanout_node_propagates_or_hits_dominator() {
        let mut b = NetworkBuilder::new();
        let a = b.add_primary_input();
        let c = b.add_primary_input();
        let and_g = b.add_logic(GateType::And, vec![a, c]);
        b.add_primary_output(and_g);
        let net = b.build().unwrap();
        let structural = StructuralIndex::build(&net);
        let mut cnf = CnfBuilder::new();
        let cone = Cone::build(&net, &mut cnf, &[and_g], &[], FaultModel::StuckAt);
        DChain::encode(&mut cnf, &net, &structural, &cone);
        DChain::encode_detection_axiom(&mut cnf, &net, &cone, and_g);
        assert!(cone.vars.dvar(and_g).is_some());
    }
}
