use crate::cnf::Lit;
use crate::cone_builder::Cone;
use crate::fault::{Fault, FaultModel, FaultSite};
use crate::network::NetworkModel;

/// Builds the solver assumptions that (a) activate `fault` and (b) force
/// every side input along the single-fanout chain from the fault site up to
/// `ffr_root` to its gate's non-controlling value, so the fault's effect is
/// the only thing that can change that chain's output.
pub fn build_assumptions(net: &NetworkModel, cone: &Cone, ffr_root: crate::network::NodeId, fault: &Fault) -> Vec<Lit> {
    let mut assumptions = Vec::new();

    let (origin, activation_node) = match fault.site {
        FaultSite::Stem(node) => (node, node),
        FaultSite::Branch { node, pin } => (net.node(node).fanins[pin], node),
    };

    // Activation: the good circuit must carry the opposite of the stuck
    // value at the faulted wire, so the faulty circuit's forced value
    // actually differs from the good one.
    let activate_val = !fault.stuck_at.as_bool().expect("stuck-at value is 0 or 1");
    assumptions.push(cone.vars.gvar(origin).lit(activate_val));

    if fault.model == FaultModel::TransitionDelay {
        if let Some(h) = cone.vars.hvar(origin) {
            // launch frame must already hold the stuck value, so the
            // capture-frame activation above is a genuine transition.
            assumptions.push(h.lit(!activate_val));
        }
    }

    if let FaultSite::Branch { node, pin } = fault.site {
        if let Some(nval) = net.node(node).gate_type().nval() {
            for (p, &fanin) in net.node(node).fanins.iter().enumerate() {
                if p != pin {
                    assumptions.push(cone.vars.gvar(fanin).lit(nval.as_bool().unwrap()));
                }
            }
        }
    }

    // Walk the single-fanout chain from the activation node up to the FFR
    // root, forcing every side input along the way to its gate's
    // non-controlling value. Gates with no controlling value (Xor/Xnor)
    // contribute no side-input condition and are skipped.
    let mut cur = activation_node;
    while cur != ffr_root {
        let node = net.node(cur);
        if node.fanout_count() != 1 {
            break;
        }
        let next = node.fanouts[0];
        let next_node = net.node(next);
        if next_node.fanin_count() > 1 {
            if let Some(nval) = next_node.gate_type().nval() {
                for &fanin in &next_node.fanins {
                    if fanin != cur {
                        assumptions.push(cone.vars.gvar(fanin).lit(nval.as_bool().unwrap()));
                    }
                }
            }
        }
        cur = next;
    }

    assumptions
}
