use std::collections::HashSet;

use crate::cnf::Model;
use crate::config::JustifyStrategy;
use crate::cone_builder::Cone;
use crate::gate::GateType;
use crate::network::{NetworkModel, NodeId};
use crate::val3::Val3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAssign {
    pub node: NodeId,
    pub time: u8,
    pub value: bool,
}

pub type NodeValList = Vec<NodeAssign>;

/// Back-traces a set of internal value requirements down to an assignment
/// over primary inputs only. `SinglePath` follows one justifying fanin per
/// choice point; `AllPath` explores every candidate fanin and keeps
/// whichever yields the smaller final assignment.
pub struct Justifier<'a> {
    net: &'a NetworkModel,
    cone: &'a Cone,
    model: &'a Model,
    td_mode: bool,
    strategy: JustifyStrategy,
}

impl<'a> Justifier<'a> {
    pub fn new(
        net: &'a NetworkModel,
        cone: &'a Cone,
        model: &'a Model,
        td_mode: bool,
        strategy: JustifyStrategy,
    ) -> Self {
        Justifier {
            net,
            cone,
            model,
            td_mode,
            strategy,
        }
    }

    fn gval(&self, node: NodeId, time: u8) -> Val3 {
        if time == 0 {
            match self.cone.vars.hvar(node) {
                Some(h) => self.model.lit_value(h.pos()),
                None => self.model.lit_value(self.cone.vars.gvar(node).pos()),
            }
        } else {
            self.model.lit_value(self.cone.vars.gvar(node).pos())
        }
    }

    fn fval(&self, node: NodeId, time: u8) -> Val3 {
        if time == 0 {
            self.gval(node, 0)
        } else {
            self.model.lit_value(self.cone.vars.fvar(node).pos())
        }
    }

    /// Justifies every assignment in `targets`, returning the resulting
    /// primary-input-level assignment list.
    pub fn run(&self, targets: &[NodeAssign]) -> NodeValList {
        let mut justified: HashSet<(NodeId, u8)> = HashSet::new();
        let mut out = Vec::new();
        for t in targets {
            self.justify(t.node, t.time, &mut justified, &mut out);
        }
        out
    }

    fn record_value(&self, node: NodeId, time: u8, out: &mut NodeValList) {
        if let Some(b) = self.gval(node, time).as_bool() {
            out.push(NodeAssign { node, time, value: b });
        }
    }

    fn justify(&self, node: NodeId, time: u8, justified: &mut HashSet<(NodeId, u8)>, out: &mut NodeValList) {
        if !justified.insert((node, time & 1)) {
            return;
        }
        let n = self.net.node(node);

        if n.is_primary_input() {
            self.record_value(node, time, out);
            return;
        }
        if n.is_storage_output() && time == 1 && self.td_mode {
            let paired = self.net.paired_storage_node(node).expect("storage output is paired");
            self.justify(paired, 0, justified, out);
            return;
        }
        if n.is_storage_output() {
            self.record_value(node, time, out);
            return;
        }

        if self.gval(node, time) != self.fval(node, time) {
            self.just_all(&n.fanins.clone(), time, justified, out);
            return;
        }

        let gate = n.gate_type();
        match gate {
            GateType::Buff | GateType::Not => {
                self.justify(n.fanins[0], time, justified, out);
            }
            GateType::Xor | GateType::Xnor => {
                self.just_all(&n.fanins.clone(), time, justified, out);
            }
            _ => {
                let cval = gate.cval();
                let cval_out = gate.cval_output();
                match (cval, cval_out) {
                    (Some(cval), Some(cval_out)) => {
                        if self.gval(node, time) == cval_out {
                            self.just_one(&n.fanins.clone(), time, cval, justified, out);
                        } else {
                            self.just_all(&n.fanins.clone(), time, justified, out);
                        }
                    }
                    _ => self.just_all(&n.fanins.clone(), time, justified, out),
                }
            }
        }
    }

    fn just_all(&self, fanins: &[NodeId], time: u8, justified: &mut HashSet<(NodeId, u8)>, out: &mut NodeValList) {
        for &fi in fanins {
            self.justify(fi, time, justified, out);
        }
    }

    /// Justifies one fanin whose good value matches `want`, preferring the
    /// same pick for the faulty value when it diverges there too. In
    /// `AllPath` mode every matching candidate is tried and the branch
    /// producing the smaller assignment list is kept.
    fn just_one(&self, fanins: &[NodeId], time: u8, want: Val3, justified: &mut HashSet<(NodeId, u8)>, out: &mut NodeValList) {
        match self.strategy {
            JustifyStrategy::SinglePath => {
                let mut g_found: Option<NodeId> = None;
                let mut f_found: Option<NodeId> = None;
                for &fi in fanins {
                    if g_found.is_none() && self.gval(fi, time) == want {
                        g_found = Some(fi);
                    }
                    if f_found.is_none() && self.fval(fi, time) == want && Some(fi) != g_found {
                        f_found = Some(fi);
                    }
                    if g_found.is_some() && f_found.is_some() {
                        break;
                    }
                }
                if let Some(fi) = g_found {
                    self.justify(fi, time, justified, out);
                }
                if let Some(fi) = f_found {
                    self.justify(fi, time, justified, out);
                }
            }
            JustifyStrategy::AllPath => {
                let candidates: Vec<NodeId> = fanins
                    .iter()
                    .copied()
                    .filter(|&fi| self.gval(fi, time) == want)
                    .collect();
                let mut best: Option<NodeValList> = None;
                for cand in candidates {
                    let mut trial_justified = justified.clone();
                    let mut trial_out = out.clone();
                    self.justify(cand, time, &mut trial_justified, &mut trial_out);
                    let gained = trial_out.len();
                    if best.as_ref().map(|b| gained < b.len()).unwrap_or(true) {
                        best = Some(trial_out);
                    }
                }
                if let Some(result) = best {
                    *justified = {
                        let mut j = justified.clone();
                        for a in &result {
                            j.insert((a.node, a.time & 1));
                        }
                        j
                    };
                    *out = result;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::{CnfBuilder, SatOutcome};
    use crate::config::JustifyStrategy;
    use crate::fault::FaultModel;
    use crate::gate::GateType;
    use crate::gate_encoder::GateEncoder;
    use crate::network::NetworkBuilder;

    #[test]
    fn and_output_one_requires_all_inputs_one() {
        let mut b = NetworkBuilder::new();
        let a = b.add_primary_input();
        let c = b.add_primary_input();
        let g = b.add_logic(GateType::And, vec![a, c]);
        b.add_primary_output(g);
        let net = b.build().unwrap();
        let mut cnf = CnfBuilder::new();
        let cone = Cone::build(&net, &mut cnf, &[g], &[], FaultModel::StuckAt);
        GateEncoder::encode(
            &mut cnf,
            GateType::And,
            &[cone.vars.gvar(a).pos(), cone.vars.gvar(c).pos()],
            cone.vars.gvar(g).pos(),
        );
        cnf.add_clause(&[cone.vars.gvar(g).pos()]);
        let model = match cnf.solve_with_assumptions(&[], None) {
            SatOutcome::Sat(m) => m,
            _ => panic!("expected SAT"),
        };
        let justifier = Justifier::new(&net, &cone, &model, false, JustifyStrategy::SinglePath);
        let assigns = justifier.run(&[NodeAssign { node: g, time: 1, value: true }]);
        assert_eq!(assigns.len(), 2);
        assert!(assigns.iter().all(|a| a.value));
    }
}
