use crate::cnf::{CnfBuilder, SatOutcome};
use crate::config::{Config, ScopeMode};
use crate::dchain::DChain;
use crate::error::{AtpgError, Result};
use crate::extractor::Extractor;
use crate::fault::{Fault, FaultModel, FaultSite};
use crate::ffr_activation;
use crate::gate_encoder::{FaultyGateEncoder, GateEncoder};
use crate::justifier::{Justifier, NodeAssign, NodeValList};
use crate::mffc_encoding::MffcControls;
use crate::network::{NetworkModel, NodeId};
use crate::stats::DtpgStats;
use crate::structural_index::StructuralIndex;

#[derive(Debug, Clone)]
pub enum DtpgResult {
    Detected(NodeValList),
    Untestable,
    /// The conflict budget was exhausted before a verdict was reached.
    Aborted,
}

/// Drives CNF construction and solving for one structural scope (a single
/// node, an FFR, or an MFFC) across however many faults are scoped to it.
pub struct DtpgEngine<'a> {
    net: &'a NetworkModel,
    structural: &'a StructuralIndex,
    config: Config,
    scope_roots: Vec<NodeId>,
}

impl<'a> DtpgEngine<'a> {
    pub fn for_node(net: &'a NetworkModel, structural: &'a StructuralIndex, node: NodeId, config: Config) -> Self {
        DtpgEngine {
            net,
            structural,
            config: Config { scope: ScopeMode::SingleNode, ..config },
            scope_roots: vec![node],
        }
    }

    pub fn for_ffr(net: &'a NetworkModel, structural: &'a StructuralIndex, ffr_root: NodeId, config: Config) -> Self {
        DtpgEngine {
            net,
            structural,
            config: Config { scope: ScopeMode::Ffr, ..config },
            scope_roots: vec![ffr_root],
        }
    }

    pub fn for_mffc(net: &'a NetworkModel, structural: &'a StructuralIndex, mffc_root: NodeId, config: Config) -> Self {
        let members = structural.mffc_members(mffc_root);
        DtpgEngine {
            net,
            structural,
            config: Config { scope: ScopeMode::Mffc, ..config },
            scope_roots: members,
        }
    }

    fn ffr_root_for(&self, fault: &Fault) -> Result<NodeId> {
        let natural_root = match self.config.scope {
            ScopeMode::SingleNode => fault.site.node(),
            _ => self.structural.ffr_root_of(fault.site.node()),
        };
        if self.scope_roots.contains(&natural_root) {
            Ok(natural_root)
        } else {
            log::debug!(
                "fault {:?} at {:?} falls outside this engine's scope ({:?})",
                fault.id, fault.site, self.scope_roots
            );
            Err(AtpgError::FaultOutOfScope(fault.id))
        }
    }

    /// The fanin-side members of every scope root's own FFR, excluding the
    /// roots themselves: a fault can sit anywhere along that single-fanout
    /// chain, so every one of these nodes needs its own faulty-circuit/
    /// divergence variables rather than just a good-circuit one. Not
    /// applicable in single-node mode, which scopes to exactly one gate.
    fn ffr_interior_members(&self) -> Vec<NodeId> {
        if matches!(self.config.scope, ScopeMode::SingleNode) {
            return Vec::new();
        }
        self.scope_roots
            .iter()
            .flat_map(|&root| self.structural.ffr_of(root).members.iter().copied())
            .filter(|&n| !self.scope_roots.contains(&n))
            .collect()
    }

    pub fn solve(&self, fault: &Fault) -> Result<(DtpgResult, DtpgStats)> {
        let ffr_root = self.ffr_root_for(fault)?;
        let mut cnf = CnfBuilder::new();
        let ffr_interior = self.ffr_interior_members();
        let cone = crate::cone_builder::Cone::build(
            self.net,
            &mut cnf,
            &self.scope_roots,
            &ffr_interior,
            fault.model,
        );

        self.encode_good_circuit(&mut cnf, &cone);
        let mffc_controls = self.encode_faulty_circuit(&mut cnf, &cone, fault);
        DChain::encode(&mut cnf, self.net, self.structural, &cone);
        DChain::encode_detection_axiom(&mut cnf, self.net, &cone, ffr_root);

        let mut assumptions = ffr_activation::build_assumptions(self.net, &cone, ffr_root, fault);
        if let Some(controls) = &mffc_controls {
            assumptions.extend(controls.assumptions());
        }

        let mut stats = DtpgStats::default();
        stats.sat_calls += 1;
        let outcome = cnf.solve_with_assumptions(&assumptions, self.config.conflict_limit);
        let result = match outcome {
            SatOutcome::Unsat => {
                stats.untestable += 1;
                DtpgResult::Untestable
            }
            SatOutcome::Unknown => {
                log::warn!("fault {:?} aborted: conflict limit reached", fault.id);
                stats.aborted += 1;
                DtpgResult::Aborted
            }
            SatOutcome::Sat(model) => {
                let extractor = Extractor::new(self.net, &cone, &model);
                let mut targets: NodeValList = Vec::new();
                extractor.extract_single(&mut targets);

                let origin = match fault.site {
                    FaultSite::Stem(node) => node,
                    FaultSite::Branch { node, pin } => self.net.node(node).fanins[pin],
                };
                let activate_val = !fault.stuck_at.as_bool().expect("stuck-at value is 0 or 1");
                targets.push(NodeAssign { node: origin, time: 1, value: activate_val });
                if fault.model == FaultModel::TransitionDelay {
                    targets.push(NodeAssign { node: origin, time: 0, value: !activate_val });
                }

                let justifier = Justifier::new(
                    self.net,
                    &cone,
                    &model,
                    fault.model == FaultModel::TransitionDelay,
                    self.config.justify,
                );
                let pattern = justifier.run(&targets);
                stats.detected += 1;
                DtpgResult::Detected(pattern)
            }
        };
        Ok((result, stats))
    }

    fn encode_good_circuit(&self, cnf: &mut CnfBuilder, cone: &crate::cone_builder::Cone) {
        for &n in cone.tfi2.iter() {
            self.encode_gate(cnf, cone, n, true);
        }
        for &n in cone.tfi.iter().chain(cone.tfo.iter()) {
            self.encode_gate(cnf, cone, n, false);
        }
        // A storage output's capture-frame good value equals its paired
        // input's launch-frame good value: the flip-flop just copies D to Q
        // across the clock edge. Only relevant (and only possible to state)
        // in transition-delay mode, where both variables actually exist.
        // `se.input` itself sits outside `cone.tfi`/`cone.tfi2` (those only
        // cover the driver's ancestors), so its own D-equals-driver relation
        // at the launch frame is encoded here rather than in the loops above.
        for se in self.net.storage_elements() {
            if let (Some(h), true) = (cone.vars.hvar(se.input), cone.vars.has_gvar(se.output)) {
                self.encode_gate(cnf, cone, se.input, true);
                let q = cone.vars.gvar(se.output).pos();
                cnf.add_clause(&[!h.pos(), q]);
                cnf.add_clause(&[h.pos(), !q]);
            }
        }
    }

    fn encode_gate(&self, cnf: &mut CnfBuilder, cone: &crate::cone_builder::Cone, node: NodeId, launch_frame: bool) {
        let n = self.net.node(node);
        if n.is_primary_input() || n.is_storage_output() {
            return;
        }
        let inputs: Vec<_> = n
            .fanins
            .iter()
            .map(|&fi| {
                if launch_frame {
                    cone.vars.hvar(fi).unwrap_or_else(|| cone.vars.gvar(fi)).pos()
                } else {
                    cone.vars.gvar(fi).pos()
                }
            })
            .collect();
        let output = if launch_frame {
            cone.vars.hvar(node).unwrap_or_else(|| cone.vars.gvar(node)).pos()
        } else {
            cone.vars.gvar(node).pos()
        };
        GateEncoder::encode(cnf, n.gate_type(), &inputs, output);
    }

    /// Propagates the faulty-circuit relation across a TFO gate that is
    /// neither the fault's own injection point (where `FaultyGateEncoder`
    /// takes over) nor another MFFC member root (where `MffcControls`'s `g'`
    /// relation takes over, computed the same way but gated behind a
    /// control variable).
    fn encode_faulty_node(&self, cnf: &mut CnfBuilder, cone: &crate::cone_builder::Cone, n: NodeId) {
        let node = self.net.node(n);
        if node.is_primary_input() || node.is_storage_output() {
            return;
        }
        let inputs: Vec<_> = node.fanins.iter().map(|&fi| cone.vars.fvar(fi).pos()).collect();
        GateEncoder::encode(cnf, node.gate_type(), &inputs, cone.vars.fvar(n).pos());
    }

    fn encode_faulty_circuit(
        &self,
        cnf: &mut CnfBuilder,
        cone: &crate::cone_builder::Cone,
        fault: &Fault,
    ) -> Option<MffcControls> {
        let fault_node = fault.site.node();
        let controls = match self.config.scope {
            ScopeMode::Mffc => Some(MffcControls::build(cnf, self.net, cone, &self.scope_roots, fault_node)),
            ScopeMode::Ffr | ScopeMode::SingleNode => None,
        };
        for &n in &cone.tfo {
            if n == fault_node || (controls.is_some() && self.scope_roots.contains(&n)) {
                continue;
            }
            self.encode_faulty_node(cnf, cone, n);
        }
        self.inject_fault_at_site(cnf, cone, fault);
        controls
    }

    /// Emits the fault's own faulty-circuit relation directly at its site —
    /// a unit clause for a stem fault, a fixed input pin plus the gate's
    /// usual relation over the remaining inputs for a branch fault. The same
    /// injection regardless of structural scope: an MFFC's per-root control
    /// XOR only covers *other* member roots, never the fault's own site.
    fn inject_fault_at_site(&self, cnf: &mut CnfBuilder, cone: &crate::cone_builder::Cone, fault: &Fault) {
        match fault.site {
            FaultSite::Stem(node) => {
                FaultyGateEncoder::encode_stem_fault(cnf, cone.vars.fvar(node).pos(), fault.stuck_at)
            }
            FaultSite::Branch { node, pin } => {
                let inputs: Vec<_> =
                    self.net.node(node).fanins.iter().map(|&fi| cone.vars.fvar(fi).pos()).collect();
                FaultyGateEncoder::encode_branch_fault(
                    cnf,
                    self.net.node(node).gate_type(),
                    &inputs,
                    pin,
                    fault.stuck_at,
                    cone.vars.fvar(node).pos(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultId, FaultModel, FaultSet, FaultSite};
    use crate::gate::GateType;
    use crate::network::NetworkBuilder;
    use crate::val3::Val3;

    fn and2_network() -> NetworkModel {
        let mut b = NetworkBuilder::new();
        let a = b.add_primary_input();
        let c = b.add_primary_input();
        let g = b.add_logic(GateType::And, vec![a, c]);
        b.add_primary_output(g);
        b.build().unwrap()
    }

    #[test]
    fn stem_stuck_at_one_is_detected() {
        let net = and2_network();
        let structural = StructuralIndex::build(&net);
        let g = net
            .nodes()
            .iter_enumerated()
            .find(|(_, n)| matches!(n.kind, crate::network::NodeKind::Logic(GateType::And)))
            .unwrap()
            .0;
        let fault = Fault {
            id: FaultId::from_raw(0),
            site: FaultSite::Stem(g),
            stuck_at: Val3::V1,
            model: FaultModel::StuckAt,
            representative: FaultId::from_raw(0),
        };
        let engine = DtpgEngine::for_ffr(&net, &structural, g, Config::default());
        let (result, stats) = engine.solve(&fault).unwrap();
        assert!(matches!(result, DtpgResult::Detected(_)));
        assert_eq!(stats.detected, 1);
    }

    #[test]
    fn fault_outside_scope_is_rejected() {
        let net = and2_network();
        let structural = StructuralIndex::build(&net);
        let a = net.primary_inputs()[0];
        let g = net
            .nodes()
            .iter_enumerated()
            .find(|(_, n)| matches!(n.kind, crate::network::NodeKind::Logic(GateType::And)))
            .unwrap()
            .0;
        let fault = Fault {
            id: FaultId::from_raw(0),
            site: FaultSite::Stem(a),
            stuck_at: Val3::V1,
            model: FaultModel::StuckAt,
            representative: FaultId::from_raw(0),
        };
        // `a`'s FFR root is `a` itself (fanout 1 into g), not `g`.
        let engine = DtpgEngine::for_ffr(&net, &structural, g, Config::default());
        assert!(engine.solve(&fault).is_err());
        let _ = FaultSet::collapsed_stuck_at(&net);
    }
}
