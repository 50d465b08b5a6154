use std::collections::{HashMap, HashSet};

use crate::cnf::{CnfBuilder, Var};
use crate::fault::FaultModel;
use crate::network::{NetworkModel, NodeId};

/// Per-node SAT variables allocated over a cone. `g1`/`f1` hold the good-
/// and faulty-circuit values of the capture time frame; `d` marks
/// divergence between them (TFO nodes only); `g0` holds the good-circuit
/// value of the launch time frame, allocated only in transition-delay mode.
#[derive(Default)]
pub struct ConeVars {
    g1: HashMap<NodeId, Var>,
    f1: HashMap<NodeId, Var>,
    d: HashMap<NodeId, Var>,
    g0: HashMap<NodeId, Var>,
}

impl ConeVars {
    pub fn gvar(&self, node: NodeId) -> Var {
        self.g1[&node]
    }

    /// The faulty-circuit variable for `node`, aliasing the good-circuit
    /// variable when `node` lies outside the TFO: nodes that can't see the
    /// fault's effect never need a separate f-variable.
    pub fn fvar(&self, node: NodeId) -> Var {
        *self.f1.get(&node).unwrap_or(&self.g1[&node])
    }

    pub fn dvar(&self, node: NodeId) -> Option<Var> {
        self.d.get(&node).copied()
    }

    pub fn hvar(&self, node: NodeId) -> Option<Var> {
        self.g0.get(&node).copied()
    }

    pub fn has_fvar(&self, node: NodeId) -> bool {
        self.f1.contains_key(&node)
    }

    pub fn has_gvar(&self, node: NodeId) -> bool {
        self.g1.contains_key(&node)
    }
}

/// The TFO/TFI(/PrevTFI) structural closure around a fault site, plus the
/// SAT variables allocated over it. Built once per `DtpgEngine::solve`-scope
/// (single node, FFR, or MFFC).
pub struct Cone {
    pub tfo: Vec<NodeId>,
    pub tfi: Vec<NodeId>,
    pub tfi2: Vec<NodeId>,
    pub vars: ConeVars,
}

impl Cone {
    /// `roots` are the FFR roots (or the single node) the cone is built
    /// around; its TFO is their shared transitive fanout up to the nearest
    /// observation points. `ffr_interior` is the set of FFR-interior nodes
    /// (fanin-side members of `roots`' own FFRs, excluding the roots
    /// themselves) that also need faulty-circuit/divergence variables: a
    /// fault can sit anywhere along that single-fanout chain, not only at
    /// its root.
    pub fn build(
        net: &NetworkModel,
        cnf: &mut CnfBuilder,
        roots: &[NodeId],
        ffr_interior: &[NodeId],
        model: FaultModel,
    ) -> Self {
        let mut tfo = transitive_fanout(net, roots);
        tfo.extend(ffr_interior.iter().copied());
        let tfo_set: HashSet<NodeId> = tfo.iter().copied().collect();
        let tfi = transitive_fanin(net, &tfo, &tfo_set);
        let tfi_set: HashSet<NodeId> = tfi.iter().copied().collect();

        let mut vars = ConeVars::default();
        for &n in tfo.iter().chain(tfi.iter()) {
            vars.g1.insert(n, cnf.new_var());
        }
        for &n in &tfo {
            vars.f1.insert(n, cnf.new_var());
            vars.d.insert(n, cnf.new_var());
        }

        let tfi2 = if model == FaultModel::TransitionDelay {
            let storage_outputs: Vec<NodeId> = tfo
                .iter()
                .chain(tfi.iter())
                .copied()
                .filter(|&n| net.node(n).is_storage_output())
                .collect();
            let paired_inputs: Vec<NodeId> = storage_outputs
                .iter()
                .filter_map(|&n| net.paired_storage_node(n))
                .collect();
            let tfi2 = transitive_fanin(net, &paired_inputs, &tfi_set);
            for &n in paired_inputs.iter().chain(tfi2.iter()) {
                vars.g0.entry(n).or_insert_with(|| cnf.new_var());
            }
            tfi2
        } else {
            Vec::new()
        };

        Cone { tfo, tfi, tfi2, vars }
    }
}

fn transitive_fanout(net: &NetworkModel, roots: &[NodeId]) -> Vec<NodeId> {
    let mut seen: HashSet<NodeId> = roots.iter().copied().collect();
    let mut order = roots.to_vec();
    let mut i = 0;
    while i < order.len() {
        let n = order[i];
        i += 1;
        if net.node(n).is_observation_point() {
            continue;
        }
        for &fo in &net.node(n).fanouts {
            if seen.insert(fo) {
                order.push(fo);
            }
        }
    }
    order
}

fn transitive_fanin(net: &NetworkModel, from: &[NodeId], exclude: &HashSet<NodeId>) -> Vec<NodeId> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<NodeId> = from
        .iter()
        .flat_map(|&n| net.node(n).fanins.clone())
        .collect();
    while let Some(n) = stack.pop() {
        if exclude.contains(&n) || !seen.insert(n) {
            continue;
        }
        order.push(n);
        stack.extend(net.node(n).fanins.clone());
    }
    order
}
