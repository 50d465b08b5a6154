use index_vec::{define_index_type, IndexVec};

use crate::gate::GateType;
use crate::network::{NetworkModel, NodeId};
use crate::val3::Val3;

define_index_type! {
    pub struct FaultId = u32;
}

/// Where a stuck-at condition is injected relative to a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultSite {
    /// The gate's own output.
    Stem(NodeId),
    /// One specific input pin of the gate at `node`.
    Branch { node: NodeId, pin: usize },
}

impl FaultSite {
    pub fn node(self) -> NodeId {
        match self {
            FaultSite::Stem(n) => n,
            FaultSite::Branch { node, .. } => node,
        }
    }
}

/// Timing behavior of the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultModel {
    StuckAt,
    /// Two-time-frame transition-delay fault: the site must be driven to the
    /// opposite value at time 0 (launch) before the stuck value fails to
    /// appear at time 1 (capture).
    TransitionDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fault {
    pub id: FaultId,
    pub site: FaultSite,
    pub stuck_at: Val3,
    pub model: FaultModel,
    /// The representative fault of this fault's equivalence class; equals
    /// `id` for representatives themselves.
    pub representative: FaultId,
}

impl Fault {
    pub fn is_representative(&self) -> bool {
        self.representative == self.id
    }
}

/// The collapsed set of faults over a network: every stem and branch
/// stuck-at-0/1 site, grouped into structural equivalence classes with one
/// representative per class.
pub struct FaultSet {
    faults: IndexVec<FaultId, Fault>,
}

impl FaultSet {
    /// Enumerates every stuck-at-0/1 fault at every stem and branch in the
    /// network, then collapses structurally equivalent faults into classes.
    pub fn collapsed_stuck_at(net: &NetworkModel) -> Self {
        let mut faults = IndexVec::new();
        for (id, node) in net.nodes().iter_enumerated() {
            if node.is_primary_output() || node.is_storage_input() {
                continue;
            }
            faults.push(Fault {
                id: FaultId::from_raw(0),
                site: FaultSite::Stem(id),
                stuck_at: Val3::V0,
                model: FaultModel::StuckAt,
                representative: FaultId::from_raw(0),
            });
            faults.push(Fault {
                id: FaultId::from_raw(0),
                site: FaultSite::Stem(id),
                stuck_at: Val3::V1,
                model: FaultModel::StuckAt,
                representative: FaultId::from_raw(0),
            });
            for pin in 0..node.fanin_count() {
                for sv in [Val3::V0, Val3::V1] {
                    faults.push(Fault {
                        id: FaultId::from_raw(0),
                        site: FaultSite::Branch { node: id, pin },
                        stuck_at: sv,
                        model: FaultModel::StuckAt,
                        representative: FaultId::from_raw(0),
                    });
                }
            }
        }
        for (id, f) in faults.iter_mut_enumerated() {
            f.id = id;
            f.representative = id;
        }
        let mut set = FaultSet { faults };
        set.collapse(net);
        set
    }

    pub fn faults(&self) -> &IndexVec<FaultId, Fault> {
        &self.faults
    }

    pub fn get(&self, id: FaultId) -> &Fault {
        &self.faults[id]
    }

    pub fn representatives(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter().filter(|f| f.is_representative())
    }

    /// Structural fault collapsing: a stem fault is equivalent to a branch
    /// fault on an unfanned-out (single-fanout) gate's output, and to the
    /// branch faults that alone force the gate's controlling output value
    /// (every And/Nand input stuck-at-0 collapses onto the output stuck at
    /// the gate's controlling output; symmetric for Or/Nor on stuck-at-1;
    /// Not/Buff forward or invert the single input's fault one-for-one).
    fn collapse(&mut self, net: &NetworkModel) {
        use std::collections::HashMap;
        let mut index: HashMap<(NodeId, Val3), Vec<FaultId>> = HashMap::new();
        for f in self.faults.iter() {
            index.entry((f.site.node(), f.stuck_at)).or_default().push(f.id);
        }

        for (id, node) in net.nodes().iter_enumerated() {
            if node.is_primary_output() || node.is_storage_input() {
                continue;
            }
            let gate = node.gate_type();
            fn stem_fault(
                faults: &IndexVec<FaultId, Fault>,
                index: &std::collections::HashMap<(NodeId, Val3), Vec<FaultId>>,
                id: NodeId,
                sv: Val3,
            ) -> Option<FaultId> {
                index
                    .get(&(id, sv))
                    .and_then(|ids| ids.iter().copied().find(|fid| {
                        matches!(faults[*fid].site, FaultSite::Stem(_))
                    }))
            }
            match gate {
                GateType::Buff | GateType::Not if node.fanin_count() == 1 => {
                    let inv = gate.is_inverting();
                    for sv in [Val3::V0, Val3::V1] {
                        let branch_val = if inv { !sv } else { sv };
                        if let (Some(stem), Some(branch_ids)) =
                            (stem_fault(&self.faults, &index, id, sv), index.get(&(id, branch_val)))
                        {
                            for &bid in branch_ids {
                                if matches!(self.faults[bid].site, FaultSite::Branch { .. }) {
                                    self.union(stem, bid);
                                }
                            }
                        }
                    }
                }
                GateType::And | GateType::Nand | GateType::Or | GateType::Nor => {
                    let cval = gate.cval().unwrap();
                    let cout = gate.cval_output().unwrap();
                    if let Some(stem) = stem_fault(&self.faults, &index, id, cout) {
                        for pin in 0..node.fanin_count() {
                            if let Some(branch_ids) =
                                index.get(&(id, cval)).cloned()
                            {
                                for bid in branch_ids {
                                    if self.faults[bid].site
                                        == (FaultSite::Branch { node: id, pin })
                                    {
                                        self.union(stem, bid);
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn union(&mut self, a: FaultId, b: FaultId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.faults[drop].representative = keep;
    }

    fn find(&self, id: FaultId) -> FaultId {
        let mut cur = id;
        while self.faults[cur].representative != cur {
            cur = self.faults[cur].representative;
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;

    fn and2_network() -> NetworkModel {
        let mut b = NetworkBuilder::new();
        let a = b.add_primary_input();
        let c = b.add_primary_input();
        let g = b.add_logic(GateType::And, vec![a, c]);
        b.add_primary_output(g);
        b.build().unwrap()
    }

    #[test]
    fn and_gate_input_sa0_collapses_onto_output_sa0() {
        let net = and2_network();
        let set = FaultSet::collapsed_stuck_at(&net);
        let gate_id = net
            .nodes()
            .iter_enumerated()
            .find(|(_, n)| matches!(n.kind, crate::network::NodeKind::Logic(GateType::And)))
            .unwrap()
            .0;
        let stem_sa0 = set
            .faults()
            .iter()
            .find(|f| f.site == FaultSite::Stem(gate_id) && f.stuck_at == Val3::V0)
            .unwrap();
        let branch_sa0 = set
            .faults()
            .iter()
            .find(|f| {
                f.site == (FaultSite::Branch { node: gate_id, pin: 0 }) && f.stuck_at == Val3::V0
            })
            .unwrap();
        assert_eq!(stem_sa0.representative, branch_sa0.representative);
    }

    #[test]
    fn full_fault_count_before_collapsing_is_two_per_site() {
        let net = and2_network();
        let set = FaultSet::collapsed_stuck_at(&net);
        // 2 PIs (stem only) + 1 AND gate (stem + 2 branches) = 3 sites * 2
        assert_eq!(set.faults().len(), 6);
    }
}
