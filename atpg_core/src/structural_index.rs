use std::collections::HashMap;

use index_vec::IndexVec;

use crate::network::{NetworkModel, NodeId};

/// A fan-out-free region: a maximal set of nodes reachable from `root`
/// walking backward through fanins that stops at the first node with more
/// than one fanout (or a primary input / storage output leaf). Every node
/// belongs to exactly one FFR.
#[derive(Debug, Clone)]
pub struct Ffr {
    pub root: NodeId,
    pub members: Vec<NodeId>,
}

/// Structural facts about a network computed once and shared across every
/// `DtpgEngine` instance built over it: immediate dominators (toward the
/// nearest observation point), the FFR partition, and per-node lookup of
/// which FFR a node belongs to.
pub struct StructuralIndex {
    /// `None` means the node is dominated directly by the (virtual) set of
    /// observation points, i.e. no single real node dominates it.
    idom: IndexVec<NodeId, Option<NodeId>>,
    ffrs: Vec<Ffr>,
    node_to_ffr: HashMap<NodeId, usize>,
}

impl StructuralIndex {
    pub fn build(net: &NetworkModel) -> Self {
        let order = sinks_first_order(net);
        let idom = compute_immediate_dominators(net, &order);
        let ffrs = compute_ffrs(net);
        let mut node_to_ffr = HashMap::new();
        for (i, ffr) in ffrs.iter().enumerate() {
            for &m in &ffr.members {
                node_to_ffr.insert(m, i);
            }
        }
        StructuralIndex {
            idom,
            ffrs,
            node_to_ffr,
        }
    }

    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom[node]
    }

    pub fn ffrs(&self) -> &[Ffr] {
        &self.ffrs
    }

    pub fn ffr_of(&self, node: NodeId) -> &Ffr {
        &self.ffrs[self.node_to_ffr[&node]]
    }

    pub fn ffr_root_of(&self, node: NodeId) -> NodeId {
        self.ffr_of(node).root
    }

    /// True when every path from `node` to an observation point passes
    /// through `root`: `node`'s FFR root is dominated by `root`.
    pub fn dominated_by(&self, node: NodeId, root: NodeId) -> bool {
        let mut cur = Some(self.ffr_root_of(node));
        while let Some(c) = cur {
            if c == root {
                return true;
            }
            cur = self.idom[c];
        }
        false
    }

    /// The maximal fan-out-free cone rooted at `root`: every FFR root whose
    /// dominance chain passes through `root`, including `root`'s own FFR.
    pub fn mffc_members(&self, root: NodeId) -> Vec<NodeId> {
        self.ffrs
            .iter()
            .map(|f| f.root)
            .filter(|&r| self.dominated_by(r, root))
            .collect()
    }
}

/// Topological order from primary inputs to primary outputs, reversed so
/// that every node's fanouts are visited before the node itself — the order
/// the dominance fixpoint below needs to converge in a single pass.
fn sinks_first_order(net: &NetworkModel) -> Vec<NodeId> {
    let mut indeg: IndexVec<NodeId, usize> =
        net.nodes().iter().map(|n| n.fanin_count()).collect();
    let mut queue: Vec<NodeId> = indeg
        .iter_enumerated()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| id)
        .collect();
    let mut order = Vec::with_capacity(net.num_nodes());
    let mut head = 0;
    while head < queue.len() {
        let n = queue[head];
        head += 1;
        order.push(n);
        for &fo in &net.node(n).fanouts {
            indeg[fo] -= 1;
            if indeg[fo] == 0 {
                queue.push(fo);
            }
        }
    }
    order.reverse();
    order
}

fn compute_immediate_dominators(
    net: &NetworkModel,
    sinks_first: &[NodeId],
) -> IndexVec<NodeId, Option<NodeId>> {
    let mut order_index: IndexVec<NodeId, usize> =
        index_vec::index_vec![0; net.num_nodes()];
    for (i, &n) in sinks_first.iter().enumerate() {
        order_index[n] = i;
    }
    let rank = |idom: Option<NodeId>| -> i64 {
        match idom {
            None => -1,
            Some(n) => order_index[n] as i64,
        }
    };
    let mut idom: IndexVec<NodeId, Option<NodeId>> =
        index_vec::index_vec![None; net.num_nodes()];

    for &n in sinks_first {
        let node = net.node(n);
        if node.is_observation_point() || node.fanouts.is_empty() {
            idom[n] = None;
            continue;
        }
        let mut new_idom: Option<NodeId> = None;
        let mut first = true;
        for &succ in &node.fanouts {
            if first {
                new_idom = Some(succ);
                first = false;
                continue;
            }
            new_idom = intersect(new_idom, Some(succ), &idom, rank);
        }
        idom[n] = new_idom;
    }
    idom
}

fn intersect(
    mut a: Option<NodeId>,
    mut b: Option<NodeId>,
    idom: &IndexVec<NodeId, Option<NodeId>>,
    rank: impl Fn(Option<NodeId>) -> i64,
) -> Option<NodeId> {
    while a != b {
        while rank(a) > rank(b) {
            a = idom[a.unwrap()];
        }
        while rank(b) > rank(a) {
            b = idom[b.unwrap()];
        }
    }
    a
}

fn compute_ffrs(net: &NetworkModel) -> Vec<Ffr> {
    let roots: Vec<NodeId> = net
        .nodes()
        .iter_enumerated()
        .filter(|(_, n)| n.fanout_count() != 1)
        .map(|(id, _)| id)
        .collect();

    roots
        .into_iter()
        .map(|root| {
            let mut members = vec![root];
            let mut stack = net.node(root).fanins.clone();
            while let Some(n) = stack.pop() {
                if net.node(n).fanout_count() == 1 {
                    members.push(n);
                    stack.extend(net.node(n).fanins.clone());
                }
            }
            Ffr { root, members }
        })
        .collect()
}
