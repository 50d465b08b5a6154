use std::collections::{HashMap, HashSet};

use crate::cnf::Model;
use crate::cone_builder::Cone;
use crate::justifier::{NodeAssign, NodeValList};
use crate::network::{NetworkModel, NodeId};
use crate::val3::Val3;

/// A sum-of-products sufficient condition over side-input (non-fault-cone)
/// node values, built by `Extractor::extract_all`. `And`/`Or` children are
/// never empty; an empty extraction collapses to `True`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    True,
    Lit(NodeId, bool),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// Derives the sufficient conditions, over nodes outside the fault cone,
/// under which a sensitized value at the fault cone's boundary propagates
/// to an observable point.
pub struct Extractor<'a> {
    net: &'a NetworkModel,
    cone: &'a Cone,
    model: &'a Model,
    in_cone: HashSet<NodeId>,
    memo: std::cell::RefCell<HashMap<(NodeId, bool), Expr>>,
}

impl<'a> Extractor<'a> {
    pub fn new(net: &'a NetworkModel, cone: &'a Cone, model: &'a Model) -> Self {
        let in_cone = cone.tfo.iter().copied().collect();
        Extractor {
            net,
            cone,
            model,
            in_cone,
            memo: std::cell::RefCell::new(HashMap::new()),
        }
    }

    fn gval(&self, node: NodeId) -> Val3 {
        self.model.lit_value(self.cone.vars.gvar(node).pos())
    }

    fn fval(&self, node: NodeId) -> Val3 {
        self.model.lit_value(self.cone.vars.fvar(node).pos())
    }

    fn sensitized(&self, node: NodeId) -> bool {
        self.in_cone.contains(&node) && self.gval(node) != self.fval(node)
    }

    /// Every sensitized observation point in the fault cone.
    fn sensitized_outputs(&self) -> Vec<NodeId> {
        self.cone
            .tfo
            .iter()
            .copied()
            .filter(|&n| self.net.node(n).is_observation_point() && self.sensitized(n))
            .collect()
    }

    pub fn extract_all(&self) -> Expr {
        let outputs = self.sensitized_outputs();
        let terms: Vec<Expr> = outputs
            .into_iter()
            .map(|o| self.record_sensitized_node(o))
            .collect();
        simplify_or(terms)
    }

    fn side_input_lit(&self, node: NodeId) -> Expr {
        match self.gval(node).as_bool() {
            Some(b) => Expr::Lit(node, b),
            None => Expr::True,
        }
    }

    fn record_sensitized_node(&self, node: NodeId) -> Expr {
        if let Some(e) = self.memo.borrow().get(&(node, true)) {
            return e.clone();
        }
        let fanins = self.net.node(node).fanins.clone();
        let parts: Vec<Expr> = fanins
            .into_iter()
            .map(|fi| {
                if self.in_cone.contains(&fi) {
                    if self.sensitized(fi) {
                        self.record_sensitized_node(fi)
                    } else {
                        self.record_masking_node(fi)
                    }
                } else {
                    self.side_input_lit(fi)
                }
            })
            .collect();
        let result = simplify_and(parts);
        self.memo.borrow_mut().insert((node, true), result.clone());
        result
    }

    fn record_masking_node(&self, node: NodeId) -> Expr {
        if let Some(e) = self.memo.borrow().get(&(node, false)) {
            return e.clone();
        }
        let gate = self.net.node(node).gate_type();
        let fanins = self.net.node(node).fanins.clone();
        let result = if let Some(cval) = gate.cval() {
            let masking: Vec<Expr> = fanins
                .iter()
                .filter(|&&fi| self.value_of(fi) == cval)
                .map(|&fi| {
                    if self.in_cone.contains(&fi) {
                        self.record_masking_node(fi)
                    } else {
                        self.side_input_lit(fi)
                    }
                })
                .collect();
            if !masking.is_empty() {
                simplify_or(masking)
            } else {
                self.record_all_fanins(&fanins)
            }
        } else {
            self.record_all_fanins(&fanins)
        };
        self.memo.borrow_mut().insert((node, false), result.clone());
        result
    }

    fn record_all_fanins(&self, fanins: &[NodeId]) -> Expr {
        let parts: Vec<Expr> = fanins
            .iter()
            .map(|&fi| {
                if self.in_cone.contains(&fi) {
                    if self.sensitized(fi) {
                        self.record_sensitized_node(fi)
                    } else {
                        self.record_masking_node(fi)
                    }
                } else {
                    self.side_input_lit(fi)
                }
            })
            .collect();
        simplify_and(parts)
    }

    /// The value that matters for masking comparisons: the faulty value
    /// inside the cone (a differing input could still mask if its faulty
    /// value, not its good value, carries the controlling value) and the
    /// good value outside it.
    fn value_of(&self, node: NodeId) -> Val3 {
        if self.in_cone.contains(&node) {
            self.fval(node)
        } else {
            self.gval(node)
        }
    }

    /// A single sufficient assignment (first masking candidate at every
    /// choice point), merged with `base` and returned as a plain
    /// `NodeValList` the way `DtpgEngine::solve`'s freestanding `extract()`
    /// call does before handing off to the `Justifier`.
    pub fn extract_single(&self, base: &mut NodeValList) {
        for o in self.sensitized_outputs() {
            self.extract_single_node(o, true, base);
        }
    }

    fn extract_single_node(&self, node: NodeId, sensitized: bool, out: &mut NodeValList) {
        if !self.in_cone.contains(&node) {
            if let Some(v) = self.gval(node).as_bool() {
                out.push(NodeAssign { node, time: 1, value: v });
            }
            return;
        }
        if sensitized {
            for fi in self.net.node(node).fanins.clone() {
                let fi_sensitized = self.sensitized(fi);
                self.extract_single_node(fi, fi_sensitized, out);
            }
            return;
        }
        let gate = self.net.node(node).gate_type();
        let fanins = self.net.node(node).fanins.clone();
        if let Some(cval) = gate.cval() {
            if let Some(&masker) = fanins.iter().find(|&&fi| self.value_of(fi) == cval) {
                self.extract_single_node(masker, self.sensitized(masker), out);
                return;
            }
        }
        for fi in fanins {
            let fi_sensitized = self.sensitized(fi);
            self.extract_single_node(fi, fi_sensitized, out);
        }
    }
}

fn simplify_and(mut parts: Vec<Expr>) -> Expr {
    parts.retain(|e| *e != Expr::True);
    match parts.len() {
        0 => Expr::True,
        1 => parts.pop().unwrap(),
        _ => Expr::And(parts),
    }
}

fn simplify_or(mut parts: Vec<Expr>) -> Expr {
    parts.retain(|e| *e != Expr::True);
    match parts.len() {
        0 => Expr::True,
        1 => parts.pop().unwrap(),
        _ => Expr::Or(parts),
    }
}
