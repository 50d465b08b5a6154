use index_vec::{define_index_type, IndexVec};

use crate::error::{AtpgError, Result};
use crate::gate::GateType;

define_index_type! {
    /// Identifies a node within a `NetworkModel`. Stable for the lifetime of
    /// the model: nodes are never removed or renumbered after `build()`.
    pub struct NodeId = u32;
}

define_index_type! {
    pub struct StorageId = u32;
}

/// What role a node plays in the network, beyond its logic function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    PrimaryInput,
    PrimaryOutput,
    /// D input of a storage element: behaves like a primary output for
    /// propagation purposes (its good/faulty values must be observed) but is
    /// not user-visible.
    StorageInput(StorageId),
    /// Q output of a storage element: behaves like a primary input at time 1,
    /// and is paired with its `StorageInput` counterpart for the previous
    /// time frame in transition-delay analysis.
    StorageOutput(StorageId),
    /// Clock driver for a storage element: a control pin, never part of the
    /// data cone the fault/divergence machinery walks.
    StorageClock(StorageId),
    /// Asynchronous clear driver for a storage element: a control pin, never
    /// part of the data cone.
    StorageClear(StorageId),
    /// Asynchronous preset driver for a storage element: a control pin,
    /// never part of the data cone.
    StoragePreset(StorageId),
    Logic(GateType),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub fanins: Vec<NodeId>,
    pub fanouts: Vec<NodeId>,
}

impl Node {
    pub fn gate_type(&self) -> GateType {
        match self.kind {
            NodeKind::PrimaryInput | NodeKind::StorageOutput(_) => GateType::Input,
            NodeKind::PrimaryOutput
            | NodeKind::StorageInput(_)
            | NodeKind::StorageClock(_)
            | NodeKind::StorageClear(_)
            | NodeKind::StoragePreset(_) => GateType::Buff,
            NodeKind::Logic(g) => g,
        }
    }

    pub fn is_primary_output(&self) -> bool {
        matches!(self.kind, NodeKind::PrimaryOutput)
    }

    pub fn is_storage_input(&self) -> bool {
        matches!(self.kind, NodeKind::StorageInput(_))
    }

    pub fn is_storage_output(&self) -> bool {
        matches!(self.kind, NodeKind::StorageOutput(_))
    }

    /// True for nodes whose propagated value must be observed: primary
    /// outputs and storage (flip-flop) inputs.
    pub fn is_observation_point(&self) -> bool {
        self.is_primary_output() || self.is_storage_input()
    }

    pub fn is_primary_input(&self) -> bool {
        matches!(self.kind, NodeKind::PrimaryInput)
    }

    pub fn fanin_count(&self) -> usize {
        self.fanins.len()
    }

    pub fn fanout_count(&self) -> usize {
        self.fanouts.len()
    }
}

#[derive(Debug, Clone)]
pub struct StorageElement {
    pub name: String,
    pub input: NodeId,
    pub output: NodeId,
    /// Clock/clear/preset terminal nodes, each a `NodeKind::Storage{Clock,
    /// Clear,Preset}` node whose single fanin is the actual driver. Control
    /// pins, not part of the combinational data cone.
    pub clock: Option<NodeId>,
    pub clear: Option<NodeId>,
    pub preset: Option<NodeId>,
}

/// A gate-level network: primary inputs/outputs, combinational logic, and
/// storage elements (flip-flops) linking two time frames. Netlist formats
/// are out of scope; callers drive a `NetworkBuilder` node by node.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    nodes: IndexVec<NodeId, Node>,
    primary_inputs: Vec<NodeId>,
    primary_outputs: Vec<NodeId>,
    storage_elements: IndexVec<StorageId, StorageElement>,
}

impl NetworkModel {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &IndexVec<NodeId, Node> {
        &self.nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn primary_inputs(&self) -> &[NodeId] {
        &self.primary_inputs
    }

    pub fn primary_outputs(&self) -> &[NodeId] {
        &self.primary_outputs
    }

    pub fn storage_elements(&self) -> &IndexVec<StorageId, StorageElement> {
        &self.storage_elements
    }

    pub fn is_sequential(&self) -> bool {
        !self.storage_elements.is_empty()
    }

    /// The `StorageInput` paired with a `StorageOutput`, or vice versa.
    pub fn paired_storage_node(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id].kind {
            NodeKind::StorageInput(sid) => Some(self.storage_elements[sid].output),
            NodeKind::StorageOutput(sid) => Some(self.storage_elements[sid].input),
            _ => None,
        }
    }
}

/// Incremental builder for a `NetworkModel`: a loader calls the `add_*`
/// methods node by node, referencing earlier nodes by the `NodeId` they
/// returned, then calls `build()` once the whole netlist is described.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    nodes: IndexVec<NodeId, Node>,
    storage_elements: IndexVec<StorageId, StorageElement>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        NetworkBuilder::default()
    }

    pub fn add_primary_input(&mut self) -> NodeId {
        self.nodes.push(Node {
            kind: NodeKind::PrimaryInput,
            fanins: Vec::new(),
            fanouts: Vec::new(),
        })
    }

    pub fn add_primary_output(&mut self, driver: NodeId) -> NodeId {
        self.nodes.push(Node {
            kind: NodeKind::PrimaryOutput,
            fanins: vec![driver],
            fanouts: Vec::new(),
        })
    }

    pub fn add_logic(&mut self, gate: GateType, fanins: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node {
            kind: NodeKind::Logic(gate),
            fanins,
            fanouts: Vec::new(),
        })
    }

    /// Adds a storage element (flip-flop) with no modeled clock/clear/preset:
    /// `driver` feeds the D input at the current time frame, the returned
    /// Q-output id is a primary-input-like source for the next time frame.
    /// Returns `(input_id, output_id)`.
    pub fn add_storage_element(&mut self, name: impl Into<String>, driver: NodeId) -> (NodeId, NodeId) {
        self.add_storage_element_with_controls(name, driver, None, None, None)
    }

    /// Adds a storage element with optional clock/clear/preset drivers. Each
    /// `Some(driver)` gets its own terminal node (`StorageClock`/`Clear`/
    /// `Preset`) whose single fanin is `driver`, mirroring how the D input
    /// wraps its own driver — these terminals never appear as anyone's
    /// fanin in turn, so they never enter a TFO/TFI walk.
    pub fn add_storage_element_with_controls(
        &mut self,
        name: impl Into<String>,
        driver: NodeId,
        clock: Option<NodeId>,
        clear: Option<NodeId>,
        preset: Option<NodeId>,
    ) -> (NodeId, NodeId) {
        let sid = self.storage_elements.push(StorageElement {
            name: name.into(),
            input: NodeId::from_raw(0),
            output: NodeId::from_raw(0),
            clock: None,
            clear: None,
            preset: None,
        });
        let input_id = self.nodes.push(Node {
            kind: NodeKind::StorageInput(sid),
            fanins: vec![driver],
            fanouts: Vec::new(),
        });
        let output_id = self.nodes.push(Node {
            kind: NodeKind::StorageOutput(sid),
            fanins: Vec::new(),
            fanouts: Vec::new(),
        });
        let clock_id = clock.map(|d| self.push_control_terminal(NodeKind::StorageClock(sid), d));
        let clear_id = clear.map(|d| self.push_control_terminal(NodeKind::StorageClear(sid), d));
        let preset_id = preset.map(|d| self.push_control_terminal(NodeKind::StoragePreset(sid), d));
        self.storage_elements[sid].input = input_id;
        self.storage_elements[sid].output = output_id;
        self.storage_elements[sid].clock = clock_id;
        self.storage_elements[sid].clear = clear_id;
        self.storage_elements[sid].preset = preset_id;
        (input_id, output_id)
    }

    fn push_control_terminal(&mut self, kind: NodeKind, driver: NodeId) -> NodeId {
        self.nodes.push(Node {
            kind,
            fanins: vec![driver],
            fanouts: Vec::new(),
        })
    }

    pub fn build(mut self) -> Result<NetworkModel> {
        let n = self.nodes.len();
        for id in self.nodes.indices() {
            let fanins = self.nodes[id].fanins.clone();
            for fin in fanins {
                if fin.raw() as usize >= n {
                    return Err(AtpgError::MalformedNetwork(format!(
                        "node {:?} references out-of-range fanin {:?}",
                        id, fin
                    )));
                }
                self.nodes[fin].fanouts.push(id);
            }
        }

        for (id, node) in self.nodes.iter_enumerated() {
            match node.kind {
                NodeKind::PrimaryInput | NodeKind::StorageOutput(_) => {
                    if !node.fanins.is_empty() {
                        return Err(AtpgError::MalformedNetwork(format!(
                            "node {:?} is a source but has fanins",
                            id
                        )));
                    }
                }
                NodeKind::PrimaryOutput
                | NodeKind::StorageInput(_)
                | NodeKind::StorageClock(_)
                | NodeKind::StorageClear(_)
                | NodeKind::StoragePreset(_) => {
                    if node.fanins.len() != 1 {
                        return Err(AtpgError::MalformedNetwork(format!(
                            "observation node {:?} must have exactly one driver",
                            id
                        )));
                    }
                }
                NodeKind::Logic(gate) => {
                    if let Some(arity) = gate.arity_fixed() {
                        if arity > 0 && node.fanins.len() != arity {
                            return Err(AtpgError::MalformedNetwork(format!(
                                "gate {:?} expects {} fanins, got {}",
                                id,
                                arity,
                                node.fanins.len()
                            )));
                        }
                    } else if node.fanins.is_empty() {
                        return Err(AtpgError::MalformedNetwork(format!(
                            "gate {:?} has no fanins",
                            id
                        )));
                    }
                }
            }
        }

        for se in self.storage_elements.iter() {
            if se.clock.is_none() && (se.clear.is_some() || se.preset.is_some()) {
                return Err(AtpgError::MalformedNetwork(format!(
                    "storage element {:?} has a clear/preset driver but missing clock",
                    se.name
                )));
            }
        }

        let primary_inputs = self
            .nodes
            .iter_enumerated()
            .filter(|(_, n)| n.is_primary_input())
            .map(|(id, _)| id)
            .collect();
        let primary_outputs = self
            .nodes
            .iter_enumerated()
            .filter(|(_, n)| n.is_primary_output())
            .map(|(id, _)| id)
            .collect();

        Ok(NetworkModel {
            nodes: self.nodes,
            primary_inputs,
            primary_outputs,
            storage_elements: self.storage_elements,
        })
    }
}
