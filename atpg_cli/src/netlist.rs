use std::collections::HashMap;

use atpg_core::error::{AtpgError, Result};
use atpg_core::gate::GateType;
use atpg_core::network::{NetworkBuilder, NetworkModel, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// The CLI's own small interchange format for describing a gate-level
/// network: not an industry netlist format (Verilog, bench, ISCAS), just a
/// direct JSON rendering of the `NetworkBuilder` calls a loader would make,
/// referencing earlier nodes by their position in `nodes`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NetlistFile {
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
    Pi,
    Po { fanin: usize },
    Gate { gate: String, fanins: Vec<usize> },
    Ff {
        name: String,
        driver: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clock: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clear: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset: Option<usize>,
    },
}

fn parse_gate(name: &str) -> Result<GateType> {
    match name.to_ascii_lowercase().as_str() {
        "const0" => Ok(GateType::Const0),
        "const1" => Ok(GateType::Const1),
        "buff" | "buf" => Ok(GateType::Buff),
        "not" => Ok(GateType::Not),
        "and" => Ok(GateType::And),
        "nand" => Ok(GateType::Nand),
        "or" => Ok(GateType::Or),
        "nor" => Ok(GateType::Nor),
        "xor" => Ok(GateType::Xor),
        "xnor" => Ok(GateType::Xnor),
        other => Err(AtpgError::MalformedNetwork(format!("unknown gate kind {:?}", other))),
    }
}

/// Builds a `NetworkModel` from a `NetlistFile`. `Ff` nodes map their JSON
/// index to the storage element's Q output, the only part of a flip-flop
/// later nodes may legally reference as a fanin.
pub fn build_network(file: &NetlistFile) -> Result<NetworkModel> {
    let mut b = NetworkBuilder::new();
    let mut ids: HashMap<usize, NodeId> = HashMap::new();

    for (idx, spec) in file.nodes.iter().enumerate() {
        let resolve = |i: &usize| -> Result<NodeId> {
            ids.get(i)
                .copied()
                .ok_or_else(|| AtpgError::MalformedNetwork(format!("node {} references undefined node {}", idx, i)))
        };
        match spec {
            NodeSpec::Pi => {
                ids.insert(idx, b.add_primary_input());
            }
            NodeSpec::Po { fanin } => {
                let driver = resolve(fanin)?;
                ids.insert(idx, b.add_primary_output(driver));
            }
            NodeSpec::Gate { gate, fanins } => {
                let gate = parse_gate(gate)?;
                let resolved: Result<Vec<NodeId>> = fanins.iter().map(resolve).collect();
                ids.insert(idx, b.add_logic(gate, resolved?));
            }
            NodeSpec::Ff { name, driver, clock, clear, preset } => {
                let driver = resolve(driver)?;
                let clock = clock.as_ref().map(resolve).transpose()?;
                let clear = clear.as_ref().map(resolve).transpose()?;
                let preset = preset.as_ref().map(resolve).transpose()?;
                let (_input, output) =
                    b.add_storage_element_with_controls(name.clone(), driver, clock, clear, preset);
                ids.insert(idx, output);
            }
        }
    }

    b.build()
}

fn gate_name(gate: GateType) -> &'static str {
    match gate {
        GateType::Const0 => "const0",
        GateType::Const1 => "const1",
        GateType::Input => unreachable!("Input is not a real gate kind"),
        GateType::Buff => "buff",
        GateType::Not => "not",
        GateType::And => "and",
        GateType::Nand => "nand",
        GateType::Or => "or",
        GateType::Nor => "nor",
        GateType::Xor => "xor",
        GateType::Xnor => "xnor",
    }
}

/// Renders a `NetworkModel` back into this tool's JSON interchange format.
/// Storage elements fold their `StorageInput`/`StorageOutput` pair into a
/// single `Ff` entry keyed by the Q output, the only half later nodes may
/// reference.
pub fn to_netlist_file(net: &NetworkModel) -> NetlistFile {
    let mut map: HashMap<NodeId, usize> = HashMap::new();
    let mut nodes = Vec::new();

    for (id, node) in net.nodes().iter_enumerated() {
        let spec = match node.kind {
            NodeKind::PrimaryInput => NodeSpec::Pi,
            NodeKind::PrimaryOutput => NodeSpec::Po {
                fanin: map[&node.fanins[0]],
            },
            NodeKind::StorageInput(_)
            | NodeKind::StorageClock(_)
            | NodeKind::StorageClear(_)
            | NodeKind::StoragePreset(_) => continue,
            NodeKind::StorageOutput(sid) => {
                let element = &net.storage_elements()[sid];
                let driver_idx = |terminal: NodeId| map[&net.node(terminal).fanins[0]];
                NodeSpec::Ff {
                    name: element.name.clone(),
                    driver: driver_idx(element.input),
                    clock: element.clock.map(driver_idx),
                    clear: element.clear.map(driver_idx),
                    preset: element.preset.map(driver_idx),
                }
            }
            NodeKind::Logic(gate) => NodeSpec::Gate {
                gate: gate_name(gate).to_string(),
                fanins: node.fanins.iter().map(|f| map[f]).collect(),
            },
        };
        map.insert(id, nodes.len());
        nodes.push(spec);
    }

    NetlistFile { nodes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_gate_from_json() {
        let json = r#"{
            "nodes": [
                {"kind": "pi"},
                {"kind": "pi"},
                {"kind": "gate", "gate": "and", "fanins": [0, 1]},
                {"kind": "po", "fanin": 2}
            ]
        }"#;
        let file: NetlistFile = serde_json::from_str(json).unwrap();
        let net = build_network(&file).unwrap();
        assert_eq!(net.primary_inputs().len(), 2);
        assert_eq!(net.primary_outputs().len(), 1);
    }

    #[test]
    fn rejects_reference_to_undefined_node() {
        let json = r#"{"nodes": [{"kind": "po", "fanin": 5}]}"#;
        let file: NetlistFile = serde_json::from_str(json).unwrap();
        assert!(build_network(&file).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let json = r#"{
            "nodes": [
                {"kind": "pi"},
                {"kind": "pi"},
                {"kind": "gate", "gate": "nand", "fanins": [0, 1]},
                {"kind": "ff", "name": "ff0", "driver": 2},
                {"kind": "po", "fanin": 3}
            ]
        }"#;
        let file: NetlistFile = serde_json::from_str(json).unwrap();
        let net = build_network(&file).unwrap();
        let rebuilt_file = to_netlist_file(&net);
        let net2 = build_network(&rebuilt_file).unwrap();
        assert_eq!(net.num_nodes(), net2.num_nodes());
        assert_eq!(net.storage_elements().len(), net2.storage_elements().len());
    }
}
