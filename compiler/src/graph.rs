// graph.rs — Circuit graph model and construction
//
// Decodes the editor's JSON graph document (nodes, ports, argument params,
// labels) and builds the typed graph the lowering passes operate on: dense
// node indices in input order, a role per node, and labels resolved to
// (node, port) endpoints.
//
// Preconditions: none; any text may be handed to `parse_netlist`.
// Postconditions: every `PortRef` in the returned `Graph` (label targets and
//                 `element_of` back-references) points at an existing port.
// Failure modes: schema mismatch → `LowerError::Format`; dangling label or
//                array-slot reference → `LowerError::Invalid`.
// Side effects: none.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diag::{codes, Diagnostic, LowerError};
use crate::id::{NodeIdx, PortIdx, PortRef};
use crate::registry::{Registry, Role};

// ── Wire format ─────────────────────────────────────────────────────────────

/// The document posted by the editor. Map order is document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNetlist {
    pub graph: JsonGraph,
    #[serde(default)]
    pub labels: IndexMap<String, JsonLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonGraph {
    pub nodes: IndexMap<String, JsonNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNode {
    #[serde(default)]
    pub id: String,
    pub data: JsonNodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonNodeData {
    /// User-facing block name.
    pub name: String,
    /// Block class.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub super_classes: Vec<String>,
    pub ports: Vec<JsonNodePort>,
    #[serde(default)]
    pub arg_params: Vec<JsonArgParam>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonNodePort {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub array: bool,
    /// Position of the parent array port when this port is one requested slot.
    #[serde(default)]
    pub element_of: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonArgParam {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArgKind,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonLabel {
    pub label_name: String,
    pub node_id: String,
    pub port_idx: u32,
}

/// Declared kind of a block argument. Unrecognized kinds decode so that
/// they can be reported against the offending argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArgKind {
    Int,
    Float,
    Range,
    String,
    Array,
    Unknown(String),
}

impl From<String> for ArgKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "int" => ArgKind::Int,
            "float" => ArgKind::Float,
            "range" => ArgKind::Range,
            "string" => ArgKind::String,
            "array" => ArgKind::Array,
            _ => ArgKind::Unknown(s),
        }
    }
}

impl From<ArgKind> for String {
    fn from(kind: ArgKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Int => write!(f, "int"),
            ArgKind::Float => write!(f, "float"),
            ArgKind::Range => write!(f, "range"),
            ArgKind::String => write!(f, "string"),
            ArgKind::Array => write!(f, "array"),
            ArgKind::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Decode the editor document.
pub fn parse_netlist(text: &str) -> Result<JsonNetlist, LowerError> {
    Ok(serde_json::from_str(text)?)
}

// ── Typed graph ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub type_name: String,
    pub is_array: bool,
    pub element_of: Option<PortIdx>,
}

impl Port {
    /// True if this port is one requested slot of an array port.
    pub fn is_slot(&self) -> bool {
        self.element_of.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ArgParam {
    pub name: String,
    pub kind: ArgKind,
    pub default: Option<Value>,
    pub value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Editor node id.
    pub id: String,
    pub name: String,
    pub type_name: String,
    pub super_classes: Vec<String>,
    pub role: Role,
    pub ports: Vec<Port>,
    pub args: Vec<ArgParam>,
}

impl Node {
    pub fn port(&self, idx: PortIdx) -> &Port {
        &self.ports[idx.index()]
    }

    /// Position of the first port named `name`.
    pub fn find_port(&self, name: &str) -> Option<PortIdx> {
        self.ports
            .iter()
            .position(|p| p.name == name)
            .map(|i| PortIdx(i as u32))
    }
}

#[derive(Debug, Clone)]
pub struct Label {
    /// Editor label id.
    pub id: String,
    pub name: String,
    pub target: PortRef,
}

/// The circuit graph: nodes and labels, both in input order.
#[derive(Debug, Clone)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub labels: Vec<Label>,
}

impl Graph {
    /// Build the typed graph from a decoded document.
    pub fn build(netlist: &JsonNetlist, registry: &Registry) -> Result<Graph, LowerError> {
        let mut nodes = Vec::with_capacity(netlist.graph.nodes.len());
        for (key, json_node) in &netlist.graph.nodes {
            nodes.push(build_node(key, json_node, registry)?);
        }

        let mut labels = Vec::with_capacity(netlist.labels.len());
        for (label_id, json_label) in &netlist.labels {
            let node = netlist
                .graph
                .nodes
                .get_index_of(&json_label.node_id)
                .ok_or_else(|| {
                    Diagnostic::new(
                        codes::E0001,
                        [json_label.label_name.as_str()],
                        format!("label references unknown node {}", json_label.node_id),
                    )
                })?;
            if json_label.port_idx as usize >= nodes[node].ports.len() {
                return Err(Diagnostic::new(
                    codes::E0002,
                    [json_label.label_name.as_str()],
                    format!(
                        "label references port {} of {}, which has {} ports",
                        json_label.port_idx,
                        nodes[node].name,
                        nodes[node].ports.len()
                    ),
                )
                .into());
            }
            labels.push(Label {
                id: label_id.clone(),
                name: json_label.label_name.clone(),
                target: PortRef::new(NodeIdx(node as u32), PortIdx(json_label.port_idx)),
            });
        }

        Ok(Graph { nodes, labels })
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.index()]
    }

    pub fn port(&self, r: PortRef) -> &Port {
        self.node(r.node).port(r.port)
    }

    /// Iterate nodes with their indices, in input order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIdx(i as u32), n))
    }

    /// `[node name, port name]`, the diagnostic path for a port.
    pub fn port_path(&self, r: PortRef) -> Vec<String> {
        vec![self.node(r.node).name.clone(), self.port(r).name.clone()]
    }
}

fn build_node(key: &str, json: &JsonNode, registry: &Registry) -> Result<Node, LowerError> {
    let data = &json.data;
    let mut ports = Vec::with_capacity(data.ports.len());
    for (i, p) in data.ports.iter().enumerate() {
        if let Some(parent) = p.element_of {
            let parent_ok = (parent as usize) != i
                && data
                    .ports
                    .get(parent as usize)
                    .is_some_and(|pp| pp.element_of.is_none());
            if !parent_ok {
                return Err(Diagnostic::new(
                    codes::E0003,
                    [data.name.as_str(), p.name.as_str()],
                    format!("array slot refers to invalid parent port {}", parent),
                )
                .into());
            }
        }
        ports.push(Port {
            name: p.name.clone(),
            type_name: p.type_name.clone(),
            is_array: p.array,
            element_of: p.element_of.map(PortIdx),
        });
    }

    let args = data
        .arg_params
        .iter()
        .map(|a| ArgParam {
            name: a.name.clone(),
            kind: a.kind.clone(),
            default: a.default_value.clone(),
            value: a.value.clone(),
        })
        .collect();

    Ok(Node {
        id: if json.id.is_empty() {
            key.to_string()
        } else {
            json.id.clone()
        },
        name: data.name.clone(),
        type_name: data.type_name.clone(),
        super_classes: data.super_classes.clone(),
        role: registry.classify(&data.type_name, &data.super_classes),
        ports,
        args,
    })
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph ({} nodes, {} labels)",
            self.nodes.len(),
            self.labels.len()
        )?;
        for node in &self.nodes {
            let role = match node.role {
                Role::PassiveConnector => "connector".to_string(),
                Role::BusSupport(bus) => format!("{} support", bus.as_str()),
                Role::Plain => "plain".to_string(),
            };
            writeln!(f, "  node '{}': {} [{}]", node.name, node.type_name, role)?;
            for (i, port) in node.ports.iter().enumerate() {
                write!(f, "    port {} '{}': {}", i, port.name, port.type_name)?;
                if port.is_array {
                    write!(f, "[]")?;
                }
                if let Some(parent) = port.element_of {
                    write!(f, " (slot of '{}')", node.port(parent).name)?;
                }
                writeln!(f)?;
            }
            for arg in &node.args {
                writeln!(
                    f,
                    "    arg '{}': {} = {} (default {})",
                    arg.name,
                    arg.kind,
                    display_value(&arg.value),
                    display_value(&arg.default)
                )?;
            }
        }
        for label in &self.labels {
            let node = self.node(label.target.node);
            writeln!(
                f,
                "  label '{}' -> {}.{}",
                label.name,
                node.name,
                node.port(label.target.port).name
            )?;
        }
        Ok(())
    }
}

fn display_value(v: &Option<Value>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(doc: Value) -> Result<Graph, LowerError> {
        let netlist: JsonNetlist = serde_json::from_value(doc).unwrap();
        Graph::build(&netlist, &Registry::builtin())
    }

    fn two_node_doc() -> Value {
        json!({
            "graph": { "nodes": {
                "n2": { "id": "n2", "data": {
                    "name": "B", "type": "Dst", "superClasses": [],
                    "ports": [{ "name": "in", "type": "VoltageSink", "array": false, "idx": 0 }],
                    "argParams": []
                }, "ports": [] },
                "n1": { "id": "n1", "data": {
                    "name": "A", "type": "Src", "superClasses": ["PassiveConnector"],
                    "ports": [{ "name": "out", "type": "VoltageSource", "array": false, "idx": 0 }],
                    "argParams": [{ "name": "length", "type": "int", "default_value": null, "value": 3 }]
                }, "ports": [] }
            } },
            "labels": {
                "l1": { "labelName": "net1", "nodeId": "n1", "portIdx": 0 },
                "l2": { "labelName": "net1", "nodeId": "n2", "portIdx": 0 }
            },
            "nets": [],
            "graphUIData": { "zoom": 1 }
        })
    }

    #[test]
    fn node_order_follows_document() {
        let g = build(two_node_doc()).unwrap();
        assert_eq!(g.nodes[0].name, "B");
        assert_eq!(g.nodes[1].name, "A");
        assert_eq!(g.labels[0].target, PortRef::new(NodeIdx(1), PortIdx(0)));
        assert_eq!(g.labels[1].target, PortRef::new(NodeIdx(0), PortIdx(0)));
    }

    #[test]
    fn node_order_follows_document_text() {
        let netlist = parse_netlist(
            r#"{"graph": {"nodes": {
                "z": {"id": "z", "data": {"name": "Zed", "type": "Dev", "ports": []}},
                "a": {"id": "a", "data": {"name": "Ay", "type": "Dev", "ports": []}}
            }}}"#,
        )
        .unwrap();
        let g = Graph::build(&netlist, &Registry::builtin()).unwrap();
        let names: Vec<&str> = g.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Ay"]);
    }

    #[test]
    fn roles_computed_at_build() {
        let g = build(two_node_doc()).unwrap();
        assert_eq!(g.nodes[0].role, Role::Plain);
        assert_eq!(g.nodes[1].role, Role::PassiveConnector);
    }

    #[test]
    fn arg_kind_decoding() {
        let g = build(two_node_doc()).unwrap();
        assert_eq!(g.nodes[1].args[0].kind, ArgKind::Int);
        assert_eq!(ArgKind::from("tuple".to_string()), ArgKind::Unknown("tuple".into()));
    }

    #[test]
    fn labels_are_optional() {
        let mut doc = two_node_doc();
        doc.as_object_mut().unwrap().remove("labels");
        let g = build(doc).unwrap();
        assert!(g.labels.is_empty());
    }

    #[test]
    fn missing_required_field_is_format_error() {
        let err = parse_netlist(r#"{"graph": {"nodes": {"n1": {"data": {"name": "A"}}}}}"#)
            .unwrap_err();
        assert!(matches!(err, LowerError::Format(_)));
    }

    #[test]
    fn negative_port_index_is_format_error() {
        let err = parse_netlist(
            r#"{"graph": {"nodes": {}}, "labels": {"l": {"labelName": "x", "nodeId": "n", "portIdx": -1}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LowerError::Format(_)));
    }

    #[test]
    fn unknown_label_node_rejected() {
        let mut doc = two_node_doc();
        doc["labels"]["l1"]["nodeId"] = json!("missing");
        let err = build(doc).unwrap_err();
        let diag = err.diagnostic().unwrap();
        assert_eq!(diag.code, codes::E0001);
        assert_eq!(diag.path, vec!["net1".to_string()]);
    }

    #[test]
    fn out_of_range_label_port_rejected() {
        let mut doc = two_node_doc();
        doc["labels"]["l2"]["portIdx"] = json!(4);
        let err = build(doc).unwrap_err();
        assert_eq!(err.diagnostic().unwrap().code, codes::E0002);
    }

    #[test]
    fn slot_parent_must_exist() {
        let mut doc = two_node_doc();
        doc["graph"]["nodes"]["n2"]["data"]["ports"][0]["elementOf"] = json!(7);
        let err = build(doc).unwrap_err();
        let diag = err.diagnostic().unwrap();
        assert_eq!(diag.code, codes::E0003);
        assert_eq!(diag.path, vec!["B".to_string(), "in".to_string()]);
    }

    #[test]
    fn slot_parent_cannot_be_self() {
        let mut doc = two_node_doc();
        doc["graph"]["nodes"]["n2"]["data"]["ports"][0]["elementOf"] = json!(0);
        assert!(build(doc).is_err());
    }

    #[test]
    fn slot_resolves_parent() {
        let mut doc = two_node_doc();
        doc["graph"]["nodes"]["n2"]["data"]["ports"] = json!([
            { "name": "i2c", "type": "I2cController", "array": true },
            { "name": "i2c_0", "type": "I2cController", "array": false, "elementOf": 0 }
        ]);
        let g = build(doc).unwrap();
        let slot = &g.nodes[0].ports[1];
        assert!(slot.is_slot());
        assert_eq!(g.nodes[0].port(slot.element_of.unwrap()).name, "i2c");
        assert_eq!(g.nodes[0].find_port("i2c_0"), Some(PortIdx(1)));
    }

    #[test]
    fn display_lists_nodes_and_labels() {
        let g = build(two_node_doc()).unwrap();
        let text = format!("{}", g);
        assert!(text.starts_with("Graph (2 nodes, 2 labels)"));
        assert!(text.contains("node 'A': Src [connector]"));
        assert!(text.contains("arg 'length': int = 3 (default null)"));
        assert!(text.contains("label 'net1' -> A.out"));
    }
}
