// connector.rs — Adapter synthesis for passive connectors
//
// A passive connector (pin header, terminal block, ...) has untyped pins.
// For each connected pin, the types of the ports it is wired to decide what
// the pin must look like from the outside; the first matching registry
// adapt rule names the exposed type. Each connector node becomes a synthetic
// wrapper block class exporting one typed port per connected pin.
//
// Preconditions: connections aggregated.
// Postconditions: one `ConnectorBlock` per passive connector node, in node
//                 order; pins in port order, each with a resolved type.
// Failure modes: pin not named `port_<N>`, pin on an array connection, or no
//                adapt rule for the incoming types → `Diagnostic` with path
//                `[connector, pin]`.
// Side effects: none.
//
// The wrapper class name is `{type}_{name}`; it is unique as long as
// (type, name) pairs are unique in the graph, which the editor guarantees.

use std::collections::BTreeSet;

use tracing::debug;

use crate::connect::Connections;
use crate::diag::{codes, Diagnostic};
use crate::graph::{Graph, Node};
use crate::id::{NodeIdx, PortIdx, PortRef};
use crate::registry::{Registry, Role};

/// Editor naming convention for connector pins.
pub const PIN_PREFIX: &str = "port_";

/// One exported pin of a synthesized connector wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorPin {
    pub port: PortIdx,
    /// Exported port name (`port_<N>`).
    pub name: String,
    /// Physical pin number on the wrapped part (`N + 1`).
    pub pin: u32,
    pub exposed_type: String,
}

/// Synthetic wrapper block for one passive connector node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorBlock {
    pub node: NodeIdx,
    pub class_name: String,
    pub pins: Vec<ConnectorPin>,
}

/// Wrapper class name for a connector node.
pub fn wrapper_class_name(node: &Node) -> String {
    format!("{}_{}", node.type_name, node.name)
}

/// Physical pin number for a `port_<N>` pin name.
pub fn pin_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(PIN_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok()?.checked_add(1)
}

/// Synthesize wrappers for every passive connector in the graph.
pub fn synthesize_connectors(
    graph: &Graph,
    conns: &Connections,
    registry: &Registry,
) -> Result<Vec<ConnectorBlock>, Diagnostic> {
    let mut blocks = Vec::new();
    for (idx, node) in graph.iter_nodes() {
        if node.role != Role::PassiveConnector {
            continue;
        }
        blocks.push(synthesize_one(graph, conns, registry, idx, node)?);
    }
    Ok(blocks)
}

fn synthesize_one(
    graph: &Graph,
    conns: &Connections,
    registry: &Registry,
    idx: NodeIdx,
    node: &Node,
) -> Result<ConnectorBlock, Diagnostic> {
    let mut pins = Vec::new();
    for (i, port) in node.ports.iter().enumerate() {
        let this = PortRef::new(idx, PortIdx(i as u32));
        let Some(conn) = conns.owner(this) else {
            continue;
        };
        let path = [node.name.as_str(), port.name.as_str()];

        let pin = pin_number(&port.name).ok_or_else(|| {
            Diagnostic::new(codes::E0402, path, "invalid connector pin name")
                .with_hint(format!("connector pins are named {}<N>", PIN_PREFIX))
        })?;

        if conn.is_array(graph)? {
            return Err(Diagnostic::new(
                codes::E0400,
                path,
                format!("connector pin cannot connect to array label {}", conn.name),
            ));
        }

        let incoming: BTreeSet<&str> = conn
            .members
            .iter()
            .filter(|&&m| m != this)
            .map(|&m| graph.port(m).type_name.as_str())
            .collect();

        let rule = registry.resolve_adapter(&incoming).ok_or_else(|| {
            let types: Vec<&str> = incoming.iter().copied().collect();
            Diagnostic::new(
                codes::E0401,
                path,
                format!("no connector type for connected types {{{}}}", types.join(", ")),
            )
        })?;
        debug!(
            connector = %node.name,
            pin = %port.name,
            exposed = %rule.exposes,
            "resolved connector pin"
        );

        pins.push(ConnectorPin {
            port: PortIdx(i as u32),
            name: port.name.clone(),
            pin,
            exposed_type: rule.exposes.clone(),
        });
    }

    Ok(ConnectorBlock {
        node: idx,
        class_name: wrapper_class_name(node),
        pins,
    })
}
