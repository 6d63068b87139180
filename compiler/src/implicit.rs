// implicit.rs — Implicit support-block inference
//
// Some buses only work with a support block the user rarely places by hand
// (I2C needs pull-ups). For each connection carrying such a bus without a
// support block on it, a synthetic support block is added and wired to the
// bus connection and to the controller's power connection.
//
// Preconditions: connections aggregated.
// Postconditions: at most one synthetic block per (connection, bus rule);
//                 each adds exactly one extra member to the bus connection
//                 and one to the power connection.
// Failure modes: none. A bus whose controller power cannot be traced is
//                skipped; the unpowered design is reported downstream. An
//                array-shaped bus is skipped too, since the support block's
//                bus port is scalar.
// Side effects: none.

use tracing::debug;

use crate::connect::{Connection, Connections};
use crate::graph::Graph;
use crate::id::{ConnId, PortRef};
use crate::registry::{BusKind, BusRule, Registry, Role};

/// A synthetic support block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitBlock {
    pub name: String,
    pub class_name: String,
    pub bus: BusKind,
    pub bus_conn: ConnId,
    pub power_conn: ConnId,
}

/// A connection member that is not a port of any graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticMember {
    pub block: String,
    pub port: String,
}

/// Everything the inference adds to the design.
#[derive(Debug, Clone, Default)]
pub struct ImplicitAdditions {
    pub blocks: Vec<ImplicitBlock>,
    /// Extra members per connection, indexed by `ConnId`.
    extra_members: Vec<Vec<SyntheticMember>>,
}

impl ImplicitAdditions {
    /// Synthetic members appended to a connection, in insertion order.
    pub fn members_for(&self, id: ConnId) -> &[SyntheticMember] {
        self.extra_members
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn push_member(&mut self, id: ConnId, member: SyntheticMember) {
        if self.extra_members.len() <= id.index() {
            self.extra_members.resize_with(id.index() + 1, Vec::new);
        }
        self.extra_members[id.index()].push(member);
    }
}

/// Run every bus rule against every connection, in connection order.
pub fn infer_implicit(graph: &Graph, conns: &Connections, registry: &Registry) -> ImplicitAdditions {
    let mut additions = ImplicitAdditions::default();
    for conn in conns.iter() {
        for rule in &registry.buses {
            if !carries_bus(graph, conn, rule) || has_support(graph, conn, rule.kind) {
                continue;
            }
            if matches!(conn.shape(graph), Ok(Some(true))) {
                debug!(
                    label = %conn.name,
                    bus = rule.kind.as_str(),
                    "array bus connection, implicit support skipped"
                );
                continue;
            }
            let Some(power_conn) = controller_power(graph, conns, conn, rule) else {
                debug!(
                    label = %conn.name,
                    bus = rule.kind.as_str(),
                    "no controller power connection, implicit support skipped"
                );
                continue;
            };

            let name = format!("{}{}", rule.implicit_name_prefix, conn.name);
            debug!(
                label = %conn.name,
                block = %name,
                power = %conns.get(power_conn).name,
                "inserting implicit support block"
            );
            additions.push_member(
                power_conn,
                SyntheticMember {
                    block: name.clone(),
                    port: rule.support_power_port.clone(),
                },
            );
            additions.push_member(
                conn.id,
                SyntheticMember {
                    block: name.clone(),
                    port: rule.support_bus_port.clone(),
                },
            );
            additions.blocks.push(ImplicitBlock {
                name,
                class_name: rule.support_class.clone(),
                bus: rule.kind,
                bus_conn: conn.id,
                power_conn,
            });
        }
    }
    additions
}

fn carries_bus(graph: &Graph, conn: &Connection, rule: &BusRule) -> bool {
    conn.members.iter().any(|&m| {
        let ty = &graph.port(m).type_name;
        rule.is_controller(ty) || rule.is_target(ty)
    })
}

fn has_support(graph: &Graph, conn: &Connection, bus: BusKind) -> bool {
    conn.members
        .iter()
        .any(|&m| graph.node(m.node).role == Role::BusSupport(bus))
}

/// The connection holding the first controller's power pin, trying the
/// rule's power port names in order.
fn controller_power(
    graph: &Graph,
    conns: &Connections,
    conn: &Connection,
    rule: &BusRule,
) -> Option<ConnId> {
    conn.members
        .iter()
        .filter(|&&m| rule.is_controller(&graph.port(m).type_name))
        .find_map(|&m| {
            let node = graph.node(m.node);
            rule.controller_power_ports.iter().find_map(|pname| {
                let port = node.find_port(pname)?;
                conns.owner(PortRef::new(m.node, port)).map(|c| c.id)
            })
        })
}
