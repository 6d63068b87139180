// connect.rs — Label aggregation into connections
//
// Groups labels sharing a name into one `Connection` each, in order of each
// name's first label, and indexes every labelled port back to its owner.
//
// Preconditions: `graph` is built (all label targets exist).
// Postconditions: every labelled port belongs to exactly one connection;
//                 connection order is first-label order.
// Failure modes: a port targeted by two labels → `LowerError::Internal`
//                (the editor is expected to prevent this).
// Side effects: none.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::diag::LowerError;
use crate::graph::Graph;
use crate::id::{ConnId, PortRef};

/// One logical net: every port labelled with `name`.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnId,
    pub name: String,
    /// Member ports, in label order.
    pub members: Vec<PortRef>,
    /// Cached array-ness, see `shape.rs`.
    pub(crate) shape: OnceCell<Option<bool>>,
}

impl Connection {
    fn new(id: ConnId, name: String) -> Self {
        Self {
            id,
            name,
            members: Vec::new(),
            shape: OnceCell::new(),
        }
    }
}

/// All connections of a graph plus the port → connection reverse index.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    conns: Vec<Connection>,
    by_name: IndexMap<String, ConnId>,
    by_port: HashMap<PortRef, ConnId>,
}

impl Connections {
    /// Group the graph's labels by name.
    pub fn aggregate(graph: &Graph) -> Result<Connections, LowerError> {
        let mut out = Connections::default();
        for label in &graph.labels {
            let id = match out.by_name.get(&label.name) {
                Some(&id) => id,
                None => {
                    let id = ConnId(out.conns.len() as u32);
                    out.conns.push(Connection::new(id, label.name.clone()));
                    out.by_name.insert(label.name.clone(), id);
                    id
                }
            };

            if let Some(&owner) = out.by_port.get(&label.target) {
                let node = graph.node(label.target.node);
                return Err(LowerError::Internal(format!(
                    "duplicate label: port {}.{} is claimed by '{}' and '{}'",
                    node.name,
                    node.port(label.target.port).name,
                    out.conns[owner.index()].name,
                    label.name
                )));
            }
            out.by_port.insert(label.target, id);
            out.conns[id.index()].members.push(label.target);
        }
        Ok(out)
    }

    pub fn get(&self, id: ConnId) -> &Connection {
        &self.conns[id.index()]
    }

    pub fn by_name(&self, name: &str) -> Option<&Connection> {
        self.by_name.get(name).map(|&id| self.get(id))
    }

    /// The connection a port is labelled into, if any.
    pub fn owner(&self, port: PortRef) -> Option<&Connection> {
        self.by_port.get(&port).map(|&id| self.get(id))
    }

    /// Connections in first-label order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.conns.iter()
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Human-readable listing for `--emit connections`.
    pub fn describe(&self, graph: &Graph) -> String {
        let mut out = String::new();
        for conn in &self.conns {
            let shape = match conn.shape(graph) {
                Ok(Some(true)) => "array",
                Ok(Some(false)) => "scalar",
                Ok(None) => "slots only",
                Err(_) => "mixed",
            };
            let members: Vec<String> = conn
                .members
                .iter()
                .map(|&m| graph.port_path(m).join("."))
                .collect();
            let _ = writeln!(out, "{} [{}]: {}", conn.name, shape, members.join(", "));
        }
        out
    }
}
