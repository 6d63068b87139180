// shape.rs — Array-vs-scalar inference for connections
//
// A connection is array-shaped when its member ports are array ports, scalar
// when they are scalar ports. Array slots (`element_of` set) are skipped: a
// requested slot adopts whichever shape the rest of the connection has.
//
// Preconditions: the connection's members point into `graph`.
// Postconditions: the first successful result is cached on the connection;
//                 later calls return it unchanged.
// Failure modes: non-slot members disagree → `Diagnostic` naming the
//                connection (not cached; every call reports it).
// Side effects: fills the per-connection cache.

use crate::connect::{Connection, Connections};
use crate::diag::{codes, Diagnostic};
use crate::graph::Graph;

impl Connection {
    /// `Some(true)` for array, `Some(false)` for scalar, `None` when every
    /// member is an array slot.
    pub fn shape(&self, graph: &Graph) -> Result<Option<bool>, Diagnostic> {
        if let Some(&shape) = self.shape.get() {
            return Ok(shape);
        }
        let shape = self.infer_shape(graph)?;
        let _ = self.shape.set(shape);
        Ok(shape)
    }

    /// Array-ness for emission; a slots-only connection requests scalars.
    pub fn is_array(&self, graph: &Graph) -> Result<bool, Diagnostic> {
        Ok(self.shape(graph)?.unwrap_or(false))
    }

    fn infer_shape(&self, graph: &Graph) -> Result<Option<bool>, Diagnostic> {
        let mut first = None;
        for &member in &self.members {
            let port = graph.port(member);
            if port.is_slot() {
                continue;
            }
            match first {
                None => first = Some((port.is_array, member)),
                Some((is_array, witness)) if is_array != port.is_array => {
                    let (array_port, scalar_port) = if is_array {
                        (witness, member)
                    } else {
                        (member, witness)
                    };
                    let array_port = graph.port_path(array_port).join(".");
                    let scalar_port = graph.port_path(scalar_port).join(".");
                    return Err(Diagnostic::new(
                        codes::E0300,
                        [self.name.as_str()],
                        format!("mixed array and non-array ports in label {}", self.name),
                    )
                    .with_hint(format!(
                        "{} is an array port but {} is not",
                        array_port, scalar_port
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(first.map(|(is_array, _)| is_array))
    }
}

/// Infer and cache the shape of every connection, failing on the first
/// inconsistent one.
pub fn infer_shapes(graph: &Graph, conns: &Connections) -> Result<(), Diagnostic> {
    for conn in conns.iter() {
        conn.shape(graph)?;
    }
    Ok(())
}
