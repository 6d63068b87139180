// emit.rs — Declaration emission
//
// Folds the validated graph, its connections, the synthesized connector
// wrappers, and the implicit support blocks into an ordered, immutable list
// of declarations, then renders them as the top-level design text consumed
// by the downstream elaborator.
//
// Preconditions: connections aggregated; connector and implicit passes run.
// Postconditions: `Declarations` with connector wrappers (node order), block
//                 instantiations (node order, then implicit blocks), and one
//                 connect per connection (first-label order). Rendering is
//                 a pure function of the declarations.
// Failure modes: non-identifier block/class/port/argument name, implicit
//                block name clashing with an emitted block, bad argument
//                value, inconsistent connection shape → `Diagnostic`.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use crate::args::{render_args, RenderedArg};
use crate::connect::{Connection, Connections};
use crate::connector::ConnectorBlock;
use crate::diag::{codes, Diagnostic};
use crate::graph::{Graph, Node};
use crate::id::{NodeIdx, PortRef};
use crate::ident::is_identifier;
use crate::implicit::ImplicitAdditions;

// ── Options ─────────────────────────────────────────────────────────────────

/// Naming of the emitted top-level module.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmitOptions {
    pub module_name: String,
    pub module_base: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            module_name: "MyModule".to_string(),
            module_base: "SimpleBoardTop".to_string(),
        }
    }
}

// ── Declarations ────────────────────────────────────────────────────────────

/// A reference to one connection member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortExpr {
    /// `self.block.port`
    Port { block: String, port: String },
    /// `self.block.parent.request('slot')`
    Request {
        block: String,
        parent: String,
        slot: String,
    },
    /// `self.block.parent.request_vector('slot')`
    RequestVector {
        block: String,
        parent: String,
        slot: String,
    },
}

impl fmt::Display for PortExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortExpr::Port { block, port } => write!(f, "self.{}.{}", block, port),
            PortExpr::Request {
                block,
                parent,
                slot,
            } => write!(f, "self.{}.{}.request('{}')", block, parent, slot),
            PortExpr::RequestVector {
                block,
                parent,
                slot,
            } => write!(f, "self.{}.{}.request_vector('{}')", block, parent, slot),
        }
    }
}

/// One exported, adapted pin of a connector wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDecl {
    pub name: String,
    pub pin: u32,
    pub adapt_to: String,
}

/// A synthetic connector wrapper class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorDecl {
    pub class_name: String,
    pub wrapped_class: String,
    pub args: Vec<RenderedArg>,
    pub exports: Vec<ExportDecl>,
}

/// `self.name = self.Block(class_name(args))`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDecl {
    pub name: String,
    pub class_name: String,
    pub args: Vec<RenderedArg>,
}

/// `self.connect(members...)` for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectDecl {
    pub label: String,
    pub members: Vec<PortExpr>,
}

/// The full emitted design, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarations {
    pub options: EmitOptions,
    pub connectors: Vec<ConnectorDecl>,
    pub blocks: Vec<BlockDecl>,
    pub connects: Vec<ConnectDecl>,
}

// ── Public entry point ──────────────────────────────────────────────────────

pub fn emit(
    graph: &Graph,
    conns: &Connections,
    connectors: &[ConnectorBlock],
    implicit: &ImplicitAdditions,
    options: &EmitOptions,
) -> Result<Declarations, Diagnostic> {
    let wrappers: HashMap<NodeIdx, &ConnectorBlock> =
        connectors.iter().map(|c| (c.node, c)).collect();

    let mut decls = Declarations {
        options: options.clone(),
        connectors: Vec::new(),
        blocks: Vec::new(),
        connects: Vec::new(),
    };

    for (idx, node) in graph.iter_nodes() {
        validate_block(node)?;
        let args = render_args(node)?;
        match wrappers.get(&idx) {
            Some(wrapper) => {
                decls.connectors.push(ConnectorDecl {
                    class_name: wrapper.class_name.clone(),
                    wrapped_class: node.type_name.clone(),
                    args,
                    exports: wrapper
                        .pins
                        .iter()
                        .map(|p| ExportDecl {
                            name: p.name.clone(),
                            pin: p.pin,
                            adapt_to: p.exposed_type.clone(),
                        })
                        .collect(),
                });
                decls.blocks.push(BlockDecl {
                    name: node.name.clone(),
                    class_name: wrapper.class_name.clone(),
                    args: Vec::new(),
                });
            }
            None => decls.blocks.push(BlockDecl {
                name: node.name.clone(),
                class_name: node.type_name.clone(),
                args,
            }),
        }
    }

    for block in &implicit.blocks {
        if !is_identifier(&block.name) {
            return Err(Diagnostic::new(
                codes::E0105,
                [conns.get(block.bus_conn).name.as_str()],
                format!("invalid implicit block name {}", block.name),
            )
            .with_hint("rename the label to a valid identifier"));
        }
        if decls.blocks.iter().any(|b| b.name == block.name) {
            return Err(Diagnostic::new(
                codes::E0106,
                [conns.get(block.bus_conn).name.as_str()],
                format!("implicit block name {} is already taken", block.name),
            )
            .with_hint("rename the block or the label"));
        }
        decls.blocks.push(BlockDecl {
            name: block.name.clone(),
            class_name: block.class_name.clone(),
            args: Vec::new(),
        });
    }

    for conn in conns.iter() {
        decls.connects.push(emit_connection(graph, conn, implicit)?);
    }

    Ok(decls)
}

fn validate_block(node: &Node) -> Result<(), Diagnostic> {
    if !is_identifier(&node.name) {
        return Err(Diagnostic::new(
            codes::E0100,
            [node.name.as_str()],
            "invalid block name",
        ));
    }
    if !is_identifier(&node.type_name) {
        return Err(Diagnostic::new(
            codes::E0101,
            [node.name.as_str()],
            format!("invalid block class {}", node.type_name),
        ));
    }
    Ok(())
}

fn emit_connection(
    graph: &Graph,
    conn: &Connection,
    implicit: &ImplicitAdditions,
) -> Result<ConnectDecl, Diagnostic> {
    let is_array = conn.is_array(graph)?;
    let mut members = Vec::with_capacity(conn.members.len());
    for &member in &conn.members {
        members.push(member_expr(graph, member, is_array)?);
    }
    members.extend(implicit.members_for(conn.id).iter().map(|m| PortExpr::Port {
        block: m.block.clone(),
        port: m.port.clone(),
    }));
    Ok(ConnectDecl {
        label: conn.name.clone(),
        members,
    })
}

fn member_expr(graph: &Graph, member: PortRef, is_array: bool) -> Result<PortExpr, Diagnostic> {
    let node = graph.node(member.node);
    let port = graph.port(member);
    if !is_identifier(&port.name) {
        return Err(Diagnostic::new(
            codes::E0102,
            [node.name.as_str(), port.name.as_str()],
            "invalid port name",
        ));
    }
    let Some(parent_idx) = port.element_of else {
        return Ok(PortExpr::Port {
            block: node.name.clone(),
            port: port.name.clone(),
        });
    };

    let parent = node.port(parent_idx);
    if !is_identifier(&parent.name) {
        return Err(Diagnostic::new(
            codes::E0103,
            [node.name.as_str(), parent.name.as_str()],
            "invalid array port name",
        ));
    }
    let (block, parent, slot) = (node.name.clone(), parent.name.clone(), port.name.clone());
    Ok(if is_array {
        PortExpr::RequestVector {
            block,
            parent,
            slot,
        }
    } else {
        PortExpr::Request {
            block,
            parent,
            slot,
        }
    })
}

// ── Rendering ───────────────────────────────────────────────────────────────

fn join_args(args: &[RenderedArg]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ConnectorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "class {}(Block):", self.class_name)?;
        writeln!(f, "  def __init__(self):")?;
        writeln!(f, "    super().__init__()")?;
        writeln!(
            f,
            "    self._conn = self.Block({}({}))",
            self.wrapped_class,
            join_args(&self.args)
        )?;
        for export in &self.exports {
            writeln!(
                f,
                "    self.{} = self.Export(self._conn.pins.request('{}').adapt_to({}()), optional=True)",
                export.name, export.pin, export.adapt_to
            )?;
        }
        writeln!(f)?;
        // The elaborator resolves block classes by global name.
        writeln!(
            f,
            "globals()['__builtins__']['{0}'] = {0}",
            self.class_name
        )
    }
}

impl fmt::Display for BlockDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "self.{} = self.Block({}({}))",
            self.name,
            self.class_name,
            join_args(&self.args)
        )
    }
}

impl fmt::Display for ConnectDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.members.iter().map(|m| m.to_string()).collect();
        write!(f, "self.connect({})", members.join(", "))
    }
}

impl fmt::Display for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for connector in &self.connectors {
            write!(f, "{}\n\n", connector)?;
        }
        writeln!(
            f,
            "class {}({}):",
            self.options.module_name, self.options.module_base
        )?;
        writeln!(f, "  def __init__(self):")?;
        writeln!(f, "    super().__init__()")?;
        writeln!(f)?;
        for block in &self.blocks {
            writeln!(f, "    {}", block)?;
        }
        writeln!(f)?;
        for connect in &self.connects {
            writeln!(f, "    {}", connect)?;
        }
        Ok(())
    }
}

impl Declarations {
    /// The emitted design text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}
