// id.rs — Dense identifiers for graph elements
//
// Node ids from the editor are opaque strings; after graph construction every
// node, port, and connection is addressed by a dense index allocated in input
// order, so iteration over them is deterministic.

/// Index of a node in `Graph::nodes` (input order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub u32);

/// Position of a port within its node's port list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortIdx(pub u32);

/// Index of a connection in aggregation (first-label) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u32);

/// One (node, port) endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node: NodeIdx,
    pub port: PortIdx,
}

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PortIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConnId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PortRef {
    pub fn new(node: NodeIdx, port: PortIdx) -> Self {
        Self { node, port }
    }
}
