// pass.rs — Pass descriptors: metadata, dependency resolution, artifact IDs
//
// Declares the lowering passes (JSON decoding is outside the runner), their
// dependency edges, and the artifacts they produce. The pipeline runner uses
// this to compute the minimal pass subset for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each lowering pass (decoding excluded, handled before the runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    BuildGraph,
    Aggregate,
    InferShape,
    SynthesizeConnectors,
    InferImplicit,
    Emit,
}

impl PassId {
    pub fn name(self) -> &'static str {
        descriptor(self).name
    }
}

/// Artifacts held by the compilation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Graph,        // Graph
    Connections,  // Connections
    Shapes,       // cached on each Connection
    Connectors,   // Vec<ConnectorBlock>
    Implicit,     // ImplicitAdditions
    Declarations, // Declarations
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a lowering pass.
pub struct PassDescriptor {
    /// Name used in logs and pipeline errors.
    pub name: &'static str,
    /// Passes whose outputs this pass consumes.
    pub inputs: &'static [PassId],
    pub outputs: &'static [ArtifactId],
    pub invariants: &'static str,
}

pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::BuildGraph => PassDescriptor {
            name: "build_graph",
            inputs: &[],
            outputs: &[ArtifactId::Graph],
            invariants: "label targets exist, slot parents are ports of the same node",
        },
        PassId::Aggregate => PassDescriptor {
            name: "aggregate",
            inputs: &[PassId::BuildGraph],
            outputs: &[ArtifactId::Connections],
            invariants: "each labelled port owned by exactly one connection",
        },
        PassId::InferShape => PassDescriptor {
            name: "infer_shape",
            inputs: &[PassId::Aggregate],
            outputs: &[ArtifactId::Shapes],
            invariants: "non-slot members of a connection agree on array-ness",
        },
        PassId::SynthesizeConnectors => PassDescriptor {
            name: "synthesize_connectors",
            inputs: &[PassId::InferShape],
            outputs: &[ArtifactId::Connectors],
            invariants: "every connected connector pin has an exposed type",
        },
        PassId::InferImplicit => PassDescriptor {
            name: "infer_implicit",
            inputs: &[PassId::Aggregate],
            outputs: &[ArtifactId::Implicit],
            invariants: "at most one support block per bus connection",
        },
        PassId::Emit => PassDescriptor {
            name: "emit",
            inputs: &[PassId::SynthesizeConnectors, PassId::InferImplicit],
            outputs: &[ArtifactId::Declarations],
            invariants: "every emitted name is an identifier",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in declaration order.
pub const ALL_PASSES: [PassId; 6] = [
    PassId::BuildGraph,
    PassId::Aggregate,
    PassId::InferShape,
    PassId::SynthesizeConnectors,
    PassId::InferImplicit,
    PassId::Emit,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
