// pipeline.rs — Compilation state and pass orchestration
//
// Holds the decoded netlist, the registry, and every pass artifact, and runs
// the minimal set of passes for a given terminal PassId.
//
// Preconditions: the netlist is decoded (format errors are reported before
//                the runner starts).
// Postconditions: artifacts for every pass in `required_passes(terminal)` are
//                 populated, or the first failing pass is reported.
// Failure modes: any pass returning a `LowerError`; the rest are skipped.
// Side effects: debug-level tracing per pass (name, elapsed time).

use std::time::Instant;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::connect::Connections;
use crate::connector::{synthesize_connectors, ConnectorBlock};
use crate::diag::LowerError;
use crate::emit::{emit, Declarations, EmitOptions};
use crate::graph::{parse_netlist, Graph, JsonNetlist};
use crate::implicit::{infer_implicit, ImplicitAdditions};
use crate::pass::{required_passes, PassId};
use crate::registry::Registry;
use crate::shape::infer_shapes;

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for reproducible lowering and cache keys.
///
/// `source_hash`: SHA-256 of the raw input text.
/// `registry_fingerprint`: SHA-256 of `Registry::canonical_json()`.
/// `output_hash`: SHA-256 of the emitted text, when lowering succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub registry_fingerprint: [u8; 32],
    pub output_hash: Option<[u8; 32]>,
    pub compiler_version: &'static str,
}

#[derive(Serialize)]
struct BuildInfo<'a> {
    source_hash: String,
    registry_fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_hash: Option<String>,
    compiler_version: &'a str,
}

impl Provenance {
    /// Hex string of the source hash (64 characters).
    pub fn source_hash_hex(&self) -> String {
        bytes_to_hex(&self.source_hash)
    }

    /// Hex string of the registry fingerprint (64 characters).
    pub fn registry_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.registry_fingerprint)
    }

    pub fn output_hash_hex(&self) -> Option<String> {
        self.output_hash.as_ref().map(bytes_to_hex)
    }

    /// Pretty JSON document for `--emit build-info`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let info = BuildInfo {
            source_hash: self.source_hash_hex(),
            registry_fingerprint: self.registry_fingerprint_hex(),
            output_hash: self.output_hash_hex(),
            compiler_version: self.compiler_version,
        };
        let mut text = serde_json::to_string_pretty(&info)?;
        text.push('\n');
        Ok(text)
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(bytes);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// Compute provenance from the input text, the registry, and the emitted
/// text if lowering produced any.
pub fn compute_provenance(source: &str, registry: &Registry, output: Option<&str>) -> Provenance {
    Provenance {
        source_hash: sha256(source.as_bytes()),
        registry_fingerprint: sha256(registry.canonical_json().as_bytes()),
        output_hash: output.map(|text| sha256(text.as_bytes())),
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Compilation state ──────────────────────────────────────────────────────

/// The decoded input plus every artifact produced so far.
pub struct CompilationState<'r> {
    pub netlist: JsonNetlist,
    pub registry: &'r Registry,
    pub graph: Option<Graph>,
    pub connections: Option<Connections>,
    pub connectors: Option<Vec<ConnectorBlock>>,
    pub implicit: Option<ImplicitAdditions>,
    pub declarations: Option<Declarations>,
}

impl<'r> CompilationState<'r> {
    pub fn new(netlist: JsonNetlist, registry: &'r Registry) -> Self {
        Self {
            netlist,
            registry,
            graph: None,
            connections: None,
            connectors: None,
            implicit: None,
            declarations: None,
        }
    }
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution stopped at `failing_pass`.
#[derive(Debug, thiserror::Error)]
#[error("{}: {error}", .failing_pass.name())]
pub struct PipelineError {
    pub failing_pass: PassId,
    #[source]
    pub error: LowerError,
}

impl From<PipelineError> for LowerError {
    fn from(e: PipelineError) -> Self {
        e.error
    }
}

fn require<'a, T>(artifact: &'a Option<T>, pass: PassId) -> Result<&'a T, LowerError> {
    artifact.as_ref().ok_or_else(|| {
        LowerError::Internal(format!("{} ran before its inputs were built", pass.name()))
    })
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
pub fn run_pipeline(
    state: &mut CompilationState<'_>,
    terminal: PassId,
    options: &EmitOptions,
) -> Result<(), PipelineError> {
    for pass in required_passes(terminal) {
        let t = Instant::now();
        let result = run_pass(state, pass, options);
        debug!(
            pass = pass.name(),
            elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
            ok = result.is_ok(),
            "pass complete"
        );
        result.map_err(|error| PipelineError {
            failing_pass: pass,
            error,
        })?;
    }
    Ok(())
}

fn run_pass(
    state: &mut CompilationState<'_>,
    pass: PassId,
    options: &EmitOptions,
) -> Result<(), LowerError> {
    match pass {
        PassId::BuildGraph => {
            state.graph = Some(Graph::build(&state.netlist, state.registry)?);
        }
        PassId::Aggregate => {
            let graph = require(&state.graph, pass)?;
            state.connections = Some(Connections::aggregate(graph)?);
        }
        PassId::InferShape => {
            let graph = require(&state.graph, pass)?;
            let conns = require(&state.connections, pass)?;
            infer_shapes(graph, conns)?;
        }
        PassId::SynthesizeConnectors => {
            let graph = require(&state.graph, pass)?;
            let conns = require(&state.connections, pass)?;
            state.connectors = Some(synthesize_connectors(graph, conns, state.registry)?);
        }
        PassId::InferImplicit => {
            let graph = require(&state.graph, pass)?;
            let conns = require(&state.connections, pass)?;
            state.implicit = Some(infer_implicit(graph, conns, state.registry));
        }
        PassId::Emit => {
            let graph = require(&state.graph, pass)?;
            let conns = require(&state.connections, pass)?;
            let connectors = require(&state.connectors, pass)?;
            let implicit = require(&state.implicit, pass)?;
            state.declarations = Some(emit(graph, conns, connectors, implicit, options)?);
        }
    }
    Ok(())
}

// ── One-call entry points ──────────────────────────────────────────────────

/// Lower a decoded netlist to declaration text.
pub fn lower(
    netlist: JsonNetlist,
    registry: &Registry,
    options: &EmitOptions,
) -> Result<String, LowerError> {
    let mut state = CompilationState::new(netlist, registry);
    run_pipeline(&mut state, PassId::Emit, options)?;
    let declarations = require(&state.declarations, PassId::Emit)?;
    Ok(declarations.render())
}

/// Decode and lower a JSON netlist document.
pub fn lower_json(
    text: &str,
    registry: &Registry,
    options: &EmitOptions,
) -> Result<String, LowerError> {
    lower(parse_netlist(text)?, registry, options)
}
