// nwc — Netweaver Compiler
//
// Library root. One module per lowering pass, plus the graph model, the
// component registry, and diagnostics.

pub mod args;
pub mod connect;
pub mod connector;
pub mod diag;
pub mod emit;
pub mod graph;
pub mod id;
pub mod ident;
pub mod implicit;
pub mod pass;
pub mod pipeline;
pub mod registry;
pub mod shape;

pub use diag::{CompileResult, CompilerError, Diagnostic, LowerError};
pub use emit::EmitOptions;
pub use pipeline::{lower, lower_json};
pub use registry::Registry;

/// Lower a JSON document into the caller-facing response record.
pub fn compile(text: &str, registry: &Registry, options: &EmitOptions) -> CompileResult {
    CompileResult::from_lowering(lower_json(text, registry, options))
}
