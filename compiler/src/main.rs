use clap::Parser;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nwc::diag::{CompileResult, LowerError};
use nwc::emit::EmitOptions;
use nwc::graph::parse_netlist;
use nwc::pass::PassId;
use nwc::pipeline::{compute_provenance, lower_json, run_pipeline, CompilationState, PipelineError};
use nwc::registry::{Registry, RegistryError};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// Block-diagram declarations
    Hdl,
    /// `{edgHdl, errors}` response document
    Result,
    /// Decoded graph
    Graph,
    /// Aggregated connections with their shapes
    Connections,
    /// Provenance hashes
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "nwc",
    version,
    about = "Netweaver Compiler — lowers editor circuit graphs to block-diagram HDL declarations"
)]
struct Cli {
    /// Input graph JSON file (`-` for stdin)
    source: PathBuf,

    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Hdl)]
    emit: EmitStage,

    /// Component library JSON replacing the built-in registry
    #[arg(long)]
    library: Option<PathBuf>,

    /// Name of the emitted top-level module
    #[arg(long, default_value = "MyModule")]
    module_name: String,

    /// Base class of the emitted top-level module
    #[arg(long, default_value = "SimpleBoardTop")]
    module_base: String,

    /// Log passes and timing to stderr
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Lower(#[from] LowerError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("cannot serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io { .. } | CliError::Registry(_) => 2,
            CliError::Lower(_) | CliError::Pipeline(_) | CliError::Json(_) => 1,
        }
    }
}

/// Text to write plus the exit code to finish with.
struct Output {
    text: String,
    code: i32,
}

impl Output {
    fn ok(text: String) -> Self {
        Self { text, code: 0 }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("nwc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    debug!(source = %cli.source.display(), emit = ?cli.emit, "starting");

    let output = match run(&cli) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("nwc: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = write_output(cli.output.as_deref(), &output.text) {
        eprintln!("nwc: {}", e);
        std::process::exit(e.exit_code());
    }
    std::process::exit(output.code);
}

fn run(cli: &Cli) -> Result<Output, CliError> {
    let registry = match &cli.library {
        Some(path) => Registry::load_json(path)?,
        None => Registry::builtin(),
    };
    debug!(
        connector_classes = registry.connector_classes.len(),
        adapt_rules = registry.adapt_rules.len(),
        buses = registry.buses.len(),
        "registry loaded"
    );

    let source = read_source(&cli.source)?;
    let options = EmitOptions {
        module_name: cli.module_name.clone(),
        module_base: cli.module_base.clone(),
    };

    match cli.emit {
        EmitStage::Hdl => Ok(Output::ok(lower_json(&source, &registry, &options)?)),
        EmitStage::Result => {
            let result = CompileResult::from_lowering(lower_json(&source, &registry, &options));
            let mut text = serde_json::to_string_pretty(&result)?;
            text.push('\n');
            Ok(Output {
                text,
                code: if result.is_ok() { 0 } else { 1 },
            })
        }
        EmitStage::Graph | EmitStage::Connections => {
            let terminal = match cli.emit {
                EmitStage::Graph => PassId::BuildGraph,
                _ => PassId::Aggregate,
            };
            let mut state = CompilationState::new(parse_netlist(&source)?, &registry);
            run_pipeline(&mut state, terminal, &options)?;
            let text = match (&state.graph, &state.connections) {
                (Some(graph), Some(conns)) => conns.describe(graph),
                (Some(graph), None) => graph.to_string(),
                _ => String::new(),
            };
            Ok(Output::ok(text))
        }
        EmitStage::BuildInfo => {
            let emitted = lower_json(&source, &registry, &options).ok();
            let provenance = compute_provenance(&source, &registry, emitted.as_deref());
            Ok(Output::ok(provenance.to_json()?))
        }
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    let io_err = |source: std::io::Error| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(io_err)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).map_err(io_err)
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => std::io::stdout()
            .write_all(text.as_bytes())
            .map_err(|source| CliError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            }),
    }
}
