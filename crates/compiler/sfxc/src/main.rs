use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sfxc::artifact::{binding_table_path, load_binding_table, write_artifacts};
use sfxc::backend::{Backend, TextBackend};
use sfxc::{Compiler, CompilerConfig};
use sfxir::Module;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sfxc",
    about = "Compile shader effect modules into a binding table."
)]
struct Args {
    /// JSON file holding the array of modules to compile
    #[arg(long, value_name = "PATH")]
    modules: PathBuf,

    /// Resource root; artifacts are written to its `shaders` directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    resources: PathBuf,

    /// Identifier that prefixes every artifact
    #[arg(long, default_value = "text")]
    backend_id: String,

    /// Binding table to reuse byte code from (defaults to the existing output table)
    #[arg(long, value_name = "PATH")]
    previous: Option<PathBuf>,

    /// Only recompile these modules; may be repeated
    #[arg(long = "only", value_name = "MODULE")]
    only: Vec<String>,

    /// Request optimized byte code
    #[arg(long, action = clap::ArgAction::SetTrue)]
    optimize: bool,

    /// Write the assembled source of every variant
    #[arg(long, action = clap::ArgAction::SetTrue)]
    emit_sources: bool,

    /// Write the disassembly of every compiled variant
    #[arg(long, action = clap::ArgAction::SetTrue)]
    emit_disassembly: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn run(args: Args) -> anyhow::Result<()> {
    let json = fs::read_to_string(&args.modules)
        .with_context(|| format!("failed to read `{}`", args.modules.display()))?;
    let modules: Vec<Module> = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse `{}`", args.modules.display()))?;

    let backend = TextBackend::new(&args.backend_id);

    let config = CompilerConfig {
        optimize: args.optimize,
        emit_sources: args.emit_sources,
        emit_disassembly: args.emit_disassembly,
        recompile: (!args.only.is_empty()).then_some(args.only),
    };

    let previous_path = args
        .previous
        .unwrap_or_else(|| binding_table_path(&args.resources, backend.identifier()));
    let previous = if config.recompile.is_some() {
        load_binding_table(&previous_path)?
    } else {
        None
    };

    let mut compiler = Compiler::new(&backend, config);

    if let Some(previous) = &previous {
        compiler = compiler.with_previous(previous);
    }

    let output = compiler.compile(&modules)?;

    write_artifacts(&args.resources, backend.identifier(), &output)?;

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sfxc: {err:#}");

            ExitCode::FAILURE
        }
    }
}
