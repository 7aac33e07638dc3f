//! loxw CLI
//!
//! Runs Lox programs stored as JSON syntax trees.

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use loxwalk::common::NodeIdGen;
use loxwalk::config::Config;
use loxwalk::{Interpreter, Resolver, Stmt};

/// Exit status for programs rejected by the resolver
const EXIT_RESOLVE_ERROR: u8 = 65;
/// Exit status for programs aborted by a runtime error
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(Parser)]
#[command(name = "loxw")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tree-walking evaluator for Lox syntax trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./loxw.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and run a program
    Run {
        /// JSON program (an array of statements)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Keep every scope in named mode
        #[arg(long)]
        no_slots: bool,

        /// Deepest call nesting before "Stack overflow."
        #[arg(long, value_name = "N")]
        max_call_depth: Option<usize>,
    },

    /// Resolve a program and print the resolution tables
    Resolve {
        /// JSON program (an array of statements)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Keep every scope in named mode
        #[arg(long)]
        no_slots: bool,
    },

    /// Show information about the evaluator
    Info,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Run {
            input,
            no_slots,
            max_call_depth,
        } => {
            if no_slots {
                config.resolver.slots = false;
            }
            if let Some(depth) = max_call_depth {
                config.interpreter.max_call_depth = depth;
            }
            run(&input, &config)
        }

        Commands::Resolve { input, no_slots } => {
            if no_slots {
                config.resolver.slots = false;
            }
            resolve(&input, &config)
        }

        Commands::Info => info(&config),
    }
}

fn load(input: &Path) -> Result<Vec<Stmt>> {
    let source = std::fs::read_to_string(input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read input file {}", input.display()))?;

    let statements = loxwalk::ast::load_json(&source, &mut NodeIdGen::new())
        .map_err(|e| miette::miette!("Invalid program {}: {}", input.display(), e))?;
    tracing::debug!("Loaded {} top-level statements", statements.len());
    Ok(statements)
}

fn run(input: &Path, config: &Config) -> Result<ExitCode> {
    tracing::info!("Running {:?}", input);

    let statements = load(input)?;
    let tables = match Resolver::new(config.resolver).resolve(&statements) {
        Ok(tables) => tables,
        Err(errors) => {
            eprintln!("{:?}", miette::Report::new(errors));
            return Ok(ExitCode::from(EXIT_RESOLVE_ERROR));
        }
    };

    let mut interpreter = Interpreter::with_config(&config.interpreter).with_resolution(tables);
    interpreter.interpret(&statements);

    if interpreter.reporter().has_errors() {
        interpreter.reporter().emit_all();
        return Ok(ExitCode::from(EXIT_RUNTIME_ERROR));
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve(input: &Path, config: &Config) -> Result<ExitCode> {
    tracing::info!("Resolving {:?}", input);

    let statements = load(input)?;
    let tables = match Resolver::new(config.resolver).resolve(&statements) {
        Ok(tables) => tables,
        Err(errors) => {
            eprintln!("{:?}", miette::Report::new(errors));
            return Ok(ExitCode::from(EXIT_RESOLVE_ERROR));
        }
    };

    println!("=== Locals (node: distance, slot) ===");
    for (id, at) in tables.locals() {
        println!("  {}: {}, {}", id, at.distance, at.slot);
    }
    println!();

    println!("=== Frame sizes (node: slots) ===");
    for (id, size) in tables.frame_sizes() {
        println!("  {}: {}", id, size);
    }
    println!();

    println!("=== Declarations (node: slot) ===");
    for (id, slot) in tables.declarations() {
        println!("  {}: {}", id, slot);
    }

    Ok(ExitCode::SUCCESS)
}

fn info(config: &Config) -> Result<ExitCode> {
    println!("loxwalk evaluator");
    println!("Version: {}", loxwalk::VERSION);
    println!();
    println!("Effective configuration:");
    let rendered = toml::to_string_pretty(config)
        .into_diagnostic()
        .wrap_err("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}
