//! # dvgen CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;

/// Declarative validation compiler.
///
/// Compiles tagged type definitions into rule trees, validates objects
/// against them, and checks migration equivalence of error lists.
#[derive(Parser, Debug)]
#[command(name = "dvgen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compile every type of a schema and print the rule trees.
    Compile(dvgen_cli::compile::CompileArgs),
    /// Validate an object (and optionally its previous version).
    Validate(dvgen_cli::validate::ValidateArgs),
    /// Compare declarative and reference error lists.
    Equiv(dvgen_cli::equiv::EquivArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Compile(args) => dvgen_cli::compile::run(&args)?,
        Commands::Validate(args) => dvgen_cli::validate::run(&args)?,
        Commands::Equiv(args) => dvgen_cli::equiv::run(&args)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
