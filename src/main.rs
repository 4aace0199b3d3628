//! compose-dot - Graphviz diagrams of Docker Compose files
//!
//! This is the CLI entry point.

use anyhow::Context;
use clap::Parser;
use compose_dot::compose::ComposeParser;
use compose_dot::graph::GraphBuilder;
use compose_dot::output::{OutputConfig, OutputFormat};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Generate a graph representation of a docker-compose file
#[derive(Parser)]
#[command(name = "compose-dot")]
#[command(version)]
#[command(about = "Generates a graph representation of a docker-compose file", long_about = None)]
struct Cli {
    /// The docker-compose YAML file
    input: PathBuf,

    /// Send output to a file (the input path with a .md extension)
    #[arg(long = "fileOut")]
    file_out: bool,

    /// Produce markdown formatted output
    #[arg(long = "outputMarkDown")]
    output_markdown: bool,

    /// Suppress console output
    #[arg(long)]
    quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Dot)]
    format: OutputFormat,

    /// Graph name
    #[arg(long)]
    name: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn output_config(&self) -> OutputConfig {
        OutputConfig {
            file_out: self.file_out,
            markdown: self.output_markdown,
            quiet: self.quiet,
            format: self.format,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the graph
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(&cli, &mut std::io::stdout().lock())
}

/// Load, build and emit. Any error here exits non-zero.
fn run(cli: &Cli, console: &mut dyn Write) -> anyhow::Result<()> {
    let config = cli.output_config();
    tracing::debug!(?config, input = %cli.input.display(), "Parsed command line");

    let (manifest, warnings) = ComposeParser::parse_file(&cli.input)
        .with_context(|| format!("cannot load {}", cli.input.display()))?;

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let mut builder = GraphBuilder::new();
    if let Some(name) = &cli.name {
        builder = builder.with_name(name.as_str());
    }
    let graph = builder.build(&manifest);

    config
        .emit(&graph, &cli.input, console)
        .context("cannot write graph")?;

    Ok(())
}
