use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ticketflow", version, about = "Plan and run ticket dependency graphs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON graph snapshot (tickets + edges). Defaults to ~/.ticketflow/graph.json.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Config file. Defaults to ~/.ticketflow/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the layered execution plan for a set of tickets.
    Plan(PlanArgs),
    /// Replace the dependencies of one ticket.
    Deps(DepsArgs),
    /// Execute a set of tickets layer by layer with the scripted runner.
    Run(RunArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub project: String,

    /// Comma separated ticket ids.
    #[arg(long, value_delimiter = ',', required = true)]
    pub tickets: Vec<String>,

    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DepsArgs {
    #[arg(long)]
    pub project: String,

    #[arg(long)]
    pub ticket: String,

    /// Comma separated predecessor ids. Pass an empty value to clear.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub depends_on: Vec<String>,

    /// Persist the new edge set back into the snapshot file.
    #[arg(long)]
    pub write: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub project: String,

    #[arg(long, value_delimiter = ',', required = true)]
    pub tickets: Vec<String>,

    /// Tickets whose scripted worker reports failure.
    #[arg(long, value_delimiter = ',')]
    pub fail: Vec<String>,

    /// Upper bound on concurrent launches within a layer.
    #[arg(long)]
    pub max_parallel: Option<usize>,

    #[arg(long)]
    pub json: bool,
}

/// Drop blanks left by stray commas (`--tickets a,,b`).
pub fn clean_ids(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
