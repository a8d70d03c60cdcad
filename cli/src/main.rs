use clap::Parser;
use ticketflow_cli::commands::cli::{self, Commands};
use ticketflow_cli::commands::context::CommandContext;
use ticketflow_cli::commands::{deps, plan, run};
use ticketflow_cli::error::CliError;
use ticketflow_cli::logging::init_tracing;
use ticketflow_core::config;

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            let payload = serde_json::json!({ "code": e.code(), "message": e.to_string() });
            eprintln!("{payload}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => config::load_from_path(path),
        None => config::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    let ctx = CommandContext::load(cfg, args.snapshot.as_deref()).await?;

    match args.command {
        Commands::Plan(a) => plan::handle_plan(a, &ctx).await,
        Commands::Deps(a) => deps::handle_deps(a, &ctx).await,
        Commands::Run(a) => run::handle_run(a, &ctx).await,
    }
}
