use ticketflow_plugins::factory::build_validator;

use crate::commands::cli::{clean_ids, DepsArgs};
use crate::commands::context::CommandContext;
use crate::error::CliError;

pub async fn handle_deps(args: DepsArgs, ctx: &CommandContext) -> Result<i32, CliError> {
    let depends_on = clean_ids(&args.depends_on);
    let validator = build_validator(&ctx.services);
    let edges = validator
        .set_ticket_dependencies(&args.project, &args.ticket, &depends_on)
        .await?;

    if edges.is_empty() {
        println!("{} has no dependencies", args.ticket);
    }
    for edge in &edges {
        println!("{} -> {}", edge.ticket_id, edge.depends_on_ticket_id);
    }

    if args.write {
        ctx.persist().await?;
        tracing::info!(snapshot = %ctx.snapshot_path.display(), "snapshot written");
    }
    Ok(0)
}
