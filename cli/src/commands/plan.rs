use serde_json::json;
use ticketflow_core::executor::ExecutionPlan;
use ticketflow_plugins::factory::build_engine;

use crate::commands::cli::{clean_ids, PlanArgs};
use crate::commands::context::CommandContext;
use crate::error::CliError;

pub async fn handle_plan(args: PlanArgs, ctx: &CommandContext) -> Result<i32, CliError> {
    let tickets = clean_ids(&args.tickets);
    let engine = build_engine(&ctx.services, &ctx.cfg);
    let plan = engine.build_execution_plan(&args.project, &tickets).await?;

    if args.json {
        let output = json!({
            "layers": plan.layers,
            "ticketStatus": plan.ticket_status,
            "unscheduled": plan.unscheduled(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(anyhow::Error::from)?
        );
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(0)
}

pub fn render_plan(plan: &ExecutionPlan) -> String {
    let mut out = String::new();
    for (i, layer) in plan.layers.iter().enumerate() {
        out.push_str(&format!("layer {}: {}\n", i + 1, layer.join(", ")));
    }
    let unscheduled = plan.unscheduled();
    if !unscheduled.is_empty() {
        out.push_str(&format!("unscheduled (cycle): {}\n", unscheduled.join(", ")));
    }
    out
}
