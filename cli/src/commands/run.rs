use std::sync::Arc;

use serde_json::json;
use ticketflow_core::executor::{ExecutionReport, TicketExecutionStatus};
use ticketflow_plugins::factory::{build_dispatcher, build_engine};
use ticketflow_plugins::ScriptedRunner;

use crate::commands::cli::{clean_ids, RunArgs};
use crate::commands::context::CommandContext;
use crate::error::CliError;

pub async fn handle_run(args: RunArgs, ctx: &CommandContext) -> Result<i32, CliError> {
    let tickets = clean_ids(&args.tickets);

    let mut cfg = ctx.cfg.clone();
    if let Some(n) = args.max_parallel {
        cfg.executor.max_parallel = (n > 0).then_some(n);
    }

    let engine = build_engine(&ctx.services, &cfg);
    let runner = ScriptedRunner::new().failing(clean_ids(&args.fail));
    let dispatcher = build_dispatcher(&ctx.services, Arc::new(runner));

    let plan = engine.build_execution_plan(&args.project, &tickets).await?;
    let observer = |ticket_id: &str, status: TicketExecutionStatus| {
        tracing::info!(ticket_id, %status, "ticket status");
    };
    let report = engine
        .execute_dag_plan_with_report(&args.project, &plan, &dispatcher, Some(&observer))
        .await?;

    let sessions = ctx.services.sessions.all_sessions().await;
    if args.json {
        let output = json!({
            "report": report,
            "sessions": sessions,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(anyhow::Error::from)?
        );
    } else {
        print!("{}", render_report(&report));
        for s in &sessions {
            println!(
                "session {} ticket={} status={}",
                s.id,
                s.ticket_id.as_deref().unwrap_or("-"),
                s.status
            );
        }
    }

    Ok(if report.all_done() { 0 } else { 1 })
}

pub fn render_report(report: &ExecutionReport) -> String {
    let mut out = String::new();
    for (id, status) in &report.statuses {
        match report.runs.get(id).and_then(|r| r.error.as_deref()) {
            Some(err) => out.push_str(&format!("{id}: {status} ({err})\n")),
            None => out.push_str(&format!("{id}: {status}\n")),
        }
    }
    out.push_str(&format!(
        "done={} failed={} skipped={} pending={} in {}ms\n",
        report.count(TicketExecutionStatus::Done),
        report.count(TicketExecutionStatus::Failed),
        report.count(TicketExecutionStatus::Skipped),
        report.count(TicketExecutionStatus::Pending),
        report.duration_ms
    ));
    out
}
