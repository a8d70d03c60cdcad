use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ExecutorConfig;
use crate::error::{PlanError, StoreError};
use crate::graph::{DependencyGraph, GraphStore};

use super::planner::plan_from_graph;
use super::scheduler::execute_layer_parallel;
use super::traits::{LaunchStrategy, StatusObserver};
use super::types::{ExecutionPlan, ExecutionReport, TicketExecutionStatus};

/// Plans and executes ticket sets against a project's dependency graph.
pub struct ExecutionEngine {
    store: Arc<dyn GraphStore>,
    config: ExecutorConfig,
}

impl ExecutionEngine {
    pub fn new(store: Arc<dyn GraphStore>, config: ExecutorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub async fn build_execution_plan(
        &self,
        project_id: &str,
        ticket_ids: &[String],
    ) -> Result<ExecutionPlan, PlanError> {
        let edges = self.store.load_edges(project_id).await?;
        let graph = DependencyGraph::from_edges(&edges);
        plan_from_graph(&graph, ticket_ids, self.config.cycle_policy)
    }

    /// Execute `plan` and return the final status of every requested ticket.
    pub async fn execute_dag_plan(
        &self,
        project_id: &str,
        plan: &ExecutionPlan,
        launcher: &dyn LaunchStrategy,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<BTreeMap<String, TicketExecutionStatus>, StoreError> {
        Ok(self
            .execute_dag_plan_with_report(project_id, plan, launcher, observer)
            .await?
            .statuses)
    }

    pub async fn execute_dag_plan_with_report(
        &self,
        project_id: &str,
        plan: &ExecutionPlan,
        launcher: &dyn LaunchStrategy,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<ExecutionReport, StoreError> {
        let edges = self.store.load_edges(project_id).await?;
        let graph = DependencyGraph::from_edges(&edges);
        Ok(execute_plan(&graph, plan, launcher, observer, self.config.max_parallel).await)
    }
}

/// Walk `plan` layer by layer over a graph snapshot.
///
/// A ticket whose direct predecessor (in the full graph) ended `failed` or
/// `skipped` is marked `skipped` without launching. Everything else in the
/// layer is launched concurrently and awaited before the next layer starts.
pub async fn execute_plan(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    launcher: &dyn LaunchStrategy,
    observer: Option<&dyn StatusObserver>,
    max_parallel: Option<usize>,
) -> ExecutionReport {
    let start = Instant::now();
    let mut statuses = plan.ticket_status.clone();
    for layer in &plan.layers {
        for id in layer {
            statuses
                .entry(id.clone())
                .or_insert(TicketExecutionStatus::Pending);
        }
    }

    let mut report = ExecutionReport {
        layers: plan.layers.clone(),
        ..Default::default()
    };
    let set_status = |statuses: &mut BTreeMap<String, TicketExecutionStatus>,
                          id: &str,
                          status: TicketExecutionStatus| {
        statuses.insert(id.to_string(), status);
        if let Some(observer) = observer {
            observer.on_status_change(id, status);
        }
    };

    for (layer_id, layer) in plan.layers.iter().enumerate() {
        let mut eligible: Vec<String> = Vec::with_capacity(layer.len());

        for id in layer {
            let blocked_by = graph.dependencies_of(id).iter().find(|dep| {
                statuses
                    .get(dep.as_str())
                    .is_some_and(|s| s.blocks_dependents())
            });
            match blocked_by {
                Some(dep) => {
                    tracing::warn!(ticket_id = %id, blocked_by = %dep, "ticket skipped");
                    set_status(&mut statuses, id, TicketExecutionStatus::Skipped);
                }
                None => eligible.push(id.clone()),
            }
        }

        tracing::info!(
            layer = layer_id,
            eligible = eligible.len(),
            skipped = layer.len() - eligible.len(),
            "layer start"
        );

        for id in &eligible {
            set_status(&mut statuses, id, TicketExecutionStatus::Running);
        }

        let limit = max_parallel.unwrap_or(eligible.len()).max(1);
        let runs = execute_layer_parallel(&eligible, launcher, limit).await;

        for run in runs {
            if run.status == TicketExecutionStatus::Failed {
                tracing::error!(
                    ticket_id = %run.ticket_id,
                    error = run.error.as_deref().unwrap_or("launch reported failure"),
                    "ticket failed"
                );
            }
            set_status(&mut statuses, &run.ticket_id, run.status);
            report.runs.insert(run.ticket_id.clone(), run);
        }

        tracing::info!(layer = layer_id, "layer end");
    }

    report.statuses = statuses;
    report.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        done = report.count(TicketExecutionStatus::Done),
        failed = report.count(TicketExecutionStatus::Failed),
        skipped = report.count(TicketExecutionStatus::Skipped),
        pending = report.count(TicketExecutionStatus::Pending),
        duration_ms = report.duration_ms,
        "plan finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CyclePolicy;
    use crate::executor::LaunchResult;
    use crate::graph::DependencyEdge;
    use crate::session::ScopeLevel;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use TicketExecutionStatus::*;

    fn graph(pairs: &[(&str, &str)]) -> DependencyGraph {
        let edges: Vec<DependencyEdge> = pairs
            .iter()
            .map(|(t, d)| DependencyEdge {
                ticket_id: t.to_string(),
                depends_on_ticket_id: d.to_string(),
                project_id: "p".into(),
                scope_type: ScopeLevel::Project,
                scope_id: "p".into(),
            })
            .collect();
        DependencyGraph::from_edges(&edges)
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Default)]
    struct Scripted {
        fail: HashSet<String>,
        error: HashSet<String>,
        panic: HashSet<String>,
        launched: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn failing(ids: &[&str]) -> Self {
            Self {
                fail: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn launched(&self) -> Vec<String> {
            self.launched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LaunchStrategy for Scripted {
        async fn launch(&self, ticket_id: &str) -> anyhow::Result<LaunchResult> {
            self.launched.lock().unwrap().push(ticket_id.to_string());
            if self.panic.contains(ticket_id) {
                panic!("worker crashed");
            }
            if self.error.contains(ticket_id) {
                anyhow::bail!("spawn failed");
            }
            if self.fail.contains(ticket_id) {
                return Ok(LaunchResult::failed(ticket_id, "exit 1"));
            }
            Ok(LaunchResult::succeeded(ticket_id, format!("s-{ticket_id}")))
        }
    }

    async fn run(
        pairs: &[(&str, &str)],
        tickets: &[&str],
        launcher: &Scripted,
    ) -> ExecutionReport {
        let g = graph(pairs);
        let plan = plan_from_graph(&g, &ids(tickets), CyclePolicy::Exclude).unwrap();
        execute_plan(&g, &plan, launcher, None, None).await
    }

    #[tokio::test]
    async fn diamond_root_failure_skips_everything_below() {
        let launcher = Scripted::failing(&["a"]);
        let report = run(
            &[("b", "a"), ("c", "a"), ("d", "b"), ("d", "c")],
            &["a", "b", "c", "d"],
            &launcher,
        )
        .await;

        assert_eq!(report.statuses["a"], Failed);
        assert_eq!(report.statuses["b"], Skipped);
        assert_eq!(report.statuses["c"], Skipped);
        assert_eq!(report.statuses["d"], Skipped);
        assert_eq!(launcher.launched(), ids(&["a"]));
    }

    #[tokio::test]
    async fn independent_branch_still_completes() {
        let launcher = Scripted::failing(&["a"]);
        let report = run(&[("b", "a")], &["a", "b", "c"], &launcher).await;

        assert_eq!(report.statuses["a"], Failed);
        assert_eq!(report.statuses["b"], Skipped);
        assert_eq!(report.statuses["c"], Done);
    }

    #[tokio::test]
    async fn one_failed_parent_in_diamond_skips_join_only() {
        let launcher = Scripted::failing(&["b"]);
        let report = run(
            &[("b", "a"), ("c", "a"), ("d", "b"), ("d", "c")],
            &["a", "b", "c", "d"],
            &launcher,
        )
        .await;

        assert_eq!(report.statuses["a"], Done);
        assert_eq!(report.statuses["b"], Failed);
        assert_eq!(report.statuses["c"], Done);
        assert_eq!(report.statuses["d"], Skipped);
    }

    #[tokio::test]
    async fn launch_error_and_panic_become_failed() {
        let launcher = Scripted {
            error: ["a".to_string()].into(),
            panic: ["b".to_string()].into(),
            ..Default::default()
        };
        let report = run(&[("c", "b")], &["a", "b", "c", "d"], &launcher).await;

        assert_eq!(report.statuses["a"], Failed);
        assert_eq!(report.statuses["b"], Failed);
        assert_eq!(report.statuses["c"], Skipped);
        assert_eq!(report.statuses["d"], Done);
        assert!(report.runs["a"]
            .error
            .as_deref()
            .unwrap()
            .contains("spawn failed"));
        assert!(report.runs["b"]
            .error
            .as_deref()
            .unwrap()
            .contains("worker crashed"));
    }

    #[tokio::test]
    async fn failed_dependency_outside_layering_subgraph_still_skips() {
        // `b` depends on `a`, which is not requested; a prior status of
        // failed for `a` is carried in through the plan.
        let g = graph(&[("b", "a")]);
        let mut plan = plan_from_graph(&g, &ids(&["b"]), CyclePolicy::Exclude).unwrap();
        plan.ticket_status.insert("a".into(), Failed);

        let launcher = Scripted::default();
        let report = execute_plan(&g, &plan, &launcher, None, None).await;
        assert_eq!(report.statuses["b"], Skipped);
        assert!(launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn observer_sees_every_transition() {
        let events: Mutex<Vec<(String, TicketExecutionStatus)>> = Mutex::new(Vec::new());
        let observer = |id: &str, status: TicketExecutionStatus| {
            events.lock().unwrap().push((id.to_string(), status));
        };

        let g = graph(&[("b", "a"), ("c", "b")]);
        let plan = plan_from_graph(&g, &ids(&["a", "b", "c"]), CyclePolicy::Exclude).unwrap();
        let launcher = Scripted::failing(&["b"]);
        execute_plan(&g, &plan, &launcher, Some(&observer), None).await;

        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                ("a".to_string(), Running),
                ("a".to_string(), Done),
                ("b".to_string(), Running),
                ("b".to_string(), Failed),
                ("c".to_string(), Skipped),
            ]
        );
    }

    #[tokio::test]
    async fn cyclic_tickets_stay_pending() {
        let launcher = Scripted::default();
        let report = run(&[("x", "y"), ("y", "x")], &["a", "x", "y"], &launcher).await;

        assert_eq!(report.statuses["a"], Done);
        assert_eq!(report.statuses["x"], Pending);
        assert_eq!(report.statuses["y"], Pending);
        assert_eq!(report.statuses.len(), 3);
    }
}
