#![allow(dead_code)]

use std::sync::Arc;

use ticketflow_core::graph::TicketOwner;
use ticketflow_plugins::{GraphSnapshot, InMemoryGraphStore, Services, TicketRecord};

pub fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

/// Project `p1` with epics `a`..`f` and project `p2` with epic `x`.
pub fn two_project_snapshot() -> GraphSnapshot {
    let mut tickets: Vec<TicketRecord> = ["a", "b", "c", "d", "e", "f"]
        .iter()
        .map(|id| TicketRecord::new(id.to_string(), TicketOwner::project("p1")))
        .collect();
    tickets.push(TicketRecord::new("x".into(), TicketOwner::project("p2")));
    GraphSnapshot {
        tickets,
        edges: Vec::new(),
    }
}

pub fn services() -> Services {
    Services::in_memory(two_project_snapshot()).unwrap()
}

pub fn graph_store() -> Arc<InMemoryGraphStore> {
    Arc::new(InMemoryGraphStore::from_snapshot(two_project_snapshot()).unwrap())
}
