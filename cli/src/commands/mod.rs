pub mod cli;
pub mod context;
pub mod deps;
pub mod plan;
pub mod run;
