//! ticketflow command line front-end; modules are public for tests.

pub mod commands;
pub mod error;
pub mod logging;
