//! CLI command implementations.

pub mod coalesce;
pub mod distribution;
pub mod init;
pub mod route;
