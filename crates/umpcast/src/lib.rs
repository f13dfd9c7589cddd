//! League scheduling core: strict per-scope ordering of applications, divisions,
//! roles, and levels, with derived casted/backup status.

pub mod config;
pub mod error;
pub mod league;
pub mod ordering;
pub mod telemetry;
