//! Operator console for the SCADA backend's REST API.
//!
//! One-shot subcommands cover tag, OPC UA, backup and configuration
//! administration; `watch` keeps a polling view of one surface open.

pub mod commands;
pub mod confirm;
pub mod infra;
pub mod monitor;
pub mod navigator;
pub mod render;
pub mod runtime;
pub mod surfaces;
