//! routervault - scheduled SSH backup orchestrator for MikroTik-class routers
//!
//! Connects to registered devices over SSH, produces a binary snapshot plus a
//! configuration export per device, pulls both over SFTP, delivers them to a
//! messaging endpoint, and keeps a crash-safe on-disk registry and run history.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod history;
pub mod notify;
pub mod orchestrator;
pub mod registry;
pub mod sanitize;
pub mod schedule;
pub mod session;
pub mod store;
