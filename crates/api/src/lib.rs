//! # Rendezvous App
//!
//! Process wiring for the scheduling engine.
//!
//! This crate contains:
//! - The application context (dependency injection)
//! - Command functions with structured command logging
//! - The `rendezvous` binary
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core` and `infra`
//! - Wires the SQLite and Google adapters into the core services

pub mod commands;
pub mod context;
pub mod utils;

pub use commands::*;
pub use context::*;
