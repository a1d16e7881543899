//! Shared helpers for command wrappers and process setup

pub mod logging;
