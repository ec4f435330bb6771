//! Backend bridge: command queue consumed by a worker thread that owns the Tokio runtime.

pub mod commands;
pub mod runtime;
