//! Renderer-facing protocol and stdio bridge

pub mod handler;
pub mod protocol;

pub use handler::{forward_snapshots, spawn_stdin_reader};
