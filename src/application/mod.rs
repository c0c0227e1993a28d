//! Application layer - screen controllers and CLI commands

pub mod commands;
pub mod controllers;

pub use commands::{Cli, CommandExecutor, Commands};
