//! CLI module for collexions - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running a cycle,
//! previewing selections and inspecting specials and pin history.

pub mod commands;

pub use commands::Cli;
