//! Lap tracker CLI library.
//!
//! This crate provides the CLI interface for the lap tracker.

mod cli;
pub mod commands;
mod config;
pub mod refdata;

pub use cli::{Cli, Commands};
pub use config::Config;
