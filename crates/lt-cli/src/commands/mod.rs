//! CLI subcommand implementations.

pub mod add;
pub mod delete;
pub mod import;
pub mod init;
pub mod recent;
pub mod timesheet;
pub mod track;
