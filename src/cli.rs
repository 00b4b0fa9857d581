//! Command line interface for the fathom binary.

pub mod args;
pub mod commands;
pub mod output;

pub use args::FathomArgs;
pub use commands::execute_command;
