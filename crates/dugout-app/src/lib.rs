// Command-line front end: argument parsing and command handlers.

pub mod cli;
pub mod commands;
