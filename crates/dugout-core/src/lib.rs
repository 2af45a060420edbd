// Shared infrastructure: configuration and persistence.

pub mod config;
pub mod db;
