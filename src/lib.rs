//! Todo Graph MCP Server Library
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod logging;
pub mod tools;
pub mod types;
