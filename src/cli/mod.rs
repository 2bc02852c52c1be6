//! CLI command definitions for todo-graph-mcp
//!
//! The main entry point is the `Cli` struct. Without a subcommand the MCP
//! server runs on stdio; `ready` and `chain` print graph queries as JSON.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Todo Graph MCP Server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project directory; the database becomes <DIR>/todo.db
    #[arg(short, long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Path to database file (overrides project dir and config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server (default if no subcommand given)
    Serve,

    /// Print ready and blocked items as JSON
    Ready,

    /// Print the dependency chain of an item as JSON
    Chain {
        /// ID of the item to start from
        item_id: i64,

        /// upstream, downstream or both
        #[arg(long, default_value = "both")]
        direction: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["todo-graph-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn chain_with_direction() {
        let cli = Cli::try_parse_from([
            "todo-graph-mcp",
            "--database",
            "x.db",
            "chain",
            "7",
            "--direction",
            "upstream",
        ])
        .unwrap();

        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
        match cli.command {
            Some(Command::Chain { item_id, direction }) => {
                assert_eq!(item_id, 7);
                assert_eq!(direction, "upstream");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["todo-graph-mcp", "ready", "--project-dir", "proj", "-v"])
            .unwrap();
        assert!(matches!(cli.command, Some(Command::Ready)));
        assert_eq!(cli.project_dir, Some(PathBuf::from("proj")));
        assert!(cli.verbose);
    }
}
