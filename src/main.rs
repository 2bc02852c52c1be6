//! Todo Graph MCP Server
//!
//! An MCP server for an agent's todo list: items, blocking dependencies
//! between them, the ready list and transitive dependency chains.

use anyhow::Result;
use clap::Parser;
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use todo_graph_mcp::cli::{Cli, Command};
use todo_graph_mcp::config::{Config, ensure_db_dir};
use todo_graph_mcp::db::Database;
use todo_graph_mcp::graph::ChainDirection;
use todo_graph_mcp::logging::{LogLevelFilter, Logger};
use todo_graph_mcp::tools::{ToolContext, ToolHandler};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const INSTRUCTIONS: &str = "\
Todo list with blocking dependencies. Start: get_ready_items() \u{2192} update_item(status=\"in_progress\") \u{2192} work \u{2192} run tests \u{2192} mark_item_done().
Use assistant_workflow_guide() for the full workflow.";

/// MCP server handler.
#[derive(Clone)]
struct TodoGraphServer {
    tool_handler: Arc<ToolHandler>,
    /// Client-adjustable level for log notifications (logging/setLevel).
    level_filter: Arc<LogLevelFilter>,
}

impl TodoGraphServer {
    fn new(db: Arc<Database>, level_filter: Arc<LogLevelFilter>) -> Self {
        Self {
            tool_handler: Arc::new(ToolHandler::new(db)),
            level_filter,
        }
    }
}

impl ServerHandler for TodoGraphServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "todo-graph-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                logging: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn set_level(
        &self,
        request: rmcp::model::SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<(), ErrorData> {
        self.level_filter.set(request.level);
        tracing::info!(level = ?request.level, "Logging level updated via MCP");
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.to_string();

        let logger = Logger::new()
            .with_peer(context.peer.clone())
            .with_level_filter(Arc::clone(&self.level_filter))
            .with_name(format!("tool:{}", tool_name));
        let tool_ctx = ToolContext::new(logger);

        let handler = Arc::clone(&self.tool_handler);
        let args = Value::Object(request.arguments.unwrap_or_default());

        // Tool bodies hold the connection lock for their whole unit of work.
        let result = tokio::task::spawn_blocking(move || handler.dispatch(&tool_name, args, &tool_ctx))
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;

        let is_error = result.get("error").is_some();
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;

        Ok(CallToolResult {
            content: vec![Content::text(text)],
            is_error: is_error.then_some(true),
            meta: None,
            structured_content: None,
        })
    }
}

fn init_logging(log: &str, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    match log {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(cli.project_dir.as_deref())?,
    };

    let db_path = config.resolve_db_path(cli.database.as_deref(), cli.project_dir.as_deref());
    ensure_db_dir(&db_path)?;
    let db = Arc::new(Database::open(&db_path)?);
    debug!(db_path = %db_path.display(), "Database opened");

    match cli.command {
        None | Some(Command::Serve) => serve(db, &db_path).await,
        Some(Command::Ready) => {
            let report = db.get_ready_items()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Some(Command::Chain { item_id, direction }) => {
            let direction: ChainDirection = direction.parse()?;
            let chain = db.get_dependency_chain(item_id, direction)?;
            println!("{}", serde_json::to_string_pretty(&chain)?);
            Ok(())
        }
    }
}

async fn serve(db: Arc<Database>, db_path: &Path) -> Result<()> {
    info!(db_path = %db_path.display(), "Starting todo-graph-mcp server");

    let server = TodoGraphServer::new(db, Arc::new(LogLevelFilter::default()));

    info!("Server ready, listening on stdio");
    let transport = stdio();
    let service = server.serve(transport).await?;
    service.waiting().await?;

    Ok(())
}
