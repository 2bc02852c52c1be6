//! MCP-aware logging.
//!
//! Every message goes to `tracing` (stderr/stdout/file, as chosen on the
//! command line). When a request carries an MCP peer, the message is also
//! forwarded to the client as a `notifications/message`, filtered by the
//! level the client set through `logging/setLevel`.

use rmcp::{
    RoleServer,
    model::{LoggingLevel, LoggingMessageNotificationParam},
    service::Peer,
};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;

/// Client-adjustable minimum level, stored as the level's severity rank.
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: LoggingLevel) -> Self {
        Self(AtomicU8::new(severity(level)))
    }

    pub fn set(&self, level: LoggingLevel) {
        self.0.store(severity(level), Ordering::Relaxed);
    }

    pub fn should_log(&self, level: LoggingLevel) -> bool {
        severity(level) >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(LoggingLevel::Info)
    }
}

const LEVELS: [LoggingLevel; 8] = [
    LoggingLevel::Debug,
    LoggingLevel::Info,
    LoggingLevel::Notice,
    LoggingLevel::Warning,
    LoggingLevel::Error,
    LoggingLevel::Critical,
    LoggingLevel::Alert,
    LoggingLevel::Emergency,
];

fn severity(level: LoggingLevel) -> u8 {
    LEVELS.iter().position(|l| *l == level).unwrap_or(0) as u8
}

/// Map an MCP level onto the closest tracing level.
pub fn logging_level_to_tracing(level: LoggingLevel) -> Level {
    match level {
        LoggingLevel::Debug => Level::DEBUG,
        LoggingLevel::Info | LoggingLevel::Notice => Level::INFO,
        LoggingLevel::Warning => Level::WARN,
        LoggingLevel::Error
        | LoggingLevel::Critical
        | LoggingLevel::Alert
        | LoggingLevel::Emergency => Level::ERROR,
    }
}

/// Per-request logger writing to tracing and, if connected, the MCP client.
#[derive(Clone)]
pub struct Logger {
    peer: Option<Peer<RoleServer>>,
    level_filter: Arc<LogLevelFilter>,
    name: Option<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            peer: None,
            level_filter: Arc::new(LogLevelFilter::default()),
            name: None,
        }
    }

    pub fn with_peer(mut self, peer: Peer<RoleServer>) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_level_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.level_filter = filter;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn log(&self, level: LoggingLevel, message: &str) {
        let logger = self.name.as_deref().unwrap_or("todo-graph");
        match logging_level_to_tracing(level) {
            Level::ERROR => tracing::error!(logger = %logger, "{}", message),
            Level::WARN => tracing::warn!(logger = %logger, "{}", message),
            Level::INFO => tracing::info!(logger = %logger, "{}", message),
            Level::DEBUG => tracing::debug!(logger = %logger, "{}", message),
            Level::TRACE => tracing::trace!(logger = %logger, "{}", message),
        }

        if !self.level_filter.should_log(level) {
            return;
        }
        if let Some(ref peer) = self.peer {
            let param = LoggingMessageNotificationParam {
                level,
                logger: self.name.clone(),
                data: json!({ "message": message }),
            };
            let peer = peer.clone();
            tokio::spawn(async move {
                let _ = peer.notify_logging_message(param).await;
            });
        }
    }

    pub fn info(&self, msg: &str) {
        self.log(LoggingLevel::Info, msg);
    }

    pub fn warning(&self, msg: &str) {
        self.log(LoggingLevel::Warning, msg);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
