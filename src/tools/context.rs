//! Per-request context passed to tool functions.

use crate::logging::Logger;

/// Per-call context: the logger mutations report through.
#[derive(Clone, Default)]
pub struct ToolContext {
    pub logger: Logger,
}

impl ToolContext {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}
