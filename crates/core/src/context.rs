use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse an MCP logging level. Levels above `error` collapse into it.
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "debug" => Some(LogLevel::Debug),
            "info" | "notice" => Some(LogLevel::Info),
            "warning" => Some(LogLevel::Warning),
            "error" | "critical" | "alert" | "emergency" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Per-invocation handle given to a tool. Messages logged here are shown to
/// the caller that made the call and mirrored to the process log.
#[derive(Debug)]
pub struct ToolContext {
    tool: String,
    min_level: LogLevel,
    records: Vec<LogRecord>,
}

impl ToolContext {
    pub fn new(tool: impl Into<String>) -> Self {
        Self::with_min_level(tool, LogLevel::Debug)
    }

    pub fn with_min_level(tool: impl Into<String>, min_level: LogLevel) -> Self {
        Self {
            tool: tool.into(),
            min_level,
            records: Vec::new(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Error, message.into());
    }

    pub fn log(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Debug => tracing::debug!(tool = %self.tool, "{}", message),
            LogLevel::Info => tracing::info!(tool = %self.tool, "{}", message),
            LogLevel::Warning => tracing::warn!(tool = %self.tool, "{}", message),
            LogLevel::Error => tracing::error!(tool = %self.tool, "{}", message),
        }

        if level >= self.min_level {
            self.records.push(LogRecord { level, message });
        }
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }
}
