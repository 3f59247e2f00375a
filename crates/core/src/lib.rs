pub mod config;
pub mod context;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod tool;
pub mod upstream;

pub use config::Environment;
pub use context::{LogLevel, LogRecord, ToolContext};
pub use error::{ArgumentError, CallError, ConfigError, RegistrationError, UpstreamError};
pub use outcome::{ErrorEnvelope, ToolOutcome};
pub use registry::ToolRegistry;
pub use tool::{Arguments, ParamDescriptor, ParamType, Tool, ToolDescriptor, ToolHandler};
pub use upstream::{http_client, send, UpstreamResponse};
