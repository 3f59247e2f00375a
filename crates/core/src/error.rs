use thiserror::Error;

/// Raised while registering a tool. A malformed descriptor never reaches a caller.
#[derive(Debug, Error, PartialEq)]
pub enum RegistrationError {
    #[error("tool name must not be empty")]
    EmptyToolName,
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("tool '{tool}' has a parameter with an empty name")]
    EmptyParamName { tool: String },
    #[error("tool '{tool}' declares parameter '{param}' more than once")]
    DuplicateParam { tool: String, param: String },
    #[error("tool '{tool}' parameter '{param}' has a default that is not a {expected}")]
    DefaultTypeMismatch {
        tool: String,
        param: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("missing required argument '{0}'")]
    Missing(String),
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
    #[error("argument '{name}' must be a {expected}")]
    WrongType { name: String, expected: &'static str },
}

#[derive(Debug, Error, PartialEq)]
pub enum CallError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for '{tool}': {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: ArgumentError,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{} must be set in the environment or .env file", .names.join(" and "))]
    Missing { names: Vec<String> },
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.to_string())
    }
}

impl UpstreamError {
    /// The upstream status code, when the failure was a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw text the upstream sent back, or the transport message.
    pub fn detail(&self) -> &str {
        match self {
            UpstreamError::Status { body, .. } => body,
            UpstreamError::Transport(msg) | UpstreamError::Decode(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_lists_every_name() {
        let err = ConfigError::Missing {
            names: vec!["AZURE_DEVOPS_ORG".into(), "AZURE_DEVOPS_PAT".into()],
        };
        assert_eq!(
            err.to_string(),
            "AZURE_DEVOPS_ORG and AZURE_DEVOPS_PAT must be set in the environment or .env file"
        );
    }

    #[test]
    fn status_error_exposes_code_and_body() {
        let err = UpstreamError::Status {
            status: 403,
            body: "forbidden".into(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.detail(), "forbidden");
        assert_eq!(UpstreamError::Transport("reset".into()).status(), None);
    }
}
