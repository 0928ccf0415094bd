//! Error taxonomy shared by every transport and tool family.

use serde::{Deserialize, Serialize};

/// Wire-level error category attached to every failed envelope.
///
/// The serialized names are part of the protocol surface; callers match on
/// them, so they never change spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "UnknownToolError")]
    UnknownTool,
    #[serde(rename = "DuplicateToolError")]
    DuplicateTool,
    #[serde(rename = "MissingParameterError")]
    MissingParameter,
    #[serde(rename = "InvalidParameterTypeError")]
    InvalidParameterType,
    #[serde(rename = "UnexpectedParameterError")]
    UnexpectedParameter,
    #[serde(rename = "UpstreamUnavailable")]
    UpstreamUnavailable,
    #[serde(rename = "UpstreamRejected")]
    UpstreamRejected,
    #[serde(rename = "Timeout")]
    Timeout,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    /// Validation-class errors are resolvable by the caller correcting the
    /// request and are never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool
                | Self::DuplicateTool
                | Self::MissingParameter
                | Self::InvalidParameterType
                | Self::UnexpectedParameter
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "UnknownToolError",
            Self::DuplicateTool => "DuplicateToolError",
            Self::MissingParameter => "MissingParameterError",
            Self::InvalidParameterType => "InvalidParameterTypeError",
            Self::UnexpectedParameter => "UnexpectedParameterError",
            Self::UpstreamUnavailable => "UpstreamUnavailable",
            Self::UpstreamRejected => "UpstreamRejected",
            Self::Timeout => "Timeout",
            Self::Internal => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry-phase errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool already registered: {name}")]
    DuplicateTool { name: String },

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTool { .. } => ErrorKind::DuplicateTool,
            Self::UnknownTool { .. } => ErrorKind::UnknownTool,
        }
    }
}

/// Request-validation errors. Produced before the handler runs; the handler
/// is never invoked once one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("parameter {name} expects {expected}, got {actual}")]
    InvalidParameterType {
        name: String,
        expected: &'static str,
        actual: String,
    },

    #[error("unexpected parameter: {name}")]
    UnexpectedParameter { name: String },

    #[error("arguments must be a JSON object")]
    ArgumentsNotAnObject,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::InvalidParameterType { .. } => ErrorKind::InvalidParameterType,
            Self::UnexpectedParameter { .. } => ErrorKind::UnexpectedParameter,
            Self::ArgumentsNotAnObject => ErrorKind::InvalidParameterType,
        }
    }
}

/// Failures surfaced by handlers. The dispatcher maps each variant onto the
/// wire taxonomy; handlers pick the variant, never the wire string.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Upstream unreachable, or the credential for this tool family is not
    /// configured.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Upstream answered with a 4xx or a business-level rejection. Also used
    /// for domain errors in locally computed tools.
    #[error("upstream rejected request: {0}")]
    Rejected(String),

    /// Anything unexpected inside the handler itself.
    #[error("internal handler error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::Rejected(_) => ErrorKind::UpstreamRejected,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Classify an upstream HTTP failure: transport-level problems are
    /// `Unavailable`, status errors are `Rejected` for 4xx and `Unavailable`
    /// for 5xx.
    pub fn from_http(err: HttpFailure) -> Self {
        match err {
            HttpFailure::Transport(msg) => Self::Unavailable(msg),
            HttpFailure::Status { code, body } if code < 500 => {
                Self::Rejected(format!("HTTP {code}: {body}"))
            }
            HttpFailure::Status { code, body } => {
                Self::Unavailable(format!("HTTP {code}: {body}"))
            }
        }
    }
}

/// Transport-agnostic description of an upstream HTTP failure. Keeps the
/// HTTP client crate out of core's dependency graph.
#[derive(Debug)]
pub enum HttpFailure {
    Transport(String),
    Status { code: u16, body: String },
}
