//! Error types for resource graph construction

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Build input missing or invalid
    E001InvalidConfiguration,
    /// E002: Custom data identifier regex does not compile
    E002MalformedPattern,
    /// E003: Constructed graph violates a structural invariant
    E003InvalidGraph,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidConfiguration => "E001",
            Self::E002MalformedPattern => "E002",
            Self::E003InvalidGraph => "E003",
        }
    }
}

/// Errors that abort a graph build. No partial graph is ever returned.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required configuration value is missing or empty
    #[error("[{code}] Invalid configuration: {message}")]
    Configuration { code: &'static str, message: String },

    /// A data identifier pattern failed to compile
    #[error("[{code}] Malformed pattern for data identifier '{identifier}': {source}")]
    MalformedPattern {
        code: &'static str,
        identifier: String,
        #[source]
        source: regex::Error,
    },

    /// The assembled graph failed validation
    #[error("[{code}] Invalid resource graph: {message}")]
    InvalidGraph { code: &'static str, message: String },
}

impl BuildError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            code: ErrorCode::E001InvalidConfiguration.as_str(),
            message: message.into(),
        }
    }

    pub fn malformed_pattern(identifier: impl Into<String>, source: regex::Error) -> Self {
        Self::MalformedPattern {
            code: ErrorCode::E002MalformedPattern.as_str(),
            identifier: identifier.into(),
            source,
        }
    }

    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph {
            code: ErrorCode::E003InvalidGraph.as_str(),
            message: message.into(),
        }
    }

    /// Stable error code, e.g. "E001"
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { code, .. }
            | Self::MalformedPattern { code, .. }
            | Self::InvalidGraph { code, .. } => code,
        }
    }
}

/// Result type alias for BuildError
pub type Result<T> = std::result::Result<T, BuildError>;
