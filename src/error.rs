//! Error types for the storage agent
//!
//! Provides structured error types for all agent components and maps each
//! error onto the process exit status contract expected by the hook
//! framework: benign conditions exit 0, everything else exits non-zero and
//! leaves retry to the framework's own redelivery policy.

use thiserror::Error;

/// Unified error type for the agent
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Hook Lifecycle
    // =========================================================================
    #[error("not ready: {0}")]
    NotReady(String),

    #[error("unrecognized hook: {0}")]
    UnrecognizedHook(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("prefer-ipv6 is set but this host has no usable IPv6 stack")]
    Ipv6Unsupported,

    #[error("invalid device pattern {pattern}: {source}")]
    DevicePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    // =========================================================================
    // Collaborator Failures
    // =========================================================================
    #[error("{name} collaborator failed: {source}")]
    Collaborator {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("ring fetch from {url} failed: {source}")]
    RingFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("config write failed for {target}: {reason}")]
    ConfigWrite { target: String, reason: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a hook invocation should report an error to the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expected condition, exit 0 with a log line; the framework will fire
    /// the hook again when the inputs change
    Benign,
    /// Abort the invocation with a non-zero exit; the framework owns retry
    Fatal,
}

impl Error {
    /// Wrap an arbitrary collaborator failure, keeping its source chain
    pub fn collaborator(name: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Error::Collaborator {
            name,
            source: source.into(),
        }
    }

    /// Determine how this error maps onto the exit status contract
    pub fn disposition(&self) -> Disposition {
        match self {
            // Missing relation data and unmapped hooks are part of normal
            // deployment convergence, not failures
            Error::NotReady(_) | Error::UnrecognizedHook(_) => Disposition::Benign,

            // Everything else aborts the invocation before further writes
            _ => Disposition::Fatal,
        }
    }

    /// Check if this error still counts as a successful invocation
    pub fn is_benign(&self) -> bool {
        self.disposition() == Disposition::Benign
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.disposition() {
            Disposition::Benign => 0,
            Disposition::Fatal => 1,
        }
    }
}

/// Result type alias for the agent
pub type Result<T> = std::result::Result<T, Error>;
