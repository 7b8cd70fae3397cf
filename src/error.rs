//! Error types for aztarna.
//!
//! Uses `thiserror` for ergonomic error definitions. Errors are split by how
//! far they are allowed to travel: [`ProbeError`] stays local to one target,
//! [`TargetError`] and [`ConfigError`] fail fast before any probing starts,
//! and [`ScanError`] aborts a whole batch.

use std::path::PathBuf;
use thiserror::Error;

/// Transport-level failure while probing a single target.
///
/// Never escalated beyond the target it belongs to.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Connection timed out")]
    Timeout,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Host unreachable")]
    HostUnreachable,

    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Protocol mismatch: {0}")]
    Protocol(String),

    #[error("Probe panicked: {0}")]
    Panicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Violations of the host topology invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("node name cannot be empty")]
    EmptyNodeName,

    #[error("node '{0}' already exists on this host")]
    DuplicateNode(String),
}

/// Errors raised while building the target list.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("invalid network range: {0}")]
    InvalidRange(String),

    #[error("network range too large: {0} addresses (max: {1})")]
    RangeTooLarge(u64, u64),

    #[error("failed to read targets from {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read targets: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid scanner configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("rate must be a positive integer, got {0}")]
    InvalidRate(usize),

    #[error("at least one port must be configured")]
    NoPorts,

    #[error("probes per second must be positive")]
    InvalidPacing,

    #[error("failed to read settings from {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),
}

/// Engine-fatal errors. The batch is aborted.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduler unavailable: {0}")]
    Scheduler(String),
}

/// Errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for a single probe.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result type alias for target population.
pub type TargetResult<T> = Result<T, TargetError>;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for scan runs.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
