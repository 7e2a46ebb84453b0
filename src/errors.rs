//! Error types produced while discovering, querying and exporting result sets.

use std::path::PathBuf;

use thiserror::Error;

use crate::provider::QuantityKind;

/// Error returned by a result provider or one of its sessions.
///
/// Only [`ProviderError::ArtifactUnreadable`] and [`ProviderError::MeshUnavailable`]
/// stop the processing of an artifact. Every other variant is converted into a
/// degraded value by the step enumerator or the step extractor.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProviderError {
    /// Returned when the provider cannot parse the artifact at all.
    #[error("artifact {} is unreadable: {reason}", path.display())]
    ArtifactUnreadable {
        /// Location of the rejected artifact.
        path: PathBuf,
        /// Provider supplied description of the failure.
        reason: String,
    },
    /// Returned when the mesh of an opened artifact cannot be read.
    #[error("mesh is unavailable: {0}")]
    MeshUnavailable(String),
    /// Returned when the artifact exposes no time or load step axis.
    #[error("step enumeration is unsupported: {0}")]
    EnumerationUnsupported(String),
    /// Returned when one quantity cannot be computed for the requested step.
    #[error("{kind} is unavailable: {reason}")]
    QuantityUnavailable {
        /// Quantity that was requested.
        kind: QuantityKind,
        /// Provider supplied description of the failure.
        reason: String,
    },
    /// Returned when the artifact carries no reaction force results.
    #[error("reaction forces are not supported by this artifact")]
    ReactionForceUnsupported,
    /// Returned when the provider hands back a malformed field.
    #[error("malformed field: {0}")]
    Field(#[from] FieldError),
}

/// Error returned when building or reducing a [`Field`](crate::Field).
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum FieldError {
    /// Returned when the number of node ids does not match the number of rows.
    #[error("{ids} node ids supplied for {rows} rows of data")]
    ScopingMismatch {
        /// Number of node ids in the scoping.
        ids: usize,
        /// Number of data rows.
        rows: usize,
    },
    /// Returned when the rows of a field do not share one component count.
    #[error("row {row} has {found} components, expected {expected}")]
    RaggedRows {
        /// Zero-based index of the offending row.
        row: usize,
        /// Component count of the first row.
        expected: usize,
        /// Component count of the offending row.
        found: usize,
    },
    /// Returned when a vector reduction receives a field without three components.
    #[error("expected a three component vector field, found {components} components")]
    NotAVectorField {
        /// Component count of the supplied field.
        components: usize,
    },
}

/// Error returned when the run configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when the discovery root cannot be read as a directory.
    #[error("root directory {} cannot be read", path.display())]
    UnreadableRoot {
        /// Root that was supplied.
        path: PathBuf,
        /// Underlying file system error, when one was reported.
        #[source]
        source: Option<std::io::Error>,
    },
    /// Returned when a configuration file cannot be opened.
    #[error("configuration file {} cannot be read", path.display())]
    UnreadableFile {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying file system error.
        #[source]
        source: std::io::Error,
    },
    /// Returned when a configuration file is not valid JSON for this schema.
    #[error("configuration file {} is invalid", path.display())]
    InvalidFile {
        /// Location of the configuration file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// Returned when the delimited-text options are inconsistent.
    #[error("invalid CSV options: {0}")]
    InvalidCsvOptions(String),
    /// Returned when a numeric setting is out of range.
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting {
        /// Name of the setting.
        name: &'static str,
        /// Reason the value was rejected.
        reason: String,
    },
    /// Returned when the worker pool cannot be created.
    #[error("worker pool cannot be started: {0}")]
    WorkerPool(String),
}

/// Error returned when a table cannot be written to its destination.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Returned when the destination directory cannot be created.
    #[error("output directory {} cannot be created", path.display())]
    CreateDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying file system error.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the destination file cannot be written.
    #[error("output file {} cannot be written", path.display())]
    WriteFailure {
        /// Destination file.
        path: PathBuf,
        /// Underlying writer error.
        #[source]
        source: csv::Error,
    },
}

/// Fatal error returned by a batch run.
///
/// Per-artifact and per-quantity failures never surface here; they are
/// recorded in the [`RunSummary`](crate::RunSummary) instead.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The run was misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The dataset could not be written.
    #[error(transparent)]
    Output(#[from] OutputError),
}
