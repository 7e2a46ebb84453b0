#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod batch;
mod config;
mod dataset;
mod errors;
mod exported;
mod extract;
mod field;
mod locator;
mod nodal;
mod project;
mod provider;
mod record;
mod report;
mod steps;
mod vector;
mod writer;

pub use batch::{
    process_artifact, ArtifactResult, BatchDriver, BatchOutcome, ExtractionPlan, RunState,
    RunSummary, SkipReason, SkippedArtifact,
};
pub use config::{
    CsvOptions, HarvestConfig, DEFAULT_ARTIFACT_TIMEOUT_SECS, DEFAULT_EXTENSION, DEFAULT_MARKER,
};
pub use dataset::{merge_tables, Dataset};
pub use errors::{BatchError, ConfigError, FieldError, OutputError, ProviderError};
pub use exported::{ExportedResultProvider, ExportedResultSet};
pub use extract::{
    QuantityResult, StepExtraction, StepExtractor, StepQuantities, REACTION_FORCE_FALLBACK,
};
pub use field::Field;
pub use locator::{ArtifactLocator, SearchScope};
pub use nodal::{nodal_records, NodalDataset, NodalRecord};
pub use project::{resolve_project_name, UNKNOWN_PROJECT};
pub use provider::{Location, MeshInfo, QuantityKind, ResultProvider, ResultSession, Step};
pub use record::{assemble_record, Artifact, ArtifactTable, Record};
pub use report::render_summary;
pub use steps::StepEnumerator;
pub use vector::{Displacement, Force};
pub use writer::{column_name, write_table, write_table_to_path, Table};
