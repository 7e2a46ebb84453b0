//! Dataset rows and the artifacts they come from.

use std::path::{Path, PathBuf};

use crate::extract::{QuantityResult, StepQuantities};
use crate::project::resolve_project_name;
use crate::provider::{QuantityKind, Step};

/// One discovered result file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Location of the result file.
    pub path: PathBuf,
    /// Project the file belongs to.
    pub project: String,
}

impl Artifact {
    /// Describe the artifact at `path`, naming its project from `marker`.
    #[must_use]
    pub fn discovered(path: PathBuf, marker: &str) -> Self {
        let project = resolve_project_name(&path, marker);
        Self { path, project }
    }
}

/// One row of the dataset: the aggregates of one step of one artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Project identifier.
    pub project: String,
    /// Step the aggregates belong to.
    pub step: Step,
    /// Largest nodal displacement magnitude.
    pub displacement: QuantityResult,
    /// Largest nodal stress value.
    pub stress: QuantityResult,
    /// Norm of the net reaction force.
    pub reaction_force: QuantityResult,
    /// Result file the row was extracted from.
    pub source: PathBuf,
}

impl Record {
    /// Aggregate of `kind`.
    #[must_use]
    pub fn quantity(&self, kind: QuantityKind) -> QuantityResult {
        match kind {
            QuantityKind::Displacement => self.displacement,
            QuantityKind::Stress => self.stress,
            QuantityKind::ReactionForce => self.reaction_force,
        }
    }

    /// Mark the aggregate of `kind` as unavailable.
    pub(crate) fn clear(&mut self, kind: QuantityKind) {
        match kind {
            QuantityKind::Displacement => self.displacement = QuantityResult::Unavailable,
            QuantityKind::Stress => self.stress = QuantityResult::Unavailable,
            QuantityKind::ReactionForce => self.reaction_force = QuantityResult::Unavailable,
        }
    }
}

/// Package the aggregates of one step into a row.
#[must_use]
pub fn assemble_record(
    project: &str,
    step: Step,
    quantities: StepQuantities,
    source: &Path,
) -> Record {
    Record {
        project: project.to_owned(),
        step,
        displacement: quantities.displacement,
        stress: quantities.stress,
        reaction_force: quantities.reaction_force,
        source: source.to_path_buf(),
    }
}

/// Rows extracted from one artifact, with the quantity columns it provides.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactTable {
    /// Quantity columns populated by this artifact.
    pub columns: Vec<QuantityKind>,
    /// Rows in step order.
    pub records: Vec<Record>,
}

impl ArtifactTable {
    /// Create an empty table providing `columns`.
    #[must_use]
    pub fn new(columns: &[QuantityKind]) -> Self {
        Self {
            columns: columns.to_vec(),
            records: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_provenance_and_aggregates() {
        let quantities = StepQuantities {
            displacement: QuantityResult::Value(1.5),
            stress: QuantityResult::Value(300.0),
            reaction_force: QuantityResult::Fallback(0.0),
        };
        let source = Path::new("/data/SPRING/3_SIMULACION/file.rst");
        let record = assemble_record("SPRING", Step::new(2, 0.5), quantities, source);

        assert_eq!(record.project, "SPRING");
        assert_eq!(record.step, Step::new(2, 0.5));
        assert_eq!(record.quantity(QuantityKind::Stress), QuantityResult::Value(300.0));
        assert_eq!(record.reaction_force, QuantityResult::Fallback(0.0));
        assert_eq!(record.source, source);
    }

    #[test]
    fn discovered_artifact_resolves_project() {
        let artifact = Artifact::discovered(
            PathBuf::from("/data/SPRING/3_SIMULACION/file.rst"),
            "3_SIMULACION",
        );
        assert_eq!(artifact.project, "SPRING");
    }
}
