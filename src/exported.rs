//! Result provider for result sets exported to JSON.
//!
//! The document layout is:
//!
//! ```json
//! {
//!   "mesh": { "nodes": 3, "elements": 1 },
//!   "time_steps": [0.5, 1.0],
//!   "steps": [
//!     {
//!       "displacement": { "node_ids": [1, 2, 3], "values": [[0, 0, 0], [0, 0, 1], [0, 1, 0]] },
//!       "stress": { "node_ids": [1, 2, 3], "values": [10.0, 12.5, 3.0] },
//!       "reaction_force": { "node_ids": [1], "values": [[0, 0, -5]] }
//!     }
//!   ]
//! }
//! ```
//!
//! `steps` is indexed by the one-based step index. A missing `mesh` or
//! `time_steps` key, or a missing quantity, is reported as the matching
//! [`ProviderError`] so the pipeline can degrade.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::ProviderError;
use crate::field::Field;
use crate::provider::{Location, MeshInfo, QuantityKind, ResultProvider, ResultSession, Step};

/// Provider reading exported JSON result sets from disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExportedResultProvider;

impl ExportedResultProvider {
    /// Create the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ResultProvider for ExportedResultProvider {
    type Session = ExportedResultSet;

    fn open(&self, path: &Path) -> Result<Self::Session, ProviderError> {
        let unreadable = |reason: String| ProviderError::ArtifactUnreadable {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| unreadable(e.to_string()))
    }
}

/// An exported result set loaded in memory.
#[derive(Clone, Debug, Deserialize)]
pub struct ExportedResultSet {
    /// Mesh counts, absent when the mesh was not exported.
    mesh: Option<ExportedMesh>,
    /// Time or load value of every step, absent for static exports.
    time_steps: Option<Vec<f64>>,
    /// Fields per step, in step order.
    #[serde(default)]
    steps: Vec<ExportedStep>,
}

/// Mesh counts as exported.
#[derive(Clone, Copy, Debug, Deserialize)]
struct ExportedMesh {
    /// Number of nodes.
    nodes: usize,
    /// Number of elements.
    elements: usize,
}

/// Fields stored for one step; absent fields were not exported.
#[derive(Clone, Debug, Deserialize)]
struct ExportedStep {
    /// Nodal displacement vectors.
    displacement: Option<ExportedField>,
    /// Nodal stress values.
    stress: Option<ExportedField>,
    /// Nodal reaction force vectors.
    reaction_force: Option<ExportedField>,
}

/// One exported field.
#[derive(Clone, Debug, Deserialize)]
struct ExportedField {
    /// Node of each row.
    node_ids: Vec<u64>,
    /// Row data.
    values: ExportedValues,
}

/// Scalar or multi-component values.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ExportedValues {
    /// One number per node.
    Scalars(Vec<f64>),
    /// One row of components per node.
    Rows(Vec<Vec<f64>>),
}

impl ExportedField {
    /// Convert to a validated [`Field`].
    fn to_field(&self) -> Result<Field, ProviderError> {
        let field = match &self.values {
            ExportedValues::Scalars(values) => Field::scalar(self.node_ids.clone(), values.clone()),
            ExportedValues::Rows(rows) => Field::from_rows(self.node_ids.clone(), rows),
        }?;
        Ok(field)
    }
}

impl ExportedResultSet {
    /// Parse a result set from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the parser error when the document does not match the layout.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whether any step of the result set carries reaction forces.
    fn has_reaction_forces(&self) -> bool {
        self.steps.iter().any(|step| step.reaction_force.is_some())
    }
}

impl ResultSession for ExportedResultSet {
    fn mesh_info(&self) -> Result<MeshInfo, ProviderError> {
        self.mesh
            .map(|mesh| MeshInfo {
                nodes: mesh.nodes,
                elements: mesh.elements,
            })
            .ok_or_else(|| ProviderError::MeshUnavailable("no mesh section".into()))
    }

    fn time_steps(&self) -> Result<Vec<f64>, ProviderError> {
        self.time_steps
            .clone()
            .ok_or_else(|| ProviderError::EnumerationUnsupported("no time_steps section".into()))
    }

    fn quantity(
        &self,
        kind: QuantityKind,
        step: &Step,
        location: Location,
    ) -> Result<Field, ProviderError> {
        let Location::Nodal = location;
        if kind == QuantityKind::ReactionForce && !self.has_reaction_forces() {
            return Err(ProviderError::ReactionForceUnsupported);
        }
        let missing = |reason: String| ProviderError::QuantityUnavailable { kind, reason };
        let exported = step
            .index
            .checked_sub(1)
            .and_then(|position| self.steps.get(position))
            .ok_or_else(|| missing(format!("step {} is not stored", step.index)))?;
        let field = match kind {
            QuantityKind::Displacement => exported.displacement.as_ref(),
            QuantityKind::Stress => exported.stress.as_ref(),
            QuantityKind::ReactionForce => exported.reaction_force.as_ref(),
        };
        field
            .ok_or_else(|| missing(format!("not stored for step {}", step.index)))?
            .to_field()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "mesh": { "nodes": 2, "elements": 1 },
        "time_steps": [0.5, 1.0],
        "steps": [
            {
                "displacement": { "node_ids": [1, 2], "values": [[0, 0, 0], [0, 3, 4]] },
                "stress": { "node_ids": [1, 2], "values": [1.5, 2.5] }
            },
            {
                "displacement": { "node_ids": [1, 2], "values": [[0, 0, 0], [0, 6, 8]] },
                "reaction_force": { "node_ids": [1], "values": [[0, 0, -5]] }
            }
        ]
    }"#;

    #[test]
    fn reads_mesh_and_step_axis() {
        let set = ExportedResultSet::from_json(DOCUMENT).expect("valid document");
        assert_eq!(
            set.mesh_info().expect("mesh present"),
            MeshInfo {
                nodes: 2,
                elements: 1
            }
        );
        assert_eq!(set.time_steps().expect("axis present"), vec![0.5, 1.0]);
    }

    #[test]
    fn serves_fields_by_step_index() {
        let set = ExportedResultSet::from_json(DOCUMENT).expect("valid document");
        let stress = set
            .quantity(QuantityKind::Stress, &Step::new(1, 0.5), Location::Nodal)
            .expect("stress stored at step 1");
        assert_eq!(stress.components(), 1);
        assert_eq!(stress.max_value(), Some(2.5));

        let error = set
            .quantity(QuantityKind::Stress, &Step::new(2, 1.0), Location::Nodal)
            .expect_err("stress missing at step 2");
        assert!(matches!(
            error,
            ProviderError::QuantityUnavailable {
                kind: QuantityKind::Stress,
                ..
            }
        ));
    }

    #[test]
    fn missing_sections_map_to_named_failures() {
        let set = ExportedResultSet::from_json(r#"{ "steps": [ {} ] }"#).expect("valid document");
        assert!(matches!(
            set.mesh_info(),
            Err(ProviderError::MeshUnavailable(_))
        ));
        assert!(matches!(
            set.time_steps(),
            Err(ProviderError::EnumerationUnsupported(_))
        ));
        assert_eq!(
            set.quantity(QuantityKind::ReactionForce, &Step::synthetic(), Location::Nodal),
            Err(ProviderError::ReactionForceUnsupported)
        );
    }

    #[test]
    fn unparsable_file_is_unreadable() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("file.rst");
        fs::write(&path, "not a result set").expect("write fixture");
        let error = ExportedResultProvider::new()
            .open(&path)
            .expect_err("garbage rejected");
        assert!(matches!(error, ProviderError::ArtifactUnreadable { .. }));
    }
}
