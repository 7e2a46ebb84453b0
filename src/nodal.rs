//! Node by node displacement export.
//!
//! Besides the per-step aggregates a run can keep every nodal displacement
//! vector, giving one row per project, node and step.

use crate::field::Field;
use crate::provider::Step;
use crate::vector::Displacement;

/// Displacement of one node at one step.
#[derive(Clone, Debug, PartialEq)]
pub struct NodalRecord {
    /// Project identifier.
    pub project: String,
    /// Node id from the provider's scoping.
    pub node_id: u64,
    /// Step the displacement belongs to.
    pub step: Step,
    /// Displacement vector.
    pub displacement: Displacement,
}

/// Nodal rows of every artifact of a run, in artifact, step then node order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodalDataset {
    /// Rows.
    pub records: Vec<NodalRecord>,
}

impl NodalDataset {
    /// Concatenate per-artifact nodal rows.
    #[must_use]
    pub fn concat(parts: Vec<Vec<NodalRecord>>) -> Self {
        Self {
            records: parts.into_iter().flatten().collect(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Rows for every node of a displacement field.
///
/// A field that is not a three component vector field contributes nothing.
#[must_use]
pub fn nodal_records(project: &str, step: Step, field: &Field) -> Vec<NodalRecord> {
    match field.displacements() {
        Ok(displacements) => displacements
            .into_iter()
            .map(|(node_id, displacement)| NodalRecord {
                project: project.to_owned(),
                node_id,
                step,
                displacement,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(step = step.index, error = %e, "Skipping nodal rows for step");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_per_node() {
        let field = Field::vectors(vec![7, 9], &[[0.1, 0.0, 0.0], [0.0, -0.2, 0.3]])
            .expect("valid field");
        let records = nodal_records("SPRING", Step::new(4, 2.0), &field);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].node_id, 9);
        assert_eq!(records[1].displacement, Displacement::new(0.0, -0.2, 0.3));
        assert_eq!(records[1].step, Step::new(4, 2.0));
    }

    #[test]
    fn scalar_field_contributes_nothing() {
        let field = Field::scalar(vec![1], vec![1.0]).expect("valid field");
        assert!(nodal_records("SPRING", Step::synthetic(), &field).is_empty());
    }

    #[test]
    fn concat_keeps_part_order() {
        let field = Field::vectors(vec![1], &[[1.0, 0.0, 0.0]]).expect("valid field");
        let first = nodal_records("A", Step::synthetic(), &field);
        let second = nodal_records("B", Step::synthetic(), &field);
        let dataset = NodalDataset::concat(vec![first, second]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].project, "A");
        assert_eq!(dataset.records[1].project, "B");
    }
}
