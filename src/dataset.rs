//! Concatenation of per-artifact tables into one dataset.

use crate::provider::QuantityKind;
use crate::record::{ArtifactTable, Record};

/// Rows of every artifact of a run, sharing one set of quantity columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    /// Quantity columns, in canonical order.
    pub columns: Vec<QuantityKind>,
    /// Rows in artifact then step order.
    pub records: Vec<Record>,
}

impl Dataset {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

/// Concatenate artifact tables, preserving artifact then step order.
///
/// The column set is the union of every table's columns. Rows of a table
/// that lacks one of those columns get an unavailable value there instead of
/// failing the merge. An empty input yields an empty dataset.
#[must_use]
pub fn merge_tables(tables: Vec<ArtifactTable>) -> Dataset {
    let mut columns: Vec<QuantityKind> = tables
        .iter()
        .flat_map(|table| table.columns.iter().copied())
        .collect();
    columns.sort_unstable();
    columns.dedup();

    let total = tables.iter().map(ArtifactTable::len).sum();
    let mut records = Vec::with_capacity(total);
    for table in tables {
        let missing: Vec<QuantityKind> = QuantityKind::ALL
            .into_iter()
            .filter(|kind| !table.columns.contains(kind))
            .collect();
        for mut record in table.records {
            for &kind in &missing {
                record.clear(kind);
            }
            records.push(record);
        }
    }

    Dataset { columns, records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{QuantityResult, StepQuantities};
    use crate::provider::Step;
    use crate::record::assemble_record;
    use std::path::Path;

    fn table(project: &str, steps: usize, columns: &[QuantityKind]) -> ArtifactTable {
        let mut table = ArtifactTable::new(columns);
        for index in 1..=steps {
            let quantities = StepQuantities {
                displacement: QuantityResult::Value(index as f64),
                stress: QuantityResult::Value(10.0 * index as f64),
                reaction_force: QuantityResult::Value(1.0),
            };
            table.push(assemble_record(
                project,
                Step::new(index, index as f64),
                quantities,
                Path::new("file.rst"),
            ));
        }
        table
    }

    #[test]
    fn concatenates_in_artifact_then_step_order() {
        let dataset = merge_tables(vec![
            table("A", 3, &QuantityKind::ALL),
            table("B", 2, &QuantityKind::ALL),
        ]);
        assert_eq!(dataset.len(), 5);
        let order: Vec<(&str, usize)> = dataset
            .iter()
            .map(|record| (record.project.as_str(), record.step.index))
            .collect();
        assert_eq!(order, vec![("A", 1), ("A", 2), ("A", 3), ("B", 1), ("B", 2)]);
    }

    #[test]
    fn backfills_columns_missing_from_one_artifact() {
        let dataset = merge_tables(vec![
            table("A", 1, &QuantityKind::ALL),
            table("B", 1, &[QuantityKind::Displacement, QuantityKind::Stress]),
        ]);
        assert_eq!(dataset.columns, QuantityKind::ALL.to_vec());
        assert!(dataset.records[0].reaction_force.is_computed());
        assert_eq!(dataset.records[1].reaction_force, QuantityResult::Unavailable);
        assert!(dataset.records[1].stress.is_computed());
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        let dataset = merge_tables(Vec::new());
        assert!(dataset.is_empty());
        assert!(dataset.columns.is_empty());
    }
}
