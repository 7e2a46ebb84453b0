//! Delimited text output of datasets.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::config::CsvOptions;
use crate::dataset::Dataset;
use crate::errors::OutputError;
use crate::nodal::NodalDataset;
use crate::provider::QuantityKind;

/// Anything that can be laid out as a header plus rows of text cells.
pub trait Table {
    /// Column names.
    fn header(&self) -> Vec<&'static str>;

    /// Cells of every row, numbers rendered with `options`.
    fn rows(&self, options: &CsvOptions) -> Vec<Vec<String>>;
}

/// Column name of a quantity aggregate.
#[must_use]
pub fn column_name(kind: QuantityKind) -> &'static str {
    match kind {
        QuantityKind::Displacement => "max_displacement",
        QuantityKind::Stress => "max_stress",
        QuantityKind::ReactionForce => "reaction_force_norm",
    }
}

impl Table for Dataset {
    fn header(&self) -> Vec<&'static str> {
        let mut header = vec!["project", "step", "time"];
        header.extend(self.columns.iter().map(|&kind| column_name(kind)));
        header.push("source");
        header
    }

    fn rows(&self, options: &CsvOptions) -> Vec<Vec<String>> {
        self.iter()
            .map(|record| {
                let mut row = vec![
                    record.project.clone(),
                    record.step.index.to_string(),
                    options.format_number(record.step.time),
                ];
                row.extend(self.columns.iter().map(|&kind| {
                    record
                        .quantity(kind)
                        .value()
                        .map(|value| options.format_number(value))
                        .unwrap_or_default()
                }));
                row.push(record.source.display().to_string());
                row
            })
            .collect()
    }
}

impl Table for NodalDataset {
    fn header(&self) -> Vec<&'static str> {
        vec!["project", "node_id", "step", "time", "ux", "uy", "uz"]
    }

    fn rows(&self, options: &CsvOptions) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| {
                vec![
                    record.project.clone(),
                    record.node_id.to_string(),
                    record.step.index.to_string(),
                    options.format_number(record.step.time),
                    options.format_number(record.displacement.x),
                    options.format_number(record.displacement.y),
                    options.format_number(record.displacement.z),
                ]
            })
            .collect()
    }
}

/// Write `table` to any sink.
///
/// # Errors
///
/// Returns the underlying writer error.
pub fn write_table<T: Table + ?Sized, W: Write>(
    table: &T,
    sink: W,
    options: &CsvOptions,
) -> Result<usize, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter_byte())
        .from_writer(sink);
    writer.write_record(table.header())?;
    let rows = table.rows(options);
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

/// Write `table` to the file at `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns [`OutputError`] when the directory or file cannot be written.
pub fn write_table_to_path<T: Table + ?Sized>(
    table: &T,
    path: &Path,
    options: &CsvOptions,
) -> Result<usize, OutputError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let failure = |source: csv::Error| OutputError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::create(path).map_err(|e| failure(csv::Error::from(e)))?;
    let rows = write_table(table, file, options).map_err(failure)?;
    tracing::info!(path = %path.display(), rows, "Wrote table");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{QuantityResult, StepQuantities};
    use crate::nodal::nodal_records;
    use crate::provider::Step;
    use crate::record::{assemble_record, ArtifactTable};
    use crate::{dataset::merge_tables, field::Field};

    fn dataset() -> Dataset {
        let mut table = ArtifactTable::new(&QuantityKind::ALL);
        table.push(assemble_record(
            "SPRING",
            Step::new(1, 0.5),
            StepQuantities {
                displacement: QuantityResult::Value(1.25),
                stress: QuantityResult::Unavailable,
                reaction_force: QuantityResult::Fallback(0.0),
            },
            Path::new("/data/SPRING/3_SIMULACION/file.rst"),
        ));
        merge_tables(vec![table])
    }

    fn render<T: Table>(table: &T, options: &CsvOptions) -> String {
        let mut buffer = Vec::new();
        write_table(table, &mut buffer, options).expect("in-memory write");
        String::from_utf8(buffer).expect("utf-8 output")
    }

    #[test]
    fn writes_header_and_nullable_cells() {
        let text = render(&dataset(), &CsvOptions::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "project;step;time;max_displacement;max_stress;reaction_force_norm;source"
        );
        assert_eq!(
            lines[1],
            "SPRING;1;0.5;1.25;;0;/data/SPRING/3_SIMULACION/file.rst"
        );
    }

    #[test]
    fn decimal_comma_needs_other_delimiter() {
        let options = CsvOptions {
            delimiter: ';',
            decimal_separator: ',',
            ..CsvOptions::default()
        };
        let text = render(&dataset(), &options);
        assert!(text.contains("SPRING;1;0,5;1,25;"));
    }

    #[test]
    fn empty_dataset_writes_header_only() {
        let dataset = Dataset {
            columns: QuantityKind::ALL.to_vec(),
            records: Vec::new(),
        };
        let text = render(&dataset, &CsvOptions::default());
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn nodal_table_has_one_line_per_node() {
        let field = Field::vectors(vec![3, 4], &[[0.0, 0.0, 0.5], [0.0, 0.0, 1.0]])
            .expect("valid field");
        let nodal = NodalDataset::concat(vec![nodal_records("SPRING", Step::new(2, 1.0), &field)]);
        let text = render(&nodal, &CsvOptions::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "project;node_id;step;time;ux;uy;uz");
        assert_eq!(lines[2], "SPRING;4;2;1;0;0;1");
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("out").join("dataset.csv");
        let rows = write_table_to_path(&dataset(), &path, &CsvOptions::default())
            .expect("file written");
        assert_eq!(rows, 1);
        assert!(path.exists());
    }
}
