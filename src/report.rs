//! Human-readable end of run summary.

use std::fmt::Write;

use crate::batch::{RunState, RunSummary};

/// Render the counts of a run: artifacts found, skipped with reasons, rows produced.
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut output = String::new();

    // Where the search ran and how long it took, so runs can be compared.
    writeln!(
        &mut output,
        "Result extraction under {} ({:.1} s)",
        summary.root.display(),
        summary.elapsed.as_secs_f64()
    )
    .expect("writing to string cannot fail");

    writeln!(
        &mut output,
        "Artifacts: {} found, {} processed, {} skipped",
        summary.artifacts_found,
        summary.processed,
        summary.skipped.len()
    )
    .expect("writing to string cannot fail");

    // Every skipped artifact with its reason; these are the files to inspect
    // or re-export by hand.
    for skipped in &summary.skipped {
        writeln!(
            &mut output,
            "  skipped {}: {}",
            skipped.artifact.path.display(),
            skipped.reason
        )
        .expect("writing to string cannot fail");
    }

    // Zero rows is still a successful run, so say explicitly that nothing
    // could be extracted rather than leaving an empty count.
    match summary.state() {
        RunState::Completed(rows) => {
            writeln!(&mut output, "Rows produced: {rows}").expect("writing to string cannot fail");
        }
        RunState::CompletedEmpty => {
            output.push_str("Rows produced: 0 (no data could be extracted)\n");
        }
    }

    if let Some(nodal_rows) = summary.nodal_rows {
        writeln!(&mut output, "Nodal rows produced: {nodal_rows}")
            .expect("writing to string cannot fail");
    }

    if summary.lingering_sessions > 0 {
        writeln!(
            &mut output,
            "Timed out sessions still running: {}",
            summary.lingering_sessions
        )
        .expect("writing to string cannot fail");
    }

    match &summary.output {
        Some(path) => writeln!(&mut output, "Dataset written to {}", path.display())
            .expect("writing to string cannot fail"),
        None => output.push_str("Dataset not written\n"),
    }
    if let Some(path) = &summary.nodal_output {
        writeln!(&mut output, "Nodal rows written to {}", path.display())
            .expect("writing to string cannot fail");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{SkipReason, SkippedArtifact};
    use crate::record::Artifact;
    use std::path::PathBuf;

    #[test]
    fn lists_skipped_artifacts_and_row_count() {
        let summary = RunSummary {
            root: PathBuf::from("/data"),
            artifacts_found: 3,
            processed: 2,
            skipped: vec![SkippedArtifact {
                artifact: Artifact::discovered(
                    PathBuf::from("/data/BROKEN/3_SIMULACION/file.rst"),
                    "3_SIMULACION",
                ),
                reason: SkipReason::Unreadable("bad header".into()),
            }],
            rows: 27,
            output: Some(PathBuf::from("dataset.csv")),
            ..RunSummary::default()
        };
        let report = render_summary(&summary);
        assert!(report.contains("3 found, 2 processed, 1 skipped"));
        assert!(report.contains("skipped /data/BROKEN/3_SIMULACION/file.rst: unreadable: bad header"));
        assert!(report.contains("Rows produced: 27"));
        assert!(report.contains("Dataset written to dataset.csv"));
    }

    #[test]
    fn mentions_lingering_sessions_only_when_present() {
        let summary = RunSummary {
            lingering_sessions: 2,
            ..RunSummary::default()
        };
        assert!(render_summary(&summary).contains("Timed out sessions still running: 2"));
        assert!(!render_summary(&RunSummary::default()).contains("still running"));
    }

    #[test]
    fn reports_empty_runs() {
        let report = render_summary(&RunSummary::default());
        assert!(report.contains("Rows produced: 0"));
        assert!(report.contains("Dataset not written"));
    }
}
