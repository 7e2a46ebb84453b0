use std::fs;

use feadataset::{render_summary, BatchDriver, ExportedResultProvider, HarvestConfig};

const RESULT_SET: &str = r#"{
    "mesh": { "nodes": 2, "elements": 1 },
    "time_steps": [0.5, 1.0],
    "steps": [
        {
            "displacement": { "node_ids": [1, 2], "values": [[0, 0, 0], [0, 0.003, 0.004]] },
            "stress": { "node_ids": [1, 2], "values": [120.0e6, 80.0e6] },
            "reaction_force": { "node_ids": [1], "values": [[0, 0, -500]] }
        },
        {
            "displacement": { "node_ids": [1, 2], "values": [[0, 0, 0], [0, 0.006, 0.008]] },
            "stress": { "node_ids": [1, 2], "values": [240.0e6, 160.0e6] },
            "reaction_force": { "node_ids": [1], "values": [[0, 0, -1000]] }
        }
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Lay out a project tree with one exported result set
    let root = tempfile::tempdir()?;
    let simulation = root.path().join("SPRING_A").join("3_SIMULACION");
    fs::create_dir_all(&simulation)?;
    fs::write(simulation.join("file.rst"), RESULT_SET)?;

    // Extract every step into a dataset next to it
    let output = root.path().join("dataset.csv");
    let driver = BatchDriver::new(ExportedResultProvider::new(), HarvestConfig::default());
    let summary = driver.run_to_file(root.path(), &output, None)?;

    // Show what was produced
    println!("{}", render_summary(&summary));
    print!("{}", fs::read_to_string(&output)?);

    Ok(())
}
