use anyhow::{bail, Result};
use std::path::Path;

use issuegraph::store;

pub fn run(dump_dir: &Path, out: &Path) -> Result<()> {
    if !dump_dir.is_dir() {
        bail!("Checkpoint directory {} not found", dump_dir.display());
    }
    let snapshot = store::convert(dump_dir, out)?;
    println!(
        "Converted {} issue(s) from {} into {}",
        snapshot.issues.len(),
        dump_dir.display(),
        out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuegraph::config::GeneratorConfig;
    use issuegraph::scenario::ScenarioBuilder;
    use issuegraph::store::Snapshot;
    use tempfile::tempdir;

    #[test]
    fn test_convert_missing_dir_fails() {
        let out = tempdir().unwrap();
        let result = run(&out.path().join("nope"), out.path());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_convert_checkpointed_run() {
        let dumps = tempdir().unwrap();
        let out = tempdir().unwrap();
        let config = GeneratorConfig {
            seed: Some(5),
            ..GeneratorConfig::default()
        };
        let mut builder = ScenarioBuilder::from_config(&config).unwrap();
        builder.build_scenario(2);
        builder.checkpoint(dumps.path()).unwrap();
        builder.build_scenario(4);
        builder.checkpoint(dumps.path()).unwrap();

        run(dumps.path(), out.path()).unwrap();
        let snapshot = Snapshot::from_export(out.path()).unwrap();
        assert_eq!(snapshot.issues.len(), 2);
        assert_eq!(snapshot.commits.len(), 8);
        assert!(snapshot.view().verify(Some(config.caps)).is_ok());
    }

    #[test]
    fn test_convert_empty_dir_gives_empty_export() {
        let dumps = tempdir().unwrap();
        let out = tempdir().unwrap();
        run(dumps.path(), out.path()).unwrap();
        let snapshot = Snapshot::from_export(out.path()).unwrap();
        assert!(snapshot.issues.is_empty());
        assert_eq!(snapshot.edges.len(), 9);
    }
}
