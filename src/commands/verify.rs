use anyhow::{Context, Result};
use std::path::Path;

use issuegraph::integrity::Stats;
use issuegraph::pool::PoolCaps;
use issuegraph::store::Snapshot;

pub fn run(out: &Path, caps: Option<PoolCaps>) -> Result<Stats> {
    let snapshot = Snapshot::from_export(out)
        .with_context(|| format!("Failed to load export from {}", out.display()))?;
    let view = snapshot.view();
    view.verify(caps)?;

    let stats = view.stats();
    println!("Export at {} is consistent", out.display());
    println!("{}", stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuegraph::config::GeneratorConfig;
    use issuegraph::scenario::ScenarioBuilder;
    use std::fs;
    use tempfile::tempdir;

    fn generated_export(dir: &Path) -> GeneratorConfig {
        let config = GeneratorConfig {
            seed: Some(17),
            ..GeneratorConfig::default()
        };
        let mut builder = ScenarioBuilder::from_config(&config).unwrap();
        for k in 1..=12 {
            builder.build_scenario(k);
        }
        builder.store().export_all(dir).unwrap();
        config
    }

    #[test]
    fn test_verify_generated_export() {
        let dir = tempdir().unwrap();
        let config = generated_export(dir.path());
        let stats = run(dir.path(), Some(config.caps)).unwrap();
        assert_eq!(stats.count("issues"), 12);
        assert_eq!(stats.count("commitParents"), (1..=12).sum::<usize>());
    }

    #[test]
    fn test_verify_detects_removed_contributors() {
        let dir = tempdir().unwrap();
        generated_export(dir.path());
        fs::write(dir.path().join("doc/contributors.json"), "[]").unwrap();

        let result = run(dir.path(), None);
        assert!(result.unwrap_err().to_string().contains("unknown Contributor"));
    }

    #[test]
    fn test_verify_missing_export_fails() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path(), None).is_err());
    }
}
