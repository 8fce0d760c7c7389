#![no_main]

//! Fuzz target for scenario assembly and export.
//!
//! Drives the builder with arbitrary seeds, pool caps and chain lengths,
//! then checks the resulting graph and its export round-trip.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tempfile::tempdir;

use issuegraph::config::GeneratorConfig;
use issuegraph::scenario::ScenarioBuilder;
use issuegraph::store::Snapshot;

#[derive(Arbitrary, Debug)]
struct ScenarioInput {
    seed: u64,
    max_contributors: u8,
    max_repositories: u8,
    /// Chain length of each scenario
    chains: Vec<u8>,
    export: bool,
}

fuzz_target!(|input: ScenarioInput| {
    let base = GeneratorConfig {
        seed: Some(input.seed),
        ..GeneratorConfig::default()
    };
    let config = match base.with_caps(
        usize::from(input.max_contributors % 40),
        usize::from(input.max_repositories % 15),
    ) {
        Ok(c) => c,
        Err(_) => return,
    };

    let mut builder = match ScenarioBuilder::from_config(&config) {
        Ok(b) => b,
        Err(_) => return,
    };

    let chains: Vec<usize> = input.chains.iter().take(30).map(|k| usize::from(*k % 40)).collect();
    for k in &chains {
        let summary = builder.build_scenario(*k);
        assert_eq!(summary.commit_ids.len(), k + 1);
    }

    let store = builder.store();
    assert_eq!(store.issues.len(), chains.len());
    store
        .view()
        .verify(Some(config.caps))
        .expect("generated graph must verify");

    if input.export {
        let dir = match tempdir() {
            Ok(d) => d,
            Err(_) => return,
        };
        store.export_all(dir.path()).expect("export must succeed");
        let snapshot = Snapshot::from_export(dir.path()).expect("export must reload");
        assert_eq!(snapshot.issues, store.issues.records());
        let _ = serde_json::to_string(&snapshot.commits);
    }
});
