use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use issuegraph::config::GeneratorConfig;
use issuegraph::integrity::Stats;
use issuegraph::scenario::ScenarioBuilder;
use issuegraph::store;

pub struct GenerateOptions {
    pub count: usize,
    pub out: PathBuf,
    pub dump_dir: Option<PathBuf>,
    pub checkpoint_every: Option<usize>,
    pub resume: bool,
}

pub fn run(config: &GeneratorConfig, opts: &GenerateOptions) -> Result<Stats> {
    if opts.count == 0 {
        bail!("Scenario count must be at least 1");
    }
    if opts.checkpoint_every == Some(0) {
        bail!("--checkpoint-every must be at least 1");
    }
    if opts.dump_dir.is_none() && (opts.checkpoint_every.is_some() || opts.resume) {
        bail!("--checkpoint-every and --resume need --dump-dir");
    }
    if let (false, Some(dir)) = (opts.resume, &opts.dump_dir) {
        if store::has_checkpoints(dir) {
            bail!(
                "Checkpoint directory {} already holds a run; pass --resume to continue it or pick an empty --dump-dir",
                dir.display()
            );
        }
    }

    let mut builder = ScenarioBuilder::from_config(config)?;
    if let (true, Some(dir)) = (opts.resume, &opts.dump_dir) {
        builder.resume(dir)?;
    }

    info!(count = opts.count, "generating scenarios");
    let step = (opts.count / 100).max(1);
    let mut slice_start = Instant::now();

    for i in 0..opts.count {
        if i % step == 0 {
            info!(
                percent = i * 100 / opts.count,
                elapsed_ms = slice_start.elapsed().as_millis() as u64,
                "progress"
            );
            slice_start = Instant::now();
        }

        let commit_count = builder.random_commit_count();
        builder.build_scenario(commit_count);

        if let (Some(every), Some(dir)) = (opts.checkpoint_every, &opts.dump_dir) {
            if (i + 1) % every == 0 {
                builder.checkpoint(dir)?;
            }
        }
    }

    let stats = match &opts.dump_dir {
        Some(dir) => {
            builder.checkpoint(dir)?;
            store::convert(dir, &opts.out)?.view().stats()
        }
        None => {
            let records = builder.into_store();
            records.export_all(&opts.out)?;
            records.view().stats()
        }
    };

    info!(
        issues = stats.count("issues"),
        open_issues = stats.open_issues,
        "generation finished"
    );
    println!("Generated {} scenario(s) into {}", opts.count, opts.out.display());
    println!("{}", stats);
    Ok(stats)
}
