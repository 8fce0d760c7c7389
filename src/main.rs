mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use issuegraph::config::{
    GeneratorConfig, DEFAULT_CLOSING_HORIZON_DAYS, DEFAULT_DATE_END, DEFAULT_DATE_FORMAT,
    DEFAULT_DATE_START, DEFAULT_MAX_COMMITS,
};
use issuegraph::pool::{PoolCaps, DEFAULT_MAX_CONTRIBUTORS, DEFAULT_MAX_REPOSITORIES};

use commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "issuegraph")]
#[command(about = "Generate synthetic issue/commit graphs for graph database import")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate issue scenarios and export them as node/edge documents
    Generate {
        /// Number of issue scenarios
        #[arg(short, long, default_value_t = 20000, env = "ISSUEGRAPH_COUNT")]
        count: usize,
        /// Export root; documents land in <out>/doc and <out>/edge
        #[arg(short, long, default_value = "entities", env = "ISSUEGRAPH_OUT")]
        out: PathBuf,
        /// Checkpoint directory; when set, the export is built from checkpoints
        #[arg(long, env = "ISSUEGRAPH_DUMP_DIR")]
        dump_dir: Option<PathBuf>,
        /// Checkpoint after every N scenarios
        #[arg(long, env = "ISSUEGRAPH_CHECKPOINT_EVERY")]
        checkpoint_every: Option<usize>,
        /// Reload contributor and repository pools from the checkpoint directory
        #[arg(long)]
        resume: bool,
        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Convert checkpoint files into an export
    Convert {
        /// Checkpoint directory
        #[arg(long, env = "ISSUEGRAPH_DUMP_DIR")]
        dump_dir: PathBuf,
        /// Export root
        #[arg(short, long, default_value = "entities", env = "ISSUEGRAPH_OUT")]
        out: PathBuf,
    },

    /// Check an export for dangling edges and inconsistent issues
    Verify {
        /// Export root
        #[arg(short, long, default_value = "entities", env = "ISSUEGRAPH_OUT")]
        out: PathBuf,
        /// Also check the contributor pool cap
        #[arg(long)]
        max_contributors: Option<usize>,
        /// Also check the repository pool cap
        #[arg(long)]
        max_repositories: Option<usize>,
    },
}

#[derive(Args)]
struct GeneratorArgs {
    /// Account id stamped on every node
    #[arg(long, default_value = "1", env = "ISSUEGRAPH_ACCOUNT_ID")]
    account_id: String,
    /// Privacy flag stamped on every node
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "ISSUEGRAPH_PRIVATE")]
    private: bool,
    /// Upper bound of commits per scenario chain
    #[arg(long, default_value_t = DEFAULT_MAX_COMMITS, env = "ISSUEGRAPH_MAX_COMMITS")]
    max_commits: usize,
    #[arg(long, default_value_t = DEFAULT_MAX_CONTRIBUTORS, env = "ISSUEGRAPH_MAX_CONTRIBUTORS")]
    max_contributors: usize,
    #[arg(long, default_value_t = DEFAULT_MAX_REPOSITORIES, env = "ISSUEGRAPH_MAX_REPOSITORIES")]
    max_repositories: usize,
    /// Start of the date window
    #[arg(long, default_value = DEFAULT_DATE_START, env = "ISSUEGRAPH_DATE_START")]
    date_start: String,
    /// End of the date window
    #[arg(long, default_value = DEFAULT_DATE_END, env = "ISSUEGRAPH_DATE_END")]
    date_end: String,
    /// chrono format of the window bounds
    #[arg(long, default_value = DEFAULT_DATE_FORMAT, env = "ISSUEGRAPH_DATE_FORMAT")]
    date_format: String,
    /// Longest time between an issue's creation and closing
    #[arg(long, default_value_t = DEFAULT_CLOSING_HORIZON_DAYS, env = "ISSUEGRAPH_CLOSING_HORIZON_DAYS")]
    closing_horizon_days: i64,
    /// Seed for a reproducible run
    #[arg(long, env = "ISSUEGRAPH_SEED")]
    seed: Option<u64>,
}

impl GeneratorArgs {
    fn into_config(self) -> Result<GeneratorConfig> {
        let config = GeneratorConfig {
            account_id: self.account_id,
            private: self.private,
            date_start: self.date_start,
            date_end: self.date_end,
            date_format: self.date_format,
            closing_horizon_days: self.closing_horizon_days,
            max_commits: self.max_commits,
            seed: self.seed,
            ..GeneratorConfig::default()
        }
        .with_caps(self.max_contributors, self.max_repositories)?;
        config.validate()?;
        Ok(config)
    }
}

fn verify_caps(contributors: Option<usize>, repositories: Option<usize>) -> Result<Option<PoolCaps>> {
    if contributors.is_none() && repositories.is_none() {
        return Ok(None);
    }
    let defaults = PoolCaps::default();
    let config = GeneratorConfig::default().with_caps(
        contributors.unwrap_or(defaults.contributors.get()),
        repositories.unwrap_or(defaults.repositories.get()),
    )?;
    Ok(Some(config.caps))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            count,
            out,
            dump_dir,
            checkpoint_every,
            resume,
            generator,
        } => {
            let config = generator.into_config()?;
            let opts = GenerateOptions {
                count,
                out,
                dump_dir,
                checkpoint_every,
                resume,
            };
            commands::generate::run(&config, &opts).map(|_| ())
        }

        Commands::Convert { dump_dir, out } => commands::convert::run(&dump_dir, &out),

        Commands::Verify {
            out,
            max_contributors,
            max_repositories,
        } => {
            let caps = verify_caps(max_contributors, max_repositories)?;
            commands::verify::run(&out, caps).map(|_| ())
        }
    }
}
