use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::integrity::GraphView;
use crate::models::{
    Branch, Commit, Contributor, Edge, EdgeKind, GitRepository, Issue, Node, NodeKind, PullRequest,
};

/// Directory (under the export root) holding node documents.
pub const NODE_DIR: &str = "doc";
/// Directory (under the export root) holding edge documents.
pub const EDGE_DIR: &str = "edge";

const DUMP_EXTENSION: &str = "dump";
const EXPORT_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Node,
    Edge,
}

impl CollectionKind {
    pub fn dir(self) -> &'static str {
        match self {
            CollectionKind::Node => NODE_DIR,
            CollectionKind::Edge => EDGE_DIR,
        }
    }
}

/// Ordered, append-only records of one collection.
///
/// `flushed` counts the leading records already written to the checkpoint.
/// Retained collections (the entity pools) stay in memory after a
/// checkpoint; all others are cleared.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    name: &'static str,
    kind: CollectionKind,
    retain: bool,
    records: Vec<T>,
    flushed: usize,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    fn new(name: &'static str, kind: CollectionKind, retain: bool) -> Self {
        Collection {
            name,
            kind,
            retain,
            records: Vec::new(),
            flushed: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&mut self, record: T) {
        self.records.push(record);
    }

    /// Records not yet written to a checkpoint.
    pub fn pending(&self) -> &[T] {
        &self.records[self.flushed..]
    }

    pub(crate) fn members_mut(&mut self) -> &mut Vec<T> {
        &mut self.records
    }

    /// Appends the pending records to `<dir>/<name>.dump`. Returns how many
    /// records were appended.
    pub fn checkpoint(&mut self, dir: &Path) -> Result<usize> {
        let path = dump_path(dir, self.name);
        let mut persisted: Vec<T> = load_dump(&path)?;
        let appended = self.pending().len();
        persisted.extend_from_slice(self.pending());
        write_json(&path, &persisted)?;

        if self.retain {
            self.flushed = self.records.len();
        } else {
            self.records.clear();
            self.flushed = 0;
        }
        debug!(collection = self.name, appended, total = persisted.len(), "checkpointed");
        Ok(appended)
    }

    /// Replaces the in-memory records with the checkpointed ones, marking
    /// them as already flushed.
    fn restore(&mut self, dir: &Path) -> Result<()> {
        self.records = load_dump(&dump_path(dir, self.name))?;
        self.flushed = self.records.len();
        Ok(())
    }

    fn export(&self, out: &Path) -> Result<()> {
        write_json(&export_path(out, self.kind, self.name), &self.records)
    }
}

/// Every collection of a run, owned by a single generator.
#[derive(Debug, Clone)]
pub struct Store {
    pub issues: Collection<Issue>,
    pub contributors: Collection<Contributor>,
    pub git_repositories: Collection<GitRepository>,
    pub pull_requests: Collection<PullRequest>,
    pub branches: Collection<Branch>,
    pub commits: Collection<Commit>,
    edges: Vec<Collection<Edge>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Store {
            issues: node_collection::<Issue>(false),
            contributors: node_collection::<Contributor>(true),
            git_repositories: node_collection::<GitRepository>(true),
            pull_requests: node_collection::<PullRequest>(false),
            branches: node_collection::<Branch>(false),
            commits: node_collection::<Commit>(false),
            edges: EdgeKind::ALL
                .iter()
                .map(|kind| Collection::new(kind.collection(), CollectionKind::Edge, false))
                .collect(),
        }
    }

    pub fn edges(&self, kind: EdgeKind) -> &Collection<Edge> {
        &self.edges[kind as usize]
    }

    pub fn record_edge(&mut self, edge: Edge) {
        self.edges[edge.class as usize].record(edge);
    }

    /// Borrowed view of the in-memory records, for verification and stats.
    pub fn view(&self) -> GraphView<'_> {
        GraphView {
            issues: self.issues.records(),
            contributors: self.contributors.records(),
            git_repositories: self.git_repositories.records(),
            pull_requests: self.pull_requests.records(),
            branches: self.branches.records(),
            commits: self.commits.records(),
            edges: self.edges.iter().map(|c| c.records()).collect(),
        }
    }

    /// Checkpoints every collection into `dir`.
    pub fn checkpoint(&mut self, dir: &Path) -> Result<usize> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create checkpoint directory {}", dir.display()))?;

        let mut appended = 0;
        appended += self.issues.checkpoint(dir)?;
        appended += self.contributors.checkpoint(dir)?;
        appended += self.git_repositories.checkpoint(dir)?;
        appended += self.pull_requests.checkpoint(dir)?;
        appended += self.branches.checkpoint(dir)?;
        appended += self.commits.checkpoint(dir)?;
        for edges in &mut self.edges {
            appended += edges.checkpoint(dir)?;
        }
        info!(dir = %dir.display(), appended, "checkpoint written");
        Ok(appended)
    }

    /// Reloads the contributor and repository pools from an earlier run's
    /// checkpoints so generation keeps drawing from the same members.
    pub fn resume(&mut self, dir: &Path) -> Result<()> {
        self.contributors.restore(dir)?;
        self.git_repositories.restore(dir)?;
        info!(
            contributors = self.contributors.len(),
            repositories = self.git_repositories.len(),
            "resumed pools from checkpoint"
        );
        Ok(())
    }

    /// Writes every in-memory collection to `<out>/doc` or `<out>/edge`.
    pub fn export_all(&self, out: &Path) -> Result<()> {
        create_export_dirs(out)?;
        self.issues.export(out)?;
        self.contributors.export(out)?;
        self.git_repositories.export(out)?;
        self.pull_requests.export(out)?;
        self.branches.export(out)?;
        self.commits.export(out)?;
        for edges in &self.edges {
            edges.export(out)?;
        }
        info!(out = %out.display(), "export written");
        Ok(())
    }
}

fn node_collection<T>(retain: bool) -> Collection<T>
where
    T: Node + Serialize + DeserializeOwned + Clone,
{
    Collection::new(T::KIND.collection(), CollectionKind::Node, retain)
}

/// Records of a full run read back from disk.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub issues: Vec<Issue>,
    pub contributors: Vec<Contributor>,
    pub git_repositories: Vec<GitRepository>,
    pub pull_requests: Vec<PullRequest>,
    pub branches: Vec<Branch>,
    pub commits: Vec<Commit>,
    pub edges: Vec<Vec<Edge>>,
}

impl Snapshot {
    /// Loads every collection from checkpoint files in `dir`. Missing
    /// files yield empty collections.
    pub fn from_checkpoints(dir: &Path) -> Result<Self> {
        Self::load_with(|_, name| dump_path(dir, name), true)
    }

    /// Loads a finished export from `<out>/doc` and `<out>/edge`.
    pub fn from_export(out: &Path) -> Result<Self> {
        Self::load_with(|kind, name| export_path(out, kind, name), false)
    }

    fn load_with<F>(path_for: F, missing_ok: bool) -> Result<Self>
    where
        F: Fn(CollectionKind, &str) -> PathBuf,
    {
        let node = |kind: NodeKind| path_for(CollectionKind::Node, kind.collection());
        let existing = |path: PathBuf| -> Result<PathBuf> {
            if !missing_ok && !path.exists() {
                anyhow::bail!("Missing export file {}", path.display());
            }
            Ok(path)
        };

        let mut edges = Vec::with_capacity(EdgeKind::ALL.len());
        for kind in EdgeKind::ALL {
            edges.push(load_dump(&existing(path_for(CollectionKind::Edge, kind.collection()))?)?);
        }

        Ok(Snapshot {
            issues: load_dump(&existing(node(NodeKind::Issue))?)?,
            contributors: load_dump(&existing(node(NodeKind::Contributor))?)?,
            git_repositories: load_dump(&existing(node(NodeKind::GitRepository))?)?,
            pull_requests: load_dump(&existing(node(NodeKind::PullRequest))?)?,
            branches: load_dump(&existing(node(NodeKind::Branch))?)?,
            commits: load_dump(&existing(node(NodeKind::Commit))?)?,
            edges,
        })
    }

    pub fn view(&self) -> GraphView<'_> {
        GraphView {
            issues: &self.issues,
            contributors: &self.contributors,
            git_repositories: &self.git_repositories,
            pull_requests: &self.pull_requests,
            branches: &self.branches,
            commits: &self.commits,
            edges: self.edges.iter().map(Vec::as_slice).collect(),
        }
    }

    /// Writes the snapshot in export layout under `out`.
    pub fn export(&self, out: &Path) -> Result<()> {
        create_export_dirs(out)?;
        let node = |kind: NodeKind| export_path(out, CollectionKind::Node, kind.collection());
        write_json(&node(NodeKind::Issue), &self.issues)?;
        write_json(&node(NodeKind::Contributor), &self.contributors)?;
        write_json(&node(NodeKind::GitRepository), &self.git_repositories)?;
        write_json(&node(NodeKind::PullRequest), &self.pull_requests)?;
        write_json(&node(NodeKind::Branch), &self.branches)?;
        write_json(&node(NodeKind::Commit), &self.commits)?;
        for (kind, edges) in EdgeKind::ALL.iter().zip(&self.edges) {
            write_json(&export_path(out, CollectionKind::Edge, kind.collection()), edges)?;
        }
        Ok(())
    }
}

/// Turns the checkpoints in `dump_dir` into an export under `out`.
pub fn convert(dump_dir: &Path, out: &Path) -> Result<Snapshot> {
    let snapshot = Snapshot::from_checkpoints(dump_dir)?;
    snapshot.export(out)?;
    info!(
        dump_dir = %dump_dir.display(),
        out = %out.display(),
        issues = snapshot.issues.len(),
        "converted checkpoints to export"
    );
    Ok(snapshot)
}

pub fn dump_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{}.{}", collection, DUMP_EXTENSION))
}

/// Whether `dir` already holds a dump for any collection.
pub fn has_checkpoints(dir: &Path) -> bool {
    NodeKind::ALL
        .iter()
        .map(|kind| kind.collection())
        .chain(EdgeKind::ALL.iter().map(|kind| kind.collection()))
        .any(|collection| dump_path(dir, collection).exists())
}

pub fn export_path(out: &Path, kind: CollectionKind, collection: &str) -> PathBuf {
    out.join(kind.dir())
        .join(format!("{}.{}", collection, EXPORT_EXTENSION))
}

fn create_export_dirs(out: &Path) -> Result<()> {
    for kind in [CollectionKind::Node, CollectionKind::Edge] {
        let dir = out.join(kind.dir());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    }
    Ok(())
}

/// Reads a JSON record list. A missing file is an empty list.
pub fn load_dump<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        info!(path = %path.display(), "checkpoint missing, starting empty");
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, records)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
