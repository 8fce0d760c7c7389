//! Whole-graph checks over a generated run.

use anyhow::{bail, Result};
use std::collections::HashSet;
use std::fmt;

use crate::models::{Edge, EdgeKind, IssueStatus, Node, NodeKind};
use crate::models::{Branch, Commit, Contributor, GitRepository, Issue, PullRequest};
use crate::pool::PoolCaps;

/// Borrowed records of every collection. `edges` is indexed by `EdgeKind`.
#[derive(Debug, Clone)]
pub struct GraphView<'a> {
    pub issues: &'a [Issue],
    pub contributors: &'a [Contributor],
    pub git_repositories: &'a [GitRepository],
    pub pull_requests: &'a [PullRequest],
    pub branches: &'a [Branch],
    pub commits: &'a [Commit],
    pub edges: Vec<&'a [Edge]>,
}

impl<'a> GraphView<'a> {
    pub fn edges(&self, kind: EdgeKind) -> &'a [Edge] {
        self.edges.get(kind as usize).copied().unwrap_or_default()
    }

    fn node_ids(&self, kind: NodeKind) -> HashSet<&'a str> {
        fn ids<N: Node>(nodes: &[N]) -> HashSet<&str> {
            nodes.iter().map(Node::id).collect()
        }
        match kind {
            NodeKind::Issue => ids(self.issues),
            NodeKind::Contributor => ids(self.contributors),
            NodeKind::GitRepository => ids(self.git_repositories),
            NodeKind::PullRequest => ids(self.pull_requests),
            NodeKind::Branch => ids(self.branches),
            NodeKind::Commit => ids(self.commits),
        }
    }

    pub fn stats(&self) -> Stats {
        let mut counts: Vec<(&'static str, usize)> = vec![
            (NodeKind::Issue.collection(), self.issues.len()),
            (NodeKind::Contributor.collection(), self.contributors.len()),
            (NodeKind::GitRepository.collection(), self.git_repositories.len()),
            (NodeKind::PullRequest.collection(), self.pull_requests.len()),
            (NodeKind::Branch.collection(), self.branches.len()),
            (NodeKind::Commit.collection(), self.commits.len()),
        ];
        counts.extend(
            EdgeKind::ALL
                .iter()
                .map(|kind| (kind.collection(), self.edges(*kind).len())),
        );
        let open_issues = self
            .issues
            .iter()
            .filter(|i| i.status == IssueStatus::Open)
            .count();
        Stats {
            counts,
            open_issues,
        }
    }

    /// Checks referential integrity, issue status/date consistency, key
    /// uniqueness and, when `caps` is given, the pool sizes.
    pub fn verify(&self, caps: Option<PoolCaps>) -> Result<()> {
        let mut problems = Vec::new();

        for kind in NodeKind::ALL {
            let total = self.node_len(kind);
            let distinct = self.node_ids(kind).len();
            if distinct != total {
                problems.push(format!(
                    "{}: {} records but {} distinct ids",
                    kind.collection(),
                    total,
                    distinct
                ));
            }
        }

        for kind in EdgeKind::ALL {
            let (from_kind, to_kind) = kind.endpoints();
            let from_ids = self.node_ids(from_kind);
            let to_ids = self.node_ids(to_kind);
            let mut keys = HashSet::new();
            for edge in self.edges(kind) {
                if edge.class != kind {
                    problems.push(format!("{}: edge {} has class {:?}", kind.collection(), edge.id, edge.class));
                }
                if !keys.insert(edge.key.as_str()) {
                    problems.push(format!("{}: duplicate key {}", kind.collection(), edge.key));
                }
                if !from_ids.contains(edge.from.as_str()) {
                    problems.push(format!(
                        "{}: edge {} starts at unknown {} {}",
                        kind.collection(),
                        edge.id,
                        from_kind.name(),
                        edge.from
                    ));
                }
                if !to_ids.contains(edge.to.as_str()) {
                    problems.push(format!(
                        "{}: edge {} ends at unknown {} {}",
                        kind.collection(),
                        edge.id,
                        to_kind.name(),
                        edge.to
                    ));
                }
            }
        }

        for issue in self.issues {
            match (issue.status, issue.closed_at) {
                (IssueStatus::Open, Some(_)) => {
                    problems.push(format!("issue {} is open but has closed_at", issue.header.id))
                }
                (IssueStatus::Closed, None) => {
                    problems.push(format!("issue {} is closed without closed_at", issue.header.id))
                }
                (IssueStatus::Closed, Some(closed)) if closed < issue.created_at => problems.push(
                    format!("issue {} closed before it was created", issue.header.id),
                ),
                _ => {}
            }
        }

        if let Some(caps) = caps {
            if self.contributors.len() > caps.contributors.get() {
                problems.push(format!(
                    "{} contributors exceed cap {}",
                    self.contributors.len(),
                    caps.contributors
                ));
            }
            if self.git_repositories.len() > caps.repositories.get() {
                problems.push(format!(
                    "{} repositories exceed cap {}",
                    self.git_repositories.len(),
                    caps.repositories
                ));
            }
        }

        if problems.is_empty() {
            return Ok(());
        }
        let shown: Vec<&str> = problems.iter().take(20).map(String::as_str).collect();
        bail!(
            "Graph verification failed with {} problem(s):\n  {}",
            problems.len(),
            shown.join("\n  ")
        );
    }

    fn node_len(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Issue => self.issues.len(),
            NodeKind::Contributor => self.contributors.len(),
            NodeKind::GitRepository => self.git_repositories.len(),
            NodeKind::PullRequest => self.pull_requests.len(),
            NodeKind::Branch => self.branches.len(),
            NodeKind::Commit => self.commits.len(),
        }
    }
}

/// Record counts per collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub counts: Vec<(&'static str, usize)>,
    pub open_issues: usize,
}

impl Stats {
    pub fn count(&self, collection: &str) -> usize {
        self.counts
            .iter()
            .find(|(name, _)| *name == collection)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, count) in &self.counts {
            writeln!(f, "{:<20} {}", name, count)?;
        }
        write!(f, "{:<20} {}", "open issues", self.open_issues)
    }
}
