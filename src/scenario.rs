//! Assembly of one issue-centred subgraph per call.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::ids::IdAllocator;
use crate::models::{
    Branch, Commit, Contributor, Edge, EdgeKind, GitRepository, Issue, IssueStatus, Node,
    NodeHeader, NodeKind, PullRequest,
};
use crate::pool::{self, Draw, PoolCaps};
use crate::store::Store;
use crate::temporal::TemporalModel;
use crate::text;

const REPOSITORY_URL_PREFIX: &str = "www.github/";
const PULL_REQUEST_URL_PREFIX: &str = "www.github.com/";
const MIN_BODY_WORDS: usize = 10;
const MAX_BODY_WORDS: usize = 56;

/// Account tag and privacy flag stamped on every node.
#[derive(Debug, Clone)]
struct Account {
    id: String,
    private: bool,
}

impl Account {
    fn header<R: Rng + ?Sized>(
        &self,
        ids: &mut IdAllocator,
        rng: &mut R,
        kind: NodeKind,
        label: String,
    ) -> NodeHeader {
        let (id, key) = ids.allocate(kind.collection(), rng);
        NodeHeader {
            account_id: self.id.clone(),
            private_element: self.private,
            label,
            key,
            id,
            class: kind,
        }
    }
}

/// What one `build_scenario` call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub issue_id: String,
    pub status: IssueStatus,
    /// Head commit first, then each child in chain order.
    pub commit_ids: Vec<String>,
    /// Distinct contributors touching the scenario, in first-seen order.
    pub contributor_ids: Vec<String>,
    pub contributors_created: usize,
    pub repository_created: bool,
    pub propensity: f64,
}

/// Records of a scenario waiting to be appended to the store.
#[derive(Default)]
struct Draft {
    pull_request: Option<PullRequest>,
    branch: Option<Branch>,
    commits: Vec<Commit>,
    edges: Vec<Edge>,
    contributors: Vec<String>,
    contributors_created: usize,
}

impl Draft {
    fn touch(&mut self, draw: &Draw<Contributor>) -> String {
        if draw.is_created() {
            self.contributors_created += 1;
        }
        let id = draw.get().header.id.clone();
        self.note_contributor(&id);
        id
    }

    fn note_contributor(&mut self, id: &str) {
        if !self.contributors.iter().any(|c| c == id) {
            self.contributors.push(id.to_string());
        }
    }
}

/// Owns all generation state: RNG, id allocator, temporal model and the
/// store every record ends up in.
pub struct ScenarioBuilder<R = StdRng> {
    account: Account,
    caps: PoolCaps,
    max_commits: usize,
    rng: R,
    ids: IdAllocator,
    temporal: TemporalModel,
    store: Store,
}

impl ScenarioBuilder<StdRng> {
    /// Builder seeded from `config.seed`, or from OS entropy when unset.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> ScenarioBuilder<R> {
    pub fn with_rng(config: &GeneratorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(ScenarioBuilder {
            account: Account {
                id: config.account_id.clone(),
                private: config.private,
            },
            caps: config.caps,
            max_commits: config.max_commits,
            rng,
            ids: IdAllocator::new(),
            temporal: config.temporal_model()?,
            store: Store::new(),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn temporal(&self) -> &TemporalModel {
        &self.temporal
    }

    pub fn caps(&self) -> PoolCaps {
        self.caps
    }

    /// Continues from the pools of an earlier, checkpointed run.
    pub fn resume(&mut self, dump_dir: &Path) -> Result<()> {
        self.store.resume(dump_dir)?;
        for c in self.store.contributors.records() {
            self.ids.register(&c.header.key);
        }
        for r in self.store.git_repositories.records() {
            self.ids.register(&r.header.key);
        }
        Ok(())
    }

    pub fn checkpoint(&mut self, dump_dir: &Path) -> Result<usize> {
        self.store.checkpoint(dump_dir)
    }

    /// Chain length for the next scenario, in `1..=max_commits`.
    pub fn random_commit_count(&mut self) -> usize {
        self.rng.gen_range(1..=self.max_commits)
    }

    pub fn contributor(&mut self) -> Draw<Contributor> {
        let Self {
            account,
            caps,
            rng,
            ids,
            store,
            ..
        } = self;
        pool::draw(store.contributors.members_mut(), caps.contributors, rng, |rng| {
            let name = text::username(rng);
            Contributor {
                header: account.header(ids, rng, NodeKind::Contributor, name.clone()),
                name,
            }
        })
    }

    pub fn repository(&mut self) -> Draw<GitRepository> {
        let Self {
            account,
            caps,
            rng,
            ids,
            store,
            ..
        } = self;
        pool::draw(store.git_repositories.members_mut(), caps.repositories, rng, |rng| {
            let name = text::repository_name(rng);
            GitRepository {
                header: account.header(ids, rng, NodeKind::GitRepository, name.clone()),
                url: format!("{}{}", REPOSITORY_URL_PREFIX, name),
                name,
            }
        })
    }

    fn node_header(&mut self, kind: NodeKind, label: String) -> NodeHeader {
        self.account.header(&mut self.ids, &mut self.rng, kind, label)
    }

    fn edge(&mut self, kind: EdgeKind, from: &str, to: &str) -> Edge {
        let (id, key) = self.ids.allocate(kind.collection(), &mut self.rng);
        Edge {
            key,
            id,
            from: from.to_string(),
            to: to.to_string(),
            class: kind,
        }
    }

    fn pull_request(&mut self) -> PullRequest {
        let pull_request_id = text::numeric_id(&mut self.rng);
        let url = format!(
            "{}{}",
            PULL_REQUEST_URL_PREFIX,
            text::repository_name(&mut self.rng)
        );
        PullRequest {
            header: self.node_header(NodeKind::PullRequest, url.clone()),
            pull_request_id,
            url,
        }
    }

    fn branch(&mut self) -> Branch {
        let branch_name = text::branch_name(&mut self.rng);
        Branch {
            header: self.node_header(NodeKind::Branch, branch_name.clone()),
            branch_name,
        }
    }

    fn commit(&mut self) -> Commit {
        let hash = text::hash(&mut self.rng);
        let opened_at = self.temporal.random_date(&mut self.rng);
        Commit {
            header: self.node_header(NodeKind::Commit, hash.clone()),
            hash,
            opened_at,
        }
    }

    /// Builds and records one issue scenario with a chain of
    /// `commit_count` commits below the head commit.
    pub fn build_scenario(&mut self, commit_count: usize) -> ScenarioSummary {
        let mut draft = Draft::default();

        let status = if self.rng.gen_bool(0.5) {
            IssueStatus::Closed
        } else {
            IssueStatus::Open
        };
        let issue_number = text::numeric_id(&mut self.rng);
        let words = self.rng.gen_range(MIN_BODY_WORDS..=MAX_BODY_WORDS);
        let body = text::description(words, &mut self.rng);
        let issue_header = self.node_header(NodeKind::Issue, issue_number.clone());
        let issue_id = issue_header.id.clone();

        let reporter = self.contributor();
        let closer = self.contributor();
        let assignee = self.contributor();
        let reporter = draft.touch(&reporter);
        let closer = draft.touch(&closer);
        let assignee = draft.touch(&assignee);

        let edge = self.edge(EdgeKind::IssueAssignee, &issue_id, &assignee);
        draft.edges.push(edge);
        let edge = self.edge(EdgeKind::IssueReporter, &issue_id, &reporter);
        draft.edges.push(edge);
        let edge = self.edge(EdgeKind::IssueCloser, &issue_id, &closer);
        draft.edges.push(edge);

        let repository = self.repository();
        let repository_created = repository.is_created();
        let edge = self.edge(EdgeKind::GitRepoIssue, repository.get().id(), &issue_id);
        draft.edges.push(edge);

        let pull_request = self.pull_request();
        let edge = self.edge(EdgeKind::IssueResolver, &issue_id, &pull_request.header.id);
        draft.edges.push(edge);

        let branch = self.branch();
        let edge = self.edge(
            EdgeKind::PullRequestSource,
            &pull_request.header.id,
            &branch.header.id,
        );
        draft.edges.push(edge);

        let head = self.commit();
        let edge = self.edge(EdgeKind::BranchHeadCommit, &branch.header.id, &head.header.id);
        draft.edges.push(edge);
        let edge = self.edge(EdgeKind::ContributorCommit, &head.header.id, &assignee);
        draft.edges.push(edge);

        let mut previous = head.header.id.clone();
        let mut previous_author = assignee;
        draft.commits.push(head);
        for _ in 0..commit_count {
            let child = self.commit();
            let edge = self.edge(EdgeKind::CommitParent, &previous, &child.header.id);
            draft.edges.push(edge);

            let author = if self.rng.gen_bool(0.5) {
                previous_author
            } else {
                let draw = self.contributor();
                draft.touch(&draw)
            };
            let edge = self.edge(EdgeKind::ContributorCommit, &child.header.id, &author);
            draft.edges.push(edge);
            draft.note_contributor(&author);

            previous = child.header.id.clone();
            previous_author = author;
            draft.commits.push(child);
        }

        let propensity = TemporalModel::derive_propensity(commit_count, draft.contributors.len());
        self.temporal.set_propensity(propensity);

        let created_at = self.temporal.random_date(&mut self.rng);
        let closed_at = match status {
            IssueStatus::Closed => Some(self.temporal.random_closing_date(created_at, &mut self.rng)),
            IssueStatus::Open => None,
        };

        let issue = Issue {
            header: issue_header,
            issue_id: issue_number,
            body,
            created_at,
            closed_at,
            status,
        };
        draft.pull_request = Some(pull_request);
        draft.branch = Some(branch);

        let summary = ScenarioSummary {
            issue_id,
            status,
            commit_ids: draft.commits.iter().map(|c| c.header.id.clone()).collect(),
            contributor_ids: draft.contributors.clone(),
            contributors_created: draft.contributors_created,
            repository_created,
            propensity: self.temporal.propensity(),
        };
        self.record(issue, draft);

        debug!(
            issue = %summary.issue_id,
            commits = summary.commit_ids.len(),
            contributors = summary.contributor_ids.len(),
            propensity = summary.propensity,
            "scenario built"
        );
        summary
    }

    /// Appends nodes before edges so every edge lands after its endpoints.
    fn record(&mut self, issue: Issue, draft: Draft) {
        self.store.issues.record(issue);
        if let Some(pull_request) = draft.pull_request {
            self.store.pull_requests.record(pull_request);
        }
        if let Some(branch) = draft.branch {
            self.store.branches.record(branch);
        }
        for commit in draft.commits {
            self.store.commits.record(commit);
        }
        for edge in draft.edges {
            self.store.record_edge(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    fn builder(seed: u64) -> ScenarioBuilder {
        let config = GeneratorConfig {
            seed: Some(seed),
            ..GeneratorConfig::default()
        };
        ScenarioBuilder::from_config(&config).unwrap()
    }

    fn small_pool_builder(seed: u64, contributors: usize, repositories: usize) -> ScenarioBuilder {
        let config = GeneratorConfig {
            seed: Some(seed),
            ..GeneratorConfig::default()
        }
        .with_caps(contributors, repositories)
        .unwrap();
        ScenarioBuilder::from_config(&config).unwrap()
    }

    fn edge_count(b: &ScenarioBuilder, kind: EdgeKind) -> usize {
        b.store().edges(kind).len()
    }

    #[test]
    fn test_scenario_with_three_commits() {
        let mut b = builder(42);
        let summary = b.build_scenario(3);
        let store = b.store();

        assert_eq!(store.issues.len(), 1);
        assert_eq!(store.pull_requests.len(), 1);
        assert_eq!(store.branches.len(), 1);
        assert_eq!(store.commits.len(), 4);
        assert_eq!(summary.commit_ids.len(), 4);
        assert_eq!(edge_count(&b, EdgeKind::GitRepoIssue), 1);
        assert_eq!(edge_count(&b, EdgeKind::IssueResolver), 1);
        assert_eq!(edge_count(&b, EdgeKind::PullRequestSource), 1);
        assert_eq!(edge_count(&b, EdgeKind::BranchHeadCommit), 1);
        assert_eq!(edge_count(&b, EdgeKind::CommitParent), 3);
        assert_eq!(edge_count(&b, EdgeKind::ContributorCommit), 4);
        assert_eq!(edge_count(&b, EdgeKind::IssueAssignee), 1);
        assert_eq!(edge_count(&b, EdgeKind::IssueReporter), 1);
        assert_eq!(edge_count(&b, EdgeKind::IssueCloser), 1);
        assert!(store.view().verify(Some(b.caps())).is_ok());
    }

    #[test]
    fn test_scenario_counts_with_saturated_pools() {
        // cap 1 forces every role and commit onto the same contributor
        let mut b = small_pool_builder(3, 1, 1);
        let first = b.build_scenario(3);
        let second = b.build_scenario(3);
        assert_eq!(first.contributors_created, 1);
        assert_eq!(second.contributors_created, 0);
        assert!(!second.repository_created);
        assert_eq!(second.contributor_ids, first.contributor_ids);
        assert_eq!(b.store().contributors.len(), 1);
        assert_eq!(b.store().git_repositories.len(), 1);
        assert_eq!(edge_count(&b, EdgeKind::CommitParent), 6);
        assert_eq!(edge_count(&b, EdgeKind::ContributorCommit), 8);
    }

    #[test]
    fn test_commit_chain_is_linear() {
        let mut b = builder(7);
        let summary = b.build_scenario(5);
        let parents = b.store().edges(EdgeKind::CommitParent).records();
        assert_eq!(parents.len(), 5);
        for (edge, pair) in parents.iter().zip(summary.commit_ids.windows(2)) {
            assert_eq!(edge.from, pair[0]);
            assert_eq!(edge.to, pair[1]);
        }

        let head_edge = &b.store().edges(EdgeKind::BranchHeadCommit).records()[0];
        assert_eq!(head_edge.to, summary.commit_ids[0]);
    }

    #[test]
    fn test_every_commit_has_one_author() {
        let mut b = builder(8);
        let summary = b.build_scenario(10);
        let authored: Vec<&str> = b
            .store()
            .edges(EdgeKind::ContributorCommit)
            .records()
            .iter()
            .map(|e| e.from.as_str())
            .collect();
        let expected: Vec<&str> = summary.commit_ids.iter().map(String::as_str).collect();
        assert_eq!(authored, expected);
    }

    #[test]
    fn test_head_commit_attributed_to_assignee() {
        let mut b = builder(9);
        let summary = b.build_scenario(1);
        let assignee = &b.store().edges(EdgeKind::IssueAssignee).records()[0].to;
        let head_author = b
            .store()
            .edges(EdgeKind::ContributorCommit)
            .records()
            .iter()
            .find(|e| e.from == summary.commit_ids[0])
            .map(|e| &e.to)
            .unwrap();
        assert_eq!(head_author, assignee);
    }

    #[test]
    fn test_commit_authors_are_contributor_nodes() {
        let mut b = builder(10);
        for _ in 0..20 {
            b.build_scenario(6);
        }
        let contributors: HashSet<&str> =
            b.store().contributors.records().iter().map(Node::id).collect();
        for edge in b.store().edges(EdgeKind::ContributorCommit).records() {
            assert!(edge.to.starts_with("contributors/"));
            assert!(contributors.contains(edge.to.as_str()));
        }
    }

    #[test]
    fn test_children_can_keep_parent_author() {
        let mut b = builder(11);
        for _ in 0..20 {
            b.build_scenario(6);
        }
        let store = b.store();
        let contributors: HashSet<&str> = store.contributors.records().iter().map(Node::id).collect();
        let author_of: HashMap<&str, &str> = store
            .edges(EdgeKind::ContributorCommit)
            .records()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();

        let mut kept = 0;
        for parent_edge in store.edges(EdgeKind::CommitParent).records() {
            let parent_author = author_of[parent_edge.from.as_str()];
            let child_author = author_of[parent_edge.to.as_str()];
            assert!(contributors.contains(parent_author));
            assert!(contributors.contains(child_author));
            if parent_author == child_author {
                kept += 1;
            }
        }
        assert!(kept > 0);
    }

    #[test]
    fn test_eleven_draws_with_cap_ten() {
        let mut b = small_pool_builder(5, 10, 10);
        let draws: Vec<Draw<Contributor>> = (0..11).map(|_| b.contributor()).collect();
        assert_eq!(b.store().contributors.len(), 10);
        assert!(draws[..10].iter().all(Draw::is_created));
        assert!(!draws[10].is_created());
        assert!(b.store().contributors.records().contains(draws[10].get()));
    }

    #[test]
    fn test_repository_pool_capped() {
        let mut b = builder(6);
        for _ in 0..40 {
            b.repository();
        }
        assert_eq!(b.store().git_repositories.len(), 10);
        let repo = &b.store().git_repositories.records()[0];
        assert_eq!(repo.url, format!("www.github/{}", repo.name));
        assert_eq!(repo.header.label, repo.name);
    }

    #[test]
    fn test_issue_dates_follow_status() {
        let mut b = builder(12);
        for _ in 0..50 {
            b.build_scenario(2);
        }
        let issues = b.store().issues.records();
        assert!(issues.iter().any(|i| i.status == IssueStatus::Open));
        assert!(issues.iter().any(|i| i.status == IssueStatus::Closed));
        for issue in issues {
            match issue.status {
                IssueStatus::Open => assert!(issue.closed_at.is_none()),
                IssueStatus::Closed => assert!(issue.closed_at.unwrap() >= issue.created_at),
            }
            assert!(issue.created_at >= b.temporal().start());
            assert!(issue.created_at <= b.temporal().end());
        }
    }

    #[test]
    fn test_propensity_updated_per_scenario() {
        let mut b = builder(13);
        let summary = b.build_scenario(20);
        assert_eq!(
            summary.propensity,
            TemporalModel::derive_propensity(20, summary.contributor_ids.len())
        );
        assert_eq!(b.temporal().propensity(), summary.propensity);
    }

    #[test]
    fn test_same_seed_same_graph() {
        let mut a = builder(77);
        let mut b = builder(77);
        for k in [1, 4, 9] {
            assert_eq!(a.build_scenario(k), b.build_scenario(k));
        }
        assert_eq!(a.store().issues.records(), b.store().issues.records());
    }

    #[test]
    fn test_labels_and_account_tags() {
        let mut b = builder(14);
        b.build_scenario(2);
        let store = b.store();
        let issue = &store.issues.records()[0];
        assert_eq!(issue.header.label, issue.issue_id);
        assert_eq!(issue.header.account_id, "1");
        assert!(issue.header.private_element);
        let words = issue.body.split_whitespace().count();
        assert!((MIN_BODY_WORDS..=MAX_BODY_WORDS).contains(&words));

        let pr = &store.pull_requests.records()[0];
        assert!(pr.url.starts_with("www.github.com/"));
        assert_eq!(pr.header.label, pr.url);
        let commit = &store.commits.records()[0];
        assert_eq!(commit.header.label, commit.hash);
    }

    #[test]
    fn test_resume_keeps_pool() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = small_pool_builder(20, 3, 2);
        for _ in 0..5 {
            first.build_scenario(2);
        }
        first.checkpoint(dir.path()).unwrap();
        let pool: Vec<Contributor> = first.store().contributors.records().to_vec();

        let mut second = small_pool_builder(21, 3, 2);
        second.resume(dir.path()).unwrap();
        let summary = second.build_scenario(4);
        assert_eq!(summary.contributors_created, 0);
        assert_eq!(second.store().contributors.records(), &pool[..]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_chain_shape(k in 0usize..30, seed in any::<u64>()) {
            let mut b = builder(seed);
            let summary = b.build_scenario(k);
            prop_assert_eq!(b.store().commits.len(), k + 1);
            prop_assert_eq!(summary.commit_ids.len(), k + 1);
            prop_assert_eq!(edge_count(&b, EdgeKind::CommitParent), k);
            prop_assert_eq!(edge_count(&b, EdgeKind::ContributorCommit), k + 1);
        }

        #[test]
        fn prop_run_invariants(n in 1usize..40, seed in any::<u64>()) {
            let mut b = small_pool_builder(seed, 6, 3);
            for _ in 0..n {
                let k = b.random_commit_count();
                b.build_scenario(k);
            }
            let store = b.store();
            prop_assert_eq!(store.issues.len(), n);
            prop_assert!(store.contributors.len() <= 6);
            prop_assert!(store.git_repositories.len() <= 3);
            prop_assert!(store.view().verify(Some(b.caps())).is_ok());
        }
    }
}
