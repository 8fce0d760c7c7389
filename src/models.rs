use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format used for every timestamp written into a document.
pub const DOCUMENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NODE_CLASS_PREFIX: &str = "com.frontendart.codee.backend.entity.domain.node.";
const EDGE_CLASS_PREFIX: &str = "com.frontendart.codee.backend.entity.domain.edge.";

/// Fields every node document carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHeader {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "privateElement")]
    pub private_element: bool,
    pub label: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_class")]
    pub class: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Issue,
    Contributor,
    GitRepository,
    PullRequest,
    Branch,
    Commit,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Issue,
        NodeKind::Contributor,
        NodeKind::GitRepository,
        NodeKind::PullRequest,
        NodeKind::Branch,
        NodeKind::Commit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Issue => "Issue",
            NodeKind::Contributor => "Contributor",
            NodeKind::GitRepository => "GitRepository",
            NodeKind::PullRequest => "PullRequest",
            NodeKind::Branch => "Branch",
            NodeKind::Commit => "Commit",
        }
    }

    /// Collection the node's documents are stored in.
    pub fn collection(self) -> &'static str {
        match self {
            NodeKind::Issue => "issues",
            NodeKind::Contributor => "contributors",
            NodeKind::GitRepository => "gitRepositories",
            NodeKind::PullRequest => "pullRequests",
            NodeKind::Branch => "branches",
            NodeKind::Commit => "commits",
        }
    }

    pub fn class_name(self) -> String {
        format!("{}{}", NODE_CLASS_PREFIX, self.name())
    }

    fn from_class_name(class: &str) -> Option<Self> {
        let name = class.strip_prefix(NODE_CLASS_PREFIX)?;
        NodeKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    IssueAssignee,
    IssueReporter,
    IssueCloser,
    GitRepoIssue,
    IssueResolver,
    PullRequestSource,
    BranchHeadCommit,
    CommitParent,
    ContributorCommit,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 9] = [
        EdgeKind::IssueAssignee,
        EdgeKind::IssueReporter,
        EdgeKind::IssueCloser,
        EdgeKind::GitRepoIssue,
        EdgeKind::IssueResolver,
        EdgeKind::PullRequestSource,
        EdgeKind::BranchHeadCommit,
        EdgeKind::CommitParent,
        EdgeKind::ContributorCommit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EdgeKind::IssueAssignee => "IssueAssignee",
            EdgeKind::IssueReporter => "IssueReporter",
            EdgeKind::IssueCloser => "IssueCloser",
            EdgeKind::GitRepoIssue => "GitRepoIssue",
            EdgeKind::IssueResolver => "IssueResolver",
            EdgeKind::PullRequestSource => "PullRequestSource",
            EdgeKind::BranchHeadCommit => "BranchHeadCommit",
            EdgeKind::CommitParent => "CommitParent",
            EdgeKind::ContributorCommit => "ContributorCommit",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            EdgeKind::IssueAssignee => "issueAssignees",
            EdgeKind::IssueReporter => "issueReporters",
            EdgeKind::IssueCloser => "issueClosers",
            EdgeKind::GitRepoIssue => "gitRepoIssues",
            EdgeKind::IssueResolver => "issueResolvers",
            EdgeKind::PullRequestSource => "pullRequestSources",
            EdgeKind::BranchHeadCommit => "branchHeadCommits",
            EdgeKind::CommitParent => "commitParents",
            EdgeKind::ContributorCommit => "contributorCommits",
        }
    }

    /// Node kinds of the `_from` and `_to` endpoints.
    pub fn endpoints(self) -> (NodeKind, NodeKind) {
        match self {
            EdgeKind::IssueAssignee | EdgeKind::IssueReporter | EdgeKind::IssueCloser => {
                (NodeKind::Issue, NodeKind::Contributor)
            }
            EdgeKind::GitRepoIssue => (NodeKind::GitRepository, NodeKind::Issue),
            EdgeKind::IssueResolver => (NodeKind::Issue, NodeKind::PullRequest),
            EdgeKind::PullRequestSource => (NodeKind::PullRequest, NodeKind::Branch),
            EdgeKind::BranchHeadCommit => (NodeKind::Branch, NodeKind::Commit),
            EdgeKind::CommitParent => (NodeKind::Commit, NodeKind::Commit),
            EdgeKind::ContributorCommit => (NodeKind::Commit, NodeKind::Contributor),
        }
    }

    pub fn class_name(self) -> String {
        format!("{}{}", EDGE_CLASS_PREFIX, self.name())
    }

    fn from_class_name(class: &str) -> Option<Self> {
        let name = class.strip_prefix(EDGE_CLASS_PREFIX)?;
        EdgeKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

macro_rules! class_serde {
    ($kind:ty, $what:literal) => {
        impl Serialize for $kind {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.class_name())
            }
        }

        impl<'de> Deserialize<'de> for $kind {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let class = String::deserialize(deserializer)?;
                <$kind>::from_class_name(&class).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown {} class '{}'", $what, class))
                })
            }
        }
    };
}

class_serde!(NodeKind, "node");
class_serde!(EdgeKind, "edge");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub header: NodeHeader,
    #[serde(rename = "issueId")]
    pub issue_id: String,
    pub body: String,
    #[serde(with = "document_date")]
    pub created_at: NaiveDateTime,
    #[serde(with = "document_date::option")]
    pub closed_at: Option<NaiveDateTime>,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    #[serde(flatten)]
    pub header: NodeHeader,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitRepository {
    #[serde(flatten)]
    pub header: NodeHeader,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(flatten)]
    pub header: NodeHeader,
    #[serde(rename = "pullRequestId")]
    pub pull_request_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(flatten)]
    pub header: NodeHeader,
    #[serde(rename = "branchName")]
    pub branch_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(flatten)]
    pub header: NodeHeader,
    pub hash: String,
    #[serde(with = "document_date")]
    pub opened_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_from")]
    pub from: String,
    #[serde(rename = "_to")]
    pub to: String,
    #[serde(rename = "_class")]
    pub class: EdgeKind,
}

/// Read access to the header shared by every node type.
pub trait Node {
    const KIND: NodeKind;

    fn header(&self) -> &NodeHeader;

    fn id(&self) -> &str {
        &self.header().id
    }
}

macro_rules! impl_node {
    ($ty:ty, $kind:expr) => {
        impl Node for $ty {
            const KIND: NodeKind = $kind;

            fn header(&self) -> &NodeHeader {
                &self.header
            }
        }
    };
}

impl_node!(Issue, NodeKind::Issue);
impl_node!(Contributor, NodeKind::Contributor);
impl_node!(GitRepository, NodeKind::GitRepository);
impl_node!(PullRequest, NodeKind::PullRequest);
impl_node!(Branch, NodeKind::Branch);
impl_node!(Commit, NodeKind::Commit);

mod document_date {
    use super::DOCUMENT_DATE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DOCUMENT_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DOCUMENT_DATE_FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::DOCUMENT_DATE_FORMAT;
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => serializer.serialize_str(&d.format(DOCUMENT_DATE_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| NaiveDateTime::parse_from_str(&raw, DOCUMENT_DATE_FORMAT))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}
