// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the shared data model (tags, releases, PRs, issues, report entries) used by resolution, assembly, and rendering
// role: model/types
// outputs: Serializable structs with stable field names; label-based issue classification
// invariants: Optional fields skip serialization when absent; issue state is stored lowercased; BuildInformation is immutable once built
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::VersionTag;

/// A tag name plus the commit it ultimately points at (annotated tags are
/// peeled to their commit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRef {
  pub name: String,
  pub hash: String,
}

/// A host-tracked release wrapping a tag with publish metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
  pub tag_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub published_at: Option<String>,
  pub is_pre_release: bool,
}

impl Release {
  /// Publish instant for recency comparisons; missing or unparseable
  /// timestamps sort as oldest.
  pub fn published_instant(&self) -> chrono::DateTime<chrono::Utc> {
    self
      .published_at
      .as_deref()
      .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
      .map(|dt| dt.with_timezone(&chrono::Utc))
      .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
  pub number: i64,
  pub title: String,
  pub url: String,
  pub merged: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub merge_commit: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub head_ref: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
  pub number: i64,
  pub title: String,
  pub url: String,
  /// "open" | "closed", lowercased at parse time.
  pub state: String,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub labels: Vec<String>,
}

impl Issue {
  pub fn is_open(&self) -> bool {
    self.state.eq_ignore_ascii_case("open")
  }

  pub fn has_label(&self, name: &str) -> bool {
    self.labels.iter().any(|l| l.eq_ignore_ascii_case(name))
  }

  /// Classify by label: `bug` wins, then `enhancement`/`feature`, else other.
  pub fn kind(&self) -> IssueKind {
    if self.has_label("bug") {
      IssueKind::Bug
    } else if self.has_label("enhancement") || self.has_label("feature") {
      IssueKind::Feature
    } else {
      IssueKind::Other
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
  Bug,
  Feature,
  Other,
}

impl fmt::Display for IssueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      IssueKind::Bug => write!(f, "bug"),
      IssueKind::Feature => write!(f, "feature"),
      IssueKind::Other => write!(f, "other"),
    }
  }
}

/// One line of the finished report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEntry {
  pub id: String,
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  pub kind: IssueKind,
}

impl IssueEntry {
  pub fn from_issue(issue: &Issue) -> Self {
    IssueEntry {
      id: format!("#{}", issue.number),
      title: issue.title.clone(),
      url: if issue.url.is_empty() { None } else { Some(issue.url.clone()) },
      kind: issue.kind(),
    }
  }

  /// Stand-in for a merged PR with no tracked issue, so that work is never
  /// silently omitted from the report.
  pub fn placeholder_for(pr: &PullRequest) -> Self {
    IssueEntry {
      id: format!("#{}", pr.number),
      title: format!("PR #{}", pr.number),
      url: if pr.url.is_empty() { None } else { Some(pr.url.clone()) },
      kind: IssueKind::Other,
    }
  }
}

/// The one immutable value a report run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInformation {
  pub target_version: VersionTag,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target_hash: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub baseline_version: Option<VersionTag>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub baseline_hash: Option<String>,
  pub change_issues: Vec<IssueEntry>,
  pub bug_issues: Vec<IssueEntry>,
  pub known_issues: Vec<IssueEntry>,
}
