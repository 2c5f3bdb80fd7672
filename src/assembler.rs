use std::collections::BTreeSet;

use crate::connector::RepoConnector;
use crate::error::Result;
use crate::model::{BuildInformation, IssueEntry, IssueKind};
use crate::version::VersionTag;

/// Collect the categorized change/bug/known-issue lists for a resolved
/// (baseline, target) pair. Lists preserve discovery order; no secondary
/// sort is applied.
pub fn assemble_build_information(
  connector: &dyn RepoConnector,
  target: VersionTag,
  target_hash: Option<String>,
  baseline: Option<VersionTag>,
  baseline_hash: Option<String>,
) -> Result<BuildInformation> {
  // Phase 1: every PR merged strictly between baseline and target
  let pull_requests = connector.pull_requests_between(baseline.as_ref(), Some(&target))?;

  // Phase 2: linked issues per PR, classified by label; a PR with no
  // tracked issue still yields a placeholder entry
  let mut change_issues: Vec<IssueEntry> = Vec::new();
  let mut bug_issues: Vec<IssueEntry> = Vec::new();
  let mut seen: BTreeSet<String> = BTreeSet::new();

  for pr in &pull_requests {
    let linked = connector.issues_for_pull_request(pr)?;

    if linked.is_empty() {
      let entry = IssueEntry::placeholder_for(pr);
      if seen.insert(entry.id.clone()) {
        change_issues.push(entry);
      }
      continue;
    }

    for issue in &linked {
      let entry = IssueEntry::from_issue(issue);
      if !seen.insert(entry.id.clone()) {
        continue;
      }
      match entry.kind {
        IssueKind::Bug => bug_issues.push(entry),
        _ => change_issues.push(entry),
      }
    }
  }

  // Phase 3: open bug-labeled issues, independent of the range
  let mut known_issues: Vec<IssueEntry> = Vec::new();
  for issue in connector.open_issues()? {
    if issue.is_open() && issue.has_label("bug") {
      known_issues.push(IssueEntry::from_issue(&issue));
    }
  }

  Ok(BuildInformation {
    target_version: target,
    target_hash,
    baseline_version: baseline,
    baseline_hash,
    change_issues,
    bug_issues,
    known_issues,
  })
}
