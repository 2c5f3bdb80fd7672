// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Process-invocation-backed connector over one-shot git/gh calls
// role: connector/gh-cli
// inputs: Repository path, owner/name slug, caller-supplied identifiers (tag/PR/issue ids)
// outputs: The same LookupData bundle and issue lists as the GraphQL backend
// side_effects: Spawns git and gh subprocesses (one-shot, never retried)
// invariants:
// - Every caller-supplied identifier is validated against the safe pattern before any process spawns
// - Failing invocations propagate as errors; this backend never degrades silently
// errors: InvalidArgument pre-flight; spawn/exit failures with command + stderr context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::connector::RepoConnector;
use crate::error::{BuildNotesError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::lookup::LookupData;
use crate::model::{Issue, PullRequest, Release, TagRef};
use crate::util::run_git;

static SAFE_IDENTIFIER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]{0,127}$").unwrap());

/// Reject anything that is not a plain tag/issue/PR identifier before it is
/// interpolated into a spawned command.
pub fn validate_identifier(raw: &str) -> Result<()> {
  if SAFE_IDENTIFIER.is_match(raw) {
    Ok(())
  } else {
    Err(BuildNotesError::invalid_argument(raw))
  }
}

/// One-shot `gh` invocation; failures propagate straight to the caller.
fn run_gh(repo: &str, args: &[String]) -> Result<String> {
  let out = std::process::Command::new("gh")
    .args(args)
    .current_dir(repo)
    .output()
    .with_context(|| format!("spawning gh {:?}", args))?;

  if out.status.success() {
    Ok(String::from_utf8_lossy(&out.stdout).to_string())
  } else {
    let stderr = String::from_utf8_lossy(&out.stderr);
    Err(anyhow::anyhow!("gh {:?} failed: {}", args, stderr).into())
  }
}

#[derive(Debug)]
pub struct GhCliConnector {
  repo: String,
  slug: String,
  lookup: LookupData,
}

impl GhCliConnector {
  pub fn connect(repo: &str, owner: &str, name: &str) -> Result<Self> {
    validate_identifier(owner)?;
    validate_identifier(name)?;
    let slug = format!("{}/{}", owner, name);
    let lookup = Self::build_lookup(repo, &slug)?;

    Ok(GhCliConnector {
      repo: repo.to_string(),
      slug,
      lookup,
    })
  }

  fn build_lookup(repo: &str, slug: &str) -> Result<LookupData> {
    let commits: Vec<String> = run_git(repo, &["rev-list".into(), "HEAD".into()])?
      .lines()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .collect();

    // Peeled hash (third field) wins for annotated tags.
    let tags: Vec<TagRef> = run_git(
      repo,
      &[
        "for-each-ref".into(),
        "refs/tags".into(),
        "--format=%(refname:short) %(objectname) %(*objectname)".into(),
      ],
    )?
    .lines()
    .filter_map(|line| {
      let mut fields = line.split_whitespace();
      let name = fields.next()?.to_string();
      let object = fields.next()?.to_string();
      let peeled = fields.next().map(str::to_string);

      Some(TagRef {
        name,
        hash: peeled.unwrap_or(object),
      })
    })
    .collect();

    let releases_raw = run_gh(
      repo,
      &[
        "release".into(),
        "list".into(),
        "--repo".into(),
        slug.to_string(),
        "--limit".into(),
        "200".into(),
        "--json".into(),
        "tagName,publishedAt,isPrerelease".into(),
      ],
    )?;
    let releases_value: serde_json::Value =
      serde_json::from_str(&releases_raw).context("parsing gh release list output")?;
    let releases: Vec<Release> = releases_value
      .as_array()
      .context("gh release list: expected a JSON array")?
      .iter()
      .filter_map(|node| {
        let tag_name = node.fetch("tagName").to::<String>()?;
        Some(Release {
          tag_name,
          published_at: node.fetch("publishedAt").to::<String>(),
          is_pre_release: node.fetch("isPrerelease").to::<bool>().unwrap_or(false),
        })
      })
      .collect();

    let pulls_raw = run_gh(
      repo,
      &[
        "pr".into(),
        "list".into(),
        "--repo".into(),
        slug.to_string(),
        "--state".into(),
        "merged".into(),
        "--limit".into(),
        "500".into(),
        "--json".into(),
        "number,title,url,mergeCommit,headRefOid,labels".into(),
      ],
    )?;
    let pulls_value: serde_json::Value =
      serde_json::from_str(&pulls_raw).context("parsing gh pr list output")?;
    let pull_requests: Vec<PullRequest> = pulls_value
      .as_array()
      .context("gh pr list: expected a JSON array")?
      .iter()
      .filter_map(|node| {
        let number = node.fetch("number").to::<i64>()?;
        Some(PullRequest {
          number,
          title: node.fetch("title").to_or_default::<String>(),
          url: node.fetch("url").to_or_default::<String>(),
          // The listing is already filtered to merged PRs.
          merged: true,
          merge_commit: node.fetch("mergeCommit.oid").to::<String>(),
          head_ref: node.fetch("headRefOid").to::<String>(),
          labels: node
            .fetch("labels")
            .items()
            .iter()
            .filter_map(|l| l.fetch("name").to::<String>())
            .collect(),
        })
      })
      .collect();

    Ok(LookupData::build(commits, tags, releases, pull_requests))
  }
}

impl RepoConnector for GhCliConnector {
  fn lookup(&self) -> &LookupData {
    &self.lookup
  }

  fn issues_for_pull_request(&self, pr: &PullRequest) -> Result<Vec<Issue>> {
    let id = pr.number.to_string();
    validate_identifier(&id)?;

    let raw = run_gh(
      &self.repo,
      &[
        "pr".into(),
        "view".into(),
        id,
        "--repo".into(),
        self.slug.clone(),
        "--json".into(),
        "closingIssuesReferences".into(),
      ],
    )?;
    let value: serde_json::Value = serde_json::from_str(&raw).context("parsing gh pr view output")?;

    Ok(
      value
        .fetch("closingIssuesReferences")
        .items()
        .iter()
        .filter_map(issue_from_gh_node)
        .collect(),
    )
  }

  fn issue_details(&self, number: i64) -> Result<Option<Issue>> {
    let id = number.to_string();
    validate_identifier(&id)?;

    let raw = run_gh(
      &self.repo,
      &[
        "issue".into(),
        "view".into(),
        id,
        "--repo".into(),
        self.slug.clone(),
        "--json".into(),
        "number,title,url,state,labels".into(),
      ],
    )?;
    let value: serde_json::Value = serde_json::from_str(&raw).context("parsing gh issue view output")?;

    Ok(issue_from_gh_node(&value))
  }

  fn open_issues(&self) -> Result<Vec<Issue>> {
    let raw = run_gh(
      &self.repo,
      &[
        "issue".into(),
        "list".into(),
        "--repo".into(),
        self.slug.clone(),
        "--state".into(),
        "open".into(),
        "--limit".into(),
        "200".into(),
        "--json".into(),
        "number,title,url,state,labels".into(),
      ],
    )?;
    let value: serde_json::Value = serde_json::from_str(&raw).context("parsing gh issue list output")?;

    Ok(
      value
        .as_array()
        .context("gh issue list: expected a JSON array")?
        .iter()
        .filter_map(issue_from_gh_node)
        .collect(),
    )
  }
}

fn issue_from_gh_node(node: &serde_json::Value) -> Option<Issue> {
  let number = node.fetch("number").to::<i64>()?;

  Some(Issue {
    number,
    title: node.fetch("title").to_or_default::<String>(),
    url: node.fetch("url").to_or_default::<String>(),
    state: node.fetch("state").to_or_default::<String>().to_ascii_lowercase(),
    labels: node
      .fetch("labels")
      .items()
      .iter()
      .filter_map(|l| l.fetch("name").to::<String>())
      .collect(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn safe_identifiers_pass() {
    for id in ["v1.2.3", "release/2024.1", "42", "ver-1.1.0", "a_b.c-d"] {
      assert!(validate_identifier(id).is_ok(), "id: {}", id);
    }
  }

  #[test]
  fn unsafe_identifiers_are_rejected() {
    for id in ["", " ", "a b", "tag;rm -rf /", "$(whoami)", "-rf", "`x`", "..", "a\nb", "&v1"] {
      let err = validate_identifier(id).unwrap_err();
      assert!(matches!(err, BuildNotesError::InvalidArgument(_)), "id: {:?}", id);
    }
  }

  #[test]
  fn overlong_identifiers_are_rejected() {
    let id = "a".repeat(200);
    assert!(validate_identifier(&id).is_err());
  }

  #[test]
  fn connect_rejects_unsafe_owner_before_spawning() {
    // Validation runs first, so the bogus repo path is never touched.
    let err = GhCliConnector::connect("/nonexistent", "bad owner", "widget").unwrap_err();
    assert!(matches!(err, BuildNotesError::InvalidArgument(_)));
  }

  #[test]
  fn gh_node_parsing_drops_entries_without_numbers() {
    let value = serde_json::json!([
      {"number": 7, "title": "Fix", "url": "u", "state": "OPEN", "labels": [{"name": "bug"}]},
      {"title": "No number"}
    ]);
    let issues: Vec<Issue> = value.as_array().unwrap().iter().filter_map(issue_from_gh_node).collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].state, "open");
    assert_eq!(issues[0].labels, vec!["bug"]);
  }
}
