pub mod gh_cli;
pub mod graphql;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::cli::{Backend, EffectiveConfig};
use crate::error::Result;
use crate::lookup::LookupData;
use crate::model::{Issue, PullRequest};
use crate::version::VersionTag;

/// Capability interface binding resolution and assembly to a concrete host
/// backend. Implementations: GraphQL-backed, `gh`-CLI process-backed, and
/// scripted mocks in tests.
pub trait RepoConnector {
  /// The frozen per-run index bundle.
  fn lookup(&self) -> &LookupData;

  /// Newest-first parsed version history.
  fn tag_history(&self) -> &[VersionTag] {
    &self.lookup().versions
  }

  /// Commit hash for a tag; `None` asks for the current build commit.
  fn hash_for_tag(&self, tag: Option<&VersionTag>) -> Option<String> {
    match tag {
      Some(version) => self.lookup().hash_for_version(version),
      None => self.lookup().commits.first().cloned(),
    }
  }

  /// Merged pull requests strictly between two versions, by commit-range
  /// membership of the merge commit (or head ref) in the shared history.
  fn pull_requests_between(
    &self,
    from: Option<&VersionTag>,
    to: Option<&VersionTag>,
  ) -> Result<Vec<PullRequest>> {
    let lookup = self.lookup();
    let from_hash = from.and_then(|v| lookup.hash_for_version(v));
    let to_hash = to.and_then(|v| lookup.hash_for_version(v));
    let range = lookup.commit_range(from_hash.as_deref(), to_hash.as_deref());

    Ok(
      lookup
        .pull_requests
        .iter()
        .filter(|pr| pr.merged)
        .filter(|pr| {
          pr.merge_commit.as_deref().is_some_and(|h| range.contains(h))
            || pr.head_ref.as_deref().is_some_and(|h| range.contains(h))
        })
        .cloned()
        .collect(),
    )
  }

  /// Issues linked to one pull request.
  fn issues_for_pull_request(&self, pr: &PullRequest) -> Result<Vec<Issue>>;

  /// Title/classification/url lookup for a single issue id; `None` when the
  /// host does not know the issue.
  fn issue_details(&self, number: i64) -> Result<Option<Issue>>;

  /// Point-in-time open issues, independent of any version range.
  fn open_issues(&self) -> Result<Vec<Issue>>;
}

/// Select and construct the backend for a run.
pub fn build_connector(cfg: &EffectiveConfig) -> Result<Box<dyn RepoConnector>> {
  let (owner, name) = resolve_owner_name(cfg)?;

  match cfg.backend {
    Backend::Graphql => Ok(Box::new(graphql::GraphqlConnector::connect(&owner, &name))),
    Backend::GhCli => Ok(Box::new(gh_cli::GhCliConnector::connect(&cfg.repo, &owner, &name)?)),
  }
}

fn resolve_owner_name(cfg: &EffectiveConfig) -> Result<(String, String)> {
  if let Some(slug) = &cfg.github {
    let (owner, name) = slug
      .split_once('/')
      .with_context(|| format!("--github expects owner/name, got '{slug}'"))?;
    gh_cli::validate_identifier(owner)?;
    gh_cli::validate_identifier(name)?;
    return Ok((owner.to_string(), name.to_string()));
  }

  parse_origin_github(&cfg.repo)
    .context("origin is not a GitHub remote; pass --github owner/name")
    .map_err(Into::into)
}

/// Parse `remote.origin.url` to extract (owner, repo) when hosted on GitHub.
pub fn parse_origin_github(repo: &str) -> Option<(String, String)> {
  static RE_ORIGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:git@github\.com:|https?://github\.com/)([^/]+)/([^/]+?)(?:\.git)?$").unwrap());

  let url = crate::util::run_git(repo, &["config".into(), "--get".into(), "remote.origin.url".into()]).ok()?;
  let caps = RE_ORIGIN.captures(url.trim())?;

  Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

/// Discover a GitHub token: env vars first, then `gh auth token`.
pub fn github_token() -> Option<String> {
  for key in ["GITHUB_TOKEN", "GH_TOKEN"] {
    if let Ok(t) = std::env::var(key) {
      if !t.trim().is_empty() {
        return Some(t);
      }
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();
      if !t.is_empty() {
        return Some(t);
      }
    }
  }

  None
}
