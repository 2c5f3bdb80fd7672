// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build the per-run index bundle (commits, tags, releases, PRs, version sequence) once and freeze it
// role: model/indices
// inputs: Already-fetched query results (one pass, construction time only)
// outputs: LookupData with name-keyed maps and a newest-first version sequence
// invariants: Built exactly once per run and never mutated; version sequence deduplicates prefix spellings; commit list is newest-first
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashMap, HashSet};

use crate::model::{PullRequest, Release, TagRef};
use crate::version::VersionTag;

/// Immutable per-run bundle the resolver and assembler read from.
#[derive(Debug, Default)]
pub struct LookupData {
  /// Commit hashes, newest-first.
  pub commits: Vec<String>,
  pub pull_requests: Vec<PullRequest>,
  pub releases: Vec<Release>,
  pub tags_by_name: HashMap<String, TagRef>,
  pub releases_by_name: HashMap<String, Release>,
  /// Parsed versions, newest-first.
  pub versions: Vec<VersionTag>,
}

impl LookupData {
  /// Assemble the bundle in one pass over fetched results. The sequence
  /// covers every parseable tag plus release tags that were never indexed
  /// as refs, deduplicated by normalized version.
  pub fn build(
    commits: Vec<String>,
    tags: Vec<TagRef>,
    releases: Vec<Release>,
    pull_requests: Vec<PullRequest>,
  ) -> Self {
    let mut versions: Vec<VersionTag> = Vec::new();
    let names = tags
      .iter()
      .map(|t| t.name.as_str())
      .chain(releases.iter().map(|r| r.tag_name.as_str()));

    for name in names {
      if let Some(v) = VersionTag::try_parse(name) {
        if !versions.contains(&v) {
          versions.push(v);
        }
      }
    }
    versions.sort_by(VersionTag::cmp_newest_first);

    let mut tags_by_name = HashMap::with_capacity(tags.len());
    for t in tags {
      tags_by_name.insert(t.name.clone(), t);
    }

    let mut releases_by_name = HashMap::with_capacity(releases.len());
    for r in &releases {
      releases_by_name.insert(r.tag_name.clone(), r.clone());
    }

    LookupData {
      commits,
      pull_requests,
      releases,
      tags_by_name,
      releases_by_name,
      versions,
    }
  }

  pub fn hash_for_tag_name(&self, name: &str) -> Option<String> {
    self.tags_by_name.get(name).map(|t| t.hash.clone())
  }

  /// Resolve a version to its commit, tolerating prefix respellings: the
  /// exact tag name wins, otherwise any tag parsing to the same version.
  pub fn hash_for_version(&self, version: &VersionTag) -> Option<String> {
    self.hash_for_tag_name(&version.tag).or_else(|| {
      self.tags_by_name.iter().find_map(|(name, tag_ref)| {
        VersionTag::try_parse(name)
          .filter(|v| v == version)
          .map(|_| tag_ref.hash.clone())
      })
    })
  }

  /// Commit hashes strictly after `from` (exclusive) up to `to` (inclusive)
  /// against the newest-first history. `to = None` starts at the newest
  /// commit; an unknown or absent `from` extends to the oldest.
  pub fn commit_range(&self, from: Option<&str>, to: Option<&str>) -> HashSet<&str> {
    let start = to
      .and_then(|h| self.commits.iter().position(|c| c == h))
      .unwrap_or(0);
    let end = from
      .and_then(|h| self.commits.iter().position(|c| c == h))
      .unwrap_or(self.commits.len());

    if start >= end {
      return HashSet::new();
    }
    self.commits[start..end].iter().map(|s| s.as_str()).collect()
  }
}
