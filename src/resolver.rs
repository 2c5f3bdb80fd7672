// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve the target version for a report and its baseline predecessor from frozen tag/release history
// role: resolution/core
// inputs: Optional explicit version, current commit hash, &LookupData
// outputs: (VersionTag, hash) pairs; baseline side may be (None, None) or degraded (Some, None)
// invariants:
// - Pure functions: no I/O, no mutation of LookupData, repeatable across calls
// - Explicit versions win unconditionally and are never cross-checked against history
// - Pre-releases never serve as baselines for full-release targets
// errors: NoReleases and CommitMismatch are fatal and never retried
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cmp::Ordering;

use crate::error::{BuildNotesError, Result};
use crate::lookup::LookupData;
use crate::version::VersionTag;

/// Resolve the version the report is being generated for.
///
/// Without an explicit version the build must sit exactly on the most
/// recently published release tag.
pub fn determine_target_version(
  explicit: Option<&str>,
  current_hash: Option<&str>,
  lookup: &LookupData,
) -> Result<(VersionTag, Option<String>)> {
  if let Some(raw) = explicit {
    let version = VersionTag::parse(raw)?;
    return Ok((version, current_hash.map(str::to_string)));
  }

  let latest = lookup
    .releases
    .iter()
    .max_by_key(|r| r.published_instant())
    .ok_or(BuildNotesError::NoReleases)?;

  let version = VersionTag::parse(&latest.tag_name)?;
  let tagged = lookup.hash_for_tag_name(&latest.tag_name);

  let on_tag = matches!((tagged.as_deref(), current_hash), (Some(t), Some(c)) if t == c);
  if on_tag {
    return Ok((version, tagged));
  }

  Err(BuildNotesError::CommitMismatch {
    tag: latest.tag_name.clone(),
    tagged: tagged.unwrap_or_else(|| "<unknown>".into()),
    current: current_hash.map(str::to_string).unwrap_or_else(|| "<unknown>".into()),
  })
}

/// Baseline = the predecessor of `target` in the newest-first sequence.
///
/// A pre-release target takes its immediate predecessor; a full-release
/// target skips intervening pre-releases. A predecessor that is known to
/// the sequence but absent from the tag index yields `(Some, None)`.
pub fn determine_baseline_version(
  target: &VersionTag,
  lookup: &LookupData,
) -> (Option<VersionTag>, Option<String>) {
  let versions = &lookup.versions;

  // Position of the target; when absent (explicit version not tagged yet)
  // the walk starts at the first strictly-older entry.
  let start = match versions.iter().position(|v| v == target) {
    Some(pos) => pos + 1,
    None => versions
      .iter()
      .position(|v| target.cmp_newest_first(v) == Ordering::Less)
      .unwrap_or(versions.len()),
  };

  let predecessor = if target.is_pre_release {
    versions[start..].first()
  } else {
    versions[start..].iter().find(|v| !v.is_pre_release)
  };

  match predecessor {
    None => (None, None),
    Some(pred) => {
      let hash = lookup.hash_for_version(pred);
      (Some(pred.clone()), hash)
    }
  }
}
