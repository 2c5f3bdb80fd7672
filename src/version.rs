use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BuildNotesError, Result};

/// Markers that flag the delimited segment after the numeric core as a
/// pre-release. Matched as tokens, never as substrings: `rc1` and `rc.1`
/// qualify, `arch` does not.
const PRE_RELEASE_MARKERS: [&str; 4] = ["alpha", "beta", "rc", "pre"];

/// A version tag as found in repository history.
///
/// `tag` preserves the original spelling verbatim; `full_version` is the
/// same string with any free-form prefix stripped (`ver-1.1.0` → `1.1.0`).
/// Two tags are the same version iff their `full_version` strings match,
/// independent of prefix spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionTag {
  pub tag: String,
  pub full_version: String,
  pub is_pre_release: bool,
}

impl PartialEq for VersionTag {
  fn eq(&self, other: &Self) -> bool {
    self.full_version == other.full_version
  }
}

impl Eq for VersionTag {}

impl fmt::Display for VersionTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.tag)
  }
}

impl VersionTag {
  /// Parse a raw tag string.
  ///
  /// Staged scan: locate the dotted numeric core (everything before it is
  /// prefix, everything from it on is `full_version`), then classify the
  /// delimited segment immediately following the core. Build metadata after
  /// `+` never affects the pre-release flag.
  pub fn parse(tag: &str) -> Result<Self> {
    let (start, core_end, _) = locate_core(tag).ok_or_else(|| BuildNotesError::format(tag))?;
    let full_version = tag[start..].to_string();
    let is_pre_release = pre_release_segment(&tag[core_end..]);

    Ok(VersionTag {
      tag: tag.to_string(),
      full_version,
      is_pre_release,
    })
  }

  /// Like [`parse`](Self::parse), but yields `None` for unparseable tags.
  pub fn try_parse(tag: &str) -> Option<Self> {
    Self::parse(tag).ok()
  }

  /// The numeric core triple. `full_version` always starts with the core by
  /// construction, so this cannot fail for a parsed tag.
  pub fn core(&self) -> (u64, u64, u64) {
    locate_core(&self.full_version)
      .map(|(_, _, triple)| triple)
      .unwrap_or((0, 0, 0))
  }

  /// Newest-first ordering: higher numeric core first; for an equal core the
  /// full release sorts before its pre-releases.
  pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
    let a = self.core();
    let b = other.core();
    b.cmp(&a)
      .then_with(|| self.is_pre_release.cmp(&other.is_pre_release))
  }
}

/// Find the first `N.N.N` run in `s`: returns (start, end-of-core, triple).
fn locate_core(s: &str) -> Option<(usize, usize, (u64, u64, u64))> {
  let bytes = s.as_bytes();

  for start in 0..bytes.len() {
    if !bytes[start].is_ascii_digit() {
      continue;
    }
    // Only consider the first digit of a run.
    if start > 0 && bytes[start - 1].is_ascii_digit() {
      continue;
    }
    if let Some((end, triple)) = core_at(s, start) {
      return Some((start, end, triple));
    }
  }

  None
}

fn core_at(s: &str, start: usize) -> Option<(usize, (u64, u64, u64))> {
  let mut pos = start;
  let mut parts = [0u64; 3];

  for (i, slot) in parts.iter_mut().enumerate() {
    let digits_end = s[pos..]
      .find(|c: char| !c.is_ascii_digit())
      .map(|off| pos + off)
      .unwrap_or(s.len());

    if digits_end == pos {
      return None;
    }
    *slot = s[pos..digits_end].parse().ok()?;
    pos = digits_end;

    if i < 2 {
      if s[pos..].starts_with('.') {
        pos += 1;
      } else {
        return None;
      }
    }
  }

  Some((pos, (parts[0], parts[1], parts[2])))
}

/// Classify the remainder following the numeric core.
fn pre_release_segment(rest: &str) -> bool {
  // Build metadata never affects the flag.
  let rest = rest.split('+').next().unwrap_or("");

  let delim = match rest.chars().next() {
    Some(c @ ('-' | '.')) => c,
    _ => return false,
  };

  let segment = rest[1..]
    .split(|c: char| c == '-' || c == '.' || c == '+')
    .next()
    .unwrap_or("");

  if segment.is_empty() {
    return false;
  }
  if is_marker_token(segment) {
    return true;
  }

  // A generic fourth dot-separated segment (1.2.3.4) also marks a
  // pre-release, but only when purely numeric.
  delim == '.' && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_marker_token(segment: &str) -> bool {
  let lower = segment.to_ascii_lowercase();

  PRE_RELEASE_MARKERS.iter().any(|marker| match lower.strip_prefix(marker) {
    Some(rest) => rest.chars().next().map_or(true, |c| !c.is_ascii_alphabetic()),
    None => false,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn parse(tag: &str) -> VersionTag {
    VersionTag::parse(tag).expect(tag)
  }

  #[test]
  fn original_tag_is_preserved_verbatim() {
    for tag in ["v1.0.0", "release-2.3.4-rc1", "1.2.3+build.7"] {
      assert_eq!(parse(tag).tag, tag);
    }
  }

  #[test]
  fn prefix_is_stripped_from_full_version() {
    assert_eq!(parse("v1.0.0").full_version, "1.0.0");
    assert_eq!(parse("ver-1.1.0").full_version, "1.1.0");
    assert_eq!(parse("release/2.3.4").full_version, "2.3.4");
    assert_eq!(parse("1.2.3").full_version, "1.2.3");
  }

  #[test]
  fn equality_ignores_prefix_spelling() {
    assert_eq!(parse("ver-1.1.0"), parse("v1.1.0"));
    assert_ne!(parse("v1.1.0"), parse("v1.1.1"));
  }

  #[test]
  fn arch_is_not_a_pre_release_but_rc1_is() {
    // Regression: `rc` must match as a token, never as a substring.
    assert!(!parse("v1.0.0.arch").is_pre_release);
    assert!(parse("v1.0.0-rc1").is_pre_release);
  }

  #[test]
  fn marker_tokens_flag_pre_releases() {
    assert!(parse("1.2.3-alpha").is_pre_release);
    assert!(parse("1.2.3-beta.2").is_pre_release);
    assert!(parse("1.2.3.rc.1").is_pre_release);
    assert!(parse("1.2.3-pre2").is_pre_release);
    assert!(parse("2.0.0-RC1").is_pre_release);
  }

  #[test]
  fn marker_followed_by_letters_is_a_different_word() {
    assert!(!parse("1.2.3-preview").is_pre_release);
    assert!(!parse("1.2.3-betaish").is_pre_release);
  }

  #[test]
  fn fourth_numeric_segment_is_a_pre_release() {
    assert!(parse("1.2.3.4").is_pre_release);
    // But only when dotted and purely numeric.
    assert!(!parse("1.2.3-4").is_pre_release);
    assert!(!parse("1.2.3.x4").is_pre_release);
  }

  #[test]
  fn build_metadata_never_affects_the_flag() {
    assert!(!parse("1.2.3+build.5").is_pre_release);
    assert!(!parse("1.2.3+rc1").is_pre_release);
    assert!(parse("1.2.3-rc1+build.5").is_pre_release);
  }

  #[test]
  fn missing_core_is_a_format_error() {
    for tag in ["", "latest", "v1.2", "v1", "one.two.three"] {
      let err = VersionTag::parse(tag).unwrap_err();
      assert!(matches!(err, BuildNotesError::Format(_)), "tag: {}", tag);
      assert!(VersionTag::try_parse(tag).is_none());
    }
  }

  #[test]
  fn core_triple_parses_multi_digit_components() {
    assert_eq!(parse("v10.20.30").core(), (10, 20, 30));
  }

  #[test]
  fn newest_first_ordering_by_core_then_release_kind() {
    let mut versions = vec![
      parse("v1.0.0"),
      parse("v2.0.0-beta.1"),
      parse("ver-1.1.0"),
      parse("v2.0.0"),
    ];
    versions.sort_by(VersionTag::cmp_newest_first);

    let tags: Vec<&str> = versions.iter().map(|v| v.tag.as_str()).collect();
    assert_eq!(tags, vec!["v2.0.0", "v2.0.0-beta.1", "ver-1.1.0", "v1.0.0"]);
  }

  proptest! {
    #[test]
    fn parse_round_trips_generated_tags(
      prefix in proptest::sample::select(vec!["", "v", "V", "ver-", "release-"]),
      major in 0u16..100,
      minor in 0u16..100,
      patch in 0u16..100,
      suffix in proptest::sample::select(vec!["", "-rc1", "-beta.2", "+build5"]),
    ) {
      let tag = format!("{}{}.{}.{}{}", prefix, major, minor, patch, suffix);
      let parsed = VersionTag::parse(&tag).unwrap();

      prop_assert_eq!(&parsed.tag, &tag);
      prop_assert_eq!(&parsed.full_version, &format!("{}.{}.{}{}", major, minor, patch, suffix));
      prop_assert_eq!(parsed.is_pre_release, suffix.starts_with("-rc") || suffix.starts_with("-beta"));
      prop_assert_eq!(parsed.core(), (major as u64, minor as u64, patch as u64));
    }
  }
}
