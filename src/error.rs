use thiserror::Error;

/// Unified error type for version resolution and connector plumbing.
///
/// Network and parse failures inside the paginated query layer are *not*
/// represented here: that layer degrades to empty results instead of
/// raising (see `connector::graphql`).
#[derive(Error, Debug)]
pub enum BuildNotesError {
  #[error("unparseable version tag '{0}': no major.minor.patch core found")]
  Format(String),

  #[error("repository has no releases; cannot infer a target version (pass --target)")]
  NoReleases,

  #[error("HEAD {current} is not the latest release tag {tag} ({tagged}); tag the build or pass --target")]
  CommitMismatch {
    tag: String,
    tagged: String,
    current: String,
  },

  #[error("unsafe identifier rejected: '{0}'")]
  InvalidArgument(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BuildNotesError>;

impl BuildNotesError {
  pub fn format(tag: impl Into<String>) -> Self {
    BuildNotesError::Format(tag.into())
  }

  pub fn invalid_argument(raw: impl Into<String>) -> Self {
    BuildNotesError::InvalidArgument(raw.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn format_error_mentions_the_tag_verbatim() {
    let err = BuildNotesError::format("not-a-version");
    assert!(err.to_string().contains("'not-a-version'"));
  }

  #[test]
  fn commit_mismatch_names_all_three_hashes() {
    let err = BuildNotesError::CommitMismatch {
      tag: "v1.2.3".into(),
      tagged: "aaa".into(),
      current: "bbb".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("v1.2.3"));
    assert!(msg.contains("aaa"));
    assert!(msg.contains("bbb"));
  }

  #[test]
  fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: BuildNotesError = io.into();
    assert!(err.to_string().contains("gone"));
  }

  #[test]
  fn no_releases_suggests_the_escape_hatch() {
    assert!(BuildNotesError::NoReleases.to_string().contains("--target"));
  }
}
