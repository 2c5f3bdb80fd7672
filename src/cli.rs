use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "git-build-notes",
    version,
    about = "Generate build notes from GitHub tags, releases, pull requests, and issues",
    long_about = None
)]
pub struct Cli {
  /// Path to a Git repository (default: current dir)
  #[arg(long, default_value = ".")]
  pub repo: PathBuf,

  /// Explicit target version; skips tag/release inference entirely
  #[arg(long)]
  pub target: Option<String>,

  /// GitHub repository as owner/name (default: derived from the origin remote)
  #[arg(long)]
  pub github: Option<String>,

  /// Backend used to reach the host
  #[arg(long, value_enum, default_value_t = Backend::Graphql)]
  pub backend: Backend,

  /// Output format
  #[arg(long, value_enum, default_value_t = Format::Markdown)]
  pub format: Format,

  /// Output file (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
  Graphql,
  GhCli,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
  Markdown,
  Json,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub repo: String, // absolute path for stability
  pub target: Option<String>,
  pub github: Option<String>,
  pub backend: Backend,
  pub format: Format,
  pub out: String,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let target = match &cli.target {
    Some(raw) => {
      let trimmed = raw.trim();
      if trimmed.is_empty() {
        bail!("--target must not be empty");
      }
      Some(trimmed.to_string())
    }
    None => None,
  };

  let github = match &cli.github {
    Some(slug) if !slug.contains('/') => bail!("--github expects owner/name, got '{}'", slug),
    Some(slug) => Some(slug.clone()),
    None => None,
  };

  Ok(EffectiveConfig {
    repo: util::canonicalize_lossy(&cli.repo),
    target,
    github,
    backend: cli.backend,
    format: cli.format,
    out: cli.out,
  })
}
