use anyhow::Result;

use crate::model::{BuildInformation, IssueEntry};
use crate::util::short_hash;

/// Render the markdown report. Output is deterministic: no timestamps, no
/// environment-dependent content.
pub fn render_markdown(info: &BuildInformation) -> String {
  let mut out = String::new();

  out.push_str(&format!("# Build notes for {}\n\n", info.target_version));
  out.push_str(&format!("- Target: {}{}\n", info.target_version, hash_suffix(info.target_hash.as_deref())));
  match &info.baseline_version {
    Some(baseline) => {
      out.push_str(&format!("- Baseline: {}{}\n", baseline, hash_suffix(info.baseline_hash.as_deref())));
    }
    None => out.push_str("- Baseline: none (first release)\n"),
  }
  out.push('\n');

  section(&mut out, "Changes", &info.change_issues);
  section(&mut out, "Bug Fixes", &info.bug_issues);
  section(&mut out, "Known Issues", &info.known_issues);

  out
}

pub fn render_json(info: &BuildInformation) -> Result<String> {
  Ok(serde_json::to_string_pretty(info)?)
}

fn hash_suffix(hash: Option<&str>) -> String {
  match hash {
    Some(h) => format!(" (`{}`)", short_hash(h)),
    None => String::new(),
  }
}

fn section(out: &mut String, title: &str, entries: &[IssueEntry]) {
  out.push_str(&format!("## {}\n\n", title));

  if entries.is_empty() {
    out.push_str("_None._\n\n");
    return;
  }

  for entry in entries {
    match &entry.url {
      Some(url) => out.push_str(&format!("- [{} {}]({})\n", entry.id, entry.title, url)),
      None => out.push_str(&format!("- {} {}\n", entry.id, entry.title)),
    }
  }
  out.push('\n');
}
