mod common;

use assert_cmd::Command;
use common::{cmd_with_fixture, fixture_env};
use predicates::prelude::*;

fn bare_mock_cmd() -> Command {
  // A single empty fixture key keeps the binary on the mock transport while
  // every query degrades to an empty result.
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  cmd.env("GBN_TEST_GQL_HISTORY", "[]");
  cmd.args(["--github", "acme/widget"]);
  cmd
}

#[test]
fn unreachable_host_degrades_but_explicit_target_still_reports() {
  bare_mock_cmd()
    .args(["--target", "v1.0.0"])
    .assert()
    .success()
    .stdout(predicate::str::contains("# Build notes for v1.0.0"))
    .stdout(predicate::str::contains("- Baseline: none (first release)"))
    .stdout(predicate::str::contains("_None._"));
}

#[test]
fn no_releases_without_an_explicit_target_is_fatal() {
  bare_mock_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("no releases"));
}

#[test]
fn head_off_the_latest_tag_is_a_commit_mismatch() {
  // Same fixture, but history starts one commit past the v2.0.0 tag.
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  for (key, value) in fixture_env() {
    if key == "GBN_TEST_GQL_HISTORY" {
      let history = serde_json::json!([common::envelope(
        &["data", "repository", "defaultBranchRef", "target", "history"],
        common::last_page(serde_json::json!([
          {"oid": "c6"}, {"oid": "c5"}, {"oid": "c4"}
        ])),
      )]);
      cmd.env(key, history.to_string());
    } else {
      cmd.env(key, value);
    }
  }

  cmd
    .args(["--github", "acme/widget"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("is not the latest release tag v2.0.0"));
}

#[test]
fn degraded_linked_issue_queries_fall_back_to_placeholders() {
  // Drop the linked-issue fixture entirely: both in-range PRs degrade to
  // zero linked issues and surface as placeholder change entries.
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  for (key, value) in fixture_env() {
    if key != "GBN_TEST_GQL_LINKED" {
      cmd.env(key, value);
    }
  }

  cmd
    .args(["--github", "acme/widget"])
    .assert()
    .success()
    .stdout(predicate::str::contains("- [#5 PR #5](https://github.com/acme/widget/pull/5)"))
    .stdout(predicate::str::contains("- [#9 PR #9](https://github.com/acme/widget/pull/9)"))
    .stdout(predicate::str::contains("## Bug Fixes\n\n_None._"));
}

#[test]
fn unknown_owner_slug_is_rejected_before_any_call() {
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  cmd.env("GBN_TEST_GQL_HISTORY", "[]");
  cmd
    .args(["--github", "not-a-slug"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("owner/name"));
}

#[test]
fn unsafe_owner_slug_is_rejected_pre_flight() {
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  cmd.env("GBN_TEST_GQL_HISTORY", "[]");
  cmd
    .args(["--github", "acme/bad name"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unsafe identifier"));
}

#[test]
fn missing_origin_asks_for_the_github_flag() {
  let dir = tempfile::TempDir::new().unwrap();
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  cmd.env("GBN_TEST_GQL_HISTORY", "[]");
  cmd
    .current_dir(dir.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("--github"));
}

#[test]
fn fixture_helper_exports_all_six_shapes() {
  let keys: Vec<String> = fixture_env().into_iter().map(|(k, _)| k).collect();
  assert_eq!(keys.len(), 6);
  for op in ["HISTORY", "TAGS", "RELEASES", "PULLS", "LINKED", "ISSUES"] {
    assert!(keys.iter().any(|k| k.ends_with(op)), "missing {op}");
  }
  // Keep the happy-path command importable from here as well.
  let _ = cmd_with_fixture();
}
