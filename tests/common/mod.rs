use assert_cmd::Command;
use serde_json::json;

/// Wrap a connection payload in the GraphQL response envelope the binary
/// expects for the given dotted path.
#[allow(dead_code)]
pub fn envelope(path: &[&str], connection: serde_json::Value) -> serde_json::Value {
  let mut value = connection;
  for key in path.iter().rev() {
    value = json!({ (*key): value });
  }
  value
}

#[allow(dead_code)]
pub fn last_page(nodes: serde_json::Value) -> serde_json::Value {
  json!({
    "pageInfo": {"hasNextPage": false, "endCursor": null},
    "nodes": nodes,
  })
}

/// The standard fixture: six commits, three releases, three merged PRs
/// (one outside the range, one without linked issues), two open issues.
#[allow(dead_code)]
pub fn fixture_env() -> Vec<(String, String)> {
  let history = json!([envelope(
    &["data", "repository", "defaultBranchRef", "target", "history"],
    last_page(json!([
      {"oid": "c5"}, {"oid": "c4"}, {"oid": "c3"}, {"oid": "c2"}, {"oid": "c1"}, {"oid": "c0"}
    ])),
  )]);

  let tags = json!([envelope(
    &["data", "repository", "refs"],
    last_page(json!([
      {"name": "v2.0.0", "target": {"oid": "c5"}},
      {"name": "ver-1.1.0", "target": {"oid": "c2"}},
      {"name": "v1.0.0", "target": {"oid": "c0"}}
    ])),
  )]);

  let releases = json!([envelope(
    &["data", "repository", "releases"],
    last_page(json!([
      {"tagName": "v2.0.0", "publishedAt": "2025-03-01T00:00:00Z", "isPrerelease": false},
      {"tagName": "ver-1.1.0", "publishedAt": "2025-02-01T00:00:00Z", "isPrerelease": false},
      {"tagName": "v1.0.0", "publishedAt": "2025-01-01T00:00:00Z", "isPrerelease": false}
    ])),
  )]);

  let pulls = json!([envelope(
    &["data", "repository", "pullRequests"],
    last_page(json!([
      {"number": 5, "title": "Widget groundwork", "url": "https://github.com/acme/widget/pull/5",
       "merged": true, "mergeCommit": {"oid": "c5"}, "headRefOid": "h5", "labels": {"nodes": []}},
      {"number": 9, "title": "Tidy build scripts", "url": "https://github.com/acme/widget/pull/9",
       "merged": true, "mergeCommit": {"oid": "c4"}, "headRefOid": "h9", "labels": {"nodes": []}},
      {"number": 6, "title": "Old work", "url": "https://github.com/acme/widget/pull/6",
       "merged": true, "mergeCommit": {"oid": "c1"}, "headRefOid": "h6", "labels": {"nodes": []}}
    ])),
  )]);

  // Linked-issue pages are served in call order: PR #5 first, then PR #9.
  let linked = json!([
    envelope(
      &["data", "repository", "pullRequest", "closingIssuesReferences"],
      last_page(json!([
        {"number": 7, "title": "Fix crash", "url": "https://github.com/acme/widget/issues/7",
         "state": "CLOSED", "labels": {"nodes": [{"name": "bug"}]}},
        {"number": 8, "title": "Add widget", "url": "https://github.com/acme/widget/issues/8",
         "state": "CLOSED", "labels": {"nodes": [{"name": "enhancement"}]}}
      ])),
    ),
    envelope(
      &["data", "repository", "pullRequest", "closingIssuesReferences"],
      last_page(json!([])),
    ),
  ]);

  let issues = json!([envelope(
    &["data", "repository", "issues"],
    last_page(json!([
      {"number": 42, "title": "Crash on start", "url": "https://github.com/acme/widget/issues/42",
       "state": "OPEN", "labels": {"nodes": [{"name": "Bug"}]}},
      {"number": 43, "title": "How do I...", "url": "https://github.com/acme/widget/issues/43",
       "state": "OPEN", "labels": {"nodes": [{"name": "question"}]}}
    ])),
  )]);

  vec![
    ("GBN_TEST_GQL_HISTORY".into(), history.to_string()),
    ("GBN_TEST_GQL_TAGS".into(), tags.to_string()),
    ("GBN_TEST_GQL_RELEASES".into(), releases.to_string()),
    ("GBN_TEST_GQL_PULLS".into(), pulls.to_string()),
    ("GBN_TEST_GQL_LINKED".into(), linked.to_string()),
    ("GBN_TEST_GQL_ISSUES".into(), issues.to_string()),
  ]
}

/// Binary under test with the standard fixture wired in.
#[allow(dead_code)]
pub fn cmd_with_fixture() -> Command {
  let mut cmd = Command::cargo_bin("git-build-notes").unwrap();
  for (key, value) in fixture_env() {
    cmd.env(key, value);
  }
  cmd.args(["--github", "acme/widget"]);
  cmd
}
