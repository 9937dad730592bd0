//! End-to-end reconciliation against an on-disk source tree.

use covrecon::models::PassReport;
use covrecon::paths::{PathSettings, PathStyle};
use covrecon::rules::RuleProfile;
use covrecon::service::{Connection, SnapshotService};
use covrecon::tree::DiskTree;
use covrecon::{run_pass, PassError, PassSettings};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SNAPSHOT: &str = r#"{
    "streams": [{"id": "main"}],
    "projects": [{"name": "acme", "projectKey": 10001}],
    "defects": [
        {
            "cid": 1001,
            "displayType": "Null pointer dereference",
            "mergeKey": "abc123",
            "filePathname": "/build/src/foo.c",
            "defectStateAttributeValues": [{"name": "DefectStatus", "value": "New"}]
        }
    ],
    "occurrences": {
        "1001": {
            "defectInstances": [
                {
                    "domain": "STATIC_C",
                    "checkerName": "MISRA C 2004 Rule 1.1",
                    "subcategory": "",
                    "impact": "High",
                    "longDescription": "long",
                    "events": [
                        {
                            "main": true,
                            "filePathname": "/build/src/foo.c",
                            "lineNumber": 42,
                            "eventTag": "deref",
                            "eventDescription": "pointer dereferenced"
                        }
                    ]
                }
            ]
        }
    }
}"#;

const PROFILE: &str = r#"
[[rules]]
language = "c"
key = "STATIC_C_MISRA.*"
"#;

fn write_tree(root: &Path) {
    fs::create_dir_all(root.join("src")).unwrap();
    let body: String = (0..60).map(|i| format!("int v{};\n", i)).collect();
    fs::write(root.join("src/foo.c"), body).unwrap();
}

fn service(root: &Path, tls: bool) -> SnapshotService {
    let p = root.join("defects.json");
    fs::write(&p, SNAPSHOT).unwrap();
    let conn = Connection {
        host: "cim.example.com".into(),
        port: 8443,
        tls,
    };
    SnapshotService::load(conn, &p).unwrap()
}

fn settings(root: &Path) -> PassSettings {
    PassSettings {
        enabled: true,
        stream: Some("main".into()),
        project: None,
        candidate_dirs: vec!["src".into()],
        paths: PathSettings {
            strip_prefix: "/build".into(),
            working_dir: root.to_string_lossy().to_string(),
            style: PathStyle::Posix,
        },
    }
}

fn pass(root: &Path, s: &PassSettings) -> Result<PassReport, PassError> {
    let svc = service(root, true);
    let tree = DiskTree::scan(root, &["src".to_string()]);
    let profile = RuleProfile::from_toml_str(PROFILE).unwrap();
    run_pass(&svc, &tree, &profile, s)
}

#[test]
fn single_misra_defect_becomes_one_issue() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_tree(root);

    let report = pass(root, &settings(root)).unwrap();
    assert_eq!(report.counters.total, 1);
    assert_eq!(report.counters.high, 1);
    assert_eq!(report.counters.medium, 0);
    assert_eq!(report.counters.low, 0);
    assert_eq!(report.issues.len(), 1);

    let issue = &report.issues[0];
    assert_eq!(issue.file, root.join("src/foo.c"));
    assert_eq!(issue.line, 42);
    assert_eq!(issue.range.start, issue.range.end);
    assert_eq!(issue.rule.repository(), "coverity-c");
    assert_eq!(issue.rule.key, "STATIC_C_MISRA.*");
    let url = "https://cim.example.com:8443/query/defects.htm?stream=main&mergeKey=abc123";
    assert_eq!(
        issue.message,
        format!(
            "[Null pointer dereference] deref: pointer dereferenced ( CID 1001 : {} )",
            url
        )
    );
    assert_eq!(report.measures.lines, 60);
    assert_eq!(report.measures.outstanding, 1);
    assert_eq!(report.measures.service_url, "https://cim.example.com:8443/");
}

#[test]
fn project_scope_sets_project_measures() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_tree(root);
    let mut s = settings(root);
    s.stream = None;
    s.project = Some("acme".into());

    let report = pass(root, &s).unwrap();
    assert!(report.issues[0].message.contains("projectId=10001&mergeKey=abc123"));
    assert_eq!(report.measures.project_name.as_deref(), Some("acme"));
    assert_eq!(
        report.measures.project_url.as_deref(),
        Some("https://cim.example.com:8443/reports.htm#p10001")
    );
}

#[test]
fn suffix_match_without_prefix_strip() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_tree(root);
    let mut s = settings(root);
    // Remote path "/build/src/foo.c" is not under the root; only its tail is.
    s.paths.strip_prefix = "/build/".into();
    s.paths.working_dir = String::new();

    let report = pass(root, &s).unwrap();
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].file, root.join("src/foo.c"));
}

#[test]
fn repeated_pass_is_identical() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_tree(root);
    let s = settings(root);
    let first = pass(root, &s).unwrap();
    let second = pass(root, &s).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_stream_aborts_pass() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_tree(root);
    let mut s = settings(root);
    s.stream = Some("release".into());
    let err = pass(root, &s).unwrap_err();
    assert!(matches!(err, PassError::StreamNotFound(ref n) if n == "release"));
    assert_eq!(err.to_string(), "couldn't find stream: release");
}
