//! Output rendering for reconcile and explain commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-issue fields, counters and measures.

use crate::models::PassReport;
use crate::rules::RuleKey;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Path shown to humans: relative to the repository root when possible.
fn display_path(path: &Path, repo_root: &Path) -> String {
    match pathdiff::diff_paths(path, repo_root) {
        Some(rel) if !rel.starts_with("..") => rel.to_string_lossy().to_string(),
        _ => path.to_string_lossy().to_string(),
    }
}

/// Print a pass report in the requested format.
pub fn print_report(report: &PassReport, output: &str, repo_root: &Path) {
    match output {
        "json" => println!("{}", render_json(&compose_report_json(report))),
        _ => {
            let color = use_colors(output);
            for is in &report.issues {
                let loc = format!("{}:{}", display_path(&is.file, repo_root), is.line);
                let rule = match &is.severity {
                    Some(sev) => format!("{} {}", is.rule, sev),
                    None => is.rule.to_string(),
                };
                if color {
                    println!(
                        "{} {} ❲{}❳ — {}",
                        "◆".yellow(),
                        loc.bold(),
                        rule.cyan(),
                        is.message
                    );
                } else {
                    println!("◆ {} ❲{}❳ — {}", loc, rule, is.message);
                }
            }
            let c = &report.counters;
            let summary = format!(
                "— Summary — issues={} outstanding={} high={} medium={} low={} lines={}",
                report.issues.len(),
                c.total,
                c.high,
                c.medium,
                c.low,
                report.measures.lines
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
            if let Some(url) = &report.measures.project_url {
                println!("project: {}", url);
            }
        }
    }
}

/// Print the rule keys the resolver would try, in order.
pub fn print_explain(keys: &[RuleKey], output: &str) {
    match output {
        "json" => println!("{}", render_json(&compose_explain_json(keys))),
        _ => {
            let color = use_colors(output);
            for (i, k) in keys.iter().enumerate() {
                if color {
                    println!("{}. {}", (i + 1).to_string().bright_black(), k.bold());
                } else {
                    println!("{}. {}", i + 1, k);
                }
            }
        }
    }
}

fn render_json(v: &JsonVal) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &PassReport) -> JsonVal {
    let issues: Vec<_> = report
        .issues
        .iter()
        .map(|is| {
            json!({
                "cid": is.cid,
                "file": is.file.to_string_lossy(),
                "line": is.line,
                "repository": is.rule.repository(),
                "rule": is.rule.key,
                "severity": is.severity,
                "message": is.message,
            })
        })
        .collect();
    json!({
        "issues": issues,
        "counters": report.counters,
        "measures": report.measures,
    })
}

/// Compose explain JSON (pure).
pub fn compose_explain_json(keys: &[RuleKey]) -> JsonVal {
    let items: Vec<_> = keys
        .iter()
        .map(|k| json!({"repository": k.repository(), "rule": k.key}))
        .collect();
    json!({ "candidates": items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Counters, IssueRequest, Measures, TextRange};
    use std::path::PathBuf;

    #[test]
    fn test_compose_report_json_shape() {
        let report = PassReport {
            issues: vec![IssueRequest {
                cid: 9,
                file: PathBuf::from("/repo/src/a.c"),
                line: 3,
                range: TextRange::at_line(3),
                rule: RuleKey::new("c", "STATIC_C_coverity-cpp"),
                severity: Some("major".into()),
                message: "msg".into(),
            }],
            counters: Counters {
                total: 1,
                high: 0,
                medium: 0,
                low: 1,
            },
            measures: Measures {
                outstanding: 1,
                low_impact: 1,
                lines: 40,
                service_url: "http://h:1/".into(),
                ..Measures::default()
            },
        };
        let out = compose_report_json(&report);
        assert_eq!(out["issues"][0]["repository"], "coverity-c");
        assert_eq!(out["issues"][0]["line"], 3);
        assert_eq!(out["issues"][0]["severity"], "major");
        assert_eq!(out["counters"]["low"], 1);
        assert_eq!(out["measures"]["lines"], 40);
        assert!(out["measures"].get("project_url").is_none());
    }

    #[test]
    fn test_compose_explain_json() {
        let keys = crate::rules::candidate_keys("OTHER", "JSHINT.W1", "none", "js");
        let out = compose_explain_json(&keys);
        assert_eq!(out["candidates"].as_array().unwrap().len(), 2);
        assert_eq!(out["candidates"][1]["rule"], "OTHER_JSHINT.*");
    }

    #[test]
    fn test_display_path_relative_to_root() {
        let root = Path::new("/repo");
        assert_eq!(display_path(Path::new("/repo/src/a.c"), root), "src/a.c");
        assert_eq!(display_path(Path::new("/elsewhere/a.c"), root), "/elsewhere/a.c");
    }
}
