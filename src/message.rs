//! Issue message and defect URL composition.

use crate::models::defect::{DefectInstance, Event, MergedDefect};
use crate::service::{Connection, Scope};

/// Base URL of the defect service, `{scheme}://{host}:{port}/`.
pub fn service_url(conn: &Connection) -> String {
    format!("{}://{}:{}/", conn.scheme(), conn.host, conn.port)
}

/// Report URL of a project, only available for project scopes.
pub fn project_url(conn: &Connection, scope: &Scope) -> Option<String> {
    match scope {
        Scope::Project { key, .. } => Some(format!("{}reports.htm#p{}", service_url(conn), key)),
        Scope::Stream { .. } => None,
    }
}

/// Link to the defect in the service's triage view.
pub fn defect_url(conn: &Connection, scope: &Scope, defect: &MergedDefect) -> String {
    let selector = match scope {
        Scope::Stream { id } => format!("stream={}", id),
        Scope::Project { key, .. } => format!("projectId={}", key),
    };
    format!(
        "{}query/defects.htm?{}&mergeKey={}",
        service_url(conn),
        selector,
        defect.merge_key
    )
}

/// Issue text and defect URL for one instance.
pub fn compose(
    conn: &Connection,
    scope: &Scope,
    event: Option<&Event>,
    instance: &DefectInstance,
    defect: &MergedDefect,
) -> (String, String) {
    let url = defect_url(conn, scope, defect);
    let mut text = format!("[{}] ", defect.display_type);
    match event {
        Some(e) if !e.event_tag.is_empty() && !e.event_description.is_empty() => {
            text.push_str(&e.event_tag);
            text.push_str(": ");
            text.push_str(&e.event_description);
        }
        _ => text.push_str(&instance.long_description),
    }
    let text = html_escape::decode_html_entities(&text);
    let message = format!("{} ( CID {} : {} )", text, defect.cid, url);
    (message, url)
}
