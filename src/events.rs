//! Representative event selection.

use crate::models::defect::{DefectInstance, Event};

/// Pick the event that locates an instance.
///
/// The first event flagged main wins. When none is flagged, the first event
/// in declared order is used. `None` only for an empty or absent list.
pub fn select_event(instance: &DefectInstance) -> Option<&Event> {
    let events = instance.events.as_deref()?;
    events.iter().find(|e| e.main).or_else(|| events.first())
}

/// File path carried by an event, empty when absent.
pub fn event_file_path(event: &Event) -> &str {
    event.file_pathname.as_deref().unwrap_or("")
}
