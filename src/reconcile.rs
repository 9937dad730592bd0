//! Defect reconciliation pass.
//!
//! A pass resolves the configured selector, fetches defects once, then
//! walks them in order:
//! - defects without stream occurrences or instances are skipped;
//! - resolved defects (`Dismissed`, `Fixed`, `Absent Dismissed`) are skipped;
//! - the first instance's impact is counted once per defect;
//! - every instance is located (event, file, rule) and turned into an
//!   `IssueRequest`, or dropped with a notice.
//!
//! Configuration and transport failures abort the pass; nothing partial is
//! returned. Per-defect misses never do.

use crate::events::{event_file_path, select_event};
use crate::message;
use crate::models::defect::{Impact, MergedDefect, StreamDefect};
use crate::models::{Counters, IssueRequest, Measures, PassReport, TextRange};
use crate::paths::{PathResolver, PathSettings};
use crate::rules::{RuleRegistry, RuleResolver};
use crate::service::{Connection, DefectService, Scope, Selector, ServiceError};
use crate::tree::SourceTree;
use std::collections::HashMap;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default)]
/// Inputs of one pass, already merged from CLI and config.
pub struct PassSettings {
    pub enabled: bool,
    pub stream: Option<String>,
    pub project: Option<String>,
    /// Directories whose files are suffix-match candidates.
    pub candidate_dirs: Vec<String>,
    pub paths: PathSettings,
}

impl PassSettings {
    /// Stream wins over project; empty values count as unset.
    pub fn selector(&self) -> Option<Selector> {
        let non_empty = |s: &Option<String>| s.as_ref().filter(|v| !v.is_empty()).cloned();
        non_empty(&self.stream)
            .map(Selector::Stream)
            .or_else(|| non_empty(&self.project).map(Selector::Project))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("no stream or project configured")]
    MissingSelector,
    #[error("couldn't find stream: {0}")]
    StreamNotFound(String),
    #[error("couldn't find project: {0}")]
    ProjectNotFound(String),
    #[error("error while trying to find '{name}': {source}")]
    Lookup { name: String, source: ServiceError },
    #[error("error fetching defects: {0}")]
    Transport(#[source] ServiceError),
}

/// Look the configured selector up on the service.
pub fn resolve_scope(
    service: &dyn DefectService,
    settings: &PassSettings,
) -> Result<Scope, PassError> {
    match settings.selector().ok_or(PassError::MissingSelector)? {
        Selector::Stream(name) => {
            let found = service
                .find_stream(&name)
                .map_err(|source| PassError::Lookup {
                    name: name.clone(),
                    source,
                })?;
            let stream = found.ok_or_else(|| PassError::StreamNotFound(name.clone()))?;
            info!(stream = %name, id = %stream.id, "found stream");
            Ok(Scope::Stream { id: stream.id })
        }
        Selector::Project(name) => {
            debug!("stream has not been specified, checking project");
            let found = service
                .find_project(&name)
                .map_err(|source| PassError::Lookup {
                    name: name.clone(),
                    source,
                })?;
            let project = found.ok_or_else(|| PassError::ProjectNotFound(name.clone()))?;
            info!(project = %name, key = project.project_key, "found project");
            Ok(Scope::Project {
                name: project.name,
                key: project.project_key,
            })
        }
    }
}

/// State of one pass: the path cache, counters and emitted issues.
pub struct Reconciler<'a> {
    connection: &'a Connection,
    scope: &'a Scope,
    paths: PathResolver<'a>,
    rules: RuleResolver<'a>,
    counters: Counters,
    issues: Vec<IssueRequest>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        connection: &'a Connection,
        scope: &'a Scope,
        paths: PathResolver<'a>,
        registry: &'a dyn RuleRegistry,
    ) -> Self {
        Reconciler {
            connection,
            scope,
            paths,
            rules: RuleResolver::new(registry),
            counters: Counters::default(),
            issues: Vec::new(),
        }
    }

    /// Process every defect in order.
    pub fn reconcile_all(&mut self, defects: &[MergedDefect], occurrences: &HashMap<i64, StreamDefect>) {
        for d in defects {
            self.reconcile_defect(d, occurrences.get(&d.cid));
        }
    }

    /// Count one defect and emit issues for its instances.
    pub fn reconcile_defect(&mut self, d: &MergedDefect, occurrence: Option<&StreamDefect>) {
        let instances = match occurrence {
            Some(sd) if !sd.defect_instances.is_empty() => &sd.defect_instances,
            _ => {
                info!(cid = d.cid, "merged defect has no defect instances defined");
                return;
            }
        };

        let impact = instances[0].impact.as_deref().unwrap_or("");
        let status = d.status();
        if d.is_resolved() {
            info!(cid = d.cid, status = %status, "skipping resolved defect");
            return;
        }

        if let Some(bucket) = Impact::classify(impact) {
            self.counters.total += 1;
            match bucket {
                Impact::High => self.counters.high += 1,
                Impact::Medium => self.counters.medium += 1,
                Impact::Low => self.counters.low += 1,
            }
        }

        for inst in instances {
            let Some(event) = select_event(inst) else {
                continue;
            };
            let mut remote = event_file_path(event);
            if remote.is_empty() {
                remote = d.file_pathname.as_str();
            }

            let Some(file) = self.paths.resolve(remote) else {
                info!(cid = d.cid, file = %remote, "cannot find the file, skipping defect");
                continue;
            };
            let Some(language) = file.language.as_deref().filter(|l| !l.is_empty()) else {
                info!(
                    cid = d.cid,
                    file = %file.path.display(),
                    "cannot find the language of the file, skipping defect"
                );
                continue;
            };

            let subcategory = inst.subcategory_or_none();
            let Some(rule) =
                self.rules
                    .resolve(&inst.domain, &inst.checker_name, subcategory, language)
            else {
                info!(
                    cid = d.cid,
                    domain = %inst.domain,
                    checker = %inst.checker_name,
                    "couldn't create issue, no active rule"
                );
                continue;
            };

            let (text, _url) = message::compose(self.connection, self.scope, Some(event), inst, d);
            let issue = IssueRequest {
                cid: d.cid,
                file: file.path.clone(),
                line: event.line_number,
                range: TextRange::at_line(event.line_number),
                rule: rule.key,
                severity: rule.severity,
                message: text,
            };
            debug!(cid = d.cid, rule = %issue.rule, line = issue.line, "issue");
            self.issues.push(issue);
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn issues(&self) -> &[IssueRequest] {
        &self.issues
    }

    /// Close the pass, returning issues, counters and touched line total.
    pub fn finish(self) -> (Vec<IssueRequest>, Counters, usize) {
        let lines = self.paths.total_lines();
        (self.issues, self.counters, lines)
    }
}

/// Run one full pass against the collaborators.
pub fn run_pass(
    service: &dyn DefectService,
    tree: &dyn SourceTree,
    registry: &dyn RuleRegistry,
    settings: &PassSettings,
) -> Result<PassReport, PassError> {
    info!(enabled = settings.enabled, "reconciliation pass enabled");
    if !settings.enabled {
        return Ok(PassReport::default());
    }

    let scope = resolve_scope(service, settings).inspect_err(|e| error!("{}", e))?;
    match &scope {
        Scope::Stream { id } => info!(stream = %id, "fetching defects for stream"),
        Scope::Project { name, .. } => info!(project = %name, "fetching defects for project"),
    }
    let defects = service
        .fetch_defects(&scope)
        .map_err(PassError::Transport)
        .inspect_err(|e| error!("{}", e))?;
    let occurrences = service
        .fetch_stream_occurrences(&defects)
        .map_err(PassError::Transport)
        .inspect_err(|e| error!("{}", e))?;
    info!(count = occurrences.len(), "found defects");

    let candidates = tree.list_candidate_files(&settings.candidate_dirs);
    debug!(candidates = candidates.len(), "candidate files");
    let connection = service.connection();
    let paths = PathResolver::new(tree, candidates, settings.paths.clone());
    let mut rec = Reconciler::new(connection, &scope, paths, registry);
    rec.reconcile_all(&defects, &occurrences);
    let (issues, counters, lines) = rec.finish();

    let measures = Measures {
        project_name: settings.project.clone().filter(|p| !p.is_empty()),
        service_url: message::service_url(connection),
        project_url: message::project_url(connection, &scope),
        outstanding: counters.total,
        high_impact: counters.high,
        medium_impact: counters.medium,
        low_impact: counters.low,
        lines,
    };
    Ok(PassReport {
        issues,
        counters,
        measures,
    })
}
