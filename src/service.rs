//! Remote defect service collaborator.
//!
//! The reconciler only needs connection metadata, selector lookup and two
//! fetch calls. `SnapshotService` serves them from a JSON dump so a pass can
//! run without a network client:
//!
//! ```json
//! {
//!   "streams": [{ "id": "main" }],
//!   "projects": [{ "name": "acme", "projectKey": 10001 }],
//!   "defects": [{ "cid": 1001, "displayType": "...", "mergeKey": "...", ... }],
//!   "occurrences": { "1001": { "defectInstances": [ ... ] } }
//! }
//! ```

use crate::models::defect::{MergedDefect, StreamDefect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Where the remote service lives.
pub struct Connection {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tls: bool,
}

impl Connection {
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Connection {
            host: "localhost".to_string(),
            port: 8080,
            tls: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Configured selector, before lookup.
pub enum Selector {
    Stream(String),
    Project(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
/// Resolved selector a pass runs against.
pub enum Scope {
    Stream { id: String },
    Project { name: String, key: i64 },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamInfo {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub project_key: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to read defect snapshot '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("defect snapshot '{path}' is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Remote defect service.
pub trait DefectService {
    fn connection(&self) -> &Connection;
    fn find_stream(&self, name: &str) -> Result<Option<StreamInfo>, ServiceError>;
    fn find_project(&self, name: &str) -> Result<Option<ProjectInfo>, ServiceError>;
    fn fetch_defects(&self, scope: &Scope) -> Result<Vec<MergedDefect>, ServiceError>;
    /// Stream occurrences keyed by CID. Defects without occurrences are absent.
    fn fetch_stream_occurrences(
        &self,
        defects: &[MergedDefect],
    ) -> Result<HashMap<i64, StreamDefect>, ServiceError>;
}

#[derive(Debug, Default, Deserialize, Serialize)]
/// On-disk defect dump.
pub struct Snapshot {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
    #[serde(default)]
    pub projects: Vec<ProjectInfo>,
    #[serde(default)]
    pub defects: Vec<MergedDefect>,
    #[serde(default)]
    pub occurrences: HashMap<i64, StreamDefect>,
}

/// `DefectService` backed by a `Snapshot`.
pub struct SnapshotService {
    connection: Connection,
    snapshot: Snapshot,
}

impl SnapshotService {
    pub fn new(connection: Connection, snapshot: Snapshot) -> Self {
        SnapshotService {
            connection,
            snapshot,
        }
    }

    pub fn load(connection: Connection, path: &Path) -> Result<Self, ServiceError> {
        let s = fs::read_to_string(path).map_err(|source| ServiceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_str(&s).map_err(|source| ServiceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SnapshotService::new(connection, snapshot))
    }
}

impl DefectService for SnapshotService {
    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn find_stream(&self, name: &str) -> Result<Option<StreamInfo>, ServiceError> {
        Ok(self.snapshot.streams.iter().find(|s| s.id == name).cloned())
    }

    fn find_project(&self, name: &str) -> Result<Option<ProjectInfo>, ServiceError> {
        Ok(self.snapshot.projects.iter().find(|p| p.name == name).cloned())
    }

    fn fetch_defects(&self, _scope: &Scope) -> Result<Vec<MergedDefect>, ServiceError> {
        Ok(self.snapshot.defects.clone())
    }

    fn fetch_stream_occurrences(
        &self,
        defects: &[MergedDefect],
    ) -> Result<HashMap<i64, StreamDefect>, ServiceError> {
        Ok(defects
            .iter()
            .filter_map(|d| {
                self.snapshot
                    .occurrences
                    .get(&d.cid)
                    .map(|sd| (d.cid, sd.clone()))
            })
            .collect())
    }
}
