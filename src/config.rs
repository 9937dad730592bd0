//! Configuration discovery and effective settings resolution.
//!
//! covrecon reads `covrecon.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `enabled`: false
//! - `sources`: `.`
//! - `path_style`: `posix`
//! - `snapshot`: `covrecon-defects.json`
//! - `profile`: `covrecon-rules.toml`
//! - `output`: `human`
//! - `[connect]`: `localhost:8080`, no TLS
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::paths::{PathSettings, PathStyle};
use crate::reconcile::PassSettings;
use crate::service::Connection;
use crate::tree::split_dirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_SNAPSHOT: &str = "covrecon-defects.json";
pub const DEFAULT_PROFILE: &str = "covrecon-rules.toml";

#[derive(Debug, Default, Deserialize, Clone)]
/// Connection section under `[connect]`.
pub struct ConnectCfg {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `covrecon.toml|yaml`.
pub struct CovreconConfig {
    pub enabled: Option<bool>,
    pub stream: Option<String>,
    pub project: Option<String>,
    /// Comma-separated candidate directories for suffix matching.
    pub source_dirs: Option<String>,
    /// Declared source directories, used when `source_dirs` is empty.
    pub sources: Option<String>,
    pub strip_prefix: Option<String>,
    pub path_style: Option<String>,
    pub snapshot: Option<String>,
    pub profile: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub connect: Option<ConnectCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values given on the command line.
pub struct Overrides {
    pub repo_root: Option<String>,
    pub enabled: Option<bool>,
    pub stream: Option<String>,
    pub project: Option<String>,
    pub source_dirs: Option<String>,
    pub strip_prefix: Option<String>,
    pub path_style: Option<String>,
    pub snapshot: Option<String>,
    pub profile: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub enabled: bool,
    pub stream: Option<String>,
    pub project: Option<String>,
    pub candidate_dirs: Vec<String>,
    pub index_dirs: Vec<String>,
    pub strip_prefix: String,
    pub path_style: PathStyle,
    pub snapshot: PathBuf,
    pub profile: PathBuf,
    pub output: String,
    pub connection: Connection,
}

impl Effective {
    /// Pass settings with paths re-rooted under `working_dir`.
    pub fn pass_settings(&self, working_dir: &Path) -> PassSettings {
        PassSettings {
            enabled: self.enabled,
            stream: self.stream.clone(),
            project: self.project.clone(),
            candidate_dirs: self.candidate_dirs.clone(),
            paths: PathSettings {
                strip_prefix: self.strip_prefix.clone(),
                working_dir: working_dir.to_string_lossy().to_string(),
                style: self.path_style,
            },
        }
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `covrecon.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("covrecon.toml").exists()
            || cur.join("covrecon.yaml").exists()
            || cur.join("covrecon.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `CovreconConfig` from `covrecon.toml` or `covrecon.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<CovreconConfig> {
    let toml_path = root.join("covrecon.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!(file = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in ["covrecon.yaml", "covrecon.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    warn!(file = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Effective {
    let start = PathBuf::from(cli.repo_root.as_deref().unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let enabled = cli.enabled.or(cfg.enabled).unwrap_or(false);
    let stream = cli.stream.clone().or(cfg.stream);
    let project = cli.project.clone().or(cfg.project);

    let sources = cfg.sources.unwrap_or_else(|| ".".to_string());
    let index_dirs = split_dirs(&sources);
    let candidate_dirs = match cli.source_dirs.clone().or(cfg.source_dirs) {
        Some(dirs) if !dirs.trim().is_empty() => split_dirs(&dirs),
        _ => index_dirs.clone(),
    };

    let strip_prefix = cli
        .strip_prefix
        .clone()
        .or(cfg.strip_prefix)
        .unwrap_or_default();
    let style_src = cli.path_style.clone().or(cfg.path_style);
    let path_style = match style_src.as_deref() {
        Some(s) => PathStyle::parse(s).unwrap_or_else(|| {
            warn!(value = %s, "unknown path style, using posix");
            PathStyle::Posix
        }),
        None => PathStyle::Posix,
    };

    let snapshot = repo_root.join(
        cli.snapshot
            .clone()
            .or(cfg.snapshot)
            .unwrap_or_else(|| DEFAULT_SNAPSHOT.to_string()),
    );
    let profile = repo_root.join(
        cli.profile
            .clone()
            .or(cfg.profile)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
    );
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let defaults = Connection::default();
    let connect = cfg.connect.unwrap_or_default();
    let connection = Connection {
        host: connect.host.unwrap_or(defaults.host),
        port: connect.port.unwrap_or(defaults.port),
        tls: connect.tls.unwrap_or(defaults.tls),
    };

    Effective {
        repo_root,
        config_found,
        enabled,
        stream,
        project,
        candidate_dirs,
        index_dirs,
        strip_prefix,
        path_style,
        snapshot,
        profile,
        output,
        connection,
    }
}
