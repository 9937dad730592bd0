//! Active-rule resolution.
//!
//! A defect instance is mapped to a rule key of the form
//! `{domain}_{checker}_{subcategory}` in the repository of the file's
//! language. When that exact rule is not active, the resolver retries with
//! subcategory `none` and finally with one generic key chosen from a
//! per-domain fallback table.
//!
//! The fallback tables are plain data: each domain lists `(predicate, key)`
//! pairs in evaluation order and the first matching predicate selects the
//! only key tried for that domain. A checker that matches several prefixes
//! takes the first.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Repository prefix; the full repository is `coverity-{language}`.
pub const REPOSITORY_PREFIX: &str = "coverity";

/// Languages that get a rule repository.
pub const LANGUAGES: [&str; 7] = ["java", "cpp", "c", "cs", "js", "py", "php"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Composite rule identifier: language repository plus rule pattern.
pub struct RuleKey {
    pub language: String,
    pub key: String,
}

impl RuleKey {
    pub fn new(language: &str, key: &str) -> Self {
        RuleKey {
            language: language.to_string(),
            key: key.to_string(),
        }
    }

    pub fn repository(&self) -> String {
        repository_for(&self.language)
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository(), self.key)
    }
}

pub fn repository_for(language: &str) -> String {
    format!("{}-{}", REPOSITORY_PREFIX, language)
}

/// Repository keys for every supported language.
pub fn repositories() -> Vec<String> {
    LANGUAGES.iter().map(|l| repository_for(l)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A rule enabled in the consuming platform's profile.
pub struct ActiveRule {
    pub key: RuleKey,
    pub severity: Option<String>,
}

/// Lookup of active rules, owned by the host platform.
pub trait RuleRegistry {
    fn find_active_rule(&self, key: &RuleKey) -> Option<ActiveRule>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Condition on the checker name.
pub enum Predicate {
    Always,
    CheckerPrefix(&'static str),
}

impl Predicate {
    fn matches(&self, checker: &str) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::CheckerPrefix(p) => checker.starts_with(p),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    pub when: Predicate,
    pub key: &'static str,
}

#[derive(Debug, Clone, Copy)]
/// Fallback chain for one domain, optionally restricted to a language.
pub struct DomainFallbacks {
    pub domain: &'static str,
    pub language: Option<&'static str>,
    pub chain: &'static [Fallback],
}

const fn prefix(p: &'static str, key: &'static str) -> Fallback {
    Fallback {
        when: Predicate::CheckerPrefix(p),
        key,
    }
}

const fn always(key: &'static str) -> Fallback {
    Fallback {
        when: Predicate::Always,
        key,
    }
}

pub const FALLBACKS: &[DomainFallbacks] = &[
    DomainFallbacks {
        domain: "STATIC_C",
        language: None,
        chain: &[
            prefix("MISRA C", "STATIC_C_MISRA.*"),
            prefix("PW.", "STATIC_C_PW.*"),
            prefix("SW.", "STATIC_C_SW.*"),
            prefix("RW.", "STATIC_C_RW.*"),
            always("STATIC_C_coverity-cpp"),
        ],
    },
    DomainFallbacks {
        domain: "STATIC_CS",
        language: None,
        chain: &[
            prefix("MSVSCA", "STATIC_CS_MSVSCA.*"),
            always("STATIC_CS_coverity-cs"),
        ],
    },
    DomainFallbacks {
        domain: "STATIC_JAVA",
        language: None,
        chain: &[always("STATIC_JAVA_coverity-java")],
    },
    DomainFallbacks {
        domain: "OTHER",
        language: Some("js"),
        chain: &[
            prefix("JSHINT", "OTHER_JSHINT.*"),
            always("OTHER_coverity-js"),
        ],
    },
    DomainFallbacks {
        domain: "OTHER",
        language: Some("py"),
        chain: &[always("OTHER_coverity-py")],
    },
    DomainFallbacks {
        domain: "OTHER",
        language: Some("php"),
        chain: &[always("OTHER_coverity-php")],
    },
];

/// Generic key for a domain/language pair, if the domain has one.
pub fn fallback_key(domain: &str, checker: &str, language: &str) -> Option<&'static str> {
    FALLBACKS
        .iter()
        .find(|t| t.domain == domain && t.language.map_or(true, |l| l == language))
        .and_then(|t| t.chain.iter().find(|f| f.when.matches(checker)))
        .map(|f| f.key)
}

/// Every rule key the resolver tries, in order.
pub fn candidate_keys(
    domain: &str,
    checker: &str,
    subcategory: &str,
    language: &str,
) -> Vec<RuleKey> {
    let base = format!("{}_{}", domain, checker);
    let mut keys = vec![RuleKey::new(language, &format!("{}_{}", base, subcategory))];
    if subcategory != "none" {
        keys.push(RuleKey::new(language, &format!("{}_none", base)));
    }
    if let Some(k) = fallback_key(domain, checker, language) {
        keys.push(RuleKey::new(language, k));
    }
    keys
}

/// Resolves rule keys against a registry.
pub struct RuleResolver<'a> {
    registry: &'a dyn RuleRegistry,
}

impl<'a> RuleResolver<'a> {
    pub fn new(registry: &'a dyn RuleRegistry) -> Self {
        RuleResolver { registry }
    }

    /// First active rule along the fallback chain.
    pub fn resolve(
        &self,
        domain: &str,
        checker: &str,
        subcategory: &str,
        language: &str,
    ) -> Option<ActiveRule> {
        for key in candidate_keys(domain, checker, subcategory, language) {
            if let Some(ar) = self.registry.find_active_rule(&key) {
                debug!(rule = %key, "active rule found");
                return Some(ar);
            }
            debug!(rule = %key, "rule not active");
        }
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("rule profile not found at '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("rule profile '{path}' is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    rules: Vec<ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    language: String,
    key: String,
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Default)]
/// Active rules declared in a TOML profile:
///
/// ```toml
/// [[rules]]
/// language = "c"
/// key = "STATIC_C_MISRA.*"
/// severity = "major"
/// ```
pub struct RuleProfile {
    keys: HashSet<RuleKey>,
    severities: std::collections::HashMap<RuleKey, String>,
}

impl RuleProfile {
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let s = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let file: ProfileFile = toml::from_str(s)?;
        let mut profile = RuleProfile::default();
        for e in file.rules {
            let key = RuleKey::new(&e.language, &e.key);
            if let Some(sev) = e.severity {
                profile.severities.insert(key.clone(), sev);
            }
            profile.keys.insert(key);
        }
        Ok(profile)
    }

    pub fn activate(&mut self, language: &str, key: &str) {
        self.keys.insert(RuleKey::new(language, key));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl RuleRegistry for RuleProfile {
    fn find_active_rule(&self, key: &RuleKey) -> Option<ActiveRule> {
        if !self.keys.contains(key) {
            return None;
        }
        Some(ActiveRule {
            key: key.clone(),
            severity: self.severities.get(key).cloned(),
        })
    }
}
