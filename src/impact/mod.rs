//! Impact sets -- which applications, processes and services sit downstream
//! of an asset.

pub mod severity;

use serde::{Deserialize, Serialize};

pub use self::severity::{classify, SeverityLevel, SeverityResult};

/// One row of the upstream impact query. Any field may be null or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactRecord {
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub process: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

/// Deduplicated downstream entities of one asset, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSet {
    pub applications: Vec<String>,
    pub processes: Vec<String>,
    pub services: Vec<String>,
}

impl ImpactSet {
    /// No downstream entities at all. This is "no data", not a failure.
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.processes.is_empty() && self.services.is_empty()
    }

    /// Cardinalities as `(applications, processes, services)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.applications.len(), self.processes.len(), self.services.len())
    }
}

/// Collapse raw impact rows into an [`ImpactSet`].
pub fn reduce(records: &[ImpactRecord]) -> ImpactSet {
    ImpactSet {
        applications: unique(records.iter().map(|r| r.application.as_deref())),
        processes: unique(records.iter().map(|r| r.process.as_deref())),
        services: unique(records.iter().map(|r| r.service.as_deref())),
    }
}

fn unique<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values.flatten() {
        // Whitespace-only names are as useless as empty ones.
        if v.trim().is_empty() {
            continue;
        }
        if !out.iter().any(|seen| seen == v) {
            out.push(v.to_string());
        }
    }
    out
}
