//! Severity ladder for an impact set.
//!
//! The thresholds below are tuned values that define what operators see as
//! CRITICAL/HIGH/MEDIUM. Keep them verbatim.

use serde::{Deserialize, Serialize};

use super::ImpactSet;

/// Weight of one affected business service in the blast-radius score.
pub const SERVICE_WEIGHT: u32 = 4;
/// Weight of one affected application.
pub const APPLICATION_WEIGHT: u32 = 2;
/// Weight of one affected process.
pub const PROCESS_WEIGHT: u32 = 1;

pub const CRITICAL_SCORE: u32 = 20;
pub const CRITICAL_MIN_SERVICES: usize = 3;
pub const CRITICAL_MIN_APPLICATIONS: usize = 4;

pub const HIGH_SCORE: u32 = 12;
pub const HIGH_EXACT_SERVICES: usize = 2;
pub const HIGH_MIN_APPLICATIONS_WITH_SERVICES: usize = 4;
pub const HIGH_MIN_APPLICATIONS: usize = 5;

pub const MEDIUM_SCORE: u32 = 6;
pub const MEDIUM_MIN_APPLICATIONS: usize = 3;
pub const MEDIUM_MIN_PROCESSES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityLevel::Safe => write!(f, "SAFE"),
            SeverityLevel::Low => write!(f, "LOW"),
            SeverityLevel::Medium => write!(f, "MEDIUM"),
            SeverityLevel::High => write!(f, "HIGH"),
            SeverityLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityResult {
    pub level: SeverityLevel,
    pub score: u32,
    pub reasons: Vec<String>,
}

impl SeverityResult {
    /// Classify an impact set by its cardinalities.
    pub fn of(set: &ImpactSet) -> Self {
        let (a, p, s) = set.counts();
        classify(a, p, s)
    }
}

/// Weighted blast-radius score: `4*s + 2*a + p`.
pub fn score(applications: usize, processes: usize, services: usize) -> u32 {
    let w = |n: usize, weight: u32| u32::try_from(n).unwrap_or(u32::MAX).saturating_mul(weight);
    w(services, SERVICE_WEIGHT)
        .saturating_add(w(applications, APPLICATION_WEIGHT))
        .saturating_add(w(processes, PROCESS_WEIGHT))
}

/// Map cardinalities to a severity level. First matching rung wins.
pub fn level(applications: usize, processes: usize, services: usize) -> SeverityLevel {
    let (a, p, s) = (applications, processes, services);
    let score = score(a, p, s);

    if score >= CRITICAL_SCORE || (s >= CRITICAL_MIN_SERVICES && a >= CRITICAL_MIN_APPLICATIONS) {
        SeverityLevel::Critical
    } else if score >= HIGH_SCORE
        || (s == HIGH_EXACT_SERVICES && a >= HIGH_MIN_APPLICATIONS_WITH_SERVICES)
        || a >= HIGH_MIN_APPLICATIONS
    {
        SeverityLevel::High
    } else if score >= MEDIUM_SCORE || (a >= MEDIUM_MIN_APPLICATIONS && p >= MEDIUM_MIN_PROCESSES) {
        SeverityLevel::Medium
    } else if score > 0 {
        SeverityLevel::Low
    } else {
        SeverityLevel::Safe
    }
}

/// Full severity snapshot with operator-facing reasons.
pub fn classify(applications: usize, processes: usize, services: usize) -> SeverityResult {
    let level = level(applications, processes, services);
    SeverityResult {
        level,
        score: score(applications, processes, services),
        reasons: reasons(level, applications, processes, services),
    }
}

fn reasons(level: SeverityLevel, a: usize, p: usize, s: usize) -> Vec<String> {
    let apps = count(a, "application", "applications");
    let procs = count(p, "business process", "business processes");
    let svcs = count(s, "business service", "business services");

    match level {
        SeverityLevel::Critical => vec![
            format!("{} disrupted", svcs),
            format!("{} unavailable", apps),
            format!("{} halted", procs),
            "Immediate executive escalation and regulatory notification required".to_string(),
        ],
        SeverityLevel::High => vec![
            format!("{} degraded", svcs),
            format!("{} affected", apps),
            format!("{} impacted", procs),
            "Invoke the major incident procedure".to_string(),
        ],
        SeverityLevel::Medium => vec![
            format!("{} affected", apps),
            format!("{} impacted", procs),
            format!("{} at risk", svcs),
            "Notify service owners and monitor closely".to_string(),
        ],
        SeverityLevel::Low => vec![
            format!("Limited impact: {}, {}, {}", apps, procs, svcs),
            "Handle through standard incident management".to_string(),
        ],
        SeverityLevel::Safe => vec![
            "No downstream applications, processes or services depend on this asset".to_string(),
        ],
    }
}

fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", n, plural)
    }
}
