//! Business assurance scoring over a weighted dependency model.
//!
//! Each dependency edge contributes `criticality * (1 - health) * 100 *
//! redundancy` points of impact; the score is what is left of 100.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const CRITICALITY_RANGE: (f64, f64) = (0.1, 1.0);
pub const HEALTH_RANGE: (f64, f64) = (0.0, 1.0);
pub const REDUNDANCY_RANGE: (f64, f64) = (0.0, 1.0);

/// Scores at or above this are HEALTHY.
pub const HEALTHY_MIN_SCORE: u8 = 80;
/// Scores strictly below this are CRITICAL.
pub const CRITICAL_BELOW_SCORE: u8 = 50;

#[derive(Debug, Error, PartialEq)]
pub enum AssuranceError {
    #[error("no dependency at index {index} (model has {len})")]
    NoSuchEdge { index: usize, len: usize },
    #[error("no dependency named '{0}'")]
    UnknownEdge(String),
    #[error("unknown edge field '{0}' (expected criticality, health or redundancy)")]
    UnknownField(String),
}

fn default_criticality() -> f64 {
    0.5
}

fn default_health() -> f64 {
    0.8
}

fn default_redundancy() -> f64 {
    0.5
}

/// One dependency of an asset as returned by `/assurance-score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub name: String,
    #[serde(default = "default_criticality")]
    pub criticality: f64,
    #[serde(default = "default_health")]
    pub health: f64,
    #[serde(default = "default_redundancy")]
    pub redundancy: f64,
}

impl DependencyEdge {
    pub fn new(name: impl Into<String>, criticality: f64, health: f64, redundancy: f64) -> Self {
        Self {
            name: name.into(),
            criticality,
            health,
            redundancy,
        }
        .clamped()
    }

    /// Force every field into its declared domain.
    pub fn clamped(mut self) -> Self {
        self.criticality = EdgeField::Criticality.clamp(self.criticality);
        self.health = EdgeField::Health.clamp(self.health);
        self.redundancy = EdgeField::Redundancy.clamp(self.redundancy);
        self
    }

    /// Impact points this edge removes from the score.
    pub fn impact(&self) -> f64 {
        self.criticality * (1.0 - self.health) * 100.0 * self.redundancy
    }
}

/// The adjustable fields of a [`DependencyEdge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeField {
    Criticality,
    Health,
    Redundancy,
}

impl EdgeField {
    pub fn range(self) -> (f64, f64) {
        match self {
            EdgeField::Criticality => CRITICALITY_RANGE,
            EdgeField::Health => HEALTH_RANGE,
            EdgeField::Redundancy => REDUNDANCY_RANGE,
        }
    }

    /// Clamp into range. NaN lands on the lower bound.
    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        if value.is_nan() {
            return lo;
        }
        value.clamp(lo, hi)
    }
}

impl std::str::FromStr for EdgeField {
    type Err = AssuranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "criticality" | "c" => Ok(EdgeField::Criticality),
            "health" | "h" => Ok(EdgeField::Health),
            "redundancy" | "r" => Ok(EdgeField::Redundancy),
            other => Err(AssuranceError::UnknownField(other.to_string())),
        }
    }
}

impl std::fmt::Display for EdgeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeField::Criticality => write!(f, "criticality"),
            EdgeField::Health => write!(f, "health"),
            EdgeField::Redundancy => write!(f, "redundancy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssuranceStatus {
    Healthy,
    Degraded,
    Critical,
}

impl AssuranceStatus {
    pub fn from_score(score: u8) -> Self {
        if score >= HEALTHY_MIN_SCORE {
            AssuranceStatus::Healthy
        } else if score < CRITICAL_BELOW_SCORE {
            AssuranceStatus::Critical
        } else {
            AssuranceStatus::Degraded
        }
    }
}

impl std::fmt::Display for AssuranceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssuranceStatus::Healthy => write!(f, "HEALTHY"),
            AssuranceStatus::Degraded => write!(f, "DEGRADED"),
            AssuranceStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Derived snapshot of the dependency model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssuranceState {
    pub edges: Vec<DependencyEdge>,
    pub total_impact: f64,
    pub score: u8,
    pub status: AssuranceStatus,
}

impl AssuranceState {
    pub fn compute(edges: Vec<DependencyEdge>) -> Self {
        let total_impact = total_impact(&edges);
        let score = score_from_impact(total_impact);
        Self {
            edges,
            total_impact,
            score,
            status: AssuranceStatus::from_score(score),
        }
    }
}

pub fn total_impact(edges: &[DependencyEdge]) -> f64 {
    edges.iter().map(DependencyEdge::impact).sum()
}

/// `clamp(round(100 - impact), 0, 100)`.
pub fn score_from_impact(total_impact: f64) -> u8 {
    let raw = (100.0 - total_impact).round();
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0) as u8
}

/// Interactive what-if model: edges plus their always-current derived state.
#[derive(Debug, Clone, PartialEq)]
pub struct AssuranceModel {
    state: AssuranceState,
}

impl Default for AssuranceModel {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AssuranceModel {
    /// Build a model from upstream edges, clamping any out-of-range values.
    pub fn new(edges: Vec<DependencyEdge>) -> Self {
        let edges = edges.into_iter().map(DependencyEdge::clamped).collect();
        Self {
            state: AssuranceState::compute(edges),
        }
    }

    pub fn state(&self) -> &AssuranceState {
        &self.state
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.state.edges
    }

    pub fn score(&self) -> u8 {
        self.state.score
    }

    pub fn status(&self) -> AssuranceStatus {
        self.state.status
    }

    /// Set one field of one edge and recompute. Values are clamped, never rejected.
    pub fn update(
        &mut self,
        index: usize,
        field: EdgeField,
        value: f64,
    ) -> Result<&AssuranceState, AssuranceError> {
        let len = self.state.edges.len();
        let mut edges = self.state.edges.clone();
        let edge = edges
            .get_mut(index)
            .ok_or(AssuranceError::NoSuchEdge { index, len })?;

        let value = field.clamp(value);
        match field {
            EdgeField::Criticality => edge.criticality = value,
            EdgeField::Health => edge.health = value,
            EdgeField::Redundancy => edge.redundancy = value,
        }
        debug!(edge = %edge.name, %field, value, "dependency adjusted");

        self.state = AssuranceState::compute(edges);
        Ok(&self.state)
    }

    /// Same as [`update`](Self::update) but addresses the edge by name.
    pub fn update_by_name(
        &mut self,
        name: &str,
        field: EdgeField,
        value: f64,
    ) -> Result<&AssuranceState, AssuranceError> {
        let index = self
            .state
            .edges
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| AssuranceError::UnknownEdge(name.to_string()))?;
        self.update(index, field, value)
    }
}
