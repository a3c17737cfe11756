//! Live failure scenario: a two-state controller around the upstream
//! `/simulate` endpoint.
//!
//! `Idle` is both the initial and the terminal state. A trigger moves the
//! controller to `Active` once the upstream answers; `reset` brings every
//! telemetry field back to its baseline. Responses that arrive after a reset
//! are discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::ImpactSource;
use crate::error::ClientError;
use crate::impact::{self, ImpactRecord, ImpactSet, SeverityResult};

pub const STATUS_OPERATIONAL: &str = "OPERATIONAL";
pub const STATUS_CRITICAL: &str = "CRITICAL";
pub const REG_IMPACT_NONE: &str = "NONE";
pub const REG_IMPACT_DEFAULT: &str = "MEDIUM";

/// Steady-state payment volume shown before any scenario runs.
pub const BASELINE_TPS: [(&str, f64); 6] = [
    ("13:50", 120.0),
    ("13:55", 125.0),
    ("14:00", 118.0),
    ("14:05", 122.0),
    ("14:10", 119.0),
    ("14:15", 124.0),
];

fn default_system_status() -> String {
    STATUS_CRITICAL.to_string()
}

fn default_reg_impact() -> String {
    REG_IMPACT_DEFAULT.to_string()
}

/// One service row of a simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImpact {
    pub name: String,
    #[serde(default)]
    pub affected: bool,
    #[serde(default)]
    pub assurance_score: f64,
    #[serde(default)]
    pub root_cause: Option<String>,
}

/// One point of the transactions-per-second series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpsPoint {
    pub time: String,
    pub value: f64,
}

/// Body of `GET /simulate`. Absent fields take their documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    #[serde(default)]
    pub financial_risk: f64,
    #[serde(default = "default_system_status")]
    pub system_status: String,
    #[serde(default = "default_reg_impact")]
    pub reg_impact: String,
    #[serde(default)]
    pub services: Vec<ServiceImpact>,
    #[serde(default)]
    pub tps_data: Vec<TpsPoint>,
    #[serde(default)]
    pub propagation_chain: Vec<String>,
    #[serde(default)]
    pub failed_server: Option<String>,
    #[serde(default)]
    pub affected_count: Option<u32>,
}

/// Everything the live view renders. Always set as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    pub financial_risk: f64,
    pub system_status: String,
    pub reg_impact: String,
    pub services: Vec<ServiceImpact>,
    pub tps_data: Vec<TpsPoint>,
    pub propagation_chain: Vec<String>,
}

impl Telemetry {
    pub fn baseline() -> Self {
        Self {
            financial_risk: 0.0,
            system_status: STATUS_OPERATIONAL.to_string(),
            reg_impact: REG_IMPACT_NONE.to_string(),
            services: Vec::new(),
            tps_data: BASELINE_TPS
                .iter()
                .map(|(time, value)| TpsPoint {
                    time: (*time).to_string(),
                    value: *value,
                })
                .collect(),
            propagation_chain: Vec::new(),
        }
    }

    fn from_response(resp: SimulationResponse) -> Self {
        Self {
            financial_risk: resp.financial_risk,
            system_status: resp.system_status,
            reg_impact: resp.reg_impact,
            services: resp.services,
            tps_data: resp.tps_data,
            propagation_chain: resp.propagation_chain,
        }
    }

    /// Services flagged as affected by the failure.
    pub fn affected_services(&self) -> impl Iterator<Item = &ServiceImpact> {
        self.services.iter().filter(|s| s.affected)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Impact set and its severity, captured when a scenario goes live.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioImpact {
    pub impact: ImpactSet,
    pub severity: SeverityResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveScenario {
    pub id: Uuid,
    pub asset: String,
    pub triggered_at: DateTime<Utc>,
    /// `None` when the impact query failed while the simulation succeeded.
    pub impact: Option<ScenarioImpact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SimulationState {
    Idle,
    Active(ActiveScenario),
}

/// Proof that a trigger was admitted. Stale once the controller is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTicket {
    id: Uuid,
    epoch: u64,
    asset: String,
}

impl TriggerTicket {
    pub fn asset(&self) -> &str {
        &self.asset
    }
}

/// What the upstream returned for an admitted trigger.
pub struct TriggerResponse {
    pub simulation: Result<SimulationResponse, ClientError>,
    pub impact: Result<Vec<ImpactRecord>, ClientError>,
}

/// Result of handing a response back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Activated,
    Failed,
    /// The controller was reset (or retriggered) since the ticket was issued.
    Stale,
}

#[derive(Debug)]
pub struct SimulationController {
    state: SimulationState,
    telemetry: Telemetry,
    epoch: u64,
    in_flight: Option<Uuid>,
}

impl Default for SimulationController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationController {
    pub fn new() -> Self {
        Self {
            state: SimulationState::Idle,
            telemetry: Telemetry::baseline(),
            epoch: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SimulationState::Active(_))
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Admit a trigger. Returns `None` while Active or while another trigger
    /// is outstanding.
    pub fn begin(&mut self, asset: &str) -> Option<TriggerTicket> {
        if self.is_active() {
            info!(%asset, "scenario already active, ignoring trigger");
            return None;
        }
        if self.in_flight.is_some() {
            info!(%asset, "trigger already in flight, ignoring");
            return None;
        }
        let id = Uuid::new_v4();
        self.in_flight = Some(id);
        info!(%asset, %id, "scenario triggered");
        Some(TriggerTicket {
            id,
            epoch: self.epoch,
            asset: asset.to_string(),
        })
    }

    /// Apply the upstream answer for `ticket`.
    pub fn complete(&mut self, ticket: TriggerTicket, response: TriggerResponse) -> Completion {
        if ticket.epoch != self.epoch || self.in_flight != Some(ticket.id) {
            warn!(asset = %ticket.asset, "discarding stale simulation response");
            return Completion::Stale;
        }
        self.in_flight = None;

        let simulation = match response.simulation {
            Ok(sim) => sim,
            Err(e) => {
                warn!(asset = %ticket.asset, error = %e, "simulation failed");
                self.telemetry.system_status = STATUS_CRITICAL.to_string();
                self.telemetry.propagation_chain = vec![format!("Error: {}", e)];
                return Completion::Failed;
            }
        };

        let impact = match response.impact {
            Ok(records) => {
                let impact = impact::reduce(&records);
                let severity = SeverityResult::of(&impact);
                Some(ScenarioImpact { impact, severity })
            }
            Err(e) => {
                warn!(asset = %ticket.asset, error = %e, "impact query failed during simulation");
                None
            }
        };

        self.telemetry = Telemetry::from_response(simulation);
        info!(
            asset = %ticket.asset,
            status = %self.telemetry.system_status,
            financial_risk = self.telemetry.financial_risk,
            "scenario active"
        );
        self.state = SimulationState::Active(ActiveScenario {
            id: ticket.id,
            asset: ticket.asset,
            triggered_at: Utc::now(),
            impact,
        });
        Completion::Activated
    }

    /// Issue one simulate request (and the matching impact query) for `asset`.
    /// A no-op returning `None` when a scenario is active or pending.
    pub async fn trigger<S>(&mut self, source: &S, asset: &str) -> Option<Completion>
    where
        S: ImpactSource + ?Sized,
    {
        let ticket = self.begin(asset)?;
        let (simulation, impact) = tokio::join!(source.simulate(asset), source.impact(asset));
        Some(self.complete(ticket, TriggerResponse { simulation, impact }))
    }

    /// Return to Idle with baseline telemetry. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let dirty = self.is_active()
            || self.in_flight.is_some()
            || !self.telemetry.propagation_chain.is_empty();
        if !dirty {
            return false;
        }
        self.epoch += 1;
        self.in_flight = None;
        self.state = SimulationState::Idle;
        self.telemetry = Telemetry::baseline();
        info!("scenario reset");
        true
    }
}
