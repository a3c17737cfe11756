//! Impact analysis workflow: impact query -> reduce -> classify -> narrative.

use serde::Serialize;
use tracing::{info, warn};

use crate::assurance::AssuranceModel;
use crate::catalog::{AssetCatalog, AssetMetadata};
use crate::client::ImpactSource;
use crate::error::Fetched;
use crate::impact::{self, ImpactSet, SeverityResult};
use crate::narrative::{NarrativeParser, NarrativeSections};

/// Impact set of one asset plus its severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAssessment {
    pub asset: String,
    pub impact: ImpactSet,
    pub severity: SeverityResult,
}

impl ImpactAssessment {
    pub fn new(asset: &str, impact: ImpactSet) -> Self {
        let severity = SeverityResult::of(&impact);
        Self {
            asset: asset.to_string(),
            impact,
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentReport {
    pub asset: String,
    pub metadata: Option<AssetMetadata>,
    pub impact: ImpactSet,
    pub severity: SeverityResult,
    pub narrative: NarrativeSections,
}

/// Asset names the upstream knows about.
pub async fn servers<S>(source: &S) -> Fetched<Vec<String>>
where
    S: ImpactSource + ?Sized,
{
    Fetched::from_result(source.servers().await, |s| s.is_empty())
}

/// Fetch and reduce the impact records of `asset`.
pub async fn assess<S>(source: &S, asset: &str) -> Fetched<ImpactAssessment>
where
    S: ImpactSource + ?Sized,
{
    let fetched = Fetched::from_result(source.impact(asset).await, |r| r.is_empty());
    let assessed = fetched.map(|records| ImpactAssessment::new(asset, impact::reduce(&records)));
    if let Fetched::Data(a) = &assessed {
        info!(%asset, level = %a.severity.level, score = a.severity.score, "impact assessed");
    }
    assessed
}

/// Fetch the dependency edges of `asset` into an adjustable model.
pub async fn load_assurance<S>(source: &S, asset: &str) -> Fetched<AssuranceModel>
where
    S: ImpactSource + ?Sized,
{
    let fetched = Fetched::from_result(source.assurance(asset).await, |e| e.is_empty());
    let model = fetched.map(AssuranceModel::new);
    if let Fetched::Data(m) = &model {
        info!(%asset, score = m.score(), status = %m.status(), "assurance loaded");
    }
    model
}

/// Request and parse the narrative for an already-assessed impact set.
///
/// Taking the assessment by reference is what orders the narrative after the
/// impact query. Failures leave every section pending.
pub async fn narrate<S>(
    source: &S,
    parser: &dyn NarrativeParser,
    assessment: &ImpactAssessment,
) -> NarrativeSections
where
    S: ImpactSource + ?Sized,
{
    if assessment.impact.is_empty() {
        return NarrativeSections::pending();
    }
    match source
        .incident_summary(
            &assessment.asset,
            &assessment.impact.applications,
            &assessment.impact.processes,
        )
        .await
    {
        Ok(text) => parser.parse(&text),
        Err(e) => {
            warn!(asset = %assessment.asset, error = %e, "narrative unavailable");
            NarrativeSections::pending()
        }
    }
}

/// Full incident report for `asset`. Fails only when the impact query fails.
pub async fn incident_report<S>(
    source: &S,
    parser: &dyn NarrativeParser,
    catalog: &AssetCatalog,
    asset: &str,
) -> Fetched<IncidentReport>
where
    S: ImpactSource + ?Sized,
{
    let assessment = match assess(source, asset).await {
        Fetched::Data(a) => a,
        Fetched::Empty => ImpactAssessment::new(asset, ImpactSet::default()),
        Fetched::Failed(msg) => return Fetched::Failed(msg),
    };
    let narrative = narrate(source, parser, &assessment).await;
    Fetched::Data(IncidentReport {
        asset: assessment.asset,
        metadata: catalog.get(asset).cloned(),
        impact: assessment.impact,
        severity: assessment.severity,
        narrative,
    })
}
