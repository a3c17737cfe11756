//! HTTP client for the upstream impact/graph service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::assurance::DependencyEdge;
use crate::config::UpstreamConfig;
use crate::error::ClientError;
use crate::impact::ImpactRecord;
use crate::simulation::SimulationResponse;

/// Read-only view of the upstream service. Everything the core consumes goes
/// through this trait so tests can substitute canned data.
#[async_trait]
pub trait ImpactSource: Send + Sync {
    /// `GET /servers`
    async fn servers(&self) -> Result<Vec<String>, ClientError>;

    /// `GET /impact/{server}`
    async fn impact(&self, asset: &str) -> Result<Vec<ImpactRecord>, ClientError>;

    /// `GET /assurance-score?asset=`
    async fn assurance(&self, asset: &str) -> Result<Vec<DependencyEdge>, ClientError>;

    /// `GET /simulate?server=`
    async fn simulate(&self, asset: &str) -> Result<SimulationResponse, ClientError>;

    /// `GET /incident-summary?server=&applications=&processes=`
    async fn incident_summary(
        &self,
        asset: &str,
        applications: &[String],
        processes: &[String],
    ) -> Result<String, ClientError>;
}

#[derive(Debug, Deserialize)]
struct AssuranceBody {
    #[serde(default)]
    dependencies: Vec<DependencyEdge>,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    summary: String,
}

/// Query parameters for the narrative endpoint. Blank values are omitted and
/// lists are comma-joined.
pub fn summary_query(
    asset: &str,
    applications: &[String],
    processes: &[String],
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !asset.trim().is_empty() {
        params.push(("server", asset.to_string()));
    }
    if !applications.is_empty() {
        params.push(("applications", applications.join(",")));
    }
    if !processes.is_empty() {
        params.push(("processes", processes.join(",")));
    }
    params
}

/// [`ImpactSource`] backed by the real upstream REST API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    narrative_base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network {
                endpoint: config.base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            narrative_base_url: config.narrative_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base_url}/impact/{asset}` with the asset encoded as one path segment.
    fn impact_url(&self, asset: &str) -> Result<String, ClientError> {
        let invalid = |message: String| ClientError::InvalidUrl {
            endpoint: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("impact")
            .push(asset);
        Ok(url.into())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        debug!(%url, ?query, "upstream request");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::Network {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;
        decode(url, resp).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: String, resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    let body = resp.bytes().await.map_err(|e| ClientError::Network {
        endpoint: endpoint.clone(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
        endpoint,
        message: e.to_string(),
    })
}

#[async_trait]
impl ImpactSource for UpstreamClient {
    async fn servers(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(self.url("/servers"), &[]).await
    }

    async fn impact(&self, asset: &str) -> Result<Vec<ImpactRecord>, ClientError> {
        let url = self.impact_url(asset)?;
        let records: Vec<ImpactRecord> = self.get_json(url, &[]).await?;
        info!(%asset, records = records.len(), "fetched impact records");
        Ok(records)
    }

    async fn assurance(&self, asset: &str) -> Result<Vec<DependencyEdge>, ClientError> {
        let body: AssuranceBody = self
            .get_json(self.url("/assurance-score"), &[("asset", asset.to_string())])
            .await?;
        info!(%asset, edges = body.dependencies.len(), "fetched assurance dependencies");
        Ok(body.dependencies)
    }

    async fn simulate(&self, asset: &str) -> Result<SimulationResponse, ClientError> {
        info!(%asset, "requesting failure simulation");
        self.get_json(self.url("/simulate"), &[("server", asset.to_string())])
            .await
    }

    async fn incident_summary(
        &self,
        asset: &str,
        applications: &[String],
        processes: &[String],
    ) -> Result<String, ClientError> {
        let url = format!("{}/incident-summary", self.narrative_base_url);
        let query = summary_query(asset, applications, processes);
        let body: SummaryBody = self.get_json(url, &query).await?;
        Ok(body.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_query_omits_blanks() {
        let q = summary_query("", &[], &[]);
        assert!(q.is_empty());

        let apps = vec!["CRM".to_string(), "Billing".to_string()];
        let q = summary_query("db-01", &apps, &[]);
        assert_eq!(
            q,
            vec![
                ("server", "db-01".to_string()),
                ("applications", "CRM,Billing".to_string())
            ]
        );
    }

    #[test]
    fn test_impact_url_encodes_asset_segment() {
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        assert_eq!(
            client.impact_url("Core Banking Cluster").unwrap(),
            "http://localhost:8000/api/impact/Core%20Banking%20Cluster"
        );
        assert_eq!(
            client.impact_url("uk-lon-db-01").unwrap(),
            "http://localhost:8000/api/impact/uk-lon-db-01"
        );
        assert_eq!(
            client.impact_url("a/b").unwrap(),
            "http://localhost:8000/api/impact/a%2Fb"
        );
    }

    #[test]
    fn test_impact_url_rejects_unparseable_base() {
        let cfg = UpstreamConfig {
            base_url: "not a url".to_string(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&cfg).unwrap();
        assert!(matches!(
            client.impact_url("db-01"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cfg = UpstreamConfig {
            base_url: "http://example.test/api/".to_string(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&cfg).unwrap();
        assert_eq!(client.url("/servers"), "http://example.test/api/servers");
    }
}
