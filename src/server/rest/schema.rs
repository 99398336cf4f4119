//! Documents served by the REST API besides the VLM response.

use crate::conf::ServiceEnvironment;

/// Description of this service.
pub const SERVICE_DESCRIPTION: &str = "An AnyVLM instance";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServiceOrganization {
    pub name: String,
    pub url: String,
}

impl Default for ServiceOrganization {
    fn default() -> Self {
        Self {
            name: "Biocommons".into(),
            url: "https://biocommons.org/".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServiceType {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Default for ServiceType {
    fn default() -> Self {
        Self {
            group: "org.biocommons".into(),
            artifact: "AnyVLM API".into(),
            version: crate::common::worker_version().into(),
        }
    }
}

/// Reply of `GET /service-info` in GA4GH service-info layout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ServiceType,
    pub description: String,
    pub organization: ServiceOrganization,
    pub contact_url: String,
    pub documentation_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub environment: ServiceEnvironment,
    pub version: String,
}

impl ServiceInfo {
    pub fn new(environment: ServiceEnvironment) -> Self {
        Self {
            id: "org.biocommons.anyvlm".into(),
            name: "anyvlm".into(),
            type_: ServiceType::default(),
            description: SERVICE_DESCRIPTION.into(),
            organization: ServiceOrganization::default(),
            contact_url: "Alex.Wagner@nationwidechildrens.org".into(),
            documentation_url: "https://github.com/genomicmedlab/anyvlm".into(),
            created_at: "2025-06-01T00:00:00Z".into(),
            updated_at: "2025-06-01T00:00:00Z".into(),
            environment,
            version: crate::common::worker_version().into(),
        }
    }
}

/// Reply of `POST /ingest_vcf`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub summary: crate::ingest::IngestSummary,
}

/// Body of all error replies.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}
