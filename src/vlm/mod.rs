//! Data structures of the Variant-Level Matching (VLM) protocol.

use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::{conf::HandoverConf, err::Error};

pub mod build;

/// Entity type of all result sets and returned schemas.
pub const RESULT_ENTITY_TYPE: &str = "genomicVariant";
/// Version of the VLM API implemented here.
pub const API_VERSION: &str = "v1.0";
/// Beacon schema of the returned results.
pub const RETURNED_SCHEMA: &str = "ga4gh-beacon-variant-v2.0.0";

/// Zygosity buckets of the VLM protocol.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Zygosity {
    #[strum(serialize = "Homozygous")]
    #[serde(rename = "Homozygous")]
    Homozygous,
    #[strum(serialize = "Heterozygous")]
    #[serde(rename = "Heterozygous")]
    Heterozygous,
    #[strum(serialize = "Hemizygous")]
    #[serde(rename = "Hemizygous")]
    Hemizygous,
    #[strum(serialize = "Unknown Zygosity")]
    #[serde(rename = "Unknown Zygosity")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HandoverType {
    pub id: String,
    pub label: String,
}

/// Describes where users find more information on the results.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconHandover {
    pub handover_type: HandoverType,
    pub url: String,
}

impl From<&HandoverConf> for BeaconHandover {
    fn from(conf: &HandoverConf) -> Self {
        Self {
            handover_type: HandoverType {
                id: conf.handover_type_id().to_string(),
                label: conf.handover_type_label().to_string(),
            },
            url: conf.handover_url().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedSchema {
    pub entity_type: String,
    pub schema: String,
}

impl Default for ReturnedSchema {
    fn default() -> Self {
        Self {
            entity_type: RESULT_ENTITY_TYPE.to_string(),
            schema: RETURNED_SCHEMA.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub api_version: String,
    pub beacon_id: String,
    pub returned_schemas: Vec<ReturnedSchema>,
}

impl From<&HandoverConf> for Meta {
    fn from(conf: &HandoverConf) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            beacon_id: conf.beacon_id().to_string(),
            returned_schemas: vec![ReturnedSchema::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub exists: bool,
    pub num_total_results: i64,
}

/// Count for one zygosity; `id` is `"{node_id} {zygosity}"`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub exists: bool,
    pub id: String,
    /// Always empty.
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    pub results_count: i64,
    pub set_type: String,
}

impl ResultSet {
    pub fn new(node_id: &str, zygosity: Zygosity, exists: bool, results_count: i64) -> Self {
        Self {
            exists,
            id: format!("{} {}", node_id, zygosity),
            results: Vec::new(),
            results_count,
            set_type: RESULT_ENTITY_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseField {
    pub result_sets: Vec<ResultSet>,
}

/// Reply of the `variant_counts` endpoint.
///
/// Construction through [`VlmResponse::new`] (or deserialization) checks
/// that every result set id has the form `"{node_id} {zygosity}"` with a
/// node id from `beaconHandovers`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawVlmResponse")]
pub struct VlmResponse {
    beacon_handovers: Vec<BeaconHandover>,
    meta: Meta,
    response_summary: ResponseSummary,
    response: ResponseField,
}

/// Unchecked mirror of [`VlmResponse`] used for deserialization.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVlmResponse {
    beacon_handovers: Vec<BeaconHandover>,
    meta: Meta,
    response_summary: ResponseSummary,
    response: ResponseField,
}

impl TryFrom<RawVlmResponse> for VlmResponse {
    type Error = Error;

    fn try_from(raw: RawVlmResponse) -> Result<Self, Self::Error> {
        VlmResponse::new(
            raw.beacon_handovers,
            raw.meta,
            raw.response_summary,
            raw.response,
        )
    }
}

fn malformed(id: &str, reason: String) -> Error {
    Error::MalformedResultSetId {
        id: id.to_string(),
        reason,
    }
}

/// Check that `id` is `"{node_id} {zygosity}"` with a known node id.
///
/// The id is split at the first space since "Unknown Zygosity" contains one.
pub fn validate_result_set_id(id: &str, handover_ids: &[&str]) -> Result<Zygosity, Error> {
    let (node_id, zygosity) = id.split_once(' ').ok_or_else(|| {
        malformed(
            id,
            format!("provided id of {} contains invalid formatting", id),
        )
    })?;
    if !handover_ids.contains(&node_id) {
        return Err(malformed(
            id,
            format!(
                "provided node_id of {} does not match any `handoverType.id` provided in \
                 `beaconHandovers`",
                node_id
            ),
        ));
    }
    Zygosity::from_str(zygosity).map_err(|_| {
        let valid = Zygosity::iter()
            .map(|z| z.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        malformed(
            id,
            format!(
                "provided zygosity of {} is not found in allowable value set of: {}",
                zygosity, valid
            ),
        )
    })
}

impl VlmResponse {
    /// Construct response, validating all result set ids.
    pub fn new(
        beacon_handovers: Vec<BeaconHandover>,
        meta: Meta,
        response_summary: ResponseSummary,
        response: ResponseField,
    ) -> Result<Self, Error> {
        let handover_ids = beacon_handovers
            .iter()
            .map(|handover| handover.handover_type.id.as_str())
            .collect::<Vec<_>>();
        for result_set in &response.result_sets {
            validate_result_set_id(&result_set.id, &handover_ids)?;
        }
        Ok(Self {
            beacon_handovers,
            meta,
            response_summary,
            response,
        })
    }

    pub fn beacon_handovers(&self) -> &[BeaconHandover] {
        &self.beacon_handovers
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn response_summary(&self) -> &ResponseSummary {
        &self.response_summary
    }

    pub fn result_sets(&self) -> &[ResultSet] {
        &self.response.result_sets
    }
}
