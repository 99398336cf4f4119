//! AnyVar client speaking the AnyVar REST API.

use std::time::Duration;

use reqwest::{blocking::Client, StatusCode};
use serde::Deserialize;

use super::{Allele, Error, VariantId, VariantResolver};
use crate::common::GenomeRelease;

/// `detail` message of AnyVar for accessions it cannot dereference.
pub const UNKNOWN_ACCESSION_DETAIL: &str = "Unable to dereference provided accession ID";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Request body for registration and translation.
#[derive(Debug, serde::Serialize)]
struct VariationRequest<'a> {
    definition: &'a str,
    assembly_name: String,
    input_type: &'static str,
}

impl<'a> VariationRequest<'a> {
    fn new(definition: &'a str, assembly: GenomeRelease) -> Self {
        Self {
            definition,
            assembly_name: assembly.name(),
            input_type: Allele::TYPE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    object_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    variation: Option<Allele>,
}

#[derive(Debug, Deserialize)]
struct GetVariationResponse {
    data: Allele,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    variations: Vec<Allele>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Whether an error status means AnyVar cannot translate or find the variant.
///
/// Any other non-success status (authorization, throttling, timeouts, server
/// faults) is a failure of the service itself.
fn is_unresolvable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
    )
}

/// Whether an error reply of the search endpoint means "no such accession".
fn is_unknown_accession(status: StatusCode, body: &str) -> bool {
    status.is_client_error()
        && serde_json::from_str::<ErrorDetail>(body)
            .ok()
            .and_then(|e| e.detail)
            .map(|detail| detail == serde_json::Value::from(UNKNOWN_ACCESSION_DETAIL))
            .unwrap_or(false)
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_decode() {
        Error::Decode(e.to_string())
    } else {
        Error::Connection(e.to_string())
    }
}

fn response_error(status: StatusCode, body: String) -> Error {
    Error::Response {
        status: status.as_u16(),
        message: body.trim().to_string(),
    }
}

/// Blocking HTTP client for an AnyVar instance.
#[derive(Debug, Clone)]
pub struct HttpAnyVarClient {
    base_url: String,
    client: Client,
}

impl HttpAnyVarClient {
    /// Construct client for the API root `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Connection(format!("could not build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Register one expression; `None` if AnyVar cannot translate the expression.
    fn register(&self, expression: &str, assembly: GenomeRelease) -> Result<Option<VariantId>, Error> {
        let response = self
            .client
            .put(self.url("variation"))
            .json(&VariationRequest::new(expression, assembly))
            .send()
            .map_err(transport_error)?;
        let status = response.status();
        if is_unresolvable(status) {
            tracing::debug!("AnyVar could not register {}: HTTP {}", expression, status);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(response_error(status, response.text().unwrap_or_default()));
        }
        let reply: RegisterResponse = response.json().map_err(transport_error)?;
        Ok(reply.object_id.filter(|id| !id.is_empty()).map(VariantId::new))
    }
}

impl VariantResolver for HttpAnyVarClient {
    fn resolve_or_register(
        &self,
        expressions: &[String],
        assembly: GenomeRelease,
    ) -> Result<Vec<Option<VariantId>>, Error> {
        let ids = expressions
            .iter()
            .map(|expression| self.register(expression, assembly))
            .collect::<Result<Vec<_>, _>>()?;
        if ids.len() != expressions.len() {
            return Err(Error::LengthMismatch {
                expected: expressions.len(),
                actual: ids.len(),
            });
        }
        Ok(ids)
    }

    fn resolve_single(
        &self,
        expression: &str,
        assembly: GenomeRelease,
    ) -> Result<Option<Allele>, Error> {
        let response = self
            .client
            .post(self.url("translate"))
            .json(&VariationRequest::new(expression, assembly))
            .send()
            .map_err(transport_error)?;
        let status = response.status();
        if is_unresolvable(status) {
            tracing::debug!("AnyVar could not translate {}: HTTP {}", expression, status);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(response_error(status, response.text().unwrap_or_default()));
        }
        let translated: TranslateResponse = response.json().map_err(transport_error)?;
        let Some(id) = translated.variation.as_ref().and_then(Allele::variant_id) else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.url(&format!("variation/{}", id)))
            .send()
            .map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(response_error(status, response.text().unwrap_or_default()));
        }
        let reply: GetVariationResponse = response.json().map_err(transport_error)?;
        Ok(Some(reply.data))
    }

    fn search_interval(
        &self,
        accession: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<Allele>, Error> {
        let response = self
            .client
            .get(self.url("search"))
            .query(&[
                ("accession", accession.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
            ])
            .send()
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            if is_unknown_accession(status, &body) {
                return Ok(Vec::new());
            }
            return Err(response_error(status, body));
        }
        let reply: SearchResponse = response.json().map_err(transport_error)?;
        Ok(reply.variations)
    }
}
