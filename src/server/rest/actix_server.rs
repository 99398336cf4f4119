//! Implementation of the actix server.

use std::io::Write;

use actix_web::{
    get,
    http::StatusCode,
    middleware::Logger,
    post,
    web::{self, Data, Json},
    App, HttpResponse, HttpServer, Responder, ResponseError,
};
use futures::StreamExt;
use serde::Deserialize;
use thousands::Separable;

use super::{
    schema::{ErrorDetail, IngestResponse, ServiceInfo},
    Args, WebServerData,
};
use crate::{
    common::{self, locus::GenomicLocus, normalize_assembly},
    err::{Error, ErrorClass},
    ingest::{self, IngestSummary, DEFAULT_BATCH_SIZE, DEFAULT_COHORT},
    vlm::build,
};

/// Largest accepted VCF upload (5 GiB).
pub const MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024 * 1024;

#[derive(Debug)]
struct CustomError {
    err: anyhow::Error,
    status: StatusCode,
}

impl std::fmt::Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl CustomError {
    fn new(err: anyhow::Error, status: StatusCode) -> Self {
        CustomError { err, status }
    }

    fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::new(
            anyhow::anyhow!("{}", err),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    }
}

/// HTTP status for errors of the given class.
fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::ExpectedAbsence => StatusCode::NOT_FOUND,
        ErrorClass::Infrastructure => StatusCode::SERVICE_UNAVAILABLE,
        ErrorClass::DataIntegrity => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for CustomError {
    fn from(err: Error) -> Self {
        let status = status_for(err.class());
        if err.class().is_server_fault() {
            tracing::error!("{}", &err);
        }
        Self::new(err.into(), status)
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorDetail {
            detail: self.err.to_string(),
        })
    }
}

/// Provide service info in GA4GH service-info layout.
#[get("/service-info")]
async fn service_info(data: Data<WebServerData>) -> actix_web::Result<impl Responder, CustomError> {
    Ok(Json(ServiceInfo::new(data.settings.env)))
}

/// Parameters for `variant_counts`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct VariantCountsQuery {
    assembly_id: String,
    reference_name: String,
    start: u64,
    reference_bases: String,
    alternate_bases: String,
}

/// Allele counts of a single variant, broken down by zygosity.
#[get("/variant_counts")]
async fn variant_counts(
    data: Data<WebServerData>,
    query: web::Query<VariantCountsQuery>,
) -> actix_web::Result<impl Responder, CustomError> {
    let query = query.into_inner();
    let locus = GenomicLocus::new(
        &query.assembly_id,
        &query.reference_name,
        query.start,
        &query.reference_bases,
        &query.alternate_bases,
    )?;

    let response = web::block(move || {
        build::variant_counts(
            &data.handover,
            data.resolver.as_ref(),
            data.store.as_ref(),
            &locus,
        )
    })
    .await
    .map_err(CustomError::internal)??;
    Ok(Json(response))
}

/// Parameters for `ingest_vcf`.
#[derive(Deserialize, Debug, Clone)]
struct IngestQuery {
    assembly: String,
}

/// Upload bytes collected before they are written out in one blocking call.
const SPOOL_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Append `buf` to `file` on the blocking thread pool and hand `file` back.
async fn write_blocking<W>(mut file: W, buf: Vec<u8>) -> Result<W, CustomError>
where
    W: Write + Send + 'static,
{
    web::block(move || -> std::io::Result<W> {
        file.write_all(&buf)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(CustomError::internal)?
    .map_err(CustomError::internal)
}

/// Copy the request body into `file`, enforcing `MAX_UPLOAD_SIZE`.
async fn spool_payload<S, E, W>(mut payload: S, mut file: W) -> Result<(W, u64), CustomError>
where
    S: futures::Stream<Item = Result<web::Bytes, E>> + Unpin,
    E: std::fmt::Display,
    W: Write + Send + 'static,
{
    let mut size = 0u64;
    let mut buf = Vec::with_capacity(SPOOL_BUFFER_SIZE);
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            CustomError::new(
                anyhow::anyhow!("problem reading upload: {}", e),
                StatusCode::BAD_REQUEST,
            )
        })?;
        size += chunk.len() as u64;
        if size > MAX_UPLOAD_SIZE {
            return Err(CustomError::new(
                anyhow::anyhow!(
                    "upload exceeds maximum size of {} bytes",
                    MAX_UPLOAD_SIZE.separate_with_commas()
                ),
                StatusCode::PAYLOAD_TOO_LARGE,
            ));
        }
        buf.extend_from_slice(&chunk);
        if buf.len() >= SPOOL_BUFFER_SIZE {
            let full = std::mem::replace(&mut buf, Vec::with_capacity(SPOOL_BUFFER_SIZE));
            file = write_blocking(file, full).await?;
        }
    }
    let file = write_blocking(file, buf).await?;
    Ok((file, size))
}

/// Ingest a gzip compressed VCF file sent as request body.
#[post("/ingest_vcf")]
async fn ingest_vcf(
    data: Data<WebServerData>,
    query: web::Query<IngestQuery>,
    payload: web::Payload,
) -> actix_web::Result<impl Responder, CustomError> {
    let assembly = normalize_assembly(&query.assembly)?;

    let tmp = tempfile::Builder::new()
        .prefix("anyvlm_")
        .suffix(".vcf.gz")
        .tempfile()
        .map_err(CustomError::internal)?;
    let (tmp, size) = spool_payload(payload, tmp).await?;
    tracing::info!(
        "received upload of {} bytes into {}",
        size.separate_with_commas(),
        tmp.path().display()
    );

    if !common::io::has_gzip_magic(tmp.path()).map_err(CustomError::internal)? {
        return Err(CustomError::new(
            anyhow::anyhow!("uploaded file must be gzip compressed"),
            StatusCode::BAD_REQUEST,
        ));
    }

    let summary = web::block(move || -> Result<IngestSummary, Error> {
        let input = common::io::open_read_maybe_gz(tmp.path())?;
        ingest::ingest_vcf(
            input,
            assembly,
            data.resolver.as_ref(),
            data.store.as_ref(),
            DEFAULT_BATCH_SIZE,
            DEFAULT_COHORT,
        )
    })
    .await
    .map_err(CustomError::internal)??;

    Ok(Json(IngestResponse {
        status: "success".into(),
        summary,
    }))
}

#[actix_web::main]
pub async fn main(args: &Args, data: Data<WebServerData>) -> std::io::Result<()> {
    HttpServer::new(move || {
        let app = App::new()
            .app_data(data.clone())
            .service(service_info)
            .service(variant_counts)
            .service(ingest_vcf);
        app.wrap(Logger::default())
    })
    .bind((args.listen_host.as_str(), args.listen_port))?
    .run()
    .await
}
