use std::time::Instant;

use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures_util::{Stream, StreamExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::models::ApiResponse;
use crate::{Error, Result};

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub classifier: Classifier,
    pub max_payload_bytes: usize,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)));
}

pub async fn predict(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);

    async move {
        let started = Instant::now();

        let outcome = handle(&req, payload, state).await;
        match &outcome {
            Ok(_) => info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request processed"
            ),
            Err(e) => warn!(error = %e, "request rejected"),
        }
        outcome
    }
    .instrument(span)
    .await
}

async fn handle(
    req: &HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = state.max_payload_bytes;
    let bytes = if is_multipart(req) {
        read_multipart(Multipart::new(req.headers(), payload), limit).await?
    } else {
        collect(payload, limit).await?
    };

    if bytes.is_empty() {
        return Err(Error::NoInputData);
    }
    info!("Received image of size: {} bytes", bytes.len());

    let prediction = web::block(move || state.classifier.classify(&bytes))
        .await
        .map_err(|e| Error::inference(format!("blocking task failed: {}", e)))??;

    Ok(HttpResponse::Ok().json(ApiResponse::success(&prediction)))
}

fn is_multipart(req: &HttpRequest) -> bool {
    matches!(
        req.mime_type(),
        Ok(Some(ct)) if ct.essence_str() == mime::MULTIPART_FORM_DATA.essence_str()
    )
}

/// Take the bytes of the `file` field; every other field is drained.
async fn read_multipart(mut payload: Multipart, limit: usize) -> Result<Vec<u8>> {
    let mut file = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|_| Error::NoInputData)?;
        let is_file = field.content_disposition().get_name() == Some(FILE_FIELD);

        if is_file && file.is_none() {
            file = Some(collect(&mut field, limit).await?);
        } else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|_| Error::NoInputData)?;
            }
        }
    }

    file.ok_or(Error::NoInputData)
}

async fn collect<S, B, E>(mut stream: S, limit: usize) -> Result<Vec<u8>>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|_| Error::NoInputData)?;
        let chunk = chunk.as_ref();
        if buf.len() + chunk.len() > limit {
            return Err(Error::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(chunk);
    }
    Ok(buf)
}
