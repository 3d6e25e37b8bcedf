//! HTTP handler functions for the parking board API.

use actix_web::{HttpRequest, HttpResponse, error, web};
use parking_index::QueryError;
use parking_report_models::{ReportDraft, ValidationError};
use parking_server_models::{
    ApiError, ApiHealth, ReportCreatedResponse, SearchQueryParams, SearchResponse,
};
use parking_store::AppendError;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/parking/report`
///
/// Validates and stores a report. Responds `201` with the stored record.
pub async fn report(state: web::Data<AppState>, draft: web::Json<ReportDraft>) -> HttpResponse {
    match state.store.append(&draft).await {
        Ok(report) => HttpResponse::Created().json(ReportCreatedResponse {
            message: "Parking spot reported successfully".to_string(),
            report,
        }),
        Err(AppendError::Validation(e)) => bad_request(&e),
        Err(AppendError::Storage(e)) => {
            log::error!("Failed to store parking report: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to report parking spot"))
        }
    }
}

/// `GET /api/parking/search`
///
/// Returns the freshest open spots within the radius of `lat`/`lng`.
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchQueryParams>,
) -> HttpResponse {
    let request = match params.to_request() {
        Ok(request) => request,
        Err(e) => return bad_request(&e),
    };

    match state.index.query(&request).await {
        Ok(results) => HttpResponse::Ok().json(SearchResponse::from(results)),
        Err(QueryError::Validation(e)) => bad_request(&e),
        Err(QueryError::Storage(e)) => {
            log::error!("Failed to search parking spots: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to search parking spots"))
        }
    }
}

/// Turns body decode failures into the same `400 { message }` shape as
/// validation failures.
pub fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request(&ValidationError::MalformedRequest(err.to_string()));
    error::InternalError::from_response(err, response).into()
}

/// Same as [`json_error`] for query strings that cannot be decoded.
pub fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request(&ValidationError::MalformedRequest(err.to_string()));
    error::InternalError::from_response(err, response).into()
}

fn bad_request(e: &ValidationError) -> HttpResponse {
    log::debug!("Rejected request: {e}");
    HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
}
