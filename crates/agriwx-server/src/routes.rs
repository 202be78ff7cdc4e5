//! HTTP surface: weather lookup, recent history and a health check.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use agriwx_core::LookupError;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::lookup::LookupService;

/// All routes, with CORS open to any origin and per-request tracing.
pub fn routes(
    service: Arc<LookupService>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let weather = warp::get()
        .and(warp::path!("api" / "weather"))
        .and(warp::query::<HashMap<String, String>>())
        .and(with_service(service.clone()))
        .and_then(handle_weather);

    let history = warp::get()
        .and(warp::path!("api" / "history"))
        .and(with_service(service))
        .and_then(handle_history);

    let health = warp::get().and(warp::path!("health")).map(|| "ok");

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET"]);

    weather
        .or(history)
        .or(health)
        .with(cors)
        .with(warp::trace::request())
}

fn with_service(
    service: Arc<LookupService>,
) -> impl Filter<Extract = (Arc<LookupService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

async fn handle_weather(
    params: HashMap<String, String>,
    service: Arc<LookupService>,
) -> Result<WithStatus<Json>, Infallible> {
    let query = params.get("q").map(String::as_str).unwrap_or_default();

    match service.perform_lookup(query).await {
        Ok(result) => Ok(warp::reply::with_status(
            warp::reply::json(&result),
            StatusCode::OK,
        )),
        Err(e) => Ok(lookup_error_reply(&e)),
    }
}

async fn handle_history(service: Arc<LookupService>) -> Result<WithStatus<Json>, Infallible> {
    match service.history().recent(service.history_limit()).await {
        Ok(records) => Ok(warp::reply::with_status(
            warp::reply::json(&records),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Failed to read lookup history: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "error": "Server error" })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

fn lookup_error_reply(error: &LookupError) -> WithStatus<Json> {
    match error {
        LookupError::InvalidQuery | LookupError::LocationNotFound(_) => {
            tracing::debug!("Lookup rejected: {}", error)
        }
        _ => tracing::error!("Lookup failed: {}", error),
    }

    let body = match error.details() {
        Some(details) => json!({ "error": error.user_message(), "details": details }),
        None => json!({ "error": error.user_message() }),
    };
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    warp::reply::with_status(warp::reply::json(&body), status)
}
