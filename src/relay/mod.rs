//! Server-side relay for Reddit API calls.
//!
//! Exposes `POST /api/reddit`, which accepts
//! `{url, token, method = "GET", body?}`, attaches the bearer token,
//! user agent and content type, and forwards the call upstream. The upstream
//! JSON body is returned verbatim; failures come back as `{"error": ...}`:
//!
//! - `400` - `url` or `token` missing/empty, or `method` unparseable
//! - `403` - `url` is not on the allowed host list
//! - `500` - malformed request JSON, upstream error status, or undecodable
//!   upstream body
use crate::reddit::{ApiRequest, DirectTransport, Transport};
use crate::util::validate_target_url;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer};
use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use tracing_actix_web::TracingLogger;

/// Path the relay listens on.
pub const RELAY_PATH: &str = "/api/reddit";

const MISSING_FIELDS: &str = "Missing required fields: url and token are required";

/// Shared state for relay workers.
#[derive(Debug, Clone)]
pub struct RelayState {
    transport: DirectTransport,
    allowed_hosts: Vec<String>,
}

impl RelayState {
    pub fn new(transport: DirectTransport, allowed_hosts: Vec<String>) -> Self {
        Self {
            transport,
            allowed_hosts,
        }
    }
}

/// Incoming relay request. Everything is optional so missing fields can be
/// answered with `400` instead of a decode failure.
#[derive(Deserialize)]
struct RelayRequest {
    url: Option<String>,
    token: Option<String>,
    method: Option<String>,
    body: Option<String>,
}

/// Register relay routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(RELAY_PATH, web::post().to(relay));
}

/// Run the relay until the process is stopped.
pub async fn serve(bind: &str, state: RelayState) -> std::io::Result<()> {
    tracing::info!(
        bind = %bind,
        allowed_hosts = ?state.allowed_hosts,
        "Starting relay"
    );
    let data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}

async fn relay(state: web::Data<RelayState>, payload: web::Bytes) -> HttpResponse {
    let request: RelayRequest = match serde_json::from_slice(&payload) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Relay request body is not valid JSON");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let (url, token) = match (request.url, request.token) {
        (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => (url, token),
        _ => return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS),
    };

    let method = match request.method.as_deref().map(str::trim) {
        None | Some("") => Method::GET,
        Some(m) => match Method::from_bytes(m.to_ascii_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid HTTP method: {}", m),
                )
            }
        },
    };

    if let Err(e) = validate_target_url(&url, &state.allowed_hosts) {
        tracing::warn!(url = %url, error = %e, "Rejected relay target");
        return error_response(StatusCode::FORBIDDEN, e.to_string());
    }

    let body = request.body.filter(|b| !b.is_empty());
    tracing::info!(
        url = %url,
        method = %method,
        has_body = body.is_some(),
        "Relaying request to Reddit API"
    );

    let token = SecretString::from(token);
    let api_request = ApiRequest { url, method, body };
    match state.transport.send(&token, api_request).await {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => {
            tracing::error!(error = %e, "Relayed request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message.into() }))
}
