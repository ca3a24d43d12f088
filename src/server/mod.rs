//! HTTP surface: router, handlers, and configuration.
//!
//! The router is deliberately thin. GET strips the query string and asks
//! the [`CacheResolver`](crate::CacheResolver) for bytes; POST decodes
//! the form body and forwards it to the origin, bypassing the cache
//! entirely. Failure kinds map to HTTP statuses here and nowhere else:
//!
//! - `InvalidPath` → 404
//! - `Upstream` / `UpstreamStatus` → 502
//! - `Storage` → 500

pub mod config;

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Form, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics::counter;
use tracing::warn;

use crate::cache::CacheResolver;
use crate::origin::OriginClient;
use crate::{Error, telemetry};

pub use config::Config;

/// Shared per-process state handed to every handler.
pub struct AppContext {
    pub resolver: CacheResolver,
    pub origin: OriginClient,
}

/// Build the router: every path is either served from cache (GET) or
/// proxied (POST).
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(serve_cached).post(proxy_post))
        .route("/{*path}", get(serve_cached).post(proxy_post))
        .with_state(ctx)
}

async fn serve_cached(State(ctx): State<Arc<AppContext>>, uri: Uri) -> Response {
    match ctx.resolver.resolve(uri.path()).await {
        Ok(bytes) => {
            counter!(telemetry::REQUESTS_TOTAL, "method" => "GET", "status" => "ok")
                .increment(1);
            let mime = mime_guess::from_path(uri.path()).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], bytes).into_response()
        }
        Err(error) => error_response("GET", &error),
    }
}

async fn proxy_post(
    State(ctx): State<Arc<AppContext>>,
    uri: Uri,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    match ctx.origin.post_form(path_and_query, &params).await {
        Ok(bytes) => {
            counter!(telemetry::REQUESTS_TOTAL, "method" => "POST", "status" => "ok")
                .increment(1);
            Bytes::from(bytes).into_response()
        }
        Err(error) => error_response("POST", &error),
    }
}

/// Map a failure kind to its HTTP status and log the underlying detail.
/// No kind is fatal; the body stays empty.
fn error_response(method: &'static str, error: &Error) -> Response {
    let status = match error {
        Error::InvalidPath(_) => StatusCode::NOT_FOUND,
        Error::Upstream(_) | Error::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
        Error::Storage(_) | Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(method, %error, status = status.as_u16(), "request failed");
    counter!(telemetry::REQUESTS_TOTAL, "method" => method, "status" => "error").increment(1);

    status.into_response()
}
