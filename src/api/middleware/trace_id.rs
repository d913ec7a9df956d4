use crate::AppState;
use crate::services::trace::{self, TraceToken};
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Binds a trace token for the whole request and echoes it back.
///
/// An inbound trace header is reused verbatim; otherwise a fresh token is
/// minted. The binding is dropped when the inner service returns, on error
/// paths included.
pub async fn trace_id_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let header = state.config.trace_header.clone();
    let token = TraceToken::from_header(req.headers().get(&header).and_then(|v| v.to_str().ok()));

    let span = tracing::info_span!(
        "http_request",
        trace_id = %token,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = trace::scope(token.clone(), next.run(req))
        .instrument(span)
        .await;

    match HeaderValue::from_str(token.as_str()) {
        Ok(value) => {
            response.headers_mut().insert(header, value);
        }
        Err(e) => tracing::warn!(trace_id = %token, "Trace id is not a valid header value: {}", e),
    }

    response
}
