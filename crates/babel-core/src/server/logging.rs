//! Request logging with request IDs and timing.

use std::future::Future;
use std::time::Instant;

use http::{HeaderValue, Request, Response};
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Run `handler` for `request` inside a `request` span.
///
/// The request ID is taken from the `x-request-id` header or generated, inserted into
/// the request if missing and echoed on the response.
pub async fn with_request_logging<B, RB, F, Fut>(mut request: Request<B>, handler: F) -> Response<RB>
where
    F: FnOnce(Request<B>) -> Fut,
    Fut: Future<Output = Response<RB>>,
{
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);
    let header_value = HeaderValue::from_str(&request_id).ok();

    if !request.headers().contains_key(REQUEST_ID_HEADER) {
        if let Some(value) = header_value.clone() {
            request.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
    }

    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let start_time = Instant::now();

    let span = tracing::info_span!("request", request_id = %request_id, method = %method, uri = %uri);

    async move {
        info!("Received request");
        for (name, value) in request.headers() {
            debug!(header = %name, value = %value.to_str().unwrap_or("<?>"), "Request header");
        }

        let mut response = handler(request).await;
        let duration = start_time.elapsed();
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            warn!(status = status.as_u16(), duration_ms = duration.as_millis(), "Request failed");
        } else {
            info!(
                status = status.as_u16(),
                duration_ms = duration.as_millis(),
                "Request completed successfully"
            );
        }

        if let Some(value) = header_value {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
