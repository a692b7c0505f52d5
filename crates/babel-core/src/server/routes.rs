//! HTTP routes of the translation service.
//!
//! All parameters travel in the query string; list parameters are repeated
//! (`?data_list=a&data_list=b`). Responses are JSON, errors are `{"error": message}`.

use std::convert::Infallible;
use std::sync::Arc;

use babel_abstraction::EngineError;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Response, StatusCode, Uri};
use http_body_util::Full;
use hyper::body::Bytes;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::service::TranslationService;

/// Request failures and the status they map to.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter is absent.
    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    /// The query string is not valid percent-encoded UTF-8.
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    /// No route for the path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The route exists but not for this method.
    #[error("Method {method} not allowed, use {allowed}")]
    MethodNotAllowed {
        /// Method of the request.
        method: Method,
        /// Method the route accepts.
        allowed: Method,
    },

    /// Translation failures.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::InvalidQuery(_)
            | Self::Engine(EngineError::UnsupportedPair { .. }) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Engine(EngineError::ShuttingDown) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Engine(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = json_response(self.status(), &json!({ "error": self.to_string() }));
        if let Self::MethodNotAllowed { allowed, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                response.headers_mut().insert(ALLOW, value);
            }
        }
        response
    }
}

/// Decoded query parameters, in order of appearance.
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidQuery` if a component does not decode to UTF-8.
    pub fn parse(query: Option<&str>) -> Result<Self, ApiError> {
        let mut pairs = Vec::new();
        for component in query.unwrap_or_default().split('&').filter(|c| !c.is_empty()) {
            let (key, value) = component.split_once('=').unwrap_or((component, ""));
            pairs.push((decode(key)?, decode(value)?));
        }
        Ok(Self { pairs })
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// First value of `key`, or `MissingParameter`.
    ///
    /// # Errors
    /// Returns `ApiError::MissingParameter` if `key` is absent.
    pub fn require(&self, key: &'static str) -> Result<&str, ApiError> {
        self.get(key).ok_or(ApiError::MissingParameter(key))
    }

    /// Every value of a repeated `key`, in order.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v.clone()).collect()
    }
}

fn decode(component: &str) -> Result<String, ApiError> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ApiError::InvalidQuery(e.to_string()))
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn ok<T: Serialize + ?Sized>(body: &T) -> Result<Response<Full<Bytes>>, ApiError> {
    Ok(json_response(StatusCode::OK, body))
}

/// Route table: path and the one method it accepts.
fn allowed_method(path: &str) -> Option<Method> {
    match path {
        "/" | "/supported" | "/translate" | "/translate_list" | "/augment" | "/stats" => {
            Some(Method::GET)
        }
        "/free_model" | "/empty_cache" => Some(Method::POST),
        _ => None,
    }
}

/// Handle one HTTP request against `service`.
///
/// Never fails at the transport level; every error becomes a JSON error response.
pub async fn handle<B>(
    request: Request<B>,
    service: Arc<TranslationService>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, _body) = request.into_parts();
    Ok(route(&parts.method, &parts.uri, &service).await.unwrap_or_else(|e| {
        if e.status().is_server_error() {
            warn!(error = %e, "Translation request failed");
        }
        e.into_response()
    }))
}

async fn route(
    method: &Method,
    uri: &Uri,
    service: &TranslationService,
) -> Result<Response<Full<Bytes>>, ApiError> {
    let path = match uri.path().trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    let allowed = allowed_method(path).ok_or_else(|| ApiError::NotFound(path.to_string()))?;
    if *method != allowed {
        return Err(ApiError::MethodNotAllowed { method: method.clone(), allowed });
    }

    let query = QueryParams::parse(uri.query())?;

    match path {
        "/" => {
            let pairs: Vec<String> = service.pairs().iter().map(ToString::to_string).collect();
            ok(&json!({ "models": service.models(), "pairs": pairs }))
        }
        "/supported" => ok(&json!({ "translations": service.supported_translations() })),
        "/translate" => {
            let translated = service
                .translate(
                    query.require("source_lang")?,
                    query.require("target_lang")?,
                    query.require("data")?,
                )
                .await?;
            ok(&translated)
        }
        "/translate_list" => {
            let translated = service
                .translate_list(
                    query.require("source_lang")?,
                    query.require("target_lang")?,
                    &query.all("data_list"),
                )
                .await?;
            ok(&translated)
        }
        "/augment" => {
            let augmentations = service
                .augment(
                    query.require("source_lang")?,
                    &query.all("target_langs"),
                    query.require("data")?,
                )
                .await?;
            ok(&augmentations)
        }
        "/free_model" => {
            let freed =
                service.free(query.require("source_lang")?, query.require("target_lang")?).await;
            ok(&json!({ "freed": freed }))
        }
        "/empty_cache" => {
            service.empty_cache().await;
            ok(&true)
        }
        "/stats" => ok(&service.stats().await),
        _ => Err(ApiError::NotFound(path.to_string())),
    }
}
