use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{auth::SessionPrincipal, error::ErrorReport};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tag each request with an id and echo it back in `x-request-id`.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
        .extensions_mut()
        .insert(RequestContext { request_id });
    response
}

/// Admin session behind a response. The admin gate runs inside this layer,
/// so the principal is read back from the response, not the request.
struct Caller {
    session_id: String,
    user_id: String,
    role: &'static str,
}

impl Caller {
    fn from_response(response: &Response) -> Self {
        match response.extensions().get::<SessionPrincipal>() {
            Some(principal) => Self {
                session_id: principal.session_id.to_string(),
                user_id: principal.user_id.to_string(),
                role: principal.role.as_str(),
            },
            None => Self {
                session_id: String::new(),
                user_id: String::new(),
                role: "anonymous",
            },
        }
    }
}

struct Failure {
    source: &'static str,
    detail: String,
    chain: Vec<String>,
}

impl Failure {
    /// Detach the error report so it never leaves the process.
    fn take(response: &mut Response) -> Self {
        match response.extensions_mut().remove::<ErrorReport>() {
            Some(report) => Self {
                source: report.source,
                detail: report
                    .messages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "no diagnostic available".to_string()),
                chain: report.messages,
            },
            None => Self {
                source: "unknown",
                detail: "no diagnostic available".to_string(),
                chain: Vec::new(),
            },
        }
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let failure = Failure::take(&mut response);
    let caller = Caller::from_response(&response);

    if status.is_server_error() {
        error!(
            target: "florista::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms,
            source = failure.source,
            detail = %failure.detail,
            chain = ?failure.chain,
            request_id = %request_id,
            session_id = %caller.session_id,
            user_id = %caller.user_id,
            role = caller.role,
            "request failed",
        );
    } else {
        warn!(
            target: "florista::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms,
            source = failure.source,
            detail = %failure.detail,
            chain = ?failure.chain,
            request_id = %request_id,
            session_id = %caller.session_id,
            user_id = %caller.user_id,
            role = caller.role,
            "client request error",
        );
    }

    response
}
