use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::handlers::auth_to_api;
use super::state::ApiState;

/// Require an admin session. The principal goes into the request extensions
/// for handlers and the response extensions for the response logger.
pub async fn admin_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers().get(header::AUTHORIZATION));

    let principal = match state.auth.require_admin(token.as_deref()).await {
        Ok(principal) => principal,
        Err(err) => return auth_to_api(err).into_response(),
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    (!bearer.is_empty()).then(|| bearer.to_string())
}
