use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::AppError;
use super::AppState;
use crate::db::ApiKeyRepository;
use crate::models::User;

/// Authenticated user, added to request extensions after auth
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) if h.starts_with("Bearer ") => h[7..].trim().to_string(),
        Some(_) => {
            return AppError::Unauthorized {
                code: "invalid_auth",
                message: "Authorization header must use Bearer scheme",
            }
            .into_response();
        }
        None => {
            return AppError::Unauthorized {
                code: "missing_auth",
                message: "Authorization header required",
            }
            .into_response();
        }
    };

    // Validate API key
    match ApiKeyRepository::new(state.pool.clone())
        .authenticate(&api_key)
        .await
    {
        Ok(Some(user)) => {
            // Add user info to request extensions
            request.extensions_mut().insert(AuthUser(user));
            next.run(request).await
        }
        Ok(None) => AppError::Unauthorized {
            code: "invalid_key",
            message: "Invalid API key",
        }
        .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
