// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::layout,
    middleware::i18n::{Locale, Msg},
    models::auth::Session,
    services::auth::AuthState,
};

pub const SESSION_COOKIE: &str = "session";
// Segundos sugeridos ao navegador enquanto a sessão não pode ser confirmada.
const RETRY_AFTER_SECS: &str = "2";

/// Token da sessão: cookie `session` primeiro, depois `Authorization: Bearer`.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

// Portão das páginas: renderiza, redireciona para /login ou mostra "Loading..."
pub async fn auth_gate(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(&jar, request.headers());

    match app_state.auth_service.resolve(token.as_deref()).await {
        AuthState::Authenticated(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        AuthState::Unauthenticated => Redirect::to("/login").into_response(),
        AuthState::Loading => loading_page(&locale),
    }
}

// Guarda da API JSON: mesmo token, mas responde 401 em vez de redirecionar.
pub async fn api_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&jar, request.headers());

    match app_state.auth_service.resolve(token.as_deref()).await {
        AuthState::Authenticated(session) => {
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        AuthState::Unauthenticated => Err(AppError::InvalidToken.into()),
        AuthState::Loading => Err(ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: "Não foi possível confirmar a sessão, tente novamente.".to_string(),
            details: None,
        }),
    }
}

fn loading_page(locale: &Locale) -> Response {
    let body = format!(
        r#"<div class="loading"><p>{}</p></div>"#,
        locale.t(Msg::Loading)
    );

    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
        layout::render_bare(locale, locale.t(Msg::Loading), &body),
    )
        .into_response()
}

// Extrator para obter a sessão autenticada diretamente nos handlers
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| AppError::InvalidToken.into())
    }
}
