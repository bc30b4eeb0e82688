// src/handlers/auth.rs

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::layout::{self, escape},
    middleware::{
        auth::{session_token, SESSION_COOKIE},
        i18n::{Locale, Msg},
    },
    models::auth::{AuthResponse, LoginUserPayload},
    services::auth::AuthState,
};

fn login_form(locale: &Locale, error: Option<&str>) -> Html<String> {
    let error = error
        .map(|msg| format!(r#"<div class="error">{}</div>"#, escape(msg)))
        .unwrap_or_default();

    let content = format!(
        r#"<h1>{app}</h1>{error}
<form method="post" action="/login">
<input name="email" type="email" placeholder="{email}" required>
<input name="password" type="password" placeholder="{password}" required>
<button type="submit">{sign_in}</button>
</form>"#,
        app = locale.t(Msg::AppName),
        error = error,
        email = locale.t(Msg::Email),
        password = locale.t(Msg::Password),
        sign_in = locale.t(Msg::SignIn),
    );

    layout::render_bare(locale, locale.t(Msg::SignIn), &content)
}

// GET /login
pub async fn login_page(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> Response {
    let token = session_token(&jar, &headers);
    if let AuthState::Authenticated(_) = app_state.auth_service.resolve(token.as_deref()).await {
        return Redirect::to("/").into_response();
    }

    login_form(&locale, None).into_response()
}

// POST /login
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Form(payload): Form<LoginUserPayload>,
) -> Response {
    let result = match payload.validate() {
        Ok(()) => {
            app_state
                .auth_service
                .login_user(&payload.email, &payload.password)
                .await
        }
        Err(e) => Err(AppError::ValidationError(e)),
    };

    match result {
        Ok(token) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(app_state.config.cookie_secure);

            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(err) => {
            let status = ApiError::from(&err).status;
            (status, login_form(&locale, Some(&err.public_message()))).into_response()
        }
    }
}

// POST /logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), Redirect::to("/login"))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login efetuado", body = AuthResponse),
        (status = 400, description = "Dados inválidos", body = ApiError),
        (status = 401, description = "Credenciais inválidas", body = ApiError)
    )
)]
pub async fn api_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let token = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}
