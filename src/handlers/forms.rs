// src/handlers/forms.rs
//
// Peças comuns dos formulários HTML das páginas com dados.

use std::{fmt::Display, str::FromStr};

use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::{Deserialize, Deserializer};

use crate::{
    common::error::{ApiError, SharedError},
    hooks::{HookState, Resource, ResourceHook},
};

// GET /customers?search=...
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

/// Campo de formulário vazio vira `None`; o resto é convertido com `FromStr`.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Depois de uma mutação: sucesso volta para a lista (303);
/// falha renderiza a página de novo com o erro combinado.
pub async fn finish_mutation<R, F>(
    hook: &ResourceHook<R>,
    result: Result<(), SharedError>,
    back_to: &str,
    render: F,
) -> Response
where
    R: Resource,
    F: FnOnce(&HookState<R>) -> Html<String>,
{
    let err = match result {
        Ok(()) => return Redirect::to(back_to).into_response(),
        Err(err) => err,
    };

    tracing::warn!(table = R::TABLE.name(), "mutação rejeitada: {}", err);
    let status = ApiError::from(err.as_ref()).status;

    let mut state = hook.load().await;
    if state.error.is_none() {
        state.error = Some(err);
    }

    (status, render(&state)).into_response()
}
