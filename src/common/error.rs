// src/common/error.rs

use std::{collections::HashMap, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::RemoteError;

// Erro compartilhado: o cache guarda o mesmo erro para todos os leitores da chave.
pub type SharedError = Arc<AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Erros do serviço remoto passam adiante sem reescrita.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Linha recebida em formato inesperado: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Mensagem curta exibida nas páginas (o erro "genérico" inline).
    pub fn public_message(&self) -> String {
        match self {
            AppError::Remote(e) => e.to_string(),
            AppError::ValidationError(_) => "Um ou mais campos são inválidos.".to_string(),
            other => other.to_string(),
        }
    }

    /// Falhas de rede ou do banco podem passar numa nova tentativa; o resto se repete igual.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Remote(RemoteError::Unavailable(_) | RemoteError::Database(_))
                | AppError::InternalServerError(_)
        )
    }
}

// Corpo de erro devolvido pela API JSON.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        let (status, error) = match err {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: "Um ou mais campos são inválidos.".to_string(),
                    details: Some(json!(details)),
                };
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string())
            }
            AppError::Remote(RemoteError::NotSingle { .. }) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            AppError::Remote(RemoteError::InvalidPayload(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Remote(e) => {
                tracing::error!("🔥 Falha no serviço remoto: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        ApiError { status, error, details: None }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::from(&err)
    }
}

impl From<SharedError> for ApiError {
    fn from(err: SharedError) -> Self {
        ApiError::from(err.as_ref())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
