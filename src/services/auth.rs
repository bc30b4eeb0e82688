// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RemoteStore, SelectQuery, Table},
    models::auth::{Claims, Session, User},
};

/// Resultado da resolução da sessão pelo portão.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    // Token válido, mas o usuário ainda não pôde ser confirmado (serviço remoto falhou).
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn RemoteStore>,
    jwt_secret: String,
    session_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn RemoteStore>, jwt_secret: String, session_ttl: chrono::Duration) -> Self {
        Self { store, jwt_secret, session_ttl }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "🔑 login efetuado");
        self.create_token(&user)
    }

    pub async fn validate_token(&self, token: &str) -> Result<Session, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        Ok(Session {
            user_id: user.id,
            company_id: user.company_id,
            email: user.email,
        })
    }

    /// Estados do portão: sem token ou token ruim = não autenticado;
    /// falha do serviço remoto ao confirmar o usuário = ainda carregando.
    pub async fn resolve(&self, token: Option<&str>) -> AuthState {
        let Some(token) = token else {
            return AuthState::Unauthenticated;
        };

        match self.validate_token(token).await {
            Ok(session) => AuthState::Authenticated(session),
            Err(AppError::Remote(e)) => {
                tracing::warn!("sessão não confirmada, serviço remoto falhou: {}", e);
                AuthState::Loading
            }
            Err(e) => {
                tracing::debug!("sessão rejeitada: {}", e);
                AuthState::Unauthenticated
            }
        }
    }

    pub async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one(SelectQuery::from(Table::Users).eq("email", email)).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.find_one(SelectQuery::from(Table::Users).eq("id", id.to_string())).await
    }

    async fn find_one(&self, query: SelectQuery) -> Result<Option<User>, AppError> {
        let row = self.store.select(&query).await?.into_iter().next();
        Ok(row.map(serde_json::from_value).transpose()?)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let claims = Claims {
            sub: user.id,
            company_id: user.company_id,
            email: user.email.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
