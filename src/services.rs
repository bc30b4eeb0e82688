pub mod auth;
pub use auth::{AuthService, AuthState};
