//! Identity providers used by the host auth middleware.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{Identity, IdentityError, IdentityProvider};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::jwt::{JwtConfig, JwtError};

use crate::config::AuthConfig;

/// Verifies HS256 access tokens locally with the project's JWT secret.
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    jwt: JwtConfig,
}

impl JwtIdentityProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, JwtError> {
        let jwt = JwtConfig::with_leeway(&config.jwt_secret, &config.jwt_audience, config.leeway_secs)?;
        Ok(Self { jwt })
    }

    pub fn from_jwt_config(jwt: JwtConfig) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let claims = self.jwt.validate_access_token(token).map_err(|e| match e {
            JwtError::TokenExpired => IdentityError::Expired,
            _ => IdentityError::InvalidToken,
        })?;

        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies tokens remotely against the Supabase Auth user endpoint.
pub struct SupabaseIdentityProvider {
    client: Client,
    user_url: String,
    anon_key: String,
}

impl SupabaseIdentityProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            user_url: format!("{}/auth/v1/user", config.supabase_url.trim_end_matches('/')),
            anon_key: config.supabase_anon_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .get(&self.user_url)
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(IdentityError::InvalidToken)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(IdentityError::Unavailable(format!("HTTP {}: {}", status, body)));
            }
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if user.id.is_empty() {
            return Err(IdentityError::InvalidToken);
        }

        Ok(Identity {
            user_id: user.id,
            email: user.email,
        })
    }
}
