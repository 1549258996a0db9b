//! Minimal axum server signing users in through the OAuth2 resolver.
//!
//! Credentials come from `sso.toml` (if present) and the environment:
//!
//! ```text
//! SSO_APPLICATION_ID=... SSO_APPLICATION_SECRET=... \
//!     cargo run -p ras-identity-sso --example facebook_login
//! ```
//!
//! Then open http://localhost:3000/login/facebook. Every token is accepted
//! as a user here; a real application would look it up in its own store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use ras_identity_core::{IdentityResult, LookupCriteria, UserStore};
use ras_identity_sso::{
    AuthInfo, AuthOutcome, CredentialsConfig, HttpRequest, OAuth2CredentialResolver,
    RedirectResponse,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize)]
struct SessionUser {
    token_suffix: String,
}

/// Accepts every token the provider issued.
struct TrustingStore;

#[async_trait]
impl UserStore for TrustingStore {
    type User = SessionUser;

    async fn find_user(
        &self,
        criteria: &LookupCriteria,
        _ctx: &(),
    ) -> IdentityResult<Option<SessionUser>> {
        let skip = criteria.token.chars().count().saturating_sub(4);
        Ok(Some(SessionUser {
            token_suffix: criteria.token.chars().skip(skip).collect(),
        }))
    }
}

#[derive(Clone)]
struct AppState {
    resolver: Arc<OAuth2CredentialResolver>,
    store: Arc<TrustingStore>,
}

async fn login(State(state): State<AppState>, request: HttpRequest) -> Response {
    let mut response = RedirectResponse::new();
    let auth_info = AuthInfo::with_scopes(["email", "public_profile"]);

    match state
        .resolver
        .authenticate(&request, &mut response, &state.store, &(), &auth_info)
        .await
    {
        Ok(auth) => match auth.outcome {
            AuthOutcome::Pending { .. } => response.into_response(),
            AuthOutcome::Authenticated(user) => Json(user).into_response(),
            AuthOutcome::Denied => (StatusCode::FORBIDDEN, "Unknown user").into_response(),
        },
        Err(e) => {
            error!("Login failed: {}", e);
            (StatusCode::UNAUTHORIZED, "Authentication failed").into_response()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let credentials = CredentialsConfig::load(Some(Path::new("sso.toml")))
        .context("SSO_APPLICATION_ID and SSO_APPLICATION_SECRET are required")?;
    let resolver = OAuth2CredentialResolver::new(credentials)?;

    let state = AppState {
        resolver: Arc::new(resolver),
        store: Arc::new(TrustingStore),
    };

    let app = Router::new()
        .route("/login/facebook", get(login))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
