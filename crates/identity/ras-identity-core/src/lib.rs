//! Core identity traits and types shared by credential providers.
//!
//! A credential provider turns whatever the end user presented into a lookup
//! key and hands it to a [`UserStore`]. The store belongs to the hosting
//! application; this crate only fixes the shape of the conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid lookup criteria: {0}")]
    InvalidCriteria(String),

    #[error("User store error: {0}")]
    StoreError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Criteria a credential provider passes to the user store.
///
/// The OAuth2 flow resolves users by the access token alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupCriteria {
    pub token: String,
}

impl LookupCriteria {
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// User lookup capability supplied by the hosting application.
///
/// `Ctx` is the host's ambient request context; providers pass it through
/// untouched. Returning `Ok(None)` means "no such user" and is not an error.
#[async_trait]
pub trait UserStore<Ctx: ?Sized + Sync = ()>: Send + Sync {
    type User: Send;

    async fn find_user(
        &self,
        criteria: &LookupCriteria,
        ctx: &Ctx,
    ) -> IdentityResult<Option<Self::User>>;
}

#[async_trait]
impl<S, Ctx> UserStore<Ctx> for Arc<S>
where
    S: UserStore<Ctx> + ?Sized,
    Ctx: ?Sized + Sync,
{
    type User = S::User;

    async fn find_user(
        &self,
        criteria: &LookupCriteria,
        ctx: &Ctx,
    ) -> IdentityResult<Option<Self::User>> {
        (**self).find_user(criteria, ctx).await
    }
}

/// Token-keyed store kept in memory, handy for tests and demos.
pub struct InMemoryUserStore<U> {
    users: Arc<RwLock<HashMap<String, U>>>,
}

impl<U> InMemoryUserStore<U> {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, token: impl Into<String>, user: U) {
        let mut users = self.users.write().await;
        users.insert(token.into(), user);
    }

    pub async fn remove(&self, token: &str) -> Option<U> {
        let mut users = self.users.write().await;
        users.remove(token)
    }
}

impl<U> Default for InMemoryUserStore<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Clone for InMemoryUserStore<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
        }
    }
}

#[async_trait]
impl<U, Ctx> UserStore<Ctx> for InMemoryUserStore<U>
where
    U: Clone + Send + Sync,
    Ctx: ?Sized + Sync,
{
    type User = U;

    async fn find_user(
        &self,
        criteria: &LookupCriteria,
        _ctx: &Ctx,
    ) -> IdentityResult<Option<U>> {
        if criteria.token.is_empty() {
            return Err(IdentityError::InvalidCriteria(
                "token must not be empty".to_string(),
            ));
        }

        let users = self.users.read().await;
        Ok(users.get(&criteria.token).cloned())
    }
}
