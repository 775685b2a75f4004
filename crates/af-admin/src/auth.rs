//! Request authentication
//!
//! Tokens and tenants live in their own collections; the [`AuthStore`]
//! trait resolves them into a request-scoped [`RequestContext`]. Handlers
//! never touch ambient identity state.

use async_trait::async_trait;
use bson::doc;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identity attached to one request after authentication.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub tenant_id: String,
}

impl RequestContext {
    /// Context for surfaces that serve unauthenticated traffic, such as the
    /// bridge proxy.
    pub fn anonymous() -> Self {
        Self {
            user_id: String::new(),
            tenant_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "_id")]
    pub id: String,
    pub token: String,
    pub token_type: String,
    pub user_id: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Resolve a bearer credential to its owning identity.
    async fn resolve_token(&self, token_type: &str, token: &str)
        -> Result<Option<RequestContext>>;

    /// Resolve a tenant id to the identity of its owner.
    async fn resolve_tenant(&self, tenant_id: &str) -> Result<Option<RequestContext>>;
}

pub struct MongoAuthStore {
    tokens: Collection<AccessToken>,
    tenants: Collection<Tenant>,
}

impl MongoAuthStore {
    pub fn new(db: &Database) -> Self {
        Self {
            tokens: db.collection("access_tokens"),
            tenants: db.collection("tenants"),
        }
    }
}

#[async_trait]
impl AuthStore for MongoAuthStore {
    async fn resolve_token(
        &self,
        token_type: &str,
        token: &str,
    ) -> Result<Option<RequestContext>> {
        let found = self
            .tokens
            .find_one(doc! { "token_type": token_type, "token": token })
            .await?;
        Ok(found.map(|t| RequestContext {
            user_id: t.user_id,
            tenant_id: t.tenant_id,
        }))
    }

    async fn resolve_tenant(&self, tenant_id: &str) -> Result<Option<RequestContext>> {
        let found = self.tenants.find_one(doc! { "_id": tenant_id }).await?;
        Ok(found.map(|t| RequestContext {
            user_id: t.owner_id,
            tenant_id: t.id,
        }))
    }
}
