//! Saved apps
//!
//! The persistence collaborator only needs to hand back `{code, name}` for a
//! saved app; [`AppRecord`] carries the rest of the listing data. `code` is
//! always the source text of one validated artifact.

use appforge_artifact::CodeArtifact;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    #[default]
    Draft,
    Deployed,
}

/// A persisted app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub code: String,
    pub thumbnail: Option<String>,
    pub status: AppStatus,
    pub deployment_tx_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry without the code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub status: AppStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&AppRecord> for AppSummary {
    fn from(app: &AppRecord) -> Self {
        Self {
            id: app.id,
            name: app.name.clone(),
            description: app.description.clone(),
            category: app.category.clone(),
            price: app.price,
            thumbnail: app.thumbnail.clone(),
            status: app.status,
            created_at: app.created_at,
        }
    }
}

/// Listing data for a new app; the code comes from a validated artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApp {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Persistence failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No app with this id
    #[error("app {0} not found")]
    NotFound(Uuid),

    /// Only validated code is persisted
    #[error("refusing to store unvalidated code: {0}")]
    NotValid(String),

    /// Storage backend failed
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence collaborator
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Persist a draft built from a valid artifact
    async fn create(&self, app: NewApp, artifact: &CodeArtifact) -> Result<AppRecord, StoreError>;

    /// Fetch by id
    async fn get(&self, id: Uuid) -> Result<AppRecord, StoreError>;

    /// Every app, newest first
    async fn list(&self) -> Result<Vec<AppRecord>, StoreError>;

    /// Change publication state
    async fn set_status(
        &self,
        id: Uuid,
        status: AppStatus,
        deployment_tx_id: Option<String>,
    ) -> Result<AppRecord, StoreError>;

    /// Remove an app
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Process-local [`AppStore`]
#[derive(Debug, Default)]
pub struct InMemoryAppStore {
    apps: DashMap<Uuid, AppRecord>,
}

impl InMemoryAppStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored apps
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[async_trait]
impl AppStore for InMemoryAppStore {
    async fn create(&self, app: NewApp, artifact: &CodeArtifact) -> Result<AppRecord, StoreError> {
        if !artifact.is_valid() {
            return Err(StoreError::NotValid(format!(
                "artifact {} is {:?}",
                artifact.hash().short(),
                artifact.state()
            )));
        }

        let now = Utc::now();
        let record = AppRecord {
            id: Uuid::new_v4(),
            name: app.name,
            description: app.description,
            category: app.category,
            price: app.price,
            code: artifact.source().to_string(),
            thumbnail: app.thumbnail,
            status: AppStatus::Draft,
            deployment_tx_id: None,
            created_at: now,
            updated_at: now,
        };
        self.apps.insert(record.id, record.clone());
        tracing::debug!(id = %record.id, "Stored app");
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<AppRecord, StoreError> {
        self.apps
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<AppRecord>, StoreError> {
        let mut apps: Vec<AppRecord> = self.apps.iter().map(|e| e.value().clone()).collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(apps)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppStatus,
        deployment_tx_id: Option<String>,
    ) -> Result<AppRecord, StoreError> {
        let mut entry = self.apps.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        entry.status = status;
        if deployment_tx_id.is_some() {
            entry.deployment_tx_id = deployment_tx_id;
        }
        entry.updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.apps
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
