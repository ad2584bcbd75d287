//! Workspace settings store.
//!
//! The store is an external collaborator: a key-value provider the stages
//! read preferences from. Writes replace the whole settings object and are
//! validated against the preferences schema first, so a rejected write
//! leaves the previous value in place.

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use vouch_core::{ConfigError, WorkspacePreferences};

/// Errors from a settings store.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings rejected: {0}")]
    Invalid(#[from] ConfigError),

    #[error("Settings backend unavailable: {0}")]
    Unavailable(String),
}

/// Source of stored workspace preferences.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current preferences. Missing keys are defaulted.
    async fn fetch(&self) -> Result<WorkspacePreferences, SettingsError>;

    /// Validate and atomically replace the stored preferences.
    async fn update(&self, value: serde_json::Value) -> Result<WorkspacePreferences, SettingsError>;
}

/// Process-local settings store.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    preferences: RwLock<WorkspacePreferences>,
}

impl InMemorySettingsStore {
    pub fn new(preferences: WorkspacePreferences) -> Self {
        Self {
            preferences: RwLock::new(preferences),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn fetch(&self) -> Result<WorkspacePreferences, SettingsError> {
        Ok(self.preferences.read().clone())
    }

    async fn update(&self, value: serde_json::Value) -> Result<WorkspacePreferences, SettingsError> {
        let preferences = WorkspacePreferences::from_value(value)?;
        *self.preferences.write() = preferences.clone();
        tracing::info!("Workspace preferences updated");
        Ok(preferences)
    }
}

/// Fetch preferences, or defaults if the store fails.
///
/// A broken store must not take a stage down, so the failure is logged and
/// resolution continues without the workspace layer.
pub(crate) async fn fetch_or_default(store: &dyn SettingsStore, stage: &str) -> WorkspacePreferences {
    match store.fetch().await {
        Ok(preferences) => preferences,
        Err(e) => {
            tracing::warn!(
                stage = stage,
                error = %e,
                "Failed to fetch workspace preferences, using defaults"
            );
            WorkspacePreferences::default()
        }
    }
}
