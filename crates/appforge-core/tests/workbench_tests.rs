use appforge_core::{
    AppRecord, AppStatus, AppStore, InMemoryAppStore, NewApp, StoreError, Workbench,
    WorkbenchError,
};
use appforge_artifact::CodeArtifact;
use appforge_generation::{
    CollaboratorError, GenerationConfig, GenerationError, GenerationRequest, Orchestrator,
};
use appforge_sandbox::{Delivery, LifecycleState, SandboxConfig, ViewMode};
use appforge_test_utils::{
    tip_calculator_with_import, valid_artifact, ScriptedGenerator, TIP_CALCULATOR,
};
use async_trait::async_trait;
use chrono::Utc;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn workbench_with(generator: ScriptedGenerator) -> (Workbench, Arc<InMemoryAppStore>) {
    let store = Arc::new(InMemoryAppStore::new());
    let config = GenerationConfig::default().with_retry_delay(Duration::ZERO);
    let orchestrator = Orchestrator::new(Arc::new(generator), config);
    let workbench = Workbench::new(orchestrator, store.clone(), &SandboxConfig::default()).unwrap();
    (workbench, store)
}

fn tip_request() -> GenerationRequest {
    GenerationRequest::new("a tip calculator", "Finance", 0.75)
}

fn listing() -> NewApp {
    NewApp {
        name: "Tip Calculator".to_string(),
        description: "Splits a bill".to_string(),
        category: "Finance".to_string(),
        price: 0.75,
        thumbnail: None,
    }
}

/// Store that hands back whatever code it was seeded with
struct SeededStore {
    record: AppRecord,
}

impl SeededStore {
    fn with_code(code: &str) -> Self {
        let now = Utc::now();
        Self {
            record: AppRecord {
                id: Uuid::new_v4(),
                name: "Legacy".to_string(),
                description: "saved before validation existed".to_string(),
                category: "Misc".to_string(),
                price: 1.0,
                code: code.to_string(),
                thumbnail: None,
                status: AppStatus::Draft,
                deployment_tx_id: None,
                created_at: now,
                updated_at: now,
            },
        }
    }
}

#[async_trait]
impl AppStore for SeededStore {
    async fn create(&self, _: NewApp, _: &CodeArtifact) -> Result<AppRecord, StoreError> {
        Err(StoreError::Backend("read-only".into()))
    }

    async fn get(&self, id: Uuid) -> Result<AppRecord, StoreError> {
        if id == self.record.id {
            Ok(self.record.clone())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    async fn list(&self) -> Result<Vec<AppRecord>, StoreError> {
        Ok(vec![self.record.clone()])
    }

    async fn set_status(
        &self,
        id: Uuid,
        _: AppStatus,
        _: Option<String>,
    ) -> Result<AppRecord, StoreError> {
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::NotFound(id))
    }
}

#[tokio::test]
async fn test_generation_mounts_valid_artifact() {
    let (workbench, _) = workbench_with(
        ScriptedGenerator::new()
            .then_text(tip_calculator_with_import())
            .then_text(TIP_CALCULATOR),
    );

    let outcome = workbench.request_generation(&tip_request()).await.unwrap();

    assert_eq!(outcome.attempt_count(), 2);
    let status = workbench.status();
    assert_eq!(status.state, LifecycleState::Mounted);
    assert_eq!(status.generation, Some(1));
    assert!(status.healthy);
    assert_eq!(workbench.source().as_deref(), Some(TIP_CALCULATOR.trim()));

    let iframe = workbench.iframe().unwrap().unwrap();
    assert!(iframe.contains("sandbox=\"allow-scripts\""));
    assert!(iframe.contains("data-testid=\"iframe-app-runtime\""));
}

#[tokio::test]
async fn test_failed_generation_leaves_host_empty() {
    let (workbench, _) =
        workbench_with(ScriptedGenerator::new().then_error(CollaboratorError::Unauthenticated));

    let err = workbench.request_generation(&tip_request()).await.unwrap_err();

    assert_eq!(err, WorkbenchError::Generation(GenerationError::Unauthenticated));
    assert_eq!(workbench.status().state, LifecycleState::Empty);
    assert!(workbench.document().unwrap().is_none());
    assert!(workbench.refresh().is_none());
}

#[tokio::test]
async fn test_error_then_refresh_recovers() {
    let (workbench, _) = workbench_with(ScriptedGenerator::new().then_text(TIP_CALCULATOR));
    workbench.request_generation(&tip_request()).await.unwrap();

    let error = r#"{"type":"ERROR","generation":1,"message":"boom"}"#;
    assert_eq!(workbench.deliver(error), Delivery::Applied(LifecycleState::Errored));
    assert!(!workbench.status().healthy);

    assert_eq!(workbench.refresh(), Some(2));
    assert_eq!(workbench.status().state, LifecycleState::Mounted);
    assert!(workbench.status().last_error.is_none());

    // the old frame keeps posting; it must not disturb the new session
    assert!(matches!(workbench.deliver(error), Delivery::Stale { .. }));
    assert_eq!(workbench.status().state, LifecycleState::Mounted);
}

#[tokio::test]
async fn test_save_then_open_saved_remounts() {
    let (workbench, store) = workbench_with(ScriptedGenerator::new().then_text(TIP_CALCULATOR));

    assert_eq!(
        workbench.save_draft(listing()).await.unwrap_err(),
        WorkbenchError::NothingMounted
    );

    workbench.request_generation(&tip_request()).await.unwrap();
    let saved = workbench.save_draft(listing()).await.unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(saved.code, TIP_CALCULATOR.trim());

    let (app, generation) = workbench.open_saved(saved.id).await.unwrap();
    assert_eq!(app.id, saved.id);
    assert_eq!(generation, 2);
    assert!(workbench.document().unwrap().unwrap().contains("<title>Tip Calculator</title>"));
}

#[tokio::test]
async fn test_open_saved_rejects_invalid_stored_code() {
    let store = Arc::new(SeededStore::with_code("import React from 'react';\nfunction App() {}"));
    let id = store.record.id;
    let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::new()), GenerationConfig::default());
    let workbench = Workbench::new(orchestrator, store, &SandboxConfig::default()).unwrap();

    let err = workbench.open_saved(id).await.unwrap_err();

    match err {
        WorkbenchError::InvalidStoredCode { id: reported, reason } => {
            assert_eq!(reported, id);
            assert!(reason.contains("import"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(workbench.status().state, LifecycleState::Empty);
}

#[tokio::test]
async fn test_open_missing_app() {
    let (workbench, _) = workbench_with(ScriptedGenerator::new());
    let id = Uuid::new_v4();
    assert_eq!(
        workbench.open_saved(id).await.unwrap_err(),
        WorkbenchError::Store(StoreError::NotFound(id))
    );
}

#[test]
fn test_toggle_source_view_keeps_session() {
    let (workbench, _) = workbench_with(ScriptedGenerator::new());
    let generation = workbench.mount(valid_artifact(), "Preview").unwrap();

    assert_eq!(workbench.toggle_source_view(), ViewMode::Source);
    assert_eq!(workbench.status().generation, Some(generation));
    assert_eq!(workbench.toggle_source_view(), ViewMode::Rendered);
    assert_eq!(workbench.status().state, LifecycleState::Mounted);
}
