//! Loader module for the knowledge sync pipeline.
//!
//! Applies a routed [`SyncAction`] to the document index.

use std::sync::Arc;
use std::time::Duration;

use knowledge_sync_repository::{
    DocumentIndexProvider, RemoveDocumentRequest, UpsertDocumentRequest,
};
use knowledge_sync_shared::DocumentEvent;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::errors::IngestError;
use crate::processor::SyncAction;

/// Default bound on a single index call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Loader that applies index and remove operations.
///
/// Each call is made synchronously within the per-message path and bounded by
/// `call_timeout`. Nothing is buffered: a call that returns `Ok` has reached the index.
pub struct DocumentLoader {
    provider: Arc<dyn DocumentIndexProvider>,
    call_timeout: Duration,
}

impl DocumentLoader {
    /// Create a new loader with the default call timeout.
    pub fn new(provider: Arc<dyn DocumentIndexProvider>) -> Self {
        Self::with_timeout(provider, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(provider: Arc<dyn DocumentIndexProvider>, call_timeout: Duration) -> Self {
        Self {
            provider,
            call_timeout,
        }
    }

    /// Apply `action` for `event`.
    ///
    /// [`SyncAction::Skip`] never touches the provider.
    #[instrument(skip(self, event), fields(document_id = %event.id, kind = %event.kind))]
    pub async fn execute(
        &self,
        action: SyncAction,
        event: &DocumentEvent,
    ) -> Result<(), IngestError> {
        let call = async {
            match action {
                SyncAction::Index => {
                    let request = UpsertDocumentRequest {
                        document_id: event.id.clone(),
                        title: event.title.clone(),
                        url: event.url.clone(),
                        metadata: event.metadata.clone(),
                    };
                    self.provider.upsert_document(&request).await
                }
                SyncAction::Remove => {
                    let request = RemoveDocumentRequest {
                        document_id: event.id.clone(),
                    };
                    self.provider.remove_document(&request).await
                }
                SyncAction::Skip => Ok(()),
            }
        };

        match timeout(self.call_timeout, call).await {
            Ok(Ok(())) => {
                debug!(action = %action, "Index call succeeded");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(action = %action, error = %e, "Index call failed");
                Err(e.into())
            }
            Err(_) => {
                error!(
                    action = %action,
                    timeout_secs = self.call_timeout.as_secs(),
                    "Index call timed out"
                );
                Err(IngestError::timeout(format!(
                    "{} of {} exceeded {}s",
                    action,
                    event.id,
                    self.call_timeout.as_secs()
                )))
            }
        }
    }

    /// Check that the index is reachable and exists.
    pub async fn check_ready(&self) -> Result<(), IngestError> {
        timeout(self.call_timeout, self.provider.ensure_index_exists())
            .await
            .map_err(|_| IngestError::timeout("index readiness check timed out"))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use knowledge_sync_repository::IndexProviderError;
    use knowledge_sync_shared::EventKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Mock index provider for testing.
    struct MockIndexProvider {
        upserted_count: AtomicUsize,
        removed_count: AtomicUsize,
        fail: AtomicBool,
        stall: AtomicBool,
    }

    impl MockIndexProvider {
        fn new() -> Self {
            Self {
                upserted_count: AtomicUsize::new(0),
                removed_count: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                stall: AtomicBool::new(false),
            }
        }

        async fn outcome(&self) -> Result<(), IndexProviderError> {
            if self.stall.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(IndexProviderError::connection("index unavailable"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentIndexProvider for MockIndexProvider {
        async fn ensure_index_exists(&self) -> Result<(), IndexProviderError> {
            Ok(())
        }

        async fn upsert_document(
            &self,
            _request: &UpsertDocumentRequest,
        ) -> Result<(), IndexProviderError> {
            self.upserted_count.fetch_add(1, Ordering::SeqCst);
            self.outcome().await
        }

        async fn remove_document(
            &self,
            _request: &RemoveDocumentRequest,
        ) -> Result<(), IndexProviderError> {
            self.removed_count.fetch_add(1, Ordering::SeqCst);
            self.outcome().await
        }
    }

    fn event() -> DocumentEvent {
        DocumentEvent::new(
            "doc-1",
            EventKind::Created,
            "Title",
            "https://kb.example.com/doc-1",
            1,
            "2026-01-01T00:00:00Z",
        )
    }

    #[tokio::test]
    async fn test_actions_reach_provider() {
        let provider = Arc::new(MockIndexProvider::new());
        let loader = DocumentLoader::new(provider.clone());

        loader.execute(SyncAction::Index, &event()).await.unwrap();
        loader.execute(SyncAction::Remove, &event()).await.unwrap();
        loader.execute(SyncAction::Skip, &event()).await.unwrap();

        assert_eq!(provider.upserted_count.load(Ordering::SeqCst), 1);
        assert_eq!(provider.removed_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_loader_error() {
        let provider = Arc::new(MockIndexProvider::new());
        provider.fail.store(true, Ordering::SeqCst);
        let loader = DocumentLoader::new(provider.clone());

        let result = loader.execute(SyncAction::Index, &event()).await;
        assert!(matches!(result, Err(IngestError::LoaderError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_times_out() {
        let provider = Arc::new(MockIndexProvider::new());
        provider.stall.store(true, Ordering::SeqCst);
        let loader = DocumentLoader::with_timeout(provider.clone(), Duration::from_secs(30));

        let result = loader.execute(SyncAction::Remove, &event()).await;
        assert!(matches!(result, Err(IngestError::Timeout(_))));
    }
}
