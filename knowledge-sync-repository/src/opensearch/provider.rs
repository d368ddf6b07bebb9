//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `DocumentIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use chrono::Utc;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutAliasParts},
    DeleteParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::IndexProviderError;
use crate::interfaces::DocumentIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::{RemoveDocumentRequest, UpsertDocumentRequest};
use crate::utils;

/// OpenSearch provider implementation.
///
/// All document operations go through the configured alias, which points at a single
/// versioned index.
///
/// # Example
///
/// ```ignore
/// use knowledge_sync_repository::opensearch::IndexConfig;
/// use knowledge_sync_repository::UpsertDocumentRequest;
/// let config = IndexConfig::new("documents", 0);
/// let provider = OpenSearchProvider::new("http://localhost:9200", config).await?;
///
/// let request = UpsertDocumentRequest {
///     document_id: "doc-1".to_string(),
///     title: "Onboarding guide".to_string(),
///     url: "https://docs.example.com/onboarding".to_string(),
///     metadata: serde_json::Map::new(),
/// };
/// provider.upsert_document(&request).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing alias and version
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(IndexProviderError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, IndexProviderError> {
        let parsed_url =
            Url::parse(url).map_err(|e| IndexProviderError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| IndexProviderError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Build the stored document body for an upsert request.
    fn build_document(document_id: &str, request: &UpsertDocumentRequest) -> Value {
        json!({
            "document_id": document_id,
            "title": request.title,
            "url": request.url,
            "metadata": request.metadata,
            "indexed_at": Utc::now().to_rfc3339(),
        })
    }

    /// Create the versioned index and point the alias at it.
    async fn create_index(&self, index_name: &str) -> Result<(), IndexProviderError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index_name))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| IndexProviderError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(IndexProviderError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        let response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(
                &[index_name],
                &self.index_config.alias,
            ))
            .send()
            .await
            .map_err(|e| IndexProviderError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Alias creation failed");
            return Err(IndexProviderError::index_creation(format!(
                "Put alias failed with status {}: {}",
                status, error_body
            )));
        }

        info!(
            index = %index_name,
            alias = %self.index_config.alias,
            "Created index and alias"
        );
        Ok(())
    }
}

#[async_trait]
impl DocumentIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), IndexProviderError> {
        let index_name = self.index_config.versioned_index_name();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index_name.as_str()]))
            .send()
            .await
            .map_err(|e| IndexProviderError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => {
                debug!(index = %index_name, "Index already exists");
                Ok(())
            }
            404 => self.create_index(&index_name).await,
            status => Err(IndexProviderError::connection(format!(
                "Unexpected status {} checking index {}",
                status, index_name
            ))),
        }
    }

    /// Index a document, overwriting any previous version.
    ///
    /// Uses the index API rather than a partial update so that a re-index always reflects
    /// the latest event in full.
    async fn upsert_document(
        &self,
        request: &UpsertDocumentRequest,
    ) -> Result<(), IndexProviderError> {
        let doc_id = utils::validate_document_id(&request.document_id)?;
        let body = Self::build_document(doc_id, request);

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.alias, doc_id))
            .body(body)
            .send()
            .await
            .map_err(|e| IndexProviderError::upsert(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(IndexProviderError::upsert(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    /// Remove a document from the index.
    ///
    /// A 404 from the backend means the document was never indexed (or already removed)
    /// and is reported as success.
    async fn remove_document(
        &self,
        request: &RemoveDocumentRequest,
    ) -> Result<(), IndexProviderError> {
        let doc_id = utils::validate_document_id(&request.document_id)?;

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.alias, doc_id))
            .send()
            .await
            .map_err(|e| IndexProviderError::remove(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(IndexProviderError::remove(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document removed");
        Ok(())
    }
}
