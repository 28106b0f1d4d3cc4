//! The backend facade.
//!
//! `SearchBackend` ties the pieces together: it lazily provisions the
//! engine container and schema, compiles and runs searches, and writes,
//! removes, and clears documents. All engine I/O goes through the
//! injected `SearchTransport`.
//!
//! Failure policy: transport failures and malformed responses degrade to
//! empty results (or no-ops for writes) when `silently_fail` is set, with
//! the error logged. Schema conflicts and invalid request specs are
//! programming errors and always propagate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{json, Value};
use tracing::{debug, error, info};

use bridge_query::{compile, materialize, MaterializeOptions};
use bridge_schema::{build_mapping, check_analyzers, SchemaRegistry};
use bridge_types::{
    EntityResolver, EntityType, Identifier, ResultPage, SearchConfig, SearchRequest,
    ENTITY_TYPE_FIELD,
};

use crate::document::PreparedDocument;
use crate::error::{BackendError, TransportError};
use crate::transport::SearchTransport;

/// Engine-backed search facade over a schema registry.
pub struct SearchBackend<T: SearchTransport> {
    transport: T,
    config: SearchConfig,
    registry: Arc<SchemaRegistry>,
    resolver: Arc<dyn EntityResolver>,
    setup_complete: AtomicBool,
    published_mapping: RwLock<Option<Value>>,
}

impl<T: SearchTransport> SearchBackend<T> {
    pub fn new(
        transport: T,
        config: SearchConfig,
        registry: Arc<SchemaRegistry>,
        resolver: Arc<dyn EntityResolver>,
    ) -> Self {
        Self {
            transport,
            config,
            registry,
            resolver,
            setup_complete: AtomicBool::new(false),
            published_mapping: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Provision the engine container and publish the unified schema.
    ///
    /// Runs the global analyzer consistency check first; a conflict there
    /// aborts before anything reaches the engine. The schema is only
    /// pushed when it differs from what the engine already holds.
    pub async fn setup(&self) -> Result<(), BackendError> {
        check_analyzers(&self.registry.sources())?;

        let snapshot = self.registry.snapshot()?;
        let mapping = build_mapping(&snapshot, &self.config.default_analyzer);

        let known = {
            let published = self
                .published_mapping
                .read()
                .unwrap_or_else(|e| e.into_inner());
            published.clone()
        };
        let current = match known {
            Some(mapping) => Some(mapping),
            // A missing or unreadable remote schema just means we publish
            None => self.transport.get_schema(&self.config.index_name).await.ok(),
        };

        if current.as_ref() != Some(&mapping) {
            self.transport
                .create_container(&self.config.index_name, &self.config.container_settings)
                .await?;
            self.transport
                .publish_schema(&self.config.index_name, &mapping)
                .await?;
            info!(index = %self.config.index_name, "Published search schema");

            let mut published = self
                .published_mapping
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *published = Some(mapping);
        }

        self.setup_complete.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn ensure_setup(&self) -> Result<(), BackendError> {
        if !self.setup_complete.load(Ordering::SeqCst) {
            self.setup().await?;
        }
        Ok(())
    }

    /// Run a search. An empty query matches nothing and never touches
    /// the engine.
    pub async fn search(&self, request: &SearchRequest) -> Result<ResultPage, BackendError> {
        if request.query.is_empty() {
            return Ok(ResultPage::empty());
        }

        match self.search_inner(request).await {
            Ok(page) => Ok(page),
            Err(err) if err.is_degradable() && self.config.silently_fail => {
                error!(error = %err, "Search failed; returning empty results");
                Ok(ResultPage::empty())
            }
            Err(err) => Err(err),
        }
    }

    async fn search_inner(&self, request: &SearchRequest) -> Result<ResultPage, BackendError> {
        self.ensure_setup().await?;

        let snapshot = self.registry.snapshot()?;
        let compiled = compile(&snapshot, &self.config, request)?;

        let raw = self
            .transport
            .execute_search(&self.config.index_name, &compiled.doc_types, &compiled.body)
            .await?;

        let page = materialize(
            &snapshot,
            self.resolver.as_ref(),
            &raw,
            MaterializeOptions {
                geo_sort: compiled.geo_sort,
            },
        )?;
        debug!(total = page.total_hits, returned = page.results.len(), "Search completed");
        Ok(page)
    }

    /// Find documents similar to one stored document, seeded by its
    /// content field. `end_offset` strictly greater than `start_offset`
    /// becomes the result-window size; otherwise the engine default
    /// applies.
    pub async fn more_like_this(
        &self,
        identifier: &Identifier,
        start_offset: u64,
        end_offset: Option<u64>,
    ) -> Result<ResultPage, BackendError> {
        match self
            .more_like_this_inner(identifier, start_offset, end_offset)
            .await
        {
            Ok(page) => Ok(page),
            Err(err) if err.is_degradable() && self.config.silently_fail => {
                error!(error = %err, document = %identifier, "More-like-this failed; returning empty results");
                Ok(ResultPage::empty())
            }
            Err(err) => Err(err),
        }
    }

    async fn more_like_this_inner(
        &self,
        identifier: &Identifier,
        start_offset: u64,
        end_offset: Option<u64>,
    ) -> Result<ResultPage, BackendError> {
        self.ensure_setup().await?;

        let snapshot = self.registry.snapshot()?;
        let schema = snapshot.index(&identifier.entity_type)?;
        let field = schema
            .content_field()
            .map(|f| f.index_fieldname.clone())
            .unwrap_or_else(|| self.config.document_field.clone());

        let window = end_offset
            .filter(|end| *end > start_offset)
            .map(|end| (start_offset, end - start_offset));
        let raw = self
            .transport
            .execute_more_like_this(
                &self.config.index_name,
                &identifier.to_string(),
                &field,
                window,
            )
            .await?;

        Ok(materialize(
            &snapshot,
            self.resolver.as_ref(),
            &raw,
            MaterializeOptions::default(),
        )?)
    }

    /// Index a batch of prepared documents. With `commit`, pending writes
    /// become searchable before returning.
    pub async fn update(
        &self,
        documents: &[PreparedDocument],
        commit: bool,
    ) -> Result<(), BackendError> {
        if documents.is_empty() {
            return Ok(());
        }

        match self.update_inner(documents, commit).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_degradable() && self.config.silently_fail => {
                error!(error = %err, count = documents.len(), "Bulk index failed; documents not written");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn update_inner(
        &self,
        documents: &[PreparedDocument],
        commit: bool,
    ) -> Result<(), BackendError> {
        self.ensure_setup().await?;

        let batch: Vec<(String, Value)> =
            documents.iter().map(PreparedDocument::to_engine).collect();
        self.transport
            .bulk_index(&self.config.index_name, &batch)
            .await?;
        debug!(count = batch.len(), "Indexed document batch");

        if commit {
            self.transport.refresh(&self.config.index_name).await?;
        }
        Ok(())
    }

    /// Remove one document by identifier.
    pub async fn remove(&self, identifier: &Identifier, commit: bool) -> Result<(), BackendError> {
        match self.remove_inner(identifier, commit).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_degradable() && self.config.silently_fail => {
                error!(error = %err, document = %identifier, "Remove failed; document not deleted");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn remove_inner(
        &self,
        identifier: &Identifier,
        commit: bool,
    ) -> Result<(), BackendError> {
        self.ensure_setup().await?;

        match self
            .transport
            .delete_document(&self.config.index_name, &identifier.to_string())
            .await
        {
            Ok(()) => {}
            // Deleting a document that is already gone is not a failure
            Err(TransportError::NotFound(_)) => {
                debug!(document = %identifier, "Document already absent");
            }
            Err(err) => return Err(err.into()),
        }
        if commit {
            self.transport.refresh(&self.config.index_name).await?;
        }
        Ok(())
    }

    /// Clear indexed data.
    ///
    /// With no entity types the whole container is deleted and the
    /// provisioning state forgotten, so the next operation re-creates it.
    /// With entity types only their documents are deleted.
    pub async fn clear(&self, models: &[EntityType], commit: bool) -> Result<(), BackendError> {
        match self.clear_inner(models, commit).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_degradable() && self.config.silently_fail => {
                error!(error = %err, "Clear failed; index unchanged");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn clear_inner(&self, models: &[EntityType], commit: bool) -> Result<(), BackendError> {
        if models.is_empty() {
            self.transport
                .delete_container(&self.config.index_name)
                .await?;
            info!(index = %self.config.index_name, "Deleted search container");

            self.setup_complete.store(false, Ordering::SeqCst);
            let mut published = self
                .published_mapping
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *published = None;
            return Ok(());
        }

        let labels: Vec<String> = models.iter().map(EntityType::label).collect();
        let query = json!({
            "query_string": {
                "query": format!("{}:({})", ENTITY_TYPE_FIELD, labels.join(" OR ")),
            }
        });
        self.transport
            .delete_by_query(&self.config.index_name, &labels, &query)
            .await?;
        info!(models = ?labels, "Cleared indexed documents");

        if commit {
            self.transport.refresh(&self.config.index_name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_schema::IndexDefinition;
    use bridge_types::{FieldDescriptor, FieldValue, ValueKind};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct Definition {
        entity: EntityType,
        qualified: String,
        fields: Vec<FieldDescriptor>,
    }

    impl IndexDefinition for Definition {
        fn entity_type(&self) -> EntityType {
            self.entity.clone()
        }
        fn name(&self) -> &str {
            &self.qualified
        }
        fn fields(&self) -> Vec<FieldDescriptor> {
            self.fields.clone()
        }
    }

    struct AllowAll;

    impl EntityResolver for AllowAll {
        fn resolve(&self, app_label: &str, name: &str) -> Option<EntityType> {
            Some(EntityType::new(app_label, name))
        }
    }

    /// Records every call and replays canned responses.
    struct MockTransport {
        calls: Mutex<Vec<String>>,
        search_response: Value,
        fail_searches: bool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                search_response: json!({ "hits": { "total": 0, "hits": [] } }),
                fail_searches: false,
            }
        }

        fn with_search_response(mut self, response: Value) -> Self {
            self.search_response = response;
            self
        }

        fn failing_searches(mut self) -> Self {
            self.fail_searches = true;
            self
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl SearchTransport for MockTransport {
        async fn execute_search(
            &self,
            _index: &str,
            doc_types: &[String],
            _body: &Value,
        ) -> Result<Value, crate::error::TransportError> {
            self.record(format!("search:{}", doc_types.join(",")));
            if self.fail_searches {
                return Err(crate::error::TransportError::Connection(
                    "connection refused".into(),
                ));
            }
            Ok(self.search_response.clone())
        }

        async fn execute_more_like_this(
            &self,
            _index: &str,
            document_id: &str,
            field: &str,
            window: Option<(u64, u64)>,
        ) -> Result<Value, crate::error::TransportError> {
            self.record(format!("mlt:{}:{}:{:?}", document_id, field, window));
            Ok(self.search_response.clone())
        }

        async fn get_schema(&self, _index: &str) -> Result<Value, crate::error::TransportError> {
            self.record("get_schema");
            Err(crate::error::TransportError::NotFound("no schema".into()))
        }

        async fn create_container(
            &self,
            _index: &str,
            _settings: &Value,
        ) -> Result<(), crate::error::TransportError> {
            self.record("create_container");
            Ok(())
        }

        async fn publish_schema(
            &self,
            _index: &str,
            _mapping: &Value,
        ) -> Result<(), crate::error::TransportError> {
            self.record("publish_schema");
            Ok(())
        }

        async fn delete_container(&self, _index: &str) -> Result<(), crate::error::TransportError> {
            self.record("delete_container");
            Ok(())
        }

        async fn delete_by_query(
            &self,
            _index: &str,
            doc_types: &[String],
            query: &Value,
        ) -> Result<(), crate::error::TransportError> {
            self.record(format!(
                "delete_by_query:{}:{}",
                doc_types.join(","),
                query["query_string"]["query"].as_str().unwrap_or("")
            ));
            Ok(())
        }

        async fn delete_document(
            &self,
            _index: &str,
            document_id: &str,
        ) -> Result<(), crate::error::TransportError> {
            self.record(format!("delete_document:{}", document_id));
            Ok(())
        }

        async fn bulk_index(
            &self,
            _index: &str,
            documents: &[(String, Value)],
        ) -> Result<(), crate::error::TransportError> {
            let ids: Vec<&str> = documents.iter().map(|(id, _)| id.as_str()).collect();
            self.record(format!("bulk_index:{}", ids.join(",")));
            Ok(())
        }

        async fn refresh(&self, _index: &str) -> Result<(), crate::error::TransportError> {
            self.record("refresh");
            Ok(())
        }
    }

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new("text");
        registry.register(Arc::new(Definition {
            entity: EntityType::new("blog", "Article"),
            qualified: "blog.ArticleIndex".into(),
            fields: vec![
                FieldDescriptor::new("text", ValueKind::Text).document(),
                FieldDescriptor::new("views", ValueKind::Integer),
            ],
        }));
        Arc::new(registry)
    }

    fn backend(transport: MockTransport) -> SearchBackend<MockTransport> {
        SearchBackend::new(
            transport,
            SearchConfig::default(),
            registry(),
            Arc::new(AllowAll),
        )
    }

    #[tokio::test]
    async fn test_empty_query_never_touches_engine() {
        let backend = backend(MockTransport::new());
        let page = backend.search(&SearchRequest::new("")).await.unwrap();

        assert_eq!(page.total_hits, 0);
        assert!(backend.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_setup_runs_once_across_searches() {
        let backend = backend(MockTransport::new());
        backend.search(&SearchRequest::new("rust")).await.unwrap();
        backend.search(&SearchRequest::new("tokio")).await.unwrap();

        let calls = backend.transport.calls();
        assert_eq!(
            calls,
            vec![
                "get_schema",
                "create_container",
                "publish_schema",
                "search:blog.Article",
                "search:blog.Article",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_materializes_hits() {
        let response = json!({
            "hits": {
                "total": 1,
                "hits": [{
                    "_score": 2.0,
                    "_source": {
                        "entity_type": "blog.Article",
                        "entity_id": "7",
                        "text": "an article",
                        "views": 3,
                    }
                }]
            }
        });
        let backend = backend(MockTransport::new().with_search_response(response));

        let page = backend.search(&SearchRequest::new("article")).await.unwrap();
        assert_eq!(page.total_hits, 1);
        assert_eq!(page.results[0].pk, "7");
        assert_eq!(page.results[0].fields["views"], FieldValue::Integer(3));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_when_silent() {
        let backend = backend(MockTransport::new().failing_searches());
        let page = backend.search(&SearchRequest::new("rust")).await.unwrap();
        assert_eq!(page.total_hits, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_when_loud() {
        let mut config = SearchConfig::default();
        config.silently_fail = false;
        let backend = SearchBackend::new(
            MockTransport::new().failing_searches(),
            config,
            registry(),
            Arc::new(AllowAll),
        );

        let err = backend.search(&SearchRequest::new("rust")).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_update_bulk_indexes_and_commits() {
        let backend = backend(MockTransport::new());

        let mut fields = HashMap::new();
        fields.insert("text".to_string(), FieldValue::Text("an article".into()));
        let doc = PreparedDocument::new(
            Identifier::new(EntityType::new("blog", "Article"), "7"),
            fields,
        );

        backend.update(&[doc], true).await.unwrap();

        let calls = backend.transport.calls();
        assert!(calls.contains(&"bulk_index:blog.Article.7".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("refresh"));
    }

    #[tokio::test]
    async fn test_update_without_commit_skips_refresh() {
        let backend = backend(MockTransport::new());

        let doc = PreparedDocument::new(
            Identifier::new(EntityType::new("blog", "Article"), "7"),
            HashMap::new(),
        );
        backend.update(&[doc], false).await.unwrap();

        assert!(!backend.transport.calls().contains(&"refresh".to_string()));
    }

    #[tokio::test]
    async fn test_remove_deletes_by_identifier() {
        let backend = backend(MockTransport::new());
        let id = Identifier::new(EntityType::new("blog", "Article"), "7");

        backend.remove(&id, true).await.unwrap();
        assert!(backend
            .transport
            .calls()
            .contains(&"delete_document:blog.Article.7".to_string()));
    }

    #[tokio::test]
    async fn test_clear_everything_deletes_container_and_resets() {
        let backend = backend(MockTransport::new());
        backend.search(&SearchRequest::new("rust")).await.unwrap();

        backend.clear(&[], false).await.unwrap();
        backend.search(&SearchRequest::new("rust")).await.unwrap();

        let calls = backend.transport.calls();
        // Provisioning ran again after the container was deleted
        assert_eq!(
            calls.iter().filter(|c| *c == "publish_schema").count(),
            2
        );
        assert!(calls.contains(&"delete_container".to_string()));
    }

    #[tokio::test]
    async fn test_clear_scoped_deletes_by_query() {
        let backend = backend(MockTransport::new());
        backend
            .clear(
                &[
                    EntityType::new("blog", "Article"),
                    EntityType::new("blog", "Comment"),
                ],
                false,
            )
            .await
            .unwrap();

        let calls = backend.transport.calls();
        assert!(calls.contains(
            &"delete_by_query:blog.Article,blog.Comment:entity_type:(blog.Article OR blog.Comment)"
                .to_string()
        ));
        // Scoped clears never touch the provisioning state
        assert!(!calls.contains(&"delete_container".to_string()));
    }

    #[tokio::test]
    async fn test_more_like_this_uses_content_field() {
        let backend = backend(MockTransport::new());
        let id = Identifier::new(EntityType::new("blog", "Article"), "7");

        backend.more_like_this(&id, 0, None).await.unwrap();
        assert!(backend
            .transport
            .calls()
            .contains(&"mlt:blog.Article.7:text:None".to_string()));
    }

    #[tokio::test]
    async fn test_more_like_this_window() {
        let backend = backend(MockTransport::new());
        let id = Identifier::new(EntityType::new("blog", "Article"), "7");

        backend.more_like_this(&id, 10, Some(25)).await.unwrap();
        assert!(backend
            .transport
            .calls()
            .contains(&"mlt:blog.Article.7:text:Some((10, 15))".to_string()));
    }

    #[tokio::test]
    async fn test_more_like_this_unregistered_entity_fails() {
        let mut config = SearchConfig::default();
        config.silently_fail = false;
        let backend = SearchBackend::new(
            MockTransport::new(),
            config,
            registry(),
            Arc::new(AllowAll),
        );
        let id = Identifier::new(EntityType::new("shop", "Product"), "1");

        let err = backend.more_like_this(&id, 0, None).await.unwrap_err();
        assert!(matches!(err, BackendError::Schema(_)));
    }
}
