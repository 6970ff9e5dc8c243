//! Qdrant vector index over its REST API

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::VectorIndexConfig;
use crate::error::{Error, Result};
use crate::types::VectorRecord;

use super::vector_index::{ScopeField, VectorIndex};

/// Qdrant-backed vector index.
///
/// Uses the plain HTTP API so the only moving part is a reqwest client.
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

impl QdrantIndex {
    /// Build a client from configuration.
    ///
    /// The API key is read from the configured environment variable and is
    /// optional; unsecured local instances need none.
    pub fn new(config: &VectorIndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut req = self.client.request(method, url);
        if let Some(api_key) = self.api_key.as_deref() {
            if !api_key.is_empty() {
                req = req.header("api-key", api_key);
            }
        }
        req
    }

    async fn ensure_success(&self, response: reqwest::Response, context: &str) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::IndexWrite(format!(
            "{} failed ({}): {}",
            context, status, body
        )))
    }

    async fn collection_exists(&self) -> Result<bool> {
        let response = self
            .request(Method::GET, &format!("collections/{}", self.collection))
            .send()
            .await
            .map_err(|e| Error::IndexWrite(format!("qdrant request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::IndexWrite(format!(
                    "collection check failed ({}): {}",
                    status, body
                )))
            }
        }
    }

    async fn count_with_filter(&self, filter: Option<Value>) -> Result<usize> {
        let mut body = json!({ "exact": true });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/count", self.collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::IndexWrite(format!("qdrant count failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::IndexWrite(format!(
                "count failed ({}): {}",
                status, body
            )));
        }

        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| Error::IndexWrite(format!("failed to parse count response: {}", e)))?;
        Ok(parsed.result.count)
    }
}

fn scope_filter(field: ScopeField, value: &str) -> Value {
    json!({
        "must": [
            { "key": field.as_str(), "match": { "value": value } }
        ]
    })
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn bulk_insert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<Value> = records
            .iter()
            .map(|record| {
                json!({
                    "id": record.id,
                    "vector": record.embedding,
                    "payload": record.payload(),
                })
            })
            .collect();

        let count = points.len();
        let response = self
            .request(
                Method::PUT,
                &format!("collections/{}/points", self.collection),
            )
            .query(&[("wait", true)])
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| Error::IndexWrite(format!("qdrant upsert failed: {}", e)))?;

        self.ensure_success(response, "point upsert").await?;
        tracing::debug!(collection = %self.collection, points = count, "points upserted");
        Ok(())
    }

    async fn delete_by(&self, field: ScopeField, value: &str) -> Result<usize> {
        // The delete API doesn't report how many points matched, so count first
        let matched = self.count_by(field, value).await?;
        if matched == 0 {
            return Ok(0);
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/delete", self.collection),
            )
            .query(&[("wait", true)])
            .json(&json!({ "filter": scope_filter(field, value) }))
            .send()
            .await
            .map_err(|e| Error::IndexWrite(format!("qdrant delete failed: {}", e)))?;

        self.ensure_success(response, "point delete").await?;
        tracing::debug!(collection = %self.collection, field = %field, value, matched, "points deleted");
        Ok(matched)
    }

    async fn count_by(&self, field: ScopeField, value: &str) -> Result<usize> {
        self.count_with_filter(Some(scope_filter(field, value)))
            .await
    }

    async fn ensure_index(&self, dimensions: usize, fields: &[ScopeField]) -> Result<()> {
        if self.collection_exists().await? {
            tracing::info!(collection = %self.collection, "collection already exists");
        } else {
            let body = json!({
                "vectors": {
                    "size": dimensions,
                    "distance": "Cosine"
                }
            });

            let response = self
                .request(Method::PUT, &format!("collections/{}", self.collection))
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::IndexWrite(format!("qdrant create failed: {}", e)))?;

            // A concurrent creator can still win the race
            if response.status() == StatusCode::CONFLICT {
                tracing::info!(collection = %self.collection, "collection already exists");
            } else {
                self.ensure_success(response, "collection create").await?;
                tracing::info!(collection = %self.collection, dimensions, "collection created");
            }
        }

        for field in fields {
            let body = json!({
                "field_name": field.as_str(),
                "field_schema": "keyword",
            });

            let response = self
                .request(
                    Method::PUT,
                    &format!("collections/{}/index", self.collection),
                )
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::IndexWrite(format!("qdrant index failed: {}", e)))?;

            if response.status().is_success() {
                tracing::debug!(collection = %self.collection, field = %field, "payload index ensured");
            } else if response.status() == StatusCode::CONFLICT {
                tracing::info!(collection = %self.collection, field = %field, "payload index already exists");
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    collection = %self.collection,
                    field = %field,
                    %status,
                    body,
                    "failed to ensure payload index"
                );
            }
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        self.count_with_filter(None).await
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .request(Method::GET, "collections")
            .send()
            .await
            .map_err(|e| Error::IndexWrite(format!("qdrant health check failed: {}", e)))?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkLocation, SourceFile};
    use httpmock::{Method::GET, Method::POST, Method::PUT, MockServer};

    fn index_for(server: &MockServer) -> QdrantIndex {
        QdrantIndex {
            client: reqwest::Client::new(),
            base_url: server.base_url(),
            collection: "session_chunks".to_string(),
            api_key: None,
        }
    }

    fn record() -> VectorRecord {
        let source = SourceFile::new("f1", "s1", "data.csv", None).unwrap();
        let chunk = Chunk::new(&source, "a | b".to_string(), ChunkLocation::Whole, 0);
        VectorRecord::from_chunk(&chunk, vec![0.1, 0.2, 0.3])
    }

    #[tokio::test]
    async fn bulk_insert_upserts_with_wait() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/session_chunks/points")
                    .query_param("wait", "true");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "result": { "operation_id": 0, "status": "completed" }
                }));
            })
            .await;

        let index = index_for(&server);
        index.bulk_insert(&[record(), record()]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bulk_insert_surfaces_backend_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/session_chunks/points");
                then.status(500).body("disk full");
            })
            .await;

        let index = index_for(&server);
        let err = index.bulk_insert(&[record()]).await.unwrap_err();
        assert!(matches!(err, Error::IndexWrite(_)), "got {:?}", err);
        assert!(err.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn delete_by_counts_then_filters() {
        let server = MockServer::start_async().await;
        let count_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/session_chunks/points/count")
                    .json_body(json!({
                        "exact": true,
                        "filter": {
                            "must": [
                                { "key": "file_id", "match": { "value": "f1" } }
                            ]
                        }
                    }));
                then.status(200)
                    .json_body(json!({ "result": { "count": 7 } }));
            })
            .await;
        let delete_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/session_chunks/points/delete")
                    .query_param("wait", "true")
                    .json_body(json!({
                        "filter": {
                            "must": [
                                { "key": "file_id", "match": { "value": "f1" } }
                            ]
                        }
                    }));
                then.status(200).json_body(json!({
                    "status": "ok",
                    "result": { "operation_id": 1, "status": "completed" }
                }));
            })
            .await;

        let index = index_for(&server);
        let removed = index.delete_by(ScopeField::FileId, "f1").await.unwrap();

        assert_eq!(removed, 7);
        count_mock.assert_async().await;
        delete_mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_by_skips_the_delete_when_nothing_matches() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/session_chunks/points/count");
                then.status(200)
                    .json_body(json!({ "result": { "count": 0 } }));
            })
            .await;
        let delete_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/session_chunks/points/delete");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;

        let index = index_for(&server);
        let removed = index
            .delete_by(ScopeField::SessionId, "missing")
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert_eq!(delete_mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn ensure_index_creates_collection_and_payload_indexes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/session_chunks");
                then.status(404);
            })
            .await;
        let create_mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/session_chunks")
                    .json_body(json!({
                        "vectors": { "size": 3, "distance": "Cosine" }
                    }));
                then.status(200).json_body(json!({ "result": true }));
            })
            .await;
        let index_mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/session_chunks/index");
                then.status(200).json_body(json!({ "result": true }));
            })
            .await;

        let index = index_for(&server);
        index
            .ensure_index(3, &[ScopeField::FileId, ScopeField::SessionId])
            .await
            .unwrap();

        create_mock.assert_async().await;
        assert_eq!(index_mock.hits_async().await, 2);
    }

    #[tokio::test]
    async fn ensure_index_tolerates_existing_collection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/session_chunks");
                then.status(200).json_body(json!({ "result": {} }));
            })
            .await;
        let create_mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/session_chunks");
                then.status(200);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/session_chunks/index");
                then.status(409).body("already exists");
            })
            .await;

        let index = index_for(&server);
        index.ensure_index(3, &[ScopeField::FileId]).await.unwrap();

        assert_eq!(create_mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn len_counts_without_filter() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/session_chunks/points/count")
                    .json_body(json!({ "exact": true }));
                then.status(200)
                    .json_body(json!({ "result": { "count": 42 } }));
            })
            .await;

        let index = index_for(&server);
        assert_eq!(index.len().await.unwrap(), 42);
    }
}
