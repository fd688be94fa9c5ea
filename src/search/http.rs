//! Elasticsearch/OpenSearch REST client

use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::search::engine::{EngineError, Hit, SearchEngine, SearchResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// `SearchEngine` over the engine's REST API
#[derive(Clone)]
pub struct HttpEngine {
    client: Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
}

#[derive(Debug, Deserialize)]
struct IndexedDocument {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateByQueryResponse {
    #[serde(default)]
    updated: u64,
}

impl HttpEngine {
    /// Create a new client from configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, EngineError> {
        let response = builder
            .send()
            .await
            .map_err(|e| EngineError::transport(format!("request to search engine failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(EngineError::from_response(status.as_u16(), &body))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> std::result::Result<T, EngineError> {
        response
            .json::<T>()
            .await
            .map_err(|e| EngineError::transport(format!("invalid search engine response: {}", e)))
    }
}

/// `{index}/{endpoint}/{id}` with the id percent-encoded
///
/// URL parsing collapses dot segments, so empty, `.` and `..` ids can never
/// address a document and are reported as missing without a request.
fn document_path(index: &str, endpoint: &str, id: &str) -> std::result::Result<String, EngineError> {
    if matches!(id, "" | "." | "..") {
        return Err(EngineError::new(
            Some(StatusCode::NOT_FOUND.as_u16()),
            None,
            format!("document id '{}' cannot be addressed", id),
        ));
    }
    Ok(format!("{}/{}/{}", index, endpoint, urlencoding::encode(id)))
}

#[async_trait]
impl SearchEngine for HttpEngine {
    async fn index_exists(&self, index: &str) -> std::result::Result<bool, EngineError> {
        let response = self
            .request(Method::HEAD, index)
            .send()
            .await
            .map_err(|e| EngineError::transport(format!("request to search engine failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(EngineError::from_response(status.as_u16(), "")),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> std::result::Result<(), EngineError> {
        self.send(self.request(Method::PUT, index).json(body)).await?;
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        document: &Value,
    ) -> std::result::Result<String, EngineError> {
        let response = self
            .send(
                self.request(Method::POST, &format!("{}/_doc", index))
                    .query(&[("refresh", "wait_for")])
                    .json(document),
            )
            .await?;
        let indexed: IndexedDocument = Self::json(response).await?;
        tracing::debug!(index = %index, todo_id = %indexed.id, "Indexed document");
        Ok(indexed.id)
    }

    async fn get_document(&self, index: &str, id: &str) -> std::result::Result<Hit, EngineError> {
        let response = self
            .send(self.request(Method::GET, &document_path(index, "_doc", id)?))
            .await?;
        Self::json(response).await
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> std::result::Result<(), EngineError> {
        self.send(
            self.request(Method::POST, &document_path(index, "_update", id)?)
                .query(&[("refresh", "wait_for")])
                .json(&serde_json::json!({ "doc": partial })),
        )
        .await?;
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> std::result::Result<(), EngineError> {
        self.send(
            self.request(Method::DELETE, &document_path(index, "_doc", id)?)
                .query(&[("refresh", "wait_for")]),
        )
        .await?;
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        body: &Value,
    ) -> std::result::Result<SearchResponse, EngineError> {
        let response = self
            .send(
                self.request(Method::POST, &format!("{}/_search", index))
                    .json(body),
            )
            .await?;
        let result: SearchResponse = Self::json(response).await?;
        tracing::debug!(index = %index, took_ms = result.took, total = result.total(), "Search completed");
        Ok(result)
    }

    async fn update_by_query(&self, index: &str, body: &Value) -> std::result::Result<u64, EngineError> {
        let response = self
            .send(
                self.request(Method::POST, &format!("{}/_update_by_query", index))
                    .query(&[("refresh", "true"), ("conflicts", "proceed")])
                    .json(body),
            )
            .await?;
        let result: UpdateByQueryResponse = Self::json(response).await?;
        Ok(result.updated)
    }
}
