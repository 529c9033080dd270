use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PublisherSettings;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
}

/// Body of the `import/openapi` call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub input: String,
    pub options: ImportOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportOptions {
    #[serde(rename = "folderStrategy")]
    pub folder_strategy: String,
}

impl ImportRequest {
    /// Import a spec passed inline as text, grouping requests into one folder per tag.
    pub fn inline_by_tags(input: String) -> Self {
        Self {
            kind: "string".to_string(),
            input,
            options: ImportOptions {
                folder_strategy: "Tags".to_string(),
            },
        }
    }
}

/// Status and raw body of a mutating call; the caller decides what counts as failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait PostmanApi {
    fn list_workspaces(&mut self) -> Result<Vec<WorkspaceSummary>>;
    fn list_collections(&mut self, workspace_id: &str) -> Result<Vec<CollectionSummary>>;
    /// Returns the decoded response body, including `{ "error": ... }` payloads.
    fn import_openapi(&mut self, workspace_id: &str, request: &ImportRequest) -> Result<Value>;
    fn get_collection(&mut self, collection_id: &str) -> Result<Value>;
    fn replace_collection(
        &mut self,
        collection_id: &str,
        document: &Value,
    ) -> Result<RemoteResponse>;
    fn delete_collection(&mut self, collection_id: &str) -> Result<RemoteResponse>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct PostmanClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: Option<u64>,
}

impl PostmanClientConfig {
    pub fn from_settings(settings: &PublisherSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            timeout_ms: settings.timeout_ms,
        }
    }
}

/// Blocking client for the Postman REST API. One request at a time, no retries.
pub struct PostmanClient {
    client: Client,
    config: PostmanClientConfig,
    request_count: usize,
}

impl PostmanClient {
    pub fn new(config: PostmanClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .context("failed to build Postman HTTP client")?;

        Ok(Self {
            client,
            config,
            request_count: 0,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&mut self, method: Method, path: &str) -> RequestBuilder {
        self.request_count += 1;
        self.client
            .request(method, self.endpoint(path))
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .header("Content-Type", "application/json")
    }

    fn read_json(&self, request: RequestBuilder, what: &str) -> Result<Value> {
        let response = request
            .send()
            .with_context(|| format!("failed to call Postman API ({what})"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|error| format!("<unreadable body: {error}>"));
            bail!("Postman API request ({what}) failed with HTTP {status}: {body}");
        }
        response
            .json()
            .with_context(|| format!("failed to decode Postman API JSON response ({what})"))
    }

    fn read_status(&self, request: RequestBuilder, what: &str) -> Result<RemoteResponse> {
        let response = request
            .send()
            .with_context(|| format!("failed to call Postman API ({what})"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("failed to read Postman API response body ({what})"))?;
        Ok(RemoteResponse { status, body })
    }
}

impl PostmanApi for PostmanClient {
    fn list_workspaces(&mut self) -> Result<Vec<WorkspaceSummary>> {
        let request = self.request(Method::GET, "workspaces");
        let payload = self.read_json(request, "list workspaces")?;
        let parsed: WorkspacesResponse = serde_json::from_value(payload)
            .context("failed to decode workspaces API response")?;
        Ok(parsed.workspaces)
    }

    fn list_collections(&mut self, workspace_id: &str) -> Result<Vec<CollectionSummary>> {
        let request = self
            .request(Method::GET, "collections")
            .query(&[("workspace", workspace_id)]);
        let payload = self.read_json(request, "list collections")?;
        let parsed: CollectionsResponse = serde_json::from_value(payload)
            .context("failed to decode collections API response")?;
        Ok(parsed.collections)
    }

    fn import_openapi(&mut self, workspace_id: &str, request: &ImportRequest) -> Result<Value> {
        let response = self
            .request(Method::POST, "import/openapi")
            .query(&[("workspace", workspace_id)])
            .json(request)
            .send()
            .context("failed to call Postman API (import openapi)")?;
        response
            .json()
            .context("failed to decode Postman API JSON response (import openapi)")
    }

    fn get_collection(&mut self, collection_id: &str) -> Result<Value> {
        let request = self.request(Method::GET, &format!("collections/{collection_id}"));
        self.read_json(request, "get collection")
    }

    fn replace_collection(
        &mut self,
        collection_id: &str,
        document: &Value,
    ) -> Result<RemoteResponse> {
        let request = self
            .request(Method::PUT, &format!("collections/{collection_id}"))
            .json(document);
        self.read_status(request, "update collection")
    }

    fn delete_collection(&mut self, collection_id: &str) -> Result<RemoteResponse> {
        let request = self.request(Method::DELETE, &format!("collections/{collection_id}"));
        self.read_status(request, "delete collection")
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

#[derive(Debug, Deserialize, Default)]
struct WorkspacesResponse {
    #[serde(default)]
    workspaces: Vec<WorkspaceSummary>,
}

#[derive(Debug, Deserialize, Default)]
struct CollectionsResponse {
    #[serde(default)]
    collections: Vec<CollectionSummary>,
}
