use std::collections::BTreeMap;

use anyhow::bail;
use serde_json::{Value, json};

use crate::client::{
    CollectionSummary, ImportRequest, PostmanApi, RemoteResponse, WorkspaceSummary,
};

/// In-memory stand-in for the Postman API. Records every call in order.
#[derive(Default)]
pub struct MockApi {
    pub workspaces: Vec<WorkspaceSummary>,
    pub collections_by_workspace: BTreeMap<String, Vec<CollectionSummary>>,
    pub documents: BTreeMap<String, Value>,
    pub import_response: Option<Value>,
    pub delete_status: Option<u16>,
    pub replace_status: Option<u16>,
    pub imports: Vec<(String, ImportRequest)>,
    pub replaced: Vec<(String, Value)>,
    pub deleted: Vec<String>,
    pub calls: Vec<String>,
    pub request_count: usize,
}

impl MockApi {
    fn record(&mut self, call: String) {
        self.request_count += 1;
        self.calls.push(call);
    }
}

impl PostmanApi for MockApi {
    fn list_workspaces(&mut self) -> anyhow::Result<Vec<WorkspaceSummary>> {
        self.record("list_workspaces".to_string());
        Ok(self.workspaces.clone())
    }

    fn list_collections(&mut self, workspace_id: &str) -> anyhow::Result<Vec<CollectionSummary>> {
        self.record(format!("list_collections {workspace_id}"));
        Ok(self
            .collections_by_workspace
            .get(workspace_id)
            .cloned()
            .unwrap_or_default())
    }

    fn import_openapi(
        &mut self,
        workspace_id: &str,
        request: &ImportRequest,
    ) -> anyhow::Result<Value> {
        self.record(format!("import_openapi {workspace_id}"));
        self.imports.push((workspace_id.to_string(), request.clone()));
        Ok(self.import_response.clone().unwrap_or_else(|| {
            json!({ "collections": [{ "id": "imported", "name": "MOSTLY AI" }] })
        }))
    }

    fn get_collection(&mut self, collection_id: &str) -> anyhow::Result<Value> {
        self.record(format!("get_collection {collection_id}"));
        match self.documents.get(collection_id) {
            Some(document) => Ok(document.clone()),
            None => bail!("Postman API request (get collection) failed with HTTP 404 Not Found"),
        }
    }

    fn replace_collection(
        &mut self,
        collection_id: &str,
        document: &Value,
    ) -> anyhow::Result<RemoteResponse> {
        self.record(format!("replace_collection {collection_id}"));
        let status = self.replace_status.unwrap_or(200);
        if status == 200 {
            self.documents
                .insert(collection_id.to_string(), document.clone());
        }
        self.replaced
            .push((collection_id.to_string(), document.clone()));
        Ok(RemoteResponse {
            status,
            body: if status == 200 {
                "{}".to_string()
            } else {
                "{\"error\":{\"name\":\"instanceNotFoundError\"}}".to_string()
            },
        })
    }

    fn delete_collection(&mut self, collection_id: &str) -> anyhow::Result<RemoteResponse> {
        self.record(format!("delete_collection {collection_id}"));
        let status = self.delete_status.unwrap_or(200);
        if status == 200 {
            self.deleted.push(collection_id.to_string());
        }
        Ok(RemoteResponse {
            status,
            body: if status == 200 {
                "{}".to_string()
            } else {
                "{\"error\":{\"name\":\"forbiddenError\"}}".to_string()
            },
        })
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

pub fn workspace(id: &str, name: &str) -> WorkspaceSummary {
    WorkspaceSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn collection(id: &str, name: &str) -> CollectionSummary {
    CollectionSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn folder(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "item": [] })
}

pub fn document(items: Vec<Value>) -> Value {
    json!({
        "collection": {
            "info": {
                "name": "MOSTLY AI",
                "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            },
            "item": items
        }
    })
}

/// Names of the items at the top level of a collection document.
pub fn top_level_names(document: &Value) -> Vec<String> {
    child_names(&document["collection"])
}

/// Names of the direct children of a folder value.
pub fn child_names(folder: &Value) -> Vec<String> {
    folder["item"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// First top-level item with the given name.
pub fn top_level<'a>(document: &'a Value, name: &str) -> &'a Value {
    find_child(&document["collection"], name)
}

/// First direct child with the given name, or `Value::Null`.
pub fn find_child<'a>(folder: &'a Value, name: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    folder["item"]
        .as_array()
        .and_then(|items| items.iter().find(|item| item["name"] == name))
        .unwrap_or(&NULL)
}
