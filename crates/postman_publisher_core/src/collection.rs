use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::client::{ImportRequest, PostmanApi};
use crate::error::PublishError;
use crate::spec::SpecDocument;

/// Id of the first collection in the workspace whose name matches exactly (case-sensitive).
pub fn find_collection_by_name<A: PostmanApi>(
    api: &mut A,
    name: &str,
    workspace_id: &str,
) -> Result<Option<String>> {
    info!("Searching for collection '{name}' in workspace '{workspace_id}'");
    let found = api
        .list_collections(workspace_id)?
        .into_iter()
        .find(|collection| collection.name == name)
        .map(|collection| collection.id);
    if let Some(id) = &found {
        info!("Collection '{name}' found with ID: {id}");
    }
    Ok(found)
}

pub fn delete_collection<A: PostmanApi>(api: &mut A, collection_id: &str) -> Result<()> {
    info!("Deleting collection '{collection_id}'");
    let response = api.delete_collection(collection_id)?;
    if !response.is_success() {
        return Err(PublishError::Delete {
            status: response.status,
            body: response.body,
        }
        .into());
    }
    Ok(())
}

/// Import the spec into the workspace as a new collection, one folder per tag.
/// Returns the id of the first collection the import created.
pub fn import_spec<A: PostmanApi>(
    api: &mut A,
    spec: &SpecDocument,
    workspace_id: &str,
) -> Result<String> {
    info!("Importing OpenAPI spec to workspace '{workspace_id}'");
    let request = ImportRequest::inline_by_tags(spec.to_json_string()?);
    let response = api.import_openapi(workspace_id, &request)?;

    if let Some(error) = response.get("error") {
        return Err(PublishError::Import {
            message: import_error_message(error),
        }
        .into());
    }

    let collection_id = response
        .get("collections")
        .and_then(Value::as_array)
        .and_then(|collections| collections.first())
        .and_then(|collection| collection.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| PublishError::Import {
            message: "response did not include a created collection".to_string(),
        })?
        .to_string();
    info!("Successfully imported OpenAPI spec with ID: {collection_id}");
    Ok(collection_id)
}

fn import_error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.get("name").and_then(Value::as_str))
        .or_else(|| error.as_str())
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::{delete_collection, find_collection_by_name, import_spec};
    use crate::error::PublishError;
    use crate::spec::SpecDocument;
    use crate::testing::{MockApi, collection};

    fn api_with_collections(collections: Vec<crate::client::CollectionSummary>) -> MockApi {
        MockApi {
            collections_by_workspace: BTreeMap::from([("ws1".to_string(), collections)]),
            ..MockApi::default()
        }
    }

    fn sample_spec() -> SpecDocument {
        let root = serde_yaml::from_str("openapi: 3.0.3\npaths: {}\n").expect("yaml");
        SpecDocument::from_value(root)
    }

    #[test]
    fn find_by_name_matches_exact_case() {
        let mut api = api_with_collections(vec![collection("c1", "MOSTLY AI")]);
        let found = find_collection_by_name(&mut api, "MOSTLY AI", "ws1").expect("find");
        assert_eq!(found.as_deref(), Some("c1"));
        assert_eq!(api.calls, vec!["list_collections ws1"]);
    }

    #[test]
    fn find_by_name_is_case_sensitive() {
        let mut api = api_with_collections(vec![collection("c1", "mostly ai")]);
        let found = find_collection_by_name(&mut api, "MOSTLY AI", "ws1").expect("find");
        assert!(found.is_none());
    }

    #[test]
    fn find_by_name_returns_first_match() {
        let mut api = api_with_collections(vec![
            collection("c0", "Other"),
            collection("c1", "MOSTLY AI"),
            collection("c2", "MOSTLY AI"),
        ]);
        let found = find_collection_by_name(&mut api, "MOSTLY AI", "ws1").expect("find");
        assert_eq!(found.as_deref(), Some("c1"));
    }

    #[test]
    fn find_by_name_scopes_to_workspace() {
        let mut api = api_with_collections(vec![collection("c1", "MOSTLY AI")]);
        let found = find_collection_by_name(&mut api, "MOSTLY AI", "ws2").expect("find");
        assert!(found.is_none());
    }

    #[test]
    fn delete_succeeds_on_ok_status() {
        let mut api = MockApi::default();
        delete_collection(&mut api, "c1").expect("delete");
        assert_eq!(api.deleted, vec!["c1"]);
    }

    #[test]
    fn delete_failure_carries_status_and_body() {
        let mut api = MockApi {
            delete_status: Some(403),
            ..MockApi::default()
        };
        let error = delete_collection(&mut api, "c1").expect_err("must fail");
        match error.downcast_ref::<PublishError>() {
            Some(PublishError::Delete { status, body }) => {
                assert_eq!(*status, 403);
                assert!(body.contains("forbiddenError"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(api.deleted.is_empty());
    }

    #[test]
    fn import_sends_spec_as_json_text_grouped_by_tags() {
        let mut api = MockApi {
            import_response: Some(json!({
                "collections": [{ "id": "new-1", "name": "MOSTLY AI", "uid": "123-new-1" }]
            })),
            ..MockApi::default()
        };
        let id = import_spec(&mut api, &sample_spec(), "ws1").expect("import");
        assert_eq!(id, "new-1");

        let (workspace_id, request) = &api.imports[0];
        assert_eq!(workspace_id, "ws1");
        assert_eq!(request.kind, "string");
        assert_eq!(request.options.folder_strategy, "Tags");
        let input: serde_json::Value = serde_json::from_str(&request.input).expect("json input");
        assert_eq!(input["openapi"], "3.0.3");
    }

    #[test]
    fn import_error_payload_fails_with_message() {
        let mut api = MockApi {
            import_response: Some(json!({
                "error": { "name": "invalidParamsError", "message": "Invalid OpenAPI definition" }
            })),
            ..MockApi::default()
        };
        let error = import_spec(&mut api, &sample_spec(), "ws1").expect_err("must fail");
        assert_eq!(
            error.downcast_ref::<PublishError>(),
            Some(&PublishError::Import {
                message: "Invalid OpenAPI definition".to_string()
            })
        );
    }

    #[test]
    fn import_without_created_collection_fails() {
        let mut api = MockApi {
            import_response: Some(json!({ "collections": [] })),
            ..MockApi::default()
        };
        let error = import_spec(&mut api, &sample_spec(), "ws1").expect_err("must fail");
        assert!(matches!(
            error.downcast_ref::<PublishError>(),
            Some(PublishError::Import { .. })
        ));
    }
}
