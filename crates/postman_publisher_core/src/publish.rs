use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::client::{PostmanApi, PostmanClient, PostmanClientConfig};
use crate::collection::{delete_collection, find_collection_by_name, import_spec};
use crate::config::PublisherSettings;
use crate::reorganize::{ReorganizeOptions, ReorganizeReport, reorganize_collection};
use crate::spec::load_spec;
use crate::workspace::resolve_workspace;

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub workspace_name: String,
    pub workspace_id: String,
    pub collection_name: String,
    pub deleted_collection_id: Option<String>,
    pub collection_id: String,
    pub reorganize: ReorganizeReport,
    pub request_count: usize,
}

/// Run the whole pipeline against the live Postman API.
pub fn publish_spec(settings: &PublisherSettings) -> Result<PublishReport> {
    let mut client = PostmanClient::new(PostmanClientConfig::from_settings(settings))?;
    publish_with_api(settings, &mut client)
}

/// Load the spec, replace the named collection with a fresh import and
/// reorganize its folders. The first failure aborts; nothing is rolled back.
pub fn publish_with_api<A: PostmanApi>(
    settings: &PublisherSettings,
    api: &mut A,
) -> Result<PublishReport> {
    let spec = load_spec(&settings.spec_path)?;
    let workspace_id = resolve_workspace(api, &settings.workspace_name)?;

    let deleted_collection_id =
        find_collection_by_name(api, &settings.collection_name, &workspace_id)?;
    if let Some(existing) = &deleted_collection_id {
        delete_collection(api, existing)?;
    }

    let collection_id = import_spec(api, &spec, &workspace_id)?;
    let reorganize = reorganize_collection(api, &collection_id, &ReorganizeOptions::default())
        .with_context(|| format!("failed to reorganize collection {collection_id}"))?;
    info!(
        "Published '{}' to workspace '{}' as collection '{collection_id}'",
        settings.collection_name, settings.workspace_name
    );

    Ok(PublishReport {
        workspace_name: settings.workspace_name.clone(),
        workspace_id,
        collection_name: settings.collection_name.clone(),
        deleted_collection_id,
        collection_id,
        reorganize,
        request_count: api.request_count(),
    })
}

/// Re-run only the folder reorganization for an existing collection.
pub fn reorganize_existing(
    settings: &PublisherSettings,
    collection_id: &str,
    options: &ReorganizeOptions,
) -> Result<ReorganizeReport> {
    let mut client = PostmanClient::new(PostmanClientConfig::from_settings(settings))?;
    reorganize_collection(&mut client, collection_id, options)
}
