use anyhow::Result;
use tracing::info;

use crate::client::PostmanApi;
use crate::error::PublishError;

/// Find a workspace id by name, ignoring case. The first match wins.
pub fn resolve_workspace<A: PostmanApi>(api: &mut A, name: &str) -> Result<String> {
    info!("Searching for workspace '{name}'");
    let wanted = name.to_lowercase();
    let workspace = api
        .list_workspaces()?
        .into_iter()
        .find(|workspace| workspace.name.to_lowercase() == wanted)
        .ok_or_else(|| PublishError::WorkspaceNotFound {
            name: name.to_string(),
        })?;
    info!("Workspace '{name}' found with ID: {}", workspace.id);
    Ok(workspace.id)
}
