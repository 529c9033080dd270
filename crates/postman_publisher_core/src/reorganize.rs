//! Folder reorganization for a freshly imported collection.
//!
//! The import groups requests into one top-level folder per tag. This module
//! nests those folders into a fixed hierarchy by editing the fetched document
//! in memory and pushing it back as a whole-document replace. The replace is
//! not guarded against concurrent writers: only one reorganization of a given
//! collection may run at a time.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::PostmanApi;
use crate::error::PublishError;

pub const SOURCE_TABLES: &str = "Source Tables";
pub const SOURCE_COLUMNS: &str = "Source Columns";
pub const SOURCE_FOREIGN_KEYS: &str = "Source Foreign Keys";
pub const GENERATORS: &str = "Generators";
pub const GENERATOR_TRAINING: &str = "Generator Training";
pub const SYNTHETIC_DATASETS: &str = "Synthetic Datasets";
pub const SYNTHETIC_TABLES: &str = "Synthetic Tables";
pub const SYNTHETIC_GENERATION: &str = "Synthetic Generation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRule {
    /// Runs only when the destination exists at top level; skipped otherwise.
    WhenDestinationPresent,
    /// The destination must exist; its absence aborts the reorganization.
    DestinationRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FolderMove {
    pub folder: &'static str,
    pub destination: &'static str,
    pub rule: MoveRule,
}

const LAYOUT: [FolderMove; 6] = [
    FolderMove {
        folder: SOURCE_COLUMNS,
        destination: SOURCE_TABLES,
        rule: MoveRule::WhenDestinationPresent,
    },
    FolderMove {
        folder: SOURCE_FOREIGN_KEYS,
        destination: SOURCE_TABLES,
        rule: MoveRule::WhenDestinationPresent,
    },
    FolderMove {
        folder: SOURCE_TABLES,
        destination: GENERATORS,
        rule: MoveRule::DestinationRequired,
    },
    FolderMove {
        folder: GENERATOR_TRAINING,
        destination: GENERATORS,
        rule: MoveRule::DestinationRequired,
    },
    FolderMove {
        folder: SYNTHETIC_TABLES,
        destination: SYNTHETIC_DATASETS,
        rule: MoveRule::DestinationRequired,
    },
    FolderMove {
        folder: SYNTHETIC_GENERATION,
        destination: SYNTHETIC_DATASETS,
        rule: MoveRule::DestinationRequired,
    },
];

/// The fixed move plan, in evaluation order.
pub fn layout() -> &'static [FolderMove] {
    &LAYOUT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved,
    SkippedMissingFolder,
    SkippedCondition,
}

impl MoveOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Moved => "moved",
            Self::SkippedMissingFolder => "skipped_missing_folder",
            Self::SkippedCondition => "skipped_condition",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MoveReport {
    pub folder: String,
    pub destination: String,
    pub outcome: MoveOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LayoutReport {
    pub moves: Vec<MoveReport>,
    pub top_level: Vec<String>,
}

impl LayoutReport {
    pub fn moved(&self) -> usize {
        self.moves
            .iter()
            .filter(|item| item.outcome == MoveOutcome::Moved)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReorganizeReport {
    pub collection_id: String,
    pub dry_run: bool,
    pub pushed: bool,
    pub layout: LayoutReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReorganizeOptions {
    pub dry_run: bool,
}

/// A top-level item located by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub index: usize,
    pub id: Option<String>,
}

/// Fetch the collection, apply the fixed layout and replace the remote document.
pub fn reorganize_collection<A: PostmanApi>(
    api: &mut A,
    collection_id: &str,
    options: &ReorganizeOptions,
) -> Result<ReorganizeReport> {
    let mut document = api.get_collection(collection_id)?;

    info!("Reorganizing folders in collection '{collection_id}'");
    let layout = apply_layout(&mut document)?;

    if options.dry_run {
        info!("Dry run: collection '{collection_id}' left unchanged");
        return Ok(ReorganizeReport {
            collection_id: collection_id.to_string(),
            dry_run: true,
            pushed: false,
            layout,
        });
    }

    info!("Updating collection '{collection_id}' with reorganized folders");
    let response = api.replace_collection(collection_id, &document)?;
    if !response.is_success() {
        return Err(PublishError::Update {
            status: response.status,
            body: response.body,
        }
        .into());
    }

    Ok(ReorganizeReport {
        collection_id: collection_id.to_string(),
        dry_run: false,
        pushed: true,
        layout,
    })
}

/// Apply the fixed layout to a collection document in place.
///
/// Every move sees the result of the previous ones. Required destinations are
/// checked before the first required move, so a failure leaves those moves
/// unapplied.
pub fn apply_layout(document: &mut Value) -> Result<LayoutReport> {
    let items = top_level_items_mut(document)?;
    let mut moves = Vec::with_capacity(LAYOUT.len());

    let (optional, required): (Vec<&FolderMove>, Vec<&FolderMove>) = LAYOUT
        .iter()
        .partition(|step| step.rule == MoveRule::WhenDestinationPresent);

    for step in optional {
        if find_folder(items, step.destination).is_none() {
            warn!("Folder '{}' not found", step.destination);
            moves.push(report(step, MoveOutcome::SkippedCondition));
            continue;
        }
        let outcome = move_folder(items, step.folder, step.destination)?;
        moves.push(report(step, outcome));
    }

    for destination in required_destinations() {
        if find_folder(items, destination).is_none() {
            return Err(PublishError::DestinationNotFound {
                name: destination.to_string(),
            }
            .into());
        }
    }

    for step in required {
        let outcome = move_folder(items, step.folder, step.destination)?;
        moves.push(report(step, outcome));
    }

    Ok(LayoutReport {
        moves,
        top_level: items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect(),
    })
}

/// Detach the first top-level item named `folder` and append it to the
/// children of the top-level folder named `destination`.
///
/// A missing `folder` is logged and skipped. The destination is resolved
/// before anything is detached, so a failed move never loses the folder.
pub fn move_folder(
    items: &mut Vec<Value>,
    folder: &str,
    destination: &str,
) -> Result<MoveOutcome> {
    info!("Moving folder '{folder}' to folder '{destination}'");
    let Some(child) = find_folder(items, folder) else {
        warn!("Folder '{folder}' not found");
        return Ok(MoveOutcome::SkippedMissingFolder);
    };
    let target = find_folder(items, destination).ok_or_else(|| {
        PublishError::DestinationNotFound {
            name: destination.to_string(),
        }
    })?;
    if child.index == target.index {
        return Err(PublishError::InvalidDocument(format!(
            "folder '{folder}' cannot be moved into itself"
        ))
        .into());
    }
    if children_mut(&mut items[target.index]).is_none() {
        return Err(PublishError::InvalidDocument(format!(
            "destination '{destination}' is not a folder"
        ))
        .into());
    }

    info!("Folder '{folder}' found at index {}. Deleting it from root", child.index);
    let moved = items.remove(child.index);
    let target_index = if child.index < target.index {
        target.index - 1
    } else {
        target.index
    };
    if let Some(children) = children_mut(&mut items[target_index]) {
        children.push(moved);
    }
    info!("Folder '{folder}' added to folder '{destination}'");
    Ok(MoveOutcome::Moved)
}

/// First top-level item whose name equals `name`.
pub fn find_folder(items: &[Value], name: &str) -> Option<FolderRef> {
    let (index, item) = items
        .iter()
        .enumerate()
        .find(|(_, item)| item.get("name").and_then(Value::as_str) == Some(name))?;
    let id = item.get("id").and_then(Value::as_str).map(ToString::to_string);
    info!(
        "Folder '{name}' found with ID: {}",
        id.as_deref().unwrap_or("<none>")
    );
    Some(FolderRef { index, id })
}

fn required_destinations() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for step in &LAYOUT {
        if step.rule == MoveRule::DestinationRequired && !names.contains(&step.destination) {
            names.push(step.destination);
        }
    }
    names
}

fn report(step: &FolderMove, outcome: MoveOutcome) -> MoveReport {
    MoveReport {
        folder: step.folder.to_string(),
        destination: step.destination.to_string(),
        outcome,
    }
}

fn top_level_items_mut(document: &mut Value) -> Result<&mut Vec<Value>> {
    document
        .get_mut("collection")
        .and_then(|collection| collection.get_mut("item"))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            PublishError::InvalidDocument("missing collection.item array".to_string()).into()
        })
}

fn children_mut(item: &mut Value) -> Option<&mut Vec<Value>> {
    item.get_mut("item").and_then(Value::as_array_mut)
}
