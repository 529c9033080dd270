use thiserror::Error;

/// Domain failures of the publish pipeline. They travel inside `anyhow::Error`
/// and can be recovered with `downcast_ref::<PublishError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("spec document not found: {path}")]
    SpecNotFound { path: String },
    #[error("failed to parse spec document {path}: {message}")]
    SpecParse { path: String, message: String },
    #[error("workspace '{name}' not found")]
    WorkspaceNotFound { name: String },
    #[error("error deleting collection: {body}. Status code: {status}")]
    Delete { status: u16, body: String },
    #[error("error importing OpenAPI spec: {message}")]
    Import { message: String },
    #[error("destination folder '{name}' not found at the top level of the collection")]
    DestinationNotFound { name: String },
    #[error(
        "error updating collection: {body}. Status code: {status}. The collection may be left partially reorganized; delete it and re-run the publisher to import the OpenAPI spec from scratch"
    )]
    Update { status: u16, body: String },
    #[error("malformed collection document: {0}")]
    InvalidDocument(String),
}
