//! Error types for the vpsync-reconcile crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("registry error: {0}")]
    Registry(#[from] vpsync_registry::RegistryError),

    #[error("store error: {0}")]
    Store(#[from] vpsync_store::StoreError),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
