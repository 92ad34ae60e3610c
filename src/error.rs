use thiserror::Error;

use crate::domain::{OrderStatus, PickupStatus, ProductStatus};

/// Errors from the identity registry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User validation error: {0}")]
    Validation(String),
    #[error("Insufficient GreenCoins balance: have {balance}, change {delta}")]
    InsufficientBalance { balance: i64, delta: i64 },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors from the pickup-request ledger.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Pickup request not found: {0}")]
    NotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Invalid pickup state: expected {expected}, was {actual}")]
    InvalidState {
        expected: PickupStatus,
        actual: PickupStatus,
    },
    #[error("Pickup validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors from the marketplace catalog.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Invalid product state: {0}")]
    InvalidProductState(ProductStatus),
    #[error("Invalid order transition: {from} -> {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },
    #[error("Catalog validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors from paths that read or write across all three services: the
/// statistics aggregator and snapshot export/import.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors from snapshot persistence.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}
