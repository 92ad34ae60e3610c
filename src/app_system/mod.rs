//! System orchestration, startup, and shutdown logic.

pub mod marketplace_system;
pub mod tracing;

pub use marketplace_system::MarketplaceSystem;
pub use self::tracing::setup_tracing;
