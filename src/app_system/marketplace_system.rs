use tracing::{error, info, instrument};

use crate::clients::{CatalogClient, LedgerClient, RegistryClient};
use crate::config::Pricing;
use crate::error::StoreError;
use crate::persistence::StoreSnapshot;
use crate::services::{CatalogService, LedgerService, RegistryService};
use crate::stats::StatsAggregator;

const MAILBOX_SIZE: usize = 100;

/// The composition root of the store. Starts the actors in dependency order,
/// wires the clients together, and owns the task handles for shutdown.
///
/// There is no process-global instance: whoever owns the application (or the
/// test) constructs one and passes the clients down.
pub struct MarketplaceSystem {
    pub registry_client: RegistryClient,
    pub ledger_client: LedgerClient,
    pub catalog_client: CatalogClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Default for MarketplaceSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketplaceSystem {
    pub fn new() -> Self {
        Self::with_pricing(Pricing::default())
    }

    /// Create and start the entire actor system.
    ///
    /// The registry starts first (no dependencies); the ledger and catalog
    /// follow with registry clients injected.
    #[instrument(name = "marketplace_system", skip(pricing))]
    pub fn with_pricing(pricing: Pricing) -> Self {
        let mut handles = Vec::new();

        info!("Starting marketplace system");

        let (registry_service, registry_client) = RegistryService::new(MAILBOX_SIZE);
        handles.push(tokio::spawn(registry_service.run()));

        let (ledger_service, ledger_client) =
            LedgerService::new(MAILBOX_SIZE, registry_client.clone(), pricing.clone());
        handles.push(tokio::spawn(ledger_service.run()));

        let (catalog_service, catalog_client) =
            CatalogService::new(MAILBOX_SIZE, registry_client.clone(), pricing);
        handles.push(tokio::spawn(catalog_service.run()));

        info!("Marketplace system started successfully");

        Self {
            registry_client,
            ledger_client,
            catalog_client,
            handles,
        }
    }

    /// Read-side facade over the running services.
    pub fn stats(&self) -> StatsAggregator {
        StatsAggregator::new(
            self.registry_client.clone(),
            self.ledger_client.clone(),
            self.catalog_client.clone(),
        )
    }

    /// Full collection state, for the persistence collaborator.
    pub async fn export_snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let users = self.registry_client.export_users().await?;
        let pickups = self.ledger_client.export_pickups().await?;
        let (products, orders) = self.catalog_client.export_catalog().await?;
        Ok(StoreSnapshot {
            users,
            pickups,
            products,
            orders,
        })
    }

    /// Replace every collection with the snapshot's contents. Id counters are
    /// re-seated above the restored ids.
    pub async fn import_snapshot(&self, snapshot: StoreSnapshot) -> Result<(), StoreError> {
        self.registry_client.import_users(snapshot.users).await?;
        self.ledger_client.import_pickups(snapshot.pickups).await?;
        self.catalog_client
            .import_catalog(snapshot.products, snapshot.orders)
            .await?;
        Ok(())
    }

    /// Gracefully shutdown the entire actor system.
    ///
    /// Root actors go first (they depend on the registry), then the registry;
    /// errors are logged but shutdown continues to prevent hangs.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down marketplace system");

        let _ = self.ledger_client.shutdown().await;
        let _ = self.catalog_client.shutdown().await;
        let _ = self.registry_client.shutdown().await;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Service shutdown error");
            }
        }

        info!("Marketplace system shutdown complete");
        Ok(())
    }
}
