mod app_system;
mod clients;
mod config;
mod domain;
mod error;
mod matcher;
mod messages;
mod persistence;
mod services;
mod stats;

#[cfg(test)]
mod integration_tests;

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tracing::{info, Instrument};

use crate::app_system::{setup_tracing, MarketplaceSystem};
use crate::domain::{PickupCreate, ProductCreate, Role, UserCreate, UserKind, WasteType};
use crate::matcher::{rank_pending_requests, CollectorContext, SortKey};
use crate::persistence::{JsonFileRepository, SnapshotRepository};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting greenloop coordination store");

    let system = MarketplaceSystem::new();

    // Register the demo cast: a household generator (who also buys), a
    // collector, and a DIY seller.
    let owner = system
        .registry_client
        .create_user(UserCreate::new(
            "Asha",
            "asha@example.com",
            Role::EndUser,
            Some(UserKind::Generator),
        ))
        .await
        .map_err(|e| e.to_string())?;

    let collector = system
        .registry_client
        .create_user(UserCreate::new(
            "Ravi",
            "ravi@example.com",
            Role::Collector,
            None,
        ))
        .await
        .map_err(|e| e.to_string())?;
    system
        .registry_client
        .set_verified(collector.id.clone(), true)
        .await
        .map_err(|e| e.to_string())?;

    let seller = system
        .registry_client
        .create_user(UserCreate::new(
            "Meera",
            "meera@example.com",
            Role::EndUser,
            Some(UserKind::DiySeller),
        ))
        .await
        .map_err(|e| e.to_string())?;

    info!(
        owner_id = %owner.id,
        collector_id = %collector.id,
        seller_id = %seller.id,
        "Accounts registered"
    );

    // Pickup flow: post, browse ranked, accept, complete.
    let span = tracing::info_span!("pickup_flow");
    async {
        let pickup = system
            .ledger_client
            .create_pickup(PickupCreate::new(
                owner.id.clone(),
                WasteType::Plastic,
                5,
                "12 Lakeview Road, Indiranagar",
                Utc::now() + Duration::hours(36),
            ))
            .await
            .map_err(|e| e.to_string())?;
        info!(
            pickup_id = %pickup.id,
            estimated_value = pickup.estimated_value,
            green_coins_award = pickup.green_coins_award,
            "Pickup posted"
        );

        let pending = system
            .ledger_client
            .list_pending()
            .await
            .map_err(|e| e.to_string())?;
        let ctx = CollectorContext {
            collector_id: collector.id.clone(),
            service_area: "Indiranagar".to_string(),
            owner_scores: HashMap::new(),
            as_of: Utc::now(),
        };
        let ranked = rank_pending_requests(pending, &ctx, SortKey::Distance, None);
        info!(candidates = ranked.len(), "Collector browsed pending pickups");

        let accepted = system
            .ledger_client
            .accept_pickup(pickup.id.clone(), collector.id.clone())
            .await
            .map_err(|e| e.to_string())?;
        info!(status = %accepted.status, "Pickup accepted");

        let completed = system
            .ledger_client
            .complete_pickup(pickup.id.clone(), collector.id.clone(), None)
            .await
            .map_err(|e| e.to_string())?;
        info!(
            status = %completed.status,
            actual_price = completed.actual_price,
            "Pickup completed"
        );
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    // Marketplace flow: list, browse, order.
    let span = tracing::info_span!("order_flow");
    async {
        let product = system
            .catalog_client
            .add_product(ProductCreate::new(
                seller.id.clone(),
                "Bottle-glass table lamp",
                300,
                "decor",
            ))
            .await
            .map_err(|e| e.to_string())?;
        system
            .catalog_client
            .record_view(product.id.clone())
            .await
            .map_err(|e| e.to_string())?;

        let order = system
            .catalog_client
            .create_order(product.id.clone(), owner.id.clone(), 1)
            .await
            .map_err(|e| e.to_string())?;
        info!(
            order_id = %order.id,
            total_amount = order.total_amount,
            platform_fee = order.platform_fee,
            seller_amount = order.seller_amount,
            "Order placed"
        );
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    // Dashboards read fresh aggregates.
    let aggregator = system.stats();
    let owner_stats = aggregator
        .user_stats(&owner.id)
        .await
        .map_err(|e| e.to_string())?;
    info!(
        green_coins = owner_stats.green_coins_balance,
        recycled_kg = owner_stats.total_recycled_kg,
        "Owner dashboard"
    );

    let collector_stats = aggregator
        .collector_stats(&collector.id)
        .await
        .map_err(|e| e.to_string())?;
    info!(
        total_pickups = collector_stats.total_pickups,
        total_earnings = collector_stats.total_earnings,
        efficiency = collector_stats.efficiency_kg_per_pickup,
        "Collector dashboard"
    );

    let platform = aggregator.admin_stats().await.map_err(|e| e.to_string())?;
    info!(
        total_users = platform.total_users,
        waste_recycled_kg = platform.waste_recycled_kg,
        platform_revenue = platform.platform_revenue,
        "Platform dashboard"
    );

    // Hand the collections to the persistence collaborator.
    let snapshot = system.export_snapshot().await.map_err(|e| e.to_string())?;
    let repository = JsonFileRepository::new("greenloop-snapshot.json");
    repository.save(&snapshot).map_err(|e| e.to_string())?;
    info!(
        users = snapshot.users.len(),
        pickups = snapshot.pickups.len(),
        "Snapshot saved"
    );

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
