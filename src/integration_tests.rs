#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, Utc};

    use crate::app_system::MarketplaceSystem;
    use crate::domain::{
        PickupCreate, PickupStatus, ProductCreate, ProductStatus, Role, UserCreate, UserKind,
        WasteType,
    };
    use crate::error::{CatalogError, LedgerError, RegistryError};
    use crate::matcher::{rank_pending_requests, CollectorContext, SortKey, UrgencyTier};
    use crate::persistence::{JsonFileRepository, SnapshotRepository};

    async fn register(
        system: &MarketplaceSystem,
        name: &str,
        role: Role,
        kind: Option<UserKind>,
    ) -> String {
        system
            .registry_client
            .create_user(UserCreate::new(
                name,
                format!("{}@example.com", name.to_lowercase()),
                role,
                kind,
            ))
            .await
            .unwrap()
            .id
    }

    fn plastic_pickup(owner_id: &str, quantity_kg: u32) -> PickupCreate {
        PickupCreate::new(
            owner_id,
            WasteType::Plastic,
            quantity_kg,
            "12 Lakeview Road, Indiranagar",
            Utc::now() + Duration::hours(36),
        )
    }

    #[tokio::test]
    async fn pickup_lifecycle_credits_rewards_and_earnings() {
        let system = MarketplaceSystem::new();
        let owner = register(&system, "Asha", Role::EndUser, Some(UserKind::Generator)).await;
        let collector = register(&system, "Ravi", Role::Collector, None).await;

        // 5 kg of plastic at 15/kg
        let pickup = system
            .ledger_client
            .create_pickup(plastic_pickup(&owner, 5))
            .await
            .unwrap();
        assert_eq!(pickup.estimated_value, 75);
        assert_eq!(pickup.green_coins_award, 38);

        let accepted = system
            .ledger_client
            .accept_pickup(pickup.id.clone(), collector.clone())
            .await
            .unwrap();
        assert_eq!(accepted.status, PickupStatus::Assigned);

        let completed = system
            .ledger_client
            .complete_pickup(pickup.id.clone(), collector.clone(), Some(75))
            .await
            .unwrap();
        assert_eq!(completed.status, PickupStatus::Completed);
        assert_eq!(completed.collector_id, Some(collector.clone()));

        let owner_record = system
            .registry_client
            .get_user(owner.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner_record.green_coins, 38);

        let stats = system.stats().collector_stats(&collector).await.unwrap();
        assert_eq!(stats.total_pickups, 1);
        assert_eq!(stats.total_earnings, 75);
        assert_eq!(stats.waste_collected_kg, 5);
        assert!((stats.efficiency_kg_per_pickup - 5.0).abs() < f64::EPSILON);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn racing_accepts_yield_exactly_one_assignment() {
        let system = MarketplaceSystem::new();
        let owner = register(&system, "Asha", Role::EndUser, Some(UserKind::Generator)).await;
        let first = register(&system, "Ravi", Role::Collector, None).await;
        let second = register(&system, "Sunil", Role::Collector, None).await;

        let pickup = system
            .ledger_client
            .create_pickup(plastic_pickup(&owner, 5))
            .await
            .unwrap();

        let ledger_a = system.ledger_client.clone();
        let ledger_b = system.ledger_client.clone();
        let id_a = pickup.id.clone();
        let id_b = pickup.id.clone();
        let first_clone = first.clone();
        let second_clone = second.clone();

        let (result_a, result_b) = tokio::join!(
            tokio::spawn(async move { ledger_a.accept_pickup(id_a, first_clone).await }),
            tokio::spawn(async move { ledger_b.accept_pickup(id_b, second_clone).await }),
        );
        let outcomes = [result_a.unwrap(), result_b.unwrap()];

        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            LedgerError::InvalidState { .. }
        ));

        let record = system
            .ledger_client
            .get_pickup(pickup.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PickupStatus::Assigned);
        let assigned_to = record.collector_id.unwrap();
        assert!(assigned_to == first || assigned_to == second);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn marketplace_sale_settles_exactly_and_sells_out() {
        let system = MarketplaceSystem::new();
        let seller = register(&system, "Meera", Role::EndUser, Some(UserKind::DiySeller)).await;
        let buyer = register(&system, "Vikram", Role::EndUser, Some(UserKind::Generator)).await;

        let product = system
            .catalog_client
            .add_product(ProductCreate::new(
                &seller,
                "Bottle-glass table lamp",
                300,
                "decor",
            ))
            .await
            .unwrap();

        let order = system
            .catalog_client
            .create_order(product.id.clone(), buyer.clone(), 1)
            .await
            .unwrap();
        assert_eq!(order.total_amount, 300);
        assert_eq!(order.platform_fee, 15);
        assert_eq!(order.seller_amount, 285);
        assert_eq!(order.platform_fee + order.seller_amount, order.total_amount);

        let sold = system
            .catalog_client
            .get_product(product.id.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sold.status, ProductStatus::Sold);

        let err = system
            .catalog_client
            .create_order(product.id, buyer, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidProductState(_)));

        let stats = system.stats().seller_stats(&seller).await.unwrap();
        assert_eq!(stats.sold_listings, 1);
        assert_eq!(stats.orders_received, 1);
        assert_eq!(stats.gross_sales, 300);
        assert_eq!(stats.net_earnings, 285);

        let platform = system.stats().admin_stats().await.unwrap();
        assert_eq!(platform.total_orders, 1);
        assert_eq!(platform.gross_merchandise_value, 300);
        assert_eq!(platform.platform_revenue, 15);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn rewards_can_be_redeemed_but_never_overdrawn() {
        let system = MarketplaceSystem::new();
        let owner = register(&system, "Asha", Role::EndUser, Some(UserKind::Generator)).await;
        let collector = register(&system, "Ravi", Role::Collector, None).await;

        let pickup = system
            .ledger_client
            .create_pickup(plastic_pickup(&owner, 5))
            .await
            .unwrap();
        system
            .ledger_client
            .accept_pickup(pickup.id.clone(), collector.clone())
            .await
            .unwrap();
        system
            .ledger_client
            .complete_pickup(pickup.id, collector, None)
            .await
            .unwrap();

        let err = system
            .registry_client
            .adjust_green_coins(owner.clone(), -1000, "redemption".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InsufficientBalance { .. }));

        let balance = system
            .registry_client
            .adjust_green_coins(owner.clone(), -30, "redemption".to_string())
            .await
            .unwrap();
        assert_eq!(balance, 8);

        let record = system
            .registry_client
            .get_user(owner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.green_coins, 8);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn collector_browse_ranks_live_pending_requests() {
        let system = MarketplaceSystem::new();
        let owner = register(&system, "Asha", Role::EndUser, Some(UserKind::Generator)).await;
        let collector = register(&system, "Ravi", Role::Collector, None).await;

        let near = system
            .ledger_client
            .create_pickup(plastic_pickup(&owner, 5))
            .await
            .unwrap();
        let far = system
            .ledger_client
            .create_pickup(PickupCreate::new(
                &owner,
                WasteType::Metal,
                10,
                "44 MG Road, Koramangala",
                Utc::now() + Duration::hours(12),
            ))
            .await
            .unwrap();

        let pending = system.ledger_client.list_pending().await.unwrap();
        let ctx = CollectorContext {
            collector_id: collector.clone(),
            service_area: "Indiranagar".to_string(),
            owner_scores: HashMap::new(),
            as_of: Utc::now(),
        };

        let by_distance = rank_pending_requests(pending.clone(), &ctx, SortKey::Distance, None);
        assert_eq!(by_distance[0].id, near.id);

        let by_payment = rank_pending_requests(pending.clone(), &ctx, SortKey::Payment, None);
        assert_eq!(by_payment[0].id, far.id);

        let urgent = rank_pending_requests(
            pending,
            &ctx,
            SortKey::Urgency,
            Some(UrgencyTier::Urgent),
        );
        assert_eq!(urgent.len(), 1);
        assert_eq!(urgent[0].id, far.id);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn organization_dashboard_aggregates_bulk_activity() {
        let system = MarketplaceSystem::new();
        let org = register(
            &system,
            "Greenworks",
            Role::EndUser,
            Some(UserKind::Organization),
        )
        .await;
        let collector = register(&system, "Ravi", Role::Collector, None).await;

        let first = system
            .ledger_client
            .create_pickup(PickupCreate::new(
                &org,
                WasteType::Paper,
                40,
                "Plot 7, Peenya Industrial Area",
                Utc::now() + Duration::hours(24),
            ))
            .await
            .unwrap();
        system
            .ledger_client
            .create_pickup(PickupCreate::new(
                &org,
                WasteType::EWaste,
                12,
                "Plot 7, Peenya Industrial Area",
                Utc::now() + Duration::hours(96),
            ))
            .await
            .unwrap();

        system
            .ledger_client
            .accept_pickup(first.id.clone(), collector.clone())
            .await
            .unwrap();
        system
            .ledger_client
            .complete_pickup(first.id, collector, Some(420))
            .await
            .unwrap();

        let stats = system.stats().organization_stats(&org).await.unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.active_requests, 1);
        assert_eq!(stats.completed_pickups, 1);
        assert_eq!(stats.waste_diverted_kg, 40);
        assert_eq!(stats.total_payout, 420);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn snapshot_round_trips_into_a_fresh_system() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path().join("snapshot.json"));

        let system = MarketplaceSystem::new();
        let owner = register(&system, "Asha", Role::EndUser, Some(UserKind::Generator)).await;
        let collector = register(&system, "Ravi", Role::Collector, None).await;
        let pickup = system
            .ledger_client
            .create_pickup(plastic_pickup(&owner, 5))
            .await
            .unwrap();
        system
            .ledger_client
            .accept_pickup(pickup.id, collector)
            .await
            .unwrap();

        let snapshot = system.export_snapshot().await.unwrap();
        repository.save(&snapshot).unwrap();
        system.shutdown().await.unwrap();

        let restored = MarketplaceSystem::new();
        let loaded = repository.load().unwrap().unwrap();
        restored.import_snapshot(loaded).await.unwrap();

        assert_eq!(restored.export_snapshot().await.unwrap(), snapshot);

        // Id counters continue above the restored ids
        let next = register(&restored, "Meera", Role::EndUser, Some(UserKind::DiySeller)).await;
        assert_eq!(next, "user_3");
        let next_pickup = restored
            .ledger_client
            .create_pickup(plastic_pickup(&owner, 2))
            .await
            .unwrap();
        assert_eq!(next_pickup.id, "pickup_2");

        restored.shutdown().await.unwrap();
    }
}
