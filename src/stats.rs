//! Dashboard aggregates, recomputed from current collections on every call.
//!
//! The formulas are pure functions over entity slices; [`StatsAggregator`]
//! snapshots the collections through the service clients and applies them.
//! Full scans are fine at this scale; a larger deployment would maintain
//! per-owner/per-collector materialized views invalidated on mutation.

use serde::Serialize;

use crate::clients::{CatalogClient, LedgerClient, RegistryClient};
use crate::domain::{
    Amount, Order, OrderStatus, PickupRequest, PickupStatus, Product, ProductFilter,
    ProductStatus, Role, User, UserFilter,
};
use crate::error::{RegistryError, StoreError};

/// Work and earnings view for a collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorStats {
    /// Completed pickups assigned to this collector.
    pub total_pickups: u32,
    /// Σ actual_price over those pickups.
    pub total_earnings: Amount,
    /// Σ quantity_kg over those pickups.
    pub waste_collected_kg: u32,
    /// waste_collected_kg / total_pickups; 0 when there are none.
    pub efficiency_kg_per_pickup: f64,
}

/// Recycling activity view for an end-user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_requests: u32,
    pub pending_requests: u32,
    pub assigned_requests: u32,
    pub completed_pickups: u32,
    pub cancelled_requests: u32,
    /// Σ quantity_kg over completed pickups.
    pub total_recycled_kg: u32,
    /// Σ green_coins_award over completed pickups.
    pub green_coins_earned: i64,
    pub green_coins_balance: i64,
    pub eco_score: u32,
}

/// Bulk-generator view for an organization account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationStats {
    pub total_requests: u32,
    /// Pending plus assigned.
    pub active_requests: u32,
    pub completed_pickups: u32,
    /// Σ quantity_kg over completed pickups.
    pub waste_diverted_kg: u32,
    /// Σ actual_price over completed pickups.
    pub total_payout: Amount,
}

/// Marketplace view for a seller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerStats {
    pub total_listings: u32,
    pub active_listings: u32,
    pub sold_listings: u32,
    pub total_views: u32,
    pub total_likes: u32,
    /// Orders naming this seller, cancelled ones excluded.
    pub orders_received: u32,
    /// Σ total_amount over those orders.
    pub gross_sales: Amount,
    /// Σ seller_amount over those orders.
    pub net_earnings: Amount,
}

/// Platform-wide view for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminStats {
    pub total_users: u32,
    pub end_users: u32,
    pub collectors: u32,
    pub total_pickups: u32,
    pub completed_pickups: u32,
    /// completed / total; 0 when there are no pickups.
    pub completion_rate: f64,
    pub waste_recycled_kg: u32,
    /// Σ green_coins balances across all users.
    pub green_coins_in_circulation: i64,
    pub total_products: u32,
    pub products_sold: u32,
    pub total_orders: u32,
    /// Σ total_amount over non-cancelled orders.
    pub gross_merchandise_value: Amount,
    /// Σ platform_fee over non-cancelled orders.
    pub platform_revenue: Amount,
}

pub fn collector_stats(collector_id: &str, pickups: &[PickupRequest]) -> CollectorStats {
    let completed: Vec<&PickupRequest> = pickups
        .iter()
        .filter(|p| {
            p.status == PickupStatus::Completed
                && p.collector_id.as_deref() == Some(collector_id)
        })
        .collect();

    let total_pickups = completed.len() as u32;
    let waste_collected_kg: u32 = completed.iter().map(|p| p.quantity_kg).sum();
    let total_earnings: Amount = completed
        .iter()
        .map(|p| p.actual_price.unwrap_or(p.estimated_value))
        .sum();
    let efficiency_kg_per_pickup = if total_pickups > 0 {
        f64::from(waste_collected_kg) / f64::from(total_pickups)
    } else {
        0.0
    };

    CollectorStats {
        total_pickups,
        total_earnings,
        waste_collected_kg,
        efficiency_kg_per_pickup,
    }
}

pub fn user_stats(user: &User, pickups: &[PickupRequest]) -> UserStats {
    let owned: Vec<&PickupRequest> =
        pickups.iter().filter(|p| p.owner_id == user.id).collect();
    let by_status =
        |status: PickupStatus| owned.iter().filter(|p| p.status == status).count() as u32;
    let completed: Vec<&&PickupRequest> = owned
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .collect();

    UserStats {
        total_requests: owned.len() as u32,
        pending_requests: by_status(PickupStatus::Pending),
        assigned_requests: by_status(PickupStatus::Assigned),
        completed_pickups: by_status(PickupStatus::Completed),
        cancelled_requests: by_status(PickupStatus::Cancelled),
        total_recycled_kg: completed.iter().map(|p| p.quantity_kg).sum(),
        green_coins_earned: completed.iter().map(|p| p.green_coins_award).sum(),
        green_coins_balance: user.green_coins,
        eco_score: user.eco_score,
    }
}

pub fn organization_stats(user: &User, pickups: &[PickupRequest]) -> OrganizationStats {
    let owned: Vec<&PickupRequest> =
        pickups.iter().filter(|p| p.owner_id == user.id).collect();
    let completed: Vec<&&PickupRequest> = owned
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .collect();
    let active = owned
        .iter()
        .filter(|p| matches!(p.status, PickupStatus::Pending | PickupStatus::Assigned))
        .count() as u32;

    OrganizationStats {
        total_requests: owned.len() as u32,
        active_requests: active,
        completed_pickups: completed.len() as u32,
        waste_diverted_kg: completed.iter().map(|p| p.quantity_kg).sum(),
        total_payout: completed
            .iter()
            .map(|p| p.actual_price.unwrap_or(p.estimated_value))
            .sum(),
    }
}

pub fn seller_stats(seller_id: &str, products: &[Product], orders: &[Order]) -> SellerStats {
    let listings: Vec<&Product> =
        products.iter().filter(|p| p.seller_id == seller_id).collect();
    let sold_orders: Vec<&Order> = orders
        .iter()
        .filter(|o| o.seller_id == seller_id && o.status != OrderStatus::Cancelled)
        .collect();

    SellerStats {
        total_listings: listings.len() as u32,
        active_listings: listings
            .iter()
            .filter(|p| p.status == ProductStatus::Active)
            .count() as u32,
        sold_listings: listings
            .iter()
            .filter(|p| p.status == ProductStatus::Sold)
            .count() as u32,
        total_views: listings.iter().map(|p| p.views).sum(),
        total_likes: listings.iter().map(|p| p.likes).sum(),
        orders_received: sold_orders.len() as u32,
        gross_sales: sold_orders.iter().map(|o| o.total_amount).sum(),
        net_earnings: sold_orders.iter().map(|o| o.seller_amount).sum(),
    }
}

pub fn admin_stats(
    users: &[User],
    pickups: &[PickupRequest],
    products: &[Product],
    orders: &[Order],
) -> AdminStats {
    let completed_pickups = pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .count() as u32;
    let total_pickups = pickups.len() as u32;
    let completion_rate = if total_pickups > 0 {
        f64::from(completed_pickups) / f64::from(total_pickups)
    } else {
        0.0
    };
    let settled_orders: Vec<&Order> = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .collect();

    AdminStats {
        total_users: users.len() as u32,
        end_users: users.iter().filter(|u| u.role == Role::EndUser).count() as u32,
        collectors: users.iter().filter(|u| u.role == Role::Collector).count() as u32,
        total_pickups,
        completed_pickups,
        completion_rate,
        waste_recycled_kg: pickups
            .iter()
            .filter(|p| p.status == PickupStatus::Completed)
            .map(|p| p.quantity_kg)
            .sum(),
        green_coins_in_circulation: users.iter().map(|u| u.green_coins).sum(),
        total_products: products.len() as u32,
        products_sold: products
            .iter()
            .filter(|p| p.status == ProductStatus::Sold)
            .count() as u32,
        total_orders: orders.len() as u32,
        gross_merchandise_value: settled_orders.iter().map(|o| o.total_amount).sum(),
        platform_revenue: settled_orders.iter().map(|o| o.platform_fee).sum(),
    }
}

/// Read-side facade over the three services. Every call fetches fresh
/// snapshots, so the numbers can never be stale.
#[derive(Clone)]
pub struct StatsAggregator {
    registry: RegistryClient,
    ledger: LedgerClient,
    catalog: CatalogClient,
}

impl StatsAggregator {
    pub fn new(registry: RegistryClient, ledger: LedgerClient, catalog: CatalogClient) -> Self {
        Self {
            registry,
            ledger,
            catalog,
        }
    }

    pub async fn collector_stats(&self, collector_id: &str) -> Result<CollectorStats, StoreError> {
        let pickups = self.ledger.list_by_collector(collector_id.to_string()).await?;
        Ok(collector_stats(collector_id, &pickups))
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, StoreError> {
        let user = self.require_user(user_id).await?;
        let pickups = self.ledger.list_by_owner(user_id.to_string()).await?;
        Ok(user_stats(&user, &pickups))
    }

    pub async fn organization_stats(
        &self,
        user_id: &str,
    ) -> Result<OrganizationStats, StoreError> {
        let user = self.require_user(user_id).await?;
        let pickups = self.ledger.list_by_owner(user_id.to_string()).await?;
        Ok(organization_stats(&user, &pickups))
    }

    pub async fn seller_stats(&self, seller_id: &str) -> Result<SellerStats, StoreError> {
        self.require_user(seller_id).await?;
        let products = self.catalog.list_products(ProductFilter::default()).await?;
        let orders = self.catalog.list_orders().await?;
        Ok(seller_stats(seller_id, &products, &orders))
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, StoreError> {
        let users = self.registry.list_users(UserFilter::default()).await?;
        let pickups = self.ledger.export_pickups().await?;
        let products = self.catalog.list_products(ProductFilter::default()).await?;
        let orders = self.catalog.list_orders().await?;
        Ok(admin_stats(&users, &pickups, &products, &orders))
    }

    async fn require_user(&self, user_id: &str) -> Result<User, StoreError> {
        let user = self
            .registry
            .get_user(user_id.to_string())
            .await?
            .ok_or_else(|| RegistryError::NotFound(user_id.to_string()))?;
        Ok(user)
    }
}
