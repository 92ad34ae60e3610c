use tokio::sync::oneshot;

use crate::domain::{
    Amount, Order, OrderStatus, PickupCreate, PickupRequest, Product, ProductCreate,
    ProductFilter, User, UserCreate, UserFilter,
};
use crate::error::{CatalogError, LedgerError, RegistryError};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed message enums for actor communication. Each variant includes
/// parameters and a oneshot channel for responses.

#[derive(Debug)]
pub enum RegistryRequest {
    CreateUser {
        profile: UserCreate,
        respond_to: ServiceResponse<User, RegistryError>,
    },
    GetUser {
        id: String,
        respond_to: ServiceResponse<Option<User>, RegistryError>,
    },
    ListUsers {
        filter: UserFilter,
        respond_to: ServiceResponse<Vec<User>, RegistryError>,
    },
    /// The only sanctioned mutator of a user's GreenCoins balance.
    AdjustGreenCoins {
        id: String,
        delta: i64,
        reason: String,
        respond_to: ServiceResponse<i64, RegistryError>,
    },
    AddEcoScore {
        id: String,
        points: u32,
        respond_to: ServiceResponse<u32, RegistryError>,
    },
    SetVerified {
        id: String,
        verified: bool,
        respond_to: ServiceResponse<(), RegistryError>,
    },
    ExportUsers {
        respond_to: ServiceResponse<Vec<User>, RegistryError>,
    },
    ImportUsers {
        users: Vec<User>,
        respond_to: ServiceResponse<(), RegistryError>,
    },
    Shutdown,
    #[cfg(test)]
    GetUserCount {
        respond_to: ServiceResponse<usize, RegistryError>,
    },
}

#[derive(Debug)]
pub enum LedgerRequest {
    CreatePickup {
        request: PickupCreate,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    },
    GetPickup {
        id: String,
        respond_to: ServiceResponse<Option<PickupRequest>, LedgerError>,
    },
    AcceptPickup {
        id: String,
        collector_id: String,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    },
    CompletePickup {
        id: String,
        collector_id: String,
        actual_price: Option<Amount>,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    },
    CancelPickup {
        id: String,
        requested_by: String,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    },
    ListPending {
        respond_to: ServiceResponse<Vec<PickupRequest>, LedgerError>,
    },
    ListByOwner {
        owner_id: String,
        respond_to: ServiceResponse<Vec<PickupRequest>, LedgerError>,
    },
    ListByCollector {
        collector_id: String,
        respond_to: ServiceResponse<Vec<PickupRequest>, LedgerError>,
    },
    ExportPickups {
        respond_to: ServiceResponse<Vec<PickupRequest>, LedgerError>,
    },
    ImportPickups {
        pickups: Vec<PickupRequest>,
        respond_to: ServiceResponse<(), LedgerError>,
    },
    Shutdown,
    #[cfg(test)]
    GetPickupCount {
        respond_to: ServiceResponse<usize, LedgerError>,
    },
}

#[derive(Debug)]
pub enum CatalogRequest {
    AddProduct {
        listing: ProductCreate,
        respond_to: ServiceResponse<Product, CatalogError>,
    },
    GetProduct {
        id: String,
        respond_to: ServiceResponse<Option<Product>, CatalogError>,
    },
    ListProducts {
        filter: ProductFilter,
        respond_to: ServiceResponse<Vec<Product>, CatalogError>,
    },
    RecordView {
        id: String,
        respond_to: ServiceResponse<u32, CatalogError>,
    },
    LikeProduct {
        id: String,
        respond_to: ServiceResponse<u32, CatalogError>,
    },
    DeactivateProduct {
        id: String,
        seller_id: String,
        respond_to: ServiceResponse<Product, CatalogError>,
    },
    CreateOrder {
        product_id: String,
        buyer_id: String,
        quantity: u32,
        respond_to: ServiceResponse<Order, CatalogError>,
    },
    GetOrder {
        id: String,
        respond_to: ServiceResponse<Option<Order>, CatalogError>,
    },
    ListOrders {
        respond_to: ServiceResponse<Vec<Order>, CatalogError>,
    },
    AdvanceOrder {
        id: String,
        actor_id: String,
        next: OrderStatus,
        respond_to: ServiceResponse<Order, CatalogError>,
    },
    ExportCatalog {
        respond_to: ServiceResponse<(Vec<Product>, Vec<Order>), CatalogError>,
    },
    ImportCatalog {
        products: Vec<Product>,
        orders: Vec<Order>,
        respond_to: ServiceResponse<(), CatalogError>,
    },
    Shutdown,
    #[cfg(test)]
    GetProductCount {
        respond_to: ServiceResponse<usize, CatalogError>,
    },
}
