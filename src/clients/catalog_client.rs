use tokio::sync::mpsc;

use crate::clients::{client_method, client_shutdown};
use crate::domain::{Order, OrderStatus, Product, ProductCreate, ProductFilter};
use crate::error::CatalogError;
use crate::messages::CatalogRequest;

/// Client for the marketplace catalog actor.
#[derive(Clone)]
pub struct CatalogClient {
    sender: mpsc::Sender<CatalogRequest>,
}

impl CatalogClient {
    pub fn new(sender: mpsc::Sender<CatalogRequest>) -> Self {
        Self { sender }
    }
}

client_method!(CatalogClient => fn add_product(listing: ProductCreate) -> Product as CatalogRequest::AddProduct, Error = CatalogError);
client_method!(CatalogClient => fn get_product(id: String) -> Option<Product> as CatalogRequest::GetProduct, Error = CatalogError);
client_method!(CatalogClient => fn list_products(filter: ProductFilter) -> Vec<Product> as CatalogRequest::ListProducts, Error = CatalogError);
client_method!(CatalogClient => fn record_view(id: String) -> u32 as CatalogRequest::RecordView, Error = CatalogError);
client_method!(CatalogClient => fn like_product(id: String) -> u32 as CatalogRequest::LikeProduct, Error = CatalogError);
client_method!(CatalogClient => fn deactivate_product(id: String, seller_id: String) -> Product as CatalogRequest::DeactivateProduct, Error = CatalogError);
client_method!(CatalogClient => fn create_order(product_id: String, buyer_id: String, quantity: u32) -> Order as CatalogRequest::CreateOrder, Error = CatalogError);
client_method!(CatalogClient => fn get_order(id: String) -> Option<Order> as CatalogRequest::GetOrder, Error = CatalogError);
client_method!(CatalogClient => fn list_orders() -> Vec<Order> as CatalogRequest::ListOrders, Error = CatalogError);
client_method!(CatalogClient => fn advance_order(id: String, actor_id: String, next: OrderStatus) -> Order as CatalogRequest::AdvanceOrder, Error = CatalogError);
client_method!(CatalogClient => fn export_catalog() -> (Vec<Product>, Vec<Order>) as CatalogRequest::ExportCatalog, Error = CatalogError);
client_method!(CatalogClient => fn import_catalog(products: Vec<Product>, orders: Vec<Order>) -> () as CatalogRequest::ImportCatalog, Error = CatalogError);
client_shutdown!(CatalogClient => CatalogRequest);

// Test-only method for internal state inspection
#[cfg(test)]
client_method!(CatalogClient => fn get_product_count() -> usize as CatalogRequest::GetProductCount, Error = CatalogError);
