use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::clients::{CatalogClient, RegistryClient};
use crate::config::Pricing;
use crate::domain::{
    Order, OrderStatus, Product, ProductCreate, ProductFilter, ProductStatus,
};
use crate::error::CatalogError;
use crate::messages::{CatalogRequest, ServiceResponse};
use crate::services::registry::next_free_id;
use crate::services::send_error;

/// Marketplace catalog actor. Owns products and orders in one mailbox: a
/// listing's sold-flip and the order insert happen in the same turn, so a
/// product is never sold-and-orderless or ordered-and-still-active.
pub struct CatalogService {
    receiver: mpsc::Receiver<CatalogRequest>,
    products: HashMap<String, Product>,
    orders: HashMap<String, Order>,
    next_product_id: u64,
    next_order_id: u64,
    registry: RegistryClient,
    pricing: Pricing,
}

impl CatalogService {
    pub fn new(
        buffer_size: usize,
        registry: RegistryClient,
        pricing: Pricing,
    ) -> (Self, CatalogClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            products: HashMap::new(),
            orders: HashMap::new(),
            next_product_id: 1,
            next_order_id: 1,
            registry,
            pricing,
        };
        let client = CatalogClient::new(sender);
        (service, client)
    }

    #[instrument(name = "catalog_service", skip(self))]
    pub async fn run(mut self) {
        info!("CatalogService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CatalogRequest::AddProduct {
                    listing,
                    respond_to,
                } => {
                    self.handle_add_product(listing, respond_to).await;
                }
                CatalogRequest::GetProduct { id, respond_to } => {
                    debug!("Processing get_product request");
                    let _ = respond_to.send(Ok(self.products.get(&id).cloned()));
                }
                CatalogRequest::ListProducts { filter, respond_to } => {
                    self.handle_list_products(filter, respond_to);
                }
                CatalogRequest::RecordView { id, respond_to } => {
                    self.handle_bump(id, respond_to, |product| {
                        product.views += 1;
                        product.views
                    });
                }
                CatalogRequest::LikeProduct { id, respond_to } => {
                    self.handle_bump(id, respond_to, |product| {
                        product.likes += 1;
                        product.likes
                    });
                }
                CatalogRequest::DeactivateProduct {
                    id,
                    seller_id,
                    respond_to,
                } => {
                    self.handle_deactivate_product(id, seller_id, respond_to);
                }
                CatalogRequest::CreateOrder {
                    product_id,
                    buyer_id,
                    quantity,
                    respond_to,
                } => {
                    self.handle_create_order(product_id, buyer_id, quantity, respond_to)
                        .await;
                }
                CatalogRequest::GetOrder { id, respond_to } => {
                    debug!("Processing get_order request");
                    let _ = respond_to.send(Ok(self.orders.get(&id).cloned()));
                }
                CatalogRequest::ListOrders { respond_to } => {
                    let mut orders: Vec<Order> = self.orders.values().cloned().collect();
                    orders.sort_by(|a, b| a.id.cmp(&b.id));
                    debug!(order_count = orders.len(), "Listed orders");
                    let _ = respond_to.send(Ok(orders));
                }
                CatalogRequest::AdvanceOrder {
                    id,
                    actor_id,
                    next,
                    respond_to,
                } => {
                    self.handle_advance_order(id, actor_id, next, respond_to);
                }
                CatalogRequest::ExportCatalog { respond_to } => {
                    let mut products: Vec<Product> = self.products.values().cloned().collect();
                    products.sort_by(|a, b| a.id.cmp(&b.id));
                    let mut orders: Vec<Order> = self.orders.values().cloned().collect();
                    orders.sort_by(|a, b| a.id.cmp(&b.id));
                    let _ = respond_to.send(Ok((products, orders)));
                }
                CatalogRequest::ImportCatalog {
                    products,
                    orders,
                    respond_to,
                } => {
                    self.handle_import_catalog(products, orders, respond_to);
                }
                CatalogRequest::Shutdown => {
                    info!("CatalogService shutting down");
                    break;
                }
                #[cfg(test)]
                CatalogRequest::GetProductCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.products.len()));
                }
            }
        }

        info!("CatalogService stopped");
    }

    #[instrument(
        fields(seller_id = %listing.seller_id, title = %listing.title, price = %listing.price),
        skip(self, listing, respond_to)
    )]
    async fn handle_add_product(
        &mut self,
        listing: ProductCreate,
        respond_to: ServiceResponse<Product, CatalogError>,
    ) {
        debug!("Processing add_product request");

        if listing.title.trim().is_empty() {
            error!("Validation failed: empty title");
            send_error!(
                respond_to,
                CatalogError::Validation("Title required".to_string())
            );
        }
        if listing.price <= 0 {
            error!("Validation failed: non-positive price");
            send_error!(
                respond_to,
                CatalogError::Validation("Price must be positive".to_string())
            );
        }

        match self.registry.get_user(listing.seller_id.clone()).await {
            Ok(Some(seller)) => debug!(seller_name = %seller.name, "Seller validation successful"),
            Ok(None) => {
                error!("Seller not found");
                send_error!(respond_to, CatalogError::UserNotFound(listing.seller_id));
            }
            Err(e) => {
                error!(error = %e, "Seller validation failed");
                send_error!(respond_to, CatalogError::from(e));
            }
        }

        let id = format!("product_{}", self.next_product_id);
        self.next_product_id += 1;

        let product = Product {
            id: id.clone(),
            seller_id: listing.seller_id,
            title: listing.title,
            price: listing.price,
            category: listing.category,
            status: ProductStatus::Active,
            views: 0,
            likes: 0,
            created_at: Utc::now(),
        };
        self.products.insert(id.clone(), product.clone());

        info!(product_id = %id, "Product listed");
        let _ = respond_to.send(Ok(product));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_list_products(
        &self,
        filter: ProductFilter,
        respond_to: ServiceResponse<Vec<Product>, CatalogError>,
    ) {
        debug!("Processing list_products request");

        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));

        info!(product_count = products.len(), "Listed products");
        let _ = respond_to.send(Ok(products));
    }

    fn handle_bump(
        &mut self,
        id: String,
        respond_to: ServiceResponse<u32, CatalogError>,
        bump: impl FnOnce(&mut Product) -> u32,
    ) {
        let result = match self.products.get_mut(&id) {
            Some(product) => Ok(bump(product)),
            None => Err(CatalogError::ProductNotFound(id)),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(product_id = %id, seller_id = %seller_id), skip(self, respond_to))]
    fn handle_deactivate_product(
        &mut self,
        id: String,
        seller_id: String,
        respond_to: ServiceResponse<Product, CatalogError>,
    ) {
        debug!("Processing deactivate_product request");

        let product = match self.products.get_mut(&id) {
            Some(product) => product,
            None => {
                error!("Product not found");
                send_error!(respond_to, CatalogError::ProductNotFound(id));
            }
        };
        if product.seller_id != seller_id {
            error!("Deactivation attempted by non-seller");
            send_error!(
                respond_to,
                CatalogError::Unauthorized(format!(
                    "Only the seller may deactivate product {}",
                    id
                ))
            );
        }
        if product.status != ProductStatus::Active {
            error!(status = %product.status, "Product is not active");
            send_error!(
                respond_to,
                CatalogError::InvalidProductState(product.status)
            );
        }

        product.status = ProductStatus::Inactive;
        info!("Product deactivated");
        let _ = respond_to.send(Ok(product.clone()));
    }

    /// Order creation and the product's sold-flip are one atomic step. All
    /// fallible checks run first; the two mutations follow together.
    #[instrument(
        fields(product_id = %product_id, buyer_id = %buyer_id),
        skip(self, respond_to)
    )]
    async fn handle_create_order(
        &mut self,
        product_id: String,
        buyer_id: String,
        quantity: u32,
        respond_to: ServiceResponse<Order, CatalogError>,
    ) {
        debug!("Processing create_order request");

        if quantity == 0 {
            error!("Validation failed: zero quantity");
            send_error!(
                respond_to,
                CatalogError::Validation("Quantity must be at least 1".to_string())
            );
        }

        let (price, seller_id, status) = match self.products.get(&product_id) {
            Some(product) => (product.price, product.seller_id.clone(), product.status),
            None => {
                error!("Product not found");
                send_error!(respond_to, CatalogError::ProductNotFound(product_id));
            }
        };
        if status != ProductStatus::Active {
            error!(%status, "Product is not active");
            send_error!(respond_to, CatalogError::InvalidProductState(status));
        }
        if buyer_id == seller_id {
            error!("Buyer is the seller");
            send_error!(
                respond_to,
                CatalogError::Validation("Sellers cannot order their own listing".to_string())
            );
        }

        match self.registry.get_user(buyer_id.clone()).await {
            Ok(Some(buyer)) => debug!(buyer_name = %buyer.name, "Buyer validation successful"),
            Ok(None) => {
                error!("Buyer not found");
                send_error!(respond_to, CatalogError::UserNotFound(buyer_id));
            }
            Err(e) => {
                error!(error = %e, "Buyer validation failed");
                send_error!(respond_to, CatalogError::from(e));
            }
        }

        let total_amount = price * i64::from(quantity);
        let platform_fee = self.pricing.platform_fee(total_amount);
        let seller_amount = total_amount - platform_fee;

        let id = format!("order_{}", self.next_order_id);
        self.next_order_id += 1;

        let order = Order {
            id: id.clone(),
            buyer_id,
            seller_id,
            product_id: product_id.clone(),
            quantity,
            total_amount,
            platform_fee,
            seller_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };

        // Same mailbox turn: no window where the product is sold and
        // orderless, or ordered and still active.
        if let Some(product) = self.products.get_mut(&product_id) {
            product.status = ProductStatus::Sold;
        }
        self.orders.insert(id.clone(), order.clone());

        info!(order_id = %id, total_amount, platform_fee, seller_amount, "Order created");
        let _ = respond_to.send(Ok(order));
    }

    #[instrument(fields(order_id = %id, actor_id = %actor_id, next = %next), skip(self, respond_to))]
    fn handle_advance_order(
        &mut self,
        id: String,
        actor_id: String,
        next: OrderStatus,
        respond_to: ServiceResponse<Order, CatalogError>,
    ) {
        debug!("Processing advance_order request");

        let order = match self.orders.get_mut(&id) {
            Some(order) => order,
            None => {
                error!("Order not found");
                send_error!(respond_to, CatalogError::OrderNotFound(id));
            }
        };
        if actor_id != order.buyer_id && actor_id != order.seller_id {
            error!("Advancement attempted by a third party");
            send_error!(
                respond_to,
                CatalogError::Unauthorized(format!(
                    "Only the buyer or seller may update order {}",
                    id
                ))
            );
        }
        if !order.status.can_transition_to(next) {
            error!(from = %order.status, "Illegal order transition");
            send_error!(
                respond_to,
                CatalogError::InvalidOrderTransition {
                    from: order.status,
                    to: next,
                }
            );
        }

        order.status = next;
        info!("Order status advanced");
        let _ = respond_to.send(Ok(order.clone()));
    }

    #[instrument(
        fields(product_count = products.len(), order_count = orders.len()),
        skip(self, products, orders, respond_to)
    )]
    fn handle_import_catalog(
        &mut self,
        products: Vec<Product>,
        orders: Vec<Order>,
        respond_to: ServiceResponse<(), CatalogError>,
    ) {
        debug!("Processing import_catalog request");

        self.products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        self.orders = orders.into_iter().map(|order| (order.id.clone(), order)).collect();
        self.next_product_id = next_free_id(self.products.keys());
        self.next_order_id = next_free_id(self.orders.keys());

        info!(
            product_count = self.products.len(),
            order_count = self.orders.len(),
            "Catalog collections imported"
        );
        let _ = respond_to.send(Ok(()));
    }
}
