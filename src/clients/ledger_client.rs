use tokio::sync::mpsc;

use crate::clients::{client_method, client_shutdown};
use crate::domain::{Amount, PickupCreate, PickupRequest};
use crate::error::LedgerError;
use crate::messages::LedgerRequest;

/// Client for the pickup-request ledger actor.
#[derive(Clone)]
pub struct LedgerClient {
    sender: mpsc::Sender<LedgerRequest>,
}

impl LedgerClient {
    pub fn new(sender: mpsc::Sender<LedgerRequest>) -> Self {
        Self { sender }
    }
}

client_method!(LedgerClient => fn create_pickup(request: PickupCreate) -> PickupRequest as LedgerRequest::CreatePickup, Error = LedgerError);
client_method!(LedgerClient => fn get_pickup(id: String) -> Option<PickupRequest> as LedgerRequest::GetPickup, Error = LedgerError);
client_method!(LedgerClient => fn accept_pickup(id: String, collector_id: String) -> PickupRequest as LedgerRequest::AcceptPickup, Error = LedgerError);
client_method!(LedgerClient => fn complete_pickup(id: String, collector_id: String, actual_price: Option<Amount>) -> PickupRequest as LedgerRequest::CompletePickup, Error = LedgerError);
client_method!(LedgerClient => fn cancel_pickup(id: String, requested_by: String) -> PickupRequest as LedgerRequest::CancelPickup, Error = LedgerError);
client_method!(LedgerClient => fn list_pending() -> Vec<PickupRequest> as LedgerRequest::ListPending, Error = LedgerError);
client_method!(LedgerClient => fn list_by_owner(owner_id: String) -> Vec<PickupRequest> as LedgerRequest::ListByOwner, Error = LedgerError);
client_method!(LedgerClient => fn list_by_collector(collector_id: String) -> Vec<PickupRequest> as LedgerRequest::ListByCollector, Error = LedgerError);
client_method!(LedgerClient => fn export_pickups() -> Vec<PickupRequest> as LedgerRequest::ExportPickups, Error = LedgerError);
client_method!(LedgerClient => fn import_pickups(pickups: Vec<PickupRequest>) -> () as LedgerRequest::ImportPickups, Error = LedgerError);
client_shutdown!(LedgerClient => LedgerRequest);

// Test-only method for internal state inspection
#[cfg(test)]
client_method!(LedgerClient => fn get_pickup_count() -> usize as LedgerRequest::GetPickupCount, Error = LedgerError);
