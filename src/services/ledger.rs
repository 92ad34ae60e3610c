use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::clients::{LedgerClient, RegistryClient};
use crate::config::Pricing;
use crate::domain::{Amount, PickupCreate, PickupRequest, PickupStatus, Role};
use crate::error::LedgerError;
use crate::messages::{LedgerRequest, ServiceResponse};
use crate::services::registry::next_free_id;
use crate::services::send_error;

/// Request-ledger actor. Owns every pickup job and enforces the lifecycle
/// pending → assigned → completed (or pending → cancelled).
///
/// Each message is handled to completion before the next is admitted, so the
/// read-check-set in [`handle_accept_pickup`](Self::handle_accept_pickup) is
/// atomic: of two racing accepts, exactly one observes pending.
pub struct LedgerService {
    receiver: mpsc::Receiver<LedgerRequest>,
    pickups: HashMap<String, PickupRequest>,
    next_id: u64,
    registry: RegistryClient,
    pricing: Pricing,
}

impl LedgerService {
    pub fn new(
        buffer_size: usize,
        registry: RegistryClient,
        pricing: Pricing,
    ) -> (Self, LedgerClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            pickups: HashMap::new(),
            next_id: 1,
            registry,
            pricing,
        };
        let client = LedgerClient::new(sender);
        (service, client)
    }

    #[instrument(name = "ledger_service", skip(self))]
    pub async fn run(mut self) {
        info!("LedgerService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                LedgerRequest::CreatePickup {
                    request,
                    respond_to,
                } => {
                    self.handle_create_pickup(request, respond_to).await;
                }
                LedgerRequest::GetPickup { id, respond_to } => {
                    self.handle_get_pickup(id, respond_to);
                }
                LedgerRequest::AcceptPickup {
                    id,
                    collector_id,
                    respond_to,
                } => {
                    self.handle_accept_pickup(id, collector_id, respond_to).await;
                }
                LedgerRequest::CompletePickup {
                    id,
                    collector_id,
                    actual_price,
                    respond_to,
                } => {
                    self.handle_complete_pickup(id, collector_id, actual_price, respond_to)
                        .await;
                }
                LedgerRequest::CancelPickup {
                    id,
                    requested_by,
                    respond_to,
                } => {
                    self.handle_cancel_pickup(id, requested_by, respond_to);
                }
                LedgerRequest::ListPending { respond_to } => {
                    self.handle_list(
                        |pickup| pickup.status == PickupStatus::Pending,
                        respond_to,
                    );
                }
                LedgerRequest::ListByOwner {
                    owner_id,
                    respond_to,
                } => {
                    self.handle_list(|pickup| pickup.owner_id == owner_id, respond_to);
                }
                LedgerRequest::ListByCollector {
                    collector_id,
                    respond_to,
                } => {
                    self.handle_list(
                        |pickup| pickup.collector_id.as_deref() == Some(collector_id.as_str()),
                        respond_to,
                    );
                }
                LedgerRequest::ExportPickups { respond_to } => {
                    self.handle_list(|_| true, respond_to);
                }
                LedgerRequest::ImportPickups {
                    pickups,
                    respond_to,
                } => {
                    self.handle_import_pickups(pickups, respond_to);
                }
                LedgerRequest::Shutdown => {
                    info!("LedgerService shutting down");
                    break;
                }
                #[cfg(test)]
                LedgerRequest::GetPickupCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.pickups.len()));
                }
            }
        }

        info!("LedgerService stopped");
    }

    #[instrument(
        fields(owner_id = %request.owner_id, waste_type = %request.waste_type, quantity_kg = %request.quantity_kg),
        skip(self, request, respond_to)
    )]
    async fn handle_create_pickup(
        &mut self,
        request: PickupCreate,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    ) {
        debug!("Processing create_pickup request");

        if request.quantity_kg == 0 {
            error!("Validation failed: zero quantity");
            send_error!(
                respond_to,
                LedgerError::Validation("Quantity must be positive".to_string())
            );
        }
        if request.address.trim().is_empty() {
            error!("Validation failed: empty address");
            send_error!(
                respond_to,
                LedgerError::Validation("Address required".to_string())
            );
        }

        // Referential check via the registry
        match self.registry.get_user(request.owner_id.clone()).await {
            Ok(Some(owner)) if owner.role == Role::EndUser => {
                debug!(owner_name = %owner.name, "Owner validation successful");
            }
            Ok(Some(owner)) => {
                error!(role = %owner.role, "Owner is not an end-user");
                send_error!(
                    respond_to,
                    LedgerError::Validation(format!(
                        "Owner {} must be an end-user, was {}",
                        owner.id, owner.role
                    ))
                );
            }
            Ok(None) => {
                error!("Owner not found");
                send_error!(respond_to, LedgerError::UserNotFound(request.owner_id));
            }
            Err(e) => {
                error!(error = %e, "Owner validation failed");
                send_error!(respond_to, LedgerError::from(e));
            }
        }

        let estimated_value = self
            .pricing
            .estimated_value(request.waste_type, request.quantity_kg);
        let green_coins_award = self.pricing.green_coins_award(estimated_value);

        let id = format!("pickup_{}", self.next_id);
        self.next_id += 1;

        let pickup = PickupRequest {
            id: id.clone(),
            owner_id: request.owner_id,
            waste_type: request.waste_type,
            quantity_kg: request.quantity_kg,
            address: request.address,
            scheduled_for: request.scheduled_for,
            status: PickupStatus::Pending,
            collector_id: None,
            estimated_value,
            green_coins_award,
            actual_price: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        self.pickups.insert(id.clone(), pickup.clone());

        info!(pickup_id = %id, estimated_value, green_coins_award, "Pickup request created");
        let _ = respond_to.send(Ok(pickup));
    }

    #[instrument(fields(pickup_id = %id), skip(self, respond_to))]
    fn handle_get_pickup(
        &self,
        id: String,
        respond_to: ServiceResponse<Option<PickupRequest>, LedgerError>,
    ) {
        debug!("Processing get_pickup request");
        let _ = respond_to.send(Ok(self.pickups.get(&id).cloned()));
    }

    /// Exactly-once assignment: status is checked and set within one mailbox
    /// turn, so a second accept for the same id observes `Assigned` and fails.
    #[instrument(fields(pickup_id = %id, collector_id = %collector_id), skip(self, respond_to))]
    async fn handle_accept_pickup(
        &mut self,
        id: String,
        collector_id: String,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    ) {
        debug!("Processing accept_pickup request");

        let status = match self.pickups.get(&id) {
            Some(pickup) => pickup.status,
            None => {
                error!("Pickup not found");
                send_error!(respond_to, LedgerError::NotFound(id));
            }
        };
        if status != PickupStatus::Pending {
            error!(%status, "Pickup is not pending");
            send_error!(
                respond_to,
                LedgerError::InvalidState {
                    expected: PickupStatus::Pending,
                    actual: status,
                }
            );
        }

        match self.registry.get_user(collector_id.clone()).await {
            Ok(Some(user)) if user.role == Role::Collector => {
                debug!(collector_name = %user.name, "Collector validation successful");
            }
            Ok(Some(user)) => {
                error!(role = %user.role, "Accepting user is not a collector");
                send_error!(
                    respond_to,
                    LedgerError::Unauthorized(format!(
                        "Only collectors may accept pickups, {} is {}",
                        user.id, user.role
                    ))
                );
            }
            Ok(None) => {
                error!("Collector not found");
                send_error!(respond_to, LedgerError::UserNotFound(collector_id));
            }
            Err(e) => {
                error!(error = %e, "Collector validation failed");
                send_error!(respond_to, LedgerError::from(e));
            }
        }

        let result = match self.pickups.get_mut(&id) {
            Some(pickup) => {
                pickup.status = PickupStatus::Assigned;
                pickup.collector_id = Some(collector_id);
                info!("Pickup assigned");
                Ok(pickup.clone())
            }
            None => Err(LedgerError::NotFound(id)),
        };
        let _ = respond_to.send(result);
    }

    /// All fallible steps (state checks, reward crediting through the
    /// registry) precede the record mutation, so a failure leaves the pickup
    /// untouched.
    #[instrument(fields(pickup_id = %id, collector_id = %collector_id), skip(self, respond_to))]
    async fn handle_complete_pickup(
        &mut self,
        id: String,
        collector_id: String,
        actual_price: Option<Amount>,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    ) {
        debug!("Processing complete_pickup request");

        let (status, assigned_to, owner_id, award, quantity_kg) = match self.pickups.get(&id) {
            Some(pickup) => (
                pickup.status,
                pickup.collector_id.clone(),
                pickup.owner_id.clone(),
                pickup.green_coins_award,
                pickup.quantity_kg,
            ),
            None => {
                error!("Pickup not found");
                send_error!(respond_to, LedgerError::NotFound(id));
            }
        };
        if status != PickupStatus::Assigned {
            error!(%status, "Pickup is not assigned");
            send_error!(
                respond_to,
                LedgerError::InvalidState {
                    expected: PickupStatus::Assigned,
                    actual: status,
                }
            );
        }
        if assigned_to.as_deref() != Some(collector_id.as_str()) {
            error!("Completion attempted by a different collector");
            send_error!(
                respond_to,
                LedgerError::Unauthorized(format!(
                    "Pickup {} is not assigned to {}",
                    id, collector_id
                ))
            );
        }
        if let Some(price) = actual_price {
            if price <= 0 {
                error!(price, "Validation failed: non-positive actual price");
                send_error!(
                    respond_to,
                    LedgerError::Validation("Actual price must be positive".to_string())
                );
            }
        }

        // Credit the owner before touching the record
        if let Err(e) = self
            .registry
            .adjust_green_coins(owner_id.clone(), award, format!("Reward for pickup {}", id))
            .await
        {
            error!(error = %e, "Reward crediting failed");
            send_error!(respond_to, LedgerError::from(e));
        }
        if let Err(e) = self.registry.add_eco_score(owner_id, quantity_kg).await {
            error!(error = %e, "Eco score accrual failed");
            send_error!(respond_to, LedgerError::from(e));
        }

        let result = match self.pickups.get_mut(&id) {
            Some(pickup) => {
                pickup.status = PickupStatus::Completed;
                pickup.completed_at = Some(Utc::now());
                pickup.actual_price = Some(actual_price.unwrap_or(pickup.estimated_value));
                info!(actual_price = pickup.actual_price, "Pickup completed");
                Ok(pickup.clone())
            }
            None => Err(LedgerError::NotFound(id)),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(pickup_id = %id, requested_by = %requested_by), skip(self, respond_to))]
    fn handle_cancel_pickup(
        &mut self,
        id: String,
        requested_by: String,
        respond_to: ServiceResponse<PickupRequest, LedgerError>,
    ) {
        debug!("Processing cancel_pickup request");

        let pickup = match self.pickups.get_mut(&id) {
            Some(pickup) => pickup,
            None => {
                error!("Pickup not found");
                send_error!(respond_to, LedgerError::NotFound(id));
            }
        };
        if pickup.owner_id != requested_by {
            error!("Cancellation attempted by non-owner");
            send_error!(
                respond_to,
                LedgerError::Unauthorized(format!(
                    "Only the owner may cancel pickup {}",
                    id
                ))
            );
        }
        if pickup.status != PickupStatus::Pending {
            error!(status = %pickup.status, "Pickup is not pending");
            send_error!(
                respond_to,
                LedgerError::InvalidState {
                    expected: PickupStatus::Pending,
                    actual: pickup.status,
                }
            );
        }

        pickup.status = PickupStatus::Cancelled;
        info!("Pickup cancelled");
        let _ = respond_to.send(Ok(pickup.clone()));
    }

    fn handle_list(
        &self,
        keep: impl Fn(&PickupRequest) -> bool,
        respond_to: ServiceResponse<Vec<PickupRequest>, LedgerError>,
    ) {
        let mut pickups: Vec<PickupRequest> =
            self.pickups.values().filter(|p| keep(p)).cloned().collect();
        pickups.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(pickup_count = pickups.len(), "Listed pickups");
        let _ = respond_to.send(Ok(pickups));
    }

    #[instrument(fields(pickup_count = pickups.len()), skip(self, pickups, respond_to))]
    fn handle_import_pickups(
        &mut self,
        pickups: Vec<PickupRequest>,
        respond_to: ServiceResponse<(), LedgerError>,
    ) {
        debug!("Processing import_pickups request");

        self.pickups = pickups
            .into_iter()
            .map(|pickup| (pickup.id.clone(), pickup))
            .collect();
        self.next_id = next_free_id(self.pickups.keys());

        info!(pickup_count = self.pickups.len(), "Pickup collection imported");
        let _ = respond_to.send(Ok(()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserCreate, UserKind, WasteType};
    use crate::services::registry::RegistryService;

    async fn setup() -> (RegistryClient, LedgerClient) {
        let (registry_service, registry) = RegistryService::new(10);
        tokio::spawn(registry_service.run());
        let (ledger_service, ledger) =
            LedgerService::new(10, registry.clone(), Pricing::default());
        tokio::spawn(ledger_service.run());
        (registry, ledger)
    }

    async fn end_user(registry: &RegistryClient) -> String {
        registry
            .create_user(UserCreate::new(
                "Asha",
                "asha@example.com",
                Role::EndUser,
                Some(UserKind::Generator),
            ))
            .await
            .unwrap()
            .id
    }

    async fn collector(registry: &RegistryClient) -> String {
        registry
            .create_user(UserCreate::new(
                "Ravi",
                "ravi@example.com",
                Role::Collector,
                None,
            ))
            .await
            .unwrap()
            .id
    }

    fn plastic_pickup(owner_id: &str) -> PickupCreate {
        PickupCreate::new(
            owner_id,
            WasteType::Plastic,
            5,
            "12 Lakeview Road, Indiranagar",
            Utc::now() + chrono::Duration::hours(48),
        )
    }

    #[tokio::test]
    async fn create_derives_value_and_award() {
        let (registry, ledger) = setup().await;
        let owner = end_user(&registry).await;

        let pickup = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();

        assert_eq!(pickup.status, PickupStatus::Pending);
        assert_eq!(pickup.estimated_value, 75);
        assert_eq!(pickup.green_coins_award, 38);
        assert!(pickup.collector_id.is_none());
    }

    #[tokio::test]
    async fn create_rejects_non_end_user_owner() {
        let (registry, ledger) = setup().await;
        let collector_id = collector(&registry).await;

        let err = ledger
            .create_pickup(plastic_pickup(&collector_id))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = ledger
            .create_pickup(plastic_pickup("user_99"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn accept_requires_pending_and_collector_role() {
        let (registry, ledger) = setup().await;
        let owner = end_user(&registry).await;
        let collector_id = collector(&registry).await;
        let pickup = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();

        let err = ledger
            .accept_pickup(pickup.id.clone(), owner.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        let accepted = ledger
            .accept_pickup(pickup.id.clone(), collector_id.clone())
            .await
            .unwrap();
        assert_eq!(accepted.status, PickupStatus::Assigned);
        assert_eq!(accepted.collector_id, Some(collector_id.clone()));

        let err = ledger
            .accept_pickup(pickup.id, collector_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn complete_credits_owner_and_defaults_price() {
        let (registry, ledger) = setup().await;
        let owner = end_user(&registry).await;
        let collector_id = collector(&registry).await;
        let pickup = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();
        ledger
            .accept_pickup(pickup.id.clone(), collector_id.clone())
            .await
            .unwrap();

        let completed = ledger
            .complete_pickup(pickup.id, collector_id, None)
            .await
            .unwrap();

        assert_eq!(completed.status, PickupStatus::Completed);
        assert_eq!(completed.actual_price, Some(75));
        assert!(completed.completed_at.is_some());

        let owner = registry.get_user(owner).await.unwrap().unwrap();
        assert_eq!(owner.green_coins, 38);
        assert_eq!(owner.eco_score, 5);
    }

    #[tokio::test]
    async fn complete_is_restricted_to_the_assigned_collector() {
        let (registry, ledger) = setup().await;
        let owner = end_user(&registry).await;
        let assigned = collector(&registry).await;
        let other = collector(&registry).await;
        let pickup = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();
        ledger
            .accept_pickup(pickup.id.clone(), assigned.clone())
            .await
            .unwrap();

        let err = ledger
            .complete_pickup(pickup.id.clone(), other, Some(80))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        // Record untouched, still completable by the right collector
        let completed = ledger
            .complete_pickup(pickup.id, assigned, Some(80))
            .await
            .unwrap();
        assert_eq!(completed.actual_price, Some(80));
    }

    #[tokio::test]
    async fn cancel_only_while_pending_and_only_by_owner() {
        let (registry, ledger) = setup().await;
        let owner = end_user(&registry).await;
        let collector_id = collector(&registry).await;
        let pickup = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();

        let err = ledger
            .cancel_pickup(pickup.id.clone(), collector_id.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        ledger
            .accept_pickup(pickup.id.clone(), collector_id)
            .await
            .unwrap();

        let err = ledger
            .cancel_pickup(pickup.id.clone(), owner.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));

        let unchanged = ledger.get_pickup(pickup.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, PickupStatus::Assigned);

        let second = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();
        let cancelled = ledger.cancel_pickup(second.id, owner).await.unwrap();
        assert_eq!(cancelled.status, PickupStatus::Cancelled);
    }

    #[tokio::test]
    async fn listings_are_filtered_and_id_ordered() {
        let (registry, ledger) = setup().await;
        let owner = end_user(&registry).await;
        let collector_id = collector(&registry).await;

        let first = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();
        let second = ledger.create_pickup(plastic_pickup(&owner)).await.unwrap();
        ledger
            .accept_pickup(first.id.clone(), collector_id.clone())
            .await
            .unwrap();

        let pending = ledger.list_pending().await.unwrap();
        assert_eq!(
            pending.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec![second.id.as_str()]
        );

        let by_owner = ledger.list_by_owner(owner).await.unwrap();
        assert_eq!(by_owner.len(), 2);
        assert_eq!(by_owner[0].id, first.id);

        let by_collector = ledger.list_by_collector(collector_id).await.unwrap();
        assert_eq!(by_collector.len(), 1);
        assert_eq!(by_collector[0].id, first.id);

        assert_eq!(ledger.get_pickup_count().await.unwrap(), 2);
    }
}
