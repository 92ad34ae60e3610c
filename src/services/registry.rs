use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::clients::RegistryClient;
use crate::domain::{Role, User, UserCreate, UserFilter};
use crate::error::RegistryError;
use crate::messages::{RegistryRequest, ServiceResponse};
use crate::services::send_error;

/// Identity registry actor. Owns all User records; every reward-balance
/// mutation in the system routes through [`RegistryRequest::AdjustGreenCoins`].
pub struct RegistryService {
    receiver: mpsc::Receiver<RegistryRequest>,
    users: HashMap<String, User>,
    next_id: u64,
}

impl RegistryService {
    pub fn new(buffer_size: usize) -> (Self, RegistryClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            users: HashMap::new(),
            next_id: 1,
        };
        let client = RegistryClient::new(sender);
        (service, client)
    }

    #[instrument(name = "registry_service", skip(self))]
    pub async fn run(mut self) {
        info!("RegistryService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RegistryRequest::CreateUser {
                    profile,
                    respond_to,
                } => {
                    self.handle_create_user(profile, respond_to);
                }
                RegistryRequest::GetUser { id, respond_to } => {
                    self.handle_get_user(id, respond_to);
                }
                RegistryRequest::ListUsers { filter, respond_to } => {
                    self.handle_list_users(filter, respond_to);
                }
                RegistryRequest::AdjustGreenCoins {
                    id,
                    delta,
                    reason,
                    respond_to,
                } => {
                    self.handle_adjust_green_coins(id, delta, reason, respond_to);
                }
                RegistryRequest::AddEcoScore {
                    id,
                    points,
                    respond_to,
                } => {
                    self.handle_add_eco_score(id, points, respond_to);
                }
                RegistryRequest::SetVerified {
                    id,
                    verified,
                    respond_to,
                } => {
                    self.handle_set_verified(id, verified, respond_to);
                }
                RegistryRequest::ExportUsers { respond_to } => {
                    let mut users: Vec<User> = self.users.values().cloned().collect();
                    users.sort_by(|a, b| a.id.cmp(&b.id));
                    let _ = respond_to.send(Ok(users));
                }
                RegistryRequest::ImportUsers { users, respond_to } => {
                    self.handle_import_users(users, respond_to);
                }
                RegistryRequest::Shutdown => {
                    info!("RegistryService shutting down");
                    break;
                }
                #[cfg(test)]
                RegistryRequest::GetUserCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.users.len()));
                }
            }
        }

        info!("RegistryService stopped");
    }

    #[instrument(fields(name = %profile.name, role = %profile.role), skip(self, profile, respond_to))]
    fn handle_create_user(
        &mut self,
        profile: UserCreate,
        respond_to: ServiceResponse<User, RegistryError>,
    ) {
        debug!("Processing create_user request");

        if profile.name.trim().is_empty() {
            error!("Validation failed: empty name");
            send_error!(
                respond_to,
                RegistryError::Validation("Name required".to_string())
            );
        }
        if profile.email.trim().is_empty() {
            error!("Validation failed: empty email");
            send_error!(
                respond_to,
                RegistryError::Validation("Email required".to_string())
            );
        }
        match (profile.role, profile.kind) {
            (Role::EndUser, None) => {
                error!("Validation failed: end-user without subtype");
                send_error!(
                    respond_to,
                    RegistryError::Validation("End-user accounts require a subtype".to_string())
                );
            }
            (Role::Collector | Role::Admin, Some(_)) => {
                error!("Validation failed: subtype on non-end-user");
                send_error!(
                    respond_to,
                    RegistryError::Validation(
                        "Subtype is only valid for end-user accounts".to_string()
                    )
                );
            }
            _ => {}
        }

        let id = format!("user_{}", self.next_id);
        self.next_id += 1;

        let now = Utc::now();
        let user = User {
            id: id.clone(),
            name: profile.name,
            email: profile.email,
            role: profile.role,
            kind: profile.kind,
            green_coins: 0,
            eco_score: 0,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id.clone(), user.clone());

        info!(user_id = %id, "User created successfully");
        let _ = respond_to.send(Ok(user));
    }

    #[instrument(fields(user_id = %id), skip(self, respond_to))]
    fn handle_get_user(&self, id: String, respond_to: ServiceResponse<Option<User>, RegistryError>) {
        debug!("Processing get_user request");

        let user = self.users.get(&id).cloned();

        match &user {
            Some(user) => debug!(user_name = %user.name, "User found"),
            None => debug!("User not found"),
        }

        let _ = respond_to.send(Ok(user));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_list_users(
        &self,
        filter: UserFilter,
        respond_to: ServiceResponse<Vec<User>, RegistryError>,
    ) {
        debug!("Processing list_users request");

        let mut users: Vec<User> = self
            .users
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));

        info!(user_count = users.len(), "Listed users");
        let _ = respond_to.send(Ok(users));
    }

    /// The sole GreenCoins mutator. Either the full delta applies or the
    /// balance is left untouched.
    #[instrument(fields(user_id = %id, reason = %reason), skip(self, respond_to))]
    fn handle_adjust_green_coins(
        &mut self,
        id: String,
        delta: i64,
        reason: String,
        respond_to: ServiceResponse<i64, RegistryError>,
    ) {
        debug!("Processing adjust_green_coins request");

        let result = match self.users.get_mut(&id) {
            Some(user) => {
                let new_balance = user.green_coins + delta;
                if new_balance < 0 {
                    error!(balance = user.green_coins, "GreenCoins balance would go negative");
                    Err(RegistryError::InsufficientBalance {
                        balance: user.green_coins,
                        delta,
                    })
                } else {
                    user.green_coins = new_balance;
                    user.updated_at = Utc::now();
                    info!(new_balance, "GreenCoins balance adjusted");
                    Ok(new_balance)
                }
            }
            None => {
                error!("User not found");
                Err(RegistryError::NotFound(id))
            }
        };

        let _ = respond_to.send(result);
    }

    #[instrument(fields(user_id = %id), skip(self, respond_to))]
    fn handle_add_eco_score(
        &mut self,
        id: String,
        points: u32,
        respond_to: ServiceResponse<u32, RegistryError>,
    ) {
        debug!("Processing add_eco_score request");

        let result = match self.users.get_mut(&id) {
            Some(user) => {
                user.eco_score += points;
                user.updated_at = Utc::now();
                info!(eco_score = user.eco_score, "Eco score accrued");
                Ok(user.eco_score)
            }
            None => {
                error!("User not found");
                Err(RegistryError::NotFound(id))
            }
        };

        let _ = respond_to.send(result);
    }

    #[instrument(fields(user_id = %id), skip(self, respond_to))]
    fn handle_set_verified(
        &mut self,
        id: String,
        verified: bool,
        respond_to: ServiceResponse<(), RegistryError>,
    ) {
        debug!("Processing set_verified request");

        let result = match self.users.get_mut(&id) {
            Some(user) => {
                user.is_verified = verified;
                user.updated_at = Utc::now();
                info!("Verification flag updated");
                Ok(())
            }
            None => {
                error!("User not found");
                Err(RegistryError::NotFound(id))
            }
        };

        let _ = respond_to.send(result);
    }

    #[instrument(fields(user_count = users.len()), skip(self, users, respond_to))]
    fn handle_import_users(
        &mut self,
        users: Vec<User>,
        respond_to: ServiceResponse<(), RegistryError>,
    ) {
        debug!("Processing import_users request");

        self.users = users.into_iter().map(|user| (user.id.clone(), user)).collect();
        self.next_id = next_free_id(self.users.keys());

        info!(user_count = self.users.len(), "User collection imported");
        let _ = respond_to.send(Ok(()));
    }
}

/// Lowest counter value that cannot collide with an existing `prefix_N` id.
pub(crate) fn next_free_id<'a>(ids: impl Iterator<Item = &'a String>) -> u64 {
    ids.filter_map(|id| id.rsplit('_').next().and_then(|n| n.parse::<u64>().ok()))
        .max()
        .map(|highest| highest + 1)
        .unwrap_or(1)
}
