use tokio::sync::mpsc;

use crate::clients::{client_method, client_shutdown};
use crate::domain::{User, UserCreate, UserFilter};
use crate::error::RegistryError;
use crate::messages::RegistryRequest;

/// Client for the identity registry actor.
#[derive(Clone)]
pub struct RegistryClient {
    sender: mpsc::Sender<RegistryRequest>,
}

impl RegistryClient {
    pub fn new(sender: mpsc::Sender<RegistryRequest>) -> Self {
        Self { sender }
    }
}

client_method!(RegistryClient => fn create_user(profile: UserCreate) -> User as RegistryRequest::CreateUser, Error = RegistryError);
client_method!(RegistryClient => fn get_user(id: String) -> Option<User> as RegistryRequest::GetUser, Error = RegistryError);
client_method!(RegistryClient => fn list_users(filter: UserFilter) -> Vec<User> as RegistryRequest::ListUsers, Error = RegistryError);
client_method!(RegistryClient => fn adjust_green_coins(id: String, delta: i64, reason: String) -> i64 as RegistryRequest::AdjustGreenCoins, Error = RegistryError);
client_method!(RegistryClient => fn add_eco_score(id: String, points: u32) -> u32 as RegistryRequest::AddEcoScore, Error = RegistryError);
client_method!(RegistryClient => fn set_verified(id: String, verified: bool) -> () as RegistryRequest::SetVerified, Error = RegistryError);
client_method!(RegistryClient => fn export_users() -> Vec<User> as RegistryRequest::ExportUsers, Error = RegistryError);
client_method!(RegistryClient => fn import_users(users: Vec<User>) -> () as RegistryRequest::ImportUsers, Error = RegistryError);
client_shutdown!(RegistryClient => RegistryRequest);

// Test-only method for internal state inspection
#[cfg(test)]
client_method!(RegistryClient => fn get_user_count() -> usize as RegistryRequest::GetUserCount, Error = RegistryError);
