use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Integer currency amount in whole rupees.
pub type Amount = i64;

/// Platform role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    EndUser,
    Collector,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::EndUser => write!(f, "end-user"),
            Role::Collector => write!(f, "collector"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// End-user subtype. Required iff the role is [`Role::EndUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserKind {
    Generator,
    Organization,
    DiySeller,
}

/// A registered account: household generator, bulk organization, DIY seller,
/// collector, or admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Present iff `role == Role::EndUser`.
    pub kind: Option<UserKind>,
    /// Reward balance. Never goes below zero.
    pub green_coins: i64,
    /// Cumulative engagement score.
    pub eco_score: u32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for registering a new account.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub kind: Option<UserKind>,
}

impl UserCreate {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        kind: Option<UserKind>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            kind,
        }
    }
}

/// Filter for user listings. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub kind: Option<UserKind>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if user.kind != Some(kind) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, kind: Option<UserKind>) -> User {
        User {
            id: "user_1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role,
            kind,
            green_coins: 0,
            eco_score: 0,
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn filter_matches_role_and_kind() {
        let generator = user(Role::EndUser, Some(UserKind::Generator));
        let collector = user(Role::Collector, None);

        let by_role = UserFilter {
            role: Some(Role::EndUser),
            kind: None,
        };
        assert!(by_role.matches(&generator));
        assert!(!by_role.matches(&collector));

        let by_kind = UserFilter {
            role: None,
            kind: Some(UserKind::Organization),
        };
        assert!(!by_kind.matches(&generator));

        assert!(UserFilter::default().matches(&collector));
    }
}
