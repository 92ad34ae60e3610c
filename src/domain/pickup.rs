use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Amount;

/// Waste category of a pickup job. Determines the per-kg collection rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WasteType {
    Plastic,
    Paper,
    Metal,
    Glass,
    EWaste,
    Organic,
}

impl std::fmt::Display for WasteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WasteType::Plastic => write!(f, "plastic"),
            WasteType::Paper => write!(f, "paper"),
            WasteType::Metal => write!(f, "metal"),
            WasteType::Glass => write!(f, "glass"),
            WasteType::EWaste => write!(f, "e-waste"),
            WasteType::Organic => write!(f, "organic"),
        }
    }
}

/// Lifecycle state of a pickup job.
///
/// Legal transitions: pending → assigned → completed, or pending → cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

impl std::fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickupStatus::Pending => write!(f, "pending"),
            PickupStatus::Assigned => write!(f, "assigned"),
            PickupStatus::Completed => write!(f, "completed"),
            PickupStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A waste-collection job posted by an end-user and fulfilled by a collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub id: String,
    pub owner_id: String,
    pub waste_type: WasteType,
    pub quantity_kg: u32,
    pub address: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: PickupStatus,
    /// Set exactly once, when the job is accepted. Present iff status is
    /// assigned or completed.
    pub collector_id: Option<String>,
    /// Derived at creation: quantity × per-kg rate for the waste type.
    pub estimated_value: Amount,
    /// Derived at creation: reward credited to the owner on completion.
    pub green_coins_award: i64,
    /// Price actually paid, set at completion. Defaults to `estimated_value`.
    pub actual_price: Option<Amount>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for posting a new pickup job.
#[derive(Debug, Clone)]
pub struct PickupCreate {
    pub owner_id: String,
    pub waste_type: WasteType,
    pub quantity_kg: u32,
    pub address: String,
    pub scheduled_for: DateTime<Utc>,
}

impl PickupCreate {
    pub fn new(
        owner_id: impl Into<String>,
        waste_type: WasteType,
        quantity_kg: u32,
        address: impl Into<String>,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            waste_type,
            quantity_kg,
            address: address.into(),
            scheduled_for,
        }
    }
}
