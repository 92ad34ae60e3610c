//! Collector-facing ranking of pending pickup requests.
//!
//! Pure functions over a `list_pending()` snapshot: filtering and ordering
//! only, never mutation. Accepting a job is a separate, explicit ledger call.
//! Every ordering breaks ties by request id ascending, so results are
//! reproducible.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{PickupRequest, PickupStatus};

/// Ordering chosen by the browsing collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Jobs in the collector's service area first.
    Distance,
    /// Highest estimated value first.
    Payment,
    /// Soonest scheduled date first.
    Urgency,
    /// Highest owner engagement score first.
    Rating,
}

/// How soon a job is due, relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyTier {
    /// Due within 24 hours (or overdue).
    Urgent,
    /// Due within 72 hours.
    Soon,
    Later,
}

/// What the browsing collector brings to the ranking: their service area
/// (the distance proxy — the store holds no geocoding), the engagement
/// scores of request owners, and the reference instant for urgency tiers.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    pub collector_id: String,
    pub service_area: String,
    pub owner_scores: HashMap<String, u32>,
    pub as_of: DateTime<Utc>,
}

pub fn urgency_tier(request: &PickupRequest, as_of: DateTime<Utc>) -> UrgencyTier {
    let until_due = request.scheduled_for.signed_duration_since(as_of);
    if until_due < Duration::hours(24) {
        UrgencyTier::Urgent
    } else if until_due < Duration::hours(72) {
        UrgencyTier::Soon
    } else {
        UrgencyTier::Later
    }
}

/// Rank pending requests for a collector. Non-pending records are dropped,
/// `tier_filter` (when given) restricts by urgency tier, and the result is
/// ordered by `sort_key` with ties broken by id ascending.
pub fn rank_pending_requests(
    mut pending: Vec<PickupRequest>,
    ctx: &CollectorContext,
    sort_key: SortKey,
    tier_filter: Option<UrgencyTier>,
) -> Vec<PickupRequest> {
    pending.retain(|request| request.status == PickupStatus::Pending);
    if let Some(tier) = tier_filter {
        pending.retain(|request| urgency_tier(request, ctx.as_of) == tier);
    }
    pending.sort_by(|a, b| compare(a, b, ctx, sort_key).then_with(|| a.id.cmp(&b.id)));
    debug!(
        collector_id = %ctx.collector_id,
        candidates = pending.len(),
        "Ranked pending pickups"
    );
    pending
}

fn compare(
    a: &PickupRequest,
    b: &PickupRequest,
    ctx: &CollectorContext,
    sort_key: SortKey,
) -> Ordering {
    match sort_key {
        SortKey::Payment => b.estimated_value.cmp(&a.estimated_value),
        SortKey::Urgency => a.scheduled_for.cmp(&b.scheduled_for),
        SortKey::Distance => area_rank(a, ctx)
            .cmp(&area_rank(b, ctx))
            .then_with(|| a.scheduled_for.cmp(&b.scheduled_for)),
        SortKey::Rating => owner_score(b, ctx).cmp(&owner_score(a, ctx)),
    }
}

fn area_rank(request: &PickupRequest, ctx: &CollectorContext) -> u8 {
    let in_area = request
        .address
        .to_lowercase()
        .contains(&ctx.service_area.to_lowercase());
    u8::from(!in_area)
}

fn owner_score(request: &PickupRequest, ctx: &CollectorContext) -> u32 {
    ctx.owner_scores.get(&request.owner_id).copied().unwrap_or(0)
}
