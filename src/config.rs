//! Pricing configuration: collection rates, reward ratio, platform fee.
//!
//! Every money/reward formula in the store reads these values; nothing is
//! hard-coded at a call site. Percentages are expressed in basis points so the
//! arithmetic stays in integers.

use crate::domain::{Amount, WasteType};

/// Collection rates paid per kilogram, by waste category (rupees).
pub const PLASTIC_RATE_PER_KG: Amount = 15;
pub const PAPER_RATE_PER_KG: Amount = 10;
pub const METAL_RATE_PER_KG: Amount = 40;
pub const GLASS_RATE_PER_KG: Amount = 8;
pub const EWASTE_RATE_PER_KG: Amount = 60;
pub const ORGANIC_RATE_PER_KG: Amount = 5;

/// Money and reward parameters, injected into the services at construction.
#[derive(Debug, Clone)]
pub struct Pricing {
    /// GreenCoins awarded per rupee of estimated pickup value, in basis
    /// points. 5_000 = 50 coins per 100 rupees.
    pub green_coin_award_bps: u32,
    /// Commission retained on marketplace sales, in basis points.
    /// 500 = 5%.
    pub platform_fee_bps: u32,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            green_coin_award_bps: 5_000,
            platform_fee_bps: 500,
        }
    }
}

impl Pricing {
    pub fn rate_per_kg(&self, waste_type: WasteType) -> Amount {
        match waste_type {
            WasteType::Plastic => PLASTIC_RATE_PER_KG,
            WasteType::Paper => PAPER_RATE_PER_KG,
            WasteType::Metal => METAL_RATE_PER_KG,
            WasteType::Glass => GLASS_RATE_PER_KG,
            WasteType::EWaste => EWASTE_RATE_PER_KG,
            WasteType::Organic => ORGANIC_RATE_PER_KG,
        }
    }

    /// Value of a pickup at creation time: quantity × per-kg rate.
    pub fn estimated_value(&self, waste_type: WasteType, quantity_kg: u32) -> Amount {
        self.rate_per_kg(waste_type) * Amount::from(quantity_kg)
    }

    /// GreenCoins credited to the owner when a pickup completes.
    pub fn green_coins_award(&self, estimated_value: Amount) -> i64 {
        apply_bps(estimated_value, self.green_coin_award_bps)
    }

    /// Commission retained on a sale. The seller amount is always derived by
    /// subtraction so `fee + seller_amount == total` holds exactly.
    pub fn platform_fee(&self, total_amount: Amount) -> Amount {
        apply_bps(total_amount, self.platform_fee_bps)
    }
}

/// Round-half-up basis-point multiplication on non-negative amounts.
fn apply_bps(amount: Amount, bps: u32) -> Amount {
    (amount * Amount::from(bps) + 5_000) / 10_000
}
