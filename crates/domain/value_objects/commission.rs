use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const BASIS_POINTS_PER_UNIT: i64 = 10_000;

/// Platform commission expressed in basis points (1000 = 10%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionRate(i32);

impl CommissionRate {
    pub fn from_basis_points(bps: i32) -> Result<Self> {
        if bps < 0 || i64::from(bps) >= BASIS_POINTS_PER_UNIT {
            bail!("commission rate must be within [0, 1): got {bps} bps");
        }
        Ok(Self(bps))
    }

    pub fn basis_points(&self) -> i32 {
        self.0
    }

    /// Splits a price into the platform fee and the provider's share. The fee
    /// rounds toward zero so the provider never loses a fractional minor unit.
    pub fn split(&self, price_minor: i64) -> Result<CommissionSplit> {
        if price_minor < 0 {
            bail!("cannot split a negative price: {price_minor}");
        }
        // Widened so the intermediate product cannot overflow.
        let fee = i128::from(price_minor) * i128::from(self.0) / i128::from(BASIS_POINTS_PER_UNIT);
        let admin_fee_minor = i64::try_from(fee)
            .with_context(|| format!("commission on {price_minor} does not fit in minor units"))?;
        Ok(CommissionSplit {
            admin_fee_minor,
            provider_share_minor: price_minor - admin_fee_minor,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub admin_fee_minor: i64,
    pub provider_share_minor: i64,
}
