//! Time-to-booking refund policy.

use rust_decimal::Decimal;
use serde::Serialize;

use slotbook_core::config::CancellationPolicyConfig;

/// Which refund band a cancellation falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundTier {
    Full,
    Partial,
    /// Inside the lock window: nothing refunded, elevated actors only.
    None,
}

/// Refund bands by minutes remaining until the booking starts.
#[derive(Debug, Clone)]
pub struct CancellationPolicy {
    full_refund_minutes: i64,
    partial_refund_minutes: i64,
    partial_refund_percent: Decimal,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::from_config(&CancellationPolicyConfig::default())
    }
}

impl CancellationPolicy {
    pub fn from_config(config: &CancellationPolicyConfig) -> Self {
        Self {
            full_refund_minutes: config.full_refund_hours * 60,
            partial_refund_minutes: config.partial_refund_hours * 60,
            partial_refund_percent: config.partial_refund_percent,
        }
    }

    pub fn tier(&self, minutes_to_start: i64) -> RefundTier {
        if minutes_to_start >= self.full_refund_minutes {
            RefundTier::Full
        } else if minutes_to_start >= self.partial_refund_minutes {
            RefundTier::Partial
        } else {
            RefundTier::None
        }
    }

    /// Refund owed for `amount` in `tier`, rounded to cents.
    pub fn refund(&self, tier: RefundTier, amount: Decimal) -> Decimal {
        match tier {
            RefundTier::Full => amount,
            RefundTier::Partial => {
                (amount * self.partial_refund_percent / Decimal::ONE_HUNDRED).round_dp(2)
            }
            RefundTier::None => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        let policy = CancellationPolicy::default();
        assert_eq!(policy.tier(24 * 60), RefundTier::Full);
        assert_eq!(policy.tier(24 * 60 - 1), RefundTier::Partial);
        assert_eq!(policy.tier(120), RefundTier::Partial);
        assert_eq!(policy.tier(119), RefundTier::None);
        assert_eq!(policy.tier(-30), RefundTier::None);
    }

    #[test]
    fn test_refund_amounts() {
        let policy = CancellationPolicy::default();
        let amount = Decimal::new(100_001, 2);
        assert_eq!(policy.refund(RefundTier::Full, amount), amount);
        assert_eq!(policy.refund(RefundTier::Partial, amount), Decimal::new(50_000, 2));
        assert_eq!(policy.refund(RefundTier::None, amount), Decimal::ZERO);
    }
}
