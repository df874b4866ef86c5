//! Static venue directory entries.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A venue known to this deployment.
///
/// Opening hours only shape the candidate slot grid shown to users; the
/// conflict check accepts any interval a caller supplies. Hours lie within
/// one calendar day, so a venue open until midnight closes at `23:59:59`
/// and its grid stops at the last whole slot before that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub id: Uuid,
    pub name: String,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    /// Off-peak hourly rate.
    pub hourly_rate: Decimal,
    /// Length of each slot in the availability grid, in minutes.
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i64,
}

impl VenueConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.closes_at <= self.opens_at {
            return Err(AppError::configuration(format!(
                "venue {} closes before it opens (hours cannot run past midnight; use 23:59:59)",
                self.id
            )));
        }
        if self.slot_minutes <= 0 {
            return Err(AppError::configuration(format!(
                "venue {} has a non-positive slot length",
                self.id
            )));
        }
        Ok(())
    }
}

fn default_slot_minutes() -> i64 {
    60
}
