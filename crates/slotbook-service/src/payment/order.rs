//! Gateway order identifiers.

use std::fmt;

use uuid::Uuid;

use slotbook_core::error::AppError;
use slotbook_core::result::AppResult;
use slotbook_core::types::id::ReservationId;

/// `{prefix}{reservation uuid}`, the opaque order id the gateway echoes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderReference {
    pub reservation_id: ReservationId,
}

impl OrderReference {
    pub fn new(reservation_id: ReservationId) -> Self {
        Self { reservation_id }
    }

    pub fn format(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.reservation_id)
    }

    /// Recover the reservation id from an order id carrying `prefix`.
    pub fn parse(prefix: &str, order_id: &str) -> AppResult<Self> {
        let raw = order_id
            .strip_prefix(prefix)
            .ok_or_else(|| AppError::validation(format!("Unknown order id '{order_id}'")))?;
        let uuid = Uuid::parse_str(raw)
            .map_err(|_| AppError::validation(format!("Malformed order id '{order_id}'")))?;
        Ok(Self::new(ReservationId::from_uuid(uuid)))
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reservation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotbook_core::ErrorKind;

    #[test]
    fn test_parse_recovers_reservation_id() {
        let id = ReservationId::new();
        let order_id = OrderReference::new(id).format("SB-");
        assert!(order_id.starts_with("SB-"));
        assert_eq!(OrderReference::parse("SB-", &order_id).unwrap().reservation_id, id);
    }

    #[test]
    fn test_parse_rejects_foreign_or_malformed_ids() {
        for bad in ["XX-4f1c", "SB-not-a-uuid", ""] {
            let err = OrderReference::parse("SB-", bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }
}
