//! Peak-window price table.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Serialize;

use slotbook_core::config::PricingConfig;
use slotbook_entity::reservation::TimeSlot;

/// A `[start, end)` time-of-day range charged at its own hourly rate.
#[derive(Debug, Clone, Serialize)]
pub struct PeakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub hourly_rate: Decimal,
}

/// Price table passed into quoting as data.
///
/// Minutes inside a peak window are charged at that window's rate; every
/// other minute is charged at the venue's base rate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSchedule {
    windows: Vec<PeakWindow>,
}

impl PriceSchedule {
    pub fn new(windows: Vec<PeakWindow>) -> Self {
        Self { windows }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(
            config
                .peak_windows
                .iter()
                .map(|w| PeakWindow {
                    start: w.start,
                    end: w.end,
                    hourly_rate: w.hourly_rate,
                })
                .collect(),
        )
    }

    pub fn windows(&self) -> &[PeakWindow] {
        &self.windows
    }

    /// Price of `slot` given the venue's off-peak hourly rate, rounded to cents.
    pub fn quote(&self, slot: &TimeSlot, base_hourly_rate: Decimal) -> Decimal {
        let sixty = Decimal::from(60);
        let mut peak_minutes = 0i64;
        let mut total = Decimal::ZERO;

        for window in &self.windows {
            let start = slot.start().max(window.start);
            let end = slot.end().min(window.end);
            if end > start {
                let minutes = (end - start).num_minutes();
                peak_minutes += minutes;
                total += window.hourly_rate * Decimal::from(minutes) / sixty;
            }
        }

        let base_minutes = slot.duration_minutes() - peak_minutes;
        total += base_hourly_rate * Decimal::from(base_minutes) / sixty;
        total.round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn evening_peak() -> PriceSchedule {
        PriceSchedule::new(vec![PeakWindow {
            start: t(18, 0),
            end: t(22, 0),
            hourly_rate: Decimal::from(150),
        }])
    }

    #[test]
    fn test_off_peak_slot_uses_base_rate() {
        let slot = TimeSlot::new(t(10, 0), t(11, 30)).unwrap();
        assert_eq!(evening_peak().quote(&slot, Decimal::from(100)), Decimal::from(150));
    }

    #[test]
    fn test_slot_straddling_peak_start_is_split() {
        let slot = TimeSlot::new(t(17, 0), t(19, 0)).unwrap();
        // 60 min at 100 + 60 min at 150
        assert_eq!(evening_peak().quote(&slot, Decimal::from(100)), Decimal::from(250));
    }

    #[test]
    fn test_empty_table_is_flat_rate() {
        let slot = TimeSlot::new(t(20, 0), t(20, 45)).unwrap();
        assert_eq!(
            PriceSchedule::default().quote(&slot, Decimal::from(80)),
            Decimal::from(60)
        );
    }

    #[test]
    fn test_rounds_to_cents() {
        let slot = TimeSlot::new(t(9, 0), t(9, 40)).unwrap();
        let price = PriceSchedule::default().quote(&slot, Decimal::new(1000, 2));
        assert_eq!(price, Decimal::new(667, 2));
    }
}
