//! Venue lookup used for the slot grid and default pricing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use slotbook_core::config::VenueConfig;
use slotbook_core::result::AppResult;
use slotbook_core::types::id::VenueId;
use slotbook_entity::reservation::TimeSlot;

/// What the reservation engine needs to know about a venue.
#[derive(Debug, Clone, Serialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub hourly_rate: Decimal,
    pub slot_minutes: i64,
}

impl Venue {
    /// Consecutive slots of `slot_minutes` from opening until the last one
    /// that still ends by closing time. Slots never reach midnight, so a
    /// `closes_at` of `00:00` yields an empty grid.
    pub fn slot_grid(&self) -> Vec<TimeSlot> {
        let step = Duration::minutes(self.slot_minutes.max(1));
        let mut grid = Vec::new();
        let mut start = self.opens_at;
        loop {
            let (end, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 || end > self.closes_at {
                break;
            }
            match TimeSlot::new(start, end) {
                Ok(slot) => grid.push(slot),
                Err(_) => break,
            }
            start = end;
        }
        grid
    }
}

impl From<&VenueConfig> for Venue {
    fn from(config: &VenueConfig) -> Self {
        Self {
            id: VenueId::from_uuid(config.id),
            name: config.name.clone(),
            opens_at: config.opens_at,
            closes_at: config.closes_at,
            hourly_rate: config.hourly_rate,
            slot_minutes: config.slot_minutes,
        }
    }
}

/// Source of venue data, owned by the venue collaborator.
#[async_trait]
pub trait VenueDirectory: Send + Sync + std::fmt::Debug {
    async fn find(&self, venue_id: VenueId) -> AppResult<Option<Venue>>;
}

/// Venues declared in configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticVenueDirectory {
    venues: HashMap<VenueId, Venue>,
}

impl StaticVenueDirectory {
    pub fn new(venues: impl IntoIterator<Item = Venue>) -> Self {
        Self {
            venues: venues.into_iter().map(|v| (v.id, v)).collect(),
        }
    }

    pub fn from_config(configs: &[VenueConfig]) -> Self {
        Self::new(configs.iter().map(Venue::from))
    }
}

#[async_trait]
impl VenueDirectory for StaticVenueDirectory {
    async fn find(&self, venue_id: VenueId) -> AppResult<Option<Venue>> {
        Ok(self.venues.get(&venue_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(opens: (u32, u32), closes: (u32, u32), slot_minutes: i64) -> Venue {
        Venue {
            id: VenueId::new(),
            name: "Court 1".into(),
            opens_at: NaiveTime::from_hms_opt(opens.0, opens.1, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(closes.0, closes.1, 0).unwrap(),
            hourly_rate: Decimal::from(100),
            slot_minutes,
        }
    }

    #[test]
    fn test_grid_stops_at_closing() {
        let grid = venue((8, 0), (11, 30), 60).slot_grid();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2].end(), NaiveTime::from_hms_opt(11, 0, 0).unwrap());
    }

    #[test]
    fn test_grid_does_not_wrap_midnight() {
        let grid = venue((22, 0), (23, 59), 90).slot_grid();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].start(), NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    }

    #[test]
    fn test_midnight_closing_yields_no_grid() {
        assert!(venue((8, 0), (0, 0), 60).slot_grid().is_empty());
        assert_eq!(venue((8, 0), (23, 59), 60).slot_grid().len(), 15);
    }

    #[tokio::test]
    async fn test_static_directory_lookup() {
        let v = venue((6, 0), (22, 0), 60);
        let id = v.id;
        let directory = StaticVenueDirectory::new([v]);
        assert!(directory.find(id).await.unwrap().is_some());
        assert!(directory.find(VenueId::new()).await.unwrap().is_none());
    }
}
