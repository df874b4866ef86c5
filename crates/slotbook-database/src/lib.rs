//! # slotbook-database
//!
//! The reservation store: the single source of truth for slot occupancy.
//! Provides the [`ReservationStore`] and [`SlotTransaction`] contracts, a
//! PostgreSQL implementation, an in-memory implementation, the backend
//! dispatcher, and the migration runner.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryReservationStore;
pub use repositories::ReservationRepository;
pub use store::{ReservationStore, SlotTransaction, StoreDispatch};
