//! Venue collaborator: opening hours and base rates.

pub mod directory;

pub use directory::{StaticVenueDirectory, Venue, VenueDirectory};
