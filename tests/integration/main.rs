//! End-to-end tests against the full HTTP stack over the in-memory store.

mod helpers;

mod availability_test;
mod payment_test;
mod reservation_test;
