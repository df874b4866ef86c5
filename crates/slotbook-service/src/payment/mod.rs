//! Payment gateway integration: checkout signing and settlement callbacks.

pub mod checkout;
pub mod order;
pub mod settlement;
pub mod signature;

pub use checkout::{CheckoutService, CheckoutSession};
pub use order::OrderReference;
pub use settlement::{NoticeOutcome, PaymentNotice, PaymentSettlementAdapter};
pub use signature::Sha256Signer;
