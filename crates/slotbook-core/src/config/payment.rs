//! Payment gateway configuration.

use serde::{Deserialize, Serialize};

/// Merchant credentials shared with the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Merchant identifier assigned by the gateway.
    #[serde(default)]
    pub merchant_id: String,
    /// Shared secret used to sign checkout requests and verify callbacks.
    #[serde(default)]
    pub merchant_secret: String,
    /// Prefix of every order identifier sent to the gateway.
    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,
    /// Hosted checkout endpoint returned to clients.
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,
    /// URL the gateway posts settlement notices to.
    #[serde(default)]
    pub notify_url: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            merchant_secret: String::new(),
            order_prefix: default_order_prefix(),
            checkout_url: default_checkout_url(),
            notify_url: String::new(),
        }
    }
}

fn default_order_prefix() -> String {
    "SB-".to_string()
}

fn default_checkout_url() -> String {
    "https://sandbox.gateway.example/pay/checkout".to_string()
}
