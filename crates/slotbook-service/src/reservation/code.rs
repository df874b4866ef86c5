//! One-time confirmation codes.

use constant_time_eq::constant_time_eq;
use rand::Rng;

/// Random numeric code of `length` digits.
pub fn generate(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Compare a submitted code against the stored one in constant time.
pub fn matches(expected: &str, submitted: &str) -> bool {
    constant_time_eq(expected.as_bytes(), submitted.trim().as_bytes())
}
