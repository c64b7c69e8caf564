//! Domain constants
//!
//! Defaults for the carrier credential lifecycle and request handling.

// Credential lifecycle
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 864_000; // 240 hours
pub const DEFAULT_TOKEN_CACHE_TTL_SECS: u64 = 820_800; // 9.5 days
pub const DEFAULT_REFRESH_BUFFER_SECS: u64 = 3_600;
pub const DEFAULT_REFRESH_CHECK_INTERVAL_SECS: u64 = 1_800;

// Login retry
pub const DEFAULT_LOGIN_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_LOGIN_BACKOFF_MS: u64 = 2_000;
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 10;

// Carrier requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Added to the longest per-attempt timeout to get the HTTP client's own
/// timeout, so the per-attempt deadline always fires first.
pub const TRANSPORT_TIMEOUT_GRACE_SECS: u64 = 5;
pub const LOGIN_PATH: &str = "auth/login";

// Credential store
pub const DEFAULT_STORE_PREFIX: &str = "shipgate:carrier:";
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 3;
pub const TOKEN_KEY_SUFFIX: &str = "token";
pub const EXPIRY_KEY_SUFFIX: &str = ":expiry";

// Health listener
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Lowercase phrases in carrier error messages that indicate a rejected
/// credential even when the status code does not.
pub const AUTH_FAILURE_PHRASES: [&str; 4] =
    ["unauthorized", "invalid token", "token expired", "authentication failed"];

// Shipment payload defaults
pub const DEFAULT_PARCEL_DIMENSION_CM: f64 = 10.0;
pub const DEFAULT_PARCEL_WEIGHT_KG: f64 = 1.0;
pub const DEFAULT_COUNTRY: &str = "India";
pub const DEFAULT_RETURN_PAYMENT_METHOD: &str = "Prepaid";
