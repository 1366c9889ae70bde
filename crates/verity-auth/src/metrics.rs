//! Directory client metrics
//!
//! Recorded through the `metrics` facade; whichever recorder the host
//! process installs decides where they go.

use metrics::{counter, gauge};

/// Metric names
pub mod names {
    pub const AUTH_TOTAL: &str = "verity_directory_auth_total";
    pub const LOOKUP_TOTAL: &str = "verity_directory_lookup_total";
    pub const PROBE_TOTAL: &str = "verity_directory_probe_total";
    pub const USABLE_SERVERS: &str = "verity_directory_usable_servers";
    pub const EVICTIONS_TOTAL: &str = "verity_directory_evictions_total";
}

/// Record an authenticate call. `outcome` is "success" or an error category.
pub fn record_auth(outcome: &'static str) {
    counter!(names::AUTH_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a fetch_user call
pub fn record_lookup(outcome: &'static str) {
    counter!(names::LOOKUP_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_probe(usable: bool) {
    counter!(
        names::PROBE_TOTAL,
        "result" => if usable { "usable" } else { "unusable" }
    )
    .increment(1);
}

pub fn set_usable_servers(count: usize) {
    gauge!(names::USABLE_SERVERS).set(count as f64);
}

pub fn record_eviction() {
    counter!(names::EVICTIONS_TOTAL).increment(1);
}
