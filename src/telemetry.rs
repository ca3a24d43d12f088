//! Telemetry metric name constants.
//!
//! Centralised metric names for spegil operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `spegil_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `method` — inbound/outbound HTTP method ("GET" | "POST")
//! - `status` — outcome: "ok" or "error"

/// Total inbound requests handled by the router.
///
/// Labels: `method`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "spegil_requests_total";

/// Total GET resolutions answered from the local store without a fetch.
pub const CACHE_HITS_TOTAL: &str = "spegil_cache_hits_total";

/// Total GET resolutions that required an origin fetch (or joined one).
pub const CACHE_MISSES_TOTAL: &str = "spegil_cache_misses_total";

/// Total callers that joined an already-running fetch for their path
/// instead of starting their own.
pub const WAITERS_COALESCED_TOTAL: &str = "spegil_waiters_coalesced_total";

/// Total requests issued to the origin.
///
/// Labels: `method`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "spegil_upstream_requests_total";

/// Duration of a full fetch-and-persist cycle in seconds.
pub const FETCH_DURATION_SECONDS: &str = "spegil_fetch_duration_seconds";
