//! Shared cache-control policies for HTTP handlers.

/// Per-user records must be revalidated before reuse.
pub const PRIVATE_NO_CACHE_MUST_REVALIDATE: &str = "private, no-cache, must-revalidate";

/// Reference tables change rarely; browsers may hold them for five minutes.
pub const PRIVATE_REFERENCE_MAX_AGE: &str = "private, max-age=300";

/// Header tuple for responses carrying per-user records.
pub const fn private_no_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_NO_CACHE_MUST_REVALIDATE)
}

/// Header tuple for reference snapshots.
pub const fn reference_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_REFERENCE_MAX_AGE)
}
