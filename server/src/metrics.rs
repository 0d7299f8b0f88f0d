//! Request and cache counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use orderdesk_fx::ConverterStatsSnapshot;
use serde::Serialize;

/// Server metrics.
#[derive(Default)]
pub struct Metrics {
    /// Orders created.
    pub orders_created: AtomicU64,
    /// Orders updated.
    pub orders_updated: AtomicU64,
    /// Orders soft-deleted.
    pub orders_deleted: AtomicU64,
    /// Order show responses.
    pub orders_shown: AtomicU64,
    /// Show responses whose conversion fell back to rate 1.
    pub conversions_degraded: AtomicU64,
    /// Query cache hits.
    pub query_cache_hits: AtomicU64,
    /// Query cache misses.
    pub query_cache_misses: AtomicU64,
    /// Successful logins.
    pub logins: AtomicU64,
    /// Rejected logins.
    pub login_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_created(&self) {
        self.orders_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_updated(&self) {
        self.orders_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_deleted(&self) {
        self.orders_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a show response and whether its conversion degraded.
    pub fn order_shown(&self, degraded: bool) {
        self.orders_shown.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.conversions_degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn query_cache_hit(&self) {
        self.query_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn query_cache_miss(&self) {
        self.query_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login(&self, success: bool) {
        if success {
            self.logins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.login_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            orders_created: self.orders_created.load(Ordering::Relaxed),
            orders_updated: self.orders_updated.load(Ordering::Relaxed),
            orders_deleted: self.orders_deleted.load(Ordering::Relaxed),
            orders_shown: self.orders_shown.load(Ordering::Relaxed),
            conversions_degraded: self.conversions_degraded.load(Ordering::Relaxed),
            query_cache_hits: self.query_cache_hits.load(Ordering::Relaxed),
            query_cache_misses: self.query_cache_misses.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            login_failures: self.login_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus text format, including the converter's
    /// rate cache counters.
    pub fn to_prometheus(&self, rates: &ConverterStatsSnapshot) -> String {
        let s = self.snapshot();
        let counters: [(&str, &str, u64); 12] = [
            ("orders_created", "Orders created", s.orders_created),
            ("orders_updated", "Orders updated", s.orders_updated),
            ("orders_deleted", "Orders soft-deleted", s.orders_deleted),
            ("orders_shown", "Order show responses", s.orders_shown),
            ("conversions_degraded", "Conversions that fell back to rate 1", s.conversions_degraded),
            ("query_cache_hits", "Query cache hits", s.query_cache_hits),
            ("query_cache_misses", "Query cache misses", s.query_cache_misses),
            ("logins", "Successful logins", s.logins),
            ("login_failures", "Rejected logins", s.login_failures),
            ("rate_cache_hits", "Exchange rate cache hits", rates.cache_hits),
            ("rate_cache_misses", "Exchange rate cache misses", rates.cache_misses),
            ("rate_upstream_failures", "Exchange rate fetch failures", rates.upstream_failures),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP orderdesk_{name} {help}\n# TYPE orderdesk_{name} counter\norderdesk_{name} {value}\n\n"
            ));
        }
        out
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub orders_created: u64,
    pub orders_updated: u64,
    pub orders_deleted: u64,
    pub orders_shown: u64,
    pub conversions_degraded: u64,
    pub query_cache_hits: u64,
    pub query_cache_misses: u64,
    pub logins: u64,
    pub login_failures: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
