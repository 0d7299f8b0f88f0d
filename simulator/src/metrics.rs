//! Run metrics.

use std::collections::VecDeque;
use std::time::Duration;

const MAX_SAMPLES: usize = 10_000;

/// Latency and outcome counters for one kind of request.
#[derive(Debug, Clone)]
pub struct RequestStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    latency_samples: VecDeque<u64>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            latency_samples: VecDeque::with_capacity(256),
        }
    }

    pub fn record_success(&mut self, latency: Duration) {
        self.total += 1;
        self.succeeded += 1;

        if self.latency_samples.len() >= MAX_SAMPLES {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency.as_millis() as u64);
    }

    pub fn record_failure(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    pub fn average_latency_ms(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }
        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    pub fn p50_latency_ms(&self) -> u64 {
        self.percentile_latency(50)
    }

    pub fn p99_latency_ms(&self) -> u64 {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a seeding run measured.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub users_created: u64,
    pub user_failures: u64,
    pub creates: RequestStats,
    pub shows: RequestStats,
    /// Shows whose `converted_value` fell back to the identity rate.
    pub degraded_conversions: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_show(&mut self, latency: Duration, degraded: bool) {
        self.shows.record_success(latency);
        if degraded {
            self.degraded_conversions += 1;
        }
    }

    /// Share of successful shows that carried a real conversion.
    pub fn conversion_rate(&self) -> f64 {
        if self.shows.succeeded == 0 {
            return 0.0;
        }
        let converted = self.shows.succeeded - self.degraded_conversions;
        converted as f64 / self.shows.succeeded as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_stats() {
        let mut stats = RequestStats::new();

        stats.record_success(Duration::from_millis(100));
        stats.record_success(Duration::from_millis(200));
        stats.record_success(Duration::from_millis(150));
        stats.record_failure();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.succeeded, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.average_latency_ms(), 150);
        assert_eq!(stats.p50_latency_ms(), 150);
        assert_eq!(stats.p99_latency_ms(), 200);
    }

    #[test]
    fn test_empty_stats() {
        let stats = RequestStats::new();
        assert_eq!(stats.average_latency_ms(), 0);
        assert_eq!(stats.p99_latency_ms(), 0);
        assert_eq!(RunMetrics::new().conversion_rate(), 0.0);
    }

    #[test]
    fn test_conversion_rate() {
        let mut metrics = RunMetrics::new();
        metrics.record_show(Duration::from_millis(5), false);
        metrics.record_show(Duration::from_millis(5), false);
        metrics.record_show(Duration::from_millis(5), false);
        metrics.record_show(Duration::from_millis(5), true);

        assert_eq!(metrics.degraded_conversions, 1);
        assert_eq!(metrics.conversion_rate(), 0.75);
    }
}
