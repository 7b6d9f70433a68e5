//! Connection and request counters
//!
//! Counters are plain relaxed atomics shared between the accept thread and
//! the workers. A [`MetricsSnapshot`] is logged when the server stops.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Server-wide counters
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Connections handed to the work queue
    pub connections_accepted: AtomicU64,
    /// Requests answered with SUCCESS
    pub requests_succeeded: AtomicU64,
    /// Requests answered with FAILURE
    pub requests_failed: AtomicU64,
    /// Connections closed before a full request arrived
    pub connections_dropped: AtomicU64,
    /// Request bytes received (headers included)
    pub bytes_received: AtomicU64,
    /// Response bytes sent (headers included)
    pub bytes_sent: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.connections_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            connections_dropped: self.connections_dropped.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub connections_dropped: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

impl MetricsSnapshot {
    /// Requests that produced a response of either status
    pub fn requests_answered(&self) -> u64 {
        self.requests_succeeded + self.requests_failed
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted={} succeeded={} failed={} dropped={} rx_bytes={} tx_bytes={}",
            self.connections_accepted,
            self.requests_succeeded,
            self.requests_failed,
            self.connections_dropped,
            self.bytes_received,
            self.bytes_sent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters() {
        let metrics = ServerMetrics::new();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_success();
        metrics.record_failure();
        metrics.record_dropped();
        metrics.record_received(100);
        metrics.record_sent(40);

        let snap = metrics.snapshot();
        assert_eq!(snap.connections_accepted, 2);
        assert_eq!(snap.requests_answered(), 2);
        assert_eq!(snap.connections_dropped, 1);
        assert_eq!(snap.bytes_received, 100);
        assert_eq!(snap.bytes_sent, 40);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = Arc::new(ServerMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_success();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().requests_succeeded, 8000);
    }

    #[test]
    fn test_display() {
        let snap = MetricsSnapshot {
            connections_accepted: 3,
            requests_succeeded: 2,
            requests_failed: 1,
            ..Default::default()
        };
        assert_eq!(
            snap.to_string(),
            "accepted=3 succeeded=2 failed=1 dropped=0 rx_bytes=0 tx_bytes=0"
        );
    }
}
