//! Frame timing instrumentation.
//!
//! Captures the last frame's render duration and classifies
//! presentation latency (commit → presented) against the output's
//! refresh interval. Counters are plain relaxed atomics; a snapshot
//! can be logged or surfaced in an OSD.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Duration;

static LAST_RENDER_NS: AtomicU64 = AtomicU64::new(0);

pub fn record_last_render_ns(ns: u64) {
    LAST_RENDER_NS.store(ns, Relaxed);
}

pub fn last_render_ns() -> u64 {
    LAST_RENDER_NS.load(Relaxed)
}

#[derive(Debug, Default)]
pub struct PresentationStats {
    /// Presented in less than one refresh interval.
    within_frame: AtomicU64,
    /// Presented on the next refresh.
    one_frame: AtomicU64,
    /// Two or more refreshes late.
    late: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationSnapshot {
    pub within_frame: u64,
    pub one_frame: u64,
    pub late: u64,
}

impl PresentationStats {
    /// Classify one frame. `latency` is commit→presented; `refresh`
    /// the output's frame interval.
    pub fn record(&self, latency: Duration, refresh: Duration) {
        let refresh = refresh.max(Duration::from_micros(1));
        if latency < refresh {
            self.within_frame.fetch_add(1, Relaxed);
        } else if latency < refresh * 2 {
            self.one_frame.fetch_add(1, Relaxed);
        } else {
            self.late.fetch_add(1, Relaxed);
        }
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        PresentationSnapshot {
            within_frame: self.within_frame.load(Relaxed),
            one_frame: self.one_frame.load(Relaxed),
            late: self.late.load(Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_buckets() {
        let stats = PresentationStats::default();
        let refresh = Duration::from_millis(16);
        stats.record(Duration::from_millis(2), refresh);
        stats.record(Duration::from_millis(17), refresh);
        stats.record(Duration::from_millis(40), refresh);
        stats.record(Duration::from_millis(15), refresh);
        let snap = stats.snapshot();
        assert_eq!(snap.within_frame, 2);
        assert_eq!(snap.one_frame, 1);
        assert_eq!(snap.late, 1);
    }

    #[test]
    fn render_ns_round_trips() {
        record_last_render_ns(4242);
        assert_eq!(last_render_ns(), 4242);
    }
}
