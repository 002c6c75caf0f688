//! Metrics for Moot

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collector shared by the debate service and the API
#[derive(Debug, Default)]
pub struct Metrics {
    /// Debates started
    pub sessions_started: AtomicU64,
    /// Non-terminal turns completed
    pub turns: AtomicU64,
    /// Debates ended by a verdict or quit
    pub verdicts: AtomicU64,
    /// Turns that failed outright
    pub turn_errors: AtomicU64,
    /// Persona outputs replaced by a fallback
    pub generation_fallbacks: AtomicU64,
    /// Turns that ran without a precedent
    pub retrieval_misses: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_turn(&self) {
        self.turns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verdict(&self) {
        self.verdicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_turn_error(&self) {
        self.turn_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` fallback outputs in one turn
    pub fn record_generation_fallbacks(&self, count: u64) {
        self.generation_fallbacks.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_retrieval_miss(&self) {
        self.retrieval_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            turns: self.turns.load(Ordering::Relaxed),
            verdicts: self.verdicts.load(Ordering::Relaxed),
            turn_errors: self.turn_errors.load(Ordering::Relaxed),
            generation_fallbacks: self.generation_fallbacks.load(Ordering::Relaxed),
            retrieval_misses: self.retrieval_misses.load(Ordering::Relaxed),
            active_sessions: 0,
        }
    }

    /// Share of completed turns that ran without a precedent
    pub fn retrieval_miss_rate(&self) -> f64 {
        let total = self.turns.load(Ordering::Relaxed);
        let misses = self.retrieval_misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            misses as f64 / total as f64
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub sessions_started: u64,
    pub turns: u64,
    pub verdicts: u64,
    pub turn_errors: u64,
    pub generation_fallbacks: u64,
    pub retrieval_misses: u64,
    /// Filled in by whoever owns the session store
    #[serde(default)]
    pub active_sessions: u64,
}

impl MetricsSnapshot {
    pub fn with_active_sessions(mut self, active: u64) -> Self {
        self.active_sessions = active;
        self
    }

    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let counters = [
            ("moot_sessions_started_total", "Total debates started", self.sessions_started),
            ("moot_turns_total", "Total non-terminal debate turns", self.turns),
            ("moot_verdicts_total", "Total debates ended by the judge", self.verdicts),
            ("moot_turn_errors_total", "Total turns that returned an error", self.turn_errors),
            (
                "moot_generation_fallbacks_total",
                "Persona outputs replaced by a fallback argument",
                self.generation_fallbacks,
            ),
            (
                "moot_retrieval_misses_total",
                "Turns that found no precedent",
                self.retrieval_misses,
            ),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }

        output.push_str("# HELP moot_active_sessions Sessions currently held in memory\n");
        output.push_str("# TYPE moot_active_sessions gauge\n");
        output.push_str(&format!("moot_active_sessions {}\n", self.active_sessions));

        let miss_rate = if self.turns > 0 {
            self.retrieval_misses as f64 / self.turns as f64
        } else {
            0.0
        };
        output.push_str("# HELP moot_retrieval_miss_rate Share of turns without a precedent\n");
        output.push_str("# TYPE moot_retrieval_miss_rate gauge\n");
        output.push_str(&format!("moot_retrieval_miss_rate {:.4}\n", miss_rate));

        output
    }
}

/// Timer for measuring durations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}
