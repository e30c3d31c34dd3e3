//! Timing instrumentation for the gesture pipeline.
//!
//! The dispatcher runs once per pose sample, so a slow hit-test or command
//! shows up as cursor lag. `DispatchMonitor` keeps rolling statistics per
//! pipeline stage and counts samples that exceed the dispatch budget.
//!
//! Scoped timing is compiled in only with the `profiling` feature:
//! ```ignore
//! fn handle_sample() {
//!     profile_scope!("gesture_dispatch");
//!     // ...
//! }
//! ```

use crate::constants::SLOW_DISPATCH_MS;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// Number of samples kept per operation for rolling statistics
const STATS_SAMPLE_COUNT: usize = 120;

/// Slow-sample percentage above which the summary is logged as a warning
const SLOW_SUMMARY_PERCENT: f64 = 5.0;

// ============================================================================
// Profiling Macro (zero-cost when disabled)
// ============================================================================

/// Time the enclosing scope under `name`. Compiles to nothing unless the
/// `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _timer = $crate::perf::ScopedTimer::new($name, 1.0);
        #[cfg(not(feature = "profiling"))]
        let _ = $name;
    };
    ($name:expr, $threshold_ms:expr) => {
        #[cfg(feature = "profiling")]
        let _timer = $crate::perf::ScopedTimer::new($name, $threshold_ms);
        #[cfg(not(feature = "profiling"))]
        let _ = ($name, $threshold_ms);
    };
}

// ============================================================================
// Operation Statistics
// ============================================================================

/// Rolling timing statistics for one named operation.
#[derive(Debug, Clone)]
pub struct OperationStats {
    samples: VecDeque<f64>,
    count: u64,
    min_ms: f64,
    max_ms: f64,
    sum_ms: f64,
}

impl Default for OperationStats {
    fn default() -> Self {
        Self {
            samples: VecDeque::with_capacity(STATS_SAMPLE_COUNT),
            count: 0,
            min_ms: f64::MAX,
            max_ms: 0.0,
            sum_ms: 0.0,
        }
    }
}

impl OperationStats {
    pub fn record(&mut self, ms: f64) {
        if self.samples.len() >= STATS_SAMPLE_COUNT {
            if let Some(old) = self.samples.pop_front() {
                self.sum_ms -= old;
            }
        }
        self.samples.push_back(ms);
        self.sum_ms += ms;
        self.count += 1;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);
    }

    /// Average over the retained window.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum_ms / self.samples.len() as f64
        }
    }

    pub fn p95(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let idx = ((sorted.len() as f64) * 0.95).floor() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Lifetime invocation count, not limited to the window.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min_ms(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.min_ms }
    }

    pub fn max_ms(&self) -> f64 {
        self.max_ms
    }
}

// ============================================================================
// Dispatch Monitor
// ============================================================================

/// Tracks how long each pose sample takes to dispatch.
pub struct DispatchMonitor {
    budget_ms: f64,
    total_samples: u64,
    slow_samples: u64,
    operations: HashMap<&'static str, OperationStats>,
}

impl Default for DispatchMonitor {
    fn default() -> Self {
        Self::new(SLOW_DISPATCH_MS)
    }
}

impl DispatchMonitor {
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            total_samples: 0,
            slow_samples: 0,
            operations: HashMap::new(),
        }
    }

    /// Record one dispatched sample.
    pub fn record_sample(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.total_samples += 1;
        if ms > self.budget_ms {
            self.slow_samples += 1;
            debug!(
                elapsed_ms = format!("{:.2}", ms),
                budget_ms = format!("{:.2}", self.budget_ms),
                "Slow gesture sample"
            );
        }
        self.record_operation("sample", ms);
    }

    pub fn record_operation(&mut self, name: &'static str, elapsed_ms: f64) {
        self.operations.entry(name).or_default().record(elapsed_ms);
    }

    /// Run `f` and record it under `name`.
    pub fn time<T>(&mut self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let (result, ms) = measure(f);
        self.record_operation(name, ms);
        result
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn slow_samples(&self) -> u64 {
        self.slow_samples
    }

    pub fn slow_percentage(&self) -> f64 {
        if self.total_samples == 0 {
            return 0.0;
        }
        (self.slow_samples as f64 / self.total_samples as f64) * 100.0
    }

    pub fn operation(&self, name: &str) -> Option<&OperationStats> {
        self.operations.get(name)
    }

    /// Log a one-line summary; a warning when too many samples ran slow.
    pub fn log_summary(&self) {
        let Some(stats) = self.operations.get("sample") else {
            return;
        };
        if self.slow_percentage() > SLOW_SUMMARY_PERCENT {
            warn!(
                samples = self.total_samples,
                avg_ms = format!("{:.2}", stats.average()),
                p95_ms = format!("{:.2}", stats.p95()),
                slow = format!("{:.1}%", self.slow_percentage()),
                "Gesture dispatch below target"
            );
        } else {
            debug!(
                samples = self.total_samples,
                avg_ms = format!("{:.2}", stats.average()),
                "Gesture dispatch summary"
            );
        }
    }

    pub fn reset(&mut self) {
        self.total_samples = 0;
        self.slow_samples = 0;
        self.operations.clear();
    }
}

// ============================================================================
// Scoped Timer
// ============================================================================

/// Logs the scope's duration on drop when it exceeds the threshold.
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
    threshold_ms: f64,
}

impl ScopedTimer {
    pub fn new(name: &'static str, threshold_ms: f64) -> Self {
        Self {
            name,
            start: Instant::now(),
            threshold_ms,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        if elapsed_ms > self.threshold_ms {
            warn!(
                operation = self.name,
                elapsed_ms = format!("{:.2}", elapsed_ms),
                threshold_ms = format!("{:.2}", self.threshold_ms),
                "Slow operation"
            );
        }
    }
}

/// Run `f` and return its result with the elapsed milliseconds.
#[inline]
pub fn measure<T, F: FnOnce() -> T>(f: F) -> (T, f64) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_secs_f64() * 1000.0)
}
