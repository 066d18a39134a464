//! Progress accounting for a run
//!
//! The total is fixed when the runner is built. Every dispatch counts toward
//! completion, whether or not it produced a response.

use std::time::{Duration, Instant};

/// Completed vs. expected dispatches
#[derive(Debug, Clone)]
pub struct RunProgress {
    completed: u64,
    total: u64,
    start_time: Instant,
}

impl RunProgress {
    /// Start tracking a run of `total` dispatches
    pub fn new(total: u64) -> Self {
        Self {
            completed: 0,
            total,
            start_time: Instant::now(),
        }
    }

    /// Expected dispatches: payloads × loops for POST, loops otherwise
    pub fn total_for(is_post: bool, payload_count: usize, loops: u32) -> u64 {
        if is_post {
            payload_count as u64 * u64::from(loops)
        } else {
            u64::from(loops)
        }
    }

    /// Count one finished dispatch
    pub fn record(&mut self) {
        self.completed = self.completed.saturating_add(1);
    }

    /// Dispatches finished so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Expected dispatches
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Completion percentage (0-100); an empty run is complete
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Dispatches per second so far
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }

    /// Line logged after every dispatch
    pub fn format_progress(&self) -> String {
        format!("Progress: {:.2}%", self.percentage())
    }
}
