//! Progress reporting for in-flight downloads (percent, rate, ETA).
//!
//! Each transfer owns its own [`ProgressTracker`], so two transfers can never
//! collide on a shared key and the tracker's state dies with the request.

use std::time::Instant;

use crate::format::{format_duration, format_size};

/// Segments in the rendered progress bar.
const BAR_SEGMENTS: u64 = 10;

/// Snapshot of one download's progress.
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Bytes fetched so far.
    pub bytes_done: u64,
    /// Total size in bytes (known; unknown totals are never reported).
    pub total_bytes: u64,
    /// Elapsed time since the first reported chunk (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Whole percent complete, floored and clamped to 100.
    pub fn percent(&self) -> u64 {
        if self.total_bytes == 0 {
            return 0;
        }
        let pct = (self.bytes_done as u128 * 100 / self.total_bytes as u128) as u64;
        pct.min(100)
    }

    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (0 when the rate is 0).
    pub fn eta_secs(&self) -> f64 {
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return 0.0;
        }
        self.total_bytes.saturating_sub(self.bytes_done) as f64 / rate
    }
}

/// One rendered progress emission.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Whole percent this emission corresponds to.
    pub percent: u64,
    /// Ready-to-display multi-line text.
    pub text: String,
}

/// Rate-limits progress renderings for a single transfer.
///
/// Emits at most once per whole percent, and only when the percent strictly
/// increases, so a full transfer produces at most 100 emissions plus the
/// terminal marker appended at 100. Dropping the tracker releases all state.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    started_at: Option<Instant>,
    last_percent: u64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports cumulative progress; returns a rendering only when the floored
    /// percent moved past the last emitted one. A zero total disables
    /// reporting entirely.
    pub fn report(&mut self, bytes_done: u64, bytes_total: u64) -> Option<ProgressUpdate> {
        if bytes_total == 0 {
            return None;
        }
        let started = *self.started_at.get_or_insert_with(Instant::now);
        let stats = ProgressStats {
            bytes_done,
            total_bytes: bytes_total,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        let percent = stats.percent();
        if percent <= self.last_percent {
            return None;
        }
        self.last_percent = percent;
        Some(ProgressUpdate {
            percent,
            text: render(&stats),
        })
    }
}

fn render(stats: &ProgressStats) -> String {
    let percent = stats.percent();
    let filled = (percent / BAR_SEGMENTS) as usize;
    let bar: String = "▰".repeat(filled) + &"▢".repeat(BAR_SEGMENTS as usize - filled);
    let mut text = format!(
        "Downloading...\n[{}] {}%\nProcessed: {} of {}\nSpeed: {}/s | ETA: {}",
        bar,
        percent,
        format_size(stats.bytes_done),
        format_size(stats.total_bytes),
        format_size(stats.bytes_per_sec() as u64),
        format_duration(stats.eta_secs()),
    );
    if percent == 100 {
        text.push_str("\nFinished downloading!");
    }
    text
}

/// Receives progress notifications for one transfer. All methods default to
/// no-ops so sinks only implement what they present.
pub trait ProgressSink {
    /// First body chunk arrived; `total_bytes` is `None` when the server did
    /// not declare a length.
    fn started(&mut self, _file_name: &str, _total_bytes: Option<u64>) {}

    /// A new whole-percent rendering is available.
    fn progressed(&mut self, _update: &ProgressUpdate) {}

    /// The download finished successfully.
    fn finished(&mut self) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_floors_and_clamps() {
        let stats = ProgressStats {
            bytes_done: 1,
            total_bytes: 3,
            elapsed_secs: 0.0,
        };
        assert_eq!(stats.percent(), 33);
        let over = ProgressStats {
            bytes_done: 12,
            total_bytes: 10,
            elapsed_secs: 0.0,
        };
        assert_eq!(over.percent(), 100);
    }

    #[test]
    fn zero_elapsed_means_zero_rate_and_eta() {
        let stats = ProgressStats {
            bytes_done: 500,
            total_bytes: 1000,
            elapsed_secs: 0.0,
        };
        assert_eq!(stats.bytes_per_sec(), 0.0);
        assert_eq!(stats.eta_secs(), 0.0);
    }

    #[test]
    fn emissions_are_strictly_increasing() {
        let mut tracker = ProgressTracker::new();
        let mut seen = Vec::new();
        for done in [10u64, 25, 25, 60, 100] {
            if let Some(update) = tracker.report(done, 100) {
                seen.push(update.percent);
            }
        }
        assert_eq!(seen, vec![10, 25, 60, 100]);
    }

    #[test]
    fn same_floor_percent_emits_once() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.report(100, 1000).is_some());
        // 105/1000 still floors to 10%.
        assert!(tracker.report(105, 1000).is_none());
        assert!(tracker.report(110, 1000).is_some());
    }

    #[test]
    fn zero_percent_is_not_emitted() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.report(1, 1000).is_none());
    }

    #[test]
    fn completion_marker_at_100() {
        let mut tracker = ProgressTracker::new();
        let update = tracker.report(100, 100).expect("should emit");
        assert_eq!(update.percent, 100);
        assert!(update.text.contains("Finished downloading!"));
        assert!(update.text.contains("[▰▰▰▰▰▰▰▰▰▰] 100%"));
    }

    #[test]
    fn bar_fill_matches_percent() {
        let mut tracker = ProgressTracker::new();
        let update = tracker.report(34, 100).expect("should emit");
        assert!(update.text.contains("[▰▰▰▢▢▢▢▢▢▢] 34%"));
    }

    #[test]
    fn zero_total_reports_nothing() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.report(50, 0).is_none());
    }
}
