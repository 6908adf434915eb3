/// Performance measurement utilities
/// Each rendering phase is timed and reported through `log` at trace level
use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::trace!("[PERF] {}: {}μs", self.name, self.elapsed().as_micros());
    }
}

/// Wall-clock time of each phase of the last rendered frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PhaseTimings {
    pub clear: Duration,
    pub bin: Duration,
    pub rasterize: Duration,
    pub lines: Duration,
    pub post_filter: Duration,
    pub total: Duration,
}

impl PhaseTimings {
    /// Percentage of the frame spent in `phase`.
    pub fn share(&self, phase: Duration) -> f64 {
        if self.total.is_zero() {
            0.0
        } else {
            phase.as_secs_f64() / self.total.as_secs_f64() * 100.0
        }
    }

    pub fn log_summary(&self) {
        log::debug!(
            "frame {:.2}ms: clear {:.1}% bin {:.1}% raster {:.1}% lines {:.1}% post {:.1}%",
            self.total.as_secs_f64() * 1000.0,
            self.share(self.clear),
            self.share(self.bin),
            self.share(self.rasterize),
            self.share(self.lines),
            self.share(self.post_filter),
        );
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_of_empty_frame_is_zero() {
        let timings = PhaseTimings::default();
        assert_eq!(timings.share(Duration::from_millis(3)), 0.0);
    }

    #[test]
    fn shares_are_percentages() {
        let timings = PhaseTimings {
            bin: Duration::from_millis(5),
            total: Duration::from_millis(20),
            ..PhaseTimings::default()
        };
        assert!((timings.share(timings.bin) - 25.0).abs() < 1e-9);
    }
}
