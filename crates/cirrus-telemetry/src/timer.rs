//! Debug-level timers.

use std::time::{Duration, Instant};

/// Measures a named section and logs its duration at debug level.
///
/// The duration is logged by [`finish`](Self::finish) or, if the timer is
/// dropped without finishing, on drop.
///
/// ```
/// use cirrus_telemetry::Timer;
///
/// let timer = Timer::start("cirrus.load");
/// let elapsed = timer.finish();
/// assert!(elapsed.as_secs() < 1);
/// ```
#[derive(Debug)]
pub struct Timer {
    note: &'static str,
    started: Instant,
    done: bool,
}

impl Timer {
    /// Starts a timer.
    #[must_use]
    pub fn start(note: &'static str) -> Self {
        Self {
            note,
            started: Instant::now(),
            done: false,
        }
    }

    /// The section name.
    #[must_use]
    pub const fn note(&self) -> &'static str {
        self.note
    }

    /// Time elapsed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the timer, logs and returns the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.done = true;
        let elapsed = self.elapsed();
        log_elapsed(self.note, elapsed);
        elapsed
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.done {
            log_elapsed(self.note, self.elapsed());
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_elapsed(note: &str, elapsed: Duration) {
    tracing::debug!(
        timer = note,
        duration_ms = elapsed.as_micros() as f64 / 1000.0,
        "timer finished"
    );
}
