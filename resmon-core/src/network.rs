use crate::error::Result;
use crate::metrics::NetworkRate;
use parking_lot::Mutex;
use std::time::Instant;

/// Cumulative byte counters summed over all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterReading {
    pub sent_bytes: u64,
    pub recv_bytes: u64,
}

#[derive(Debug, Default)]
struct NetworkBaseline {
    last_sent_bytes: u64,
    last_recv_bytes: u64,
    last_sample: Option<Instant>,
}

/// Turns cumulative network counters into per-second rates.
///
/// The baseline is read and replaced inside a single critical section, so
/// concurrent callers never compute a delta against a half-updated baseline.
#[derive(Debug, Default)]
pub struct NetworkRateTracker {
    baseline: Mutex<NetworkBaseline>,
}

impl NetworkRateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.baseline.lock().last_sample.is_some()
    }

    /// Reads fresh counters through `read` and turns them into a rate.
    ///
    /// The baseline stays locked across the read, the timestamp and the
    /// update, so concurrent samplers are applied in the order they read.
    /// A failed read leaves the baseline untouched.
    pub fn sample_with<F>(&self, read: F) -> Result<NetworkRate>
    where
        F: FnOnce() -> Result<CounterReading>,
    {
        let mut baseline = self.baseline.lock();
        let now = Instant::now();
        let reading = read()?;
        Ok(baseline.advance(reading, now))
    }

    pub fn observe(&self, reading: CounterReading, now: Instant) -> NetworkRate {
        self.baseline.lock().advance(reading, now)
    }
}

impl NetworkBaseline {
    fn advance(&mut self, reading: CounterReading, now: Instant) -> NetworkRate {
        let rate = match self.last_sample {
            None => NetworkRate::default(),
            Some(last) => {
                // A `now` earlier than the baseline counts as zero elapsed time.
                let elapsed = now
                    .checked_duration_since(last)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                if elapsed > 0.0 {
                    NetworkRate {
                        bytes_sent_per_sec: per_second(
                            reading.sent_bytes,
                            self.last_sent_bytes,
                            elapsed,
                        ),
                        bytes_recv_per_sec: per_second(
                            reading.recv_bytes,
                            self.last_recv_bytes,
                            elapsed,
                        ),
                    }
                } else {
                    NetworkRate::default()
                }
            }
        };

        self.last_sent_bytes = reading.sent_bytes;
        self.last_recv_bytes = reading.recv_bytes;
        self.last_sample = Some(match self.last_sample {
            Some(last) if last > now => last,
            _ => now,
        });

        rate
    }
}

// Counters that went backwards (interface reset) report no traffic.
fn per_second(current: u64, last: u64, elapsed_secs: f64) -> u64 {
    (current.saturating_sub(last) as f64 / elapsed_secs) as u64
}
