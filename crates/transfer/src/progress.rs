use std::time::{Duration, Instant};

/// Default minimum interval between progress emissions.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Progress snapshot for one phase of a transfer.
///
/// Either field is `None` when it cannot be computed: percentage when the
/// total size is unknown, ETA additionally while nothing has moved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub percent: Option<u8>,
    pub eta: Option<Duration>,
}

/// Estimates completion from cumulative bytes moved since `started`.
///
/// `bytes_total == 0` means the total is unknown: percentage and ETA are
/// both indeterminate. ETA is the remaining bytes over the average speed so
/// far, rounded to whole seconds, never negative.
pub fn estimate(started: Instant, bytes_done: u64, bytes_total: u64) -> Progress {
    let percent = if bytes_total > 0 {
        Some((bytes_done.saturating_mul(100) / bytes_total).min(100) as u8)
    } else {
        None
    };

    let eta = if bytes_done == 0 || bytes_total == 0 {
        None
    } else {
        let elapsed = started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            None
        } else {
            let speed = bytes_done as f64 / elapsed;
            let remaining = bytes_total.saturating_sub(bytes_done) as f64;
            Some(Duration::from_secs((remaining / speed).round().max(0.0) as u64))
        }
    };

    Progress { percent, eta }
}

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

/// Minimum-interval gate for progress emissions.
///
/// The first call to [`ready`](Self::ready) always passes; later calls pass
/// only after the interval has elapsed since the last pass.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle with the given minimum interval.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Returns true if an emission is due, recording the pass.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
