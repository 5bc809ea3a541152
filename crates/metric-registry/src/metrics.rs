//! Bundled metric implementations.
//!
//! These keep the statistics simple: histograms summarize a sliding window of
//! the most recent samples, meters use exponentially weighted moving averages
//! ticked every five seconds.

use std::collections::VecDeque;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::Clock;
use crate::Counting;
use crate::Metered;
use crate::Sampling;
use crate::Snapshot;
use crate::SystemClock;

/// Number of samples a histogram keeps.
pub const DEFAULT_WINDOW_SIZE: usize = 1028;

const TICK_INTERVAL_NANOS: u64 = 5_000_000_000;
const TICK_INTERVAL_SECS: f64 = 5.0;

/// Incrementing and decrementing counter.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dec(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }
}

impl Counting for Counter {
    fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Distribution of values over the most recent samples.
#[derive(Debug)]
pub struct Histogram {
    count: AtomicI64,
    window: Mutex<VecDeque<f64>>,
    capacity: usize,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW_SIZE)
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            count: AtomicI64::new(0),
            window: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn update(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        let mut window = self.window.lock().expect("poisoned");
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(value);
    }
}

impl Counting for Histogram {
    fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Sampling for Histogram {
    fn snapshot(&self) -> Snapshot {
        let window = self.window.lock().expect("poisoned");
        let (front, back) = window.as_slices();
        let values = [front, back].concat();
        Snapshot::from_values(&values)
    }
}

#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: i64,
    initialized: bool,
}

impl Ewma {
    fn minutes(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-TICK_INTERVAL_SECS / 60.0 / minutes).exp(),
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL_SECS;
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    last_tick: u64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

/// Throughput meter with 1, 5 and 15 minute moving averages.
pub struct Meter {
    clock: Arc<dyn Clock>,
    start: u64,
    state: Mutex<MeterState>,
}

impl Default for Meter {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let start = clock.tick_nanos();
        Self {
            clock,
            start,
            state: Mutex::new(MeterState {
                count: 0,
                last_tick: start,
                m1: Ewma::minutes(1.0),
                m5: Ewma::minutes(5.0),
                m15: Ewma::minutes(15.0),
            }),
        }
    }

    pub fn mark(&self, n: i64) {
        let mut state = self.ticked_state();
        state.count += n;
        state.m1.uncounted += n;
        state.m5.uncounted += n;
        state.m15.uncounted += n;
    }

    fn ticked_state(&self) -> std::sync::MutexGuard<'_, MeterState> {
        let mut state = self.state.lock().expect("poisoned");
        let now = self.clock.tick_nanos();
        let age = now.saturating_sub(state.last_tick);
        if age > TICK_INTERVAL_NANOS {
            state.last_tick = now - age % TICK_INTERVAL_NANOS;
            for _ in 0..age / TICK_INTERVAL_NANOS {
                state.m1.tick();
                state.m5.tick();
                state.m15.tick();
            }
        }
        state
    }
}

impl std::fmt::Debug for Meter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meter")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Counting for Meter {
    fn count(&self) -> i64 {
        self.state.lock().expect("poisoned").count
    }
}

impl Metered for Meter {
    fn one_minute_rate(&self) -> f64 {
        self.ticked_state().m1.rate
    }

    fn five_minute_rate(&self) -> f64 {
        self.ticked_state().m5.rate
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.ticked_state().m15.rate
    }

    fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self.clock.tick_nanos().saturating_sub(self.start);
        if elapsed == 0 {
            return 0.0;
        }
        count as f64 / Duration::from_nanos(elapsed).as_secs_f64()
    }
}

/// Meter of events plus a histogram of their durations in nanoseconds.
#[derive(Debug)]
pub struct Timer {
    meter: Meter,
    histogram: Histogram,
}

impl Default for Timer {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            meter: Meter::with_clock(clock),
            histogram: Histogram::new(),
        }
    }

    pub fn update(&self, duration: Duration) {
        self.histogram.update(duration.as_nanos() as f64);
        self.meter.mark(1);
    }

    /// Time a closure.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let _context = self.start();
        f()
    }

    /// Start timing; the duration is recorded when the context is dropped.
    pub fn start(&self) -> TimerContext<'_> {
        TimerContext {
            timer: self,
            started: self.meter.clock.tick_nanos(),
        }
    }
}

impl Counting for Timer {
    fn count(&self) -> i64 {
        self.meter.count()
    }
}

impl Metered for Timer {
    fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }

    fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }
}

impl Sampling for Timer {
    fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }
}

pub struct TimerContext<'a> {
    timer: &'a Timer,
    started: u64,
}

impl Drop for TimerContext<'_> {
    fn drop(&mut self) {
        let elapsed = self
            .timer
            .meter
            .clock
            .tick_nanos()
            .saturating_sub(self.started);
        self.timer.update(Duration::from_nanos(elapsed));
    }
}
