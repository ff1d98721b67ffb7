use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use quanta::{Clock, Instant as QuantaInstant};

/// Snapshot of render metrics suitable for logging (non-RT).
#[derive(Debug, Clone)]
pub struct PerformanceSnapshot {
    /// Total number of audio frames rendered since creation or last reset.
    pub frames_processed: u64,
    /// Total number of callback invocations.
    pub callback_count: u64,
    /// Callbacks that produced silence because the processor was busy.
    pub silence_fallbacks: u64,
    /// Minimum callback duration observed (ns).
    pub min_callback_nanos: Option<u64>,
    /// Maximum callback duration observed (ns).
    pub max_callback_nanos: Option<u64>,
    /// EMA of callback duration in nanoseconds.
    pub ema_callback_nanos: f64,
    pub expected_callback_nanos: f64,
    pub avg_load_percent: f64,
}

impl fmt::Display for PerformanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let micros = |nanos: Option<u64>| nanos.map_or(0.0, |n| n as f64 / 1_000.0);
        write!(
            f,
            "{} callbacks, {} frames, {} silent fallbacks, callback min/max/avg {:.1}/{:.1}/{:.1} us, load {:.2}%",
            self.callback_count,
            self.frames_processed,
            self.silence_fallbacks,
            micros(self.min_callback_nanos),
            micros(self.max_callback_nanos),
            self.ema_callback_nanos / 1_000.0,
            self.avg_load_percent,
        )
    }
}

/// Real-time-safe performance monitor.
///
/// On the real-time path only call the `add_*`/`increment_*` methods and
/// `scoped_callback()`. Those use atomics only.
///
/// `snapshot` reads the atomics and does floating point work; call it from a
/// non-realtime thread.
pub struct PerformanceMonitor {
    clock: Clock,
    frame_size: usize,
    sample_rate: f32,

    frames_processed: AtomicU64,
    callback_count: AtomicU64,
    silence_fallbacks: AtomicU64,

    min_callback_nanos: AtomicU64,
    max_callback_nanos: AtomicU64,
    /// EMA of callback duration stored as f64 bits
    ema_callback_bits: AtomicU64,

    ema_alpha: f64,
}

impl PerformanceMonitor {
    /// `frame_size` is the expected frames per callback, used for the load
    /// figure. `ema_alpha` in `(0, 1]` sets how fast the average follows.
    pub fn new(frame_size: usize, sample_rate: f32, ema_alpha: f64) -> Self {
        assert!(ema_alpha > 0.0 && ema_alpha <= 1.0);
        Self {
            clock: Clock::new(),
            frame_size,
            sample_rate,
            frames_processed: AtomicU64::new(0),
            callback_count: AtomicU64::new(0),
            silence_fallbacks: AtomicU64::new(0),
            min_callback_nanos: AtomicU64::new(u64::MAX),
            max_callback_nanos: AtomicU64::new(0),
            ema_callback_bits: AtomicU64::new(0u64),
            ema_alpha,
        }
    }

    #[inline(always)]
    pub fn add_frames_processed(&self, n: u64) {
        self.frames_processed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn increment_callback_count(&self) {
        self.callback_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn increment_silence_fallbacks(&self) {
        self.silence_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a callback duration. Updates min, max and EMA with CAS loops.
    #[inline(always)]
    pub fn record_callback_duration_nanos(&self, nanos: u64) {
        self.min_callback_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_callback_nanos.fetch_max(nanos, Ordering::Relaxed);

        // EMA_new = alpha * x + (1 - alpha) * EMA_old
        let alpha = self.ema_alpha;
        let mut old_bits = self.ema_callback_bits.load(Ordering::Relaxed);
        loop {
            let old_f = f64::from_bits(old_bits);
            let new_f = alpha * (nanos as f64) + (1.0 - alpha) * old_f;
            match self.ema_callback_bits.compare_exchange_weak(
                old_bits,
                new_f.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(found) => old_bits = found,
            }
        }
    }

    #[inline(always)]
    pub fn record_callback_duration(&self, d: Duration) {
        self.record_callback_duration_nanos(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
    }

    /// Returns a guard that counts the callback now and records its duration
    /// when dropped.
    ///
    /// ```ignore
    /// let _g = monitor.scoped_callback();
    /// // ... callback work ...
    /// ```
    #[inline(always)]
    pub fn scoped_callback(&self) -> RealtimeGuard<'_> {
        self.increment_callback_count();
        RealtimeGuard {
            monitor: self,
            start: self.clock.now(),
        }
    }

    /// Read the current metrics. With `reset_peaks` the min/max/EMA restart
    /// from scratch afterwards.
    pub fn snapshot(&self, reset_peaks: bool) -> PerformanceSnapshot {
        let frames_processed = self.frames_processed.load(Ordering::Relaxed);
        let callback_count = self.callback_count.load(Ordering::Relaxed);
        let silence_fallbacks = self.silence_fallbacks.load(Ordering::Relaxed);
        let min_raw = self.min_callback_nanos.load(Ordering::Relaxed);
        let max_raw = self.max_callback_nanos.load(Ordering::Relaxed);
        let ema_f = f64::from_bits(self.ema_callback_bits.load(Ordering::Relaxed));
        let expected_callback_nanos =
            (self.frame_size as f64 / self.sample_rate as f64) * 1_000_000_000.0;
        let avg_load_percent = if expected_callback_nanos > 0.0 {
            (ema_f / expected_callback_nanos) * 100.0
        } else {
            0.0
        };

        // u64::MAX / 0 mean "nothing recorded yet"
        let min_callback_nanos = (min_raw != u64::MAX).then_some(min_raw);
        let max_callback_nanos = (max_raw != 0).then_some(max_raw);

        if reset_peaks {
            self.min_callback_nanos.store(u64::MAX, Ordering::Relaxed);
            self.max_callback_nanos.store(0, Ordering::Relaxed);
            self.ema_callback_bits.store(0u64, Ordering::Relaxed);
        }

        PerformanceSnapshot {
            frames_processed,
            callback_count,
            silence_fallbacks,
            min_callback_nanos,
            max_callback_nanos,
            ema_callback_nanos: ema_f,
            expected_callback_nanos,
            avg_load_percent,
        }
    }
}

/// Records callback latency on drop. Atomics only, no locks or allocations.
pub struct RealtimeGuard<'a> {
    monitor: &'a PerformanceMonitor,
    start: QuantaInstant,
}

impl Drop for RealtimeGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.monitor.clock.now().saturating_duration_since(self.start);
        self.monitor.record_callback_duration(elapsed);
    }
}
