//! Bar store: merge-on-tick time series of OHLCV bars.
//!
//! The store is the single owner of bar data. Ticks either mutate the open
//! last bar in place or finalize it and append a new one; all derived
//! components borrow read-only views.

use quantdesk_core::{ms_to_bar_time, Bar, Error, Result, Tick};
use tracing::{debug, info};

/// What a tick did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick time behind the last bar; dropped.
    Stale,
    /// The open last bar was updated in place.
    Updated,
    /// The previous bar was finalized and a new bar appended.
    NewBar,
}

/// Append-only/merge-on-tick store of OHLCV bars with a carried CVD baseline.
///
/// Invariant: `last.cvd == baseline + last.delta` at all times. The baseline
/// is the cumulative delta of every finalized bar before the open one; it is
/// reset only by an explicit operator action.
pub struct BarStore {
    bars: Vec<Bar>,
    cvd_baseline: f64,
    max_bars: usize,
}

impl BarStore {
    /// Create an empty store retaining at most `max_bars` bars.
    pub fn new(max_bars: usize) -> Self {
        Self {
            bars: Vec::with_capacity(max_bars.min(4096)),
            cvd_baseline: 0.0,
            max_bars,
        }
    }

    /// Replace the store contents wholesale from seeded history.
    ///
    /// Per-bar `cvd` is rebuilt cumulatively from `initial_cvd`; the baseline
    /// lands so the CVD invariant holds for the last bar. Fails with
    /// `InvalidHistory` on out-of-order times or invalid OHLC relationships;
    /// nothing is replaced on failure.
    pub fn seed_history(&mut self, bars: Vec<Bar>, initial_cvd: f64) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_valid() {
                return Err(Error::invalid_history(format!(
                    "bar {} at time {} has invalid OHLCV",
                    i, bar.time
                )));
            }
            if i > 0 && bar.time <= bars[i - 1].time {
                return Err(Error::invalid_history(format!(
                    "bar times not strictly increasing at index {} ({} <= {})",
                    i,
                    bar.time,
                    bars[i - 1].time
                )));
            }
        }

        self.bars = bars;
        if self.bars.len() > self.max_bars {
            let excess = self.bars.len() - self.max_bars;
            self.bars.drain(0..excess);
        }
        self.rebuild_cvd(initial_cvd);
        info!(bars = self.bars.len(), initial_cvd, "history seeded");
        Ok(())
    }

    /// Apply one kline tick with its feed-computed signed volume delta.
    ///
    /// `signed_delta` is the bar's running signed aggressor volume, reported
    /// the same way the tick reports running volume; the same-bar path
    /// assigns it rather than accumulating, which keeps replays idempotent.
    pub fn apply_tick(&mut self, tick: &Tick, signed_delta: f64) -> TickOutcome {
        let bar_time = ms_to_bar_time(tick.ts_ms);

        let last_time = match self.bars.last() {
            Some(last) => last.time,
            None => {
                self.bars.push(self.bar_from_tick(bar_time, tick, signed_delta));
                return TickOutcome::NewBar;
            }
        };

        if bar_time < last_time {
            debug!(tick_time = bar_time, last_time, "stale tick dropped");
            return TickOutcome::Stale;
        }

        if bar_time == last_time {
            // Still-open bar: the feed resends the full bar state, so the
            // whole OHLCV block is replaced in place.
            if let Some(last) = self.bars.last_mut() {
                last.open = tick.open;
                last.high = tick.high;
                last.low = tick.low;
                last.close = tick.close;
                last.volume = tick.volume;
                last.delta = signed_delta;
                last.cvd = self.cvd_baseline + signed_delta;
            }
            return TickOutcome::Updated;
        }

        // New bar: fold the closing bar's delta into the baseline first.
        if let Some(last) = self.bars.last() {
            self.cvd_baseline += last.delta;
        }
        let bar = self.bar_from_tick(bar_time, tick, signed_delta);
        self.bars.push(bar);
        if self.bars.len() > self.max_bars {
            self.bars.remove(0);
        }
        TickOutcome::NewBar
    }

    fn bar_from_tick(&self, bar_time: i64, tick: &Tick, signed_delta: f64) -> Bar {
        Bar {
            time: bar_time,
            open: tick.open,
            high: tick.high,
            low: tick.low,
            close: tick.close,
            volume: tick.volume,
            delta: signed_delta,
            cvd: self.cvd_baseline + signed_delta,
        }
    }

    /// Zero the baseline and rebuild per-bar CVD from scratch.
    pub fn reset_cvd_baseline(&mut self) {
        self.rebuild_cvd(0.0);
        info!("CVD baseline reset");
    }

    /// Rebuild the per-bar cumulative delta chain from `initial`.
    ///
    /// The baseline excludes the last (open) bar's delta so the invariant
    /// `last.cvd == baseline + last.delta` holds.
    fn rebuild_cvd(&mut self, initial: f64) {
        let mut running = initial;
        let len = self.bars.len();
        for (i, bar) in self.bars.iter_mut().enumerate() {
            bar.cvd = running + bar.delta;
            if i + 1 < len {
                running += bar.delta;
            }
        }
        self.cvd_baseline = running;
    }

    /// All bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// The last (possibly still open) bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Number of bars in the store.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the store holds no bars.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The carried CVD baseline.
    pub fn cvd_baseline(&self) -> f64 {
        self.cvd_baseline
    }
}
