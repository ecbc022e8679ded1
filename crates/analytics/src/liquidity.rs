//! Liquidity structure detection: swing points, breaks of structure,
//! stop-sweeps, and fair value gaps.
//!
//! Runs on bar close only; each pass is a pure function of the bar slice
//! and replaces the previous snapshot wholesale.

use quantdesk_core::{
    config::LiquidityConfig, Bar, Direction, FairValueGap, LiquiditySnapshot, Side,
    StructureBreak, Sweep,
};

/// Index of a detected swing point.
#[derive(Debug, Clone, Copy)]
struct SwingPoint {
    /// Bar index of the swing extreme.
    index: usize,
    /// The extreme price (high for swing highs, low for swing lows).
    price: f64,
}

/// Liquidity structure detector.
pub struct LiquidityDetector {
    cfg: LiquidityConfig,
}

impl LiquidityDetector {
    /// Create a new detector.
    pub fn new(cfg: LiquidityConfig) -> Self {
        Self { cfg }
    }

    /// Run a full detection pass over the bar slice.
    pub fn detect(&self, bars: &[Bar]) -> LiquiditySnapshot {
        let mut snapshot = LiquiditySnapshot::default();
        if bars.len() < 3 {
            return snapshot;
        }
        let last_close = bars[bars.len() - 1].close;

        snapshot.gaps = self.detect_gaps(bars, last_close);
        let (highs, lows) = self.find_swings(bars);
        self.resolve_swings(bars, &highs, &lows, &mut snapshot);

        cap(&mut snapshot.sweeps, self.cfg.max_events);
        cap(&mut snapshot.breaks, self.cfg.max_events);
        cap(&mut snapshot.gaps, self.cfg.max_events);
        snapshot
    }

    /// Three-bar imbalances over the trailing scan window.
    ///
    /// A gap's `resolved` flag is recomputed against the current last close
    /// on every pass, so a gap can only read resolved while price actually
    /// sits beyond it.
    fn detect_gaps(&self, bars: &[Bar], last_close: f64) -> Vec<FairValueGap> {
        let mut gaps = Vec::new();
        let start = bars.len().saturating_sub(self.cfg.gap_scan_bars).max(2);
        for i in start..bars.len() {
            let cur = &bars[i];
            let ref_bar = &bars[i - 2];
            if cur.low > ref_bar.high {
                gaps.push(FairValueGap {
                    start_price: ref_bar.high,
                    end_price: cur.low,
                    direction: Direction::Bullish,
                    resolved: last_close < ref_bar.high,
                    bar_time: cur.time,
                });
            } else if cur.high < ref_bar.low {
                gaps.push(FairValueGap {
                    start_price: cur.high,
                    end_price: ref_bar.low,
                    direction: Direction::Bearish,
                    resolved: last_close > ref_bar.low,
                    bar_time: cur.time,
                });
            }
        }
        gaps
    }

    /// Find swing highs and lows.
    ///
    /// A bar is a swing high when its high strictly exceeds every other high
    /// within `swing_strength` bars on each side. The right window shrinks
    /// near the end of history, so the latest bars can register swings with
    /// incomplete look-ahead confirmation; such late swings enter break and
    /// sweep evaluation without waiting for a full right window. Carried
    /// over as observed behavior, deliberately not changed.
    fn find_swings(&self, bars: &[Bar]) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
        let n = self.cfg.swing_strength;
        let mut highs = Vec::new();
        let mut lows = Vec::new();

        for i in n..bars.len() {
            let right_end = (i + n).min(bars.len() - 1);
            // Bar i sits at offset n within its context window.
            let window = &bars[i - n..=right_end];

            let is_high = window
                .iter()
                .enumerate()
                .all(|(j, b)| j == n || b.high < bars[i].high);
            if is_high {
                highs.push(SwingPoint {
                    index: i,
                    price: bars[i].high,
                });
            }

            let is_low = window
                .iter()
                .enumerate()
                .all(|(j, b)| j == n || b.low > bars[i].low);
            if is_low {
                lows.push(SwingPoint {
                    index: i,
                    price: bars[i].low,
                });
            }
        }
        (highs, lows)
    }

    /// Scan forward from each tracked swing for a break or a sweep.
    ///
    /// Each swing resolves to at most one event: the first close through the
    /// level records a break of structure, the first wick through without a
    /// close-through records a sweep, and either stops the scan.
    fn resolve_swings(
        &self,
        bars: &[Bar],
        highs: &[SwingPoint],
        lows: &[SwingPoint],
        snapshot: &mut LiquiditySnapshot,
    ) {
        let tracked = self.cfg.max_tracked_swings;

        for swing in highs.iter().skip(highs.len().saturating_sub(tracked)) {
            for bar in &bars[swing.index + 1..] {
                if bar.close > swing.price {
                    snapshot.breaks.push(StructureBreak {
                        price: swing.price,
                        direction: Direction::Bullish,
                        bar_time: bar.time,
                    });
                    break;
                }
                if bar.high > swing.price {
                    snapshot.sweeps.push(Sweep {
                        price: swing.price,
                        side: Side::Buy,
                        bar_time: bar.time,
                    });
                    break;
                }
            }
        }

        for swing in lows.iter().skip(lows.len().saturating_sub(tracked)) {
            for bar in &bars[swing.index + 1..] {
                if bar.close < swing.price {
                    snapshot.breaks.push(StructureBreak {
                        price: swing.price,
                        direction: Direction::Bearish,
                        bar_time: bar.time,
                    });
                    break;
                }
                if bar.low < swing.price {
                    snapshot.sweeps.push(Sweep {
                        price: swing.price,
                        side: Side::Sell,
                        bar_time: bar.time,
                    });
                    break;
                }
            }
        }
    }
}

/// Keep only the most recently detected `max` events.
fn cap<T>(events: &mut Vec<T>, max: usize) {
    if events.len() > max {
        events.drain(..events.len() - max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(time: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time,
            open,
            high,
            low,
            close,
            volume: 100.0,
            delta: 0.0,
            cvd: 0.0,
        }
    }

    fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                make_bar(
                    (i as i64 + 1) * 60,
                    price,
                    price + 1.0,
                    price - 1.0,
                    price,
                )
            })
            .collect()
    }

    fn detector() -> LiquidityDetector {
        LiquidityDetector::new(LiquidityConfig::default())
    }

    #[test]
    fn test_empty_history() {
        let snap = detector().detect(&[]);
        assert!(snap.sweeps.is_empty());
        assert!(snap.breaks.is_empty());
        assert!(snap.gaps.is_empty());
    }

    #[test]
    fn test_bullish_gap_detected() {
        let mut bars = flat_bars(10, 100.0);
        // Gap up: bar 11 low (102.5) clears bar 9 high (101). The next bar
        // wicks back into overlap so it creates no second gap.
        bars.push(make_bar(660, 103.0, 105.0, 102.5, 104.0));
        bars.push(make_bar(720, 104.5, 106.0, 100.5, 105.0));

        let snap = detector().detect(&bars);
        assert_eq!(snap.gaps.len(), 1);
        let gap = &snap.gaps[0];
        assert_eq!(gap.direction, Direction::Bullish);
        assert!((gap.start_price - 101.0).abs() < 1e-10);
        assert!((gap.end_price - 102.5).abs() < 1e-10);
        // Last close (105) is above the gap: unresolved.
        assert!(!gap.resolved);
    }

    #[test]
    fn test_bullish_gap_resolution_follows_last_close() {
        let mut bars = flat_bars(10, 100.0);
        bars.push(make_bar(660, 103.0, 105.0, 102.5, 104.0));
        // Price trades all the way back below the gap start.
        bars.push(make_bar(720, 104.0, 104.5, 100.0, 100.5));

        let snap = detector().detect(&bars);
        let gap = snap
            .gaps
            .iter()
            .find(|g| g.direction == Direction::Bullish)
            .unwrap();
        assert!(gap.resolved);
    }

    #[test]
    fn test_gap_resolution_is_monotone_without_recrossing() {
        let mut bars = flat_bars(10, 100.0);
        bars.push(make_bar(660, 103.0, 105.0, 102.5, 104.0));
        // Price trades back below the gap start (101) and resolves it.
        bars.push(make_bar(720, 104.0, 104.5, 100.0, 100.5));

        // Extend the tape bar by bar, never re-crossing the gap start, and
        // re-run detection each time: the gap must stay resolved on every
        // pass.
        for i in 0..5 {
            let snap = detector().detect(&bars);
            let gap = snap.gaps.iter().find(|g| g.bar_time == 660).unwrap();
            assert!(gap.resolved, "gap unresolved after {} extra bars", i);

            bars.push(make_bar(780 + i * 60, 100.0, 100.8, 99.2, 100.0));
        }
    }

    #[test]
    fn test_bearish_gap_detected() {
        let mut bars = flat_bars(10, 100.0);
        // Gap down: bar 11 high (96) sits under bar 9 low (99).
        bars.push(make_bar(660, 95.5, 96.0, 94.0, 95.0));
        bars.push(make_bar(720, 95.0, 95.5, 93.5, 94.0));

        let snap = detector().detect(&bars);
        let gap = snap
            .gaps
            .iter()
            .find(|g| g.direction == Direction::Bearish)
            .unwrap();
        assert!((gap.start_price - 96.0).abs() < 1e-10);
        assert!((gap.end_price - 99.0).abs() < 1e-10);
        assert!(!gap.resolved);
    }

    #[test]
    fn test_monotonic_rise_has_no_interior_swings() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let p = 100.0 + i as f64;
                make_bar((i as i64 + 1) * 60, p, p + 0.5, p - 0.5, p)
            })
            .collect();

        let (highs, lows) = detector().find_swings(&bars);
        // Rising lows can never print a swing low.
        assert!(lows.is_empty());
        // The truncated right window lets the final bar register as a swing
        // high; nothing interior qualifies.
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].index, bars.len() - 1);
    }

    #[test]
    fn test_sweep_records_exactly_one_event() {
        let mut bars = flat_bars(10, 100.0);
        // Swing high at 105.
        bars.push(make_bar(660, 100.0, 105.0, 99.5, 100.5));
        bars.extend((0..6).map(|i| {
            make_bar(720 + i * 60, 100.0, 101.0, 99.0, 100.0)
        }));
        // Wick through 105, close back below: a stop-sweep, not a break.
        bars.push(make_bar(1200, 100.0, 106.0, 99.5, 101.0));

        let snap = detector().detect(&bars);
        let buy_sweeps: Vec<_> = snap
            .sweeps
            .iter()
            .filter(|s| s.side == Side::Buy)
            .collect();
        assert_eq!(buy_sweeps.len(), 1);
        assert!((buy_sweeps[0].price - 105.0).abs() < 1e-10);
        assert_eq!(buy_sweeps[0].bar_time, 1200);
        // No close-through happened, so no bullish break for that swing.
        assert!(snap
            .breaks
            .iter()
            .all(|b| (b.price - 105.0).abs() > 1e-10));
    }

    #[test]
    fn test_close_through_records_break_not_sweep() {
        let mut bars = flat_bars(10, 100.0);
        bars.push(make_bar(660, 100.0, 105.0, 99.5, 100.5));
        bars.extend((0..6).map(|i| {
            make_bar(720 + i * 60, 100.0, 101.0, 99.0, 100.0)
        }));
        // Close through the swing high.
        bars.push(make_bar(1200, 100.0, 107.0, 99.5, 106.0));

        let snap = detector().detect(&bars);
        assert!(snap
            .breaks
            .iter()
            .any(|b| b.direction == Direction::Bullish && (b.price - 105.0).abs() < 1e-10));
        assert!(!snap.has_sweep(Side::Buy));
    }

    #[test]
    fn test_swing_low_sweep_is_sell_side() {
        let mut bars = flat_bars(10, 100.0);
        // Swing low at 95.
        bars.push(make_bar(660, 100.0, 100.5, 95.0, 99.5));
        bars.extend((0..6).map(|i| {
            make_bar(720 + i * 60, 100.0, 101.0, 99.0, 100.0)
        }));
        // Wick below 95, close back above.
        bars.push(make_bar(1200, 100.0, 100.5, 94.0, 99.0));

        let snap = detector().detect(&bars);
        assert!(snap.has_sweep(Side::Sell));
        assert!(!snap.has_sweep(Side::Buy));
    }

    #[test]
    fn test_event_caps() {
        // A steep ramp gaps every bar against the bar two back.
        let mut bars = flat_bars(5, 100.0);
        for i in 0..30i64 {
            let p = 130.0 + i as f64 * 15.0;
            bars.push(make_bar(360 + i * 60, p, p + 1.0, p - 1.0, p));
        }
        let snap = detector().detect(&bars);
        assert_eq!(snap.gaps.len(), 8);
        // Most recent detections are the ones retained.
        let last = snap.gaps.last().unwrap();
        assert_eq!(last.bar_time, 360 + 29 * 60);
    }
}
