//! Bounded trade history with daily counters
//!
//! Backs the psychological score and the cascade veto. Keeps a rolling
//! window of recent trades plus counters that reset at the UTC date
//! boundary. Consecutive-loss count deliberately survives the rollover.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DEFAULT_WINDOW: usize = 50;

/// One completed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub pnl: Decimal,
}

impl TradeRecord {
    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }
}

/// Rolling trade window plus day-scoped counters
#[derive(Debug, Clone)]
pub struct TradeHistory {
    window: VecDeque<TradeRecord>,
    capacity: usize,
    day: Option<NaiveDate>,
    trades_today: u32,
    daily_pnl: Decimal,
    violations_today: Vec<String>,
    consecutive_losses: u32,
}

impl Default for TradeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl TradeHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            day: None,
            trades_today: 0,
            daily_pnl: Decimal::ZERO,
            violations_today: Vec::new(),
            consecutive_losses: 0,
        }
    }

    /// Reset day-scoped counters when the UTC date has changed
    ///
    /// Recording operations call this internally; callers that only read
    /// should call it first so stale counters from yesterday never leak
    /// into today's evaluation.
    pub fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.day != Some(today) {
            self.day = Some(today);
            self.trades_today = 0;
            self.daily_pnl = Decimal::ZERO;
            self.violations_today.clear();
        }
    }

    /// Record a completed trade
    pub fn record_trade(&mut self, record: TradeRecord) {
        self.roll_day(record.timestamp);
        self.trades_today += 1;
        self.daily_pnl += record.pnl;
        if record.is_loss() {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }
        self.window.push_back(record);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// Record a rule violation for today
    pub fn record_violation(&mut self, now: DateTime<Utc>, rule: impl Into<String>) {
        self.roll_day(now);
        self.violations_today.push(rule.into());
    }

    pub fn trades_today(&self) -> u32 {
        self.trades_today
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.daily_pnl
    }

    pub fn violations_today(&self) -> &[String] {
        &self.violations_today
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    /// Trades recorded within the trailing hour
    pub fn trades_in_last_hour(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::hours(1);
        self.window.iter().filter(|t| t.timestamp > cutoff).count()
    }

    /// Losses among the most recent `n` trades
    pub fn losses_in_last(&self, n: usize) -> usize {
        self.window
            .iter()
            .rev()
            .take(n)
            .filter(|t| t.is_loss())
            .count()
    }

    /// Distinct hours of day traded today
    pub fn distinct_trading_hours_today(&self, now: DateTime<Utc>) -> usize {
        let today = now.date_naive();
        let mut seen = [false; 24];
        for trade in &self.window {
            if trade.timestamp.date_naive() == today {
                seen[trade.timestamp.hour() as usize % 24] = true;
            }
        }
        seen.iter().filter(|h| **h).count()
    }

    /// True if any trade today executed at or after `cutoff`
    pub fn traded_at_or_after_today(&self, now: DateTime<Utc>, cutoff: NaiveTime) -> bool {
        let today = now.date_naive();
        self.window
            .iter()
            .any(|t| t.timestamp.date_naive() == today && t.timestamp.time() >= cutoff)
    }

    /// Smallest gap today between a loss and the trade that followed it
    pub fn min_gap_after_loss_today(&self, now: DateTime<Utc>) -> Option<Duration> {
        let today = now.date_naive();
        let mut min_gap: Option<Duration> = None;
        for (prev, next) in self.window.iter().zip(self.window.iter().skip(1)) {
            if prev.is_loss()
                && prev.timestamp.date_naive() == today
                && next.timestamp.date_naive() == today
            {
                let gap = next.timestamp - prev.timestamp;
                min_gap = Some(match min_gap {
                    Some(current) if current <= gap => current,
                    _ => gap,
                });
            }
        }
        min_gap
    }

    /// True if any `count` consecutive trades all fall inside `span`
    pub fn has_trade_cluster(&self, count: usize, span: Duration) -> bool {
        if count < 2 || self.window.len() < count {
            return false;
        }
        let stamps: Vec<DateTime<Utc>> = self.window.iter().map(|t| t.timestamp).collect();
        stamps
            .windows(count)
            .any(|run| run[count - 1] - run[0] <= span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn trade(ts: DateTime<Utc>, pnl: Decimal) -> TradeRecord {
        TradeRecord { timestamp: ts, pnl }
    }

    #[test]
    fn test_consecutive_losses_reset_by_win() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(10, 0), dec!(-5)));
        history.record_trade(trade(at(10, 30), dec!(-3)));
        assert_eq!(history.consecutive_losses(), 2);

        history.record_trade(trade(at(11, 0), dec!(7)));
        assert_eq!(history.consecutive_losses(), 0);
    }

    #[test]
    fn test_day_rollover_resets_daily_counters_not_streak() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(22, 0), dec!(-5)));
        history.record_violation(at(22, 5), "late_entry");
        assert_eq!(history.trades_today(), 1);
        assert_eq!(history.violations_today().len(), 1);
        assert_eq!(history.daily_pnl(), dec!(-5));

        let next_day = at(10, 0) + Duration::days(1);
        history.roll_day(next_day);
        assert_eq!(history.trades_today(), 0);
        assert!(history.violations_today().is_empty());
        assert_eq!(history.daily_pnl(), Decimal::ZERO);
        // Loss streak carries across the boundary
        assert_eq!(history.consecutive_losses(), 1);
    }

    #[test]
    fn test_trades_in_last_hour() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(9, 0), dec!(1)));
        history.record_trade(trade(at(10, 10), dec!(1)));
        history.record_trade(trade(at(10, 50), dec!(1)));
        assert_eq!(history.trades_in_last_hour(at(11, 0)), 2);
    }

    #[test]
    fn test_losses_in_last_n() {
        let mut history = TradeHistory::default();
        for (minute, pnl) in [(0, dec!(-1)), (5, dec!(2)), (10, dec!(-1)), (15, dec!(-1)), (20, dec!(3))] {
            history.record_trade(trade(at(10, minute), pnl));
        }
        assert_eq!(history.losses_in_last(5), 3);
        assert_eq!(history.losses_in_last(2), 1);
    }

    #[test]
    fn test_distinct_hours_and_late_trading() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(9, 0), dec!(1)));
        history.record_trade(trade(at(9, 30), dec!(1)));
        history.record_trade(trade(at(14, 0), dec!(1)));
        history.record_trade(trade(at(20, 15), dec!(1)));

        let now = at(21, 0);
        assert_eq!(history.distinct_trading_hours_today(now), 3);
        assert!(history.traded_at_or_after_today(now, NaiveTime::from_hms_opt(20, 0, 0).unwrap()));
        assert!(!history.traded_at_or_after_today(now, NaiveTime::from_hms_opt(21, 0, 0).unwrap()));
    }

    #[test]
    fn test_revenge_gap_after_loss() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(10, 0), dec!(-4)));
        history.record_trade(trade(at(10, 12), dec!(2)));
        history.record_trade(trade(at(11, 0), dec!(-1)));
        history.record_trade(trade(at(11, 45), dec!(1)));

        let gap = history.min_gap_after_loss_today(at(12, 0)).unwrap();
        assert_eq!(gap, Duration::minutes(12));
    }

    #[test]
    fn test_no_revenge_gap_without_losses() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(10, 0), dec!(4)));
        history.record_trade(trade(at(10, 5), dec!(2)));
        assert!(history.min_gap_after_loss_today(at(12, 0)).is_none());
    }

    #[test]
    fn test_trade_cluster_detection() {
        let mut history = TradeHistory::default();
        history.record_trade(trade(at(10, 0), dec!(1)));
        history.record_trade(trade(at(10, 10), dec!(1)));
        history.record_trade(trade(at(10, 25), dec!(1)));
        assert!(history.has_trade_cluster(3, Duration::minutes(30)));

        let mut sparse = TradeHistory::default();
        sparse.record_trade(trade(at(10, 0), dec!(1)));
        sparse.record_trade(trade(at(11, 0), dec!(1)));
        sparse.record_trade(trade(at(12, 0), dec!(1)));
        assert!(!sparse.has_trade_cluster(3, Duration::minutes(30)));
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut history = TradeHistory::new(3);
        for minute in 0..5 {
            history.record_trade(trade(at(10, minute), dec!(-1)));
        }
        assert_eq!(history.losses_in_last(10), 3);
        // Daily counter keeps the true total even after eviction
        assert_eq!(history.trades_today(), 5);
    }
}
