use chrono::NaiveDate;

use crate::ledger::view::LedgerView;
use crate::models::item::LineItem;
use crate::models::stats::TrendPoint;

/// A point is emitted once more than this many days separate it from the
/// previous one.
pub const TREND_STEP_DAYS: i64 = 7;

/// Builds the trailing-average trend shown on the dashboard chart.
pub struct TrendService;

impl TrendService {
    pub fn new() -> Self {
        Self
    }

    /// Walk the ledger oldest to newest, keeping a running average of the
    /// bucket totals. The returned iterator is lazy; clone it to restart.
    pub fn average_trend<'a>(&self, ledger: &'a LedgerView) -> AverageTrend<'a> {
        AverageTrend::new(ledger.entries())
    }
}

impl Default for TrendService {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy sequence of `TrendPoint`s over a ledger snapshot.
///
/// Not a sliding window: the average always covers every bucket from the
/// oldest one. Whatever has accumulated after the last emitted point is
/// flushed once at the end, labelled with the newest bucket's date.
#[derive(Debug, Clone)]
pub struct AverageTrend<'a> {
    remaining: std::iter::Rev<std::slice::Iter<'a, LineItem>>,
    last_emitted: Option<NaiveDate>,
    newest: Option<NaiveDate>,
    sum: f64,
    count: usize,
    emitted_count: usize,
}

impl<'a> AverageTrend<'a> {
    fn new(entries: &'a [LineItem]) -> Self {
        let totals = || entries.iter().filter(|e| e.is_total());
        Self {
            remaining: entries.iter().rev(),
            last_emitted: totals().last().map(|t| t.date),
            newest: totals().next().map(|t| t.date),
            sum: 0.0,
            count: 0,
            emitted_count: 0,
        }
    }

    fn average(&self) -> f64 {
        self.sum / self.count as f64
    }
}

impl Iterator for AverageTrend<'_> {
    type Item = TrendPoint;

    fn next(&mut self) -> Option<TrendPoint> {
        for entry in self.remaining.by_ref() {
            if !entry.is_total() {
                continue;
            }
            self.sum += entry.price;
            self.count += 1;

            let since = self.last_emitted?;
            if (entry.date - since).num_days() > TREND_STEP_DAYS {
                self.last_emitted = Some(entry.date);
                self.emitted_count = self.count;
                return Some(TrendPoint {
                    date: entry.date,
                    average: self.average(),
                });
            }
        }

        if self.emitted_count != self.count {
            self.emitted_count = self.count;
            return Some(TrendPoint {
                date: self.newest?,
                average: self.average(),
            });
        }
        None
    }
}
