use crate::allocation::Position;
use crate::models::PerformancePoint;
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub struct TimelineReconstructor;

impl TimelineReconstructor {
    /// Sorted union of every date in the positions' valid windows.
    pub fn aligned_dates(positions: &[Position<'_>]) -> BTreeSet<NaiveDate> {
        positions
            .iter()
            .flat_map(|p| p.series.valid_closes().map(|(date, _)| date))
            .collect()
    }

    /// Daily portfolio value at full precision.
    ///
    /// Each date sums `shares x close` over the positions quoted that day.
    /// Dates nobody quoted never appear, so values across days with different
    /// coverage are not strictly comparable.
    pub fn reconstruct(positions: &[Position<'_>]) -> Vec<PerformancePoint> {
        Self::aligned_dates(positions)
            .into_iter()
            .filter_map(|date| {
                let mut value = 0.0;
                let mut contributors = 0usize;
                for position in positions {
                    if let Some(close) = position.series.close_on(date) {
                        value += position.holding.shares * close;
                        contributors += 1;
                    }
                }
                (contributors > 0).then_some(PerformancePoint { date, value })
            })
            .collect()
    }
}
