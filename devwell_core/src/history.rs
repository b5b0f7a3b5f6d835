//! Historical aggregation over samples and breaks.
//!
//! Samples are folded into one [`DailyAggregate`] per local calendar day.
//! Break statistics only ever count completed breaks, bucketed by the local
//! day their start falls on.

use crate::clock::local_day;
use crate::{BreakRecord, BreakType, DailyAggregate, WellnessSample};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default number of days the streak walk inspects, today included
pub const DEFAULT_STREAK_LOOKBACK_DAYS: u32 = 5;

/// Append a sample to the aggregate for its local day, creating the
/// aggregate on first use. Returns the updated aggregate.
pub fn record_sample(
    aggregates: &mut Vec<DailyAggregate>,
    sample: WellnessSample,
) -> &DailyAggregate {
    let day = local_day(sample.recorded_at);

    let index = match aggregates.iter().position(|a| a.day == day) {
        Some(index) => index,
        None => {
            tracing::debug!("Starting wellness aggregate for {}", day);
            aggregates.push(DailyAggregate::new(day));
            aggregates.len() - 1
        }
    };

    let aggregate = &mut aggregates[index];
    aggregate.samples.push(sample);
    tracing::debug!(
        "Recorded sample for {} ({} samples, average {})",
        day,
        aggregate.samples.len(),
        aggregate.average_score()
    );
    aggregate
}

/// Aggregate for a given day, if any sample was recorded that day
pub fn aggregate_for(aggregates: &[DailyAggregate], day: NaiveDate) -> Option<&DailyAggregate> {
    aggregates.iter().find(|a| a.day == day)
}

fn completed_on(history: &[BreakRecord], day: NaiveDate) -> impl Iterator<Item = &BreakRecord> {
    history
        .iter()
        .filter(move |b| b.is_completed && local_day(b.started_at) == day)
}

/// Consecutive days, walking back from `today`, with at least one completed
/// break. Looks back at most `lookback_days` days and never reports less
/// than 1.
pub fn current_streak(history: &[BreakRecord], today: NaiveDate, lookback_days: u32) -> u32 {
    let mut streak = 0;

    for offset in 0..lookback_days {
        let day = today - Duration::days(i64::from(offset));
        if completed_on(history, day).next().is_none() {
            break;
        }
        streak += 1;
    }

    streak.max(1)
}

/// Number of completed breaks started on `day`
pub fn total_breaks_on(history: &[BreakRecord], day: NaiveDate) -> usize {
    completed_on(history, day).count()
}

/// Whole minutes spent in completed breaks started on `day` (truncating
/// the summed duration)
pub fn total_break_minutes_on(history: &[BreakRecord], day: NaiveDate) -> i64 {
    let total = completed_on(history, day)
        .filter_map(|b| b.ended_at.map(|end| end - b.started_at))
        .fold(Duration::zero(), |acc, d| acc + d);
    total.num_minutes()
}

/// Headline numbers for the current day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TodayStats {
    pub breaks: usize,
    pub break_minutes: i64,
    pub streak: u32,
}

pub fn today_stats(history: &[BreakRecord], today: NaiveDate, lookback_days: u32) -> TodayStats {
    TodayStats {
        breaks: total_breaks_on(history, today),
        break_minutes: total_break_minutes_on(history, today),
        streak: current_streak(history, today, lookback_days),
    }
}

/// Completed breaks, optionally restricted to one type, in history order
pub fn completed_breaks(history: &[BreakRecord], filter: Option<BreakType>) -> Vec<&BreakRecord> {
    history
        .iter()
        .filter(|b| b.is_completed)
        .filter(|b| filter.map_or(true, |t| b.break_type == t))
        .collect()
}

/// Completed breaks started on `day`, optionally restricted to one type
pub fn breaks_on(
    history: &[BreakRecord],
    day: NaiveDate,
    filter: Option<BreakType>,
) -> Vec<&BreakRecord> {
    completed_on(history, day)
        .filter(|b| filter.map_or(true, |t| b.break_type == t))
        .collect()
}

/// Completed breaks grouped by local start day, newest day first. Within a
/// day, breaks keep history order.
pub fn breaks_by_day(
    history: &[BreakRecord],
    filter: Option<BreakType>,
) -> Vec<(NaiveDate, Vec<&BreakRecord>)> {
    let mut grouped: BTreeMap<NaiveDate, Vec<&BreakRecord>> = BTreeMap::new();
    for record in completed_breaks(history, filter) {
        grouped
            .entry(local_day(record.started_at))
            .or_default()
            .push(record);
    }
    grouped.into_iter().rev().collect()
}
