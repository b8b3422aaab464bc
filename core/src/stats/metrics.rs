//! Pure metric functions used by every dashboard view.
//!
//! RULE: nothing in this module touches the store or the clock. Callers pass
//! `now` and the local offset in; bucket boundaries come back as UTC instants.

use crate::store::ComplaintFilter;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const WEEKLY_BUCKETS: usize = 7;
pub const MONTHLY_BUCKETS: usize = 12;

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / total` as a percentage with one decimal; 0 when `total` is 0.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

/// Share of resolved complaints closed on or before their deadline.
pub fn compliance_rate(met: i64, resolved: i64) -> f64 {
    percentage(met, resolved)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

/// Week-over-week change: direction plus the absolute percentage.
///
/// With no previous volume the change is 100% when anything arrived this
/// week and 0% otherwise. A flat week reports "down".
pub fn week_over_week(this_week: i64, prev_week: i64) -> (TrendDirection, f64) {
    let pct = if prev_week > 0 {
        (this_week - prev_week) as f64 / prev_week as f64 * 100.0
    } else if this_week > 0 {
        100.0
    } else {
        0.0
    };
    let direction = if pct > 0.0 { TrendDirection::Up } else { TrendDirection::Down };
    (direction, round1(pct).abs())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityTier {
    Available,
    Light,
    Moderate,
    Heavy,
}

impl AvailabilityTier {
    pub fn from_active_count(active: i64) -> Self {
        match active {
            n if n <= 0 => AvailabilityTier::Available,
            n if n < 5  => AvailabilityTier::Light,
            n if n < 10 => AvailabilityTier::Moderate,
            _           => AvailabilityTier::Heavy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ResolutionSummary {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ResolutionSummary {
    pub fn from_hours(hours: &[f64]) -> Self {
        if hours.is_empty() {
            return Self::default();
        }
        let min = hours.iter().copied().fold(f64::INFINITY, f64::min);
        let max = hours.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            average: mean_hours(hours),
            min: Some(round1(min)),
            max: Some(round1(max)),
        }
    }
}

pub fn mean_hours(hours: &[f64]) -> Option<f64> {
    if hours.is_empty() {
        return None;
    }
    Some(round1(hours.iter().sum::<f64>() / hours.len() as f64))
}

// ── Calendar boundaries ──────────────────────────────────────────────────────

pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// The UTC instant of local midnight starting `date`.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN) - Duration::seconds(offset.local_minus_utc() as i64);
    Utc.from_utc_datetime(&naive)
}

pub fn start_of_local_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    local_midnight(local_date(now, offset), offset)
}

pub fn start_of_local_month(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let today = local_date(now, offset);
    local_midnight(first_of_month(today), offset)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `%Y-%m-%d` of the local day.
    pub date: String,
    /// Abbreviated weekday name.
    pub day: String,
}

impl DayBucket {
    pub fn narrow(&self, filter: ComplaintFilter) -> ComplaintFilter {
        filter.submitted_between(self.start, self.end)
    }
}

/// The trailing seven local days ending today, oldest first.
pub fn day_buckets(now: DateTime<Utc>, offset: FixedOffset) -> Vec<DayBucket> {
    let today = local_date(now, offset);
    (0..WEEKLY_BUCKETS as i64)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let start = local_midnight(date, offset);
            DayBucket {
                start,
                end: start + Duration::days(1),
                date: date.format("%Y-%m-%d").to_string(),
                day: date.format("%a").to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True only for the current month, which ends at `now` inclusive.
    pub end_inclusive: bool,
    /// `YYYY-MM`.
    pub month: String,
}

impl MonthBucket {
    pub fn narrow(&self, filter: ComplaintFilter) -> ComplaintFilter {
        if self.end_inclusive {
            filter.submitted_since(self.start).submitted_until(self.end)
        } else {
            filter.submitted_between(self.start, self.end)
        }
    }
}

/// Twelve trailing calendar months, oldest first. Each bucket runs from
/// local first-of-month to the next first-of-month; the current month is
/// cut at `now`.
pub fn month_buckets(now: DateTime<Utc>, offset: FixedOffset) -> Vec<MonthBucket> {
    let this_month = first_of_month(local_date(now, offset));
    (0..MONTHLY_BUCKETS as u32)
        .rev()
        .map(|back| {
            let first = this_month
                .checked_sub_months(Months::new(back))
                .unwrap_or(NaiveDate::MIN);
            let start = local_midnight(first, offset);
            let month = first.format("%Y-%m").to_string();
            if back == 0 {
                MonthBucket { start, end: now, end_inclusive: true, month }
            } else {
                let next = first
                    .checked_add_months(Months::new(1))
                    .unwrap_or(this_month);
                MonthBucket {
                    start,
                    end: local_midnight(next, offset),
                    end_inclusive: false,
                    month,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn six_of_ten_is_sixty_percent() {
        assert_eq!(compliance_rate(6, 10), 60.0);
        assert_eq!(compliance_rate(2, 3), 66.7);
    }

    #[test]
    fn compliance_is_zero_without_resolved_complaints() {
        assert_eq!(compliance_rate(0, 0), 0.0);
    }

    #[test]
    fn trend_from_empty_previous_week() {
        assert_eq!(week_over_week(4, 0), (TrendDirection::Up, 100.0));
        assert_eq!(week_over_week(0, 0), (TrendDirection::Down, 0.0));
        assert_eq!(week_over_week(3, 4), (TrendDirection::Down, 25.0));
        assert_eq!(week_over_week(6, 4), (TrendDirection::Up, 50.0));
    }

    #[test]
    fn availability_tiers() {
        assert_eq!(AvailabilityTier::from_active_count(0), AvailabilityTier::Available);
        assert_eq!(AvailabilityTier::from_active_count(4), AvailabilityTier::Light);
        assert_eq!(AvailabilityTier::from_active_count(7), AvailabilityTier::Moderate);
        assert_eq!(AvailabilityTier::from_active_count(10), AvailabilityTier::Heavy);
        assert_eq!(AvailabilityTier::from_active_count(12), AvailabilityTier::Heavy);
    }

    #[test]
    fn resolution_summary_of_nothing_is_empty() {
        assert_eq!(ResolutionSummary::from_hours(&[]), ResolutionSummary::default());
        let s = ResolutionSummary::from_hours(&[2.0, 10.0, 0.5]);
        assert_eq!(s.average, Some(4.2));
        assert_eq!(s.min, Some(0.5));
        assert_eq!(s.max, Some(10.0));
    }

    #[test]
    fn seven_day_buckets_end_today() {
        let now = at(2025, 3, 3, 15);
        let buckets = day_buckets(now, Utc.fix());
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, "2025-02-25");
        assert_eq!(buckets[6].date, "2025-03-03");
        assert_eq!(buckets[6].day, "Mon");
        assert_eq!(buckets[6].start, at(2025, 3, 3, 0));
        assert!(buckets.windows(2).all(|w| w[0].end == w[1].start));
    }

    #[test]
    fn day_buckets_follow_local_midnight() {
        // 23:30 UTC is already the next day at UTC+2.
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 23, 30, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let buckets = day_buckets(now, plus_two);
        assert_eq!(buckets[6].date, "2025-03-04");
        assert_eq!(buckets[6].start, at(2025, 3, 3, 22));
    }

    #[test]
    fn twelve_calendar_months_oldest_first() {
        let now = at(2025, 3, 15, 12);
        let buckets = month_buckets(now, Utc.fix());
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].month, "2024-04");
        assert_eq!(buckets[10].month, "2025-02");
        assert_eq!(buckets[10].end, at(2025, 3, 1, 0));
        assert_eq!(buckets[11].month, "2025-03");
        assert_eq!(buckets[11].end, now);
        assert!(buckets[11].end_inclusive);
        assert!(!buckets[0].end_inclusive);
    }
}
