//! Lead-day preference parsing.

use chrono::{Days, NaiveDate};

/// Parses a comma-separated lead-day list such as `"7,3,1,0"`.
///
/// Returns distinct non-negative values in descending order. Negative values
/// are dropped. Anything unparseable, or an empty result, yields `[fallback]`.
#[must_use]
pub fn parse_lead_days(raw: Option<&str>, fallback: u32) -> Vec<u32> {
    let parsed: Result<Vec<i64>, _> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<i64>)
        .collect();

    let Ok(values) = parsed else {
        return vec![fallback];
    };

    let mut days: Vec<u32> = match values
        .into_iter()
        .filter(|v| *v >= 0)
        .map(u32::try_from)
        .collect()
    {
        Ok(days) => days,
        Err(_) => return vec![fallback],
    };

    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    if days.is_empty() { vec![fallback] } else { days }
}

/// Due dates targeted by a lead-day list: `today + d` for each `d`.
#[must_use]
pub fn target_dates(today: NaiveDate, lead_days: &[u32]) -> Vec<NaiveDate> {
    lead_days
        .iter()
        .filter_map(|d| today.checked_add_days(Days::new(u64::from(*d))))
        .collect()
}
