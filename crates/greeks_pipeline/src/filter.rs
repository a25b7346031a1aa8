//! Time-of-day filtering.

use std::collections::BTreeSet;

use crate::model::Timestamped;

/// Keep observations whose `HH:MM` clock time is one of `markers`.
///
/// Set membership, not range matching. An empty or all-blank marker set
/// passes the series through untouched. Relative order is preserved.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use chrono::NaiveDate;
/// use greeks_pipeline::{filter_by_times, SpotBar};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 26).unwrap();
/// let bars: Vec<SpotBar> = [(9, 15), (9, 16), (10, 15)]
///     .iter()
///     .map(|&(h, m)| SpotBar { datetime: day.and_hms_opt(h, m, 30).unwrap(), close: 1.0 })
///     .collect();
///
/// let markers = BTreeSet::from(["09:15".to_string(), "10:15".to_string()]);
/// assert_eq!(filter_by_times(bars, &markers).len(), 2);
/// ```
pub fn filter_by_times<T: Timestamped>(series: Vec<T>, markers: &BTreeSet<String>) -> Vec<T> {
    if markers.iter().all(|m| m.trim().is_empty()) {
        return series;
    }
    series
        .into_iter()
        .filter(|obs| {
            let clock = obs.timestamp().format("%H:%M").to_string();
            markers.contains(&clock)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpotBar;
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn bar(h: u32, m: u32, s: u32, close: f64) -> SpotBar {
        SpotBar {
            datetime: NaiveDate::from_ymd_opt(2024, 6, 26)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
            close,
        }
    }

    fn markers(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_markers_pass_through() {
        let series = vec![bar(9, 15, 0, 1.0), bar(9, 16, 0, 2.0)];
        assert_eq!(filter_by_times(series.clone(), &BTreeSet::new()), series);
        assert_eq!(filter_by_times(series.clone(), &markers(&["", "  "])), series);
    }

    #[test]
    fn test_membership_not_range() {
        let series = vec![
            bar(9, 14, 59, 1.0),
            bar(9, 15, 0, 2.0),
            bar(9, 15, 59, 3.0),
            bar(9, 16, 0, 4.0),
            bar(15, 15, 0, 5.0),
        ];
        let kept = filter_by_times(series, &markers(&["09:15", "15:15"]));
        let closes: Vec<f64> = kept.iter().map(|b| b.close).collect();
        assert_eq!(closes, [2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let series = vec![bar(10, 15, 0, 2.0), bar(9, 15, 0, 1.0), bar(10, 15, 0, 3.0)];
        let kept = filter_by_times(series, &markers(&["09:15", "10:15"]));
        let closes: Vec<f64> = kept.iter().map(|b| b.close).collect();
        assert_eq!(closes, [2.0, 1.0, 3.0]);
    }

    fn arb_series() -> impl Strategy<Value = Vec<SpotBar>> {
        prop::collection::vec((0u32..24, 0u32..60, 0u32..60, 0.0f64..100.0), 0..40).prop_map(
            |items| {
                items
                    .into_iter()
                    .map(|(h, m, s, c)| bar(h, m, s, c))
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            series in arb_series(),
            marks in prop::collection::btree_set((0u32..24, 0u32..60), 0..6),
        ) {
            let marks: BTreeSet<String> =
                marks.into_iter().map(|(h, m)| format!("{h:02}:{m:02}")).collect();
            let once = filter_by_times(series, &marks);
            let twice = filter_by_times(once.clone(), &marks);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_kept_rows_match_a_marker(series in arb_series()) {
            let marks = markers(&["09:15", "12:15"]);
            let kept = filter_by_times(series, &marks);
            for obs in &kept {
                let clock = NaiveDateTime::format(&obs.datetime, "%H:%M").to_string();
                prop_assert!(marks.contains(&clock));
            }
        }
    }
}
