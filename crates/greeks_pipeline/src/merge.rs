//! Nearest-timestamp (asof) alignment of option and spot series.

use chrono::TimeDelta;

use crate::model::{AlignedObservation, OptionBar, SpotBar};

/// Attach to each option row the spot row nearest in time.
///
/// Both series are stably sorted by timestamp first. Matches are one-to-one
/// per option row and restricted to `|Δt| <= tolerance`; option rows with no
/// spot inside the tolerance are dropped. On equal distance the earlier spot
/// row wins, and among spot rows sharing the winning timestamp the last one
/// in input order wins.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use greeks_core::types::OptionType;
/// use greeks_pipeline::{merge_asof, OptionBar, SpotBar};
///
/// let at = |s| NaiveDate::from_ymd_opt(2024, 6, 26).unwrap().and_hms_opt(9, 15, s).unwrap();
/// let options = vec![OptionBar::new(at(30), 22000.0, OptionType::Call, 120.0)];
/// let spot = vec![
///     SpotBar { datetime: at(0), close: 21990.0 },
///     SpotBar { datetime: at(40), close: 21995.0 },
/// ];
///
/// let merged = merge_asof(options, spot, TimeDelta::seconds(60));
/// assert_eq!(merged[0].close_spot, 21995.0);
/// ```
pub fn merge_asof(
    options: Vec<OptionBar>,
    mut spot: Vec<SpotBar>,
    tolerance: TimeDelta,
) -> Vec<AlignedObservation> {
    sort_spot(&mut spot);
    merge_asof_sorted(options, &spot, tolerance)
}

/// Stable sort of a spot series by timestamp, as [`merge_asof_sorted`] expects.
pub fn sort_spot(spot: &mut [SpotBar]) {
    spot.sort_by_key(|bar| bar.datetime);
}

/// [`merge_asof`] against a spot series already passed through [`sort_spot`].
///
/// Lets one sorted spot series serve every instrument of a request.
pub fn merge_asof_sorted(
    mut options: Vec<OptionBar>,
    spot: &[SpotBar],
    tolerance: TimeDelta,
) -> Vec<AlignedObservation> {
    debug_assert!(spot.windows(2).all(|w| w[0].datetime <= w[1].datetime));
    options.sort_by_key(|bar| bar.datetime);

    options
        .into_iter()
        .filter_map(|option| {
            let t = option.datetime;
            // First spot row strictly after t
            let after = spot.partition_point(|s| s.datetime <= t);

            let backward = after.checked_sub(1).map(|i| (i, t - spot[i].datetime));
            let forward = spot.get(after).map(|s| (after, s.datetime - t));

            let nearest = match (backward, forward) {
                (Some(b), Some(f)) => Some(if b.1 <= f.1 { b } else { f }),
                (b, f) => b.or(f),
            };

            nearest
                .filter(|(_, distance)| *distance <= tolerance)
                .map(|(i, _)| AlignedObservation {
                    close_spot: spot[i].close,
                    datetime_spot: spot[i].datetime,
                    option,
                })
        })
        .collect()
}
