//! Timesheet derivation: per-track rows and aggregate statistics.
//!
//! Given index-aligned lists of track names, personal bests and world
//! records, plus an optional per-track standards table, derives one row per
//! track (rank, deltas, numeric mirrors) and summary statistics over the
//! whole sheet. Pure functions of their inputs; no I/O.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::lap_time::{LapTime, LapTimeExt, TimeError};
use crate::standards::StandardsTable;

/// Errors from timesheet derivation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimesheetError {
    /// Input lists must be index-aligned and therefore equal in length.
    #[error("{field} list has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A world record failed to parse, which is a defect in the supplied
    /// reference data rather than missing rider data.
    #[error("invalid time for track {track:?}: {source}")]
    InvalidTime {
        track: String,
        #[source]
        source: TimeError,
    },

}

/// One derived timesheet row.
///
/// `None` means missing data (no recorded PB, no known WR) and is never
/// conflated with a zero duration. The `*_secs` fields are floating-point
/// mirrors for numeric aggregation and plotting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimesheetRow {
    /// 1-based track position.
    pub track_no: usize,
    pub track_name: String,
    pub time: Option<LapTime>,
    pub time_secs: Option<f64>,
    pub standard: Option<String>,
    pub standard_ordinal: Option<usize>,
    pub standard_diff: Option<LapTime>,
    pub standard_diff_secs: Option<f64>,
    pub wr: Option<LapTime>,
    pub wr_secs: Option<f64>,
    pub wr_diff: Option<LapTime>,
    pub wr_diff_secs: Option<f64>,
    /// WR delta as a percentage of the WR, rounded to 5 decimal places.
    pub wr_diff_norm: Option<f64>,
}

/// Builds one row per track from index-aligned inputs.
///
/// Alignment is positional, never by name. A personal best that is absent or
/// fails format validation yields a row whose time-derived fields are all
/// `None` while track identity and WR fields are kept; the row stays
/// positionally present so no track is ever silently dropped. A bad world
/// record is a defect in the supplied reference data and propagates.
pub fn build_timesheet(
    tracks: &[String],
    pbs: &[Option<String>],
    wrs: &[Option<String>],
    standards: Option<&StandardsTable>,
) -> Result<Vec<TimesheetRow>, TimesheetError> {
    check_len("personal best", tracks.len(), pbs.len())?;
    check_len("world record", tracks.len(), wrs.len())?;

    let mut rows = Vec::with_capacity(tracks.len());
    for (i, track_name) in tracks.iter().enumerate() {
        let wr = parse_wr(track_name, wrs[i].as_deref())?;

        let pb = pbs[i].as_deref().and_then(|raw| match raw.parse::<LapTime>() {
            Ok(time) => Some(time),
            Err(_) => {
                // Missing data, not a fatal error: empty cells and
                // placeholder strings land here.
                tracing::debug!(track = %track_name, input = raw, "unparseable PB treated as missing");
                None
            }
        });

        rows.push(derive_row(
            i,
            track_name,
            pb,
            wr,
            standards.and_then(|table| table.row(i)),
        ));
    }
    Ok(rows)
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), TimesheetError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TimesheetError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

fn parse_wr(track: &str, wr: Option<&str>) -> Result<Option<LapTime>, TimesheetError> {
    wr.map(|raw| {
        raw.parse().map_err(|source| TimesheetError::InvalidTime {
            track: track.to_string(),
            source,
        })
    })
    .transpose()
}

fn derive_row(
    index: usize,
    track_name: &str,
    pb: Option<LapTime>,
    wr: Option<LapTime>,
    standards: Option<&crate::standards::StandardSet>,
) -> TimesheetRow {
    let mut row = TimesheetRow {
        track_no: index + 1,
        track_name: track_name.to_string(),
        time: None,
        time_secs: None,
        standard: None,
        standard_ordinal: None,
        standard_diff: None,
        standard_diff_secs: None,
        wr,
        wr_secs: wr.map(LapTime::as_seconds),
        wr_diff: None,
        wr_diff_secs: None,
        wr_diff_norm: None,
    };

    let Some(pb) = pb else {
        return row;
    };

    row.time = Some(pb);
    row.time_secs = Some(pb.as_seconds());

    if let Some(wr) = wr {
        let diff = pb - wr;
        row.wr_diff = Some(diff);
        row.wr_diff_secs = Some(diff.as_seconds());
        // A zero WR would divide to infinity; leave the percentage missing.
        if wr.total_millis() > 0 {
            row.wr_diff_norm = Some(round5(diff.as_seconds() / wr.as_seconds() * 100.0));
        }
    }

    if let Some(set) = standards {
        let rank = set.resolve(pb);
        row.standard_diff = Some(rank.to_next);
        row.standard_diff_secs = Some(rank.to_next.as_seconds());
        row.standard_ordinal = Some(rank.ordinal);
        row.standard = Some(rank.name);
    }

    row
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Central-tendency statistics over the WR deltas of a sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffStats {
    pub mean_secs: f64,
    pub median_secs: f64,
    /// Sample standard deviation; `None` below two samples.
    pub std_dev_secs: Option<f64>,
}

/// Aggregate statistics over one full timesheet.
///
/// Totals use the extended time variant so a sheet of sub-two-minute laps
/// cannot overflow past 59 minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetStats {
    pub total_time: LapTimeExt,
    pub total_wr: LapTimeExt,
    pub total_diff: LapTimeExt,
    /// Mean 1-based standard ordinal, shifted by −0.5 for rank lookup.
    pub standard_ordinal_mean: Option<f64>,
    /// Mean ordinal translated back to a tier name. An approximation, not a
    /// rigorous rank metric.
    pub overall_rank: Option<String>,
    pub wr_diff: Option<DiffStats>,
    pub wr_diff_norm_mean: Option<f64>,
}

/// Computes aggregate statistics, skipping rows with missing fields.
///
/// Returns `None` when no row carries a personal best at all; individual
/// sub-statistics are `None` when their column is entirely missing, never
/// NaN.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sheet_stats(rows: &[TimesheetRow], tier_names: &[String]) -> Option<SheetStats> {
    if rows.iter().all(|row| row.time.is_none()) {
        return None;
    }

    let total_time = sum_millis(rows.iter().filter_map(|row| row.time));
    let total_wr = sum_millis(rows.iter().filter_map(|row| row.wr));
    let total_diff = sum_millis(rows.iter().filter_map(|row| row.wr_diff));

    let ordinals: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.standard_ordinal)
        .map(|ordinal| ordinal as f64)
        .collect();
    let standard_ordinal_mean = mean(&ordinals).map(|avg| avg - 0.5);
    let overall_rank = standard_ordinal_mean.and_then(|avg| overall_rank_name(avg, tier_names));

    let diffs: Vec<f64> = rows.iter().filter_map(|row| row.wr_diff_secs).collect();
    let wr_diff = mean(&diffs).map(|mean_secs| DiffStats {
        mean_secs,
        median_secs: median(&diffs),
        std_dev_secs: sample_std_dev(&diffs, mean_secs),
    });

    let norms: Vec<f64> = rows.iter().filter_map(|row| row.wr_diff_norm).collect();
    let wr_diff_norm_mean = mean(&norms);

    Some(SheetStats {
        total_time,
        total_wr,
        total_diff,
        standard_ordinal_mean,
        overall_rank,
        wr_diff,
        wr_diff_norm_mean,
    })
}

fn sum_millis(times: impl Iterator<Item = LapTime>) -> LapTimeExt {
    times
        .map(LapTimeExt::from)
        .fold(LapTimeExt::ZERO, |acc, time| acc + time)
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        f64::midpoint(sorted[mid - 1], sorted[mid])
    } else {
        sorted[mid]
    }
}

#[allow(clippy::cast_precision_loss)]
fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn overall_rank_name(shifted_mean: f64, tier_names: &[String]) -> Option<String> {
    if tier_names.is_empty() {
        return None;
    }
    let index = round_half_to_even(shifted_mean).clamp(0.0, (tier_names.len() - 1) as f64) as usize;
    Some(tier_names[index].clone())
}

// Ties round to the even integer, so a shifted mean of exactly n + 0.5
// does not bump a uniform sheet down a tier.
#[allow(clippy::float_cmp)]
fn round_half_to_even(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor == 0.5 {
        if floor.rem_euclid(2.0) == 0.0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        value.round()
    }
}

/// Numeric timesheet columns usable for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    Time,
    StandardOrdinal,
    StandardDiff,
    Wr,
    WrDiff,
    WrDiffNorm,
}

impl NumericColumn {
    #[allow(clippy::cast_precision_loss)]
    fn value(self, row: &TimesheetRow) -> Option<f64> {
        match self {
            Self::Time => row.time_secs,
            Self::StandardOrdinal => row.standard_ordinal.map(|ordinal| ordinal as f64),
            Self::StandardDiff => row.standard_diff_secs,
            Self::Wr => row.wr_secs,
            Self::WrDiff => row.wr_diff_secs,
            Self::WrDiffNorm => row.wr_diff_norm,
        }
    }

    /// Label used on the CLI and in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::StandardOrdinal => "standard",
            Self::StandardDiff => "standard-diff",
            Self::Wr => "wr",
            Self::WrDiff => "wr-diff",
            Self::WrDiffNorm => "wr-diff-norm",
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown sort column name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown numeric column: {value}")]
pub struct UnknownColumn {
    pub value: String,
}

impl FromStr for NumericColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "standard" => Ok(Self::StandardOrdinal),
            "standard-diff" => Ok(Self::StandardDiff),
            "wr" => Ok(Self::Wr),
            "wr-diff" => Ok(Self::WrDiff),
            "wr-diff-norm" => Ok(Self::WrDiffNorm),
            _ => Err(UnknownColumn {
                value: s.to_string(),
            }),
        }
    }
}

/// Returns up to `n` rows sorted by a numeric column, ascending (or
/// descending with `bottom`). Rows missing the column are excluded.
#[must_use]
pub fn top_n<'a>(
    rows: &'a [TimesheetRow],
    column: NumericColumn,
    n: usize,
    bottom: bool,
) -> Vec<&'a TimesheetRow> {
    let mut sortable: Vec<(&TimesheetRow, f64)> = rows
        .iter()
        .filter_map(|row| column.value(row).map(|value| (row, value)))
        .collect();
    sortable.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    if bottom {
        sortable.reverse();
    }
    sortable.into_iter().take(n).map(|(row, _)| row).collect()
}

/// One entry of a single-track improvement sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementRow {
    /// 1-based position in the sorted list.
    pub entry: usize,
    pub time: LapTime,
    pub time_secs: f64,
    /// Gap to the next-slower recorded time; `None` on the last entry.
    pub improvement: Option<LapTime>,
    pub improvement_secs: Option<f64>,
}

/// Derives improvement deltas from one track's recorded times.
///
/// Input must be sorted ascending (fastest first), which is how the
/// persistence collaborator returns it.
#[must_use]
pub fn improvement_rows(times: &[LapTime]) -> Vec<ImprovementRow> {
    times
        .iter()
        .enumerate()
        .map(|(i, &time)| {
            let improvement = times.get(i + 1).map(|&next| next - time);
            ImprovementRow {
                entry: i + 1,
                time,
                time_secs: time.as_seconds(),
                improvement,
                improvement_secs: improvement.map(LapTime::as_seconds),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::StandardSet;

    fn lap(s: &str) -> LapTime {
        s.parse().expect("valid time")
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn present(items: &[&str]) -> Vec<Option<String>> {
        items.iter().map(|s| Some((*s).to_string())).collect()
    }

    fn gold_silver_table(tracks: usize) -> StandardsTable {
        let set = StandardSet::from_strs(["Gold", "Silver"], ["0:55.000", "1:05.000"])
            .expect("valid standards");
        StandardsTable::new(vec![set; tracks])
    }

    #[test]
    fn end_to_end_two_track_scenario() {
        let tracks = owned(&["A", "B"]);
        let pbs = present(&["1:00.000", "1:10.000"]);
        let wrs = present(&["0:55.000", "1:05.000"]);
        let standards = gold_silver_table(2);

        let rows = build_timesheet(&tracks, &pbs, &wrs, Some(&standards)).unwrap();
        assert_eq!(rows.len(), 2);

        let a = &rows[0];
        assert_eq!(a.track_no, 1);
        assert_eq!(a.standard.as_deref(), Some("Silver"));
        assert_eq!(a.standard_ordinal, Some(2));
        assert_eq!(a.standard_diff, Some(lap("0:05.000")));
        assert_eq!(a.wr_diff, Some(lap("0:05.000")));
        assert_eq!(a.wr_diff_norm, Some(9.090_91));

        let b = &rows[1];
        assert_eq!(b.standard.as_deref(), Some("Unranked"));
        assert_eq!(b.standard_ordinal, Some(3));
        assert_eq!(b.wr_diff, Some(lap("0:05.000")));
        assert_eq!(b.wr_diff_norm, Some(7.692_31));

        let stats = sheet_stats(&rows, &owned(&["Gold", "Silver"])).expect("stats");
        let diff = stats.wr_diff.expect("diff stats");
        assert!((diff.mean_secs - 5.0).abs() < 1e-9);
        assert!((diff.median_secs - 5.0).abs() < 1e-9);
        assert_eq!(stats.total_time.to_string(), "0:02:10.000");
        assert_eq!(stats.total_wr.to_string(), "0:02:00.000");
        assert_eq!(stats.total_diff.to_string(), "0:00:10.000");
        // mean ordinal 2.5 - 0.5 = 2.0, clamped into the two-name list
        assert_eq!(stats.overall_rank.as_deref(), Some("Silver"));
    }

    #[test]
    fn invalid_pb_yields_positional_row_with_missing_fields() {
        let tracks = owned(&["A", "B"]);
        let pbs = vec![Some("invalid".to_string()), Some("1:10.000".to_string())];
        let wrs = present(&["0:55.000", "1:05.000"]);

        let rows = build_timesheet(&tracks, &pbs, &wrs, None).unwrap();
        assert_eq!(rows.len(), 2);

        let a = &rows[0];
        assert_eq!(a.track_name, "A");
        assert_eq!(a.time, None);
        assert_eq!(a.wr_diff, None);
        // WR fields survive a missing PB
        assert_eq!(a.wr, Some(lap("0:55.000")));
        assert_eq!(a.wr_secs, Some(55.0));

        let stats = sheet_stats(&rows, &[]).expect("stats");
        // Only track B contributes
        assert_eq!(stats.total_time.to_string(), "0:01:10.000");
        let diff = stats.wr_diff.expect("diff stats");
        assert!((diff.mean_secs - 5.0).abs() < 1e-9);
        assert_eq!(diff.std_dev_secs, None);
    }

    #[test]
    fn absent_pb_and_wr_stay_distinguishable_from_zero() {
        let tracks = owned(&["A"]);
        let rows = build_timesheet(&tracks, &[None], &[None], None).unwrap();
        let a = &rows[0];
        assert_eq!(a.time, None);
        assert_eq!(a.wr, None);
        assert_ne!(a.time, Some(LapTime::ZERO));
    }

    #[test]
    fn fully_missing_sheet_has_no_stats() {
        let tracks = owned(&["A", "B"]);
        let rows = build_timesheet(&tracks, &[None, None], &[None, None], None).unwrap();
        assert!(sheet_stats(&rows, &[]).is_none());
    }

    #[test]
    fn bad_wr_propagates() {
        let tracks = owned(&["A"]);
        let pbs = present(&["1:00.000"]);
        let wrs = vec![Some("nonsense".to_string())];
        let err = build_timesheet(&tracks, &pbs, &wrs, None).unwrap_err();
        assert!(matches!(err, TimesheetError::InvalidTime { .. }));
    }

    #[test]
    fn extended_shape_pb_is_treated_as_missing() {
        let tracks = owned(&["A"]);
        let pbs = present(&["1:02:03.000"]);
        let wrs = present(&["0:55.000"]);
        let rows = build_timesheet(&tracks, &pbs, &wrs, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time, None);
        assert_eq!(rows[0].wr_diff, None);
        assert_eq!(rows[0].wr, Some(lap("0:55.000")));
    }

    #[test]
    fn uniform_top_tier_sheet_keeps_the_top_rank() {
        // Mean ordinal 1.0 shifts to 0.5; the tie rounds to even (0), so
        // an all-Gold sheet reports Gold.
        let tracks = owned(&["A", "B"]);
        let pbs = present(&["0:54.000", "0:53.000"]);
        let wrs = present(&["0:50.000", "0:50.000"]);
        let standards = gold_silver_table(2);
        let rows = build_timesheet(&tracks, &pbs, &wrs, Some(&standards)).unwrap();
        assert!(rows.iter().all(|row| row.standard_ordinal == Some(1)));

        let stats = sheet_stats(&rows, &owned(&["Gold", "Silver"])).expect("stats");
        assert_eq!(stats.overall_rank.as_deref(), Some("Gold"));
    }

    #[test]
    fn half_ties_round_to_even_in_both_directions() {
        let names = owned(&["Gold", "Silver", "Bronze"]);
        // 0.5 rounds down to 0, 1.5 rounds up to 2.
        assert_eq!(overall_rank_name(0.5, &names).as_deref(), Some("Gold"));
        assert_eq!(overall_rank_name(1.5, &names).as_deref(), Some("Bronze"));
        assert_eq!(overall_rank_name(2.5, &names).as_deref(), Some("Bronze"));
    }

    #[test]
    fn zero_wr_leaves_normalized_delta_missing() {
        let tracks = owned(&["A"]);
        let pbs = present(&["1:00.000"]);
        let wrs = present(&["0:00.000"]);
        let rows = build_timesheet(&tracks, &pbs, &wrs, None).unwrap();
        assert_eq!(rows[0].wr_diff, Some(lap("1:00.000")));
        assert_eq!(rows[0].wr_diff_norm, None);

        let stats = sheet_stats(&rows, &[]).expect("stats");
        assert_eq!(stats.wr_diff_norm_mean, None);
    }

    #[test]
    fn misaligned_lists_are_rejected() {
        let tracks = owned(&["A", "B"]);
        let pbs = present(&["1:00.000"]);
        let wrs = vec![None, None];
        let err = build_timesheet(&tracks, &pbs, &wrs, None).unwrap_err();
        assert_eq!(
            err,
            TimesheetError::LengthMismatch {
                field: "personal best",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn no_standards_table_leaves_rank_fields_missing() {
        let tracks = owned(&["A"]);
        let rows =
            build_timesheet(&tracks, &present(&["1:00.000"]), &present(&["0:55.000"]), None)
                .unwrap();
        assert_eq!(rows[0].standard, None);
        assert_eq!(rows[0].standard_ordinal, None);
        assert_eq!(rows[0].wr_diff, Some(lap("0:05.000")));
    }

    #[test]
    fn top_n_sorts_by_column_and_skips_missing() {
        let tracks = owned(&["A", "B", "C"]);
        let pbs = vec![
            Some("1:00.000".to_string()),
            None,
            Some("0:58.000".to_string()),
        ];
        let wrs = present(&["0:55.000", "0:50.000", "0:56.000"]);
        let rows = build_timesheet(&tracks, &pbs, &wrs, None).unwrap();

        let top = top_n(&rows, NumericColumn::WrDiff, 10, false);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].track_name, "C");
        assert_eq!(top[1].track_name, "A");

        let bottom = top_n(&rows, NumericColumn::WrDiff, 1, true);
        assert_eq!(bottom[0].track_name, "A");
    }

    #[test]
    fn numeric_column_parses_labels() {
        assert_eq!(
            "wr-diff-norm".parse::<NumericColumn>().unwrap(),
            NumericColumn::WrDiffNorm
        );
        assert!("TrackName".parse::<NumericColumn>().is_err());
    }

    #[test]
    fn median_of_even_and_odd_counts() {
        assert!((median(&[1.0, 3.0]) - 2.0).abs() < 1e-9);
        assert!((median(&[5.0, 1.0, 3.0]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn improvement_rows_carry_gaps_to_next_slower() {
        let times = vec![lap("0:58.000"), lap("0:59.500"), lap("1:02.000")];
        let rows = improvement_rows(&times);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entry, 1);
        assert_eq!(rows[0].improvement, Some(lap("0:01.500")));
        assert_eq!(rows[1].improvement, Some(lap("0:02.500")));
        assert_eq!(rows[2].improvement, None);
    }

    #[test]
    fn improvement_rows_empty_input() {
        assert!(improvement_rows(&[]).is_empty());
    }
}
