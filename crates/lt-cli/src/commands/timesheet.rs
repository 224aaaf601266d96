//! Timesheet command: personal bests per track with ranks and WR deltas.

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::json;

use lt_core::{Category, NumericColumn, ReferenceBook, SheetStats, TimesheetRow, sheet_stats, top_n};
use lt_db::Database;

#[expect(
    clippy::too_many_arguments,
    reason = "parameters map one-to-one onto CLI flags"
)]
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    book: &ReferenceBook,
    category: Category,
    json: bool,
    sort: Option<&str>,
    top: Option<usize>,
    bottom: bool,
) -> Result<()> {
    let tracks = db.list_tracks()?;
    anyhow::ensure!(!tracks.is_empty(), "no tracks loaded; run `lt init` first");

    let names: Vec<String> = tracks.into_iter().map(|track| track.name).collect();
    let pbs = db.best_times(category)?;
    let rows = book.build_timesheet(category, &names, &pbs)?;

    let tier_names = book
        .get(category)
        .and_then(|tables| tables.standards.as_ref())
        .map(lt_core::StandardsTable::tier_names)
        .unwrap_or_default();
    let stats = sheet_stats(&rows, &tier_names);

    let selected: Vec<&TimesheetRow> = match sort {
        Some(column) => {
            let column: NumericColumn = column
                .parse()
                .with_context(|| format!("invalid sort column {column:?}"))?;
            top_n(&rows, column, top.unwrap_or(rows.len()), bottom)
        }
        None => rows.iter().collect(),
    };

    if json {
        let payload = json!({
            "category": category.to_string(),
            "rows": selected,
            "stats": stats,
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        writer.write_all(format_timesheet(category, &selected, stats.as_ref()).as_bytes())?;
    }
    Ok(())
}

fn format_timesheet(
    category: Category,
    rows: &[&TimesheetRow],
    stats: Option<&SheetStats>,
) -> String {
    use std::fmt::Write;

    let name_width = rows
        .iter()
        .map(|row| row.track_name.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    writeln!(output, "TIMESHEET ({category})").unwrap();
    writeln!(
        output,
        "{:>3}  {:<name_width$}  {:<10} {:<10} {:<9} {:<10} {:<9} {:>9}",
        "No", "Track", "Time", "Standard", "+Next", "WR", "+WR", "WR%",
    )
    .unwrap();

    for row in rows {
        let time = display_time(row.time.map(|t| t.to_string()));
        let standard = display_time(row.standard.clone());
        let standard_diff = display_time(row.standard_diff.map(|t| t.to_string()));
        let wr = display_time(row.wr.map(|t| t.to_string()));
        let wr_diff = display_time(row.wr_diff.map(|t| t.to_string()));
        let norm = row
            .wr_diff_norm
            .map_or_else(|| "-".to_string(), |norm| format!("{norm:.3}"));
        writeln!(
            output,
            "{:>3}  {:<name_width$}  {time:<10} {standard:<10} {standard_diff:<9} {wr:<10} {wr_diff:<9} {norm:>9}",
            row.track_no, row.track_name,
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    match stats {
        Some(stats) => output.push_str(&format_stats(stats)),
        None => writeln!(output, "No times recorded for this category.").unwrap(),
    }
    output
}

fn display_time(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn format_stats(stats: &SheetStats) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "Total time:   {}", stats.total_time).unwrap();
    writeln!(output, "Total WR:     {}", stats.total_wr).unwrap();
    writeln!(output, "Total diff:   {}", stats.total_diff).unwrap();
    if let Some(rank) = &stats.overall_rank {
        writeln!(output, "Overall rank: {rank}").unwrap();
    }
    if let Some(diff) = &stats.wr_diff {
        writeln!(output, "WR diff mean:   {:.3}s", diff.mean_secs).unwrap();
        writeln!(output, "WR diff median: {:.3}s", diff.median_secs).unwrap();
        if let Some(std_dev) = diff.std_dev_secs {
            writeln!(output, "WR diff stddev: {std_dev:.3}s").unwrap();
        }
    }
    if let Some(norm_mean) = stats.wr_diff_norm_mean {
        writeln!(output, "WR% mean:       {norm_mean:.3}").unwrap();
    }
    output
}
