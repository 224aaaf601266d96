//! Track command: all recorded times for one track with improvement gaps.

use std::io::Write;

use anyhow::Result;

use lt_core::{Category, ImprovementRow, improvement_rows};
use lt_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    track: &str,
    category: Category,
) -> Result<()> {
    let recorded = db.times_for_track(track, category)?;
    let times: Vec<_> = recorded.iter().map(|row| row.time).collect();
    let rows = improvement_rows(&times);
    writer.write_all(format_track(track, category, &rows).as_bytes())?;
    Ok(())
}

fn format_track(track: &str, category: Category, rows: &[ImprovementRow]) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    writeln!(output, "{track} ({category})").unwrap();
    if rows.is_empty() {
        writeln!(output, "No times recorded.").unwrap();
        return output;
    }

    writeln!(output, "{:>3}  {:<10} {}", "#", "Time", "Gap").unwrap();
    for row in rows {
        let time = row.time.to_string();
        let gap = row
            .improvement
            .map_or_else(|| "-".to_string(), |gap| gap.to_string());
        writeln!(output, "{:>3}  {time:<10} {gap}", row.entry).unwrap();
    }
    output
}
