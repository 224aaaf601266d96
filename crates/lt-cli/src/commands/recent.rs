//! Recent command: list the latest recorded times.

use std::io::Write;

use anyhow::Result;

use lt_db::{Database, RecentTime};

pub fn run<W: Write>(writer: &mut W, db: &Database, n: usize) -> Result<()> {
    let times = db.recent_times(n)?;
    writer.write_all(format_recent(&times).as_bytes())?;
    Ok(())
}

fn format_recent(times: &[RecentTime]) -> String {
    use std::fmt::Write;

    if times.is_empty() {
        return "No times recorded.\n".to_string();
    }

    let mut output = String::new();
    writeln!(output, "{:>5}  {:<5} {:<10} {:<14} {}", "ID", "Track", "Time", "Category", "Recorded")
        .unwrap();
    for entry in times {
        let time = entry.time.to_string();
        let category = entry.category.to_string();
        writeln!(
            output,
            "{:>5}  {:<5} {time:<10} {category:<14} {}",
            entry.id, entry.abbrev, entry.recorded_at,
        )
        .unwrap();
    }
    output
}
