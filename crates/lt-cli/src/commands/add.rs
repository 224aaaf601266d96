//! Add command: record one lap time.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;

use lt_core::{Category, LapTime};
use lt_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    track: &str,
    time: &str,
    category: Category,
) -> Result<()> {
    let time: LapTime = time
        .parse()
        .with_context(|| format!("invalid time {time:?}"))?;
    let inserted = db.insert_time(track, time, category, Utc::now())?;
    if inserted {
        writeln!(writer, "Recorded {time} on {track} ({category}).")?;
    } else {
        writeln!(writer, "Already recorded: {time} on {track} ({category}).")?;
    }
    Ok(())
}
