//! Import command: bulk-load times from a CSV file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use lt_core::Category;
use lt_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    times: &Path,
    category: Category,
) -> Result<()> {
    let inserted = db
        .import_times_csv(times, category, Utc::now())
        .with_context(|| format!("failed to import times from {}", times.display()))?;
    writeln!(writer, "Imported {inserted} times ({category}).")?;
    Ok(())
}
