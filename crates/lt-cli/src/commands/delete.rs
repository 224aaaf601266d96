//! Delete command: remove a recorded time by ID.

use std::io::Write;

use anyhow::Result;

use lt_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, id: i64) -> Result<()> {
    if db.delete_time(id)? {
        writeln!(writer, "Deleted entry {id}.")?;
    } else {
        writeln!(writer, "No entry with ID {id}.")?;
    }
    Ok(())
}
