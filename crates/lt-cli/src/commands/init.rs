//! Init command: create the database and load the track list.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use lt_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, tracks: &Path) -> Result<()> {
    let inserted = db
        .import_tracks_csv(tracks)
        .with_context(|| format!("failed to import tracks from {}", tracks.display()))?;
    let total = db.list_tracks()?.len();
    writeln!(writer, "Loaded {inserted} tracks ({total} total).")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn init_reports_inserted_and_total_counts() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = dir.path().join("tracks.csv");
        fs::write(&csv, "1,Mushroom,New,Mario Kart Stadium,MKS\n2,Mushroom,New,Water Park,WP\n")
            .unwrap();

        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &mut db, &csv).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Loaded 2 tracks (2 total).\n"
        );
    }

    #[test]
    fn init_twice_loads_nothing_new() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = dir.path().join("tracks.csv");
        fs::write(&csv, "1,Mushroom,New,Mario Kart Stadium,MKS\n").unwrap();

        let mut db = Database::open_in_memory().unwrap();
        run(&mut Vec::new(), &mut db, &csv).unwrap();

        let mut output = Vec::new();
        run(&mut output, &mut db, &csv).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Loaded 0 tracks (1 total).\n"
        );
    }
}
