//! Loads world-record and standards tables from the reference directory.
//!
//! Files are looked up per category by naming convention, e.g.
//! `150cc_shrooms_wrs.csv` and `150cc_shrooms_standards.csv`. A missing file
//! leaves that table absent; timesheets then derive without the affected
//! columns.
//!
//! WR files are positional: one line per track in course order. A blank line
//! or `-` marks a track with no known record, and a `*` suffix marks an
//! unverified record, which is treated as unknown rather than trusted.
//!
//! Standards files start with a line of tier names, fastest first, followed
//! by one line of cutoff times per track.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use lt_core::{Category, ReferenceBook, ReferenceTables, StandardSet, StandardsTable};

/// Loads reference tables for every category that has files on disk.
pub fn load_reference_book(dir: &Path) -> Result<ReferenceBook> {
    let mut book = ReferenceBook::new();
    for category in Category::ALL {
        let tables = load_category(dir, category)?;
        if tables.wrs.is_some() || tables.standards.is_some() {
            book.insert(category, tables);
        }
    }
    Ok(book)
}

fn load_category(dir: &Path, category: Category) -> Result<ReferenceTables> {
    let stem = format!("{}_{}", category.speed.as_str(), category.items.as_str());

    let wr_path = dir.join(format!("{stem}_wrs.csv"));
    let wrs = if wr_path.is_file() {
        let content = fs::read_to_string(&wr_path)
            .with_context(|| format!("failed to read {}", wr_path.display()))?;
        Some(parse_wr_lines(&content))
    } else {
        tracing::debug!(path = %wr_path.display(), "no WR file for category");
        None
    };

    let standards_path = dir.join(format!("{stem}_standards.csv"));
    let standards = if standards_path.is_file() {
        let content = fs::read_to_string(&standards_path)
            .with_context(|| format!("failed to read {}", standards_path.display()))?;
        Some(
            parse_standards(&content)
                .with_context(|| format!("invalid standards in {}", standards_path.display()))?,
        )
    } else {
        tracing::debug!(path = %standards_path.display(), "no standards file for category");
        None
    };

    Ok(ReferenceTables { wrs, standards })
}

/// Parses positional WR lines. Every line stays a slot so gaps never shift
/// the alignment with the track list.
fn parse_wr_lines(content: &str) -> Vec<Option<String>> {
    content
        .lines()
        .map(|line| {
            let line = line.trim();
            if line.is_empty() || line == "-" || line.ends_with('*') {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}

fn parse_standards(content: &str) -> Result<StandardsTable> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let names: Vec<String> = lines
        .next()
        .context("standards file is empty")?
        .split(',')
        .map(|name| name.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let cutoffs: Vec<&str> = line.split(',').map(str::trim).collect();
        let set = StandardSet::from_strs(names.iter().map(String::as_str), cutoffs)
            .with_context(|| format!("bad cutoff row {}", line_no + 1))?;
        rows.push(set);
    }
    Ok(StandardsTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use lt_core::{ItemRule, LapTime, SpeedClass};

    fn shrooms_150() -> Category {
        Category::new(SpeedClass::Cc150, ItemRule::Shrooms)
    }

    #[test]
    fn wr_lines_filter_flagged_and_missing_entries() {
        let parsed = parse_wr_lines("1:40.000\n-\n1:55.123*\n\n2:01.500\n");
        assert_eq!(
            parsed,
            vec![
                Some("1:40.000".to_string()),
                None,
                None,
                None,
                Some("2:01.500".to_string()),
            ]
        );
    }

    #[test]
    fn standards_parse_into_per_track_sets() {
        let table = parse_standards("Gold,Silver\n0:55.000,1:05.000\n1:00.000,1:10.000\n").unwrap();
        assert_eq!(table.len(), 2);
        let rank = table
            .row(1)
            .unwrap()
            .resolve("1:02.000".parse::<LapTime>().unwrap());
        assert_eq!(rank.name, "Silver");
    }

    #[test]
    fn unsorted_standards_are_rejected() {
        assert!(parse_standards("Gold,Silver\n1:05.000,0:55.000\n").is_err());
    }

    #[test]
    fn missing_files_leave_category_out_of_the_book() {
        let dir = tempfile::TempDir::new().unwrap();
        let book = load_reference_book(dir.path()).unwrap();
        assert!(book.get(shrooms_150()).is_none());
    }

    #[test]
    fn loads_files_by_category_naming_convention() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("150cc_shrooms_wrs.csv"), "1:40.000\n").unwrap();
        fs::write(
            dir.path().join("150cc_shrooms_standards.csv"),
            "Gold,Silver\n0:55.000,1:05.000\n",
        )
        .unwrap();

        let book = load_reference_book(dir.path()).unwrap();
        let tables = book.get(shrooms_150()).expect("category loaded");
        assert_eq!(tables.wrs.as_ref().unwrap().len(), 1);
        assert_eq!(tables.standards.as_ref().unwrap().len(), 1);
        assert!(book.get(Category::new(SpeedClass::Cc200, ItemRule::Nita)).is_none());
    }
}
