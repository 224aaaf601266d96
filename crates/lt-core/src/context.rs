//! Per-category reference data and multi-category timesheet builds.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::category::Category;
use crate::standards::StandardsTable;
use crate::timesheet::{self, TimesheetError, TimesheetRow};

/// Reference data for one category: world records and tier standards.
///
/// Either table may be absent independently; derivation degrades field by
/// field rather than refusing to run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    /// Index-aligned world record strings, one slot per track.
    pub wrs: Option<Vec<Option<String>>>,
    pub standards: Option<StandardsTable>,
}

/// Reference tables keyed by category.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBook {
    tables: HashMap<Category, ReferenceTables>,
}

impl ReferenceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, tables: ReferenceTables) {
        self.tables.insert(category, tables);
    }

    #[must_use]
    pub fn get(&self, category: Category) -> Option<&ReferenceTables> {
        self.tables.get(&category)
    }

    /// Builds a timesheet for one category.
    ///
    /// A category with no reference entry at all still produces a sheet;
    /// its WR and rank columns are simply missing.
    pub fn build_timesheet(
        &self,
        category: Category,
        tracks: &[String],
        pbs: &[Option<String>],
    ) -> Result<Vec<TimesheetRow>, TimesheetError> {
        let empty_wrs;
        let (wrs, standards) = match self.get(category) {
            Some(tables) => (
                tables.wrs.as_deref(),
                tables.standards.as_ref(),
            ),
            None => (None, None),
        };
        let wrs = match wrs {
            Some(wrs) => wrs,
            None => {
                empty_wrs = vec![None; tracks.len()];
                empty_wrs.as_slice()
            }
        };
        timesheet::build_timesheet(tracks, pbs, wrs, standards)
    }

    /// Builds timesheets for every category in parallel.
    ///
    /// `pbs_by_category` supplies the personal bests for each category to
    /// derive; categories absent from it are skipped. The first failed
    /// derivation aborts the whole build.
    pub fn timesheets_for_all(
        &self,
        tracks: &[String],
        pbs_by_category: &HashMap<Category, Vec<Option<String>>>,
    ) -> Result<HashMap<Category, Vec<TimesheetRow>>, TimesheetError> {
        pbs_by_category
            .par_iter()
            .map(|(&category, pbs)| {
                self.build_timesheet(category, tracks, pbs)
                    .map(|rows| (category, rows))
            })
            .collect()
    }
}
