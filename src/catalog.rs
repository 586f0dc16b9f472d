/*!
 * Read-only snapshots of the available dataset coverage.
 *
 * A catalog is built once per invocation by scanning the configured storage
 * roots, and is never mutated afterwards: every search sees one consistent
 * snapshot.
 */

pub use drs::DrsScheme;

mod drs;
mod scan;

use rustc_hash::FxHashMap as HashMap;
use std::path::PathBuf;

use crate::error::CatalogError;

/// One coverage range of one dataset/experiment/ensemble/variable combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Project the storage root was configured under, e.g. `CMIP6`.
    pub project: String,
    /// Dataset (model) name, e.g. `CanESM5`.
    pub dataset: String,
    /// Experiment name, e.g. `historical`.
    pub experiment: String,
    /// Ensemble member, e.g. `r1i1p1f1`.
    pub ensemble: String,
    /// Variable short name, e.g. `tas`.
    pub variable: String,
    /// MIP table, e.g. `Amon`.
    pub mip_table: String,
    /// First year with data, inclusive.
    pub start_year: i32,
    /// Last year with data, inclusive.
    pub end_year: i32,
}

impl CatalogRecord {
    /// Does this record's coverage contain the whole `[start, end]` span?
    pub fn contains(&self, start: i32, end: i32) -> bool {
        self.start_year <= start && self.end_year >= end
    }
}

/// A storage root to scan: which project it holds, how it is laid out, and
/// where it starts.
#[derive(Debug, Clone)]
pub struct ScanRoot {
    pub project: String,
    pub scheme: DrsScheme,
    pub path: PathBuf,
}

/// An ordered, immutable catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
}

impl Catalog {
    /// Build a catalog from raw records, coalescing coverage.
    ///
    /// On-disk archives split an experiment's data over many files, so the
    /// raw records carry one small coverage range each. Records identical up
    /// to coverage are merged whenever their ranges overlap or abut, leaving
    /// one record per contiguous stretch of data. Discovery order of the
    /// merged groups is preserved.
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        type Key = (String, String, String, String, String, String);

        let mut order: Vec<Key> = vec![];
        let mut groups: HashMap<Key, Vec<(i32, i32)>> = HashMap::default();

        for rec in records {
            let key = (
                rec.project,
                rec.dataset,
                rec.experiment,
                rec.ensemble,
                rec.variable,
                rec.mip_table,
            );

            match groups.get_mut(&key) {
                Some(ranges) => ranges.push((rec.start_year, rec.end_year)),
                None => {
                    groups.insert(key.clone(), vec![(rec.start_year, rec.end_year)]);
                    order.push(key);
                }
            }
        }

        let mut coalesced = vec![];
        for key in order {
            let mut ranges = groups.remove(&key).unwrap();
            ranges.sort_unstable();

            let mut merged: Vec<(i32, i32)> = vec![];
            for (start, end) in ranges {
                match merged.last_mut() {
                    // Overlapping or abutting in whole years.
                    Some((_, last_end)) if start <= *last_end + 1 => {
                        *last_end = (*last_end).max(end);
                    }
                    _ => merged.push((start, end)),
                }
            }

            let (project, dataset, experiment, ensemble, variable, mip_table) = key;
            for (start_year, end_year) in merged {
                coalesced.push(CatalogRecord {
                    project: project.clone(),
                    dataset: dataset.clone(),
                    experiment: experiment.clone(),
                    ensemble: ensemble.clone(),
                    variable: variable.clone(),
                    mip_table: mip_table.clone(),
                    start_year,
                    end_year,
                });
            }
        }

        Catalog { records: coalesced }
    }

    /// Scan every configured storage root into one catalog snapshot.
    ///
    /// Any unreadable root aborts the scan: a partial catalog would silently
    /// turn missing data into "no match" answers.
    pub fn scan(roots: &[ScanRoot]) -> Result<Self, CatalogError> {
        let mut records = vec![];

        for root in roots {
            log::info!(
                "scanning {} ({} layout) at {}",
                root.project,
                root.scheme.name(),
                root.path.display()
            );
            records.extend(scan::scan_root(&root.project, &root.path)?);
        }

        Ok(Self::from_records(records))
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
