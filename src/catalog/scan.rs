/*! Walking storage roots and turning file names into catalog records.
 *
 * CMIP archives name every data file after its facets:
 *
 * ```text
 * <variable>_<mip>_<dataset>_<experiment>_<ensemble>[_<grid>]_<start>-<end>.nc
 * ```
 *
 * e.g. `tas_Amon_CanESM5_historical_r1i1p1f1_gn_185001-201412.nc`. The grid
 * token is present for CMIP6 and absent for CMIP5, so both six and seven
 * token names are accepted. Everything the selector needs is in the name;
 * the file contents are never opened.
 */
use chrono::NaiveDate;

use crate::{catalog::CatalogRecord, error::CatalogError};
use std::path::Path;

/// Scan one storage root, yielding a record per data file found.
///
/// Files whose names do not parse are skipped with a debug log. Fixed-field
/// files (no time range in the name) fall in that bucket on purpose: they
/// carry no temporal coverage for the selector to reason about. A root that
/// is not a readable directory is an error, the caller must not fall back to
/// a partial catalog.
pub(crate) fn scan_root(project: &str, root: &Path) -> Result<Vec<CatalogRecord>, CatalogError> {
    if !root.is_dir() {
        return Err(CatalogError::new(format!(
            "storage root for {} is not a readable directory: {}",
            project,
            root.display()
        )));
    }

    let mut records = vec![];
    let mut skipped: u64 = 0;

    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|res| res.ok())
        .filter(|entry| entry.path().is_file())
    {
        let fname = entry.file_name().to_string_lossy();

        if !fname.ends_with(".nc") {
            continue;
        }

        match parse_file_name(project, &fname) {
            Some(record) => records.push(record),
            None => {
                log::debug!("skipping unparseable file name: {}", fname);
                skipped += 1;
            }
        }
    }

    log::debug!(
        "scanned {} for {}: {} records, {} skipped",
        root.display(),
        project,
        records.len(),
        skipped
    );

    Ok(records)
}

/// Parse a CMIP-style file name into a catalog record.
pub(crate) fn parse_file_name(project: &str, fname: &str) -> Option<CatalogRecord> {
    let stem = fname.strip_suffix(".nc")?;
    let tokens: Vec<&str> = stem.split('_').collect();

    // Six tokens without a grid label, seven with one.
    if tokens.len() < 6 || tokens.len() > 7 {
        return None;
    }

    if tokens.iter().any(|tok| tok.is_empty()) {
        return None;
    }

    let (start_year, end_year) = parse_time_range(tokens[tokens.len() - 1])?;

    Some(CatalogRecord {
        project: project.to_owned(),
        dataset: tokens[2].to_owned(),
        experiment: tokens[3].to_owned(),
        ensemble: tokens[4].to_owned(),
        variable: tokens[0].to_owned(),
        mip_table: tokens[1].to_owned(),
        start_year,
        end_year,
    })
}

/// Parse the trailing `<start>-<end>` token of a file name into years.
fn parse_time_range(token: &str) -> Option<(i32, i32)> {
    let (start, end) = token.split_once('-')?;

    let start_year = parse_stamp(start)?;
    let end_year = parse_stamp(end)?;

    if start_year > end_year {
        return None;
    }

    Some((start_year, end_year))
}

/// Extract the year from a single date stamp.
///
/// Stamps come as `YYYY`, `YYYYMM`, `YYYYMMDD`, or with a further time-of-day
/// suffix for sub-daily data. The calendar part has to be a real date; a
/// stamp like `185013` is a mangled name, not December-adjacent.
fn parse_stamp(stamp: &str) -> Option<i32> {
    if !stamp.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let ymd = match stamp.len() {
        4 => format!("{}0101", stamp),
        6 => format!("{}01", stamp),
        len if len >= 8 => stamp[..8].to_owned(),
        _ => return None,
    };

    let date = NaiveDate::parse_from_str(&ymd, "%Y%m%d").ok()?;

    use chrono::Datelike;
    Some(date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmip6_file_name_parses() {
        let rec =
            parse_file_name("CMIP6", "tas_Amon_CanESM5_historical_r1i1p1f1_gn_185001-201412.nc")
                .unwrap();

        assert_eq!(rec.project, "CMIP6");
        assert_eq!(rec.variable, "tas");
        assert_eq!(rec.mip_table, "Amon");
        assert_eq!(rec.dataset, "CanESM5");
        assert_eq!(rec.experiment, "historical");
        assert_eq!(rec.ensemble, "r1i1p1f1");
        assert_eq!(rec.start_year, 1850);
        assert_eq!(rec.end_year, 2014);
    }

    #[test]
    fn cmip5_file_name_without_grid_parses() {
        let rec = parse_file_name("CMIP5", "pr_Amon_CanESM2_rcp85_r1i1p1_200601-210012.nc").unwrap();

        assert_eq!(rec.dataset, "CanESM2");
        assert_eq!(rec.experiment, "rcp85");
        assert_eq!(rec.ensemble, "r1i1p1");
        assert_eq!(rec.start_year, 2006);
        assert_eq!(rec.end_year, 2100);
    }

    #[test]
    fn daily_stamps_parse() {
        let rec = parse_file_name(
            "CMIP6",
            "tasmax_day_MIROC6_ssp585_r1i1p1f1_gn_20150101-21001231.nc",
        )
        .unwrap();

        assert_eq!(rec.start_year, 2015);
        assert_eq!(rec.end_year, 2100);
    }

    #[test]
    fn fixed_field_file_is_skipped() {
        // No time range on fx files.
        assert!(parse_file_name("CMIP6", "areacella_fx_CanESM5_historical_r1i1p1f1_gn.nc").is_none());
    }

    #[test]
    fn foreign_file_names_are_skipped() {
        assert!(parse_file_name("CMIP6", "README.nc").is_none());
        assert!(parse_file_name("CMIP6", "tas_Amon_CanESM5.nc").is_none());
        assert!(parse_file_name("CMIP6", "notes_about_tas_Amon_CanESM5_historical.txt").is_none());
    }

    #[test]
    fn mangled_time_stamps_are_skipped() {
        // Month 13 is not a date.
        assert!(parse_time_range("185013-201412").is_none());
        // Inverted range.
        assert!(parse_time_range("201501-185001").is_none());
        // Not digits.
        assert!(parse_time_range("1850xx-201412").is_none());
    }

    #[test]
    fn scanning_a_missing_root_is_an_error() {
        let err = scan_root("CMIP6", Path::new("/no/such/root/anywhere")).unwrap_err();
        assert!(err.msg.contains("CMIP6"));
    }
}
