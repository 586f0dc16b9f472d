/*!
 * Loading, filling, and saving evaluation recipes.
 *
 * A recipe is a YAML document the execution engine consumes. This crate only
 * cares about the `variables` blocks inside `diagnostics`; every other
 * section (documentation, preprocessors, scripts, top-level datasets, ...)
 * is carried through untouched via flattened passthrough maps, so a filled
 * recipe is still the same recipe the user wrote, plus
 * `additional_datasets`.
 */
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{collections::BTreeMap, fs, path::Path};

use crate::{
    catalog::Catalog,
    request::{RawRequest, Constraint, YearSpec},
    select::find_datasets,
    RecFillResult,
};

/// A whole recipe document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<String, Diagnostic>,

    /// Everything else in the document, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One diagnostic block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, VariableBlock>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One variable block inside a diagnostic.
///
/// The mapping key doubles as the variable short name unless `short_name`
/// overrides it. Year bounds take a year or the `"*"` wildcard; `dataset`
/// and `exp` take a single name or a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<YearSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<YearSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Filled in by this tool, one entry per selected segment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_datasets: Vec<DatasetEntry>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl VariableBlock {
    /// Collect this block's values into an unvalidated request.
    fn raw_request(&self, key: &str) -> RawRequest {
        RawRequest {
            variable_name: Some(self.short_name.clone().unwrap_or_else(|| key.to_owned())),
            mip_table: self.mip.clone(),
            start_year: self.start_year.clone(),
            end_year: self.end_year.clone(),
            datasets: self.dataset.clone().map(OneOrMany::into_vec),
            experiments: self.exp.clone().map(OneOrMany::into_vec),
            ensemble: self.ensemble.clone(),
            project: self.project.clone(),
        }
    }
}

/// A single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

/// One fully specified dataset entry, as written into `additional_datasets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub dataset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    pub exp: String,
    pub ensemble: String,
    pub start_year: i32,
    pub end_year: i32,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Counts from one fill pass, for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Variable blocks visited.
    pub variables: usize,
    /// Dataset entries written.
    pub entries_added: usize,
    /// Variable blocks with a valid request but no qualifying data.
    pub no_match: usize,
    /// Variable blocks skipped because their request did not validate.
    pub skipped: usize,
}

impl Recipe {
    /// Parse a recipe from YAML text.
    pub fn from_yaml(text: &str) -> RecFillResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Serialize the recipe back to YAML text.
    pub fn to_yaml(&self) -> RecFillResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a recipe file. A file that does not parse is malformed input.
    pub fn load<P: AsRef<Path>>(path: P) -> RecFillResult<Self> {
        let p = path.as_ref();
        let text = fs::read_to_string(p)
            .map_err(|err| format!("unable to read recipe {}: {}", p.display(), err))?;
        Self::from_yaml(&text)
            .map_err(|err| format!("malformed recipe {}: {}", p.display(), err).into())
    }

    /// Write the recipe out as YAML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RecFillResult<()> {
        let p = path.as_ref();
        fs::write(p, self.to_yaml()?)
            .map_err(|err| format!("unable to write recipe {}: {}", p.display(), err))?;
        Ok(())
    }

    /// Fill `additional_datasets` for every variable of every diagnostic.
    ///
    /// A variable whose request does not validate is logged at error level
    /// and skipped; the rest of the recipe is still processed. A variable
    /// that matches nothing is logged at warning level; that is an empty
    /// result, not an error.
    pub fn fill(&mut self, catalog: &Catalog) -> FillReport {
        let mut report = FillReport::default();

        for (diag_name, diag) in self.diagnostics.iter_mut() {
            for (var_key, block) in diag.variables.iter_mut() {
                report.variables += 1;

                let request = match block.raw_request(var_key).check() {
                    Ok(request) => request,
                    Err(err) => {
                        log::error!("{}/{}: {}", diag_name, var_key, err);
                        report.skipped += 1;
                        continue;
                    }
                };

                let selections = find_datasets(&request, catalog.records());

                if selections.is_empty() {
                    log::warn!(
                        "{}/{}: no datasets satisfy the requested coverage",
                        diag_name,
                        var_key
                    );
                    report.no_match += 1;
                    continue;
                }

                let project = match &request.project {
                    Constraint::Exact(p) => Some(p.clone()),
                    _ => None,
                };

                let mut added = 0;
                for sel in selections {
                    for seg in sel.segments {
                        block.additional_datasets.push(DatasetEntry {
                            dataset: sel.dataset.clone(),
                            project: project.clone(),
                            exp: seg.experiment,
                            ensemble: sel.ensemble.clone(),
                            start_year: seg.start_year,
                            end_year: seg.end_year,
                            extra: BTreeMap::new(),
                        });
                        added += 1;
                    }
                }
                report.entries_added += added;

                log::info!("{}/{}: added {} dataset entries", diag_name, var_key, added);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;

    const RECIPE: &str = "\
preprocessors:
  pp_global:
    area_statistics:
      operator: mean

diagnostics:
  tas_map:
    description: Global surface air temperature
    variables:
      tas:
        mip: Amon
        start_year: 1990
        end_year: 2050
        exp: [historical, ssp585]
    scripts: null
";

    fn record(
        dataset: &str,
        experiment: &str,
        variable: &str,
        start_year: i32,
        end_year: i32,
    ) -> CatalogRecord {
        CatalogRecord {
            project: "CMIP6".to_owned(),
            dataset: dataset.to_owned(),
            experiment: experiment.to_owned(),
            ensemble: "r1i1p1f1".to_owned(),
            variable: variable.to_owned(),
            mip_table: "Amon".to_owned(),
            start_year,
            end_year,
        }
    }

    fn scenario_catalog() -> Catalog {
        Catalog::from_records(vec![
            record("CanESM5", "historical", "tas", 1850, 2014),
            record("CanESM5", "ssp585", "tas", 2015, 2100),
        ])
    }

    #[test]
    fn recipe_parses_and_fills() {
        let mut recipe = Recipe::from_yaml(RECIPE).unwrap();
        let report = recipe.fill(&scenario_catalog());

        assert_eq!(report.variables, 1);
        assert_eq!(report.entries_added, 2);
        assert_eq!(report.no_match, 0);
        assert_eq!(report.skipped, 0);

        let block = &recipe.diagnostics["tas_map"].variables["tas"];
        assert_eq!(block.additional_datasets.len(), 2);
        assert_eq!(block.additional_datasets[0].dataset, "CanESM5");
        assert_eq!(block.additional_datasets[0].exp, "historical");
        assert_eq!(block.additional_datasets[0].start_year, 1990);
        assert_eq!(block.additional_datasets[0].end_year, 2014);
        assert_eq!(block.additional_datasets[1].exp, "ssp585");
        assert_eq!(block.additional_datasets[1].start_year, 2015);
        assert_eq!(block.additional_datasets[1].end_year, 2050);
    }

    #[test]
    fn unrelated_sections_survive_a_round_trip() {
        let mut recipe = Recipe::from_yaml(RECIPE).unwrap();
        recipe.fill(&scenario_catalog());

        let out = recipe.to_yaml().unwrap();
        assert!(out.contains("preprocessors"));
        assert!(out.contains("area_statistics"));
        assert!(out.contains("description"));
        assert!(out.contains("additional_datasets"));
    }

    #[test]
    fn misconfigured_variable_is_skipped_not_fatal() {
        let text = "\
diagnostics:
  broken:
    variables:
      tas:
        mip: Amon
        start_year: 1990
  fine:
    variables:
      tas:
        mip: Amon
        start_year: 1990
        end_year: 2010
        exp: historical
";
        let mut recipe = Recipe::from_yaml(text).unwrap();
        let report = recipe.fill(&scenario_catalog());

        assert_eq!(report.variables, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.entries_added, 1);
        assert!(recipe.diagnostics["broken"].variables["tas"]
            .additional_datasets
            .is_empty());
    }

    #[test]
    fn no_match_is_reported_not_raised() {
        let text = "\
diagnostics:
  d:
    variables:
      tas:
        mip: Amon
        start_year: 1990
        end_year: 2010
        dataset: NoSuchModel
";
        let mut recipe = Recipe::from_yaml(text).unwrap();
        let report = recipe.fill(&scenario_catalog());

        assert_eq!(report.no_match, 1);
        assert_eq!(report.entries_added, 0);
    }

    #[test]
    fn short_name_overrides_the_mapping_key() {
        let text = "\
diagnostics:
  d:
    variables:
      tas_alias:
        short_name: tas
        mip: Amon
        start_year: 1990
        end_year: 2010
        exp: historical
";
        let mut recipe = Recipe::from_yaml(text).unwrap();
        let report = recipe.fill(&scenario_catalog());

        assert_eq!(report.entries_added, 1);
    }

    #[test]
    fn malformed_yaml_does_not_parse() {
        assert!(Recipe::from_yaml("diagnostics: [not, a, mapping").is_err());
    }

    #[test]
    fn wildcard_years_fill_native_coverage() {
        let text = "\
diagnostics:
  d:
    variables:
      tas:
        mip: Amon
        start_year: '*'
        end_year: '*'
        exp: historical
";
        let mut recipe = Recipe::from_yaml(text).unwrap();
        let report = recipe.fill(&scenario_catalog());

        assert_eq!(report.entries_added, 1);
        let entry = &recipe.diagnostics["d"].variables["tas"].additional_datasets[0];
        assert_eq!(entry.start_year, 1850);
        assert_eq!(entry.end_year, 2014);
    }
}
