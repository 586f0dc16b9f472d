/*! Variable requests and the constraints they carry.
 *
 * A request starts life as whatever loose values were found in a recipe
 * (`RawRequest`) and must pass through [`RawRequest::check`] before it can be
 * used to search a catalog. All validation happens there, before any catalog
 * scan is attempted.
 */
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A facet constraint taken from a recipe.
///
/// The recipe format uses `"*"` to mean "unconstrained"; inside the crate
/// that is an explicit variant rather than a sentinel string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Matches every value.
    Unconstrained,
    /// Matches exactly one value.
    Exact(String),
    /// Matches any value in the set.
    OneOf(Vec<String>),
}

impl Constraint {
    /// Does this constraint admit the given facet value?
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Constraint::Unconstrained => true,
            Constraint::Exact(wanted) => wanted == value,
            Constraint::OneOf(wanted) => wanted.iter().any(|w| w == value),
        }
    }

    /// Build a constraint from an optional list of values.
    ///
    /// `None` and an empty list are both unconstrained, a single value is
    /// `Exact`, anything longer is `OneOf`. A literal `"*"` anywhere in the
    /// list also makes the whole constraint unconstrained.
    pub fn from_values(values: Option<Vec<String>>) -> Self {
        let mut values = match values {
            Some(v) => v,
            None => return Constraint::Unconstrained,
        };

        if values.is_empty() || values.iter().any(|v| v == WILDCARD) {
            Constraint::Unconstrained
        } else if values.len() == 1 {
            Constraint::Exact(values.swap_remove(0))
        } else {
            Constraint::OneOf(values)
        }
    }
}

/// The experiments a request may draw data from.
///
/// Order matters when stitching: the sequence is the order the user expects
/// the experiments to chain in time, e.g. `[historical, ssp585]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentFilter {
    /// Any experiment found in the catalog may satisfy the request on its own.
    Any,
    /// Only these experiments, stitched end-to-end when more than one.
    Ordered(Vec<String>),
}

impl ExperimentFilter {
    /// Does this filter admit records from the given experiment?
    pub fn admits(&self, experiment: &str) -> bool {
        match self {
            ExperimentFilter::Any => true,
            ExperimentFilter::Ordered(exps) => exps.iter().any(|e| e == experiment),
        }
    }

    /// The position of an experiment in the ordered sequence, if any.
    pub fn position(&self, experiment: &str) -> Option<usize> {
        match self {
            ExperimentFilter::Any => None,
            ExperimentFilter::Ordered(exps) => exps.iter().position(|e| e == experiment),
        }
    }
}

/// The requested temporal coverage, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRange {
    /// A concrete span of years. Always `start <= end`.
    Span { start: i32, end: i32 },
    /// Both bounds were wildcarded: coverage filtering is skipped entirely.
    Unbounded,
}

/// A single year bound as written in a recipe: a year or the `"*"` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearSpec {
    Year(i32),
    Text(String),
}

/// The wildcard marker recipes use for "unconstrained".
pub const WILDCARD: &str = "*";

impl YearSpec {
    /// `Ok(None)` for the wildcard, `Ok(Some(year))` for a year, and a
    /// configuration error for any other string.
    fn resolve(&self, field: &str) -> Result<Option<i32>, ConfigError> {
        match self {
            YearSpec::Year(y) => Ok(Some(*y)),
            YearSpec::Text(s) if s == WILDCARD => Ok(None),
            YearSpec::Text(s) => Err(ConfigError::new(format!(
                "{} must be a year or \"{}\", got \"{}\"",
                field, WILDCARD, s
            ))),
        }
    }
}

/// Request values as found in a recipe, nothing checked yet.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub variable_name: Option<String>,
    pub mip_table: Option<String>,
    pub start_year: Option<YearSpec>,
    pub end_year: Option<YearSpec>,
    pub datasets: Option<Vec<String>>,
    pub experiments: Option<Vec<String>>,
    pub ensemble: Option<String>,
    pub project: Option<String>,
}

impl RawRequest {
    /// Validate the raw values into a [`VariableRequest`].
    ///
    /// Required: `variable_name`, `mip_table`, and both year bounds (either
    /// two years with `start <= end`, or both wildcarded). A wildcard on one
    /// bound only is rejected rather than guessed at.
    pub fn check(self) -> Result<VariableRequest, ConfigError> {
        let RawRequest {
            variable_name,
            mip_table,
            start_year,
            end_year,
            datasets,
            experiments,
            ensemble,
            project,
        } = self;

        let variable_name =
            variable_name.ok_or_else(|| ConfigError::new("missing required field: variable name"))?;

        let mip_table = mip_table
            .ok_or_else(|| ConfigError::new(format!("{}: missing required field: mip", variable_name)))?;

        let start_year = start_year
            .ok_or_else(|| {
                ConfigError::new(format!("{}: missing required field: start_year", variable_name))
            })?
            .resolve("start_year")?;
        let end_year = end_year
            .ok_or_else(|| {
                ConfigError::new(format!("{}: missing required field: end_year", variable_name))
            })?
            .resolve("end_year")?;

        let years = match (start_year, end_year) {
            (Some(start), Some(end)) => {
                if start > end {
                    return Err(ConfigError::new(format!(
                        "{}: start_year {} is after end_year {}",
                        variable_name, start, end
                    )));
                }
                YearRange::Span { start, end }
            }
            (None, None) => YearRange::Unbounded,
            _ => {
                return Err(ConfigError::new(format!(
                    "{}: start_year and end_year must both be years or both be \"{}\"",
                    variable_name, WILDCARD
                )))
            }
        };

        let experiments = match experiments {
            None => ExperimentFilter::Any,
            Some(exps) if exps.is_empty() || exps.iter().any(|e| e == WILDCARD) => {
                ExperimentFilter::Any
            }
            Some(exps) => ExperimentFilter::Ordered(exps),
        };

        let ensemble = match ensemble {
            Some(ens) if ens != WILDCARD => Constraint::Exact(ens),
            _ => Constraint::Unconstrained,
        };

        let project = match project {
            Some(proj) if proj != WILDCARD => Constraint::Exact(proj),
            _ => Constraint::Unconstrained,
        };

        Ok(VariableRequest {
            variable_name,
            mip_table,
            years,
            dataset_filter: Constraint::from_values(datasets),
            experiments,
            ensemble,
            project,
        })
    }
}

/// A fully validated request, immutable for the duration of a search.
#[derive(Debug, Clone)]
pub struct VariableRequest {
    /// Variable short name, e.g. `tas`.
    pub variable_name: String,
    /// MIP table the variable is reported in, e.g. `Amon`.
    pub mip_table: String,
    /// Requested temporal coverage.
    pub years: YearRange,
    /// Datasets the request is limited to.
    pub dataset_filter: Constraint,
    /// Experiments the request may draw from, in stitching order.
    pub experiments: ExperimentFilter,
    /// Ensemble member the request is limited to.
    pub ensemble: Constraint,
    /// Project the request is limited to.
    pub project: Constraint,
}
