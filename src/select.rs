/*!
 * The dataset selector.
 *
 * Given a validated [`VariableRequest`] and a catalog snapshot, find every
 * (dataset, ensemble) combination whose coverage satisfies the requested
 * span, stitching experiments end-to-end when the request ordered more than
 * one. Selection is purely functional: the same request and catalog always
 * produce the same answer, and nothing is mutated along the way.
 */
use rustc_hash::FxHashMap as HashMap;
use std::cmp::Reverse;

use crate::{
    catalog::CatalogRecord,
    request::{ExperimentFilter, VariableRequest, YearRange},
};

/// One contiguous slice of a selection, drawn from a single experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub experiment: String,
    /// First year of the slice, inclusive.
    pub start_year: i32,
    /// Last year of the slice, inclusive.
    pub end_year: i32,
}

/// A (dataset, ensemble) combination that satisfies a request, with the
/// segments that cover the requested span gap-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSelection {
    pub dataset: String,
    pub ensemble: String,
    pub segments: Vec<Segment>,
}

/// Find every (dataset, ensemble) combination satisfying the request.
///
/// Records are filtered on variable and MIP table (exact matches), then on
/// the dataset/ensemble/project constraints, and grouped by
/// (dataset, ensemble) in catalog discovery order; ensembles are never
/// merged. How a group qualifies depends on the request:
///
/// - A single requested experiment qualifies only if one record's coverage
///   contains the whole span.
/// - An ordered list of experiments is stitched front to back: starting at
///   the requested start year, the segment reaching farthest past the
///   frontier is consumed (ties prefer the earlier coverage start, then the
///   experiment listed first), until the span is covered. Any gap
///   disqualifies the whole group; partial coverage is never returned.
/// - With no experiment filter, each experiment present in the group is
///   tried on its own under the single-experiment rule.
///
/// An unbounded year range skips coverage filtering and reports each group's
/// full native coverage instead.
pub fn find_datasets(
    request: &VariableRequest,
    catalog: &[CatalogRecord],
) -> Vec<AggregatedSelection> {
    let mut order: Vec<(String, String)> = vec![];
    let mut groups: HashMap<(String, String), Vec<&CatalogRecord>> = HashMap::default();

    for rec in catalog {
        if rec.variable != request.variable_name || rec.mip_table != request.mip_table {
            continue;
        }
        if !request.dataset_filter.admits(&rec.dataset)
            || !request.ensemble.admits(&rec.ensemble)
            || !request.project.admits(&rec.project)
            || !request.experiments.admits(&rec.experiment)
        {
            continue;
        }

        let key = (rec.dataset.clone(), rec.ensemble.clone());
        match groups.get_mut(&key) {
            Some(group) => group.push(rec),
            None => {
                groups.insert(key.clone(), vec![rec]);
                order.push(key);
            }
        }
    }

    let mut selections = vec![];

    for key in order {
        let records = groups.remove(&key).unwrap();
        let (dataset, ensemble) = key;

        match request.years {
            YearRange::Unbounded => {
                selections.push(native_selection(dataset, ensemble, &records));
            }
            YearRange::Span { start, end } => match &request.experiments {
                ExperimentFilter::Ordered(exps) if exps.len() > 1 => {
                    if let Some(segments) = stitch(&records, request, start, end) {
                        selections.push(AggregatedSelection {
                            dataset,
                            ensemble,
                            segments,
                        });
                    }
                }
                ExperimentFilter::Ordered(_) => {
                    if let Some(rec) = records.iter().copied().find(|r| r.contains(start, end)) {
                        selections.push(single_segment(dataset, ensemble, rec, start, end));
                    }
                }
                ExperimentFilter::Any => {
                    // Every experiment present stands on its own; experiments
                    // the user never ordered are not stitched together.
                    let mut seen: Vec<&str> = vec![];
                    for rec in &records {
                        if seen.contains(&rec.experiment.as_str()) {
                            continue;
                        }
                        seen.push(&rec.experiment);

                        if let Some(covering) = records
                            .iter()
                            .copied()
                            .find(|r| r.experiment == rec.experiment && r.contains(start, end))
                        {
                            selections.push(single_segment(
                                dataset.clone(),
                                ensemble.clone(),
                                covering,
                                start,
                                end,
                            ));
                        }
                    }
                }
            },
        }
    }

    selections
}

fn single_segment(
    dataset: String,
    ensemble: String,
    rec: &CatalogRecord,
    start: i32,
    end: i32,
) -> AggregatedSelection {
    AggregatedSelection {
        dataset,
        ensemble,
        segments: vec![Segment {
            experiment: rec.experiment.clone(),
            start_year: start,
            end_year: end,
        }],
    }
}

/// Greedy frontier stitch over an ordered multi-experiment request.
///
/// The frontier is the first year still needing coverage. Each round
/// consumes, among the records whose coverage includes the frontier year,
/// the one reaching farthest forward; the consumed slice is clamped to the
/// requested span. `None` as soon as no record covers the frontier, since a
/// gap anywhere disqualifies the group entirely.
fn stitch(
    records: &[&CatalogRecord],
    request: &VariableRequest,
    start: i32,
    end: i32,
) -> Option<Vec<Segment>> {
    let mut segments: Vec<Segment> = vec![];
    let mut frontier = start;

    while frontier <= end {
        let best = records
            .iter()
            .filter(|r| r.start_year <= frontier && r.end_year >= frontier)
            .min_by_key(|r| {
                (
                    Reverse(r.end_year),
                    r.start_year,
                    request.experiments.position(&r.experiment).unwrap_or(usize::MAX),
                )
            })?;

        let seg_end = best.end_year.min(end);
        segments.push(Segment {
            experiment: best.experiment.clone(),
            start_year: frontier,
            end_year: seg_end,
        });

        // seg_end >= frontier, so this always advances.
        frontier = seg_end + 1;
    }

    Some(segments)
}

/// The full native coverage of a group, one segment per record.
fn native_selection(
    dataset: String,
    ensemble: String,
    records: &[&CatalogRecord],
) -> AggregatedSelection {
    let mut segments: Vec<Segment> = records
        .iter()
        .map(|r| Segment {
            experiment: r.experiment.clone(),
            start_year: r.start_year,
            end_year: r.end_year,
        })
        .collect();

    segments.sort_by(|a, b| {
        a.start_year
            .cmp(&b.start_year)
            .then(a.end_year.cmp(&b.end_year))
            .then_with(|| a.experiment.cmp(&b.experiment))
    });

    AggregatedSelection {
        dataset,
        ensemble,
        segments,
    }
}
