//! Collapses raw per-day cluster labels into one ordered slot per cluster, each carrying the
//! number of calendar days it stands in for.
//!
//! The calendar is treated as a ring throughout: day 0 neighbours the last day.

use crate::core::clustering::day_clusterer::ClusterAssignment;
use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum ReductionError {
    #[error("Cannot reduce an empty label sequence")]
    Empty,
    #[error("Cluster label {label} has no representative day")]
    MissingRepresentative { label: usize },
    #[error("Reduced frequencies sum to {total} but the labels cover {expected} days")]
    FrequencyInvariantViolation { total: usize, expected: usize },
    #[error("Reduction kept {kept} slots for {distinct} distinct clusters")]
    CoverageInvariantViolation { kept: usize, distinct: usize },
}

/// A cluster after collapsing, in the order it was processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetainedSlot {
    pub label: usize,
    /// First calendar day of the run that was kept for this label
    pub calendar_day: usize,
    /// Number of days carrying this label in the smoothed sequence
    pub frequency: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReducedCluster {
    pub label: usize,
    pub representative_day: usize,
    pub frequency: usize,
    pub calendar_day: usize,
}

/// Representative days with their frequency weights, least frequent cluster first.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedClusterSequence {
    clusters: Vec<ReducedCluster>,
}

impl OrderedClusterSequence {
    pub fn clusters(&self) -> &[ReducedCluster] {
        &self.clusters
    }

    pub fn representative_days(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.representative_day).collect()
    }

    pub fn frequencies(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.frequency).collect()
    }

    pub fn total_frequency(&self) -> usize {
        self.clusters.iter().map(|c| c.frequency).sum()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// The same clusters re-sorted by where their retained run sits in the calendar.
    pub fn in_calendar_order(&self) -> Vec<ReducedCluster> {
        self.clusters
            .iter()
            .copied()
            .sorted_by_key(|c| c.calendar_day)
            .collect()
    }
}

fn distinct_count(labels: &[usize]) -> usize {
    labels.iter().unique().count()
}

/// Majority label within `radius` days either side of each day, ties going to the label seen
/// first when scanning the neighbourhood from its earliest day.
fn smooth(labels: &[usize], radius: usize) -> Vec<usize> {
    let n = labels.len() as isize;
    let radius = radius as isize;

    (0..n)
        .map(|day| {
            let mut counts: IndexMap<usize, usize> = IndexMap::new();
            for offset in -radius..=radius {
                let neighbour = (day + offset).rem_euclid(n) as usize;
                *counts.entry(labels[neighbour]).or_default() += 1;
            }
            counts
                .iter()
                .fold(None, |best: Option<(usize, usize)>, (&label, &count)| match best {
                    Some((_, best_count)) if best_count >= count => best,
                    _ => Some((label, count)),
                })
                .map_or(labels[day as usize], |(label, _)| label)
        })
        .collect()
}

/// Smooth the labels with the widest cyclic majority filter that still keeps every cluster.
///
/// The radius starts at the number of distinct clusters and shrinks by one until no cluster is
/// lost; radius zero reproduces the input, so this always terminates.
pub fn filter_labels(labels: &[usize]) -> Vec<usize> {
    let distinct = distinct_count(labels);

    for radius in (1..=distinct).rev() {
        let smoothed = smooth(labels, radius);
        if distinct_count(&smoothed) == distinct {
            debug!("accepted smoothing radius {radius} for {distinct} clusters");
            return smoothed;
        }
        debug!("smoothing radius {radius} erased a cluster");
    }

    labels.to_vec()
}

/// Maximal runs of `label` as `(start, length)`, joining a run that wraps from the end of the
/// sequence back to its start.
fn ring_runs(sequence: &[(usize, usize)], label: usize) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = vec![];
    for (position, &(_, value)) in sequence.iter().enumerate() {
        if value != label {
            continue;
        }
        match runs.last_mut() {
            Some((start, length)) if *start + *length == position => *length += 1,
            _ => runs.push((position, 1)),
        }
    }

    if runs.len() > 1 {
        let (first_start, first_length) = runs[0];
        let (last_start, last_length) = runs[runs.len() - 1];
        if first_start == 0 && last_start + last_length == sequence.len() {
            runs.remove(0);
            if let Some(last) = runs.last_mut() {
                *last = (last_start, last_length + first_length);
            }
        }
    }

    runs
}

/// Collapse each cluster to the first day of its longest contiguous run, least frequent cluster
/// first, deleting every other day of that cluster.
///
/// Returns one slot per distinct label in processing order. Ties in frequency are processed
/// in ascending label order; ties in run length keep the earliest run.
pub fn reduce_reorder(labels: &[usize]) -> Vec<RetainedSlot> {
    let frequencies = labels.iter().copied().counts();
    let processing_order: Vec<usize> = frequencies
        .iter()
        .map(|(&label, &count)| (count, label))
        .sorted()
        .map(|(_, label)| label)
        .collect();

    // (calendar day, label) pairs, shrinking as clusters are collapsed
    let mut sequence: Vec<(usize, usize)> = labels.iter().copied().enumerate().collect();
    let mut slots = Vec::with_capacity(processing_order.len());

    for label in processing_order {
        let runs = ring_runs(&sequence, label);
        let Some(&(keep, _)) = runs
            .iter()
            .fold(None, |best: Option<&(usize, usize)>, run| match best {
                Some(b) if b.1 >= run.1 => Some(b),
                _ => Some(run),
            })
        else {
            continue;
        };

        let calendar_day = sequence[keep].0;
        sequence = sequence
            .into_iter()
            .enumerate()
            .filter(|&(position, (_, value))| value != label || position == keep)
            .map(|(_, entry)| entry)
            .collect();

        slots.push(RetainedSlot {
            label,
            calendar_day,
            frequency: frequencies[&label],
        });
    }

    slots
}

/// Turns per-day cluster labels into an `OrderedClusterSequence`.
pub struct ClusterReducer<'a> {
    assignment: &'a ClusterAssignment,
}

impl<'a> ClusterReducer<'a> {
    pub fn new(assignment: &'a ClusterAssignment) -> Self {
        Self { assignment }
    }

    pub fn reduce(&self, labels: &[usize]) -> Result<OrderedClusterSequence, ReductionError> {
        if labels.is_empty() {
            return Err(ReductionError::Empty);
        }

        let smoothed = filter_labels(labels);
        let slots = reduce_reorder(&smoothed);

        let distinct = distinct_count(labels);
        if slots.len() != distinct {
            return Err(ReductionError::CoverageInvariantViolation {
                kept: slots.len(),
                distinct,
            });
        }

        let clusters = slots
            .into_iter()
            .map(|slot| {
                let representative_day = self
                    .assignment
                    .representative(slot.label)
                    .ok_or(ReductionError::MissingRepresentative { label: slot.label })?;
                Ok(ReducedCluster {
                    label: slot.label,
                    representative_day,
                    frequency: slot.frequency,
                    calendar_day: slot.calendar_day,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let reduced = OrderedClusterSequence { clusters };
        let total = reduced.total_frequency();
        if total != labels.len() {
            return Err(ReductionError::FrequencyInvariantViolation {
                total,
                expected: labels.len(),
            });
        }

        info!(
            "reduced {} days to {} representative days",
            labels.len(),
            reduced.len()
        );
        Ok(reduced)
    }
}
