use crate::compare_floats::argmin;
use crate::core::clustering::kmeans::{KMeans, Partitioner};
use crate::statistics::{mean_squared_error, squared_distance, standardise_columns};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum ClusteringError {
    #[error("Cluster count {k} is outside the valid range [2, {}] for {days} days", .days.saturating_sub(1))]
    InvalidClusterCount { k: usize, days: usize },
    #[error("Only {distinct} distinct day profiles are available, cannot form {k} clusters")]
    TooFewDistinctDays { k: usize, distinct: usize },
    #[error("Day feature vectors have inconsistent lengths")]
    RaggedFeatures,
}

/// Representative calendar day for each cluster label, indexed by label.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterAssignment(Vec<usize>);

impl ClusterAssignment {
    pub fn new(representatives: Vec<usize>) -> Self {
        Self(representatives)
    }

    pub fn representative(&self, label: usize) -> Option<usize> {
        self.0.get(label).copied()
    }

    pub fn representatives(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct DayClustering {
    /// Cluster label in `0..k` for every calendar day
    pub labels: Vec<usize>,
    pub assignment: ClusterAssignment,
    pub inertia: f64,
}

/// Groups calendar days with similar weather and picks a real day to stand in for each group.
pub struct DayClusterer<P: Partitioner = KMeans> {
    partitioner: P,
}

impl<P: Partitioner> DayClusterer<P> {
    pub fn new(partitioner: P) -> Self {
        Self { partitioner }
    }

    /// Arguments
    /// * `features` - one feature vector per calendar day (see `day_features`)
    /// * `k` - number of clusters, in `[2, days - 1]`
    pub fn cluster(&self, features: &[Vec<f64>], k: usize) -> Result<DayClustering, ClusteringError> {
        let days = features.len();
        if k < 2 || k >= days {
            return Err(ClusteringError::InvalidClusterCount { k, days });
        }
        if !features.iter().map(Vec::len).all_equal() {
            return Err(ClusteringError::RaggedFeatures);
        }

        let scaled = standardise_columns(features);
        let distinct = scaled
            .iter()
            .map(|row| row.iter().map(|v| OrderedFloat(*v)).collect::<Vec<_>>())
            .unique()
            .count();
        if distinct < k {
            return Err(ClusteringError::TooFewDistinctDays { k, distinct });
        }

        let partition = self.partitioner.partition(&scaled, k);

        // the representative is the member day closest to its centroid; members are disjoint
        // so no day can represent two clusters
        let representatives = partition
            .centroids
            .iter()
            .enumerate()
            .map(|(label, centroid)| {
                let members: Vec<usize> = (0..days)
                    .filter(|&day| partition.labels[day] == label)
                    .collect();
                argmin(
                    members
                        .iter()
                        .map(|&day| squared_distance(&scaled[day], centroid)),
                )
                .map(|idx| members[idx])
                .ok_or(ClusteringError::TooFewDistinctDays { k, distinct })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "clustered {days} days into {k} clusters (inertia {:.4})",
            partition.inertia
        );

        Ok(DayClustering {
            labels: partition.labels,
            assignment: ClusterAssignment::new(representatives),
            inertia: partition.inertia,
        })
    }

    /// Mean squared error between each day's features and those of the representative day
    /// standing in for it.
    pub fn reconstruction_error(&self, features: &[Vec<f64>], clustering: &DayClustering) -> f64 {
        let reconstructed: Vec<Vec<f64>> = clustering
            .labels
            .iter()
            .map(|&label| {
                clustering
                    .assignment
                    .representative(label)
                    .map_or_else(Vec::new, |day| features[day].clone())
            })
            .collect();

        mean_squared_error(features, &reconstructed)
    }

    /// Reconstruction error for each requested cluster count, sorted by cluster count.
    ///
    /// Choosing k from the sweep is left to the operator.
    pub fn reconstruction_error_sweep(
        &self,
        features: &[Vec<f64>],
        cluster_counts: impl IntoIterator<Item = usize>,
    ) -> Result<Vec<(usize, f64)>, ClusteringError> {
        let cluster_counts: Vec<usize> = cluster_counts.into_iter().sorted().dedup().collect();

        cluster_counts
            .into_par_iter()
            .map(|k| {
                let clustering = self.cluster(features, k)?;
                Ok((k, self.reconstruction_error(features, &clustering)))
            })
            .collect()
    }
}

impl Default for DayClusterer<KMeans> {
    fn default() -> Self {
        Self::new(KMeans::new(50, 300, 1e-6, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// Four weather regimes repeated through a year, with a little day-to-day variation.
    #[fixture]
    fn features() -> Vec<Vec<f64>> {
        (0..365)
            .map(|day| {
                let regime = (day / 30) % 4;
                let wobble = (day % 7) as f64 * 0.01;
                (0..48)
                    .map(|i| {
                        let base = if i < 24 { regime as f64 * 0.25 } else { 1. - regime as f64 * 0.2 };
                        base + wobble + (i % 24) as f64 * 0.001
                    })
                    .collect()
            })
            .collect()
    }

    fn clusterer() -> DayClusterer {
        DayClusterer::new(KMeans::new(4, 100, 1e-8, 3))
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(365)]
    #[case(400)]
    fn should_reject_invalid_cluster_counts(features: Vec<Vec<f64>>, #[case] k: usize) {
        assert_eq!(
            clusterer().cluster(&features, k).unwrap_err(),
            ClusteringError::InvalidClusterCount { k, days: 365 }
        );
    }

    #[rstest]
    fn representatives_are_distinct_member_days(features: Vec<Vec<f64>>) {
        let clustering = clusterer().cluster(&features, 6).unwrap();
        let representatives = clustering.assignment.representatives();

        assert_eq!(representatives.len(), 6);
        assert_eq!(representatives.iter().unique().count(), 6);
        for (label, &day) in representatives.iter().enumerate() {
            assert!(day < 365);
            assert_eq!(clustering.labels[day], label);
        }
    }

    #[rstest]
    fn should_reject_more_clusters_than_distinct_days() {
        let features = vec![vec![1., 2.]; 10]
            .into_iter()
            .chain(vec![vec![3., 4.]; 10])
            .collect::<Vec<_>>();
        assert_eq!(
            clusterer().cluster(&features, 3).unwrap_err(),
            ClusteringError::TooFewDistinctDays { k: 3, distinct: 2 }
        );
    }

    #[rstest]
    fn sweep_error_falls_as_clusters_are_added(features: Vec<Vec<f64>>) {
        let sweep = clusterer()
            .reconstruction_error_sweep(&features, [8, 2, 4])
            .unwrap();

        let ks: Vec<usize> = sweep.iter().map(|(k, _)| *k).collect();
        assert_eq!(ks, vec![2, 4, 8]);
        assert!(sweep[0].1 > sweep[1].1);
        assert!(sweep[0].1 > sweep[2].1);
    }

    #[rstest]
    fn reconstruction_error_is_zero_when_every_day_is_its_own_representative() {
        let features = vec![vec![0., 1.], vec![2., 3.], vec![4., 5.]];
        let clustering = DayClustering {
            labels: vec![0, 1, 2],
            assignment: ClusterAssignment::new(vec![0, 1, 2]),
            inertia: 0.,
        };
        assert_relative_eq!(clusterer().reconstruction_error(&features, &clustering), 0.);
    }
}
