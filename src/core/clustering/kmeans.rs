//! Lloyd's k-means behind a narrow partitioning interface, so the day clusterer does not depend
//! on the concrete algorithm.

use crate::compare_floats::argmin;
use crate::input::ClusteringSettings;
use crate::statistics::squared_distance;
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use tracing::debug;

/// Result of partitioning a set of points into `k` groups.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Cluster index in `0..k` for every point
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Within-cluster sum of squared distances
    pub inertia: f64,
}

pub trait Partitioner: Sync {
    /// Partition `points` into exactly `k` non-empty groups. Callers guarantee that there are
    /// at least `k` distinct points.
    fn partition(&self, points: &[Vec<f64>], k: usize) -> Partition;
}

/// k-means with k-means++ seeding and independent seeded restarts.
#[derive(Clone, Debug)]
pub struct KMeans {
    restarts: usize,
    max_iterations: usize,
    tolerance: f64,
    seed: u64,
}

impl KMeans {
    pub fn new(restarts: usize, max_iterations: usize, tolerance: f64, seed: u64) -> Self {
        Self {
            restarts: restarts.max(1),
            max_iterations: max_iterations.max(1),
            tolerance,
            seed,
        }
    }

    fn run(&self, points: &[Vec<f64>], k: usize, rng: &mut Pcg64) -> Partition {
        let mut centroids = seed_centroids(points, k, rng);
        let mut labels = vec![0; points.len()];

        for iteration in 0..self.max_iterations {
            for (label, point) in labels.iter_mut().zip(points) {
                *label = nearest_centroid(point, &centroids);
            }
            fill_empty_clusters(points, &mut labels, &centroids, k);

            let updated = cluster_means(points, &labels, k);
            let shift = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .fold(0., f64::max);
            centroids = updated;

            if shift <= self.tolerance {
                debug!("k-means converged after {} iterations", iteration + 1);
                break;
            }
        }

        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(point, &label)| squared_distance(point, &centroids[label]))
            .sum();

        Partition {
            labels,
            centroids,
            inertia,
        }
    }
}

impl From<&ClusteringSettings> for KMeans {
    fn from(settings: &ClusteringSettings) -> Self {
        Self::new(
            settings.restarts,
            settings.max_iterations,
            settings.tolerance,
            settings.seed,
        )
    }
}

impl Partitioner for KMeans {
    fn partition(&self, points: &[Vec<f64>], k: usize) -> Partition {
        // restarts are independent; the lowest inertia wins, earliest restart on ties
        let (restart, best) = (0..self.restarts)
            .into_par_iter()
            .map(|restart| {
                let mut rng = Pcg64::seed_from_u64(self.seed.wrapping_add(restart as u64));
                (restart, self.run(points, k, &mut rng))
            })
            .min_by(|(ra, a), (rb, b)| {
                OrderedFloat(a.inertia)
                    .cmp(&OrderedFloat(b.inertia))
                    .then(ra.cmp(rb))
            })
            .unwrap_or_else(|| {
                // restarts is at least one, so this is only reached for an empty iterator
                let mut rng = Pcg64::seed_from_u64(self.seed);
                (0, self.run(points, k, &mut rng))
            });

        debug!("best of {} k-means restarts was #{restart}", self.restarts);
        best
    }
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    argmin(centroids.iter().map(|c| squared_distance(point, c))).unwrap_or(0)
}

/// k-means++: the first centre is uniform, later centres are drawn with probability
/// proportional to squared distance from the nearest chosen centre.
fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut Pcg64) -> Vec<Vec<f64>> {
    let mut centroids = vec![points[rng.random_range(0..points.len())].clone()];
    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0. {
            let mut target = rng.random::<f64>() * total;
            closest
                .iter()
                .position(|&d| {
                    target -= d;
                    target <= 0. && d > 0.
                })
                .unwrap_or_else(|| closest.iter().rposition(|&d| d > 0.).unwrap_or(0))
        } else {
            rng.random_range(0..points.len())
        };

        let centre = points[chosen].clone();
        for (dist, point) in closest.iter_mut().zip(points) {
            *dist = dist.min(squared_distance(point, &centre));
        }
        centroids.push(centre);
    }

    centroids
}

/// Give every empty cluster the point lying farthest from its own centroid, taken from a
/// cluster that can spare it.
fn fill_empty_clusters(points: &[Vec<f64>], labels: &mut [usize], centroids: &[Vec<f64>], k: usize) {
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let donor = points
            .iter()
            .zip(labels.iter())
            .enumerate()
            .filter(|(_, (_, &label))| counts[label] > 1)
            .max_by_key(|(_, (point, &label))| {
                OrderedFloat(squared_distance(point, &centroids[label]))
            })
            .map(|(idx, _)| idx);

        if let Some(idx) = donor {
            counts[labels[idx]] -= 1;
            labels[idx] = empty;
            counts[empty] = 1;
        }
    }
}

fn cluster_means(points: &[Vec<f64>], labels: &[usize], k: usize) -> Vec<Vec<f64>> {
    let width = points.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.; width]; k];
    let mut counts = vec![0usize; k];

    for (point, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(point) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            let count = count.max(1) as f64;
            sum.into_iter().map(|s| s / count).collect()
        })
        .collect()
}
