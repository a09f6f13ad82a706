pub mod day_clusterer;
pub mod kmeans;
pub mod normalise;
