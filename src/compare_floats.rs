use ordered_float::OrderedFloat;

pub fn min_of_slice(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by_key(|v| OrderedFloat(*v))
}

pub fn max_of_slice(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by_key(|v| OrderedFloat(*v))
}

/// Position of the smallest value; the first one wins on ties.
pub(crate) fn argmin(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    values
        .into_iter()
        .enumerate()
        .min_by_key(|(_, v)| OrderedFloat(*v))
        .map(|(idx, _)| idx)
}

/// Position of the largest value; the first one wins on ties.
pub(crate) fn argmax(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    // max_by_key keeps the last maximum, so compare reversed positions
    values
        .into_iter()
        .enumerate()
        .max_by_key(|(idx, v)| (OrderedFloat(*v), std::cmp::Reverse(*idx)))
        .map(|(idx, _)| idx)
}
