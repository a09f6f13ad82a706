pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_YEAR: usize = 365;
pub const HOURS_PER_YEAR: usize = HOURS_PER_DAY * DAYS_PER_YEAR;

/// Split an hourly series into consecutive 24-hour day profiles.
///
/// Any trailing partial day is dropped; callers validate whole-day lengths up front.
pub fn convert_profile_to_daily(hourly: &[f64]) -> Vec<Vec<f64>> {
    hourly
        .chunks_exact(HOURS_PER_DAY)
        .map(<[f64]>::to_vec)
        .collect()
}

/// Sum each 24-hour day of an hourly series.
pub fn daily_totals(hourly: &[f64]) -> Vec<f64> {
    hourly
        .chunks_exact(HOURS_PER_DAY)
        .map(|day| day.iter().sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn two_days() -> Vec<f64> {
        (0..48).map(|h| h as f64).collect()
    }

    #[rstest]
    fn should_split_hourly_profile_into_days(two_days: Vec<f64>) {
        let days = convert_profile_to_daily(&two_days);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0][0], 0.);
        assert_eq!(days[1][0], 24.);
        assert_eq!(days[1][23], 47.);
    }

    #[rstest]
    fn should_sum_each_day(two_days: Vec<f64>) {
        assert_eq!(daily_totals(&two_days), vec![276., 852.]);
    }

    #[test]
    fn hours_per_year_matches_calendar() {
        assert_eq!(HOURS_PER_YEAR, 8760);
    }
}
