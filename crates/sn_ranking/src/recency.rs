use chrono::{DateTime, Utc};

/// Linear position of each timestamp within the span of `dates`: oldest 0, newest 1.
/// When every timestamp is the same, every score is 1.
pub fn recency_scores(dates: &[DateTime<Utc>]) -> Vec<f64> {
    let (Some(oldest), Some(newest)) = (dates.iter().min(), dates.iter().max()) else {
        return Vec::new();
    };

    let span = (*newest - *oldest).num_milliseconds();
    if span <= 0 {
        return vec![1.0; dates.len()];
    }

    dates
        .iter()
        .map(|d| (*d - *oldest).num_milliseconds() as f64 / span as f64)
        .collect()
}
