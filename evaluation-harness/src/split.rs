use fastrand::Rng;

/// Share of a user's positives held out for testing.
pub const TEST_FRACTION: f64 = 0.3;

/// Positives of one user divided into a profile half and a held-out half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

/// `max(1, round(0.3 * n))`
pub fn test_size(positives: usize) -> usize {
    ((positives as f64 * TEST_FRACTION).round() as usize).max(1)
}

/// Shuffles `positives` with `rng` and takes the held-out items from the front.
///
/// Returns `None` when either side would be empty, which is always the case
/// for fewer than two positives.
pub fn split_positives(positives: &[String], rng: &mut Rng) -> Option<TrainTestSplit> {
    if positives.len() < 2 {
        return None;
    }

    let mut shuffled = positives.to_vec();
    rng.shuffle(&mut shuffled);

    let train = shuffled.split_off(test_size(positives.len()));
    if train.is_empty() || shuffled.is_empty() {
        return None;
    }
    Some(TrainTestSplit {
        train,
        test: shuffled,
    })
}
