//! Offline measurement of ranking quality against held-out user activity.
//!
//! Each qualifying user's positives are shuffled and split into a profile
//! part and a held-out part; the recommender only sees the profile part and is
//! scored on how many held-out items it surfaces in its top `k`.
//!
//! [`generate_interactions`] produces a synthetic log to run this on.

pub mod generate;
mod harness;
mod reranked;
pub mod split;

pub use generate::{generate_interactions, PICKS_PER_CATEGORY};
pub use harness::EvaluationHarness;
pub use reranked::RerankEvaluationOptions;
pub use split::{split_positives, test_size, TrainTestSplit, TEST_FRACTION};
