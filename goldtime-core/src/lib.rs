//! goldtime-core: spaced-repetition scheduling engine.
//!
//! Two cooperating parts:
//! - the interval forecaster, a regression-with-ARIMA-errors model that turns
//!   a feedback tier and elapsed time into the gap until the next review
//! - the due-time ranker, which orders a card collection by urgency and
//!   buckets a due time into a display tier

pub mod arimax;
pub mod card;
pub mod error;
pub mod feedback;
pub mod forecaster;
pub mod optimize;
pub mod pending;
pub mod ranking;
pub mod review;
pub mod scheduler;
pub mod store;
pub mod time;

pub use arimax::{ArimaxCoefficients, ArimaxModel, FitSummary};
pub use card::Card;
pub use error::{ModelError, SchedulingError, StoreError};
pub use feedback::{elapsed_whole_days, recall_point, DailyTally, FeedbackTier};
pub use forecaster::{
    load_artifact, load_forecaster, save_artifact, train, Forecaster, GapModel, ModelArtifact,
    TrainingReport, ARTIFACT_VERSION,
};
pub use pending::{FeedbackBuffer, PendingFeedback};
pub use ranking::{classify, rank_cards, time_until_label, urgency_key, PriorityTier, UrgencyKey};
pub use review::{derive_gap_samples, GapSample, ReviewEvent};
pub use scheduler::{
    DuePrediction, ItemReport, PredictionSource, SchedulerPolicy, SchedulingContext, SyncReport,
};
pub use store::{CardStore, InMemoryCardStore, InMemoryProgressStore, ProgressStore};
