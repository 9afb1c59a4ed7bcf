//! goldtime-ingest: review-history ingestion (CSV exports, tolerant
//! timestamps) and synthetic histories for offline training.

pub mod review_csv;
pub mod synthetic;
pub mod timestamp;

pub use review_csv::{parse_review_csv, parse_review_reader};
pub use synthetic::{synthetic_history, DEFAULT_SAMPLES, SYNTHETIC_CARD};
pub use timestamp::parse_timestamp;
